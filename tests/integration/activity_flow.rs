use chrono::{NaiveDate, Weekday};
use studygrid::app::AppState;
use studygrid::error::AppError;
use studygrid::models::month::MonthKey;
use studygrid::models::weight::{ActivityCreateInput, ActivityUpdateInput, WeekdayTargets};
use studygrid::services::activity_service::ActivityRemoval;
use tempfile::tempdir;

#[test]
fn activity_lifecycle_keeps_history_resolvable() {
    let dir = tempdir().expect("temp dir");
    let state = AppState::open(dir.path()).expect("app state");

    let study = state
        .activities()
        .create(ActivityCreateInput {
            name: "Study".into(),
            importance: Some(3),
            target: Some(2.0),
            ..Default::default()
        })
        .expect("create study");
    let english = state
        .activities()
        .create(ActivityCreateInput {
            name: "English".into(),
            ..Default::default()
        })
        .expect("create english");
    assert_eq!(study.position, 1);
    assert_eq!(english.position, 2);

    // duplicate visible names are rejected
    let duplicate = state.activities().create(ActivityCreateInput {
        name: " Study ".into(),
        ..Default::default()
    });
    assert!(matches!(duplicate, Err(AppError::Conflict { .. })));

    // per-weekday override: rest on Sundays
    let mut targets = WeekdayTargets::default();
    targets.set(Weekday::Sun, Some(0.0));
    let study = state
        .activities()
        .update(
            &study.id,
            ActivityUpdateInput {
                targets_by_day: Some(targets),
                ..Default::default()
            },
        )
        .expect("set weekday targets");
    assert_eq!(study.planned_hours(Weekday::Sun), 0.0);
    assert_eq!(study.planned_hours(Weekday::Mon), 2.0);

    // renaming never touches logged history: hours key on the id
    let june_5 = NaiveDate::from_ymd_opt(2025, 6, 5).expect("date");
    state
        .journal()
        .record_hours(june_5, &study.id, 2.0)
        .expect("log study");
    let renamed = state
        .activities()
        .update(
            &study.id,
            ActivityUpdateInput {
                name: Some("Deep Work".into()),
                ..Default::default()
            },
        )
        .expect("rename");
    assert_eq!(renamed.id, study.id);
    let entry = state
        .journal()
        .entry(june_5)
        .expect("load entry")
        .expect("entry exists");
    assert_eq!(entry.hours(&study.id), 2.0);

    // removal downgrades to hiding when history references the activity
    assert_eq!(
        state.activities().remove(&study.id).expect("remove study"),
        ActivityRemoval::Hidden
    );
    let hidden = state.activities().get(&study.id).expect("still stored");
    assert!(hidden.hidden);

    // the hidden activity vanishes from scoring but its hours stay on disk
    let stats = state
        .stats()
        .monthly_stats(MonthKey::new(2025, 6).expect("month key"))
        .expect("monthly stats");
    assert_eq!(stats.total_score, 0);
    assert!(stats.activities.iter().all(|line| line.activity_id != study.id));
    let entry = state
        .journal()
        .entry(june_5)
        .expect("load entry")
        .expect("entry exists");
    assert_eq!(entry.hours(&study.id), 2.0);

    // an activity with no history is deleted outright
    assert_eq!(
        state
            .activities()
            .remove(&english.id)
            .expect("remove english"),
        ActivityRemoval::Deleted
    );
    assert!(matches!(
        state.activities().get(&english.id),
        Err(AppError::NotFound)
    ));

    // reorder rewrites positions by the given id order
    let a = state
        .activities()
        .create(ActivityCreateInput {
            name: "A".into(),
            ..Default::default()
        })
        .expect("create a");
    let b = state
        .activities()
        .create(ActivityCreateInput {
            name: "B".into(),
            ..Default::default()
        })
        .expect("create b");
    let reordered = state
        .activities()
        .reorder(&[b.id.clone(), a.id.clone()])
        .expect("reorder");
    let names: Vec<_> = reordered.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, ["B", "A"]);
}
