use chrono::NaiveDate;
use studygrid::app::AppState;
use studygrid::models::month::MonthKey;
use studygrid::models::settings::TrackerConfig;
use studygrid::models::weight::{ActivityCreateInput, ActivityUpdateInput};
use tempfile::tempdir;

#[test]
fn month_logging_scoring_and_history_flow() {
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
            importance: Some(1),
            target: Some(1.0),
            ..Default::default()
        })
        .expect("create english");

    // opening a month pre-creates one empty entry per day
    let june = MonthKey::new(2025, 6).expect("month key");
    let aggregate = state.journal().open_month(june).expect("open june");
    assert_eq!(aggregate.entries.len(), 30);
    assert!(aggregate.entries.iter().all(|e| e.activities.is_empty()));
    assert_eq!(aggregate.meta.meta_hours, 100.0);

    // W = 30 * (2*3 + 1*1) = 210, F = 30000/210
    let factor = 30_000.0 / 210.0;

    // one fully on-target day
    let june_5 = NaiveDate::from_ymd_opt(2025, 6, 5).expect("date");
    state
        .journal()
        .record_hours(june_5, &study.id, 2.0)
        .expect("log study");
    state
        .journal()
        .record_hours(june_5, &english.id, 1.0)
        .expect("log english");

    // one partial day
    let june_6 = NaiveDate::from_ymd_opt(2025, 6, 6).expect("date");
    state
        .journal()
        .record_hours(june_6, &study.id, 1.0)
        .expect("log study");

    let stats = state.stats().monthly_stats(june).expect("monthly stats");
    assert!((stats.factor - factor).abs() < 1e-9);
    assert_eq!(stats.total_score, 1000 + (factor * 3.0).round() as i64);
    assert!((stats.total_hours - 4.0).abs() < 1e-9);
    assert!((stats.planned_hours - 90.0).abs() < 1e-9);
    assert_eq!(stats.days_with_data, 2);

    let study_line = stats
        .activities
        .iter()
        .find(|line| line.activity_id == study.id)
        .expect("study line");
    assert!((study_line.hours - 3.0).abs() < 1e-9);
    assert!((study_line.planned_hours - 60.0).abs() < 1e-9);

    // raising importance changes the factor for the whole month
    state
        .activities()
        .update(
            &study.id,
            ActivityUpdateInput {
                importance: Some(5),
                ..Default::default()
            },
        )
        .expect("update importance");
    let rescored = state.stats().monthly_stats(june).expect("rescored stats");
    let new_factor = 30_000.0 / (30.0 * (2.0 * 5.0 + 1.0));
    assert!((rescored.factor - new_factor).abs() < 1e-9);

    // a second month shows up in global stats and history
    let may_10 = NaiveDate::from_ymd_opt(2025, 5, 10).expect("date");
    state
        .journal()
        .record_hours(may_10, &study.id, 2.0)
        .expect("log may");

    let global = state.stats().global_stats().expect("global stats");
    assert_eq!(global.months_tracked, 2);
    assert!((global.total_hours - 6.0).abs() < 1e-9);

    let history = state.stats().monthly_history().expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].key, june);
    assert_eq!(history[1].key, MonthKey::new(2025, 5).expect("month key"));

    // lowered defaults apply to months created afterwards
    state
        .settings()
        .update_config(TrackerConfig {
            default_meta_hours: 80.0,
            default_meta_points: 8_000.0,
        })
        .expect("update config");
    let july = MonthKey::new(2025, 7).expect("month key");
    let july_aggregate = state.journal().open_month(july).expect("open july");
    assert_eq!(july_aggregate.meta.meta_hours, 80.0);
    // existing months keep the defaults they were created with
    let june_again = state.journal().open_month(june).expect("reopen june");
    assert_eq!(june_again.meta.meta_hours, 100.0);
}
