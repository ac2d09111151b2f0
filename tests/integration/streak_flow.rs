use chrono::{Days, NaiveDate};
use studygrid::app::AppState;
use studygrid::models::weight::ActivityCreateInput;
use tempfile::tempdir;

#[test]
fn streaks_survive_month_boundaries_and_an_unlogged_today() {
    let dir = tempdir().expect("temp dir");
    let state = AppState::open(dir.path()).expect("app state");

    let study = state
        .activities()
        .create(ActivityCreateInput {
            name: "Study".into(),
            target: Some(2.0),
            ..Default::default()
        })
        .expect("create study");
    let english = state
        .activities()
        .create(ActivityCreateInput {
            name: "English".into(),
            target: Some(1.0),
            ..Default::default()
        })
        .expect("create english");

    // ten consecutive days ending July 3, crossing the June/July boundary
    let today = NaiveDate::from_ymd_opt(2025, 7, 3).expect("date");
    for offset in 0..10 {
        let date = today.checked_sub_days(Days::new(offset)).expect("date");
        state
            .journal()
            .record_hours(date, &study.id, 1.5)
            .expect("log study");
    }

    assert_eq!(
        state.streaks().current_streak(&study.id, today).expect("streak"),
        10
    );

    // the day after, with nothing logged yet, the run still stands
    let tomorrow = today.checked_add_days(Days::new(1)).expect("date");
    assert_eq!(
        state
            .streaks()
            .current_streak(&study.id, tomorrow)
            .expect("streak"),
        10
    );

    // a below-threshold day in the past breaks it there
    let june_30 = NaiveDate::from_ymd_opt(2025, 6, 30).expect("date");
    state
        .journal()
        .record_hours(june_30, &study.id, 0.25)
        .expect("log below threshold");
    assert_eq!(
        state.streaks().current_streak(&study.id, today).expect("streak"),
        3
    );

    // per-activity isolation: english has its own run
    state
        .journal()
        .record_hours(today, &english.id, 1.0)
        .expect("log english");
    let streaks = state.streaks().current_streaks(today).expect("streak map");
    assert_eq!(streaks.get(&study.id), Some(&3));
    assert_eq!(streaks.get(&english.id), Some(&1));

    // hiding an activity drops it from the bulk view but not the direct query
    state
        .activities()
        .set_hidden(&english.id, true)
        .expect("hide english");
    let visible_streaks = state.streaks().current_streaks(today).expect("streak map");
    assert!(!visible_streaks.contains_key(&english.id));
    assert_eq!(
        state
            .streaks()
            .current_streak(&english.id, today)
            .expect("streak"),
        1
    );
}
