use std::sync::Once;

use crawlx_core::{
    update, AppState, ConsoleError, Effect, JobPhase, JobStatus, Msg, NoticeLevel, NoticeScope,
    ScrapeJobRequest, ScrapeJobResponse, JOB_REFRESH_DELAY,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(crawlx_logging::initialize_for_tests);
}

fn accepted(spiders: &[&str]) -> ScrapeJobResponse {
    ScrapeJobResponse {
        status: "started".to_string(),
        spiders: spiders.iter().map(|s| s.to_string()).collect(),
        message: format!("Scheduled {} spiders", spiders.len()),
    }
}

#[test]
fn trigger_moves_to_triggering_and_emits_request() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::RunScrapersClicked {
            spiders: vec!["news".into(), "jobs".into()],
        },
    );

    assert_eq!(state.jobs().phase, JobPhase::Triggering);
    assert_eq!(state.view().jobs.status, JobStatus::Triggering);
    assert_eq!(
        effects,
        vec![Effect::RunScrapers {
            request: ScrapeJobRequest {
                spiders: Some(vec!["news".into(), "jobs".into()]),
            },
        }]
    );
}

#[test]
fn empty_selection_means_all_jobs() {
    init_logging();
    let (_state, effects) = update(AppState::new(), Msg::RunScrapersClicked { spiders: vec![] });
    assert_eq!(
        effects,
        vec![Effect::RunScrapers {
            request: ScrapeJobRequest::all(),
        }]
    );
}

#[test]
fn repeated_trigger_while_in_flight_is_rejected() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::RunScrapersClicked { spiders: vec![] });
    let (state, effects) = update(state, Msg::RunScrapersClicked { spiders: vec![] });

    assert!(effects.is_empty());
    assert_eq!(state.jobs().phase, JobPhase::Triggering);
}

#[test]
fn success_returns_to_idle_and_schedules_one_refresh() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::RunScrapersClicked { spiders: vec![] });
    let (mut state, effects) = update(state, Msg::ScrapersTriggered(Ok(accepted(&["news", "jobs"]))));

    assert_eq!(state.jobs().phase, JobPhase::Idle);
    assert_eq!(
        effects,
        vec![Effect::ScheduleRefresh {
            delay: JOB_REFRESH_DELAY
        }]
    );
    let view = state.view();
    assert_eq!(view.jobs.scheduled_spiders, vec!["news", "jobs"]);
    assert_eq!(view.jobs.last_message.as_deref(), Some("Scheduled 2 spiders"));

    let notices = state.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].scope, NoticeScope::Jobs);
    assert_eq!(notices[0].level, NoticeLevel::Info);
}

#[test]
fn failure_surfaces_error_then_resets_to_idle() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::RunScrapersClicked { spiders: vec![] });
    let err = ConsoleError::Network("connection refused".into());
    let (mut state, effects) = update(state, Msg::ScrapersTriggered(Err(err.clone())));

    assert!(effects.is_empty());
    assert_eq!(state.jobs().phase, JobPhase::Failed(err));
    let notices = state.take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);

    let (state, effects) = update(state, Msg::NoticesShown);
    assert!(effects.is_empty());
    assert_eq!(state.jobs().phase, JobPhase::Idle);

    // Control is usable again.
    let (_state, effects) = update(state, Msg::RunScrapersClicked { spiders: vec![] });
    assert_eq!(effects.len(), 1);
}

#[test]
fn stray_completion_without_trigger_is_ignored() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::ScrapersTriggered(Ok(accepted(&[]))));
    assert!(effects.is_empty());
    assert_eq!(state, AppState::new());
}

#[test]
fn refresh_due_reloads_explorer_and_active_stats() {
    init_logging();
    let (state, opened) = update(AppState::new(), Msg::StatsViewOpened);
    let seq = opened
        .iter()
        .find_map(|effect| match effect {
            Effect::FetchStats { seq, .. } => Some(*seq),
            _ => None,
        })
        .expect("initial stats fetch");
    let (state, _) = update(state, Msg::QueryChanged("rust".into()));

    // First stats fetch still in flight: refresh only touches the explorer.
    let (state, effects) = update(state, Msg::JobRefreshDue);
    assert_eq!(effects.len(), 1);
    assert!(matches!(effects[0], Effect::SearchItems { .. }));

    let (state, _) = update(
        state,
        Msg::StatsLoaded {
            seq,
            today: chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            result: Ok(vec![]),
        },
    );
    let (_state, effects) = update(state, Msg::JobRefreshDue);
    assert_eq!(effects.len(), 2);
    assert!(matches!(effects[1], Effect::FetchStats { .. }));
}
