use std::sync::Once;

use chrono::NaiveDate;
use crawlx_core::{
    update, AppState, ConsoleError, Effect, ListQuery, Msg, ScrapedItem, STATS_PAGE_SIZE,
    STATS_REFRESH_INTERVAL,
};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(crawlx_logging::initialize_for_tests);
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 2).unwrap()
}

fn item(id: u64, tags: Option<&[&str]>, scraped_at: &str) -> ScrapedItem {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "source": "spider",
        "title": format!("item {id}"),
        "url": format!("https://example.com/{id}"),
        "tags": tags,
        "scraped_at": scraped_at
    }))
    .unwrap()
}

fn fetch_seq(effects: &[Effect]) -> u64 {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::FetchStats { seq, .. } => Some(*seq),
            _ => None,
        })
        .expect("stats fetch")
}

#[test]
fn opening_starts_polling_and_fetches_immediately() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::StatsViewOpened);
    assert!(state.stats().active);
    assert_eq!(
        effects,
        vec![
            Effect::StartPolling {
                interval: STATS_REFRESH_INTERVAL
            },
            Effect::FetchStats {
                seq: 1,
                query: ListQuery {
                    skip: None,
                    limit: Some(STATS_PAGE_SIZE),
                    tag: None,
                },
            },
        ]
    );

    let (_state, effects) = update(state, Msg::StatsViewOpened);
    assert!(effects.is_empty());
}

#[test]
fn stats_are_derived_from_fetched_items() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::StatsViewOpened);
    let items = vec![
        item(1, Some(&["news"]), "2024-05-02T09:00:00"),
        item(2, Some(&["jobs"]), "2024-05-01T23:59:59"),
        item(3, Some(&["news", "remote"]), "2024-05-02T00:00:00"),
    ];
    let (state, _) = update(
        state,
        Msg::StatsLoaded {
            seq: fetch_seq(&effects),
            today: today(),
            result: Ok(items),
        },
    );

    let stats = state.view().stats.expect("stats");
    assert_eq!(stats.total, 3);
    assert_eq!(stats.news, 2);
    assert_eq!(stats.jobs, 1);
    assert_eq!(stats.today, 2);
    assert_eq!(stats.by_tag.get("remote"), Some(&1));
    // Stats never touch the explorer collection.
    assert!(state.view().explorer.items.is_empty());
}

#[test]
fn ticks_refetch_but_skip_while_in_flight() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::StatsViewOpened);
    let (state, tick_effects) = update(state, Msg::StatsTick);
    assert!(tick_effects.is_empty());

    let (state, _) = update(
        state,
        Msg::StatsLoaded {
            seq: fetch_seq(&effects),
            today: today(),
            result: Ok(vec![]),
        },
    );
    let (_state, tick_effects) = update(state, Msg::StatsTick);
    assert_eq!(fetch_seq(&tick_effects), 2);
}

#[test]
fn closing_stops_polling_and_drops_late_results() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::StatsViewOpened);
    let (state, close_effects) = update(state, Msg::StatsViewClosed);
    assert_eq!(close_effects, vec![Effect::StopPolling]);
    assert!(!state.stats().active);

    let (state, effects) = update(
        state,
        Msg::StatsLoaded {
            seq: fetch_seq(&effects),
            today: today(),
            result: Ok(vec![item(1, None, "2024-05-02T09:00:00")]),
        },
    );
    assert!(effects.is_empty());
    assert!(state.view().stats.is_none());

    let (state, effects) = update(state, Msg::StatsTick);
    assert!(effects.is_empty());
    let (_state, effects) = update(state, Msg::StatsViewClosed);
    assert!(effects.is_empty());
}

#[test]
fn failed_poll_keeps_last_stats() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::StatsViewOpened);
    let (state, _) = update(
        state,
        Msg::StatsLoaded {
            seq: fetch_seq(&effects),
            today: today(),
            result: Ok(vec![item(1, Some(&["news"]), "2024-05-02T09:00:00")]),
        },
    );
    let (state, effects) = update(state, Msg::StatsTick);
    let (mut state, _) = update(
        state,
        Msg::StatsLoaded {
            seq: fetch_seq(&effects),
            today: today(),
            result: Err(ConsoleError::Network("timed out".into())),
        },
    );

    assert_eq!(state.view().stats.map(|s| s.total), Some(1));
    assert!(state.stats().last_error.is_some());
    assert_eq!(state.take_notices().len(), 1);
}
