mod common;

use std::sync::mpsc;
use std::time::{Duration, Instant};

use common::read_fixture;
use sf6_terminal::api::{ApiError, MrPoint, OpponentRecord, StatsSummary, parse_json};
use sf6_terminal::prefs::{DEFAULT_CHART_LIMIT, PrefStore};
use sf6_terminal::state::{Delta, ProviderCommand};
use sf6_terminal::stats::{StatsController, build_cards, build_chart, win_rate, win_rate_label};

fn summary_fixture() -> StatsSummary {
    parse_json(&read_fixture("stats_summary.json")).expect("summary fixture")
}

fn history_fixture() -> Vec<MrPoint> {
    parse_json(&read_fixture("mr_history.json")).expect("history fixture")
}

fn controller() -> (StatsController, mpsc::Receiver<ProviderCommand>) {
    let (tx, rx) = mpsc::channel();
    let prefs = PrefStore::in_memory().shared();
    (
        StatsController::new(prefs, Some(tx), Duration::from_secs(30)),
        rx,
    )
}

#[test]
fn win_rate_rounds_to_one_decimal() {
    assert_eq!(win_rate(7, 3), Some(70.0));
    assert_eq!(win_rate(0, 0), None);
    assert_eq!(win_rate(1, 2), Some(33.3));
    assert_eq!(win_rate(2, 1), Some(66.7));
    assert_eq!(win_rate_label(0, 0), "-");
    assert_eq!(win_rate_label(1, 2), "33.3%");
}

#[test]
fn cards_use_summary_buckets() {
    let cards = build_cards(&summary_fixture(), 100, None);
    let titles = cards.iter().map(|c| c.title.as_str()).collect::<Vec<_>>();
    assert_eq!(titles, vec!["TOTAL", "RECENT 100", "vs Cammy", "vs Punk"]);

    assert_eq!(cards[0].rate_label(), "70.0%");
    assert_eq!(cards[0].record_label(), "7W 3L");
    assert_eq!(cards[1].rate_label(), "33.3%");
    assert_eq!(cards[2].rate_label(), "80.0%");
    // A named opponent with no decided games still gets the placeholder.
    assert_eq!(cards[3].rate_label(), "-");
    assert_eq!(cards[3].record_label(), "-");
}

#[test]
fn missing_buckets_fall_back_to_generic_titles() {
    let mut summary = summary_fixture();
    summary.last_opponent_char = None;
    summary.last_opponent_name = None;
    let cards = build_cards(&summary, 50, None);
    assert_eq!(cards[1].title, "RECENT 50");
    assert_eq!(cards[2].title, "vs Char");
    assert_eq!(cards[3].title, "vs Player");
    assert_eq!(cards[2].rate_label(), "-");
}

#[test]
fn selected_opponent_overrides_last_opponent_card() {
    let record: OpponentRecord = parse_json(&read_fixture("opponent.json")).expect("fixture");
    let cards = build_cards(&summary_fixture(), 100, Some(&record));
    assert_eq!(cards[3].title, "vs Tokido");
    assert_eq!(cards[3].record_label(), "2W 6L");
    assert_eq!(cards[3].rate_label(), "25.0%");
}

#[test]
fn chart_has_at_most_three_ticks() {
    let chart = build_chart(&history_fixture(), 1).expect("non-empty history");
    assert_eq!(chart.points.len(), 3);
    assert!(chart.ticks.len() <= 3);
    assert_eq!(chart.y_bounds, [1650.0, 1712.0]);
    assert_eq!(chart.points[2], (2.0, 1712.0));
    assert!(build_chart(&[], 2).is_none());
}

#[test]
fn start_loads_everything_then_polls_every_thirty_seconds() {
    let (mut stats, rx) = controller();
    let start = Instant::now();
    stats.start(start);
    let sent = rx.try_iter().collect::<Vec<_>>();
    assert_eq!(
        sent,
        vec![
            ProviderCommand::FetchOpponents,
            ProviderCommand::FetchStatsSummary {
                limit: DEFAULT_CHART_LIMIT
            },
            ProviderCommand::FetchMrHistory {
                limit: DEFAULT_CHART_LIMIT
            },
        ]
    );

    // Already running: no second load.
    stats.start(start);
    assert_eq!(rx.try_iter().count(), 0);

    stats.tick(start + Duration::from_secs(29));
    assert_eq!(rx.try_iter().count(), 0);
    stats.tick(start + Duration::from_secs(30));
    assert_eq!(rx.try_iter().count(), 2);

    stats.stop();
    stats.tick(start + Duration::from_secs(90));
    assert_eq!(rx.try_iter().count(), 0);
}

#[test]
fn results_after_stop_are_ignored() {
    let (mut stats, _rx) = controller();
    stats.start(Instant::now());
    stats.stop();
    stats.apply_delta(Delta::SetStatsSummary {
        limit: 100,
        summary: summary_fixture(),
    });
    assert!(stats.view.summary.is_none());
    assert_eq!(stats.view.cards[0].rate_label(), "-");
}

#[test]
fn empty_history_keeps_previous_chart() {
    let (mut stats, _rx) = controller();
    stats.start(Instant::now());
    stats.apply_delta(Delta::SetMrHistory(history_fixture()));
    let first = stats.view.chart.clone().expect("chart");
    assert_eq!(first.generation, 1);

    stats.apply_delta(Delta::SetMrHistory(Vec::new()));
    assert_eq!(stats.view.chart.as_ref(), Some(&first));

    stats.apply_delta(Delta::SetMrHistory(history_fixture()));
    assert_eq!(stats.view.chart.as_ref().map(|c| c.generation), Some(2));
}

#[test]
fn step_limit_persists_and_reloads() {
    let (tx, rx) = mpsc::channel();
    let prefs = PrefStore::in_memory().shared();
    let mut stats = StatsController::new(prefs.clone(), Some(tx), Duration::from_secs(30));
    stats.start(Instant::now());
    rx.try_iter().for_each(drop);

    stats.step_limit(true);
    assert_eq!(prefs.borrow().chart_limit(), 200);
    let sent = rx.try_iter().collect::<Vec<_>>();
    assert!(sent.contains(&ProviderCommand::FetchStatsSummary { limit: 200 }));
    assert!(sent.contains(&ProviderCommand::FetchMrHistory { limit: 200 }));

    stats.step_limit(true);
    stats.step_limit(true);
    assert_eq!(prefs.borrow().chart_limit(), 500);
    rx.try_iter().for_each(drop);
    // Already at the top preset.
    stats.step_limit(true);
    assert_eq!(rx.try_iter().count(), 0);
}

#[test]
fn opponent_selection_survives_refresh() {
    let (mut stats, rx) = controller();
    let start = Instant::now();
    stats.start(start);
    rx.try_iter().for_each(drop);

    stats.apply_delta(Delta::SetOpponents(vec![
        "Punk".to_string(),
        "Tokido".to_string(),
    ]));
    stats.apply_delta(Delta::SetStatsSummary {
        limit: 100,
        summary: summary_fixture(),
    });

    stats.next_opponent();
    stats.next_opponent();
    assert_eq!(stats.view.selected_opponent.as_deref(), Some("Tokido"));
    let sent = rx.try_iter().collect::<Vec<_>>();
    assert_eq!(
        sent.last(),
        Some(&ProviderCommand::FetchOpponentRecord {
            name: "Tokido".to_string()
        })
    );

    let record: OpponentRecord = parse_json(&read_fixture("opponent.json")).expect("fixture");
    stats.apply_delta(Delta::SetOpponentRecord(record));
    assert_eq!(stats.view.cards[3].title, "vs Tokido");

    stats.tick(start + Duration::from_secs(30));
    let sent = rx.try_iter().collect::<Vec<_>>();
    assert!(sent.contains(&ProviderCommand::FetchOpponentRecord {
        name: "Tokido".to_string()
    }));
    stats.apply_delta(Delta::SetStatsSummary {
        limit: 100,
        summary: summary_fixture(),
    });
    assert_eq!(stats.view.cards[3].title, "vs Tokido");

    stats.clear_opponent();
    assert_eq!(stats.view.cards[3].title, "vs Punk");
}

#[test]
fn stats_failures_go_to_console() {
    let (mut stats, _rx) = controller();
    stats.start(Instant::now());
    stats.apply_delta(Delta::StatsFailed {
        what: "summary",
        error: ApiError::Transport("connection refused".to_string()),
    });
    assert_eq!(
        stats.drain_console(),
        vec!["[WARN] Failed to load summary: connection refused".to_string()]
    );
    assert!(stats.drain_console().is_empty());
}
