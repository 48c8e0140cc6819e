use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::api::{MrPoint, OpponentRecord, StatsSummary};
use crate::prefs::SharedPrefs;
use crate::state::{Delta, ProviderCommand};
use crate::timer::IntervalTimer;

pub const CHART_LIMIT_PRESETS: [u32; 4] = [50, 100, 200, 500];
pub const PLACEHOLDER: &str = "-";
const MAX_TICKS: usize = 3;

/// Percent of wins, one decimal. `None` when nothing was played.
pub fn win_rate(wins: u32, losses: u32) -> Option<f64> {
    let total = wins + losses;
    if total == 0 {
        return None;
    }
    let pct = f64::from(wins) / f64::from(total) * 100.0;
    Some((pct * 10.0).round() / 10.0)
}

pub fn win_rate_label(wins: u32, losses: u32) -> String {
    match win_rate(wins, losses) {
        Some(rate) => format!("{rate:.1}%"),
        None => PLACEHOLDER.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatCard {
    pub title: String,
    pub record: Option<(u32, u32)>,
}

impl StatCard {
    fn new(title: impl Into<String>, record: Option<(u32, u32)>) -> Self {
        Self {
            title: title.into(),
            record,
        }
    }

    pub fn win_rate(&self) -> Option<f64> {
        self.record.and_then(|(w, l)| win_rate(w, l))
    }

    pub fn rate_label(&self) -> String {
        match self.win_rate() {
            Some(rate) => format!("{rate:.1}%"),
            None => PLACEHOLDER.to_string(),
        }
    }

    pub fn record_label(&self) -> String {
        match self.record {
            Some((w, l)) if w + l > 0 => format!("{w}W {l}L"),
            _ => PLACEHOLDER.to_string(),
        }
    }

    /// Progress-bar fill in 0..=1.
    pub fn ratio(&self) -> f64 {
        self.win_rate().map(|r| (r / 100.0).clamp(0.0, 1.0)).unwrap_or(0.0)
    }
}

/// TOTAL, RECENT N, vs last character, vs last (or selected) player.
pub fn build_cards(
    summary: &StatsSummary,
    limit: u32,
    selected: Option<&OpponentRecord>,
) -> [StatCard; 4] {
    let total = StatCard::new("TOTAL", Some((summary.total.wins, summary.total.losses)));
    let recent = StatCard::new(
        format!("RECENT {limit}"),
        Some((summary.recent_100.wins, summary.recent_100.losses)),
    );
    let vs_char = match &summary.last_opponent_char {
        Some(bucket) => StatCard::new(
            format!("vs {}", bucket.character),
            Some((bucket.wins, bucket.losses)),
        ),
        None => StatCard::new("vs Char", None),
    };
    let vs_player = match (selected, &summary.last_opponent_name) {
        (Some(record), _) => StatCard::new(
            format!("vs {}", record.opponent_name),
            Some((record.wins, record.losses)),
        ),
        (None, Some(bucket)) => StatCard::new(
            format!("vs {}", bucket.name),
            Some((bucket.wins, bucket.losses)),
        ),
        (None, None) => StatCard::new("vs Player", None),
    };
    [total, recent, vs_char, vs_player]
}

pub fn empty_cards(limit: u32) -> [StatCard; 4] {
    [
        StatCard::new("TOTAL", None),
        StatCard::new(format!("RECENT {limit}"), None),
        StatCard::new("vs Char", None),
        StatCard::new("vs Player", None),
    ]
}

/// One line series. Rebuilt from scratch on every load.
#[derive(Debug, Clone, PartialEq)]
pub struct MrChart {
    pub points: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub ticks: Vec<f64>,
    pub generation: u32,
}

pub fn build_chart(history: &[MrPoint], generation: u32) -> Option<MrChart> {
    if history.is_empty() {
        return None;
    }
    let points = history
        .iter()
        .enumerate()
        .map(|(idx, p)| (idx as f64, p.mr as f64))
        .collect::<Vec<_>>();
    let (min, max) = points
        .iter()
        .fold((f64::MAX, f64::MIN), |(lo, hi), (_, y)| (lo.min(*y), hi.max(*y)));
    let y_bounds = if max > min {
        [min, max]
    } else {
        [min - 10.0, max + 10.0]
    };
    Some(MrChart {
        x_bounds: [0.0, (points.len().saturating_sub(1)).max(1) as f64],
        y_bounds,
        ticks: chart_ticks(min, max),
        points,
        generation,
    })
}

/// Low, middle and high value; fewer when they collapse.
pub fn chart_ticks(min: f64, max: f64) -> Vec<f64> {
    if max <= min {
        return vec![min.round()];
    }
    let mut ticks = vec![min.round(), ((min + max) / 2.0).round(), max.round()];
    ticks.dedup();
    ticks.truncate(MAX_TICKS);
    ticks
}

pub fn next_chart_limit(current: u32, forward: bool) -> u32 {
    let last = CHART_LIMIT_PRESETS.len() - 1;
    let Some(idx) = CHART_LIMIT_PRESETS
        .iter()
        .position(|preset| *preset >= current)
    else {
        return CHART_LIMIT_PRESETS[last];
    };
    let exact = CHART_LIMIT_PRESETS[idx] == current;
    let next = if forward {
        if exact { idx + 1 } else { idx }
    } else {
        idx.saturating_sub(1)
    };
    CHART_LIMIT_PRESETS[next.min(last)]
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatsView {
    pub limit: u32,
    pub summary: Option<StatsSummary>,
    pub cards: [StatCard; 4],
    pub chart: Option<MrChart>,
    pub opponents: Vec<String>,
    pub selected_opponent: Option<String>,
    pub opponent_record: Option<OpponentRecord>,
    pub loads: u32,
}

impl StatsView {
    pub fn new(limit: u32) -> Self {
        Self {
            limit,
            summary: None,
            cards: empty_cards(limit),
            chart: None,
            opponents: Vec::new(),
            selected_opponent: None,
            opponent_record: None,
            loads: 0,
        }
    }

    fn rebuild_cards(&mut self) {
        let selected = self
            .opponent_record
            .as_ref()
            .filter(|rec| self.selected_opponent.as_deref() == Some(rec.opponent_name.as_str()));
        self.cards = match &self.summary {
            Some(summary) => build_cards(summary, self.limit, selected),
            None => empty_cards(self.limit),
        };
    }
}

/// Owns the 30s refresh timer for the stats screen.
pub struct StatsController {
    pub view: StatsView,
    prefs: SharedPrefs,
    cmd_tx: Option<Sender<ProviderCommand>>,
    poll: Duration,
    timer: Option<IntervalTimer>,
    console: Vec<String>,
}

impl StatsController {
    pub fn new(prefs: SharedPrefs, cmd_tx: Option<Sender<ProviderCommand>>, poll: Duration) -> Self {
        let limit = prefs.borrow().chart_limit();
        Self {
            view: StatsView::new(limit),
            prefs,
            cmd_tx,
            poll,
            timer: None,
            console: Vec::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Screen opened: load now, then every poll period. No-op when already running.
    pub fn start(&mut self, now: Instant) {
        if self.timer.is_some() {
            return;
        }
        self.view = StatsView::new(self.prefs.borrow().chart_limit());
        self.send(ProviderCommand::FetchOpponents);
        self.load();
        self.timer = Some(IntervalTimer::start(self.poll, now));
    }

    pub fn stop(&mut self) {
        self.timer = None;
    }

    pub fn tick(&mut self, now: Instant) {
        if self.timer.as_mut().is_some_and(|t| t.fire_due(now)) {
            self.load();
        }
    }

    /// Summary and MR history, both bounded by the stored chart limit.
    pub fn load(&mut self) {
        let limit = self.prefs.borrow().chart_limit();
        self.view.limit = limit;
        self.view.loads += 1;
        self.send(ProviderCommand::FetchStatsSummary { limit });
        self.send(ProviderCommand::FetchMrHistory { limit });
        if let Some(name) = self.view.selected_opponent.clone() {
            self.send(ProviderCommand::FetchOpponentRecord { name });
        }
    }

    pub fn step_limit(&mut self, forward: bool) {
        let current = self.prefs.borrow().chart_limit();
        let next = next_chart_limit(current, forward);
        if next == current {
            return;
        }
        if let Err(err) = self.prefs.borrow_mut().set_chart_limit(next) {
            self.console
                .push(format!("[WARN] Saving chart limit failed: {err:#}"));
        }
        self.load();
    }

    pub fn next_opponent(&mut self) {
        if self.view.opponents.is_empty() {
            self.send(ProviderCommand::FetchOpponents);
            return;
        }
        let next = match &self.view.selected_opponent {
            Some(current) => self
                .view
                .opponents
                .iter()
                .position(|name| name == current)
                .map(|idx| (idx + 1) % self.view.opponents.len())
                .unwrap_or(0),
            None => 0,
        };
        let name = self.view.opponents[next].clone();
        self.view.selected_opponent = Some(name.clone());
        self.send(ProviderCommand::FetchOpponentRecord { name });
    }

    pub fn clear_opponent(&mut self) {
        self.view.selected_opponent = None;
        self.view.opponent_record = None;
        self.view.rebuild_cards();
    }

    /// Results that arrive after the screen closed are dropped.
    pub fn apply_delta(&mut self, delta: Delta) {
        if !self.is_running() {
            return;
        }
        match delta {
            Delta::SetStatsSummary { limit, summary } => {
                self.view.limit = limit;
                self.view.summary = Some(summary);
                self.view.rebuild_cards();
            }
            Delta::SetMrHistory(history) => {
                let generation = self.view.chart.as_ref().map_or(1, |c| c.generation + 1);
                if let Some(chart) = build_chart(&history, generation) {
                    self.view.chart = Some(chart);
                }
            }
            Delta::SetOpponents(names) => self.view.opponents = names,
            Delta::SetOpponentRecord(record) => {
                if self.view.selected_opponent.as_deref() == Some(record.opponent_name.as_str()) {
                    self.view.opponent_record = Some(record);
                    self.view.rebuild_cards();
                }
            }
            Delta::StatsFailed { what, error } => {
                self.console
                    .push(format!("[WARN] Failed to load {what}: {error}"));
            }
            _ => {}
        }
    }

    /// Console lines produced since the last call.
    pub fn drain_console(&mut self) -> Vec<String> {
        std::mem::take(&mut self.console)
    }

    fn send(&mut self, cmd: ProviderCommand) {
        let Some(tx) = &self.cmd_tx else {
            return;
        };
        if tx.send(cmd).is_err() {
            self.console
                .push("[WARN] Provider is gone; stats request dropped".to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_never_exceed_three() {
        assert_eq!(chart_ticks(1500.0, 1700.0), vec![1500.0, 1600.0, 1700.0]);
        assert_eq!(chart_ticks(1500.0, 1500.0), vec![1500.0]);
        assert_eq!(chart_ticks(1500.0, 1501.0).len(), 2);
    }

    #[test]
    fn limit_presets_step_both_ways() {
        assert_eq!(next_chart_limit(100, true), 200);
        assert_eq!(next_chart_limit(100, false), 50);
        assert_eq!(next_chart_limit(500, true), 500);
        assert_eq!(next_chart_limit(50, false), 50);
        // Off-preset values snap to the next preset up.
        assert_eq!(next_chart_limit(120, true), 200);
        assert_eq!(next_chart_limit(9999, true), 500);
        assert_eq!(next_chart_limit(9999, false), 500);
    }

    #[test]
    fn flat_history_still_has_vertical_room() {
        let history = vec![
            MrPoint { mr: 1500, date: None, result: None },
            MrPoint { mr: 1500, date: None, result: None },
        ];
        let chart = build_chart(&history, 1).expect("non-empty");
        assert!(chart.y_bounds[0] < chart.y_bounds[1]);
        assert_eq!(chart.ticks, vec![1500.0]);
    }
}
