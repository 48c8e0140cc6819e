use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use crate::api::{ApiError, CollectOutcome, SystemStatus};
use crate::clipboard::{ClipboardStrategy, copy_with_fallbacks};
use crate::config::AppConfig;
use crate::notify::Notifier;
use crate::prefs::SharedPrefs;
use crate::state::{ControlId, ControlStyle, DashboardState, Delta, ProviderCommand};
use crate::timer::{Delay, IntervalTimer};
use crate::view::{Connection, auth_badge, db_badge, format_timestamp, history_view};

pub const DEFAULT_COLLECT_INTERVAL_SECS: u64 = 30;
pub const MAX_COLLECT_INTERVAL_SECS: u64 = 86_400;

const LOGIN_CONFIRM: &str = "This will open a browser window on the server. Continue?";
const DELETE_CONFIRM: &str = "WARNING: This will permanently delete ALL match history and player data!\n\nAre you sure you want to continue?";

/// Collection loop: stopped, or running on the one timer the toggle owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionLoop {
    Stopped,
    Running { interval_secs: u64 },
}

/// Interval input as typed; blank, non-numeric, zero or over a day falls back to the default.
pub fn parse_interval(input: &str) -> u64 {
    input
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| (1..=MAX_COLLECT_INTERVAL_SECS).contains(secs))
        .unwrap_or(DEFAULT_COLLECT_INTERVAL_SECS)
}

pub struct Dashboard<N: Notifier> {
    pub state: DashboardState,
    notifier: N,
    prefs: SharedPrefs,
    cmd_tx: Option<Sender<ProviderCommand>>,
    clipboard: Vec<Box<dyn ClipboardStrategy>>,
    status_poll: Duration,
    history_limit: u32,
    login_status_delay: Duration,
    stats_url: String,
    status_timer: Option<IntervalTimer>,
    collect_timer: Option<IntervalTimer>,
    status_followup: Option<Delay>,
}

impl<N: Notifier> Dashboard<N> {
    pub fn new(
        config: &AppConfig,
        notifier: N,
        prefs: SharedPrefs,
        cmd_tx: Option<Sender<ProviderCommand>>,
        clipboard: Vec<Box<dyn ClipboardStrategy>>,
    ) -> Self {
        let mut state = DashboardState::new();
        state.filter_input = prefs
            .borrow()
            .character_filter()
            .unwrap_or_default()
            .to_string();
        Self {
            state,
            notifier,
            prefs,
            cmd_tx,
            clipboard,
            status_poll: config.status_poll,
            history_limit: config.history_limit,
            login_status_delay: config.login_status_delay,
            stats_url: config.stats_url(),
            status_timer: None,
            collect_timer: None,
            status_followup: None,
        }
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }

    /// Page load: one status fetch, one history render, then the status poll.
    pub fn load(&mut self, now: Instant) {
        self.state.page_loads += 1;
        self.fetch_status();
        self.render_history();
        self.send(ProviderCommand::FetchUserCode);
        self.status_timer = Some(IntervalTimer::start(self.status_poll, now));
    }

    /// Full reset, as after a page reload. The collection loop does not survive it.
    pub fn reload(&mut self, now: Instant) {
        let page_loads = self.state.page_loads;
        let logs = std::mem::take(&mut self.state.logs);
        self.state = DashboardState::new();
        self.state.page_loads = page_loads;
        self.state.logs = logs;
        self.state.filter_input = self
            .prefs
            .borrow()
            .character_filter()
            .unwrap_or_default()
            .to_string();
        self.collect_timer = None;
        self.status_followup = None;
        self.state.push_log("[INFO] Dashboard reloaded");
        self.load(now);
    }

    pub fn tick(&mut self, now: Instant) {
        if self
            .status_timer
            .as_mut()
            .is_some_and(|timer| timer.fire_due(now))
        {
            self.fetch_status();
        }
        if self.status_followup.is_some_and(|delay| delay.is_due(now)) {
            self.status_followup = None;
            self.fetch_status();
        }
        if self
            .collect_timer
            .as_mut()
            .is_some_and(|timer| timer.fire_due(now))
        {
            self.collect_once();
        }
    }

    pub fn collection(&self) -> CollectionLoop {
        match self.collect_timer {
            Some(timer) => CollectionLoop::Running {
                interval_secs: timer.period().as_secs(),
            },
            None => CollectionLoop::Stopped,
        }
    }

    pub fn fetch_status(&mut self) {
        self.send(ProviderCommand::FetchStatus);
    }

    pub fn render_history(&mut self) {
        self.send(ProviderCommand::FetchMatches {
            limit: self.history_limit,
        });
    }

    pub fn login(&mut self) {
        if !self.state.controls.is_enabled(ControlId::Login) {
            return;
        }
        if !self.notifier.confirm(LOGIN_CONFIRM) {
            return;
        }
        self.state
            .controls
            .acquire(ControlId::Login, "Opening Browser...");
        self.send(ProviderCommand::Login);
    }

    pub fn refresh(&mut self) {
        if !self.state.controls.acquire(ControlId::Refresh, "Scraping...") {
            return;
        }
        self.send(ProviderCommand::Refresh);
    }

    /// Manual trigger; ignored while the button is disabled.
    pub fn collect_pressed(&mut self) {
        if self.state.controls.is_enabled(ControlId::Collect) {
            self.collect_once();
        }
    }

    /// One collection request. Timer ticks land here even while one is in flight.
    pub fn collect_once(&mut self) {
        self.state
            .controls
            .force_busy(ControlId::Collect, "Collecting...");
        self.state.collect_status = "Collecting...".to_string();
        self.send(ProviderCommand::CollectMatches);
    }

    pub fn toggle_periodic(&mut self, now: Instant) {
        if self.collect_timer.is_some() {
            self.stop_periodic();
        } else {
            self.start_periodic(now);
        }
    }

    fn start_periodic(&mut self, now: Instant) {
        let interval_secs = parse_interval(&self.state.interval_input);
        self.collect_once();
        self.collect_timer = Some(IntervalTimer::start(
            Duration::from_secs(interval_secs),
            now,
        ));
        self.state.collect_status = format!("Running every {interval_secs}s");
        self.state.push_collection_log(format!(
            "Periodic collection started (every {interval_secs}s)."
        ));
        self.state
            .controls
            .set_label(ControlId::PeriodicToggle, "Stop Collect", ControlStyle::Danger);
    }

    fn stop_periodic(&mut self) {
        self.collect_timer = None;
        self.state.collect_status = "Stopped".to_string();
        self.state
            .push_collection_log("Periodic collection stopped.");
        self.state
            .controls
            .set_label(ControlId::PeriodicToggle, "Start Collect", ControlStyle::Primary);
    }

    pub fn edit_interval(&mut self) {
        let current = self.state.interval_input.clone();
        if let Some(value) = self
            .notifier
            .prompt_text("Collect interval (seconds)", &current)
        {
            self.state.interval_input = value.trim().to_string();
        }
    }

    pub fn edit_filter(&mut self) {
        let current = self.state.filter_input.clone();
        if let Some(value) = self.notifier.prompt_text("Character filter", &current) {
            self.state.filter_input = value;
            self.apply_filter();
        }
    }

    /// Stores the filter input (blank clears it), tells the user, re-renders history.
    pub fn apply_filter(&mut self) {
        let input = self.state.filter_input.trim().to_string();
        if let Err(err) = self.prefs.borrow_mut().set_character_filter(&input) {
            self.state
                .push_log(format!("[WARN] Saving filter failed: {err:#}"));
        }
        self.state.filter_input = input.clone();
        if input.is_empty() {
            self.notifier.notify("Character filter cleared.");
        } else {
            self.notifier.notify(&format!(
                "Character filter set to \"{input}\". Refreshing match history."
            ));
        }
        self.render_history();
    }

    pub fn delete_database(&mut self) {
        if !self.state.controls.is_enabled(ControlId::DeleteDb) {
            return;
        }
        if !self.notifier.confirm(DELETE_CONFIRM) {
            return;
        }
        self.state.controls.acquire(ControlId::DeleteDb, "Deleting...");
        self.send(ProviderCommand::DeleteDatabase);
    }

    /// Local-only; the caller switches screens when this returns true.
    pub fn open_stats(&mut self) -> bool {
        if !self.state.controls.acquire(ControlId::OpenStats, "Opening...") {
            return false;
        }
        self.state.push_log("[INFO] Opening stats");
        self.state.controls.release(ControlId::OpenStats);
        true
    }

    pub fn copy_stats_url(&mut self) {
        if !self.state.controls.acquire(ControlId::CopyUrl, "Copying...") {
            return;
        }
        let url = self.stats_url.clone();
        match copy_with_fallbacks(&url, &mut self.clipboard) {
            Ok(via) => {
                self.state.push_log(format!("[INFO] Stats URL copied via {via}"));
                self.notifier
                    .notify(&format!("Stats URL copied to clipboard!\n{url}"));
            }
            Err(errors) => {
                for err in errors {
                    self.state.push_log(format!("[WARN] Copy failed: {err}"));
                }
                self.notifier.prompt_copy("Copy this URL manually:", &url);
            }
        }
        self.state.controls.release(ControlId::CopyUrl);
    }

    pub fn edit_user_code(&mut self) {
        if !self.state.controls.is_enabled(ControlId::UserCode) {
            return;
        }
        let current = self.state.user_code.clone().unwrap_or_default();
        let Some(code) = self.notifier.prompt_text("CFN user code", &current) else {
            return;
        };
        self.state.controls.acquire(ControlId::UserCode, "Saving...");
        self.send(ProviderCommand::SetUserCode {
            code: code.trim().to_string(),
        });
    }

    pub fn apply_delta(&mut self, delta: Delta, now: Instant) {
        match delta {
            Delta::SetStatus(status) => self.on_status(status),
            Delta::StatusFailed(err) => {
                self.state.connection = Connection::Disconnected;
                self.state.push_log(format!("[WARN] Status poll failed: {err}"));
            }
            Delta::LoginFinished(result) => self.on_login(result, now),
            Delta::RefreshFinished(result) => self.on_refresh(result),
            Delta::CollectFinished(result) => self.on_collect(result),
            Delta::SetMatches(matches) => {
                let filter = self.prefs.borrow().character_filter().map(str::to_string);
                self.state.history = history_view(&matches, filter.as_deref());
            }
            Delta::MatchesFailed(err) => {
                self.state
                    .push_log(format!("[WARN] Failed to display match history: {err}"));
            }
            Delta::DeleteFinished(result) => self.on_delete(result, now),
            Delta::SetUserCode(code) => {
                self.state.user_code = Some(code).filter(|c| !c.is_empty());
            }
            Delta::UserCodeSaved(result) => {
                match result {
                    Ok(code) => {
                        self.state.user_code = Some(code.clone()).filter(|c| !c.is_empty());
                        self.notifier.notify(&format!("User code saved: {code}"));
                    }
                    Err(err) => self
                        .notifier
                        .notify(&format!("Failed to save user code: {err}")),
                }
                self.state.controls.release(ControlId::UserCode);
            }
            Delta::Log(msg) => self.state.push_log(msg),
            other => {
                self.state
                    .push_log(format!("[INFO] Ignored update: {other:?}"));
            }
        }
    }

    /// Badges follow the flags; a failed poll elsewhere leaves them as they were.
    fn on_status(&mut self, status: SystemStatus) {
        self.state.connection = Connection::Connected;
        self.state.auth = auth_badge(status.auth_exists);
        self.state.db = db_badge(status.db_exists);
        if let Some(player) = status.latest_player {
            self.state.last_update = Some(format_timestamp(&player.last_updated));
            self.state.player = Some(player);
        }
    }

    fn on_login(&mut self, result: Result<String, ApiError>, now: Instant) {
        match result {
            Ok(message) => self.notifier.notify(&message),
            Err(err) => {
                self.state.push_log(format!("[WARN] Login request failed: {err}"));
                self.notifier.notify("Failed to start login process");
            }
        }
        self.state.controls.release(ControlId::Login);
        self.status_followup = Some(Delay::after(self.login_status_delay, now));
    }

    fn on_refresh(&mut self, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                self.notifier.notify("Data refreshed successfully!");
                self.fetch_status();
            }
            Err(err) => self
                .notifier
                .notify(&format!("Failed to refresh data: {err}")),
        }
        self.state.controls.release(ControlId::Refresh);
    }

    fn on_collect(&mut self, result: Result<CollectOutcome, ApiError>) {
        match result {
            Ok(outcome) => {
                self.state.push_collection_log(format!(
                    "{} (New: {})",
                    outcome.message, outcome.new_count
                ));
                self.render_history();
            }
            Err(err) => self.state.push_collection_log(format!("Error: {err}")),
        }
        self.state.controls.release(ControlId::Collect);
        self.state.collect_status = match self.collection() {
            CollectionLoop::Running { interval_secs } => format!("Running every {interval_secs}s"),
            CollectionLoop::Stopped => String::new(),
        };
    }

    fn on_delete(&mut self, result: Result<String, ApiError>, now: Instant) {
        match result {
            Ok(message) => {
                self.notifier
                    .notify(&format!("{message}\n\nThe page will now reload."));
                self.reload(now);
            }
            Err(err) => {
                self.state.push_log(format!("[WARN] Delete failed: {err}"));
                self.notifier
                    .notify(&format!("Failed to delete database: {err}"));
                self.state.controls.release(ControlId::DeleteDb);
            }
        }
    }

    fn send(&mut self, cmd: ProviderCommand) {
        let Some(tx) = &self.cmd_tx else {
            self.state
                .push_log(format!("[INFO] Request unavailable: {cmd:?}"));
            return;
        };
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Provider is gone; request dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_input_falls_back_to_default() {
        assert_eq!(parse_interval(""), 30);
        assert_eq!(parse_interval("abc"), 30);
        assert_eq!(parse_interval("0"), 30);
        assert_eq!(parse_interval(" 45 "), 45);
        assert_eq!(parse_interval("1"), 1);
        assert_eq!(parse_interval("86400"), 86_400);
        assert_eq!(parse_interval("86401"), 30);
        assert_eq!(parse_interval("18446744073709551615"), 30);
    }
}
