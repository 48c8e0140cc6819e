use std::collections::VecDeque;

use chrono::Local;

use crate::api::{
    ApiError, CollectOutcome, MatchRecord, MrPoint, OpponentRecord, Player, StatsSummary,
    SystemStatus,
};
use crate::view::{Badge, Connection, HistoryView};

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Stats,
}

/// Requests the UI hands to the provider thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    FetchStatus,
    Login,
    Refresh,
    CollectMatches,
    FetchMatches { limit: u32 },
    DeleteDatabase,
    FetchStatsSummary { limit: u32 },
    FetchMrHistory { limit: u32 },
    FetchOpponents,
    FetchOpponentRecord { name: String },
    FetchUserCode,
    SetUserCode { code: String },
}

/// Results coming back from the provider thread.
#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    SetStatus(SystemStatus),
    StatusFailed(ApiError),
    LoginFinished(Result<String, ApiError>),
    RefreshFinished(Result<(), ApiError>),
    CollectFinished(Result<CollectOutcome, ApiError>),
    SetMatches(Vec<MatchRecord>),
    MatchesFailed(ApiError),
    DeleteFinished(Result<String, ApiError>),
    SetStatsSummary {
        limit: u32,
        summary: StatsSummary,
    },
    SetMrHistory(Vec<MrPoint>),
    SetOpponents(Vec<String>),
    SetOpponentRecord(OpponentRecord),
    StatsFailed {
        what: &'static str,
        error: ApiError,
    },
    SetUserCode(String),
    UserCodeSaved(Result<String, ApiError>),
    Log(String),
}

impl Delta {
    pub fn is_stats(&self) -> bool {
        matches!(
            self,
            Delta::SetStatsSummary { .. }
                | Delta::SetMrHistory(_)
                | Delta::SetOpponents(_)
                | Delta::SetOpponentRecord(_)
                | Delta::StatsFailed { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlId {
    Login,
    Refresh,
    Collect,
    PeriodicToggle,
    ApplyFilter,
    DeleteDb,
    OpenStats,
    CopyUrl,
    UserCode,
}

pub const CONTROL_IDS: [ControlId; 9] = [
    ControlId::Login,
    ControlId::Refresh,
    ControlId::Collect,
    ControlId::PeriodicToggle,
    ControlId::ApplyFilter,
    ControlId::DeleteDb,
    ControlId::OpenStats,
    ControlId::CopyUrl,
    ControlId::UserCode,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStyle {
    Primary,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlState {
    pub label: String,
    pub enabled: bool,
    pub style: ControlStyle,
}

pub fn default_label(id: ControlId) -> &'static str {
    match id {
        ControlId::Login => "Open Login Browser",
        ControlId::Refresh => "Refresh Data",
        ControlId::Collect => "Collect Matches",
        ControlId::PeriodicToggle => "Start Collect",
        ControlId::ApplyFilter => "Apply Filter",
        ControlId::DeleteDb => "Delete Database",
        ControlId::OpenStats => "Open Stats",
        ControlId::CopyUrl => "Copy Stats URL",
        ControlId::UserCode => "Set User Code",
    }
}

pub fn control_key(id: ControlId) -> &'static str {
    match id {
        ControlId::Login => "l",
        ControlId::Refresh => "r",
        ControlId::Collect => "c",
        ControlId::PeriodicToggle => "p",
        ControlId::ApplyFilter => "f",
        ControlId::DeleteDb => "D",
        ControlId::OpenStats => "s",
        ControlId::CopyUrl => "y",
        ControlId::UserCode => "u",
    }
}

fn default_style(id: ControlId) -> ControlStyle {
    match id {
        ControlId::DeleteDb => ControlStyle::Danger,
        _ => ControlStyle::Primary,
    }
}

/// Button row of the dashboard. A busy control is disabled and shows its busy label
/// until `release` puts the default back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controls {
    states: [ControlState; CONTROL_IDS.len()],
}

impl Default for Controls {
    fn default() -> Self {
        Self::new()
    }
}

impl Controls {
    pub fn new() -> Self {
        let states = std::array::from_fn(|idx| {
            let id = CONTROL_IDS[idx];
            ControlState {
                label: default_label(id).to_string(),
                enabled: true,
                style: default_style(id),
            }
        });
        Self { states }
    }

    // CONTROL_IDS lists the variants in declaration order.
    pub fn get(&self, id: ControlId) -> &ControlState {
        &self.states[id as usize]
    }

    fn get_mut(&mut self, id: ControlId) -> &mut ControlState {
        &mut self.states[id as usize]
    }

    pub fn is_enabled(&self, id: ControlId) -> bool {
        self.get(id).enabled
    }

    /// Marks the control busy. Returns false (and changes nothing) when it already is.
    pub fn acquire(&mut self, id: ControlId, busy_label: &str) -> bool {
        let state = self.get_mut(id);
        if !state.enabled {
            return false;
        }
        state.enabled = false;
        state.label = busy_label.to_string();
        true
    }

    /// Marks the control busy whether or not it already was (timer-driven callers).
    pub fn force_busy(&mut self, id: ControlId, busy_label: &str) {
        let state = self.get_mut(id);
        state.enabled = false;
        state.label = busy_label.to_string();
    }

    pub fn release(&mut self, id: ControlId) {
        let state = self.get_mut(id);
        state.enabled = true;
        state.label = default_label(id).to_string();
    }

    pub fn set_label(&mut self, id: ControlId, label: &str, style: ControlStyle) {
        let state = self.get_mut(id);
        state.label = label.to_string();
        state.style = style;
    }

    pub fn iter(&self) -> impl Iterator<Item = (ControlId, &ControlState)> {
        CONTROL_IDS.iter().copied().zip(self.states.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub time: String,
    pub message: String,
}

impl LogEntry {
    pub fn now(message: impl Into<String>) -> Self {
        Self {
            time: Local::now().format("%H:%M:%S").to_string(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardState {
    pub connection: Connection,
    pub auth: Badge,
    pub db: Badge,
    pub player: Option<Player>,
    pub last_update: Option<String>,
    pub user_code: Option<String>,
    pub history: HistoryView,
    pub collect_status: String,
    pub collection_log: VecDeque<LogEntry>,
    pub logs: VecDeque<String>,
    pub controls: Controls,
    pub interval_input: String,
    pub filter_input: String,
    pub page_loads: u32,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            connection: Connection::Unknown,
            auth: Badge::pending(),
            db: Badge::pending(),
            player: None,
            last_update: None,
            user_code: None,
            history: HistoryView::Loading,
            collect_status: String::new(),
            collection_log: VecDeque::with_capacity(MAX_LOGS),
            logs: VecDeque::with_capacity(MAX_LOGS),
            controls: Controls::new(),
            interval_input: String::new(),
            filter_input: String::new(),
            page_loads: 0,
        }
    }

    /// Console line; polling failures only ever land here.
    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn push_collection_log(&mut self, msg: impl Into<String>) {
        self.collection_log.push_back(LogEntry::now(msg));
        while self.collection_log.len() > MAX_LOGS {
            self.collection_log.pop_front();
        }
    }
}
