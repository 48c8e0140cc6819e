use chrono::{DateTime, Local, NaiveDateTime};

use crate::api::{MatchRecord, Player};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeLevel {
    Pending,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub level: BadgeLevel,
    pub text: String,
}

impl Badge {
    pub fn pending() -> Self {
        Self {
            level: BadgeLevel::Pending,
            text: "Checking...".to_string(),
        }
    }
}

/// Badge state depends only on the flag, never on what was shown before.
pub fn badge_for(flag: bool, ok_text: &str, err_text: &str) -> Badge {
    if flag {
        Badge {
            level: BadgeLevel::Success,
            text: ok_text.to_string(),
        }
    } else {
        Badge {
            level: BadgeLevel::Error,
            text: err_text.to_string(),
        }
    }
}

pub fn auth_badge(auth_exists: bool) -> Badge {
    badge_for(auth_exists, "Found", "Missing")
}

pub fn db_badge(db_exists: bool) -> Badge {
    badge_for(db_exists, "Connected", "Error")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connection {
    Unknown,
    Connected,
    Disconnected,
}

pub fn connection_label(conn: Connection) -> &'static str {
    match conn {
        Connection::Unknown => "Connecting...",
        Connection::Connected => "Connected",
        Connection::Disconnected => "Disconnected",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Lose,
    Other,
}

impl Outcome {
    pub fn from_result(result: &str) -> Self {
        match result {
            "WIN" => Outcome::Win,
            "LOSE" => Outcome::Lose,
            _ => Outcome::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub date: String,
    pub result: String,
    pub outcome: Outcome,
    pub my_character: String,
    pub opponent_name: String,
    pub opponent_character: String,
    pub rating: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryView {
    Loading,
    Empty,
    Rows(Vec<HistoryRow>),
}

impl HistoryView {
    pub fn row_count(&self) -> usize {
        match self {
            HistoryView::Rows(rows) => rows.len(),
            _ => 0,
        }
    }
}

pub const EMPTY_HISTORY_TEXT: &str = "No matches found.";

/// Case-insensitive exact match on `my_character`; a blank filter keeps everything.
pub fn filter_matches<'a>(matches: &'a [MatchRecord], filter: Option<&str>) -> Vec<&'a MatchRecord> {
    let needle = filter
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .map(str::to_lowercase);
    match needle {
        None => matches.iter().collect(),
        Some(needle) => matches
            .iter()
            .filter(|m| !m.my_character.is_empty() && m.my_character.to_lowercase() == needle)
            .collect(),
    }
}

/// Rows keep the backend order (most recent first).
pub fn history_view(matches: &[MatchRecord], filter: Option<&str>) -> HistoryView {
    let rows = filter_matches(matches, filter)
        .into_iter()
        .map(history_row)
        .collect::<Vec<_>>();
    if rows.is_empty() {
        HistoryView::Empty
    } else {
        HistoryView::Rows(rows)
    }
}

fn history_row(m: &MatchRecord) -> HistoryRow {
    HistoryRow {
        date: m
            .match_date
            .as_deref()
            .map(format_timestamp)
            .unwrap_or_else(|| "-".to_string()),
        result: m.result.clone(),
        outcome: Outcome::from_result(&m.result),
        my_character: m.my_character.clone(),
        opponent_name: m.opponent_name.clone(),
        opponent_character: m.opponent_character.clone(),
        rating: rating_label(m),
    }
}

/// MR when the match has one, LP otherwise. Never both.
pub fn rating_label(m: &MatchRecord) -> String {
    match (m.my_mr, m.my_lp) {
        (Some(mr), _) => format!("{mr} MR"),
        (None, Some(lp)) => format!("{lp} LP"),
        (None, None) => "-".to_string(),
    }
}

pub fn player_lines(player: &Player) -> Vec<(&'static str, String)> {
    vec![
        ("Name", player.name.clone()),
        ("Rank", player.rank.clone()),
        ("LP", format_thousands(player.lp)),
        ("Character", player.character.clone()),
    ]
}

pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if value < 0 {
        out.insert(0, '-');
    }
    out
}

/// Backend timestamps are naive ISO strings in server-local time; offsets are honoured when present.
pub fn format_timestamp(raw: &str) -> String {
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];
    const OUT: &str = "%Y-%m-%d %H:%M:%S";

    let cleaned = raw.trim();
    if cleaned.is_empty() {
        return "-".to_string();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(cleaned) {
        return dt.with_timezone(&Local).format(OUT).to_string();
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cleaned, fmt) {
            return dt.format(OUT).to_string();
        }
    }
    cleaned.to_string()
}
