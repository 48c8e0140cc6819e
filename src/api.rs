use anyhow::Result;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::AppConfig;
use crate::http_client::http_client;

const UNKNOWN_ERROR: &str = "Unknown error";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never produced a readable response.
    #[error("{0}")]
    Transport(String),
    /// Non-success status; `detail` falls back to "Unknown error" when the body has none.
    #[error("{detail}")]
    Status { status: u16, detail: String },
    #[error("invalid response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn from_status(status: u16, body: &str) -> Self {
        let detail = serde_json::from_str::<Value>(body.trim())
            .ok()
            .and_then(|root| match root.get("detail") {
                Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
                _ => None,
            })
            .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
        ApiError::Status { status, detail }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rank: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lp: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub character: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_updated: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    #[serde(default)]
    pub auth_exists: bool,
    #[serde(default)]
    pub db_exists: bool,
    #[serde(default)]
    pub latest_player: Option<Player>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub match_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub result: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub my_character: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub opponent_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub opponent_character: String,
    #[serde(default)]
    pub my_mr: Option<i64>,
    #[serde(default)]
    pub my_lp: Option<i64>,
    #[serde(default)]
    pub opponent_mr: Option<i64>,
    #[serde(default)]
    pub opponent_lp: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionMessage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CollectOutcome {
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    // The "nothing scraped" reply carries `count` instead of `new_count`.
    #[serde(default, alias = "count", deserialize_with = "null_as_default")]
    pub new_count: u32,
    #[serde(default)]
    pub total_scraped: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterBucket {
    #[serde(default, deserialize_with = "null_as_default")]
    pub character: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentBucket {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    #[serde(default)]
    pub total: Bucket,
    #[serde(default)]
    pub recent_100: Bucket,
    #[serde(default)]
    pub my_character: Option<String>,
    #[serde(default)]
    pub last_opponent_name: Option<OpponentBucket>,
    #[serde(default)]
    pub last_opponent_char: Option<CharacterBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MrPoint {
    pub mr: i64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentRecord {
    #[serde(default, deserialize_with = "null_as_default")]
    pub opponent_name: String,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub total: u32,
}

#[derive(Debug, Deserialize)]
struct OpponentName {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserCodeReply {
    #[serde(default)]
    user_code: Option<String>,
}

/// Backend surface consumed by both screens.
pub trait TrackerApi: Send + Sync {
    fn status(&self) -> Result<SystemStatus, ApiError>;
    fn login(&self) -> Result<ActionMessage, ApiError>;
    fn refresh(&self) -> Result<(), ApiError>;
    fn collect_matches(&self) -> Result<CollectOutcome, ApiError>;
    fn matches(&self, limit: u32) -> Result<Vec<MatchRecord>, ApiError>;
    fn delete_database(&self) -> Result<ActionMessage, ApiError>;
    fn stats_summary(&self, limit: u32) -> Result<StatsSummary, ApiError>;
    fn mr_history(&self, limit: u32) -> Result<Vec<MrPoint>, ApiError>;
    fn opponents(&self) -> Result<Vec<String>, ApiError>;
    fn opponent_record(&self, name: &str) -> Result<OpponentRecord, ApiError>;
    fn user_code(&self) -> Result<String, ApiError>;
    fn set_user_code(&self, code: &str) -> Result<String, ApiError>;
}

pub struct HttpTrackerApi {
    base: String,
    client: &'static Client,
}

impl HttpTrackerApi {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            base: config.api_base.clone(),
            client: http_client(config.http_timeout)?,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    fn send(&self, req: RequestBuilder) -> Result<String, ApiError> {
        let resp = req
            .send()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(ApiError::from_status(status.as_u16(), &body));
        }
        Ok(body)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, limit: Option<u32>) -> Result<T, ApiError> {
        let mut req = self.client.get(self.url(path));
        if let Some(limit) = limit {
            req = req.query(&[("limit", limit)]);
        }
        parse_json(&self.send(req)?)
    }

    fn opponent_url(&self, name: &str) -> Result<Url, ApiError> {
        let mut url =
            Url::parse(&self.base).map_err(|err| ApiError::Transport(err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("invalid api base: {}", self.base)))?
            .pop_if_empty()
            .extend(["api", "stats", "opponent", name]);
        Ok(url)
    }
}

impl TrackerApi for HttpTrackerApi {
    fn status(&self) -> Result<SystemStatus, ApiError> {
        self.get_json("/api/status", None)
    }

    fn login(&self) -> Result<ActionMessage, ApiError> {
        let body = self.send(self.client.post(self.url("/api/login")))?;
        parse_json(&body)
    }

    fn refresh(&self) -> Result<(), ApiError> {
        self.send(self.client.post(self.url("/api/refresh")))?;
        Ok(())
    }

    fn collect_matches(&self) -> Result<CollectOutcome, ApiError> {
        let body = self.send(self.client.post(self.url("/api/collect_matches")))?;
        parse_json(&body)
    }

    fn matches(&self, limit: u32) -> Result<Vec<MatchRecord>, ApiError> {
        self.get_json("/api/matches", Some(limit))
    }

    fn delete_database(&self) -> Result<ActionMessage, ApiError> {
        let body = self.send(self.client.delete(self.url("/api/delete_database")))?;
        parse_json(&body)
    }

    fn stats_summary(&self, limit: u32) -> Result<StatsSummary, ApiError> {
        self.get_json("/api/stats/summary", Some(limit))
    }

    fn mr_history(&self, limit: u32) -> Result<Vec<MrPoint>, ApiError> {
        self.get_json("/api/stats/mr_history", Some(limit))
    }

    fn opponents(&self) -> Result<Vec<String>, ApiError> {
        let rows: Vec<OpponentName> = self.get_json("/api/stats/opponents", None)?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.name)
            .filter(|name| !name.trim().is_empty())
            .collect())
    }

    fn opponent_record(&self, name: &str) -> Result<OpponentRecord, ApiError> {
        let url = self.opponent_url(name)?;
        parse_json(&self.send(self.client.get(url))?)
    }

    fn user_code(&self) -> Result<String, ApiError> {
        let reply: UserCodeReply = self.get_json("/api/config/user_code", None)?;
        Ok(reply.user_code.unwrap_or_default())
    }

    fn set_user_code(&self, code: &str) -> Result<String, ApiError> {
        let req = self
            .client
            .post(self.url("/api/config/user_code"))
            .json(&serde_json::json!({ "user_code": code }));
        let reply: UserCodeReply = parse_json(&self.send(req)?)?;
        Ok(reply.user_code.unwrap_or_default())
    }
}

/// Decode a 2xx body. Shape mismatches surface as [`ApiError::Decode`].
pub fn parse_json<T: DeserializeOwned>(raw: &str) -> Result<T, ApiError> {
    serde_json::from_str(raw.trim()).map_err(|err| ApiError::Decode(err.to_string()))
}
