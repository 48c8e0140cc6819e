use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
const MAX_SECS: u64 = 86_400;
const MAX_LOGIN_DELAY_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub status_poll: Duration,
    pub stats_poll: Duration,
    pub history_limit: u32,
    pub login_status_delay: Duration,
    pub http_timeout: Duration,
    pub osc52: bool,
    pub prefs_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |key: &str, default: u64, floor: u64| {
            lookup(key)
                .and_then(|val| val.trim().parse::<u64>().ok())
                .unwrap_or(default)
                .clamp(floor, MAX_SECS)
        };

        let api_base = lookup("SF6_API_BASE")
            .map(|val| normalize_base(&val))
            .filter(|val| !val.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        let history_limit = lookup("HISTORY_LIMIT")
            .and_then(|val| val.trim().parse::<u32>().ok())
            .unwrap_or(10)
            .max(1);
        let login_delay_ms = lookup("LOGIN_STATUS_DELAY_MS")
            .and_then(|val| val.trim().parse::<u64>().ok())
            .unwrap_or(2000)
            .min(MAX_LOGIN_DELAY_MS);
        let osc52 = lookup("SF6_NO_OSC52")
            .map(|val| val.trim().is_empty() || val.trim() == "0")
            .unwrap_or(true);
        let prefs_path = lookup("SF6_PREFS_PATH")
            .filter(|val| !val.trim().is_empty())
            .map(PathBuf::from);

        Self {
            api_base,
            status_poll: Duration::from_secs(secs("STATUS_POLL_SECS", 5, 1)),
            stats_poll: Duration::from_secs(secs("STATS_POLL_SECS", 30, 5)),
            history_limit,
            login_status_delay: Duration::from_millis(login_delay_ms),
            http_timeout: Duration::from_secs(secs("HTTP_TIMEOUT_SECS", 120, 5)),
            osc52,
            prefs_path,
        }
    }

    pub fn with_api_base(mut self, base: &str) -> Self {
        let base = normalize_base(base);
        if !base.is_empty() {
            self.api_base = base;
        }
        self
    }

    pub fn stats_url(&self) -> String {
        format!("{}/stats", self.api_base)
    }
}

/// `sf6_terminal [--stats] [--api URL | --api=URL]`. Unknown flags are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliArgs {
    pub open_stats: bool,
    pub api_base: Option<String>,
}

impl CliArgs {
    pub fn parse(args: &[String]) -> Self {
        let mut out = CliArgs::default();
        for (idx, arg) in args.iter().enumerate() {
            if arg == "--stats" {
                out.open_stats = true;
            }
            if let Some(v) = arg.strip_prefix("--api=")
                && !v.trim().is_empty()
            {
                out.api_base = Some(v.trim().to_string());
            }
            if arg == "--api"
                && let Some(next) = args.get(idx + 1)
                && !next.trim().is_empty()
            {
                out.api_base = Some(next.trim().to_string());
            }
        }
        out
    }
}

fn normalize_base(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_page_cadence() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.status_poll, Duration::from_secs(5));
        assert_eq!(cfg.stats_poll, Duration::from_secs(30));
        assert_eq!(cfg.history_limit, 10);
        assert_eq!(cfg.login_status_delay, Duration::from_millis(2000));
        assert!(cfg.osc52);
        assert_eq!(cfg.stats_url(), "http://localhost:8000/stats");
    }

    #[test]
    fn env_values_are_floored_and_trimmed() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("SF6_API_BASE", " http://10.0.0.2:9000/ "),
            ("STATUS_POLL_SECS", "0"),
            ("STATS_POLL_SECS", "1"),
            ("HTTP_TIMEOUT_SECS", "nope"),
            ("SF6_NO_OSC52", "1"),
        ]));
        assert_eq!(cfg.api_base, "http://10.0.0.2:9000");
        assert_eq!(cfg.status_poll, Duration::from_secs(1));
        assert_eq!(cfg.stats_poll, Duration::from_secs(5));
        assert_eq!(cfg.http_timeout, Duration::from_secs(120));
        assert!(!cfg.osc52);
    }

    #[test]
    fn oversized_values_are_capped() {
        let huge = "18446744073709551615";
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("STATUS_POLL_SECS", huge),
            ("STATS_POLL_SECS", "90000"),
            ("LOGIN_STATUS_DELAY_MS", huge),
        ]));
        assert_eq!(cfg.status_poll, Duration::from_secs(86_400));
        assert_eq!(cfg.stats_poll, Duration::from_secs(86_400));
        assert_eq!(cfg.login_status_delay, Duration::from_millis(60_000));
    }

    #[test]
    fn cli_base_overrides_env() {
        let cfg = AppConfig::default().with_api_base("http://box:8000/");
        assert_eq!(cfg.stats_url(), "http://box:8000/stats");
        let unchanged = AppConfig::default().with_api_base("  ");
        assert_eq!(unchanged.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn cli_flags() {
        let args = ["--stats", "--api", "http://box:8000"]
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>();
        let cli = CliArgs::parse(&args);
        assert!(cli.open_stats);
        assert_eq!(cli.api_base.as_deref(), Some("http://box:8000"));

        let cli = CliArgs::parse(&["--api=http://a:1".to_string()]);
        assert!(!cli.open_stats);
        assert_eq!(cli.api_base.as_deref(), Some("http://a:1"));
        assert_eq!(CliArgs::parse(&["--api".to_string()]), CliArgs::default());
    }
}
