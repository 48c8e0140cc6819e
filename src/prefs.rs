use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const PREFS_DIR: &str = "sf6_terminal";
const PREFS_FILE: &str = "prefs.json";
const PREFS_VERSION: u32 = 1;

pub const DEFAULT_CHART_LIMIT: u32 = 100;

/// Both screens read and write the same store, like two pages sharing localStorage.
pub type SharedPrefs = Rc<RefCell<PrefStore>>;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
struct PrefsFile {
    version: u32,
    #[serde(default)]
    character_filter: Option<String>,
    #[serde(default)]
    chart_limit: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct PrefStore {
    path: Option<PathBuf>,
    file: PrefsFile,
}

impl PrefStore {
    /// A store that never touches disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            file: PrefsFile {
                version: PREFS_VERSION,
                ..PrefsFile::default()
            },
        }
    }

    pub fn open(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::in_memory();
        };
        let file = load_prefs_file(&path).unwrap_or(PrefsFile {
            version: PREFS_VERSION,
            ..PrefsFile::default()
        });
        Self {
            path: Some(path),
            file,
        }
    }

    pub fn open_default(override_path: Option<PathBuf>) -> Self {
        Self::open(override_path.or_else(prefs_path))
    }

    pub fn shared(self) -> SharedPrefs {
        Rc::new(RefCell::new(self))
    }

    pub fn character_filter(&self) -> Option<&str> {
        self.file.character_filter.as_deref()
    }

    /// Blank input clears the filter. Returns the stored value.
    pub fn set_character_filter(&mut self, filter: &str) -> Result<Option<String>> {
        let trimmed = filter.trim();
        self.file.character_filter = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self.save()?;
        Ok(self.file.character_filter.clone())
    }

    pub fn chart_limit(&self) -> u32 {
        self.file
            .chart_limit
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_CHART_LIMIT)
    }

    pub fn set_chart_limit(&mut self, limit: u32) -> Result<()> {
        self.file.chart_limit = Some(limit.max(1));
        self.save()
    }

    fn save(&mut self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).context("create prefs dir")?;
        }
        self.file.version = PREFS_VERSION;
        let json = serde_json::to_string_pretty(&self.file).context("serialize prefs")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).context("write prefs")?;
        fs::rename(&tmp, path).context("swap prefs")?;
        Ok(())
    }
}

fn load_prefs_file(path: &Path) -> Option<PrefsFile> {
    let raw = fs::read_to_string(path).ok()?;
    let file = serde_json::from_str::<PrefsFile>(&raw).ok()?;
    if file.version != PREFS_VERSION {
        return None;
    }
    Some(file)
}

fn prefs_path() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CONFIG_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(PREFS_DIR).join(PREFS_FILE));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(PREFS_DIR)
            .join(PREFS_FILE),
    )
}
