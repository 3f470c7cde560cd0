//! Layered configuration.
//!
//! # Responsibility
//! - Provide built-in defaults for every setting.
//! - Merge the system file and then the user file over those defaults.
//!
//! # Invariants
//! - Missing files are skipped; unreadable or malformed files are errors.
//! - Configuration is read-only; core never writes it back.
//!
//! File format is a TOML document with a single `[config]` table:
//!
//! ```toml
//! [config]
//! dirname = "todo"
//! pending_categories = "bugs,features"
//! done_category = "done"
//! name = "Ada Lovelace"
//! email = "ada@example.com"
//! editor = "vim"
//! priority = "normal"
//! vcs_timeout_secs = 5
//! ```

use crate::identity::local;
use crate::identity::runner::DEFAULT_TIMEOUT;
use crate::identity::IdentityDefaults;
use crate::model::item::Priority;
use crate::resolve::priority::normalize;
use crate::store::category::known_categories;
use log::info;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "pb";
pub const DEFAULT_DIRNAME: &str = "todo";
pub const DEFAULT_PENDING_CATEGORIES: [&str; 2] = ["bugs", "features"];
pub const DEFAULT_DONE_CATEGORY: &str = "done";

/// Environment variables consulted for the editor, in order.
pub const EDITOR_ENV_VARS: [&str; 4] = ["PB_VISUAL", "PB_EDITOR", "VISUAL", "EDITOR"];

/// Configuration loading failure.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        message: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid config `{}`: {message}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { .. } => None,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    config: ConfigSection,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigSection {
    dirname: Option<String>,
    pending_categories: Option<CategoryList>,
    done_category: Option<String>,
    name: Option<String>,
    email: Option<String>,
    editor: Option<String>,
    priority: Option<String>,
    vcs_timeout_secs: Option<u64>,
}

/// Accepts both `"bugs,features"` and `["bugs", "features"]`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CategoryList {
    Joined(String),
    List(Vec<String>),
}

impl CategoryList {
    fn into_vec(self) -> Vec<String> {
        let raw = match self {
            Self::Joined(joined) => joined.split(',').map(str::to_string).collect(),
            Self::List(list) => list,
        };
        raw.into_iter()
            .map(|category| category.trim().to_string())
            .filter(|category| !category.is_empty())
            .collect()
    }
}

/// Effective configuration after merging every layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub dirname: String,
    pub pending_categories: Vec<String>,
    pub done_category: String,
    pub name: String,
    pub email: String,
    pub editor: Option<String>,
    /// Raw default priority token; see [`Config::default_priority`].
    pub priority: String,
    pub vcs_timeout: Duration,
}

impl Config {
    /// Built-in defaults, with identity taken from the operating system.
    pub fn defaults() -> Self {
        Self::with_identity(local::full_name(), local::default_email())
    }

    /// Built-in defaults with an explicit fallback identity.
    pub fn with_identity(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            dirname: DEFAULT_DIRNAME.to_string(),
            pending_categories: DEFAULT_PENDING_CATEGORIES
                .iter()
                .map(|category| category.to_string())
                .collect(),
            done_category: DEFAULT_DONE_CATEGORY.to_string(),
            name: name.into(),
            email: email.into(),
            editor: None,
            priority: Priority::default().name().to_string(),
            vcs_timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Defaults, then each existing file in `paths` in order.
    pub fn load(paths: &[PathBuf]) -> Result<Self, ConfigError> {
        let mut config = Self::defaults();
        for path in paths {
            config.merge_file(path)?;
        }
        Ok(config)
    }

    /// Merges one file over the current values.
    ///
    /// Returns `Ok(false)` when the file does not exist.
    pub fn merge_file(&mut self, path: &Path) -> Result<bool, ConfigError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(false),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        self.merge_str(&text, path)?;
        info!(
            "event=config_load module=config status=ok path={}",
            path.display()
        );
        Ok(true)
    }

    /// Merges TOML text; `origin` is only used for error messages.
    pub fn merge_str(&mut self, text: &str, origin: &Path) -> Result<(), ConfigError> {
        let file: ConfigFile = toml::from_str(text).map_err(|err| ConfigError::Parse {
            path: origin.to_path_buf(),
            message: err.to_string(),
        })?;
        let section = file.config;

        if let Some(dirname) = non_blank(section.dirname) {
            self.dirname = dirname;
        }
        if let Some(categories) = section.pending_categories {
            self.pending_categories = categories.into_vec();
        }
        if let Some(done) = non_blank(section.done_category) {
            self.done_category = done;
        }
        if let Some(name) = non_blank(section.name) {
            self.name = name;
        }
        if let Some(email) = non_blank(section.email) {
            self.email = email;
        }
        if let Some(editor) = non_blank(section.editor) {
            self.editor = Some(editor);
        }
        if let Some(priority) = non_blank(section.priority) {
            self.priority = priority;
        }
        if let Some(secs) = section.vcs_timeout_secs {
            self.vcs_timeout = Duration::from_secs(secs.max(1));
        }
        Ok(())
    }

    /// Sorted, lower-cased union of pending and done categories.
    pub fn known_categories(&self) -> Vec<String> {
        known_categories(&self.pending_categories, &self.done_category)
    }

    pub fn identity_defaults(&self) -> IdentityDefaults {
        IdentityDefaults {
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    /// Configured default priority; unrecognized words mean `Normal`.
    pub fn default_priority(&self) -> Priority {
        normalize(&self.priority, true).unwrap_or_default()
    }

    /// Editor from the environment, then config, then the platform default.
    pub fn editor_command(&self) -> String {
        editor_from(
            |var| std::env::var(var).ok(),
            self.editor.as_deref(),
        )
    }
}

/// System-wide configuration file location.
pub fn system_config_path() -> PathBuf {
    if cfg!(windows) {
        let base = std::env::var_os("PROGRAMFILES")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("C:/Program Files"));
        base.join(APP_NAME).join(format!("{APP_NAME}.toml"))
    } else {
        PathBuf::from("/etc").join(format!("{APP_NAME}.toml"))
    }
}

/// Per-user configuration file location.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join("config.toml"))
}

fn editor_from(lookup: impl Fn(&str) -> Option<String>, configured: Option<&str>) -> String {
    EDITOR_ENV_VARS
        .iter()
        .filter_map(|var| lookup(var))
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .or_else(|| configured.map(str::to_string))
        .unwrap_or_else(|| {
            if cfg!(windows) {
                "edit".to_string()
            } else {
                "vi".to_string()
            }
        })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
