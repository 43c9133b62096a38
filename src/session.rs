use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::engine::LedgerEngine;
use crate::parser;
use crate::syntax::LineSyntax;

const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid date format {0:?}")]
    DateFormat(String),
}

///
/// Settings threaded through every editing command: the defaults used to
/// complete partially typed dates, the date format, the comment syntax and
/// the external engine.
///
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditingSession {
    pub default_year: i32,
    pub default_month: u32,
    pub date_format: String,
    pub syntax: LineSyntax,
    pub engine: LedgerEngine,
}

impl Default for EditingSession {
    fn default() -> Self {
        Self::for_date(Local::now().date_naive())
    }
}

impl EditingSession {
    /// A session whose defaults are the year and month of `today`.
    pub fn for_date(today: NaiveDate) -> Self {
        Self {
            default_year: today.year(),
            default_month: today.month(),
            date_format: ISO_DATE_FORMAT.to_string(),
            syntax: LineSyntax::default(),
            engine: LedgerEngine::default(),
        }
    }

    pub fn with_date_format(mut self, date_format: &str) -> Self {
        self.date_format = date_format.to_string();
        self
    }

    pub fn with_syntax(mut self, syntax: LineSyntax) -> Self {
        self.syntax = syntax;
        self
    }

    pub fn with_engine(mut self, engine: LedgerEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| ConfigError::Read {
            path: config_path.to_path_buf(),
            source,
        })?;

        let mut session: EditingSession =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: config_path.to_path_buf(),
                source,
            })?;

        if !is_valid_date_format(&session.date_format) {
            return Err(ConfigError::DateFormat(session.date_format));
        }
        session.engine = session.engine.expanded();

        tracing::debug!(path = %config_path.display(), "loaded editing session");
        Ok(Some(session))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/ledger-context");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    /// Completes `D`, `M-D` or `Y-M-D` (any of `-`, `/`, `.` as separator)
    /// with the session's default year and month.
    pub fn complete_date(&self, input: &str) -> Option<NaiveDate> {
        let parts: Vec<&str> = input.trim().split(['-', '/', '.']).collect();
        let (year, month, day) = match parts.as_slice() {
            [day] => (self.default_year, self.default_month, day.parse().ok()?),
            [month, day] => (self.default_year, month.parse().ok()?, day.parse().ok()?),
            [year, month, day] => (year.parse().ok()?, month.parse().ok()?, day.parse().ok()?),
            _ => return None,
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// `date` in the session's format. Falls back to ISO dates when the
    /// format is invalid or its output is not a date ledger reads back.
    pub fn format_date(&self, date: NaiveDate) -> String {
        let mut formatted = String::new();
        if write!(formatted, "{}", date.format(&self.date_format)).is_err() {
            tracing::warn!(format = %self.date_format, "invalid date format, using ISO dates");
            return date.format(ISO_DATE_FORMAT).to_string();
        }
        if formatted.trim() != formatted || parser::parse_date(&formatted) != Some(date) {
            tracing::warn!(format = %self.date_format, "unreadable date format, using ISO dates");
            return date.format(ISO_DATE_FORMAT).to_string();
        }
        formatted
    }
}

fn is_valid_date_format(format: &str) -> bool {
    !StrftimeItems::new(format).any(|item| matches!(item, Item::Error))
}
