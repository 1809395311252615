//! Error types for locale loading, configuration, narrative generation and
//! the top-level generation run.
//!
//! The corruption functions in [`crate::distort`] are total and never return
//! these; errors only arise at load time, at the narrative boundary and when
//! writing output.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Problems detected while loading a locale bundle. Always fatal.
#[derive(Debug, Error)]
pub enum LocaleError {
    #[error("unknown locale '{code}' (available: {available})")]
    UnknownLocale { code: String, available: String },

    /// A confusion rule with an empty source or a non-positive weight.
    #[error("invalid confusion rule '{source_text}' -> '{target}': {reason}")]
    InvalidRule {
        source_text: String,
        target: String,
        reason: String,
    },
}

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {reason}")]
    Invalid { reason: String },
}

/// Failure to obtain narrative text for one document.
#[derive(Debug, Error)]
pub enum NarrativeError {
    /// Connection failures, timeouts, rate limiting and server errors.
    #[error("transient narrative failure: {reason}")]
    Transient { reason: String },

    #[error("narrative request failed: {reason}")]
    Permanent { reason: String },
}

impl NarrativeError {
    pub fn is_transient(&self) -> bool {
        matches!(self, NarrativeError::Transient { .. })
    }
}

/// Errors that abort a generation run.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Locale(#[from] LocaleError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The narrative client could not be set up. Per-document narrative
    /// failures never surface here.
    #[error(transparent)]
    Narrative(#[from] NarrativeError),

    #[error("{dir} contains {count} .ndjson files; use --force to overwrite")]
    OutputExists { dir: PathBuf, count: usize },

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

pub type GenerateResult<T> = Result<T, GenerateError>;
