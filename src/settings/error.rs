//! Settings persistence error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or saving timer settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read or written.
    #[error("設定ファイル '{path}' にアクセスできません: {source}")]
    Io {
        /// File that was accessed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The settings file does not contain valid settings JSON.
    #[error("設定ファイル '{path}' の形式が不正です: {source}")]
    Parse {
        /// File that was parsed
        path: PathBuf,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, SettingsError>;

impl SettingsError {
    /// Returns true if this error is an I/O failure.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this error is a malformed settings file.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }

    /// Returns the file involved in the failure.
    #[must_use]
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Io { path, .. } | Self::Parse { path, .. } => path,
        }
    }
}
