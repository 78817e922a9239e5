//! Error types for model import.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort an import.
///
/// Everything that goes wrong with a single record is reported as a
/// [`Diagnostic`](crate::Diagnostic) instead; these are the only failures
/// that reach the caller.
#[derive(Error, Debug)]
pub enum ImportError {
    /// The source file does not exist.
    #[error("model file not found: {}", path.display())]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The source file exists but could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Another import into the same root has not finished.
    #[error("root '{root}' is already importing")]
    Busy {
        /// Name of the root.
        root: String,
    },

    /// The root handle does not belong to this scene.
    #[error("unknown root handle")]
    UnknownRoot,

    /// [`ModelAssembler::reload`](crate::ModelAssembler::reload) was called
    /// before any import.
    #[error("nothing has been imported yet")]
    NothingToReload,
}

impl ImportError {
    /// Classify an I/O error from reading `path`.
    pub fn from_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Io { path, source }
        }
    }
}

/// Why a placement line was rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    /// The line starts with the placement marker but is truncated.
    #[error("expected at least 15 tokens, found {found}")]
    TooFewTokens {
        /// Token count, marker included.
        found: usize,
    },

    /// The color code is not an integer.
    #[error("invalid color code '{token}'")]
    InvalidColor {
        /// Offending token.
        token: String,
    },

    /// A position or matrix coefficient is not a finite number.
    #[error("invalid {field} '{token}'")]
    InvalidNumber {
        /// Field name (e.g. `x`, `m12`).
        field: &'static str,
        /// Offending token.
        token: String,
    },

    /// The part identifier is empty once its extension is removed.
    #[error("empty part identifier")]
    EmptyPartId,
}

/// Errors loading importer configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// I/O error reading the configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for this schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A palette key is not a color code.
    #[error("palette key '{0}' is not an integer color code")]
    InvalidPaletteCode(String),
}
