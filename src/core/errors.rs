//! LAB-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, LabError>;

/// Top-level error type for the render lab.
#[derive(Debug, Error)]
pub enum LabError {
    #[error("[LAB-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[LAB-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[LAB-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[LAB-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[LAB-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[LAB-3003] channel closed in component {component}")]
    ChannelClosed { component: &'static str },

    #[error("[LAB-3004] terminal failure: {source}")]
    Terminal {
        #[source]
        source: std::io::Error,
    },

    #[error("[LAB-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl LabError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "LAB-1001",
            Self::MissingConfig { .. } => "LAB-1002",
            Self::ConfigParse { .. } => "LAB-1003",
            Self::Serialization { .. } => "LAB-2101",
            Self::Io { .. } => "LAB-3002",
            Self::ChannelClosed { .. } => "LAB-3003",
            Self::Terminal { .. } => "LAB-3004",
            Self::Runtime { .. } => "LAB-3900",
        }
    }

    /// Whether the error stems from user-supplied input (config values, paths).
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. } | Self::MissingConfig { .. } | Self::ConfigParse { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for LabError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for LabError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

impl From<toml::ser::Error> for LabError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Serialization {
            context: "toml",
            details: value.to_string(),
        }
    }
}
