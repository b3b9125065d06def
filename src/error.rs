//! Error types for hitrate
//!
//! All modules use `HitrateResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for hitrate operations
pub type HitrateResult<T> = Result<T, HitrateError>;

/// All errors that can occur in hitrate
#[derive(Error, Debug)]
pub enum HitrateError {
    // Fast store errors
    #[error("Fast store I/O error: {0}")]
    StoreIo(String),

    #[error("Fast store call timed out after {millis}ms: {op}")]
    StoreTimeout { op: String, millis: u64 },

    #[error("Fast store liveness probe failed: {0}")]
    StoreProbe(String),

    // Workload errors
    #[error("Seed population is empty, nothing to simulate")]
    EmptySeedPopulation,

    #[error("Invalid arrival model: {0}")]
    InvalidArrival(String),

    // Seed errors
    #[error("Seed source error: {0}")]
    SeedSource(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("{0}")]
    User(String),
}

impl HitrateError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a fast store I/O error from any displayable cause
    pub fn store(cause: impl std::fmt::Display) -> Self {
        Self::StoreIo(cause.to_string())
    }

    /// Check if the error came from the fast store
    pub fn is_store_fault(&self) -> bool {
        matches!(
            self,
            Self::StoreIo(_) | Self::StoreTimeout { .. } | Self::StoreProbe(_)
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::EmptySeedPopulation => Some(
                "Point --seeds at a populated seed file, or generate one with: hitrate seeds --out seeds.json",
            ),
            Self::StoreIo(_) | Self::StoreTimeout { .. } | Self::StoreProbe(_) => {
                Some("Check that Redis is running, or set HITRATE_STORE_HOST")
            }
            Self::InvalidArrival(_) => Some("Arrival rates must be positive and finite"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = HitrateError::EmptySeedPopulation;
        assert!(err.to_string().contains("Seed population is empty"));
    }

    #[test]
    fn error_hint() {
        assert!(HitrateError::EmptySeedPopulation
            .hint()
            .unwrap()
            .contains("hitrate seeds"));
        assert!(HitrateError::User("x".to_string()).hint().is_none());
    }

    #[test]
    fn store_faults_classified() {
        assert!(HitrateError::store("connection reset").is_store_fault());
        assert!(HitrateError::StoreTimeout {
            op: "GET".to_string(),
            millis: 500
        }
        .is_store_fault());
        assert!(!HitrateError::EmptySeedPopulation.is_store_fault());
    }
}
