//! Typed errors for the KV service.
//!
//! Engine implementations report failures through `anyhow` with context; the
//! service maps those into the variants below so callers can match on the
//! failure class (bad input, miss, write failure, closed handle).

use std::path::PathBuf;

/// Longest value text kept in a [`Error::Write`] message.
pub const MAX_VALUE_PREVIEW: usize = 64;

fn preview(mut value: String) -> String {
    let total = value.len();
    if total <= MAX_VALUE_PREVIEW {
        return value;
    }

    let mut cut = MAX_VALUE_PREVIEW;
    while !value.is_char_boundary(cut) {
        cut -= 1;
    }
    value.truncate(cut);
    format!("{value}... ({total} bytes)")
}

/// Result type for KV service operations.
pub type Result<T> = std::result::Result<T, Error>;

/// KV service errors with structured context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Key was empty.
    #[error("key can't be empty")]
    EmptyKey,

    /// Value serialized to an empty JSON value (`null`, `""`, `[]`, `{}`).
    #[error("value can't be empty")]
    EmptyValue,

    /// No value is stored under the key.
    #[error("value for key '{key}' not found")]
    NotFound { key: String },

    /// A durable write to the primary or index store failed.
    ///
    /// The two stores are committed in separate transactions, so the primary
    /// record may exist without its index entry. See [`crate::kv::KvService::reconcile`].
    #[error("can't insert item {key}:{value}")]
    Write {
        key: String,
        value: String,
        #[source]
        source: anyhow::Error,
    },

    /// A durable read failed.
    #[error("failed to read key '{key}'")]
    Read {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Value could not be serialized to JSON.
    #[error("failed to encode value for key '{key}'")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored bytes could not be decoded into the requested type.
    #[error("failed to decode value for key '{key}'")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The index store holds an entry that cannot be interpreted.
    #[error("corrupt index entry: {reason}")]
    CorruptIndex { reason: String },

    /// The service was already closed.
    #[error("store is already closed")]
    AlreadyClosed,

    /// A store file could not be opened.
    #[error("failed to open store at {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Maintenance pass failed part way.
    #[error("reconcile failed")]
    Reconcile(#[source] anyhow::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl Error {
    /// Create a not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a write error carrying the offending pair.
    ///
    /// Values longer than [`MAX_VALUE_PREVIEW`] bytes are cut short and
    /// suffixed with their full length.
    pub fn write(key: impl Into<String>, value: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Write {
            key: key.into(),
            value: preview(value.into()),
            source,
        }
    }

    /// Create a read error.
    pub fn read(key: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Read {
            key: key.into(),
            source,
        }
    }

    /// Create a corrupt index error.
    pub fn corrupt_index(reason: impl Into<String>) -> Self {
        Self::CorruptIndex {
            reason: reason.into(),
        }
    }

    /// Create an open error.
    pub fn open(path: impl Into<PathBuf>, source: anyhow::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Returns true for input validation failures raised before any I/O.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::EmptyKey | Self::EmptyValue)
    }

    /// Returns true if the error is a read miss.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_write_error_names_pair() {
        let err = Error::write("user:1", "\"alice\"", anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "can't insert item user:1:\"alice\"");
        assert_eq!(err.source().unwrap().to_string(), "disk full");
    }

    #[test]
    fn test_write_error_truncates_long_values() {
        let long = "x".repeat(10_000);
        let err = Error::write("blob", long, anyhow::anyhow!("disk full"));
        let msg = err.to_string();

        assert!(msg.len() < 120, "{msg}");
        assert!(msg.starts_with(&format!("can't insert item blob:{}", "x".repeat(64))));
        assert!(msg.ends_with("... (10000 bytes)"));
    }

    #[test]
    fn test_write_error_truncates_on_char_boundary() {
        let err = Error::write("k", "é".repeat(40), anyhow::anyhow!("disk full"));
        let Error::Write { value, .. } = err else {
            panic!("expected write error");
        };
        assert!(value.starts_with(&"é".repeat(32)));
        assert!(value.ends_with("... (80 bytes)"));
    }

    #[test]
    fn test_classification() {
        assert!(Error::EmptyKey.is_invalid_input());
        assert!(Error::EmptyValue.is_invalid_input());
        assert!(Error::not_found("k").is_not_found());
        assert!(!Error::AlreadyClosed.is_not_found());
    }
}
