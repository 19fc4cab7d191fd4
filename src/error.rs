//! Task error taxonomy.
//!
//! Two kinds of failure drive the pipeline's error policy:
//!
//! - **Transform**: malformed input to a compilation or minification step.
//!   Always non-fatal: surfaced as a notification, previous output left
//!   untouched.
//! - **Io**: missing source path, unwritable destination. Fatal during the
//!   initial one-shot build; treated like transform errors during
//!   watch-triggered re-runs.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskError {
    /// Malformed input to a transformation step.
    #[error("{what}: {detail}")]
    Transform { what: String, detail: String },

    /// Filesystem failure while reading sources or writing outputs.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TaskError {
    /// Shorthand for a transformation failure.
    pub fn transform(what: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Transform {
            what: what.into(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_display() {
        let err = TaskError::transform("style.css", "unexpected token");
        assert_eq!(err.to_string(), "style.css: unexpected token");
        assert!(matches!(err, TaskError::Transform { .. }));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = TaskError::from(io);
        assert!(matches!(err, TaskError::Io(_)));
    }
}
