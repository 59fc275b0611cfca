//! Error types for worker construction, wiring and demand.
//!
//! Two kinds of failure come from the pipeline itself:
//!
//! - [`Error::Configuration`]: raised while building or wiring workers.
//! - [`Error::Readiness`]: raised when a worker that needs a value is demanded without a supply.
//!
//! The remaining variants describe what can happen to a worker's task once it runs.

use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or duplicate task, a supply given to a source, or an invalid behavior setting.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The worker's task expects an upstream value but none is configured.
    #[error("worker `{worker}` expects a value from a supply, but has no supply")]
    Readiness { worker: String },

    /// The task function itself returned an error.
    #[error("worker `{worker}` task failed: {source}")]
    Task {
        worker: String,
        #[source]
        source: anyhow::Error,
    },

    /// The task panicked while producing a value.
    #[error("worker `{worker}` panicked: {message}")]
    Panicked { worker: String, message: String },

    /// The worker's machine is gone and can no longer produce values.
    #[error("worker `{worker}` has halted")]
    Halted { worker: String },

    /// The thread backing the worker's task could not be started.
    #[error("failed to start worker `{worker}`")]
    Spawn {
        worker: String,
        #[source]
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Recovers a pipeline error that travelled through a task's `?`, or wraps a foreign one.
    pub(crate) fn from_task(worker: &str, error: anyhow::Error) -> Self {
        match error.downcast::<Self>() {
            Ok(error) => error,
            Err(source) => Self::Task { worker: worker.to_owned(), source },
        }
    }

    /// Returns true for [`Error::Configuration`].
    #[inline]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }

    /// Returns true for [`Error::Readiness`].
    #[inline]
    pub fn is_readiness(&self) -> bool {
        matches!(self, Self::Readiness { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_task_unwraps_pipeline_errors() {
        let inner = anyhow::Error::new(Error::Readiness { worker: "relay".into() });
        let error = Error::from_task("batch", inner);

        assert!(error.is_readiness());
        assert_eq!(error.to_string(), "worker `relay` expects a value from a supply, but has no supply");
    }

    #[test]
    fn test_from_task_wraps_foreign_errors() {
        let error = Error::from_task("relay", anyhow::anyhow!("bad input"));

        assert!(matches!(&error, Error::Task { worker, .. } if worker == "relay"));
        assert_eq!(error.to_string(), "worker `relay` task failed: bad input");
    }

    #[test]
    fn test_configuration_message() {
        let error = Error::configuration("worker `source` cannot accept a supply");

        assert!(error.is_configuration());
        assert!(error.to_string().contains("cannot accept a supply"));
    }
}
