use thiserror::Error;

/// Errors raised by the event bus.
#[derive(Debug, Error)]
pub enum EventError {
    /// A bound callback failed. Callbacks bound after it did not run.
    #[error("listener for event '{event}' failed: {source}")]
    Listener {
        event: String,
        #[source]
        source: anyhow::Error,
    },

    /// The configured engine identifier has no registered factory.
    #[error("event engine '{0}' is not registered")]
    UnknownEngine(String),
}
