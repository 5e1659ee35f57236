use thiserror::Error;

/// Errors that can occur in the dispatch system
#[derive(Error, Debug, Clone)]
pub enum EventError {
    /// Listener registration was given an unusable event name
    #[error("invalid event name: {0:?}")]
    InvalidName(String),

    /// A dispatch protocol reached a callback registered for the other protocol shape
    #[error("cannot dispatch `{name}` via `{protocol}`: listener registered as {registered} callback")]
    CallbackMismatch {
        /// Event name being dispatched
        name: String,
        /// Protocol that attempted the invocation
        protocol: &'static str,
        /// Shape the listener was registered with
        registered: &'static str,
    },

    /// Failed to process an event
    #[error("failed to process event: {0}")]
    ProcessingError(String),
}

/// Type alias for Result with EventError
pub type EventResult<T> = Result<T, EventError>;
