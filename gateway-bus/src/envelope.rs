//! Message and error types shared by every [`crate::MessageBus`] implementation.

/// A message fetched from the bus, still awaiting commit.
#[derive(Debug, Clone)]
pub struct BusMessage {
    /// Topic the message was published to (e.g. `sms.normal`).
    pub topic: String,
    /// Consumer group that fetched this message (e.g. `sender-normal`).
    pub group: String,
    /// Raw payload bytes — the JSON envelope.
    pub payload: Vec<u8>,
    /// Opaque identifier used by the bus implementation to locate the
    /// in-flight delivery when `commit` is called. Never inspected by
    /// callers.
    pub delivery_id: u64,
}

/// Errors that can occur when using the bus.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("failed to publish message: {0}")]
    Publish(String),

    #[error("failed to fetch message: {0}")]
    Fetch(String),

    #[error("failed to commit delivery: {0}")]
    Commit(String),

    #[error("connection error: {0}")]
    Connection(String),
}

pub type BusResult<T> = Result<T, BusError>;
