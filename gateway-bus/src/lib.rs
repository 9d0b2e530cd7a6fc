//! # Gateway message bus
//!
//! A pull/ack partitioned bus abstraction sitting between the outbox relay
//! and the per-lane sender workers.
//!
//! ## Why this looks different from a plain pub/sub bus
//!
//! A broadcast-style event bus (publish, fan out to every subscriber) is the
//! right shape for inter-module domain events. The sender workers need
//! something else: a *durable consumer group* per lane that hands each
//! message to exactly one worker at a time and only considers it delivered
//! once the worker explicitly commits the offset. That is the JetStream pull
//! consumer model, so the trait below exposes `fetch`/`commit` instead of
//! `publish`/`subscribe`.
//!
//! ## Implementations
//!
//! - [`NatsBus`]: production implementation backed by NATS JetStream pull
//!   consumers, one durable consumer per `(topic, group)`.
//! - [`InMemoryBus`]: in-process FIFO queues for tests and local dev, with
//!   the same at-least-once-until-committed contract.

mod envelope;
mod inmemory;
mod nats;

pub use envelope::{BusError, BusMessage, BusResult};
pub use inmemory::InMemoryBus;
pub use nats::NatsBus;

use async_trait::async_trait;
use std::fmt;

/// A partitioned, pull-based message bus with explicit offset commits.
///
/// `fetch` blocks (cooperatively) until a message is available for the given
/// `(topic, group)` pair or the caller's future is dropped/cancelled.
/// Delivery is at-least-once: a message is redelivered to some consumer in
/// the same group if the process that fetched it exits before calling
/// `commit`. Consumers must therefore be idempotent.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Fetch the next message for `topic`, scoped to the durable consumer
    /// group `group`.
    async fn fetch(&self, topic: &str, group: &str) -> BusResult<BusMessage>;

    /// Acknowledge successful processing of `msg`, advancing the consumer
    /// group's offset past it.
    async fn commit(&self, msg: &BusMessage) -> BusResult<()>;
}

impl fmt::Debug for dyn MessageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageBus")
    }
}
