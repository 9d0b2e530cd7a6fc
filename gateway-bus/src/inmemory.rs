//! In-process implementation of [`crate::MessageBus`] for tests and local dev.
//!
//! Each `(topic, group)` pair gets its own FIFO queue. `fetch` pops the head
//! of the queue for the caller's group; `commit` is a no-op bookkeeping call
//! because the message was already removed from the queue at fetch time —
//! there is no crash-recovery redelivery here. Tests that need to exercise
//! duplicate delivery (see scenario S6 in the spec) simply publish the same
//! envelope twice and fetch it twice.

use crate::envelope::{BusError, BusMessage, BusResult};
use crate::MessageBus;
use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

struct Queue {
    items: Mutex<VecDeque<Vec<u8>>>,
    notify: Notify,
}

impl Queue {
    fn new() -> Self {
        Self {
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }
}

/// In-memory message bus keyed by `"<topic>|<group>"`.
#[derive(Clone, Default)]
pub struct InMemoryBus {
    queues: Arc<DashMap<String, Arc<Queue>>>,
    next_delivery_id: Arc<AtomicU64>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(topic: &str, group: &str) -> String {
        format!("{topic}|{group}")
    }

    fn queue_for(&self, topic: &str, group: &str) -> Arc<Queue> {
        self.queues
            .entry(Self::key(topic, group))
            .or_insert_with(|| Arc::new(Queue::new()))
            .clone()
    }

    /// Publish `payload` to every `group` already registered (via a prior
    /// `fetch`) for `topic`. Groups that have not yet started fetching will
    /// not see messages published before their first `fetch` call — callers
    /// should start consumers before publishing, which matches how the
    /// sender workers start before traffic arrives.
    pub async fn publish(&self, topic: &str, payload: Vec<u8>) -> BusResult<()> {
        let prefix = format!("{topic}|");
        let mut delivered = false;
        for entry in self.queues.iter() {
            if entry.key().starts_with(&prefix) {
                let mut items = entry.value().items.lock().await;
                items.push_back(payload.clone());
                entry.value().notify.notify_one();
                delivered = true;
            }
        }
        if !delivered {
            // No consumer group registered yet for this topic; register a
            // default queue so a subsequent fetch still observes it instead
            // of silently dropping the only copy.
            let queue = self.queue_for(topic, "_unclaimed");
            let mut items = queue.items.lock().await;
            items.push_back(payload);
            queue.notify.notify_one();
        }
        Ok(())
    }
}

#[async_trait]
impl MessageBus for InMemoryBus {
    async fn fetch(&self, topic: &str, group: &str) -> BusResult<BusMessage> {
        let queue = self.queue_for(topic, group);
        loop {
            {
                let mut items = queue.items.lock().await;
                if let Some(payload) = items.pop_front() {
                    let delivery_id = self.next_delivery_id.fetch_add(1, Ordering::Relaxed);
                    return Ok(BusMessage {
                        topic: topic.to_string(),
                        group: group.to_string(),
                        payload,
                        delivery_id,
                    });
                }
            }
            queue.notify.notified().await;
        }
    }

    async fn commit(&self, msg: &BusMessage) -> BusResult<()> {
        if msg.topic.is_empty() {
            return Err(BusError::Commit("empty topic".into()));
        }
        Ok(())
    }
}
