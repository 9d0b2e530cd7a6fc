//! NATS JetStream-backed implementation of [`crate::MessageBus`].
//!
//! Each lane topic (`sms.normal`, `sms.express`) maps to a JetStream stream
//! subject, and each consumer group maps to a durable pull consumer on that
//! stream. Pull consumers give us exactly the semantics the sender workers
//! need: a message is only considered delivered once it is explicitly
//! acked, so a crashed worker's in-flight message is redelivered to another
//! worker in the same durable group.

use crate::envelope::{BusError, BusMessage, BusResult};
use crate::MessageBus;
use async_nats::jetstream::{self, consumer::PullConsumer};
use async_trait::async_trait;
use dashmap::DashMap;
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Stream all lane topics are published on. A single stream subscribing to
/// `sms.>` keeps the deployment simple — JetStream subject filtering at the
/// consumer level does the lane separation.
const STREAM_NAME: &str = "SMS_GATEWAY";
const STREAM_SUBJECTS: &str = "sms.>";

pub struct NatsBus {
    context: jetstream::Context,
    consumers: DashMap<String, PullConsumer>,
    in_flight: DashMap<u64, async_nats::jetstream::Message>,
    next_delivery_id: Arc<AtomicU64>,
}

impl NatsBus {
    pub async fn new(client: async_nats::Client) -> BusResult<Self> {
        let context = jetstream::new(client);

        context
            .get_or_create_stream(jetstream::stream::Config {
                name: STREAM_NAME.to_string(),
                subjects: vec![STREAM_SUBJECTS.to_string()],
                ..Default::default()
            })
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;

        Ok(Self {
            context,
            consumers: DashMap::new(),
            in_flight: DashMap::new(),
            next_delivery_id: Arc::new(AtomicU64::new(0)),
        })
    }

    async fn consumer_for(&self, topic: &str, group: &str) -> BusResult<PullConsumer> {
        if let Some(existing) = self.consumers.get(group) {
            return Ok(existing.clone());
        }

        let stream = self
            .context
            .get_stream(STREAM_NAME)
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;

        let consumer: PullConsumer = stream
            .get_or_create_consumer(
                group,
                jetstream::consumer::pull::Config {
                    durable_name: Some(group.to_string()),
                    filter_subject: topic.to_string(),
                    ack_policy: jetstream::consumer::AckPolicy::Explicit,
                    ..Default::default()
                },
            )
            .await
            .map_err(|e| BusError::Connection(e.to_string()))?;

        self.consumers.insert(group.to_string(), consumer.clone());
        Ok(consumer)
    }
}

#[async_trait]
impl MessageBus for NatsBus {
    async fn fetch(&self, topic: &str, group: &str) -> BusResult<BusMessage> {
        let consumer = self.consumer_for(topic, group).await?;

        let mut batch = consumer
            .fetch()
            .max_messages(1)
            .messages()
            .await
            .map_err(|e| BusError::Fetch(e.to_string()))?;

        let msg = batch
            .next()
            .await
            .ok_or_else(|| BusError::Fetch("fetch stream ended with no message".into()))?
            .map_err(|e| BusError::Fetch(e.to_string()))?;

        let delivery_id = self.next_delivery_id.fetch_add(1, Ordering::Relaxed);
        let payload = msg.payload.to_vec();
        self.in_flight.insert(delivery_id, msg);

        Ok(BusMessage {
            topic: topic.to_string(),
            group: group.to_string(),
            payload,
            delivery_id,
        })
    }

    async fn commit(&self, msg: &BusMessage) -> BusResult<()> {
        let Some((_, nats_msg)) = self.in_flight.remove(&msg.delivery_id) else {
            return Err(BusError::Commit(format!(
                "no in-flight delivery {} to commit",
                msg.delivery_id
            )));
        };

        nats_msg
            .ack()
            .await
            .map_err(|e| BusError::Commit(e.to_string()))
    }
}
