//! Sender worker (C10): per-lane fetcher -> processor pool -> batch writer
//! pipeline described in §4.5 and §5.
//!
//! ```text
//!   bus ──fetcher─▶ msgCh ──N processors──▶ updateCh ──batchWriter──▶ DB tx
//! ```
//!
//! Each role owns its state; the only cross-role communication is the two
//! bounded `tokio::mpsc` channels, matching the teacher's task-per-role
//! consumer shape (`modules/payments/src/consumer_task.rs`) generalized
//! from a single consumer task into this three-role pipeline.

mod batch_writer;
mod fetcher;
mod processor;

use std::sync::Arc;
use std::time::Duration;

use gateway_bus::MessageBus;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::dispatcher::Dispatcher;
use crate::metrics::Metrics;
use crate::models::{MessageStatus, SmsType};

/// One dispatch outcome awaiting batched financial settlement.
#[derive(Debug, Clone)]
pub(crate) struct UpdateItem {
    pub id: String,
    pub customer_id: i64,
    pub amount: i64,
    pub status: MessageStatus,
}

#[derive(Debug, Clone, Copy)]
pub struct SenderConfig {
    pub workers: usize,
    pub batch_size: usize,
    pub batch_wait: Duration,
}

/// A running sender worker for one lane. Holds the three task handles so
/// the caller can await clean shutdown.
pub struct SenderWorker {
    fetcher: JoinHandle<()>,
    processors: Vec<JoinHandle<()>>,
    batch_writer: JoinHandle<()>,
}

impl SenderWorker {
    /// Spawn the fetcher, processor pool and batch writer for `lane`, and
    /// start consuming immediately. `consumer_base` combines with the lane
    /// to form the bus consumer group id `<base>-<lane>` (§6).
    pub fn spawn(
        lane: SmsType,
        bus: Arc<dyn MessageBus>,
        dispatcher: Arc<Dispatcher>,
        pool: sqlx::PgPool,
        price: i64,
        consumer_base: &str,
        config: SenderConfig,
        metrics: Arc<Metrics>,
        shutdown: tokio_util::sync::CancellationToken,
    ) -> Self {
        let topic = lane.topic().to_string();
        let group = format!("{consumer_base}-{lane}");

        let (msg_tx, msg_rx) = mpsc::channel(config.workers.max(1) * 2);
        let (update_tx, update_rx) = mpsc::channel(config.batch_size.max(1) * 2);

        let fetcher = tokio::spawn(fetcher::run(
            bus.clone(),
            topic,
            group,
            msg_tx,
            shutdown.clone(),
        ));

        let msg_rx = Arc::new(tokio::sync::Mutex::new(msg_rx));
        let mut processors = Vec::with_capacity(config.workers.max(1));
        for _ in 0..config.workers.max(1) {
            processors.push(tokio::spawn(processor::run(
                lane,
                bus.clone(),
                dispatcher.clone(),
                price,
                msg_rx.clone(),
                update_tx.clone(),
                metrics.clone(),
                shutdown.clone(),
            )));
        }
        drop(update_tx);

        let batch_writer = tokio::spawn(batch_writer::run(
            pool,
            update_rx,
            config.batch_size,
            config.batch_wait,
            shutdown,
        ));

        Self { fetcher, processors, batch_writer }
    }

    /// Await every task's completion. Intended to be called after the
    /// caller has triggered the shared `CancellationToken`.
    pub async fn join(self) {
        let _ = self.fetcher.await;
        for p in self.processors {
            let _ = p.await;
        }
        let _ = self.batch_writer.await;
    }
}
