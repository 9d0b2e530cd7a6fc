//! Processors (N per lane): parse envelope, dispatch through the
//! provider pipeline, emit an update item, and always commit the bus
//! offset — dispatch failure is a send failure, not a poison message
//! (§4.5, §7).

use std::sync::Arc;

use gateway_bus::{BusMessage, MessageBus};
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::dispatcher::Dispatcher;
use crate::metrics::Metrics;
use crate::models::{Envelope, MessageStatus, SmsType};

use super::UpdateItem;

pub(super) async fn run(
    lane: SmsType,
    bus: Arc<dyn MessageBus>,
    dispatcher: Arc<Dispatcher>,
    price: i64,
    msg_rx: Arc<Mutex<Receiver<BusMessage>>>,
    updates: Sender<UpdateItem>,
    metrics: Arc<Metrics>,
    shutdown: CancellationToken,
) {
    loop {
        let received = {
            let mut rx = msg_rx.lock().await;
            tokio::select! {
                _ = shutdown.cancelled() => None,
                m = rx.recv() => m,
            }
        };

        let Some(msg) = received else {
            return;
        };

        process_one(lane, &bus, &dispatcher, price, msg, &updates, &metrics).await;
    }
}

async fn process_one(
    lane: SmsType,
    bus: &Arc<dyn MessageBus>,
    dispatcher: &Dispatcher,
    price: i64,
    msg: BusMessage,
    updates: &Sender<UpdateItem>,
    metrics: &Metrics,
) {
    let envelope: Envelope = match serde_json::from_slice(&msg.payload) {
        Ok(env) => env,
        Err(e) => {
            tracing::warn!(error = %e, "poison envelope: bad json, committing and dropping");
            let _ = bus.commit(&msg).await;
            return;
        }
    };

    if envelope.id.is_empty() {
        tracing::warn!("poison envelope: missing id, committing and dropping");
        let _ = bus.commit(&msg).await;
        return;
    }

    let sms_lane = envelope
        .sms
        .r#type
        .as_deref()
        .and_then(SmsType::parse)
        .unwrap_or(lane);

    let dispatch_result = match sms_lane {
        SmsType::Express => dispatcher.send(&envelope.sms, SmsType::Express).await,
        SmsType::Normal => dispatcher.send(&envelope.sms, SmsType::Normal).await,
    };

    let status = match dispatch_result {
        Ok(()) => MessageStatus::Sent,
        Err(e) => {
            tracing::warn!(message_id = %envelope.id, error = %e, "dispatch failed, refunding");
            MessageStatus::Failed
        }
    };

    metrics
        .messages_total
        .with_label_values(&[status.as_str(), sms_lane.as_str()])
        .inc();

    let item = UpdateItem {
        id: envelope.id,
        customer_id: envelope.user_id,
        amount: price,
        status,
    };

    if updates.send(item).await.is_err() {
        tracing::warn!("batch writer channel closed, dropping update");
    }

    if let Err(e) = bus.commit(&msg).await {
        tracing::warn!(error = %e, "bus commit failed");
    }
}
