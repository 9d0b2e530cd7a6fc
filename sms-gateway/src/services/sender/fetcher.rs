//! Fetcher (1 per lane): pulls from the bus and pushes onto `msgCh`. On a
//! transient fetch error it logs and sleeps 200ms rather than busy-looping
//! (§4.5). Exits as soon as shutdown is signalled.

use std::sync::Arc;
use std::time::Duration;

use gateway_bus::{BusMessage, MessageBus};
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

const FETCH_ERROR_BACKOFF: Duration = Duration::from_millis(200);

pub(super) async fn run(
    bus: Arc<dyn MessageBus>,
    topic: String,
    group: String,
    out: Sender<BusMessage>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::debug!(%topic, %group, "fetcher exiting on shutdown");
                return;
            }
            fetched = bus.fetch(&topic, &group) => {
                match fetched {
                    Ok(msg) => {
                        if out.send(msg).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        tracing::warn!(%topic, %group, error = %e, "bus fetch failed, backing off");
                        tokio::select! {
                            _ = shutdown.cancelled() => return,
                            _ = tokio::time::sleep(FETCH_ERROR_BACKOFF) => {}
                        }
                    }
                }
            }
        }
    }
}
