use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use gateway_bus::{InMemoryBus, MessageBus, NatsBus};
use sms_gateway::config::{BusType, Config};
use sms_gateway::dispatcher::{Dispatcher, HttpProvider, SmsProvider};
use sms_gateway::http::{build_router, AppState};
use sms_gateway::ids::IdGenerator;
use sms_gateway::metrics::Metrics;
use sms_gateway::models::SmsType;
use sms_gateway::services::sender::SenderWorker;
use sms_gateway::services::{Pricing, QueueService, SenderConfig, WalletService};
use sms_gateway::db;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

const BUS_CONSUMER_BASE: &str = "sender";
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env().expect("failed to load configuration from environment");

    tracing::info!(host = %config.host, port = config.port, "starting sms-gateway");

    let pool = db::init_pool(&config)
        .await
        .expect("failed to connect to database");

    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");

    let bus: Arc<dyn MessageBus> = match config.bus_type {
        BusType::InMemory => {
            tracing::info!("using in-memory message bus");
            Arc::new(InMemoryBus::new())
        }
        BusType::Nats => {
            tracing::info!(url = %config.nats_url, "connecting to NATS JetStream");
            let client = async_nats::connect(&config.nats_url)
                .await
                .expect("failed to connect to NATS");
            Arc::new(
                NatsBus::new(client)
                    .await
                    .expect("failed to initialize NATS bus"),
            )
        }
    };

    let providers: Vec<Arc<dyn SmsProvider>> = config
        .providers
        .iter()
        .filter(|p| p.enabled)
        .map(|p| Arc::new(HttpProvider::new(p)) as Arc<dyn SmsProvider>)
        .collect();

    if providers.is_empty() {
        tracing::warn!("no enabled providers configured; every dispatch will fail");
    }

    let dispatcher = Arc::new(Dispatcher::new(
        providers,
        config.dispatcher.max_retry_attempts.normal,
        config.dispatcher.max_retry_attempts.express,
    ));

    let ids = IdGenerator::new();
    let pricing = Pricing {
        normal: config.pricing.normal,
        express: config.pricing.express,
    };
    let queue_service = Arc::new(QueueService::new(pool.clone(), ids, pricing));
    let wallet_service = Arc::new(WalletService::new(pool.clone()));
    let metrics = Metrics::new();

    let shutdown = CancellationToken::new();
    let sender_config = SenderConfig {
        workers: config.dispatcher.worker_count,
        batch_size: config.dispatcher.batch_size,
        batch_wait: config.dispatcher.batch_wait,
    };

    let normal_worker = SenderWorker::spawn(
        SmsType::Normal,
        bus.clone(),
        dispatcher.clone(),
        pool.clone(),
        pricing.normal,
        BUS_CONSUMER_BASE,
        sender_config,
        Arc::new(metrics.clone()),
        shutdown.clone(),
    );
    let express_worker = SenderWorker::spawn(
        SmsType::Express,
        bus.clone(),
        dispatcher,
        pool.clone(),
        pricing.express,
        BUS_CONSUMER_BASE,
        sender_config,
        Arc::new(metrics.clone()),
        shutdown.clone(),
    );

    let state = AppState {
        pool: pool.clone(),
        queue_service,
        wallet_service,
        metrics,
    };

    let app = build_router(state, &config);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind address");

    tracing::info!(%addr, "sms-gateway listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");

    tracing::info!("http server stopped, shutting down sender workers");
    shutdown.cancel();

    let _ = tokio::time::timeout(SHUTDOWN_GRACE, async {
        normal_worker.join().await;
        express_worker.join().await;
    })
    .await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
