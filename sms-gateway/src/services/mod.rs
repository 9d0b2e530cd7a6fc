pub mod queue_service;
pub mod sender;
pub mod wallet_service;

pub use queue_service::{Pricing, QueueService};
pub use sender::{SenderConfig, SenderWorker};
pub use wallet_service::WalletService;
