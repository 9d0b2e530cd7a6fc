pub mod customer;
pub mod envelope;
pub mod message;
pub mod outbox;
pub mod wallet;

pub use customer::Customer;
pub use envelope::{Envelope, Sms};
pub use message::{Message, MessageStatus, SmsType};
pub use outbox::OutboxEvent;
pub use wallet::{LedgerOp, WalletAccount, WalletLedgerRow};
