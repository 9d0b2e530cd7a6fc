pub mod breaker;
pub mod dispatcher;
pub mod provider;

pub use dispatcher::Dispatcher;
pub use provider::{HttpProvider, SmsProvider};
