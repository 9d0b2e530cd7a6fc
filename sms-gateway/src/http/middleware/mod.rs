pub mod auth;
pub mod rate_limit;

pub use auth::api_key_middleware;
pub use rate_limit::{rate_limit_middleware, RateLimiter};
