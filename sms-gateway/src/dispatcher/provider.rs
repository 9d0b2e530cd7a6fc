//! Provider adapter (C2): one SMS backend, breaker-backed.
//!
//! `SmsProvider` is the seam the dispatcher (C3) selects over; `HttpProvider`
//! is the only production implementation, POSTing to an external HTTP
//! backend. Tests implement the trait directly to simulate provider
//! behavior without a live HTTP server.

use async_trait::async_trait;

use crate::config::ProviderConfig;
use crate::dispatcher::breaker::Breaker;
use crate::errors::DispatchError;
use crate::models::Sms;

#[async_trait]
pub trait SmsProvider: Send + Sync {
    fn name(&self) -> &str;
    fn ready(&self) -> bool;
    fn acquire(&self) -> bool;
    async fn send_normal(&self, sms: &Sms) -> Result<(), DispatchError>;
    async fn send_express(&self, sms: &Sms) -> Result<(), DispatchError>;
}

pub struct HttpProvider {
    name: String,
    base_url: String,
    normal_path: String,
    express_path: String,
    client: reqwest::Client,
    breaker: Breaker,
}

impl HttpProvider {
    pub fn new(cfg: &ProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .expect("provider http client builds with a fixed timeout");

        Self {
            name: cfg.name.clone(),
            base_url: cfg.base_url.clone(),
            normal_path: cfg.normal_path.clone(),
            express_path: cfg.express_path.clone(),
            client,
            breaker: Breaker::new(cfg.breaker.fail_threshold, cfg.breaker.open_for),
        }
    }

    async fn post(&self, path: &str, sms: &Sms) -> Result<(), DispatchError> {
        let url = format!("{}{}", self.base_url, path);
        let result = self.client.post(&url).json(sms).send().await;

        match result {
            Ok(resp) if resp.status().is_success() => {
                self.breaker.on_success();
                Ok(())
            }
            Ok(resp) => {
                self.breaker.on_failure();
                Err(DispatchError::ProviderStatus {
                    provider: self.name.clone(),
                    path: path.to_string(),
                    status: resp.status().as_u16(),
                })
            }
            Err(e) => {
                self.breaker.on_failure();
                Err(DispatchError::ProviderTransport {
                    provider: self.name.clone(),
                    path: path.to_string(),
                    source: e.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl SmsProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn ready(&self) -> bool {
        self.breaker.ready()
    }

    fn acquire(&self) -> bool {
        self.breaker.try_acquire()
    }

    async fn send_normal(&self, sms: &Sms) -> Result<(), DispatchError> {
        self.post(&self.normal_path, sms).await
    }

    async fn send_express(&self, sms: &Sms) -> Result<(), DispatchError> {
        self.post(&self.express_path, sms).await
    }
}
