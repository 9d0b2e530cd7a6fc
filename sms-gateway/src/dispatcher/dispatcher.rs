//! Dispatcher (C3): round-robin selection over healthy providers with a
//! per-lane attempt budget.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::errors::DispatchError;
use crate::models::{Sms, SmsType};

use super::provider::SmsProvider;

pub struct Dispatcher {
    providers: Vec<Arc<dyn SmsProvider>>,
    round_robin_counter: AtomicU64,
    max_attempts_normal: u32,
    max_attempts_express: u32,
}

impl Dispatcher {
    pub fn new(
        providers: Vec<Arc<dyn SmsProvider>>,
        max_attempts_normal: u32,
        max_attempts_express: u32,
    ) -> Self {
        Self {
            providers,
            round_robin_counter: AtomicU64::new(0),
            max_attempts_normal: max_attempts_normal.max(1),
            max_attempts_express: max_attempts_express.max(1),
        }
    }

    /// Selects a provider round-robin across the *currently* healthy set.
    /// Intentionally does not cache the filtered list across calls —
    /// provider liveness changes between selections.
    fn select_provider(&self) -> Result<Arc<dyn SmsProvider>, DispatchError> {
        let healthy: Vec<&Arc<dyn SmsProvider>> =
            self.providers.iter().filter(|p| p.ready()).collect();

        if healthy.is_empty() {
            return Err(DispatchError::NoHealthyProviders);
        }

        let x = self.round_robin_counter.fetch_add(1, Ordering::Relaxed) + 1;
        let idx = ((x - 1) % healthy.len() as u64) as usize;
        Ok(healthy[idx].clone())
    }

    async fn try_once(&self, sms: &Sms, lane: SmsType) -> Result<(), DispatchError> {
        let provider = self.select_provider()?;

        if !provider.acquire() {
            return Err(DispatchError::NotAcquired {
                provider: provider.name().to_string(),
            });
        }

        match lane {
            SmsType::Express => provider.send_express(sms).await,
            SmsType::Normal => provider.send_normal(sms).await,
        }
    }

    /// Dispatch `sms` through the given lane, retrying up to that lane's
    /// attempt budget. Returns the last observed error on exhaustion —
    /// never `Ok` unless some attempt actually succeeded.
    pub async fn send(&self, sms: &Sms, lane: SmsType) -> Result<(), DispatchError> {
        let attempts = match lane {
            SmsType::Normal => self.max_attempts_normal,
            SmsType::Express => self.max_attempts_express,
        };

        let mut last = DispatchError::NoHealthyProviders;
        for _ in 0..attempts {
            match self.try_once(sms, lane).await {
                Ok(()) => return Ok(()),
                Err(e) => last = e,
            }
        }
        Err(last)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    struct MockProvider {
        name: String,
        acquire_count: AtomicUsize,
        always_fails: bool,
    }

    impl MockProvider {
        fn new(name: &str, always_fails: bool) -> Self {
            Self {
                name: name.to_string(),
                acquire_count: AtomicUsize::new(0),
                always_fails,
            }
        }

        fn acquire_calls(&self) -> usize {
            self.acquire_count.load(Ordering::Relaxed)
        }
    }

    #[async_trait]
    impl SmsProvider for MockProvider {
        fn name(&self) -> &str {
            &self.name
        }

        fn ready(&self) -> bool {
            true
        }

        fn acquire(&self) -> bool {
            self.acquire_count.fetch_add(1, Ordering::Relaxed);
            true
        }

        async fn send_normal(&self, _sms: &Sms) -> Result<(), DispatchError> {
            if self.always_fails {
                Err(DispatchError::ProviderStatus {
                    provider: self.name.clone(),
                    path: "/send/normal".into(),
                    status: 500,
                })
            } else {
                Ok(())
            }
        }

        async fn send_express(&self, _sms: &Sms) -> Result<(), DispatchError> {
            self.send_normal(_sms).await
        }
    }

    fn sms() -> Sms {
        Sms {
            phone: "+989123456789".into(),
            text: "hi".into(),
            r#type: None,
        }
    }

    #[tokio::test]
    async fn round_robin_spreads_across_healthy_providers() {
        let p1 = Arc::new(MockProvider::new("p1", false));
        let p2 = Arc::new(MockProvider::new("p2", false));
        let p3 = Arc::new(MockProvider::new("p3", false));
        let dispatcher: Dispatcher = Dispatcher::new(
            vec![p1.clone(), p2.clone(), p3.clone()],
            2,
            3,
        );

        for _ in 0..9 {
            dispatcher.send(&sms(), SmsType::Normal).await.unwrap();
        }

        assert_eq!(p1.acquire_calls(), 3);
        assert_eq!(p2.acquire_calls(), 3);
        assert_eq!(p3.acquire_calls(), 3);
    }

    #[tokio::test]
    async fn no_healthy_providers_fails_fast() {
        let dispatcher = Dispatcher::new(Vec::new(), 2, 3);
        let err = dispatcher.send(&sms(), SmsType::Normal).await.unwrap_err();
        assert!(matches!(err, DispatchError::NoHealthyProviders));
    }

    #[tokio::test]
    async fn exhausts_attempt_budget_and_returns_last_error() {
        let p1 = Arc::new(MockProvider::new("p1", true));
        let dispatcher = Dispatcher::new(vec![p1.clone()], 2, 3);

        let err = dispatcher.send(&sms(), SmsType::Express).await.unwrap_err();
        assert!(matches!(err, DispatchError::ProviderStatus { .. }));
        // One acquire per attempt, 3 attempts for express.
        assert_eq!(p1.acquire_calls(), 3);
    }
}
