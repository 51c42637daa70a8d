//! Retrying wrapper around any `Model`.
//!
//! Failed generations are retried with exponential backoff. Once the attempt
//! budget is exhausted the last error is reported inside
//! `ModelError::Other("Generation failed after N attempts: ...")`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rover_abstraction::{ChatMessage, Model, ModelError, ModelParameters, ModelResponse};
use tokio::time::sleep;
use tracing::warn;

/// Default number of attempts (the first call included).
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry; doubled on every later one.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// Default ceiling for a single backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// A `Model` that retries its inner model on failure.
#[derive(Clone)]
pub struct RetryModel {
    inner: Arc<dyn Model>,
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
}

impl RetryModel {
    /// Wraps `inner` with the default budget of 3 attempts and a 1 s base delay.
    #[must_use]
    pub fn new(inner: Arc<dyn Model>) -> Self {
        Self {
            inner,
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    /// Sets the total number of attempts. Zero is treated as one.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Sets the base backoff delay.
    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Sets the ceiling for a single backoff delay.
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Total number of attempts made before giving up.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay after the failed attempt `attempt` (zero-based), capped at `max_delay`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2_u32.checked_pow(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    async fn with_backoff<'a, F, Fut>(&'a self, mut call: F) -> Result<ModelResponse, ModelError>
    where
        F: FnMut(&'a dyn Model) -> Fut,
        Fut: std::future::Future<Output = Result<ModelResponse, ModelError>> + 'a,
    {
        let mut last_error = None;

        for attempt in 0..self.max_retries {
            match call(self.inner.as_ref()).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    if attempt + 1 < self.max_retries {
                        let delay = self.backoff_delay(attempt);
                        warn!(
                            model_id = %self.inner.model_id(),
                            attempt = attempt + 1,
                            max_retries = self.max_retries,
                            error = %e,
                            "Generation failed, retrying after {:?}",
                            delay
                        );
                        sleep(delay).await;
                    }
                    last_error = Some(e);
                }
            }
        }

        let last_error =
            last_error.map_or_else(|| "no attempts made".to_string(), |e| e.to_string());
        Err(ModelError::Other(format!(
            "Generation failed after {} attempts: {}",
            self.max_retries, last_error
        )))
    }
}

impl std::fmt::Debug for RetryModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryModel")
            .field("model_id", &self.inner.model_id())
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

#[async_trait]
impl Model for RetryModel {
    async fn generate_text(
        &self,
        prompt: &str,
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        self.with_backoff(|model| model.generate_text(prompt, parameters.clone())).await
    }

    async fn generate_chat_completion(
        &self,
        messages: &[ChatMessage],
        parameters: Option<ModelParameters>,
    ) -> Result<ModelResponse, ModelError> {
        self.with_backoff(|model| model.generate_chat_completion(messages, parameters.clone()))
            .await
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then answers "ok".
    struct Flaky {
        failures: u32,
        calls: AtomicU32,
    }

    impl Flaky {
        fn new(failures: u32) -> Arc<Self> {
            Arc::new(Self { failures, calls: AtomicU32::new(0) })
        }
    }

    #[async_trait]
    impl Model for Flaky {
        async fn generate_text(
            &self,
            _prompt: &str,
            _parameters: Option<ModelParameters>,
        ) -> Result<ModelResponse, ModelError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(ModelError::RequestError(format!("boom {}", n + 1)))
            } else {
                Ok(ModelResponse { content: "ok".to_string(), model_id: None, usage: None })
            }
        }

        async fn generate_chat_completion(
            &self,
            _messages: &[ChatMessage],
            parameters: Option<ModelParameters>,
        ) -> Result<ModelResponse, ModelError> {
            self.generate_text("", parameters).await
        }

        fn model_id(&self) -> &str {
            "flaky"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let inner = Flaky::new(2);
        let model = RetryModel::new(inner.clone());

        let start = tokio::time::Instant::now();
        let response = model.generate_text("x", None).await.unwrap();

        assert_eq!(response.content, "ok");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
        // 1s + 2s of backoff
        assert_eq!(start.elapsed(), Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_with_last_error() {
        let inner = Flaky::new(10);
        let model = RetryModel::new(inner.clone()).with_base_delay(Duration::from_millis(10));

        let err = model.generate_chat_completion(&[], None).await.unwrap_err();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            err,
            ModelError::Other(
                "Generation failed after 3 attempts: Request Error: boom 3".to_string()
            )
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_does_not_sleep() {
        let inner = Flaky::new(1);
        let model = RetryModel::new(inner.clone()).with_max_retries(0);
        assert_eq!(model.max_retries(), 1);

        let start = tokio::time::Instant::now();
        assert!(model.generate_text("x", None).await.is_err());
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert_eq!(model.model_id(), "flaky");
    }

    #[test]
    fn test_backoff_delay_is_capped() {
        let model = RetryModel::new(Flaky::new(0))
            .with_base_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_secs(5));

        assert_eq!(model.backoff_delay(0), Duration::from_millis(100));
        assert_eq!(model.backoff_delay(3), Duration::from_millis(800));
        assert_eq!(model.backoff_delay(6), Duration::from_secs(5));
        assert_eq!(model.backoff_delay(31), Duration::from_secs(5));
        assert_eq!(model.backoff_delay(40), Duration::from_secs(5));
        assert_eq!(model.backoff_delay(u32::MAX), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_large_attempt_budget_stays_bounded() {
        let inner = Flaky::new(100);
        let model = RetryModel::new(inner.clone())
            .with_max_retries(40)
            .with_base_delay(Duration::from_nanos(1))
            .with_max_delay(Duration::from_secs(1));

        let start = tokio::time::Instant::now();
        let err = model.generate_text("x", None).await.unwrap_err();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 40);
        assert!(err.to_string().contains("Generation failed after 40 attempts"));
        // 39 sleeps, none longer than the ceiling
        assert!(start.elapsed() <= Duration::from_secs(39));
    }
}
