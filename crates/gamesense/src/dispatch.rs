use crate::error::DispatchError;
use crate::model::ModelClient;
use async_trait::async_trait;
use gamesense_core::payload::ModelRequest;
use gamesense_core::retry::RetryPolicy;
use std::sync::Arc;
use std::time::Duration;

/// Waits between attempts. Swapped for a recorder in tests.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Runs model calls under a retry policy.
#[derive(Clone)]
pub struct Dispatcher {
    client: Arc<dyn ModelClient>,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl Dispatcher {
    pub fn new(client: Arc<dyn ModelClient>, policy: RetryPolicy) -> Self {
        Self::with_sleeper(client, policy, Arc::new(TokioSleeper))
    }

    pub fn with_sleeper(
        client: Arc<dyn ModelClient>,
        policy: RetryPolicy,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            client,
            policy,
            sleeper,
        }
    }

    /// Generate text, retrying rate limits and server faults with backoff.
    pub async fn generate(&self, request: &ModelRequest) -> Result<String, DispatchError> {
        let mut attempt = 1;

        loop {
            let err = match self.client.generate(request).await {
                Ok(text) => {
                    if attempt > 1 {
                        log::info!("Model call succeeded on attempt {}", attempt);
                    }
                    return Ok(text);
                }
                Err(err) => err,
            };

            let class = err.class();
            if !class.is_transient() {
                return Err(DispatchError::Fatal(err));
            }

            if !self.policy.should_retry(attempt, class) {
                log::warn!(
                    "Model call failed (attempt {}/{}), giving up: {}",
                    attempt,
                    self.policy.max_attempts,
                    err
                );
                return Err(DispatchError::ExhaustedRetries {
                    attempts: attempt,
                    last: err,
                });
            }

            let delay = self.policy.delay_for(attempt);
            log::warn!(
                "Model call failed (attempt {}/{}), retrying in {:?}: {}",
                attempt,
                self.policy.max_attempts,
                delay,
                err
            );
            self.sleeper.sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;
    use crate::test_support::{FakeModelClient, RecordingSleeper};
    use gamesense_core::chat::ModelRole;
    use gamesense_core::payload::ModelTurn;

    fn request() -> ModelRequest {
        ModelRequest {
            system_instruction: None,
            contents: vec![ModelTurn {
                role: ModelRole::User,
                text: "hi".to_string(),
            }],
        }
    }

    fn rate_limited() -> ModelError {
        ModelError::RateLimited {
            message: "quota".to_string(),
        }
    }

    fn dispatcher(client: Arc<FakeModelClient>, sleeper: Arc<RecordingSleeper>) -> Dispatcher {
        Dispatcher::with_sleeper(client, RetryPolicy::default(), sleeper)
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let client = Arc::new(FakeModelClient::new(vec![Ok("answer".to_string())]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let text = dispatcher(client.clone(), sleeper.clone())
            .generate(&request())
            .await
            .unwrap();

        assert_eq!(text, "answer");
        assert_eq!(client.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_three_rate_limits_then_success() {
        let client = Arc::new(FakeModelClient::new(vec![
            Err(rate_limited()),
            Err(rate_limited()),
            Err(rate_limited()),
            Ok("finally".to_string()),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let text = dispatcher(client.clone(), sleeper.clone())
            .generate(&request())
            .await
            .unwrap();

        assert_eq!(text, "finally");
        assert_eq!(client.calls(), 4);
        assert_eq!(
            sleeper.delays(),
            vec![
                Duration::from_secs(2),
                Duration::from_secs(4),
                Duration::from_secs(8)
            ]
        );
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_stops_after_five_attempts() {
        let client = Arc::new(FakeModelClient::new(
            (0..6).map(|_| Err(rate_limited())).collect(),
        ));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = dispatcher(client.clone(), sleeper.clone())
            .generate(&request())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            DispatchError::ExhaustedRetries {
                attempts: 5,
                last: rate_limited()
            }
        );
        assert_eq!(client.calls(), 5);
        assert_eq!(sleeper.delays().len(), 4);
        assert_eq!(sleeper.delays().last(), Some(&Duration::from_secs(16)));
    }

    #[tokio::test]
    async fn test_server_errors_are_retried() {
        let client = Arc::new(FakeModelClient::new(vec![
            Err(ModelError::Server {
                status: 503,
                message: "overloaded".to_string(),
            }),
            Ok("recovered".to_string()),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let text = dispatcher(client.clone(), sleeper.clone())
            .generate(&request())
            .await
            .unwrap();

        assert_eq!(text, "recovered");
        assert_eq!(sleeper.delays(), vec![Duration::from_secs(2)]);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let fatal = ModelError::Validation {
            status: 400,
            message: "bad request".to_string(),
        };
        let client = Arc::new(FakeModelClient::new(vec![
            Err(fatal.clone()),
            Ok("never reached".to_string()),
        ]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = dispatcher(client.clone(), sleeper.clone())
            .generate(&request())
            .await
            .unwrap_err();

        assert_eq!(err, DispatchError::Fatal(fatal));
        assert_eq!(client.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_error_is_not_retried() {
        let client = Arc::new(FakeModelClient::new(vec![Err(ModelError::Unknown(
            "connection reset".to_string(),
        ))]));
        let sleeper = Arc::new(RecordingSleeper::default());

        let err = dispatcher(client.clone(), sleeper)
            .generate(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Fatal(ModelError::Unknown(_))));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_waits_for_backoff() {
        let client = Arc::new(FakeModelClient::new(vec![
            Err(rate_limited()),
            Ok("ok".to_string()),
        ]));
        let dispatcher = Dispatcher::new(client, RetryPolicy::default());

        let start = tokio::time::Instant::now();
        dispatcher.generate(&request()).await.unwrap();

        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
