//! C5 Stage Executor: runs one stage (screening, extraction, market,
//! match) across a batch of prompts with a bounded worker pool, per-item
//! isolation, same-provider retry, and cross-provider fallback.
//!
//! Grounded on `ai::retry::retry_with_backoff` for the backoff loop and
//! `ai::hybrid_provider::HybridProvider::try_with_fallback` for the
//! primary/fallback resilience pattern — generalized here from a two-
//! provider (local/cloud) split to an arbitrary named primary/fallback
//! pair resolved through the [`crate::registry::ProviderRegistry`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::errors::PipelineError;
use crate::progress::{ProgressEvent, SharedProgressListener, Stage};
use crate::provider::{is_recoverable_for_fallback, Adapter, Completion, CompletionOptions};
use crate::rate_limiter::RateLimiter;
use crate::registry::ProviderRegistry;
use crate::retry::{retry_with_backoff, RetryConfig};

/// One unit of work: a system/user prompt pair for a single input item.
#[derive(Debug, Clone)]
pub struct StageRequest {
    pub system_prompt: Option<String>,
    pub user_prompt: String,
}

/// Which provider(s) a stage should call, resolved once per stage run.
#[derive(Debug, Clone)]
pub struct StageProviders {
    pub primary: String,
    pub fallback: Option<String>,
}

pub struct StageExecutor {
    registry: Arc<ProviderRegistry>,
    concurrency: usize,
    retry_config: RetryConfig,
    /// Progress is emitted every N completed items (spec.md §4.5 default
    /// 10), plus always on the final item so a short batch still reports.
    progress_every: usize,
}

impl StageExecutor {
    pub fn new(registry: Arc<ProviderRegistry>, concurrency: usize) -> Self {
        Self {
            registry,
            concurrency: concurrency.max(1),
            retry_config: RetryConfig::default(),
            progress_every: 10,
        }
    }

    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn with_progress_every(mut self, progress_every: usize) -> Self {
        self.progress_every = progress_every.max(1);
        self
    }

    /// Runs `requests` through `providers`, preserving input order in the
    /// returned vector (invariant I1). Every element of `requests` gets its
    /// own attempt regardless of whether its neighbors failed — a single
    /// item's exhausted retries/fallback never aborts the batch.
    pub async fn run(
        &self,
        stage: Stage,
        requests: Vec<StageRequest>,
        providers: &StageProviders,
        options: CompletionOptions,
        progress: SharedProgressListener,
        cancelled: Arc<AtomicBool>,
    ) -> Vec<Result<Completion, PipelineError>> {
        let total = requests.len();
        if total == 0 {
            return Vec::new();
        }

        let primary = self.registry.get(&providers.primary);
        let primary_limiter = self.registry.rate_limiter(&providers.primary);
        let fallback = providers
            .fallback
            .as_ref()
            .and_then(|name| self.registry.get(name));
        let fallback_limiter = providers
            .fallback
            .as_ref()
            .and_then(|name| self.registry.rate_limiter(name));

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(total);

        for request in requests {
            let semaphore = semaphore.clone();
            let primary = primary.clone();
            let primary_limiter = primary_limiter.clone();
            let fallback = fallback.clone();
            let fallback_limiter = fallback_limiter.clone();
            let retry_config = self.retry_config.clone();
            let cancelled = cancelled.clone();

            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");

                if cancelled.load(Ordering::SeqCst) {
                    return Err(cancelled_error());
                }

                let Some(primary_adapter) = primary else {
                    return Err(PipelineError::Configuration(
                        "no primary provider configured for this stage".to_string(),
                    ));
                };

                execute_one(
                    primary_adapter,
                    primary_limiter,
                    fallback,
                    fallback_limiter,
                    request,
                    &options,
                    &retry_config,
                    cancelled,
                )
                .await
            }));
        }

        let mut results = Vec::with_capacity(total);
        for (index, handle) in handles.into_iter().enumerate() {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_error) => Err(PipelineError::Application(format!(
                    "worker task panicked: {}",
                    join_error
                ))),
            };
            let done = index + 1;
            // Non-blocking per §4.5: emitted every `progress_every` items and
            // always on the last one, never gating the worker loop on it.
            if done % self.progress_every == 0 || done == total {
                progress.on_progress(ProgressEvent {
                    stage,
                    done,
                    total,
                    note: result.as_ref().err().map(|e| e.to_string()),
                });
            }
            results.push(result);
        }

        results
    }
}

/// Interval at which an in-flight call is polled for cancellation. Short
/// enough that cancellation feels immediate without busy-looping.
const CANCELLATION_POLL_MS: u64 = 25;

/// Races `future` against the cancellation flag, polling it every
/// [`CANCELLATION_POLL_MS`]. Per spec.md §4.1/§5(ii), cancellation must
/// abort the in-flight call rather than let it run to completion in the
/// background — dropping `future` here (when the `select!` branch that
/// doesn't own it wins) does exactly that, since the adapter's HTTP
/// request future is cancelled on drop.
async fn race_cancellation<F, T>(future: F, cancelled: &AtomicBool) -> Result<T, ()>
where
    F: std::future::Future<Output = T>,
{
    tokio::pin!(future);
    loop {
        tokio::select! {
            result = &mut future => return Ok(result),
            _ = tokio::time::sleep(std::time::Duration::from_millis(CANCELLATION_POLL_MS)) => {
                if cancelled.load(Ordering::SeqCst) {
                    return Err(());
                }
            }
        }
    }
}

fn cancelled_error() -> PipelineError {
    PipelineError::Application("分析已取消".to_string())
}

async fn execute_one(
    primary: Arc<dyn Adapter>,
    primary_limiter: Option<Arc<RateLimiter>>,
    fallback: Option<Arc<dyn Adapter>>,
    fallback_limiter: Option<Arc<RateLimiter>>,
    request: StageRequest,
    options: &CompletionOptions,
    retry_config: &RetryConfig,
    cancelled: Arc<AtomicBool>,
) -> Result<Completion, PipelineError> {
    let system = request.system_prompt.clone();
    let user = request.user_prompt.clone();

    let primary_result = race_cancellation(
        retry_with_backoff(
            || {
                let primary = primary.clone();
                let primary_limiter = primary_limiter.clone();
                let system = system.clone();
                let user = user.clone();
                async move {
                    if let Some(limiter) = &primary_limiter {
                        limiter.acquire().await;
                    }
                    primary.complete(system.as_deref(), &user, options).await
                }
            },
            retry_config,
        ),
        &cancelled,
    )
    .await;

    let primary_result = match primary_result {
        Ok(result) => result,
        Err(()) => return Err(cancelled_error()),
    };

    match primary_result {
        Ok(completion) => Ok(completion),
        Err(error) => match &fallback {
            Some(fallback_adapter) if is_recoverable_for_fallback(&error) => {
                log::warn!(
                    "falling back from {} to {} after: {}",
                    primary.name(),
                    fallback_adapter.name(),
                    error
                );
                let fallback_result = race_cancellation(
                    retry_with_backoff(
                        || {
                            let fallback_adapter = fallback_adapter.clone();
                            let fallback_limiter = fallback_limiter.clone();
                            let system = system.clone();
                            let user = user.clone();
                            async move {
                                if let Some(limiter) = &fallback_limiter {
                                    limiter.acquire().await;
                                }
                                fallback_adapter.complete(system.as_deref(), &user, options).await
                            }
                        },
                        retry_config,
                    ),
                    &cancelled,
                )
                .await;

                match fallback_result {
                    Ok(result) => result.map_err(PipelineError::from),
                    Err(()) => Err(cancelled_error()),
                }
            }
            _ => Err(PipelineError::from(error)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::mock::{MockAdapter, MockFailure, MockOutcome};
    use crate::progress::NullProgressListener;
    use std::collections::HashMap;

    fn registry_with(adapters: Vec<(&'static str, Arc<dyn Adapter>)>) -> Arc<ProviderRegistry> {
        let mut map: HashMap<&'static str, Arc<dyn Adapter>> = HashMap::new();
        for (name, adapter) in adapters {
            map.insert(name, adapter);
        }
        Arc::new(ProviderRegistry::from_adapters(map))
    }

    #[tokio::test]
    async fn preserves_order_across_concurrent_items() {
        let primary = Arc::new(MockAdapter::new("primary"));
        for i in 0..5 {
            primary
                .queue(&format!("item-{}", i), MockOutcome::Text(format!("out-{}", i)))
                .await;
        }
        let registry = registry_with(vec![("primary", primary.clone())]);
        let executor = StageExecutor::new(registry, 3);

        let requests: Vec<_> = (0..5)
            .map(|i| StageRequest {
                system_prompt: None,
                user_prompt: format!("item-{}", i),
            })
            .collect();

        let results = executor
            .run(
                Stage::Extraction,
                requests,
                &StageProviders { primary: "primary".to_string(), fallback: None },
                CompletionOptions::default_analysis(),
                Arc::new(NullProgressListener),
                Arc::new(AtomicBool::new(false)),
            )
            .await;

        for (i, result) in results.into_iter().enumerate() {
            assert_eq!(result.unwrap().text, format!("out-{}", i));
        }
    }

    #[tokio::test]
    async fn falls_back_to_secondary_provider_on_recoverable_error() {
        let primary = Arc::new(MockAdapter::new("primary").with_default(MockOutcome::Fail(MockFailure::Timeout)));
        let fallback = Arc::new(MockAdapter::new("fallback").with_default(MockOutcome::Text("rescued".into())));
        let registry = registry_with(vec![
            ("primary", primary.clone()),
            ("fallback", fallback.clone()),
        ]);
        let executor = StageExecutor::new(registry, 2)
            .with_retry_config(RetryConfig { max_retries: 0, initial_delay_ms: 1, max_delay_ms: 1, backoff_multiplier: 1.0 });

        let requests = vec![StageRequest { system_prompt: None, user_prompt: "x".to_string() }];
        let results = executor
            .run(
                Stage::Extraction,
                requests,
                &StageProviders { primary: "primary".to_string(), fallback: Some("fallback".to_string()) },
                CompletionOptions::default_analysis(),
                Arc::new(NullProgressListener),
                Arc::new(AtomicBool::new(false)),
            )
            .await;

        assert_eq!(results[0].as_ref().unwrap().text, "rescued");
    }

    #[tokio::test]
    async fn non_recoverable_error_skips_fallback() {
        let primary = Arc::new(MockAdapter::new("primary").with_default(MockOutcome::Fail(MockFailure::Shape)));
        let fallback = Arc::new(MockAdapter::new("fallback").with_default(MockOutcome::Text("should-not-see-this".into())));
        let registry = registry_with(vec![
            ("primary", primary.clone()),
            ("fallback", fallback.clone()),
        ]);
        let executor = StageExecutor::new(registry, 1)
            .with_retry_config(RetryConfig { max_retries: 0, initial_delay_ms: 1, max_delay_ms: 1, backoff_multiplier: 1.0 });

        let requests = vec![StageRequest { system_prompt: None, user_prompt: "x".to_string() }];
        let results = executor
            .run(
                Stage::Extraction,
                requests,
                &StageProviders { primary: "primary".to_string(), fallback: Some("fallback".to_string()) },
                CompletionOptions::default_analysis(),
                Arc::new(NullProgressListener),
                Arc::new(AtomicBool::new(false)),
            )
            .await;

        assert!(results[0].is_err());
    }

    #[tokio::test]
    async fn cancellation_short_circuits_unstarted_items() {
        let primary = Arc::new(MockAdapter::new("primary").with_default(MockOutcome::Text("ok".into())));
        let registry = registry_with(vec![("primary", primary.clone())]);
        let executor = StageExecutor::new(registry, 4);

        let requests: Vec<_> = (0..3)
            .map(|i| StageRequest { system_prompt: None, user_prompt: format!("x{}", i) })
            .collect();

        let cancelled = Arc::new(AtomicBool::new(true));
        let results = executor
            .run(
                Stage::Match,
                requests,
                &StageProviders { primary: "primary".to_string(), fallback: None },
                CompletionOptions::default_analysis(),
                Arc::new(NullProgressListener),
                cancelled,
            )
            .await;

        assert!(results.iter().all(|r| r.is_err()));
    }

    /// A provider that blocks far longer than the test should ever wait,
    /// so any completion observed here means cancellation failed to abort
    /// the in-flight call.
    struct SlowAdapter {
        started: Arc<AtomicBool>,
        finished: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl Adapter for SlowAdapter {
        fn name(&self) -> &str {
            "slow"
        }

        async fn complete(
            &self,
            _system_prompt: Option<&str>,
            _user_prompt: &str,
            _options: &CompletionOptions,
        ) -> Result<Completion, crate::provider::AdapterError> {
            self.started.store(true, Ordering::SeqCst);
            tokio::time::sleep(std::time::Duration::from_secs(5)).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(Completion {
                text: "too-late".to_string(),
                source: crate::provider::CompletionSource::Primary,
            })
        }
    }

    #[tokio::test]
    async fn cancellation_aborts_a_call_already_in_flight() {
        let started = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));
        let adapter = Arc::new(SlowAdapter { started: started.clone(), finished: finished.clone() });
        let registry = registry_with(vec![("slow", adapter.clone() as Arc<dyn Adapter>)]);
        let executor = StageExecutor::new(registry, 1);

        let cancelled = Arc::new(AtomicBool::new(false));
        let cancel_flag = cancelled.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            cancel_flag.store(true, Ordering::SeqCst);
        });

        let requests = vec![StageRequest { system_prompt: None, user_prompt: "x".to_string() }];
        let results = executor
            .run(
                Stage::Extraction,
                requests,
                &StageProviders { primary: "slow".to_string(), fallback: None },
                CompletionOptions::default_analysis(),
                Arc::new(NullProgressListener),
                cancelled,
            )
            .await;

        assert!(results[0].is_err());
        assert!(started.load(Ordering::SeqCst), "the call must have actually started");
        assert!(!finished.load(Ordering::SeqCst), "cancellation must abort it before it finishes");
    }
}
