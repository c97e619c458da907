//! Chain executor implementation
//!
//! All three entry modes (ad-hoc, named, public) funnel through the one
//! per-step loop in [`run_steps`]; only chain resolution, authorization
//! and counter side effects differ per mode.
//!
//! Two prompts flow through each step and they are deliberately not the
//! same: the *fetch* prompt is always the original initiating prompt, so
//! cache keys track stable user intent, while the *generation* subject
//! carries the accumulated context of prior steps.
//!
//! [`run_steps`]: ChainExecutorImpl::run_steps

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::domain::action::ActionKind;
use crate::domain::cache::ResponseCache;
use crate::domain::chain::{
    validate_prompt, validate_steps, Chain, ChainExecutor, ChainRepository, ChainRunResult,
    ChainStep, RunRecord, RunRecordRepository, SingleRunResult, StepRecord,
};
use crate::domain::prompt;
use crate::domain::provider::{DataFetcher, TextGenerator};
use crate::domain::DomainError;

const DEFAULT_AD_HOC_NAME: &str = "Ad-hoc Chain";

/// Tuning knobs for chain execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Wall-clock bound per step; overrun is a step failure
    pub step_timeout: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            step_timeout: Duration::from_secs(60),
        }
    }
}

/// Orchestrates per-step fetch, generation and context accumulation.
pub struct ChainExecutorImpl {
    fetcher: Arc<dyn DataFetcher>,
    generator: Arc<dyn TextGenerator>,
    cache: ResponseCache,
    chains: Arc<dyn ChainRepository>,
    runs: Arc<dyn RunRecordRepository>,
    config: ExecutorConfig,
}

/// Pieces of a successfully executed step, before timing is attached.
struct StepOutcome {
    api_response: String,
    ai_response: String,
    final_result: String,
    cached: bool,
}

impl ChainExecutorImpl {
    pub fn new(
        fetcher: Arc<dyn DataFetcher>,
        generator: Arc<dyn TextGenerator>,
        cache: ResponseCache,
        chains: Arc<dyn ChainRepository>,
        runs: Arc<dyn RunRecordRepository>,
    ) -> Self {
        Self::with_config(fetcher, generator, cache, chains, runs, ExecutorConfig::default())
    }

    pub fn with_config(
        fetcher: Arc<dyn DataFetcher>,
        generator: Arc<dyn TextGenerator>,
        cache: ResponseCache,
        chains: Arc<dyn ChainRepository>,
        runs: Arc<dyn RunRecordRepository>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            fetcher,
            generator,
            cache,
            chains,
            runs,
            config,
        }
    }

    /// Cache-check, fetch-if-miss, compose, generate, combine for one step.
    async fn execute_step(
        &self,
        action: ActionKind,
        generation_subject: &str,
        fetch_prompt: &str,
    ) -> Result<StepOutcome, DomainError> {
        let (api_response, cached) =
            match self.cache.get_api_response(action, fetch_prompt).await {
                Some(hit) => {
                    debug!(action = %action, "using cached API response");
                    (hit, true)
                }
                None => {
                    let fresh = self.fetcher.fetch(action, fetch_prompt).await?;
                    self.cache
                        .put_api_response(action, fetch_prompt, &fresh)
                        .await;
                    (fresh, false)
                }
            };

        let composed = prompt::compose(generation_subject, &api_response, action);
        let ai_response = self.generator.generate(&composed).await?;
        let final_result = prompt::combine_responses(&ai_response, &api_response, action);

        Ok(StepOutcome {
            api_response,
            ai_response,
            final_result,
            cached,
        })
    }

    /// The shared per-step loop. Never aborts on a step failure; every
    /// step yields exactly one record.
    async fn run_steps(
        &self,
        steps: &[ChainStep],
        initial_prompt: &str,
        identity: Option<&str>,
    ) -> Vec<StepRecord> {
        let mut records = Vec::with_capacity(steps.len());
        let mut combined_context = format!("Initial prompt: {}\n\n", initial_prompt);
        let mut current_prompt = initial_prompt.to_string();

        for (index, step) in steps.iter().enumerate() {
            let step_number = index + 1;
            let started = Instant::now();
            debug!(step = step_number, action = %step.action, "executing step");

            let generation_subject = match &step.prompt {
                Some(override_prompt) => {
                    format!("{} Context: {}", override_prompt, combined_context)
                }
                None => format!("{} Context: {}", current_prompt, combined_context),
            };

            let outcome = tokio::time::timeout(
                self.config.step_timeout,
                self.execute_step(step.action, &generation_subject, initial_prompt),
            )
            .await
            .unwrap_or_else(|_| {
                Err(DomainError::internal(format!(
                    "Step timed out after {}s",
                    self.config.step_timeout.as_secs()
                )))
            });

            let elapsed_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(outcome) => {
                    combined_context.push_str(&format!(
                        "Step {} ({}): {}\n",
                        step_number, step.action, outcome.final_result
                    ));
                    current_prompt = outcome.final_result.clone();

                    self.record_step(step.action, &generation_subject, &outcome, identity)
                        .await;

                    records.push(StepRecord::success(
                        step_number,
                        step.action,
                        generation_subject,
                        outcome.ai_response,
                        outcome.api_response,
                        outcome.final_result,
                        outcome.cached,
                        elapsed_ms,
                    ));
                }
                Err(e) => {
                    warn!(step = step_number, action = %step.action, error = %e, "step failed");
                    combined_context.push_str(&format!(
                        "Step {} ({}): Error - {}\n",
                        step_number, step.action, e
                    ));
                    records.push(StepRecord::failure(
                        step_number,
                        step.action,
                        generation_subject,
                        e.to_string(),
                        elapsed_ms,
                    ));
                }
            }
        }

        records
    }

    /// Saves one history record per successful step; failures are logged,
    /// never propagated.
    async fn record_step(
        &self,
        action: ActionKind,
        prompt: &str,
        outcome: &StepOutcome,
        identity: Option<&str>,
    ) {
        let run = RunRecord::new(
            prompt,
            action,
            outcome.ai_response.clone(),
            outcome.api_response.clone(),
            outcome.final_result.clone(),
            identity.map(String::from),
        );
        if let Err(e) = self.runs.record(&run).await {
            warn!(action = %action, error = %e, "failed to record run history");
        }
    }

    fn find_public_chain(public_id: &str) -> Result<Chain, DomainError> {
        Chain::public_catalog()
            .into_iter()
            .find(|chain| chain.id == public_id)
            .ok_or_else(|| DomainError::not_found("Public workflow chain not found"))
    }
}

#[async_trait]
impl ChainExecutor for ChainExecutorImpl {
    async fn execute_ad_hoc(
        &self,
        steps: &[ChainStep],
        prompt: &str,
        identity: Option<&str>,
        name: Option<&str>,
    ) -> Result<ChainRunResult, DomainError> {
        validate_prompt(prompt)?;
        validate_steps(steps)?;

        let name = name.unwrap_or(DEFAULT_AD_HOC_NAME);
        info!(chain = %name, steps = steps.len(), "executing ad-hoc chain");

        let records = self.run_steps(steps, prompt, identity).await;
        let mut result = ChainRunResult::from_steps(name, records);
        result.is_ad_hoc = true;
        Ok(result)
    }

    async fn execute_named(
        &self,
        chain_id: &str,
        prompt: &str,
        identity: Option<&str>,
    ) -> Result<ChainRunResult, DomainError> {
        validate_prompt(prompt)?;

        let chain = self
            .chains
            .find_by_id(chain_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Workflow chain not found"))?;

        if let Some(owner) = &chain.owner_id {
            if identity != Some(owner.as_str()) {
                return Err(DomainError::unauthorized(
                    "Unauthorized access to workflow chain",
                ));
            }
        }

        info!(chain = %chain.name, id = %chain.id, steps = chain.steps.len(), "executing named chain");

        let records = self.run_steps(&chain.steps, prompt, identity).await;
        let mut result = ChainRunResult::from_steps(chain.name.clone(), records);
        result.chain_id = Some(chain.id.clone());

        // Exactly once per execute call, regardless of step failures.
        self.chains.increment_execution_stats(chain_id).await?;
        Ok(result)
    }

    async fn execute_public(
        &self,
        public_id: &str,
        prompt: &str,
    ) -> Result<ChainRunResult, DomainError> {
        validate_prompt(prompt)?;

        let chain = Self::find_public_chain(public_id)?;
        info!(chain = %chain.name, id = %chain.id, "executing public chain");

        let records = self.run_steps(&chain.steps, prompt, None).await;
        let mut result = ChainRunResult::from_steps(chain.name.clone(), records);
        result.chain_id = Some(chain.id);
        result.is_public = true;
        Ok(result)
    }

    async fn run_single(
        &self,
        action: ActionKind,
        prompt: &str,
        identity: Option<&str>,
    ) -> Result<SingleRunResult, DomainError> {
        validate_prompt(prompt)?;

        let started = Instant::now();
        let outcome = self.execute_step(action, prompt, prompt).await?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        self.record_step(action, prompt, &outcome, identity).await;

        Ok(SingleRunResult {
            action,
            ai_response: outcome.ai_response,
            api_response: outcome.api_response,
            final_result: outcome.final_result,
            cached: outcome.cached,
            execution_time_ms: elapsed_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;
    use crate::infrastructure::chain::in_memory_repository::{
        InMemoryChainRepository, InMemoryRunRecordRepository,
    };
    use std::fmt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Data fetcher stub with call counting and per-action forced failure.
    #[derive(Default)]
    struct StubFetcher {
        calls: AtomicUsize,
        fail_on: Mutex<Option<ActionKind>>,
    }

    impl fmt::Debug for StubFetcher {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("StubFetcher").finish()
        }
    }

    impl StubFetcher {
        fn failing_on(action: ActionKind) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_on: Mutex::new(Some(action)),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DataFetcher for StubFetcher {
        async fn fetch(&self, action: ActionKind, _prompt: &str) -> Result<String, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *self.fail_on.lock().unwrap() == Some(action) {
                return Err(DomainError::provider(action.to_string(), "upstream 500"));
            }
            Ok(format!("{} data", action))
        }
    }

    /// Generator stub that echoes a marker and records prompts it saw.
    #[derive(Default)]
    struct StubGenerator {
        prompts: Mutex<Vec<String>>,
    }

    impl fmt::Debug for StubGenerator {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("StubGenerator").finish()
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, DomainError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("generated".to_string())
        }
    }

    struct Harness {
        executor: ChainExecutorImpl,
        fetcher: Arc<StubFetcher>,
        generator: Arc<StubGenerator>,
        chains: Arc<InMemoryChainRepository>,
        runs: Arc<InMemoryRunRecordRepository>,
    }

    fn harness_with_fetcher(fetcher: StubFetcher) -> Harness {
        let fetcher = Arc::new(fetcher);
        let generator = Arc::new(StubGenerator::default());
        let chains = Arc::new(InMemoryChainRepository::new());
        let runs = Arc::new(InMemoryRunRecordRepository::new());
        let cache = ResponseCache::new(Arc::new(MockCache::new()));

        let executor = ChainExecutorImpl::new(
            fetcher.clone(),
            generator.clone(),
            cache,
            chains.clone(),
            runs.clone(),
        );

        Harness {
            executor,
            fetcher,
            generator,
            chains,
            runs,
        }
    }

    fn harness() -> Harness {
        harness_with_fetcher(StubFetcher::default())
    }

    fn three_steps() -> Vec<ChainStep> {
        vec![
            ChainStep::new(ActionKind::Weather),
            ChainStep::new(ActionKind::Github),
            ChainStep::new(ActionKind::News),
        ]
    }

    #[tokio::test]
    async fn test_every_step_yields_a_record() {
        let h = harness();
        let result = h
            .executor
            .execute_ad_hoc(&three_steps(), "developer daily brief", None, None)
            .await
            .unwrap();

        assert_eq!(result.results.len(), 3);
        assert_eq!(result.completed_steps + result.failed_steps, 3);
        assert_eq!(result.completed_steps, 3);
        assert!(result.is_ad_hoc);
        assert_eq!(result.chain_name, "Ad-hoc Chain");
    }

    #[tokio::test]
    async fn test_step_failure_does_not_abort_chain() {
        let h = harness_with_fetcher(StubFetcher::failing_on(ActionKind::Github));
        let result = h
            .executor
            .execute_ad_hoc(&three_steps(), "developer daily brief", None, None)
            .await
            .unwrap();

        assert_eq!(result.results.len(), 3);
        assert_eq!(result.completed_steps, 2);
        assert_eq!(result.failed_steps, 1);

        assert!(result.results[0].is_success());
        assert!(result.results[1].error.is_some());
        assert!(result.results[2].is_success());

        let checks = result.summary.matches("✅ Step").count();
        let crosses = result.summary.matches("❌ Step").count();
        assert_eq!(checks, 2);
        assert_eq!(crosses, 1);
    }

    #[tokio::test]
    async fn test_final_result_ends_with_hashtag() {
        let h = harness();
        let result = h
            .executor
            .execute_ad_hoc(&three_steps(), "brief", None, None)
            .await
            .unwrap();

        for record in &result.results {
            let final_result = record.final_result.as_deref().unwrap();
            assert!(final_result.ends_with(&record.action.hashtag()));
        }
    }

    #[tokio::test]
    async fn test_repeat_run_hits_cache_and_skips_fetch() {
        let h = harness();
        let steps = vec![ChainStep::new(ActionKind::Weather)];

        let first = h
            .executor
            .execute_ad_hoc(&steps, "same prompt", None, None)
            .await
            .unwrap();
        let second = h
            .executor
            .execute_ad_hoc(&steps, "same prompt", None, None)
            .await
            .unwrap();

        assert!(!first.results[0].cached);
        assert!(second.results[0].cached);
        assert_eq!(first.results[0].api_response, second.results[0].api_response);
        assert_eq!(h.fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_keys_off_initial_prompt_not_context() {
        let h = harness();
        let steps = vec![
            ChainStep::new(ActionKind::Weather),
            ChainStep::new(ActionKind::Weather),
        ];

        let result = h
            .executor
            .execute_ad_hoc(&steps, "stable intent", None, None)
            .await
            .unwrap();

        // Both steps share the same fetch key, so the second is a hit even
        // though its generation subject grew with context.
        assert!(!result.results[0].cached);
        assert!(result.results[1].cached);
        assert_eq!(h.fetcher.call_count(), 1);
    }

    #[tokio::test]
    async fn test_context_threads_through_generation_prompts() {
        let h = harness();
        let steps = vec![
            ChainStep::new(ActionKind::Weather),
            ChainStep::new(ActionKind::News),
        ];

        h.executor
            .execute_ad_hoc(&steps, "plan my day", None, None)
            .await
            .unwrap();

        let prompts = h.generator.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("Initial prompt: plan my day"));
        // Second generation subject carries the first step's final text.
        assert!(prompts[1].contains("Step 1 (weather):"));
        assert!(prompts[1].contains("#weather"));
    }

    #[tokio::test]
    async fn test_step_override_replaces_subject() {
        let h = harness();
        let steps = vec![ChainStep::with_prompt(
            ActionKind::News,
            "summarize for executives",
        )];

        h.executor
            .execute_ad_hoc(&steps, "initial", None, None)
            .await
            .unwrap();

        let prompts = h.generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("summarize for executives Context: "));
    }

    #[tokio::test]
    async fn test_failed_step_leaves_error_line_in_context() {
        let h = harness_with_fetcher(StubFetcher::failing_on(ActionKind::Weather));
        let steps = vec![
            ChainStep::new(ActionKind::Weather),
            ChainStep::new(ActionKind::News),
        ];

        h.executor
            .execute_ad_hoc(&steps, "brief", None, None)
            .await
            .unwrap();

        let prompts = h.generator.prompts.lock().unwrap();
        // Only the news step generated; its context shows the error line.
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Step 1 (weather): Error - "));
    }

    #[tokio::test]
    async fn test_ad_hoc_validation_rejects_bad_input() {
        let h = harness();

        let err = h
            .executor
            .execute_ad_hoc(&three_steps(), "", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));

        let err = h
            .executor
            .execute_ad_hoc(&[], "prompt", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));

        let too_many = vec![ChainStep::new(ActionKind::News); 11];
        let err = h
            .executor
            .execute_ad_hoc(&too_many, "prompt", None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));

        assert_eq!(h.fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_named_execution_updates_counters_once() {
        let h = harness();
        let chain = Chain::new(
            "Mine",
            "",
            vec![ChainStep::new(ActionKind::Weather)],
            Some("user-1".to_string()),
        );
        h.chains.create(&chain).await.unwrap();

        let result = h
            .executor
            .execute_named(&chain.id, "prompt", Some("user-1"))
            .await
            .unwrap();
        assert_eq!(result.chain_name, "Mine");
        assert_eq!(result.chain_id.as_deref(), Some(chain.id.as_str()));

        let stored = h.chains.find_by_id(&chain.id).await.unwrap().unwrap();
        assert_eq!(stored.execution_count, 1);
        assert!(stored.last_executed_at.is_some());
    }

    #[tokio::test]
    async fn test_named_execution_counts_even_with_failed_steps() {
        let h = harness_with_fetcher(StubFetcher::failing_on(ActionKind::Weather));
        let chain = Chain::new(
            "Mine",
            "",
            vec![ChainStep::new(ActionKind::Weather)],
            Some("user-1".to_string()),
        );
        h.chains.create(&chain).await.unwrap();

        let result = h
            .executor
            .execute_named(&chain.id, "prompt", Some("user-1"))
            .await
            .unwrap();
        assert_eq!(result.failed_steps, 1);

        let stored = h.chains.find_by_id(&chain.id).await.unwrap().unwrap();
        assert_eq!(stored.execution_count, 1);
    }

    #[tokio::test]
    async fn test_named_execution_enforces_ownership() {
        let h = harness();
        let chain = Chain::new(
            "Mine",
            "",
            vec![ChainStep::new(ActionKind::Weather)],
            Some("user-1".to_string()),
        );
        h.chains.create(&chain).await.unwrap();

        let err = h
            .executor
            .execute_named(&chain.id, "prompt", Some("user-2"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized { .. }));

        // Anonymous callers are refused too.
        let err = h
            .executor
            .execute_named(&chain.id, "prompt", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized { .. }));

        assert_eq!(h.fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_named_execution_unknown_id_is_not_found() {
        let h = harness();
        let err = h
            .executor
            .execute_named("no-such-id", "prompt", None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_public_execution_runs_catalog_chain() {
        let h = harness();
        let result = h.executor.execute_public("public-1", "brief").await.unwrap();

        assert!(result.is_public);
        assert_eq!(result.chain_id.as_deref(), Some("public-1"));
        assert_eq!(result.chain_name, "Weather & News Update");
        assert_eq!(result.total_steps, 2);
        assert_eq!(result.results[0].action, ActionKind::Weather);
        assert_eq!(result.results[1].action, ActionKind::News);
    }

    #[tokio::test]
    async fn test_public_unknown_id_fails_before_any_provider_call() {
        let h = harness();
        let err = h
            .executor
            .execute_public("public-999", "brief")
            .await
            .unwrap_err();

        assert!(matches!(err, DomainError::NotFound { .. }));
        assert_eq!(h.fetcher.call_count(), 0);
    }

    #[tokio::test]
    async fn test_step_timeout_is_a_step_failure() {
        #[derive(Debug)]
        struct SlowFetcher;

        #[async_trait]
        impl DataFetcher for SlowFetcher {
            async fn fetch(
                &self,
                _action: ActionKind,
                _prompt: &str,
            ) -> Result<String, DomainError> {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok("too late".to_string())
            }
        }

        let executor = ChainExecutorImpl::with_config(
            Arc::new(SlowFetcher),
            Arc::new(StubGenerator::default()),
            ResponseCache::new(Arc::new(MockCache::new())),
            Arc::new(InMemoryChainRepository::new()),
            Arc::new(InMemoryRunRecordRepository::new()),
            ExecutorConfig {
                step_timeout: Duration::from_millis(50),
            },
        );

        let result = executor
            .execute_ad_hoc(&[ChainStep::new(ActionKind::News)], "prompt", None, None)
            .await
            .unwrap();

        assert_eq!(result.failed_steps, 1);
        assert!(result.results[0]
            .error
            .as_deref()
            .unwrap()
            .contains("timed out"));
    }

    #[tokio::test]
    async fn test_each_successful_step_is_recorded_for_history() {
        let h = harness();
        h.executor
            .execute_ad_hoc(&three_steps(), "brief", Some("user-1"), Some("My brief"))
            .await
            .unwrap();

        let recent = h.runs.recent(Some("user-1"), 10).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent.iter().all(|r| r.owner_id.as_deref() == Some("user-1")));
        assert!(recent
            .iter()
            .any(|r| r.final_result == "generated news data #news"));
    }

    #[tokio::test]
    async fn test_failed_steps_are_not_recorded_for_history() {
        let h = harness_with_fetcher(StubFetcher::failing_on(ActionKind::Github));
        h.executor
            .execute_ad_hoc(&three_steps(), "brief", Some("user-1"), None)
            .await
            .unwrap();

        let recent = h.runs.recent(Some("user-1"), 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert!(recent.iter().all(|r| r.action != ActionKind::Github));
    }

    #[tokio::test]
    async fn test_run_single_fetches_generates_and_combines() {
        let h = harness();
        let result = h
            .executor
            .run_single(ActionKind::Weather, "weather in Delhi", None)
            .await
            .unwrap();

        assert_eq!(result.api_response, "weather data");
        assert_eq!(result.ai_response, "generated");
        assert_eq!(result.final_result, "generated weather data #weather");
        assert!(!result.cached);

        let again = h
            .executor
            .run_single(ActionKind::Weather, "weather in Delhi", None)
            .await
            .unwrap();
        assert!(again.cached);
        assert_eq!(h.fetcher.call_count(), 1);
    }
}
