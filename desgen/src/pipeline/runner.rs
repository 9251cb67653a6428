//! The design pipeline orchestrator.

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use super::state::PipelineState;
use crate::context::{DesignContext, RunIdentity};
use crate::errors::DesgenError;
use crate::events::{
    EventSink, NoOpEventSink, PIPELINE_COMPLETED, PIPELINE_FAILED, PIPELINE_STARTED,
    STAGE_COMPLETED, STAGE_FAILED, STAGE_STARTED,
};
use crate::llm::ResilientInvoker;
use crate::observability::{SpanTimer, StageSpanAttributes};
use crate::stages::{run_stage, StageKind};

/// Entry point shared by the front doors.
#[async_trait]
pub trait PipelineRunner: Send + Sync {
    /// Runs all four stages for `prompt` under `identity` and returns the
    /// full context.
    async fn run_pipeline(
        &self,
        prompt: &str,
        identity: RunIdentity,
    ) -> Result<DesignContext, DesgenError>;
}

/// Runs Strategy, Experience, Presentation and Implementation in order,
/// threading one [`DesignContext`] through them.
#[derive(Clone)]
pub struct DesignPipeline {
    invoker: ResilientInvoker,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for DesignPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesignPipeline")
            .field("invoker", &self.invoker)
            .finish_non_exhaustive()
    }
}

impl DesignPipeline {
    /// Creates a pipeline over a shared invoker.
    #[must_use]
    pub fn new(invoker: ResilientInvoker) -> Self {
        Self {
            invoker,
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Builds the OpenAI-backed pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns `DesgenError::Configuration` when the credential is missing or
    /// a timing setting is invalid. No network call is made.
    #[cfg(feature = "openai")]
    pub fn from_config(config: &crate::config::DesgenConfig) -> Result<Self, DesgenError> {
        config.validate()?;
        let provider = crate::llm::OpenAiProvider::from_config(config)?;
        let invoker = ResilientInvoker::new(Arc::new(provider), config)?;
        Ok(Self::new(invoker))
    }

    /// Sets the sink receiving lifecycle events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Returns the invoker.
    #[must_use]
    pub fn invoker(&self) -> &ResilientInvoker {
        &self.invoker
    }

    /// Runs the pipeline for `prompt` under a fresh run identity.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure unchanged. No partial context is
    /// returned.
    pub async fn handle(&self, prompt: &str) -> Result<DesignContext, DesgenError> {
        self.handle_with_identity(prompt, RunIdentity::new()).await
    }

    /// Runs the pipeline for `prompt` under the given identity.
    ///
    /// # Errors
    ///
    /// See [`DesignPipeline::handle`].
    pub async fn handle_with_identity(
        &self,
        prompt: &str,
        identity: RunIdentity,
    ) -> Result<DesignContext, DesgenError> {
        let timer = SpanTimer::start();
        self.sink
            .emit(PIPELINE_STARTED, Some(json!(identity.to_dict())))
            .await;
        tracing::info!(run_id = %identity.run_id, "Design pipeline started");

        match self.execute(prompt, &identity).await {
            Ok(context) => {
                let duration_ms = timer.finish();
                tracing::info!(run_id = %identity.run_id, duration_ms, "Design pipeline completed");
                self.sink
                    .emit(
                        PIPELINE_COMPLETED,
                        Some(json!({
                            "run_id": identity.run_id.to_string(),
                            "duration_ms": duration_ms,
                            "keys": context.keys(),
                        })),
                    )
                    .await;
                Ok(context)
            }
            Err(err) => {
                let duration_ms = timer.finish();
                tracing::error!(
                    run_id = %identity.run_id,
                    code = err.code(),
                    error = %err,
                    "Design pipeline failed"
                );
                self.sink
                    .emit(
                        PIPELINE_FAILED,
                        Some(json!({
                            "run_id": identity.run_id.to_string(),
                            "duration_ms": duration_ms,
                            "code": err.code(),
                            "error": err.to_string(),
                        })),
                    )
                    .await;
                Err(err)
            }
        }
    }

    async fn execute(
        &self,
        prompt: &str,
        identity: &RunIdentity,
    ) -> Result<DesignContext, DesgenError> {
        let mut context = DesignContext::seeded(prompt);
        let mut state = PipelineState::Start;

        while let Some(kind) = state.pending_stage() {
            let partial = match self.run_observed(kind, &context, identity).await {
                Ok(partial) => partial,
                Err(err) => {
                    tracing::debug!(
                        run_id = %identity.run_id,
                        from = %state,
                        to = %PipelineState::Aborted,
                        "Pipeline transition"
                    );
                    return Err(err);
                }
            };
            context.merge(partial)?;

            let next = state.next();
            tracing::debug!(run_id = %identity.run_id, from = %state, to = %next, "Pipeline transition");
            state = next;
        }

        Ok(context)
    }

    async fn run_observed(
        &self,
        kind: StageKind,
        context: &DesignContext,
        identity: &RunIdentity,
    ) -> Result<DesignContext, DesgenError> {
        let attrs = StageSpanAttributes::new(kind.as_str())
            .with_role(kind.label())
            .with_output_key(kind.output_key());
        self.sink
            .emit(STAGE_STARTED, Some(attrs.clone().with_status("started").to_event_data()))
            .await;

        let timer = SpanTimer::start();
        let result = run_stage(kind, context, &self.invoker).await;
        let duration_ms = timer.finish();

        match &result {
            Ok(_) => {
                tracing::info!(run_id = %identity.run_id, stage = %kind, duration_ms, "Stage completed");
                let data = attrs
                    .with_status("completed")
                    .with_duration_ms(duration_ms)
                    .to_event_data();
                self.sink.emit(STAGE_COMPLETED, Some(data)).await;
            }
            Err(err) => {
                tracing::warn!(
                    run_id = %identity.run_id,
                    stage = %kind,
                    code = err.code(),
                    "Stage failed"
                );
                let data = attrs
                    .with_status("failed")
                    .with_duration_ms(duration_ms)
                    .with_error_code(err.code())
                    .to_event_data();
                self.sink.emit(STAGE_FAILED, Some(data)).await;
            }
        }

        result
    }
}

#[async_trait]
impl PipelineRunner for DesignPipeline {
    async fn run_pipeline(
        &self,
        prompt: &str,
        identity: RunIdentity,
    ) -> Result<DesignContext, DesgenError> {
        self.handle_with_identity(prompt, identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DesgenConfig;
    use crate::context::{CODE_PLAN, PRODUCT_PLAN, PROMPT, UX_DESIGN, VISUAL_DESIGN};
    use crate::errors::ProviderError;
    use crate::events::CollectingEventSink;
    use crate::llm::compose_prompt;
    use crate::testing::{
        assert_complete_context, assert_context_has, assert_error_code, RecordingSleeper,
        ScriptedProvider,
    };
    use pretty_assertions::assert_eq;

    fn pipeline(provider: Arc<ScriptedProvider>) -> DesignPipeline {
        let invoker = ResilientInvoker::new(provider, &DesgenConfig::new())
            .unwrap()
            .with_sleeper(Arc::new(RecordingSleeper::new()));
        DesignPipeline::new(invoker)
    }

    fn four_replies() -> ScriptedProvider {
        ScriptedProvider::new()
            .then_text("PLAN")
            .then_text("UX")
            .then_text("VISUAL")
            .then_text("CODE")
    }

    #[tokio::test]
    async fn test_full_run_returns_five_keys_in_order() {
        let provider = Arc::new(four_replies());
        let context = pipeline(provider.clone()).handle("a habit tracker").await.unwrap();

        assert_complete_context(&context);
        assert_context_has(&context, PROMPT, "a habit tracker");
        assert_context_has(&context, PRODUCT_PLAN, "PLAN");
        assert_context_has(&context, UX_DESIGN, "UX");
        assert_context_has(&context, VISUAL_DESIGN, "VISUAL");
        assert_context_has(&context, CODE_PLAN, "CODE");
        assert_eq!(provider.call_count(), 4);
    }

    #[tokio::test]
    async fn test_each_stage_reads_previous_output() {
        let provider = Arc::new(four_replies());
        pipeline(provider.clone()).handle("idea").await.unwrap();

        let users: Vec<String> = provider
            .prompts()
            .iter()
            .map(|p| p.rsplit_once("USER:\n").unwrap().1.trim_end().to_string())
            .collect();
        assert_eq!(users, vec!["idea", "PLAN", "UX", "VISUAL"]);
        assert_eq!(
            provider.prompts()[1],
            compose_prompt(StageKind::Experience.definition().instruction, "PLAN")
        );
    }

    #[tokio::test]
    async fn test_provider_failure_aborts_without_partial_result() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .then_text("PLAN")
                .then_error(ProviderError::with_status(500, "upstream down"))
                .then_text("never"),
        );
        let err = pipeline(provider.clone()).handle("idea").await.unwrap_err();

        assert_error_code(&err, "PROVIDER");
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.remaining(), 1);
    }

    #[tokio::test]
    async fn test_empty_plan_aborts_at_experience() {
        let provider = Arc::new(ScriptedProvider::new().then_text("").then_text("never"));
        let err = pipeline(provider.clone()).handle("idea").await.unwrap_err();

        assert_error_code(&err, "MISSING_INPUT");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_prompt_is_missing_input() {
        let provider = Arc::new(four_replies());
        let err = pipeline(provider.clone()).handle("").await.unwrap_err();

        assert_error_code(&err, "MISSING_INPUT");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let sink = Arc::new(CollectingEventSink::new());
        let pipeline = pipeline(Arc::new(four_replies())).with_event_sink(sink.clone());

        pipeline.handle("idea").await.unwrap();

        let types = sink.event_types();
        assert_eq!(types.first().map(String::as_str), Some(PIPELINE_STARTED));
        assert_eq!(types.last().map(String::as_str), Some(PIPELINE_COMPLETED));
        assert_eq!(sink.payloads(STAGE_STARTED).len(), 4);

        let completed = sink.payloads(STAGE_COMPLETED);
        assert_eq!(completed.len(), 4);
        assert_eq!(completed[0]["stage_name"], "strategy");
        assert!(completed[0]["duration_ms"].is_number());
    }

    #[tokio::test]
    async fn test_failure_events() {
        let sink = Arc::new(CollectingEventSink::new());
        let provider = Arc::new(
            ScriptedProvider::new().then_error(ProviderError::with_status(401, "bad key")),
        );
        let pipeline = pipeline(provider).with_event_sink(sink.clone());

        assert!(pipeline.handle("idea").await.is_err());

        assert_eq!(
            sink.event_types(),
            vec![PIPELINE_STARTED, STAGE_STARTED, STAGE_FAILED, PIPELINE_FAILED]
        );
        let failed = sink.payloads(PIPELINE_FAILED);
        assert_eq!(failed[0]["code"], "PROVIDER");
    }

    #[tokio::test]
    async fn test_runner_trait_carries_request_identity() {
        let sink = Arc::new(CollectingEventSink::new());
        let runner: Arc<dyn PipelineRunner> =
            Arc::new(pipeline(Arc::new(four_replies())).with_event_sink(sink.clone()));
        let identity = RunIdentity::for_request();
        let request_id = identity.request_id.unwrap().to_string();

        let context = runner.run_pipeline("idea", identity).await.unwrap();

        assert_eq!(context.len(), 5);
        assert_eq!(sink.payloads(PIPELINE_STARTED)[0]["request_id"], request_id);
    }

    #[cfg(feature = "openai")]
    #[test]
    fn test_from_config_requires_credential() {
        let err = DesignPipeline::from_config(&DesgenConfig::new()).unwrap_err();
        assert_error_code(&err, "CONFIGURATION");
    }
}
