//! Design stages.
//!
//! Every stage is a [`StageDefinition`] record executed by [`run_stage`]:
//! select the input from the context, send the role instruction and the input
//! through the invoker, and return the result under the stage's output key.

mod definition;

pub use definition::{InputRule, StageDefinition, StageKind};

use crate::context::DesignContext;
use crate::errors::DesgenError;
use crate::llm::ResilientInvoker;

/// Runs one stage against the context.
///
/// Returns a one-key partial context holding the stage's output. The context
/// itself is not modified.
///
/// # Errors
///
/// Returns `DesgenError::MissingInput` before any provider call when the
/// stage's input is unavailable, or the invoker's error if the call fails.
pub async fn run_stage(
    kind: StageKind,
    context: &DesignContext,
    invoker: &ResilientInvoker,
) -> Result<DesignContext, DesgenError> {
    let definition = kind.definition();
    let input = definition.input.select(definition.label, context)?;

    tracing::debug!(
        stage = %kind,
        role = definition.label,
        input_chars = input.len(),
        "Running stage"
    );

    let reply = invoker.invoke(definition.instruction, input).await?;

    let mut partial = DesignContext::new();
    partial.insert(definition.output_key, reply)?;
    Ok(partial)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DesgenConfig;
    use crate::context::{CODE_PLAN, PRODUCT_PLAN, PROMPT, UX_DESIGN, VISUAL_DESIGN};
    use crate::llm::compose_prompt;
    use crate::testing::{RecordingSleeper, ScriptedProvider};
    use std::sync::Arc;

    fn invoker(provider: Arc<ScriptedProvider>) -> ResilientInvoker {
        ResilientInvoker::new(provider, &DesgenConfig::new())
            .unwrap()
            .with_sleeper(Arc::new(RecordingSleeper::new()))
    }

    #[tokio::test]
    async fn test_strategy_reads_prompt() {
        let provider = Arc::new(ScriptedProvider::new().then_text("goals"));
        let ctx = DesignContext::seeded("a plant watering app");

        let partial = run_stage(StageKind::Strategy, &ctx, &invoker(provider.clone()))
            .await
            .unwrap();

        assert_eq!(partial.keys(), vec![PRODUCT_PLAN]);
        assert_eq!(partial.get(PRODUCT_PLAN), Some("goals"));
        assert_eq!(
            provider.prompts(),
            vec![compose_prompt(
                StageKind::Strategy.definition().instruction,
                "a plant watering app"
            )]
        );
    }

    #[tokio::test]
    async fn test_run_does_not_modify_context() {
        let provider = Arc::new(ScriptedProvider::new().then_text("flows"));
        let ctx: DesignContext = [(PROMPT, "idea"), (PRODUCT_PLAN, "plan")].into_iter().collect();

        let partial = run_stage(StageKind::Experience, &ctx, &invoker(provider))
            .await
            .unwrap();

        assert_eq!(ctx.len(), 2);
        assert_eq!(partial.get(UX_DESIGN), Some("flows"));
    }

    #[tokio::test]
    async fn test_missing_input_skips_provider() {
        let provider = Arc::new(ScriptedProvider::new().then_text("unused"));
        let ctx = DesignContext::seeded("idea");

        let err = run_stage(StageKind::Presentation, &ctx, &invoker(provider.clone()))
            .await
            .unwrap_err();

        assert!(matches!(err, DesgenError::MissingInput(ref e) if e.stage == "Visual Designer"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_implementation_uses_fallback_input() {
        let provider = Arc::new(ScriptedProvider::new().then_text("components"));
        let ctx: DesignContext = [(UX_DESIGN, ""), (VISUAL_DESIGN, ""), (PRODUCT_PLAN, "P")]
            .into_iter()
            .collect();

        let partial = run_stage(StageKind::Implementation, &ctx, &invoker(provider.clone()))
            .await
            .unwrap();

        assert_eq!(partial.get(CODE_PLAN), Some("components"));
        assert!(provider.prompts()[0].ends_with("USER:\nP\n"));
    }
}
