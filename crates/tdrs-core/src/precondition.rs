//! Precondition evaluation seam.
//!
//! The core does not define a rule language. Preconditions are authored as
//! text and handed, together with the binding context and a read-only view
//! of the engine state, to a [`PreconditionEvaluator`]. Because evaluators
//! only ever see `&SocialEngineState`, evaluating a candidate binding can
//! never mutate the graph.

use crate::binding::EffectBindingContext;
use crate::state::SocialEngineState;

/// Decides whether an event's preconditions hold for a binding.
pub trait PreconditionEvaluator {
    /// Evaluate `preconditions` against the bound context.
    ///
    /// An empty precondition list should evaluate to `true`.
    fn evaluate(
        &self,
        preconditions: &[String],
        ctx: &EffectBindingContext,
        state: &SocialEngineState,
    ) -> bool;
}

/// Evaluator that accepts every binding.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysTrue;

impl PreconditionEvaluator for AlwaysTrue {
    fn evaluate(&self, _: &[String], _: &EffectBindingContext, _: &SocialEngineState) -> bool {
        true
    }
}

impl<F> PreconditionEvaluator for F
where
    F: Fn(&[String], &EffectBindingContext, &SocialEngineState) -> bool,
{
    fn evaluate(
        &self,
        preconditions: &[String],
        ctx: &EffectBindingContext,
        state: &SocialEngineState,
    ) -> bool {
        self(preconditions, ctx, state)
    }
}
