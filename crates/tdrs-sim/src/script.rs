//! Plays a scripted list of event firings and ticks against the engine.

use serde::Serialize;
use tdrs_core::{EffectResult, EngineError, EventOutcome, SocialEngineState};
use tdrs_types::{AgentId, EventId};
use tracing::{info, warn};

use crate::config::ScriptStep;

/// What a scripted run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Script steps executed.
    pub steps: usize,
    /// Events whose preconditions held.
    pub fired: usize,
    /// Events whose preconditions failed.
    pub preconditions_failed: usize,
    /// Effects that were rejected, across all firings.
    pub rejected_effects: usize,
    /// Ticks advanced.
    pub ticks: u64,
    /// Traits that expired.
    pub expirations: usize,
    /// Expired traits whose detach effects failed.
    pub failed_detach_effects: usize,
}

/// Play `steps` in order.
///
/// # Errors
///
/// Stops at the first event firing that fails with an [`EngineError`].
/// Detach effects that fail during a tick are logged and counted instead.
pub fn run_script(
    state: &mut SocialEngineState,
    steps: &[ScriptStep],
) -> Result<RunSummary, EngineError> {
    let mut summary = RunSummary::default();
    for (index, step) in steps.iter().enumerate() {
        match step {
            ScriptStep::Fire { event, agents } => fire(state, index, event, agents, &mut summary)?,
            ScriptStep::Tick => tick(state, &mut summary),
            ScriptStep::Ticks(count) => {
                for _ in 0..*count {
                    tick(state, &mut summary);
                }
            }
        }
        summary.steps = summary.steps.saturating_add(1);
    }
    info!(
        steps = summary.steps,
        fired = summary.fired,
        preconditions_failed = summary.preconditions_failed,
        ticks = summary.ticks,
        "Script finished"
    );
    Ok(summary)
}

fn fire(
    state: &mut SocialEngineState,
    step: usize,
    event: &str,
    agents: &[String],
    summary: &mut RunSummary,
) -> Result<(), EngineError> {
    let agents: Vec<AgentId> = agents.iter().map(|a| AgentId::new(a.as_str())).collect();
    match state.fire_event(&EventId::new(event), &agents)? {
        EventOutcome::Fired(fired) => {
            let rejected = fired
                .effect_results
                .iter()
                .chain(fired.responses.iter().flat_map(|r| r.effect_results.iter()))
                .filter(|result| **result == EffectResult::Rejected)
                .count();
            info!(
                step,
                event,
                description = fired.description(),
                rejected,
                responses = fired.responses.len(),
                "Event fired"
            );
            for response in &fired.responses {
                if let Some(description) = &response.description {
                    info!(step, event, response = response.index, description = %description, "Response");
                }
            }
            summary.fired = summary.fired.saturating_add(1);
            summary.rejected_effects = summary.rejected_effects.saturating_add(rejected);
        }
        EventOutcome::PreconditionsFailed => {
            info!(step, event, ?agents, "Event did not fire");
            summary.preconditions_failed = summary.preconditions_failed.saturating_add(1);
        }
    }
    Ok(())
}

fn tick(state: &mut SocialEngineState, summary: &mut RunSummary) {
    let expired = state.tick();
    summary.ticks = summary.ticks.saturating_add(1);
    for expiration in &expired {
        info!(
            tick = summary.ticks,
            owner = %expiration.owner,
            target = ?expiration.target,
            trait_id = %expiration.definition.id,
            "Trait expired"
        );
        if let Some(error) = &expiration.detach_error {
            warn!(tick = summary.ticks, trait_id = %expiration.definition.id, %error, "Detach effects failed");
            summary.failed_detach_effects = summary.failed_detach_effects.saturating_add(1);
        }
    }
    summary.expirations = summary.expirations.saturating_add(expired.len());
}
