//! Effect specs and their execution against bound participants.
//!
//! Effects name their operands by role placeholder. At execution time each
//! role is resolved through the [`EffectBindingContext`] to a concrete agent,
//! and the mutation is performed on the engine state.
//!
//! Execution policy for an effect list:
//!
//! - effects run in declared order
//! - a rejected mutation (duplicate or conflicting trait, removing a trait
//!   that is not attached, a nested event whose preconditions fail) yields
//!   [`EffectResult::Rejected`] and the remaining effects still run
//! - a lookup failure (unbound role, unknown agent, trait, or event) stops the
//!   list and propagates the error; effects that already ran stay applied

use core::fmt;

use rust_decimal::Decimal;
use tdrs_types::{EventId, TraitDuration, TraitId};

use crate::binding::EffectBindingContext;
use crate::error::EngineError;
use crate::state::SocialEngineState;

/// A single authored effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Attach a trait to an agent.
    AddAgentTrait {
        /// Role of the agent receiving the trait.
        agent: String,
        /// Trait to attach.
        trait_id: TraitId,
        /// Duration override; the trait's default when `None`.
        duration: Option<TraitDuration>,
    },
    /// Detach a trait from an agent.
    RemoveAgentTrait {
        /// Role of the agent losing the trait.
        agent: String,
        /// Trait to detach.
        trait_id: TraitId,
    },
    /// Attach a trait to the `owner -> target` relationship.
    AddRelationshipTrait {
        /// Role of the relationship owner.
        owner: String,
        /// Role of the relationship target.
        target: String,
        /// Trait to attach.
        trait_id: TraitId,
        /// Duration override; the trait's default when `None`.
        duration: Option<TraitDuration>,
    },
    /// Detach a trait from the `owner -> target` relationship.
    RemoveRelationshipTrait {
        /// Role of the relationship owner.
        owner: String,
        /// Role of the relationship target.
        target: String,
        /// Trait to detach.
        trait_id: TraitId,
    },
    /// Add `delta` to an agent stat's base value.
    AdjustAgentStat {
        /// Role of the agent.
        agent: String,
        /// Stat name.
        stat: String,
        /// Signed change.
        delta: Decimal,
    },
    /// Add `delta` to a relationship stat's base value.
    AdjustRelationshipStat {
        /// Role of the relationship owner.
        owner: String,
        /// Role of the relationship target.
        target: String,
        /// Stat name.
        stat: String,
        /// Signed change.
        delta: Decimal,
    },
    /// Fire another social event with roles taken from this context.
    TriggerEvent {
        /// Event to fire.
        event: EventId,
        /// Roles of the current context, positionally matching the nested
        /// event's roles.
        roles: Vec<String>,
    },
}

/// What happened when one effect ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectResult {
    /// The mutation was performed.
    Applied,
    /// The mutation was rejected as normal control flow.
    Rejected,
}

impl EffectResult {
    const fn from_applied(applied: bool) -> Self {
        if applied { Self::Applied } else { Self::Rejected }
    }
}

impl Effect {
    /// Execute this effect against the engine state.
    pub fn apply(
        &self,
        ctx: &EffectBindingContext,
        state: &mut SocialEngineState,
    ) -> Result<EffectResult, EngineError> {
        self.apply_at_depth(ctx, state, 0)
    }

    pub(crate) fn apply_at_depth(
        &self,
        ctx: &EffectBindingContext,
        state: &mut SocialEngineState,
        depth: usize,
    ) -> Result<EffectResult, EngineError> {
        let applied = match self {
            Self::AddAgentTrait {
                agent,
                trait_id,
                duration,
            } => {
                let agent = ctx.agent(agent)?;
                state.add_agent_trait_at_depth(agent, trait_id, *duration, depth)?
            }
            Self::RemoveAgentTrait { agent, trait_id } => {
                let agent = ctx.agent(agent)?;
                state.remove_agent_trait_at_depth(agent, trait_id, depth)?
            }
            Self::AddRelationshipTrait {
                owner,
                target,
                trait_id,
                duration,
            } => {
                let owner = ctx.agent(owner)?;
                let target = ctx.agent(target)?;
                state.add_relationship_trait_at_depth(owner, target, trait_id, *duration, depth)?
            }
            Self::RemoveRelationshipTrait {
                owner,
                target,
                trait_id,
            } => {
                let owner = ctx.agent(owner)?;
                let target = ctx.agent(target)?;
                state.remove_relationship_trait_at_depth(owner, target, trait_id, depth)?
            }
            Self::AdjustAgentStat { agent, stat, delta } => {
                let agent = ctx.agent(agent)?;
                state.agent_mut(agent)?.stats_mut().adjust_base(stat, *delta);
                true
            }
            Self::AdjustRelationshipStat {
                owner,
                target,
                stat,
                delta,
            } => {
                let owner = ctx.agent(owner)?;
                let target = ctx.agent(target)?;
                state
                    .get_or_create_relationship(owner, target)?
                    .stats_mut()
                    .adjust_base(stat, *delta);
                true
            }
            Self::TriggerEvent { event, roles } => {
                let agents = roles
                    .iter()
                    .map(|role| ctx.agent(role).cloned())
                    .collect::<Result<Vec<_>, _>>()?;
                state
                    .fire_event_at_depth(event, &agents, depth.saturating_add(1))?
                    .is_fired()
            }
        };
        Ok(EffectResult::from_applied(applied))
    }
}

/// Renders the effect in its authored text form.
impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AddAgentTrait {
                agent,
                trait_id,
                duration,
            } => {
                write!(f, "AddAgentTrait {agent} {trait_id}")?;
                write_duration(f, *duration)
            }
            Self::RemoveAgentTrait { agent, trait_id } => {
                write!(f, "RemoveAgentTrait {agent} {trait_id}")
            }
            Self::AddRelationshipTrait {
                owner,
                target,
                trait_id,
                duration,
            } => {
                write!(f, "AddRelationshipTrait {owner} {target} {trait_id}")?;
                write_duration(f, *duration)
            }
            Self::RemoveRelationshipTrait {
                owner,
                target,
                trait_id,
            } => write!(f, "RemoveRelationshipTrait {owner} {target} {trait_id}"),
            Self::AdjustAgentStat { agent, stat, delta } => {
                write!(f, "AdjustAgentStat {agent} {stat} {delta}")
            }
            Self::AdjustRelationshipStat {
                owner,
                target,
                stat,
                delta,
            } => write!(f, "AdjustRelationshipStat {owner} {target} {stat} {delta}"),
            Self::TriggerEvent { event, roles } => {
                write!(f, "TriggerEvent {event}")?;
                for role in roles {
                    write!(f, " {role}")?;
                }
                Ok(())
            }
        }
    }
}

fn write_duration(f: &mut fmt::Formatter<'_>, duration: Option<TraitDuration>) -> fmt::Result {
    match duration {
        Some(TraitDuration::Ticks(n)) => write!(f, " {n}"),
        Some(TraitDuration::Unlimited) => write!(f, " -1"),
        None => Ok(()),
    }
}
