//! A small precondition language and its evaluator.
//!
//! Each precondition string is one clause; an event's preconditions hold
//! when every clause holds. Clauses:
//!
//! ```text
//! true
//! AgentHasTrait ?role trait
//! AgentLacksTrait ?role trait
//! RelationshipHasTrait ?owner ?target trait
//! RelationshipLacksTrait ?owner ?target trait
//! AgentStatAtLeast ?role stat 10
//! AgentStatBelow ?role stat 10
//! RelationshipStatAtLeast ?owner ?target stat -5
//! RelationshipStatBelow ?owner ?target stat -5
//! ```
//!
//! A clause that mentions an unbound role, an unknown agent, a missing
//! relationship, or a missing stat does not hold. `Lacks` clauses are the
//! exception: a missing relationship lacks every trait.

use rust_decimal::Decimal;
use tdrs_core::{
    EffectBindingContext, PreconditionEvaluator, RelationshipEdge, SocialEngineState,
};
use tdrs_types::TraitId;
use tracing::{debug, warn};

use crate::error::LoaderError;
use crate::parse::{decimal, normalize_verb, role};

/// One parsed precondition clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    /// Always holds.
    True,
    /// The agent has the trait.
    AgentHasTrait {
        /// Role of the agent.
        agent: String,
        /// Trait to look for.
        trait_id: TraitId,
    },
    /// The agent does not have the trait.
    AgentLacksTrait {
        /// Role of the agent.
        agent: String,
        /// Trait to look for.
        trait_id: TraitId,
    },
    /// The `owner -> target` relationship has the trait.
    RelationshipHasTrait {
        /// Role of the relationship owner.
        owner: String,
        /// Role of the relationship target.
        target: String,
        /// Trait to look for.
        trait_id: TraitId,
    },
    /// The `owner -> target` relationship does not have the trait.
    RelationshipLacksTrait {
        /// Role of the relationship owner.
        owner: String,
        /// Role of the relationship target.
        target: String,
        /// Trait to look for.
        trait_id: TraitId,
    },
    /// An agent stat compares against a threshold.
    AgentStat {
        /// Role of the agent.
        agent: String,
        /// Stat name.
        stat: String,
        /// Comparison to apply.
        comparison: Comparison,
        /// Threshold value.
        threshold: Decimal,
    },
    /// A relationship stat compares against a threshold.
    RelationshipStat {
        /// Role of the relationship owner.
        owner: String,
        /// Role of the relationship target.
        target: String,
        /// Stat name.
        stat: String,
        /// Comparison to apply.
        comparison: Comparison,
        /// Threshold value.
        threshold: Decimal,
    },
}

/// How a stat clause compares the stat's value to its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `value >= threshold`.
    AtLeast,
    /// `value < threshold`.
    Below,
}

impl Comparison {
    fn holds(self, value: Decimal, threshold: Decimal) -> bool {
        match self {
            Self::AtLeast => value >= threshold,
            Self::Below => value < threshold,
        }
    }
}

impl Clause {
    /// Parse one clause.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Clause`] for an unknown clause, a wrong
    /// argument count, a malformed role, or an invalid threshold.
    pub fn parse(text: &str) -> Result<Self, LoaderError> {
        let invalid = |reason: String| LoaderError::Clause {
            text: text.to_owned(),
            reason,
        };

        let mut tokens = text.split_whitespace();
        let Some(head) = tokens.next() else {
            return Err(invalid(String::from("empty precondition")));
        };
        let args: Vec<&str> = tokens.collect();
        let head = normalize_verb(head);

        match (head.as_str(), args.as_slice()) {
            ("true", []) => Ok(Self::True),
            ("agenthastrait", [agent, trait_id]) => Ok(Self::AgentHasTrait {
                agent: role(agent).map_err(invalid)?,
                trait_id: TraitId::new(*trait_id),
            }),
            ("agentlackstrait", [agent, trait_id]) => Ok(Self::AgentLacksTrait {
                agent: role(agent).map_err(invalid)?,
                trait_id: TraitId::new(*trait_id),
            }),
            ("relationshiphastrait", [owner, target, trait_id]) => Ok(Self::RelationshipHasTrait {
                owner: role(owner).map_err(invalid)?,
                target: role(target).map_err(invalid)?,
                trait_id: TraitId::new(*trait_id),
            }),
            ("relationshiplackstrait", [owner, target, trait_id]) => {
                Ok(Self::RelationshipLacksTrait {
                    owner: role(owner).map_err(invalid)?,
                    target: role(target).map_err(invalid)?,
                    trait_id: TraitId::new(*trait_id),
                })
            }
            ("agentstatatleast" | "agentstatbelow", [agent, stat, threshold]) => {
                Ok(Self::AgentStat {
                    agent: role(agent).map_err(invalid)?,
                    stat: (*stat).to_owned(),
                    comparison: comparison_for(&head),
                    threshold: decimal(threshold).map_err(invalid)?,
                })
            }
            (
                "relationshipstatatleast" | "relationshipstatbelow",
                [owner, target, stat, threshold],
            ) => Ok(Self::RelationshipStat {
                owner: role(owner).map_err(invalid)?,
                target: role(target).map_err(invalid)?,
                stat: (*stat).to_owned(),
                comparison: comparison_for(&head),
                threshold: decimal(threshold).map_err(invalid)?,
            }),
            (
                "true" | "agenthastrait" | "agentlackstrait" | "relationshiphastrait"
                | "relationshiplackstrait" | "agentstatatleast" | "agentstatbelow"
                | "relationshipstatatleast" | "relationshipstatbelow",
                _,
            ) => Err(invalid(format!("wrong number of arguments ({})", args.len()))),
            _ => Err(invalid(String::from("unknown clause"))),
        }
    }

    /// Whether the clause holds for the bound context.
    pub fn holds(&self, ctx: &EffectBindingContext, state: &SocialEngineState) -> bool {
        match self {
            Self::True => true,
            Self::AgentHasTrait { agent, trait_id } => ctx
                .agent(agent)
                .and_then(|id| state.agent(id))
                .is_ok_and(|node| node.traits().has_trait(trait_id)),
            Self::AgentLacksTrait { agent, trait_id } => ctx
                .agent(agent)
                .and_then(|id| state.agent(id))
                .is_ok_and(|node| !node.traits().has_trait(trait_id)),
            Self::RelationshipHasTrait {
                owner,
                target,
                trait_id,
            } => relationship(ctx, state, owner, target)
                .is_some_and(|edge| edge.traits().has_trait(trait_id)),
            Self::RelationshipLacksTrait {
                owner,
                target,
                trait_id,
            } => {
                // Both roles must still resolve to registered agents.
                let bound = ctx
                    .agent(owner)
                    .and_then(|id| state.agent(id))
                    .and(ctx.agent(target).and_then(|id| state.agent(id)))
                    .is_ok();
                bound
                    && !relationship(ctx, state, owner, target)
                        .is_some_and(|edge| edge.traits().has_trait(trait_id))
            }
            Self::AgentStat {
                agent,
                stat,
                comparison,
                threshold,
            } => ctx
                .agent(agent)
                .and_then(|id| state.agent(id))
                .and_then(|node| node.stats().value(stat))
                .is_ok_and(|value| comparison.holds(value, *threshold)),
            Self::RelationshipStat {
                owner,
                target,
                stat,
                comparison,
                threshold,
            } => relationship(ctx, state, owner, target)
                .and_then(|edge| edge.stats().value(stat).ok())
                .is_some_and(|value| comparison.holds(value, *threshold)),
        }
    }
}

fn comparison_for(head: &str) -> Comparison {
    if head.ends_with("below") {
        Comparison::Below
    } else {
        Comparison::AtLeast
    }
}

fn relationship<'s>(
    ctx: &EffectBindingContext,
    state: &'s SocialEngineState,
    owner: &str,
    target: &str,
) -> Option<&'s RelationshipEdge> {
    let owner = ctx.agent(owner).ok()?;
    let target = ctx.agent(target).ok()?;
    state.relationship(owner, target).ok()
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

/// [`PreconditionEvaluator`] for the clause language.
///
/// Clauses are parsed on every evaluation. A clause that fails to parse
/// is logged and treated as false, so a typo can never make an event fire.
/// Use [`ClauseEvaluator::validate`] at load time to reject such content up
/// front.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClauseEvaluator;

impl ClauseEvaluator {
    /// Check that every precondition parses.
    ///
    /// # Errors
    ///
    /// Returns the [`LoaderError::Clause`] of the first invalid entry.
    pub fn validate(preconditions: &[String]) -> Result<(), LoaderError> {
        for text in preconditions {
            Clause::parse(text)?;
        }
        Ok(())
    }
}

impl PreconditionEvaluator for ClauseEvaluator {
    fn evaluate(
        &self,
        preconditions: &[String],
        ctx: &EffectBindingContext,
        state: &SocialEngineState,
    ) -> bool {
        preconditions.iter().all(|text| match Clause::parse(text) {
            Ok(clause) => {
                let holds = clause.holds(ctx, state);
                if !holds {
                    debug!(clause = %text, "Precondition failed");
                }
                holds
            }
            Err(e) => {
                warn!(error = %e, "Unparseable precondition treated as false");
                false
            }
        })
    }
}
