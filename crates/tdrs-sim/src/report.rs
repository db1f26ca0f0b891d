//! End-of-run report: a serializable view of the social graph.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use tdrs_core::{SocialEngineState, StatCollection, TraitManager};
use tdrs_types::{AgentId, TraitId};

use crate::adapter::NotificationCounts;
use crate::script::RunSummary;

/// Everything printed when a run finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// What the script did.
    pub summary: RunSummary,
    /// Notifications the host adapter received.
    pub notifications: NotificationCounts,
    /// Final state of every agent, in ID order.
    pub agents: Vec<AgentReport>,
}

/// Final state of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentReport {
    /// Agent ID.
    pub id: AgentId,
    /// Attached traits.
    pub traits: Vec<TraitId>,
    /// Computed stat values.
    pub stats: BTreeMap<String, Decimal>,
    /// Outgoing relationships, in target order.
    pub relationships: Vec<RelationshipReport>,
}

/// Final state of one relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipReport {
    /// The agent the relationship points at.
    pub target: AgentId,
    /// Attached traits.
    pub traits: Vec<TraitId>,
    /// Computed stat values.
    pub stats: BTreeMap<String, Decimal>,
}

impl Report {
    /// Capture the engine's current graph.
    pub fn capture(
        state: &SocialEngineState,
        summary: RunSummary,
        notifications: NotificationCounts,
    ) -> Self {
        let agents = state
            .agents()
            .map(|node| AgentReport {
                id: node.id().clone(),
                traits: trait_ids(node.traits()),
                stats: stat_values(node.stats()),
                relationships: node
                    .relationships()
                    .map(|edge| RelationshipReport {
                        target: edge.target().clone(),
                        traits: trait_ids(edge.traits()),
                        stats: stat_values(edge.stats()),
                    })
                    .collect(),
            })
            .collect();
        Self {
            summary,
            notifications,
            agents,
        }
    }
}

fn trait_ids(traits: &TraitManager) -> Vec<TraitId> {
    traits.trait_ids().cloned().collect()
}

fn stat_values(stats: &StatCollection) -> BTreeMap<String, Decimal> {
    stats
        .iter()
        .map(|stat| (stat.name().to_owned(), stat.value()))
        .collect()
}
