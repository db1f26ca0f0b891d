//! Directed relationship edges between agents.
//!
//! A [`RelationshipEdge`] is owned by the owning agent's edge map and is
//! addressed by its ordered `(owner, target)` pair. It carries its own
//! traits and relationship-scoped stats (for example "affinity"), entirely
//! independent of the reverse edge.

use std::sync::Arc;

use tdrs_types::{AgentId, StatChange, StatSchemaEntry, TraitDuration, TraitId};

use crate::stat::StatCollection;
use crate::traits::{Trait, TraitManager};

/// A directed edge `owner -> target` in the social graph.
#[derive(Debug)]
pub struct RelationshipEdge {
    owner: AgentId,
    target: AgentId,
    traits: TraitManager,
    stats: StatCollection,
}

impl RelationshipEdge {
    /// Create an edge with no traits and stats seeded from `schema`.
    ///
    /// Does not check that the agents exist or differ; the engine state
    /// validates identities before creating edges.
    pub fn new(owner: AgentId, target: AgentId, schema: &[StatSchemaEntry]) -> Self {
        Self {
            owner,
            target,
            traits: TraitManager::new(),
            stats: StatCollection::from_schema(schema),
        }
    }

    /// The agent holding this relationship.
    pub const fn owner(&self) -> &AgentId {
        &self.owner
    }

    /// The agent this relationship points at.
    pub const fn target(&self) -> &AgentId {
        &self.target
    }

    /// Traits attached to the relationship.
    pub const fn traits(&self) -> &TraitManager {
        &self.traits
    }

    /// Relationship-scoped stats.
    pub const fn stats(&self) -> &StatCollection {
        &self.stats
    }

    /// Mutable access to the stats (base values and subscriptions).
    pub const fn stats_mut(&mut self) -> &mut StatCollection {
        &mut self.stats
    }

    /// Attach a trait and apply its stat modifiers.
    ///
    /// Returns `false` if the trait manager rejected it.
    pub fn add_trait(&mut self, definition: &Arc<Trait>, duration: TraitDuration) -> bool {
        if !self.traits.add_trait(Arc::clone(definition), duration) {
            return false;
        }
        self.stats
            .add_modifiers_from(&definition.id, &definition.modifiers);
        true
    }

    /// Detach a trait and withdraw its stat modifiers.
    pub fn remove_trait(&mut self, trait_id: &TraitId) -> bool {
        if !self.traits.remove_trait(trait_id) {
            return false;
        }
        self.stats.remove_modifiers_from(trait_id);
        true
    }

    /// Advance trait durations one tick; returns the expired definitions.
    pub fn tick(&mut self) -> Vec<Arc<Trait>> {
        let expired = self.traits.tick();
        for definition in &expired {
            self.stats.remove_modifiers_from(&definition.id);
        }
        expired
    }

    /// Subscribe to trait additions on this edge.
    pub fn on_trait_added(&mut self, callback: impl FnMut(&TraitId) + 'static) {
        self.traits.on_trait_added(callback);
    }

    /// Subscribe to trait removals on this edge.
    pub fn on_trait_removed(&mut self, callback: impl FnMut(&TraitId) + 'static) {
        self.traits.on_trait_removed(callback);
    }

    /// Subscribe to changes of any stat on this edge.
    pub fn on_stat_changed(&mut self, callback: impl FnMut(&StatChange) + 'static) {
        self.stats.subscribe(callback);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use tdrs_types::StatModifier;

    use super::*;

    fn edge() -> RelationshipEdge {
        RelationshipEdge::new(
            AgentId::new("alice"),
            AgentId::new("bob"),
            &[StatSchemaEntry::new("affinity", dec!(0))],
        )
    }

    #[test]
    fn new_edge_has_identity_and_schema_stats() {
        let edge = edge();
        assert_eq!(edge.owner().as_str(), "alice");
        assert_eq!(edge.target().as_str(), "bob");
        assert!(edge.traits().is_empty());
        assert_eq!(edge.stats().value("affinity").unwrap(), dec!(0));
    }

    #[test]
    fn trait_modifiers_follow_trait_membership() {
        let mut edge = edge();
        let friends = Arc::new(
            Trait::new("friends").with_modifier(StatModifier::additive("affinity", dec!(20))),
        );

        assert!(edge.add_trait(&friends, TraitDuration::Ticks(1)));
        assert_eq!(edge.stats().value("affinity").unwrap(), dec!(20));
        assert!(!edge.add_trait(&friends, TraitDuration::Unlimited));
        assert_eq!(edge.stats().value("affinity").unwrap(), dec!(20));

        let expired = edge.tick();
        assert_eq!(expired.len(), 1);
        assert_eq!(edge.stats().value("affinity").unwrap(), dec!(0));
        assert!(!edge.remove_trait(&TraitId::new("friends")));
    }
}
