//! Agent nodes: vertices of the social graph.
//!
//! An [`AgentNode`] owns its trait manager, its stats, and its outgoing
//! relationship edges keyed by target ID. It performs no graph-wide
//! validation; only the engine state knows the full vertex set.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::sync::Arc;

use tdrs_types::{AgentId, StatChange, StatSchemaEntry, TraitDuration, TraitId};
use tracing::debug;

use crate::notify::Hooks;
use crate::relationship::RelationshipEdge;
use crate::stat::StatCollection;
use crate::traits::{Trait, TraitManager};

/// One participant in the social simulation.
#[derive(Debug)]
pub struct AgentNode {
    id: AgentId,
    traits: TraitManager,
    stats: StatCollection,
    /// Outgoing edges keyed by target agent ID.
    relationships: BTreeMap<AgentId, RelationshipEdge>,
    relationship_created: Hooks<RelationshipEdge>,
}

impl AgentNode {
    /// Create an agent with no traits or relationships and stats seeded
    /// from `schema`.
    pub fn new(id: AgentId, schema: &[StatSchemaEntry]) -> Self {
        Self {
            id,
            traits: TraitManager::new(),
            stats: StatCollection::from_schema(schema),
            relationships: BTreeMap::new(),
            relationship_created: Hooks::new(),
        }
    }

    /// The agent's unique identifier.
    pub const fn id(&self) -> &AgentId {
        &self.id
    }

    /// Traits attached to the agent.
    pub const fn traits(&self) -> &TraitManager {
        &self.traits
    }

    /// The agent's stats.
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

    /// Advance the agent's own trait durations one tick.
    ///
    /// Relationship edges are ticked separately. Returns the expired
    /// definitions.
    pub fn tick(&mut self) -> Vec<Arc<Trait>> {
        let expired = self.traits.tick();
        for definition in &expired {
            self.stats.remove_modifiers_from(&definition.id);
        }
        expired
    }

    /// Return the edge to `target`, creating it with stats from `schema` on
    /// first reference.
    ///
    /// A newly created edge is passed to every relationship-created hook
    /// before it is returned.
    pub fn get_or_create_relationship(
        &mut self,
        target: &AgentId,
        schema: &[StatSchemaEntry],
    ) -> &mut RelationshipEdge {
        match self.relationships.entry(target.clone()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                debug!(owner = %self.id, %target, "creating relationship");
                let edge =
                    entry.insert(RelationshipEdge::new(self.id.clone(), target.clone(), schema));
                self.relationship_created.run(edge);
                edge
            }
        }
    }

    /// The edge to `target`, if one exists.
    pub fn relationship(&self, target: &AgentId) -> Option<&RelationshipEdge> {
        self.relationships.get(target)
    }

    /// Mutable access to the edge to `target`, if one exists.
    pub fn relationship_mut(&mut self, target: &AgentId) -> Option<&mut RelationshipEdge> {
        self.relationships.get_mut(target)
    }

    /// All outgoing edges in target order.
    pub fn relationships(&self) -> impl Iterator<Item = &RelationshipEdge> {
        self.relationships.values()
    }

    /// Mutable iteration over all outgoing edges.
    pub fn relationships_mut(&mut self) -> impl Iterator<Item = &mut RelationshipEdge> {
        self.relationships.values_mut()
    }

    /// Subscribe to trait additions on this agent.
    pub fn on_trait_added(&mut self, callback: impl FnMut(&TraitId) + 'static) {
        self.traits.on_trait_added(callback);
    }

    /// Subscribe to trait removals on this agent.
    pub fn on_trait_removed(&mut self, callback: impl FnMut(&TraitId) + 'static) {
        self.traits.on_trait_removed(callback);
    }

    /// Subscribe to changes of any stat on this agent.
    pub fn on_stat_changed(&mut self, callback: impl FnMut(&StatChange) + 'static) {
        self.stats.subscribe(callback);
    }

    /// Run `callback` on every outgoing edge created from now on.
    pub fn on_relationship_created(
        &mut self,
        callback: impl FnMut(&mut RelationshipEdge) + 'static,
    ) {
        self.relationship_created.subscribe(callback);
    }
}
