//! Host adapter: subscribes to engine notifications and republishes them
//! as tracing events.
//!
//! [`HostAdapter::sync`] subscribes to every agent and existing edge. Edges
//! are created lazily while events fire; each synced agent also gets a
//! relationship-created hook, so a new edge is subscribed before its first
//! notification.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use serde::Serialize;
use tdrs_core::{AgentNode, RelationshipEdge, SocialEngineState};
use tdrs_types::{AgentId, StatChange, TraitId};
use tracing::{debug, info};

/// Running totals of delivered notifications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NotificationCounts {
    /// Trait-added notifications.
    pub traits_added: usize,
    /// Trait-removed notifications.
    pub traits_removed: usize,
    /// Stat value-change notifications.
    pub stat_changes: usize,
}

type SharedCounts = Rc<Cell<NotificationCounts>>;
type Attached = Rc<RefCell<BTreeSet<(AgentId, Option<AgentId>)>>>;

/// Subscribes to every agent and relationship in the engine.
#[derive(Debug, Default)]
pub struct HostAdapter {
    attached: Attached,
    counts: SharedCounts,
}

impl HostAdapter {
    /// Create an adapter that has not subscribed to anything yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every agent and relationship not seen before.
    ///
    /// Returns how many holders were newly subscribed.
    pub fn sync(&mut self, state: &mut SocialEngineState) -> usize {
        let mut added = 0_usize;
        for node in state.agents_mut() {
            let owner = node.id().clone();
            for edge in node.relationships_mut() {
                let key = (owner.clone(), Some(edge.target().clone()));
                if self.attached.borrow_mut().insert(key) {
                    subscribe_relationship(edge, &self.counts);
                    added = added.saturating_add(1);
                }
            }
            if self.attached.borrow_mut().insert((owner, None)) {
                subscribe_agent(node, &self.counts, &self.attached);
                added = added.saturating_add(1);
            }
        }
        if added > 0 {
            debug!(added, total = self.attached.borrow().len(), "Host adapter subscribed");
        }
        added
    }

    /// Notifications delivered so far.
    pub fn counts(&self) -> NotificationCounts {
        self.counts.get()
    }
}

fn bump(counts: &SharedCounts, update: impl FnOnce(&mut NotificationCounts)) {
    let mut current = counts.get();
    update(&mut current);
    counts.set(current);
}

fn subscribe_agent(node: &mut AgentNode, counts: &SharedCounts, attached: &Attached) {
    let agent = node.id().clone();

    node.on_relationship_created({
        let counts = Rc::clone(counts);
        let attached = Rc::clone(attached);
        move |edge: &mut RelationshipEdge| {
            let key = (edge.owner().clone(), Some(edge.target().clone()));
            if attached.borrow_mut().insert(key) {
                subscribe_relationship(edge, &counts);
                debug!(owner = %edge.owner(), target = %edge.target(), "Host adapter subscribed new relationship");
            }
        }
    });

    node.on_trait_added({
        let agent = agent.clone();
        let counts = Rc::clone(counts);
        move |trait_id: &TraitId| {
            info!(%agent, %trait_id, "Trait added");
            bump(&counts, |c| c.traits_added = c.traits_added.saturating_add(1));
        }
    });
    node.on_trait_removed({
        let agent = agent.clone();
        let counts = Rc::clone(counts);
        move |trait_id: &TraitId| {
            info!(%agent, %trait_id, "Trait removed");
            bump(&counts, |c| c.traits_removed = c.traits_removed.saturating_add(1));
        }
    });
    let counts = Rc::clone(counts);
    node.on_stat_changed(move |change: &StatChange| {
        debug!(%agent, stat = %change.name, value = %change.value, "Stat changed");
        bump(&counts, |c| c.stat_changes = c.stat_changes.saturating_add(1));
    });
}

fn subscribe_relationship(edge: &mut RelationshipEdge, counts: &SharedCounts) {
    let owner = edge.owner().clone();
    let target = edge.target().clone();

    edge.on_trait_added({
        let (owner, target) = (owner.clone(), target.clone());
        let counts = Rc::clone(counts);
        move |trait_id: &TraitId| {
            info!(%owner, %target, %trait_id, "Relationship trait added");
            bump(&counts, |c| c.traits_added = c.traits_added.saturating_add(1));
        }
    });
    edge.on_trait_removed({
        let (owner, target) = (owner.clone(), target.clone());
        let counts = Rc::clone(counts);
        move |trait_id: &TraitId| {
            info!(%owner, %target, %trait_id, "Relationship trait removed");
            bump(&counts, |c| c.traits_removed = c.traits_removed.saturating_add(1));
        }
    });
    let counts = Rc::clone(counts);
    edge.on_stat_changed(move |change: &StatChange| {
        debug!(%owner, %target, stat = %change.name, value = %change.value, "Relationship stat changed");
        bump(&counts, |c| c.stat_changes = c.stat_changes.saturating_add(1));
    });
}
