//! Trait definitions and the per-entity trait manager.
//!
//! A [`Trait`] is an immutable definition shared by every holder through an
//! [`Arc`]. The per-holder state (remaining duration) lives on an
//! [`ActiveTrait`] inside the holder's [`TraitManager`].
//!
//! The manager guarantees that no two active traits conflict. Conflict
//! declarations in authored data are not necessarily symmetric, so an add is
//! rejected when either side declares the other, and the derived conflict set
//! is rebuilt from the remaining traits after every removal.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tdrs_types::{StatModifier, TraitDuration, TraitId};
use tracing::debug;

use crate::effect::Effect;
use crate::error::EngineError;
use crate::notify::Subscribers;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// An authored trait definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trait {
    /// Unique identifier.
    pub id: TraitId,
    /// Human-readable name.
    pub display_name: String,
    /// Description template; placeholders are filled from the holder when
    /// the attach/detach effects run (`[owner]`, and `[target]` on edges).
    pub description: String,
    /// Traits that may not be held together with this one.
    pub conflicts: BTreeSet<TraitId>,
    /// Stat modifiers active while the trait is attached.
    pub modifiers: Vec<StatModifier>,
    /// Duration used when the caller does not supply one.
    pub duration: TraitDuration,
    /// Effects executed after the trait is attached.
    pub on_add: Vec<Effect>,
    /// Effects executed after the trait is detached.
    pub on_remove: Vec<Effect>,
}

impl Trait {
    /// Create a trait with no conflicts, modifiers, or effects.
    pub fn new(id: impl Into<TraitId>) -> Self {
        let id = id.into();
        Self {
            display_name: String::from(id.as_str()),
            id,
            description: String::new(),
            conflicts: BTreeSet::new(),
            modifiers: Vec::new(),
            duration: TraitDuration::Unlimited,
            on_add: Vec::new(),
            on_remove: Vec::new(),
        }
    }

    /// Declare conflicting traits.
    #[must_use]
    pub fn with_conflicts<I, T>(mut self, conflicts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TraitId>,
    {
        self.conflicts.extend(conflicts.into_iter().map(Into::into));
        self
    }

    /// Add a stat modifier.
    #[must_use]
    pub fn with_modifier(mut self, modifier: StatModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    /// Set the default duration.
    #[must_use]
    pub const fn with_duration(mut self, duration: TraitDuration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the description template.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Add an effect executed on attach.
    #[must_use]
    pub fn with_on_add(mut self, effect: Effect) -> Self {
        self.on_add.push(effect);
        self
    }

    /// Add an effect executed on detach.
    #[must_use]
    pub fn with_on_remove(mut self, effect: Effect) -> Self {
        self.on_remove.push(effect);
        self
    }
}

/// A trait attached to one holder, with its remaining duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTrait {
    definition: Arc<Trait>,
    remaining: TraitDuration,
}

impl ActiveTrait {
    /// The shared definition.
    pub const fn definition(&self) -> &Arc<Trait> {
        &self.definition
    }

    /// The trait's identifier.
    pub fn id(&self) -> &TraitId {
        &self.definition.id
    }

    /// Remaining duration on this holder.
    pub const fn remaining(&self) -> TraitDuration {
        self.remaining
    }
}

// ---------------------------------------------------------------------------
// TraitManager
// ---------------------------------------------------------------------------

/// Live trait membership for one agent or relationship.
#[derive(Debug, Default)]
pub struct TraitManager {
    /// Active traits keyed by ID.
    traits: BTreeMap<TraitId, ActiveTrait>,
    /// Union of the conflict sets of all active traits.
    conflicting: BTreeSet<TraitId>,
    on_added: Subscribers<TraitId>,
    on_removed: Subscribers<TraitId>,
}

impl TraitManager {
    /// Create an empty manager.
    pub const fn new() -> Self {
        Self {
            traits: BTreeMap::new(),
            conflicting: BTreeSet::new(),
            on_added: Subscribers::new(),
            on_removed: Subscribers::new(),
        }
    }

    /// Attach a trait for the given duration.
    ///
    /// Returns `false` without mutating anything if the trait is already
    /// present or conflicts with an active trait.
    pub fn add_trait(&mut self, definition: Arc<Trait>, duration: TraitDuration) -> bool {
        if self.traits.contains_key(&definition.id) {
            debug!(trait_id = %definition.id, "trait already present");
            return false;
        }
        if self.has_conflicting_trait(&definition) {
            debug!(trait_id = %definition.id, "trait conflicts with an active trait");
            return false;
        }

        let id = definition.id.clone();
        self.conflicting.extend(definition.conflicts.iter().cloned());
        self.traits.insert(
            id.clone(),
            ActiveTrait {
                definition,
                remaining: duration,
            },
        );
        self.on_added.notify(&id);
        true
    }

    /// Detach a trait. Returns `false` if it was not present.
    pub fn remove_trait(&mut self, trait_id: &TraitId) -> bool {
        if self.traits.remove(trait_id).is_none() {
            return false;
        }

        self.conflicting = self
            .traits
            .values()
            .flat_map(|active| active.definition.conflicts.iter().cloned())
            .collect();

        self.on_removed.notify(trait_id);
        true
    }

    /// Whether the trait is attached.
    pub fn has_trait(&self, trait_id: &TraitId) -> bool {
        self.traits.contains_key(trait_id)
    }

    /// Whether attaching `definition` would conflict with the active set.
    ///
    /// True when an active trait declares it as conflicting, or when it
    /// declares an active trait as conflicting.
    pub fn has_conflicting_trait(&self, definition: &Trait) -> bool {
        self.conflicting.contains(&definition.id)
            || definition
                .conflicts
                .iter()
                .any(|other| self.traits.contains_key(other))
    }

    /// Look up an attached trait.
    ///
    /// Callers are expected to check [`has_trait`](Self::has_trait) first;
    /// a missing trait is reported as [`EngineError::TraitNotFound`].
    pub fn get_trait(&self, trait_id: &TraitId) -> Result<&ActiveTrait, EngineError> {
        self.traits
            .get(trait_id)
            .ok_or_else(|| EngineError::TraitNotFound(trait_id.clone()))
    }

    /// All attached traits in ID order.
    pub fn traits(&self) -> impl Iterator<Item = &ActiveTrait> {
        self.traits.values()
    }

    /// IDs of all attached traits in order.
    pub fn trait_ids(&self) -> impl Iterator<Item = &TraitId> {
        self.traits.keys()
    }

    /// The derived conflict set.
    pub const fn conflicting_traits(&self) -> &BTreeSet<TraitId> {
        &self.conflicting
    }

    /// Number of attached traits.
    pub fn len(&self) -> usize {
        self.traits.len()
    }

    /// Whether no traits are attached.
    pub fn is_empty(&self) -> bool {
        self.traits.is_empty()
    }

    /// Register a callback invoked with the trait ID after every add.
    pub fn on_trait_added(&mut self, callback: impl FnMut(&TraitId) + 'static) {
        self.on_added.subscribe(callback);
    }

    /// Register a callback invoked with the trait ID after every removal.
    pub fn on_trait_removed(&mut self, callback: impl FnMut(&TraitId) + 'static) {
        self.on_removed.subscribe(callback);
    }

    /// Advance every finite duration by one tick and remove expired traits.
    ///
    /// Returns the definitions of the expired traits in ID order. Each
    /// removal raises a "removed" notification.
    pub fn tick(&mut self) -> Vec<Arc<Trait>> {
        let mut expired = Vec::new();
        for active in self.traits.values_mut() {
            let (remaining, done) = active.remaining.tick();
            active.remaining = remaining;
            if done {
                expired.push(Arc::clone(&active.definition));
            }
        }

        for definition in &expired {
            self.remove_trait(&definition.id);
        }
        expired
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn def(id: &str, conflicts: &[&str]) -> Arc<Trait> {
        Arc::new(Trait::new(id).with_conflicts(conflicts.iter().copied()))
    }

    fn ids(manager: &TraitManager) -> Vec<&str> {
        manager.trait_ids().map(TraitId::as_str).collect()
    }

    #[test]
    fn add_and_query() {
        let mut manager = TraitManager::new();
        assert!(manager.add_trait(def("polite", &[]), TraitDuration::Unlimited));
        assert!(manager.has_trait(&TraitId::new("polite")));
        let active = manager.get_trait(&TraitId::new("polite")).unwrap();
        assert_eq!(active.id(), &TraitId::new("polite"));
        assert_eq!(active.remaining(), TraitDuration::Unlimited);
    }

    #[test]
    fn get_missing_trait_is_not_found() {
        let manager = TraitManager::new();
        assert_eq!(
            manager.get_trait(&TraitId::new("ghost")).err(),
            Some(EngineError::TraitNotFound(TraitId::new("ghost")))
        );
    }

    #[test]
    fn conflict_rejected_in_both_add_orders() {
        let rude = def("rude", &["polite"]);
        let polite = def("polite", &[]);

        let mut holding_rude = TraitManager::new();
        assert!(holding_rude.add_trait(Arc::clone(&rude), TraitDuration::Unlimited));
        assert!(!holding_rude.add_trait(Arc::clone(&polite), TraitDuration::Unlimited));
        assert_eq!(ids(&holding_rude), vec!["rude"]);

        let mut holding_polite = TraitManager::new();
        assert!(holding_polite.add_trait(polite, TraitDuration::Unlimited));
        assert!(!holding_polite.add_trait(rude, TraitDuration::Unlimited));
        assert_eq!(ids(&holding_polite), vec!["polite"]);
    }

    #[test]
    fn duplicate_add_fails_and_leaves_state_unchanged() {
        let mut manager = TraitManager::new();
        let added = Rc::new(RefCell::new(0_usize));
        let sink = Rc::clone(&added);
        manager.on_trait_added(move |_| {
            let next = sink.borrow().saturating_add(1);
            *sink.borrow_mut() = next;
        });

        assert!(manager.add_trait(def("shy", &["bold"]), TraitDuration::Ticks(3)));
        assert!(!manager.add_trait(def("shy", &[]), TraitDuration::Ticks(9)));

        assert_eq!(ids(&manager), vec!["shy"]);
        assert_eq!(
            manager.get_trait(&TraitId::new("shy")).unwrap().remaining(),
            TraitDuration::Ticks(3)
        );
        assert_eq!(
            manager.conflicting_traits().iter().map(TraitId::as_str).collect::<Vec<_>>(),
            vec!["bold"]
        );
        assert_eq!(*added.borrow(), 1);
    }

    #[test]
    fn conflict_set_rebuilt_from_remaining_traits() {
        let mut manager = TraitManager::new();
        manager.add_trait(def("x", &["a", "shared"]), TraitDuration::Unlimited);
        manager.add_trait(def("y", &["b", "shared"]), TraitDuration::Unlimited);
        manager.add_trait(def("z", &["c"]), TraitDuration::Unlimited);

        assert!(manager.remove_trait(&TraitId::new("x")));

        let expected: BTreeSet<TraitId> = ["b", "shared", "c"].into_iter().map(TraitId::from).collect();
        assert_eq!(manager.conflicting_traits(), &expected);
    }

    #[test]
    fn remove_absent_trait_fails() {
        let mut manager = TraitManager::new();
        assert!(!manager.remove_trait(&TraitId::new("ghost")));
    }

    #[test]
    fn notifications_carry_trait_id() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut manager = TraitManager::new();
        let added = Rc::clone(&log);
        manager.on_trait_added(move |id| added.borrow_mut().push(format!("+{id}")));
        let removed = Rc::clone(&log);
        manager.on_trait_removed(move |id| removed.borrow_mut().push(format!("-{id}")));

        manager.add_trait(def("kind", &[]), TraitDuration::Unlimited);
        manager.remove_trait(&TraitId::new("kind"));
        manager.remove_trait(&TraitId::new("kind"));

        assert_eq!(*log.borrow(), vec!["+kind", "-kind"]);
    }

    #[test]
    fn tick_expires_finite_traits() {
        let mut manager = TraitManager::new();
        manager.add_trait(def("angry", &["calm"]), TraitDuration::Ticks(1));
        manager.add_trait(def("tired", &[]), TraitDuration::Ticks(2));
        manager.add_trait(def("brave", &[]), TraitDuration::Unlimited);

        let expired = manager.tick();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired.first().unwrap().id, TraitId::new("angry"));
        assert!(manager.conflicting_traits().is_empty());
        assert_eq!(ids(&manager), vec!["brave", "tired"]);

        let expired = manager.tick();
        assert_eq!(expired.len(), 1);
        assert_eq!(ids(&manager), vec!["brave"]);
        assert!(manager.tick().is_empty());
    }
}
