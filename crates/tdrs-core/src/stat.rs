//! Numeric stats and the per-entity stat collection.
//!
//! A [`Stat`] holds a base value plus the modifiers contributed by attached
//! traits. The computed value is always derived from scratch:
//!
//! 1. start from the base value
//! 2. add every additive modifier
//! 3. multiply by every multiplicative modifier
//! 4. clamp into `[min, max]` when bounds are set
//! 5. round to a whole number if the stat is discrete
//!
//! Modifiers are iterated in source (trait id) order, so the result never
//! depends on the order traits were attached. All arithmetic uses
//! [`Decimal`] and saturates instead of overflowing.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tdrs_types::{ModifierKind, StatChange, StatModifier, StatSchemaEntry, TraitId};
use tracing::debug;

use crate::error::EngineError;
use crate::notify::Subscribers;

/// One modifier as stored on a stat, stripped of the stat name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Contribution {
    amount: Decimal,
    kind: ModifierKind,
}

// ---------------------------------------------------------------------------
// Stat
// ---------------------------------------------------------------------------

/// A named numeric attribute of an agent or relationship.
#[derive(Debug)]
pub struct Stat {
    name: String,
    base: Decimal,
    min: Option<Decimal>,
    max: Option<Decimal>,
    discrete: bool,
    /// Modifiers keyed by the trait that contributed them.
    modifiers: BTreeMap<TraitId, Vec<Contribution>>,
    /// Cached result of the last recomputation.
    value: Decimal,
    subscribers: Subscribers<StatChange>,
}

impl Stat {
    /// Create an unbounded, continuous stat.
    pub fn new(name: impl Into<String>, base: Decimal) -> Self {
        Self::from_schema(&StatSchemaEntry::new(name, base))
    }

    /// Create a stat from its schema entry.
    pub fn from_schema(entry: &StatSchemaEntry) -> Self {
        let mut stat = Self {
            name: entry.name.clone(),
            base: entry.base,
            min: entry.min,
            max: entry.max,
            discrete: entry.discrete,
            modifiers: BTreeMap::new(),
            value: entry.base,
            subscribers: Subscribers::new(),
        };
        stat.value = stat.compute();
        stat
    }

    /// The stat's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The base value, before modifiers.
    pub const fn base(&self) -> Decimal {
        self.base
    }

    /// The computed value, with modifiers, rounding, and bounds applied.
    pub const fn value(&self) -> Decimal {
        self.value
    }

    /// Number of traits currently contributing modifiers.
    pub fn modifier_sources(&self) -> usize {
        self.modifiers.len()
    }

    /// Whether the given trait currently contributes a modifier.
    pub fn has_modifier_from(&self, source: &TraitId) -> bool {
        self.modifiers.contains_key(source)
    }

    /// Register a callback invoked with `(name, value)` after every change.
    pub fn subscribe(&mut self, callback: impl FnMut(&StatChange) + 'static) {
        self.subscribers.subscribe(callback);
    }

    /// Replace the base value. Returns the new computed value.
    pub fn set_base(&mut self, base: Decimal) -> StatChange {
        self.base = base;
        self.recompute()
    }

    /// Add `delta` to the base value. Returns the new computed value.
    pub fn adjust_base(&mut self, delta: Decimal) -> StatChange {
        self.base = self.base.saturating_add(delta);
        self.recompute()
    }

    /// Attach a modifier contributed by `source`.
    ///
    /// A single trait may contribute several modifiers to the same stat;
    /// they accumulate under the same source.
    pub fn add_modifier(&mut self, source: &TraitId, modifier: &StatModifier) -> StatChange {
        self.modifiers
            .entry(source.clone())
            .or_default()
            .push(Contribution {
                amount: modifier.amount,
                kind: modifier.kind,
            });
        self.recompute()
    }

    /// Remove every modifier contributed by `source`.
    ///
    /// Returns `None` (and sends no notification) if `source` contributed
    /// nothing.
    pub fn remove_modifiers_from(&mut self, source: &TraitId) -> Option<StatChange> {
        self.modifiers.remove(source)?;
        Some(self.recompute())
    }

    fn recompute(&mut self) -> StatChange {
        self.value = self.compute();
        let change = StatChange {
            name: self.name.clone(),
            value: self.value,
        };
        self.subscribers.notify(&change);
        change
    }

    fn compute(&self) -> Decimal {
        let contributions = || self.modifiers.values().flatten();

        let mut total = contributions()
            .filter(|c| c.kind == ModifierKind::Additive)
            .fold(self.base, |acc, c| acc.saturating_add(c.amount));

        total = contributions()
            .filter(|c| c.kind == ModifierKind::Multiplicative)
            .fold(total, |acc, c| acc.saturating_mul(c.amount));

        if let Some(min) = self.min {
            total = total.max(min);
        }
        if let Some(max) = self.max {
            total = total.min(max);
        }
        if self.discrete {
            total = total.round();
        }
        total
    }
}

// ---------------------------------------------------------------------------
// StatCollection
// ---------------------------------------------------------------------------

/// The set of stats owned by one agent or relationship.
///
/// Besides each stat's own subscribers, the collection has a list of
/// collection-wide subscribers that hear about a change to any stat.
#[derive(Debug, Default)]
pub struct StatCollection {
    stats: BTreeMap<String, Stat>,
    subscribers: Subscribers<StatChange>,
}

impl StatCollection {
    /// Create an empty collection.
    pub const fn new() -> Self {
        Self {
            stats: BTreeMap::new(),
            subscribers: Subscribers::new(),
        }
    }

    /// Create a collection with one stat per schema entry.
    ///
    /// Later entries with a duplicate name are ignored.
    pub fn from_schema(schema: &[StatSchemaEntry]) -> Self {
        let mut collection = Self::new();
        for entry in schema {
            collection.insert(Stat::from_schema(entry));
        }
        collection
    }

    /// Add a stat. Returns `false` if a stat with that name already exists.
    pub fn insert(&mut self, stat: Stat) -> bool {
        if self.stats.contains_key(stat.name()) {
            return false;
        }
        self.stats.insert(stat.name.clone(), stat);
        true
    }

    /// Whether the collection has a stat with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.stats.contains_key(name)
    }

    /// Look up a stat by name.
    pub fn get(&self, name: &str) -> Result<&Stat, EngineError> {
        self.stats
            .get(name)
            .ok_or_else(|| EngineError::StatNotFound(String::from(name)))
    }

    /// The computed value of a stat.
    pub fn value(&self, name: &str) -> Result<Decimal, EngineError> {
        self.get(name).map(Stat::value)
    }

    /// Iterate over all stats in name order.
    pub fn iter(&self) -> impl Iterator<Item = &Stat> {
        self.stats.values()
    }

    /// Number of stats in the collection.
    pub fn len(&self) -> usize {
        self.stats.len()
    }

    /// Whether the collection has no stats.
    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Register a callback invoked after any stat in the collection changes.
    pub fn subscribe(&mut self, callback: impl FnMut(&StatChange) + 'static) {
        self.subscribers.subscribe(callback);
    }

    /// Register a callback on a single stat.
    pub fn subscribe_to(
        &mut self,
        name: &str,
        callback: impl FnMut(&StatChange) + 'static,
    ) -> Result<(), EngineError> {
        let stat = self
            .stats
            .get_mut(name)
            .ok_or_else(|| EngineError::StatNotFound(String::from(name)))?;
        stat.subscribe(callback);
        Ok(())
    }

    /// Replace the base value of an existing stat.
    pub fn set_base(&mut self, name: &str, base: Decimal) -> Result<Decimal, EngineError> {
        let stat = self
            .stats
            .get_mut(name)
            .ok_or_else(|| EngineError::StatNotFound(String::from(name)))?;
        let change = stat.set_base(base);
        self.subscribers.notify(&change);
        Ok(change.value)
    }

    /// Add `delta` to a stat's base value, creating the stat at zero if it
    /// does not exist yet. Returns the new computed value.
    pub fn adjust_base(&mut self, name: &str, delta: Decimal) -> Decimal {
        let change = self.entry(name).adjust_base(delta);
        self.subscribers.notify(&change);
        change.value
    }

    /// Apply every modifier a trait contributes.
    ///
    /// Stats the trait modifies but the collection lacks are created with a
    /// zero base.
    pub fn add_modifiers_from(&mut self, source: &TraitId, modifiers: &[StatModifier]) {
        for modifier in modifiers {
            let change = self.entry(&modifier.stat).add_modifier(source, modifier);
            self.subscribers.notify(&change);
        }
    }

    /// Withdraw every modifier a trait contributed, across all stats.
    pub fn remove_modifiers_from(&mut self, source: &TraitId) {
        for stat in self.stats.values_mut() {
            if let Some(change) = stat.remove_modifiers_from(source) {
                self.subscribers.notify(&change);
            }
        }
    }

    fn entry(&mut self, name: &str) -> &mut Stat {
        self.stats.entry(String::from(name)).or_insert_with(|| {
            debug!(stat = name, "creating stat with zero base");
            Stat::new(name, Decimal::ZERO)
        })
    }
}
