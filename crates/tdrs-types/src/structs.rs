//! Plain data structs shared by the core, the loader, and host adapters.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::ModifierKind;

// ---------------------------------------------------------------------------
// Stat modifiers
// ---------------------------------------------------------------------------

/// A single adjustment a trait makes to a named stat while it is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatModifier {
    /// Name of the stat being modified.
    pub stat: String,
    /// Amount added (additive) or factor applied (multiplicative).
    pub amount: Decimal,
    /// How the amount combines with the base value.
    #[serde(default)]
    pub kind: ModifierKind,
}

impl StatModifier {
    /// Create an additive modifier.
    pub fn additive(stat: impl Into<String>, amount: Decimal) -> Self {
        Self {
            stat: stat.into(),
            amount,
            kind: ModifierKind::Additive,
        }
    }

    /// Create a multiplicative modifier.
    pub fn multiplicative(stat: impl Into<String>, factor: Decimal) -> Self {
        Self {
            stat: stat.into(),
            amount: factor,
            kind: ModifierKind::Multiplicative,
        }
    }
}

// ---------------------------------------------------------------------------
// Stat schema
// ---------------------------------------------------------------------------

/// Authoring-time description of one stat every agent or relationship gets.
///
/// When `min`/`max` are set the computed value is clamped into the range.
/// A `discrete` stat has its computed value rounded to a whole number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSchemaEntry {
    /// Stat name, unique within one schema.
    pub name: String,
    /// Base value assigned at creation.
    #[serde(default)]
    pub base: Decimal,
    /// Lower bound of the computed value.
    #[serde(default)]
    pub min: Option<Decimal>,
    /// Upper bound of the computed value.
    #[serde(default)]
    pub max: Option<Decimal>,
    /// Round the computed value to a whole number.
    #[serde(default)]
    pub discrete: bool,
}

impl StatSchemaEntry {
    /// An unbounded, continuous stat with the given base value.
    pub fn new(name: impl Into<String>, base: Decimal) -> Self {
        Self {
            name: name.into(),
            base,
            min: None,
            max: None,
            discrete: false,
        }
    }

    /// Set both bounds.
    #[must_use]
    pub const fn with_bounds(mut self, min: Decimal, max: Decimal) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Mark the stat as discrete.
    #[must_use]
    pub const fn discrete(mut self) -> Self {
        self.discrete = true;
        self
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Payload delivered to stat change subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatChange {
    /// Name of the stat that changed.
    pub name: String,
    /// The newly computed value.
    pub value: Decimal,
}
