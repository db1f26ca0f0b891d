//! Enumeration types shared across the TDRS workspace.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Stat modifiers
// ---------------------------------------------------------------------------

/// How a trait-contributed modifier combines with a stat's base value.
///
/// Additive modifiers are summed onto the base first; multiplicative
/// modifiers then scale the result, independent of the order traits were
/// attached in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKind {
    /// Added to the base value.
    Additive,
    /// Multiplies the base-plus-additive total.
    Multiplicative,
}

impl Default for ModifierKind {
    fn default() -> Self {
        Self::Additive
    }
}

// ---------------------------------------------------------------------------
// Trait durations
// ---------------------------------------------------------------------------

/// Remaining lifetime of an attached trait, measured in simulation ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitDuration {
    /// The trait stays until explicitly removed.
    Unlimited,
    /// The trait expires once this many ticks have elapsed.
    Ticks(u32),
}

impl TraitDuration {
    /// Build a duration from an optional tick count (`None` is unlimited).
    pub const fn from_ticks(ticks: Option<u32>) -> Self {
        match ticks {
            Some(n) => Self::Ticks(n),
            None => Self::Unlimited,
        }
    }

    /// Advance one tick.
    ///
    /// Returns the new duration and whether the trait has now expired.
    /// Unlimited durations never expire.
    pub const fn tick(self) -> (Self, bool) {
        match self {
            Self::Unlimited => (Self::Unlimited, false),
            Self::Ticks(n) => {
                let remaining = n.saturating_sub(1);
                (Self::Ticks(remaining), remaining == 0)
            }
        }
    }

    /// Whether this duration is finite.
    pub const fn is_finite(self) -> bool {
        matches!(self, Self::Ticks(_))
    }
}

impl Default for TraitDuration {
    fn default() -> Self {
        Self::Unlimited
    }
}
