//! Shared type definitions for the TDRS social simulation.
//!
//! Everything here is plain data: identifiers, modifier and duration enums,
//! and the small structs exchanged between the simulation core, the
//! authoring loader, and host adapters.
//!
//! # Modules
//!
//! - [`ids`] -- String-backed identifier newtypes for agents, traits, events
//! - [`enums`] -- Modifier kinds and trait durations
//! - [`structs`] -- Stat modifiers, stat schema entries, change payloads

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{ModifierKind, TraitDuration};
pub use ids::{AgentId, EventId, TraitId};
pub use structs::{StatChange, StatModifier, StatSchemaEntry};
