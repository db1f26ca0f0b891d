//! Configuration for the social engine.
//!
//! [`EngineConfig`] bundles the tunables and default stat schemas. Hosts
//! usually deserialize it from the `engine` section of their YAML config;
//! every field has a default so an empty section is valid.

use serde::Deserialize;
use tdrs_types::StatSchemaEntry;

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineConfig {
    /// Maximum nesting of events fired by `TriggerEvent` effects (default: 8).
    ///
    /// Top-level firings are depth 0.
    #[serde(default = "default_max_event_depth")]
    pub max_event_depth: usize,

    /// Stats every agent starts with.
    #[serde(default)]
    pub agent_stats: Vec<StatSchemaEntry>,

    /// Stats every relationship starts with.
    #[serde(default)]
    pub relationship_stats: Vec<StatSchemaEntry>,
}

const fn default_max_event_depth() -> usize {
    8
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_event_depth: default_max_event_depth(),
            agent_stats: Vec::new(),
            relationship_stats: Vec::new(),
        }
    }
}
