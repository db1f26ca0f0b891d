//! Authoring records: the on-disk shape of TDRS content.
//!
//! A content file is a single YAML document with four optional sections:
//!
//! ```yaml
//! traits:
//!   - id: friends
//!     description: "[owner] and [target] are friends"
//!     conflicts_with: [enemies]
//!     modifiers:
//!       - { stat: affinity, amount: 15 }
//! events:
//!   - id: Insult
//!     roles: ["?initiator", "?target"]
//!     description: "[initiator] insults [target]!"
//!     effects:
//!       - AdjustRelationshipStat ?target ?initiator affinity -10
//! agents:
//!   - id: alice
//!     traits: [polite]
//! relationships:
//!   - { owner: alice, target: bob, traits: [friends] }
//! ```
//!
//! Effects and preconditions stay as text here; [`crate::content`] parses
//! them when building engine definitions.

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tdrs_types::StatModifier;

use crate::error::LoaderError;

/// A whole content file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContentFile {
    /// Trait definitions.
    #[serde(default)]
    pub traits: Vec<TraitRecord>,

    /// Social event definitions.
    #[serde(default)]
    pub events: Vec<SocialEventRecord>,

    /// Agents to register.
    #[serde(default)]
    pub agents: Vec<AgentRecord>,

    /// Relationships to create between registered agents.
    #[serde(default)]
    pub relationships: Vec<RelationshipRecord>,
}

impl ContentFile {
    /// Load a content file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Io`] if the file cannot be read, or
    /// [`LoaderError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, LoaderError> {
        let contents = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse a content file from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`LoaderError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, LoaderError> {
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// An authored trait.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TraitRecord {
    /// Unique trait ID.
    pub id: String,

    /// Human-readable name; defaults to the ID.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Description template using `[owner]` and `[target]`.
    #[serde(default)]
    pub description: String,

    /// IDs of traits this one cannot coexist with.
    #[serde(default)]
    pub conflicts_with: Vec<String>,

    /// Stat modifiers applied while the trait is attached.
    #[serde(default)]
    pub modifiers: Vec<StatModifier>,

    /// Default duration in ticks; `-1` or absent means unlimited.
    #[serde(default)]
    pub duration: Option<i64>,

    /// Effects run when the trait is attached.
    #[serde(default)]
    pub on_add: Vec<String>,

    /// Effects run when the trait is detached or expires.
    #[serde(default)]
    pub on_remove: Vec<String>,
}

/// An authored social event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SocialEventRecord {
    /// Unique event ID.
    pub id: String,

    /// Ordered role placeholders.
    pub roles: Vec<String>,

    /// Description template.
    #[serde(default)]
    pub description: String,

    /// Precondition clauses.
    #[serde(default)]
    pub preconditions: Vec<String>,

    /// Effects run when the event fires.
    #[serde(default)]
    pub effects: Vec<String>,

    /// Conditional responses run after the effects.
    #[serde(default)]
    pub responses: Vec<EventResponseRecord>,
}

/// An authored event response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventResponseRecord {
    /// Precondition clauses.
    #[serde(default)]
    pub preconditions: Vec<String>,

    /// Effects run when the preconditions hold.
    #[serde(default)]
    pub effects: Vec<String>,

    /// Optional description template.
    #[serde(default)]
    pub description: Option<String>,
}

/// An agent to register at load time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentRecord {
    /// Unique agent ID.
    pub id: String,

    /// Traits attached at registration.
    #[serde(default)]
    pub traits: Vec<String>,

    /// Base stat values, overriding the configured schema.
    #[serde(default)]
    pub stats: BTreeMap<String, Decimal>,
}

/// A relationship to create at load time.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RelationshipRecord {
    /// The agent holding the opinion.
    pub owner: String,

    /// The agent the opinion is about.
    pub target: String,

    /// Traits attached to the edge.
    #[serde(default)]
    pub traits: Vec<String>,

    /// Base stat values, overriding the configured schema.
    #[serde(default)]
    pub stats: BTreeMap<String, Decimal>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use tdrs_types::ModifierKind;

    use super::*;

    #[test]
    fn empty_document_has_no_content() {
        let content = ContentFile::parse("{}").unwrap();
        assert_eq!(content, ContentFile::default());
    }

    #[test]
    fn parses_every_section() {
        let yaml = r#"
traits:
  - id: friends
    conflicts_with: [enemies]
    duration: -1
    modifiers:
      - { stat: affinity, amount: 15 }
      - { stat: trust, amount: 1.5, kind: multiplicative }
events:
  - id: Insult
    roles: ["?initiator", "?target"]
    description: "[initiator] insults [target]!"
    effects:
      - AdjustRelationshipStat ?target ?initiator affinity -10
    responses:
      - preconditions: ["AgentHasTrait ?target rude"]
        effects: ["TriggerEvent Insult ?target ?initiator"]
agents:
  - id: alice
    traits: [polite]
    stats: { charm: 12 }
relationships:
  - owner: alice
    target: bob
    stats: { affinity: -5 }
"#;
        let content = ContentFile::parse(yaml).unwrap();

        let friends = content.traits.first().unwrap();
        assert_eq!(friends.conflicts_with, vec!["enemies"]);
        assert_eq!(friends.duration, Some(-1));
        let trust = friends.modifiers.get(1).unwrap();
        assert_eq!(trust.amount, dec!(1.5));
        assert_eq!(trust.kind, ModifierKind::Multiplicative);

        let insult = content.events.first().unwrap();
        assert_eq!(insult.roles, vec!["?initiator", "?target"]);
        assert!(insult.preconditions.is_empty());
        assert_eq!(insult.responses.len(), 1);

        let alice = content.agents.first().unwrap();
        assert_eq!(alice.stats.get("charm"), Some(&dec!(12)));

        let edge = content.relationships.first().unwrap();
        assert!(edge.traits.is_empty());
        assert_eq!(edge.stats.get("affinity"), Some(&dec!(-5)));
    }

    #[test]
    fn event_without_roles_is_rejected() {
        let result = ContentFile::parse("events:\n  - id: Wave\n");
        assert!(matches!(result, Err(LoaderError::Yaml { .. })));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ContentFile::from_file(Path::new("/nonexistent/content.yaml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/content.yaml"));
    }
}
