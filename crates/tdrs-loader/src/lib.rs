//! Content loading for TDRS.
//!
//! Reads YAML content files into authoring records, parses the textual
//! effect and precondition languages, and registers the resulting traits,
//! events, agents, and relationships with a
//! [`SocialEngineState`](tdrs_core::SocialEngineState).
//!
//! # Modules
//!
//! - [`clauses`] -- Precondition clauses and [`ClauseEvaluator`]
//! - [`content`] -- Building definitions and loading content ([`load_file`])
//! - [`error`] -- Loader error type ([`LoaderError`])
//! - [`parse`] -- Effect text parsing ([`parse_effect`])
//! - [`records`] -- On-disk record shapes ([`ContentFile`])

pub mod clauses;
pub mod content;
pub mod error;
pub mod parse;
pub mod records;

pub use clauses::{Clause, ClauseEvaluator, Comparison};
pub use content::{LoadSummary, build_event, build_trait, load_content, load_file};
pub use error::LoaderError;
pub use parse::{parse_effect, parse_effects};
pub use records::{
    AgentRecord, ContentFile, EventResponseRecord, RelationshipRecord, SocialEventRecord,
    TraitRecord,
};
