//! Error types for content loading.
//!
//! Every authoring mistake the loader can detect surfaces as a
//! [`LoaderError`] before anything is registered with the engine, except
//! [`LoaderError::Engine`], which wraps failures reported by the engine
//! itself while the content is being applied.

use std::path::PathBuf;

use tdrs_core::EngineError;

/// Errors that can occur while reading or applying authored content.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// Failed to read a content file from disk.
    #[error("failed to read content file {path}: {source}")]
    Io {
        /// The file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse content YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        #[from]
        source: serde_yml::Error,
    },

    /// An effect string could not be parsed.
    #[error("invalid effect `{text}`: {reason}")]
    Effect {
        /// The authored effect text.
        text: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A precondition clause could not be parsed.
    #[error("invalid precondition `{text}`: {reason}")]
    Clause {
        /// The authored clause text.
        text: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A trait duration was neither `-1` nor a tick count.
    #[error("invalid duration {value} for trait {trait_id}")]
    InvalidDuration {
        /// The trait the duration belongs to.
        trait_id: String,
        /// The authored value.
        value: i64,
    },

    /// An effect refers to a role its owner never binds.
    #[error("{owner} uses role {role}, which it does not bind")]
    UnknownRole {
        /// The trait or event whose effect uses the role.
        owner: String,
        /// The offending role.
        role: String,
    },

    /// Two definitions share an ID.
    #[error("duplicate {kind}: {id}")]
    Duplicate {
        /// What kind of definition was duplicated.
        kind: &'static str,
        /// The repeated ID.
        id: String,
    },

    /// The engine rejected the content while it was being applied.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}
