//! Error types for the simulation runner binary.
//!
//! [`SimError`] is the top-level error type that wraps all possible
//! failure modes during startup and script execution.

/// Top-level error for the simulation runner.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: crate::config::ConfigError,
    },

    /// Content loading failed.
    #[error("content error: {source}")]
    Content {
        /// The underlying loader error.
        #[from]
        source: tdrs_loader::LoaderError,
    },

    /// The engine reported a lookup failure while playing the script.
    #[error("engine error: {source}")]
    Engine {
        /// The underlying engine error.
        #[from]
        source: tdrs_core::EngineError,
    },

    /// Logging could not be initialized.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the failure.
        message: String,
    },

    /// The final report could not be serialized.
    #[error("report error: {source}")]
    Report {
        /// The underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}
