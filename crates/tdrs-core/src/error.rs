//! Error types for the tdrs-core crate.
//!
//! Rejected mutations (duplicate or conflicting traits, duplicate
//! registrations, removing something absent) are ordinary control flow and
//! surface as `bool` returns. The variants here are lookup failures and
//! contract violations, which propagate to the caller.

use tdrs_types::{AgentId, EventId, TraitId};

/// Errors that can occur during social engine operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Agents must have a non-empty identifier.
    #[error("agent identifier must not be empty")]
    EmptyAgentId,

    /// Agent with the given ID is not registered.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// Trait with the given ID is not defined, or not attached where it
    /// was looked up.
    #[error("trait not found: {0}")]
    TraitNotFound(TraitId),

    /// Social event with the given ID is not defined.
    #[error("social event not found: {0}")]
    EventNotFound(EventId),

    /// No relationship edge exists between the two agents.
    #[error("relationship not found: {owner} -> {target}")]
    RelationshipNotFound {
        /// Owner of the missing edge.
        owner: AgentId,
        /// Target of the missing edge.
        target: AgentId,
    },

    /// The named stat does not exist on the node or edge.
    #[error("stat not found: {0}")]
    StatNotFound(String),

    /// A relationship was requested from an agent to itself.
    #[error("agent {0} cannot have a relationship with itself")]
    SelfRelationship(AgentId),

    /// The number of agents supplied does not match the event's roles.
    #[error("event {event} declares {expected} roles but {actual} agents were supplied")]
    RoleCountMismatch {
        /// The event being bound.
        event: EventId,
        /// Number of roles the event declares.
        expected: usize,
        /// Number of agents the caller supplied.
        actual: usize,
    },

    /// An effect or query referenced a role that has no binding.
    #[error("role {0} is not bound in this context")]
    UnboundRole(String),

    /// Nested event triggering exceeded the configured depth.
    #[error("nested event {event} exceeds the maximum depth of {max_depth}")]
    EventDepthExceeded {
        /// The event that would have fired.
        event: EventId,
        /// The configured limit.
        max_depth: usize,
    },

    /// A chain of trait attach/detach effects exceeded the configured depth.
    #[error("effects of trait {trait_id} exceed the maximum depth of {max_depth}")]
    TraitEffectDepthExceeded {
        /// The trait whose effects would have run.
        trait_id: TraitId,
        /// The configured limit.
        max_depth: usize,
    },
}
