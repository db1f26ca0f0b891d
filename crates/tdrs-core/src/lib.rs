//! Agent graph, traits, stats, and social event dispatch for TDRS.
//!
//! This crate is the simulation core. It performs no I/O: content loading
//! lives in `tdrs-loader` and host integration in whatever embeds the
//! engine. Everything runs synchronously on the caller's thread, and
//! notifications are delivered in-line with the mutation that caused them.
//!
//! # Modules
//!
//! - [`agent`] -- Agent nodes ([`AgentNode`])
//! - [`binding`] -- Role bindings and description templating ([`EffectBindingContext`])
//! - [`config`] -- Engine tunables and default stat schemas ([`EngineConfig`])
//! - [`effect`] -- Effect specs and the effect execution policy ([`Effect`])
//! - [`error`] -- Error types for all engine operations ([`EngineError`])
//! - [`event`] -- Social event definitions and firing outcomes ([`SocialEvent`])
//! - [`notify`] -- Synchronous observer lists ([`Subscribers`], [`Hooks`])
//! - [`precondition`] -- The precondition evaluator seam ([`PreconditionEvaluator`])
//! - [`relationship`] -- Directed relationship edges ([`RelationshipEdge`])
//! - [`stat`] -- Stats and stat collections ([`Stat`], [`StatCollection`])
//! - [`state`] -- The top-level registry ([`SocialEngineState`])
//! - [`traits`] -- Trait definitions and the trait manager ([`Trait`], [`TraitManager`])

pub mod agent;
pub mod binding;
pub mod config;
pub mod effect;
pub mod error;
pub mod event;
pub mod notify;
pub mod precondition;
pub mod relationship;
pub mod stat;
pub mod state;
pub mod traits;

// Re-export primary types at crate root for convenience.
pub use agent::AgentNode;
pub use binding::{EffectBindingContext, OWNER_ROLE, TARGET_ROLE};
pub use config::EngineConfig;
pub use effect::{Effect, EffectResult};
pub use error::EngineError;
pub use event::{EventOutcome, EventResponse, FiredEvent, FiredResponse, SocialEvent};
pub use notify::{Hooks, Subscribers};
pub use precondition::{AlwaysTrue, PreconditionEvaluator};
pub use relationship::RelationshipEdge;
pub use stat::{Stat, StatCollection};
pub use state::{SocialEngineState, TraitExpiration};
pub use traits::{ActiveTrait, Trait, TraitManager};
