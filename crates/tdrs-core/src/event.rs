//! Social event definitions and firing outcomes.
//!
//! A [`SocialEvent`] is written entirely in terms of role placeholders. It is
//! bound to concrete agents only when fired (or speculatively evaluated),
//! through an [`EffectBindingContext`].

use tdrs_types::EventId;

use crate::binding::EffectBindingContext;
use crate::effect::{Effect, EffectResult};

/// A conditional block of effects attached to an event.
///
/// After the event's own effects run, every response whose preconditions
/// hold runs its effects, in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventResponse {
    /// Precondition text handed to the evaluator.
    pub preconditions: Vec<String>,
    /// Effects executed when the preconditions hold.
    pub effects: Vec<Effect>,
    /// Optional description template for this response.
    pub description: Option<String>,
}

/// An authored event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocialEvent {
    /// Unique identifier.
    pub id: EventId,
    /// Ordered role placeholders, e.g. `["?initiator", "?target"]`.
    pub roles: Vec<String>,
    /// Description template, e.g. `"[initiator] insults [target]!"`.
    pub description: String,
    /// Precondition text handed to the evaluator.
    pub preconditions: Vec<String>,
    /// Effects executed in order when the event fires.
    pub effects: Vec<Effect>,
    /// Conditional responses evaluated after the effects.
    pub responses: Vec<EventResponse>,
}

impl SocialEvent {
    /// Create an event with no preconditions, effects, or responses.
    pub fn new<I, R>(id: impl Into<EventId>, roles: I, description: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        Self {
            id: id.into(),
            roles: roles.into_iter().map(Into::into).collect(),
            description: description.into(),
            preconditions: Vec::new(),
            effects: Vec::new(),
            responses: Vec::new(),
        }
    }

    /// Add a precondition.
    #[must_use]
    pub fn with_precondition(mut self, precondition: impl Into<String>) -> Self {
        self.preconditions.push(precondition.into());
        self
    }

    /// Add an effect.
    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Add a response.
    #[must_use]
    pub fn with_response(mut self, response: EventResponse) -> Self {
        self.responses.push(response);
        self
    }
}

/// A response that ran during a firing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredResponse {
    /// Position of the response in the event definition.
    pub index: usize,
    /// The response's substituted description, if it has one.
    pub description: Option<String>,
    /// Result of each of the response's effects.
    pub effect_results: Vec<EffectResult>,
}

/// Record of one event occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FiredEvent {
    /// The event that fired.
    pub event: EventId,
    /// Bindings and the substituted description.
    pub context: EffectBindingContext,
    /// Result of each of the event's own effects.
    pub effect_results: Vec<EffectResult>,
    /// Responses whose preconditions held.
    pub responses: Vec<FiredResponse>,
}

impl FiredEvent {
    /// The substituted description.
    pub fn description(&self) -> &str {
        self.context.description()
    }
}

/// Result of asking the engine to fire an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Preconditions held and the effects ran.
    Fired(FiredEvent),
    /// Preconditions failed; nothing was executed.
    PreconditionsFailed,
}

impl EventOutcome {
    /// Whether the event fired.
    pub const fn is_fired(&self) -> bool {
        matches!(self, Self::Fired(_))
    }

    /// The firing record, if the event fired.
    pub const fn fired(&self) -> Option<&FiredEvent> {
        match self {
            Self::Fired(fired) => Some(fired),
            Self::PreconditionsFailed => None,
        }
    }
}
