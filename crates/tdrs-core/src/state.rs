//! The top-level social engine registry.
//!
//! [`SocialEngineState`] owns every agent node (and, through them, every
//! relationship edge), every trait and event definition, and the
//! precondition evaluator. It is the only component that validates agent
//! identity and the only entry point for mutating the graph from outside an
//! existing node or edge.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use tdrs_types::{AgentId, EventId, TraitDuration, TraitId};
use tracing::{debug, info, warn};

use crate::agent::AgentNode;
use crate::binding::{EffectBindingContext, OWNER_ROLE, TARGET_ROLE};
use crate::config::EngineConfig;
use crate::effect::{Effect, EffectResult};
use crate::error::EngineError;
use crate::event::{EventOutcome, FiredEvent, FiredResponse, SocialEvent};
use crate::precondition::{AlwaysTrue, PreconditionEvaluator};
use crate::relationship::RelationshipEdge;
use crate::stat::Stat;
use crate::traits::Trait;

/// A trait that expired during [`SocialEngineState::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitExpiration {
    /// The agent holding the trait, or owning the relationship.
    pub owner: AgentId,
    /// The relationship target, when the trait was on an edge.
    pub target: Option<AgentId>,
    /// The expired trait.
    pub definition: Arc<Trait>,
    /// Why the trait's detach effects stopped early, if they did.
    pub detach_error: Option<EngineError>,
}

/// Registry of agents, relationships, and authored definitions.
pub struct SocialEngineState {
    config: EngineConfig,
    agents: BTreeMap<AgentId, AgentNode>,
    traits: BTreeMap<TraitId, Arc<Trait>>,
    events: BTreeMap<EventId, Arc<SocialEvent>>,
    evaluator: Box<dyn PreconditionEvaluator>,
}

impl fmt::Debug for SocialEngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocialEngineState")
            .field("config", &self.config)
            .field("agents", &self.agents)
            .field("traits", &self.traits.keys().collect::<Vec<_>>())
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Default for SocialEngineState {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl SocialEngineState {
    /// Create an empty engine whose preconditions always hold.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_evaluator(config, AlwaysTrue)
    }

    /// Create an empty engine with a custom precondition evaluator.
    pub fn with_evaluator(
        config: EngineConfig,
        evaluator: impl PreconditionEvaluator + 'static,
    ) -> Self {
        Self {
            config,
            agents: BTreeMap::new(),
            traits: BTreeMap::new(),
            events: BTreeMap::new(),
            evaluator: Box::new(evaluator),
        }
    }

    /// Replace the precondition evaluator.
    pub fn set_evaluator(&mut self, evaluator: impl PreconditionEvaluator + 'static) {
        self.evaluator = Box::new(evaluator);
    }

    /// The engine configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Definitions
    // -----------------------------------------------------------------------

    /// Register a trait definition. Returns `false` for a duplicate ID.
    pub fn register_trait(&mut self, definition: Trait) -> bool {
        if self.traits.contains_key(&definition.id) {
            return false;
        }
        self.traits
            .insert(definition.id.clone(), Arc::new(definition));
        true
    }

    /// Look up a trait definition.
    pub fn trait_def(&self, trait_id: &TraitId) -> Result<&Arc<Trait>, EngineError> {
        self.traits
            .get(trait_id)
            .ok_or_else(|| EngineError::TraitNotFound(trait_id.clone()))
    }

    /// All trait definitions in ID order.
    pub fn trait_defs(&self) -> impl Iterator<Item = &Arc<Trait>> {
        self.traits.values()
    }

    /// Register an event definition. Returns `false` for a duplicate ID.
    pub fn register_event(&mut self, event: SocialEvent) -> bool {
        if self.events.contains_key(&event.id) {
            return false;
        }
        self.events.insert(event.id.clone(), Arc::new(event));
        true
    }

    /// Look up an event definition.
    pub fn event(&self, event_id: &EventId) -> Result<&Arc<SocialEvent>, EngineError> {
        self.events
            .get(event_id)
            .ok_or_else(|| EngineError::EventNotFound(event_id.clone()))
    }

    /// All event definitions in ID order.
    pub fn events(&self) -> impl Iterator<Item = &Arc<SocialEvent>> {
        self.events.values()
    }

    // -----------------------------------------------------------------------
    // Agents and relationships
    // -----------------------------------------------------------------------

    /// Register an agent with initial traits and stat base values.
    ///
    /// Stats come from the configured agent schema; `initial_stats`
    /// overrides their base values or adds stats the schema lacks. Initial
    /// traits are attached in order with their default durations, and their
    /// attach effects run. Returns `Ok(false)` if the ID is already taken.
    ///
    /// # Errors
    ///
    /// [`EngineError::EmptyAgentId`] for an empty ID and
    /// [`EngineError::TraitNotFound`] for an undefined initial trait. Both
    /// are checked before the agent is created.
    pub fn register_agent(
        &mut self,
        id: AgentId,
        initial_traits: &[TraitId],
        initial_stats: &BTreeMap<String, Decimal>,
    ) -> Result<bool, EngineError> {
        if id.as_str().is_empty() {
            return Err(EngineError::EmptyAgentId);
        }
        if self.agents.contains_key(&id) {
            return Ok(false);
        }
        for trait_id in initial_traits {
            self.trait_def(trait_id)?;
        }

        let mut node = AgentNode::new(id.clone(), &self.config.agent_stats);
        for (name, base) in initial_stats {
            if node.stats().contains(name) {
                node.stats_mut().set_base(name, *base)?;
            } else {
                node.stats_mut().insert(Stat::new(name.clone(), *base));
            }
        }
        self.agents.insert(id.clone(), node);
        info!(agent = %id, "Agent registered");

        for trait_id in initial_traits {
            if !self.add_agent_trait(&id, trait_id, None)? {
                warn!(agent = %id, %trait_id, "initial trait rejected");
            }
        }
        Ok(true)
    }

    /// Whether an agent is registered.
    pub fn has_agent(&self, id: &AgentId) -> bool {
        self.agents.contains_key(id)
    }

    /// Look up an agent.
    pub fn agent(&self, id: &AgentId) -> Result<&AgentNode, EngineError> {
        self.agents
            .get(id)
            .ok_or_else(|| EngineError::AgentNotFound(id.clone()))
    }

    /// Look up an agent for mutation.
    pub fn agent_mut(&mut self, id: &AgentId) -> Result<&mut AgentNode, EngineError> {
        self.agents
            .get_mut(id)
            .ok_or_else(|| EngineError::AgentNotFound(id.clone()))
    }

    /// All agents in ID order.
    pub fn agents(&self) -> impl Iterator<Item = &AgentNode> {
        self.agents.values()
    }

    /// All agents in ID order, for mutation (typically subscribing).
    pub fn agents_mut(&mut self) -> impl Iterator<Item = &mut AgentNode> {
        self.agents.values_mut()
    }

    /// Return the `owner -> target` edge, creating it on first reference.
    ///
    /// # Errors
    ///
    /// [`EngineError::SelfRelationship`] if `owner == target`, and
    /// [`EngineError::AgentNotFound`] if either agent is unregistered.
    pub fn get_or_create_relationship(
        &mut self,
        owner: &AgentId,
        target: &AgentId,
    ) -> Result<&mut RelationshipEdge, EngineError> {
        if owner == target {
            return Err(EngineError::SelfRelationship(owner.clone()));
        }
        if !self.agents.contains_key(target) {
            return Err(EngineError::AgentNotFound(target.clone()));
        }
        let schema = &self.config.relationship_stats;
        let node = self
            .agents
            .get_mut(owner)
            .ok_or_else(|| EngineError::AgentNotFound(owner.clone()))?;
        Ok(node.get_or_create_relationship(target, schema))
    }

    /// Look up an existing `owner -> target` edge.
    pub fn relationship(
        &self,
        owner: &AgentId,
        target: &AgentId,
    ) -> Result<&RelationshipEdge, EngineError> {
        self.agent(owner)?
            .relationship(target)
            .ok_or_else(|| EngineError::RelationshipNotFound {
                owner: owner.clone(),
                target: target.clone(),
            })
    }

    // -----------------------------------------------------------------------
    // Trait mutation
    // -----------------------------------------------------------------------

    /// Attach a registered trait to an agent and run its attach effects.
    ///
    /// `duration` overrides the trait's default. Returns `Ok(false)` if the
    /// agent's trait manager rejected it.
    pub fn add_agent_trait(
        &mut self,
        agent: &AgentId,
        trait_id: &TraitId,
        duration: Option<TraitDuration>,
    ) -> Result<bool, EngineError> {
        self.add_agent_trait_at_depth(agent, trait_id, duration, 0)
    }

    /// Detach a trait from an agent and run its detach effects.
    ///
    /// Returns `Ok(false)` if the trait was not attached.
    pub fn remove_agent_trait(
        &mut self,
        agent: &AgentId,
        trait_id: &TraitId,
    ) -> Result<bool, EngineError> {
        self.remove_agent_trait_at_depth(agent, trait_id, 0)
    }

    /// Attach a registered trait to the `owner -> target` relationship,
    /// creating the edge if needed, and run its attach effects.
    pub fn add_relationship_trait(
        &mut self,
        owner: &AgentId,
        target: &AgentId,
        trait_id: &TraitId,
        duration: Option<TraitDuration>,
    ) -> Result<bool, EngineError> {
        self.add_relationship_trait_at_depth(owner, target, trait_id, duration, 0)
    }

    /// Detach a trait from the `owner -> target` relationship and run its
    /// detach effects. Returns `Ok(false)` if the edge or trait is absent.
    pub fn remove_relationship_trait(
        &mut self,
        owner: &AgentId,
        target: &AgentId,
        trait_id: &TraitId,
    ) -> Result<bool, EngineError> {
        self.remove_relationship_trait_at_depth(owner, target, trait_id, 0)
    }

    pub(crate) fn add_agent_trait_at_depth(
        &mut self,
        agent: &AgentId,
        trait_id: &TraitId,
        duration: Option<TraitDuration>,
        depth: usize,
    ) -> Result<bool, EngineError> {
        let definition = Arc::clone(self.trait_def(trait_id)?);
        let nested = self.trait_effect_depth(&definition, &definition.on_add, depth)?;
        let duration = duration.unwrap_or(definition.duration);
        let node = self.agent_mut(agent)?;
        if !node.add_trait(&definition, duration) {
            return Ok(false);
        }
        debug!(%agent, trait_id = %definition.id, ?duration, "Agent trait added");

        if !definition.on_add.is_empty() {
            let ctx = EffectBindingContext::for_agent(node, &definition.description);
            self.apply_effects(&definition.on_add, &ctx, nested)?;
        }
        Ok(true)
    }

    pub(crate) fn remove_agent_trait_at_depth(
        &mut self,
        agent: &AgentId,
        trait_id: &TraitId,
        depth: usize,
    ) -> Result<bool, EngineError> {
        let Ok(active) = self.agent(agent)?.traits().get_trait(trait_id) else {
            return Ok(false);
        };
        let definition = Arc::clone(active.definition());
        let nested = self.trait_effect_depth(&definition, &definition.on_remove, depth)?;
        let node = self.agent_mut(agent)?;
        node.remove_trait(trait_id);
        debug!(%agent, %trait_id, "Agent trait removed");

        if !definition.on_remove.is_empty() {
            let ctx = EffectBindingContext::for_agent(node, &definition.description);
            self.apply_effects(&definition.on_remove, &ctx, nested)?;
        }
        Ok(true)
    }

    pub(crate) fn add_relationship_trait_at_depth(
        &mut self,
        owner: &AgentId,
        target: &AgentId,
        trait_id: &TraitId,
        duration: Option<TraitDuration>,
        depth: usize,
    ) -> Result<bool, EngineError> {
        let definition = Arc::clone(self.trait_def(trait_id)?);
        let nested = self.trait_effect_depth(&definition, &definition.on_add, depth)?;
        let duration = duration.unwrap_or(definition.duration);
        let edge = self.get_or_create_relationship(owner, target)?;
        if !edge.add_trait(&definition, duration) {
            return Ok(false);
        }
        debug!(%owner, %target, trait_id = %definition.id, ?duration, "Relationship trait added");

        if !definition.on_add.is_empty() {
            let ctx = EffectBindingContext::for_relationship(edge, &definition.description);
            self.apply_effects(&definition.on_add, &ctx, nested)?;
        }
        Ok(true)
    }

    pub(crate) fn remove_relationship_trait_at_depth(
        &mut self,
        owner: &AgentId,
        target: &AgentId,
        trait_id: &TraitId,
        depth: usize,
    ) -> Result<bool, EngineError> {
        if !self.agents.contains_key(target) {
            return Err(EngineError::AgentNotFound(target.clone()));
        }
        let Some(edge) = self.agent(owner)?.relationship(target) else {
            return Ok(false);
        };
        let Ok(active) = edge.traits().get_trait(trait_id) else {
            return Ok(false);
        };
        let definition = Arc::clone(active.definition());
        let nested = self.trait_effect_depth(&definition, &definition.on_remove, depth)?;
        let edge = self
            .agent_mut(owner)?
            .relationship_mut(target)
            .ok_or_else(|| EngineError::RelationshipNotFound {
                owner: owner.clone(),
                target: target.clone(),
            })?;
        edge.remove_trait(trait_id);
        debug!(%owner, %target, %trait_id, "Relationship trait removed");

        if !definition.on_remove.is_empty() {
            let ctx = EffectBindingContext::for_relationship(edge, &definition.description);
            self.apply_effects(&definition.on_remove, &ctx, nested)?;
        }
        Ok(true)
    }

    /// Depth at which a trait's attach or detach effects run.
    ///
    /// They run one level below the mutation that triggered them and share
    /// the nested event limit. Checked before the trait is attached or
    /// detached.
    fn trait_effect_depth(
        &self,
        definition: &Trait,
        effects: &[Effect],
        depth: usize,
    ) -> Result<usize, EngineError> {
        let nested = depth.saturating_add(1);
        if !effects.is_empty() && nested > self.config.max_event_depth {
            return Err(EngineError::TraitEffectDepthExceeded {
                trait_id: definition.id.clone(),
                max_depth: self.config.max_event_depth,
            });
        }
        Ok(nested)
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Evaluate preconditions with the configured evaluator.
    ///
    /// Takes `&self`, so evaluation cannot mutate the graph.
    pub fn check_preconditions(
        &self,
        preconditions: &[String],
        ctx: &EffectBindingContext,
    ) -> bool {
        self.evaluator.evaluate(preconditions, ctx, self)
    }

    /// Bind an event to `agents` and check its preconditions without
    /// executing anything.
    ///
    /// Returns the binding context if the event would fire.
    pub fn evaluate_event(
        &self,
        event_id: &EventId,
        agents: &[AgentId],
    ) -> Result<Option<EffectBindingContext>, EngineError> {
        let event = self.event(event_id)?;
        for agent in agents {
            self.agent(agent)?;
        }
        let ctx = EffectBindingContext::for_event(event, agents)?;
        Ok(self
            .check_preconditions(&event.preconditions, &ctx)
            .then_some(ctx))
    }

    /// Speculatively evaluate many candidate role assignments.
    ///
    /// Returns the contexts of the assignments whose preconditions hold, in
    /// input order.
    pub fn matching_assignments(
        &self,
        event_id: &EventId,
        candidates: &[Vec<AgentId>],
    ) -> Result<Vec<EffectBindingContext>, EngineError> {
        let mut matches = Vec::new();
        for agents in candidates {
            if let Some(ctx) = self.evaluate_event(event_id, agents)? {
                matches.push(ctx);
            }
        }
        Ok(matches)
    }

    /// Find every way to fill the event's unbound roles with registered
    /// agents such that the preconditions hold.
    ///
    /// Roles in `fixed` keep their agent. Each agent fills at most one role.
    /// Results are in agent-ID order.
    pub fn find_bindings(
        &self,
        event_id: &EventId,
        fixed: &BTreeMap<String, AgentId>,
    ) -> Result<Vec<EffectBindingContext>, EngineError> {
        let event = self.event(event_id)?;
        let mut matches = Vec::new();
        let mut assignment = Vec::with_capacity(event.roles.len());
        self.extend_assignment(event, fixed, &mut assignment, &mut matches)?;
        Ok(matches)
    }

    fn extend_assignment(
        &self,
        event: &SocialEvent,
        fixed: &BTreeMap<String, AgentId>,
        assignment: &mut Vec<AgentId>,
        matches: &mut Vec<EffectBindingContext>,
    ) -> Result<(), EngineError> {
        let Some(role) = event.roles.get(assignment.len()) else {
            if let Some(ctx) = self.evaluate_event(&event.id, assignment.as_slice())? {
                matches.push(ctx);
            }
            return Ok(());
        };

        if let Some(agent) = fixed.get(role) {
            if assignment.contains(agent) {
                return Ok(());
            }
            assignment.push(agent.clone());
            self.extend_assignment(event, fixed, assignment, matches)?;
            assignment.pop();
            return Ok(());
        }

        for candidate in self.agents.keys() {
            if assignment.contains(candidate) || fixed.values().any(|a| a == candidate) {
                continue;
            }
            assignment.push(candidate.clone());
            self.extend_assignment(event, fixed, assignment, matches)?;
            assignment.pop();
        }
        Ok(())
    }

    /// Fire an event for the given agents, positionally bound to its roles.
    ///
    /// Failing preconditions are a normal outcome, not an error. See
    /// [`crate::effect`] for how rejected effects and lookup failures are
    /// handled.
    pub fn fire_event(
        &mut self,
        event_id: &EventId,
        agents: &[AgentId],
    ) -> Result<EventOutcome, EngineError> {
        self.fire_event_at_depth(event_id, agents, 0)
    }

    pub(crate) fn fire_event_at_depth(
        &mut self,
        event_id: &EventId,
        agents: &[AgentId],
        depth: usize,
    ) -> Result<EventOutcome, EngineError> {
        if depth > self.config.max_event_depth {
            return Err(EngineError::EventDepthExceeded {
                event: event_id.clone(),
                max_depth: self.config.max_event_depth,
            });
        }

        let event = Arc::clone(self.event(event_id)?);
        let Some(context) = self.evaluate_event(event_id, agents)? else {
            info!(event = %event_id, ?agents, "Social event preconditions failed");
            return Ok(EventOutcome::PreconditionsFailed);
        };

        let effect_results = self.apply_effects(&event.effects, &context, depth)?;

        let mut responses = Vec::new();
        for (index, response) in event.responses.iter().enumerate() {
            if !self.check_preconditions(&response.preconditions, &context) {
                continue;
            }
            let description = response.description.as_deref().map(|template| {
                EffectBindingContext::new(template, context.bindings().clone())
                    .description()
                    .to_owned()
            });
            let effect_results = self.apply_effects(&response.effects, &context, depth)?;
            responses.push(FiredResponse {
                index,
                description,
                effect_results,
            });
        }

        info!(
            event = %event_id,
            description = context.description(),
            responses = responses.len(),
            "Social event fired"
        );
        Ok(EventOutcome::Fired(FiredEvent {
            event: event_id.clone(),
            context,
            effect_results,
            responses,
        }))
    }

    fn apply_effects(
        &mut self,
        effects: &[Effect],
        ctx: &EffectBindingContext,
        depth: usize,
    ) -> Result<Vec<EffectResult>, EngineError> {
        let mut results = Vec::with_capacity(effects.len());
        for effect in effects {
            let result = effect.apply_at_depth(ctx, self, depth)?;
            debug!(%effect, ?result, "Effect executed");
            results.push(result);
        }
        Ok(results)
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Advance every trait duration by one tick.
    ///
    /// Expired traits are removed from agents and relationships first; their
    /// detach effects then run in expiration order. A lookup failure in one
    /// trait's detach effects is recorded on its [`TraitExpiration`] and
    /// does not stop the others. This is the only place durations advance;
    /// the caller owns the tick schedule.
    pub fn tick(&mut self) -> Vec<TraitExpiration> {
        let mut expirations = Vec::new();
        for node in self.agents.values_mut() {
            let owner = node.id().clone();
            for definition in node.tick() {
                expirations.push(TraitExpiration {
                    owner: owner.clone(),
                    target: None,
                    definition,
                    detach_error: None,
                });
            }
            for edge in node.relationships_mut() {
                for definition in edge.tick() {
                    expirations.push(TraitExpiration {
                        owner: owner.clone(),
                        target: Some(edge.target().clone()),
                        definition,
                        detach_error: None,
                    });
                }
            }
        }

        for expiration in &mut expirations {
            debug!(
                owner = %expiration.owner,
                target = ?expiration.target,
                trait_id = %expiration.definition.id,
                "Trait expired"
            );
            let result = self.run_detach_effects(expiration);
            if let Err(error) = &result {
                warn!(
                    owner = %expiration.owner,
                    target = ?expiration.target,
                    trait_id = %expiration.definition.id,
                    %error,
                    "Detach effects of expired trait failed"
                );
            }
            expiration.detach_error = result.err();
        }
        expirations
    }

    fn run_detach_effects(&mut self, expiration: &TraitExpiration) -> Result<(), EngineError> {
        let definition = &expiration.definition;
        if definition.on_remove.is_empty() {
            return Ok(());
        }
        let nested = self.trait_effect_depth(definition, &definition.on_remove, 0)?;
        let mut bindings = BTreeMap::from([(String::from(OWNER_ROLE), expiration.owner.clone())]);
        if let Some(target) = &expiration.target {
            bindings.insert(String::from(TARGET_ROLE), target.clone());
        }
        let ctx = EffectBindingContext::new(&definition.description, bindings);
        self.apply_effects(&definition.on_remove, &ctx, nested)?;
        Ok(())
    }
}
