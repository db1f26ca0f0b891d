//! Building engine definitions from authoring records and applying a
//! content file to a [`SocialEngineState`].
//!
//! Loading is two-phase. Every trait and event is built and validated
//! first (effects parsed, preconditions checked, roles verified, duplicate
//! IDs rejected); only then is anything registered. Agents and
//! relationships are applied last, in file order.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use rust_decimal::Decimal;
use tdrs_core::{
    Effect, EventResponse, OWNER_ROLE, SocialEngineState, SocialEvent, Stat, StatCollection,
    TARGET_ROLE, Trait,
};
use tdrs_types::{AgentId, EventId, TraitDuration, TraitId};
use tracing::{debug, info, warn};

use crate::clauses::ClauseEvaluator;
use crate::error::LoaderError;
use crate::parse::{self, duration_from_ticks, parse_effects};
use crate::records::{
    AgentRecord, ContentFile, EventResponseRecord, RelationshipRecord, SocialEventRecord,
    TraitRecord,
};

/// Counts of what a content file added to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Trait definitions registered.
    pub traits: usize,
    /// Event definitions registered.
    pub events: usize,
    /// Agents registered.
    pub agents: usize,
    /// Relationships created or updated.
    pub relationships: usize,
}

// ---------------------------------------------------------------------------
// Definitions
// ---------------------------------------------------------------------------

/// Build a [`Trait`] from its record.
///
/// # Errors
///
/// [`LoaderError::InvalidDuration`] for a bad duration,
/// [`LoaderError::Effect`] for an unparseable attach or detach effect, and
/// [`LoaderError::UnknownRole`] if an effect uses a role other than
/// `?owner` or `?target`.
pub fn build_trait(record: &TraitRecord) -> Result<Trait, LoaderError> {
    let duration = match record.duration {
        None => TraitDuration::default(),
        Some(value) => duration_from_ticks(value).ok_or_else(|| LoaderError::InvalidDuration {
            trait_id: record.id.clone(),
            value,
        })?,
    };
    let on_add = parse_effects(&record.on_add)?;
    let on_remove = parse_effects(&record.on_remove)?;

    let bound: BTreeSet<&str> = BTreeSet::from([OWNER_ROLE, TARGET_ROLE]);
    let owner = format!("trait {}", record.id);
    check_roles(&owner, &bound, &on_add)?;
    check_roles(&owner, &bound, &on_remove)?;

    Ok(Trait {
        id: TraitId::new(record.id.as_str()),
        display_name: record.display_name.clone().unwrap_or_else(|| record.id.clone()),
        description: record.description.clone(),
        conflicts: record
            .conflicts_with
            .iter()
            .map(|id| TraitId::new(id.as_str()))
            .collect(),
        modifiers: record.modifiers.clone(),
        duration,
        on_add,
        on_remove,
    })
}

/// Build a [`SocialEvent`] from its record.
///
/// # Errors
///
/// [`LoaderError::Effect`] or [`LoaderError::Clause`] for unparseable text,
/// and [`LoaderError::UnknownRole`] if a role is malformed, repeated, or
/// used by an effect without being declared.
pub fn build_event(record: &SocialEventRecord) -> Result<SocialEvent, LoaderError> {
    let owner = format!("event {}", record.id);
    let mut bound = BTreeSet::new();
    for role in &record.roles {
        if parse::role(role).is_err() || !bound.insert(role.as_str()) {
            return Err(LoaderError::UnknownRole {
                owner,
                role: role.clone(),
            });
        }
    }

    ClauseEvaluator::validate(&record.preconditions)?;
    let effects = parse_effects(&record.effects)?;
    check_roles(&owner, &bound, &effects)?;

    let responses = record
        .responses
        .iter()
        .map(|response| build_response(&owner, &bound, response))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SocialEvent {
        id: EventId::new(record.id.as_str()),
        roles: record.roles.clone(),
        description: record.description.clone(),
        preconditions: record.preconditions.clone(),
        effects,
        responses,
    })
}

fn build_response(
    owner: &str,
    bound: &BTreeSet<&str>,
    record: &EventResponseRecord,
) -> Result<EventResponse, LoaderError> {
    ClauseEvaluator::validate(&record.preconditions)?;
    let effects = parse_effects(&record.effects)?;
    check_roles(owner, bound, &effects)?;
    Ok(EventResponse {
        preconditions: record.preconditions.clone(),
        effects,
        description: record.description.clone(),
    })
}

fn check_roles(owner: &str, bound: &BTreeSet<&str>, effects: &[Effect]) -> Result<(), LoaderError> {
    for effect in effects {
        if let Some(role) = effect_roles(effect)
            .into_iter()
            .find(|role| !bound.contains(role))
        {
            return Err(LoaderError::UnknownRole {
                owner: owner.to_owned(),
                role: role.to_owned(),
            });
        }
    }
    Ok(())
}

fn effect_roles(effect: &Effect) -> Vec<&str> {
    match effect {
        Effect::AddAgentTrait { agent, .. }
        | Effect::RemoveAgentTrait { agent, .. }
        | Effect::AdjustAgentStat { agent, .. } => vec![agent.as_str()],
        Effect::AddRelationshipTrait { owner, target, .. }
        | Effect::RemoveRelationshipTrait { owner, target, .. }
        | Effect::AdjustRelationshipStat { owner, target, .. } => {
            vec![owner.as_str(), target.as_str()]
        }
        Effect::TriggerEvent { roles, .. } => roles.iter().map(String::as_str).collect(),
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read a content file and apply it to the engine.
///
/// # Errors
///
/// See [`ContentFile::from_file`] and [`load_content`].
pub fn load_file(path: &Path, state: &mut SocialEngineState) -> Result<LoadSummary, LoaderError> {
    let content = ContentFile::from_file(path)?;
    let summary = load_content(&content, state)?;
    info!(path = %path.display(), ?summary, "Content file loaded");
    Ok(summary)
}

/// Apply parsed content to the engine.
///
/// Definitions are validated before any is registered, so a bad trait or
/// event leaves the engine untouched. Agent and relationship failures are
/// reported as they happen; earlier entries stay applied.
///
/// # Errors
///
/// Any definition error from [`build_trait`] or [`build_event`],
/// [`LoaderError::Duplicate`] for an ID that is repeated or already
/// registered, and [`LoaderError::Engine`] for unknown agents or traits
/// referenced by the agent and relationship sections.
pub fn load_content(
    content: &ContentFile,
    state: &mut SocialEngineState,
) -> Result<LoadSummary, LoaderError> {
    let traits = content
        .traits
        .iter()
        .map(build_trait)
        .collect::<Result<Vec<_>, _>>()?;
    let events = content
        .events
        .iter()
        .map(build_event)
        .collect::<Result<Vec<_>, _>>()?;

    check_unique("trait", traits.iter().map(|t| t.id.as_str()), |id| {
        state.trait_def(&TraitId::new(id)).is_ok()
    })?;
    check_unique("event", events.iter().map(|e| e.id.as_str()), |id| {
        state.event(&EventId::new(id)).is_ok()
    })?;
    check_unique("agent", content.agents.iter().map(|a| a.id.as_str()), |id| {
        state.has_agent(&AgentId::new(id))
    })?;

    let mut summary = LoadSummary::default();
    for definition in traits {
        debug!(trait_id = %definition.id, "Registering trait");
        state.register_trait(definition);
        summary.traits = summary.traits.saturating_add(1);
    }
    for definition in events {
        debug!(event = %definition.id, "Registering event");
        state.register_event(definition);
        summary.events = summary.events.saturating_add(1);
    }
    for record in &content.agents {
        apply_agent(record, state)?;
        summary.agents = summary.agents.saturating_add(1);
    }
    for record in &content.relationships {
        apply_relationship(record, state)?;
        summary.relationships = summary.relationships.saturating_add(1);
    }
    Ok(summary)
}

fn check_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
    registered: impl Fn(&str) -> bool,
) -> Result<(), LoaderError> {
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id) || registered(id) {
            return Err(LoaderError::Duplicate {
                kind,
                id: id.to_owned(),
            });
        }
    }
    Ok(())
}

fn apply_agent(record: &AgentRecord, state: &mut SocialEngineState) -> Result<(), LoaderError> {
    let traits: Vec<TraitId> = record.traits.iter().map(|t| TraitId::new(t.as_str())).collect();
    state.register_agent(AgentId::new(record.id.as_str()), &traits, &record.stats)?;
    Ok(())
}

fn apply_relationship(
    record: &RelationshipRecord,
    state: &mut SocialEngineState,
) -> Result<(), LoaderError> {
    let owner = AgentId::new(record.owner.as_str());
    let target = AgentId::new(record.target.as_str());

    let edge = state.get_or_create_relationship(&owner, &target)?;
    apply_stats(edge.stats_mut(), &record.stats);

    for trait_id in &record.traits {
        let trait_id = TraitId::new(trait_id.as_str());
        if !state.add_relationship_trait(&owner, &target, &trait_id, None)? {
            warn!(%owner, %target, %trait_id, "Initial relationship trait rejected");
        }
    }
    Ok(())
}

fn apply_stats(stats: &mut StatCollection, values: &BTreeMap<String, Decimal>) {
    for (name, base) in values {
        // set_base only fails for a stat the schema did not create.
        if stats.set_base(name, *base).is_err() {
            stats.insert(Stat::new(name.clone(), *base));
        }
    }
}
