//! Effect text parsing into typed [`Effect`] values.
//!
//! Authored effects are a verb followed by whitespace-separated arguments:
//!
//! ```text
//! AddAgentTrait ?owner polite 3
//! RemoveAgentTrait ?owner polite
//! AddRelationshipTrait ?owner ?target friends
//! RemoveRelationshipTrait ?owner ?target friends
//! AdjustAgentStat ?initiator confidence 2
//! AdjustRelationshipStat ?target ?initiator affinity -10
//! TriggerEvent Apologize ?initiator ?target
//! ```
//!
//! Role arguments must start with `?`. Verbs are matched
//! case-insensitively and may use `snake_case`. Trait durations are a tick
//! count or `-1` for unlimited.

use rust_decimal::Decimal;
use tdrs_core::Effect;
use tdrs_types::{EventId, TraitDuration, TraitId};

use crate::error::LoaderError;

/// Parse one authored effect.
///
/// # Errors
///
/// Returns [`LoaderError::Effect`] for an unknown verb, a wrong argument
/// count, a role without the `?` prefix, or an invalid number.
pub fn parse_effect(text: &str) -> Result<Effect, LoaderError> {
    let invalid = |reason: String| LoaderError::Effect {
        text: text.to_owned(),
        reason,
    };

    let mut tokens = text.split_whitespace();
    let Some(verb) = tokens.next() else {
        return Err(invalid(String::from("empty effect")));
    };
    let args: Vec<&str> = tokens.collect();

    match normalize_verb(verb).as_str() {
        "addagenttrait" => match args.as_slice() {
            [agent, trait_id] => Ok(Effect::AddAgentTrait {
                agent: role(agent).map_err(invalid)?,
                trait_id: TraitId::new(*trait_id),
                duration: None,
            }),
            [agent, trait_id, duration] => Ok(Effect::AddAgentTrait {
                agent: role(agent).map_err(invalid)?,
                trait_id: TraitId::new(*trait_id),
                duration: Some(duration_arg(duration).map_err(invalid)?),
            }),
            _ => Err(invalid(usage("AddAgentTrait <role> <trait> [duration]"))),
        },
        "removeagenttrait" => match args.as_slice() {
            [agent, trait_id] => Ok(Effect::RemoveAgentTrait {
                agent: role(agent).map_err(invalid)?,
                trait_id: TraitId::new(*trait_id),
            }),
            _ => Err(invalid(usage("RemoveAgentTrait <role> <trait>"))),
        },
        "addrelationshiptrait" => match args.as_slice() {
            [owner, target, trait_id] => Ok(Effect::AddRelationshipTrait {
                owner: role(owner).map_err(invalid)?,
                target: role(target).map_err(invalid)?,
                trait_id: TraitId::new(*trait_id),
                duration: None,
            }),
            [owner, target, trait_id, duration] => Ok(Effect::AddRelationshipTrait {
                owner: role(owner).map_err(invalid)?,
                target: role(target).map_err(invalid)?,
                trait_id: TraitId::new(*trait_id),
                duration: Some(duration_arg(duration).map_err(invalid)?),
            }),
            _ => Err(invalid(usage(
                "AddRelationshipTrait <owner> <target> <trait> [duration]",
            ))),
        },
        "removerelationshiptrait" => match args.as_slice() {
            [owner, target, trait_id] => Ok(Effect::RemoveRelationshipTrait {
                owner: role(owner).map_err(invalid)?,
                target: role(target).map_err(invalid)?,
                trait_id: TraitId::new(*trait_id),
            }),
            _ => Err(invalid(usage(
                "RemoveRelationshipTrait <owner> <target> <trait>",
            ))),
        },
        "adjustagentstat" => match args.as_slice() {
            [agent, stat, delta] => Ok(Effect::AdjustAgentStat {
                agent: role(agent).map_err(invalid)?,
                stat: (*stat).to_owned(),
                delta: decimal(delta).map_err(invalid)?,
            }),
            _ => Err(invalid(usage("AdjustAgentStat <role> <stat> <delta>"))),
        },
        "adjustrelationshipstat" => match args.as_slice() {
            [owner, target, stat, delta] => Ok(Effect::AdjustRelationshipStat {
                owner: role(owner).map_err(invalid)?,
                target: role(target).map_err(invalid)?,
                stat: (*stat).to_owned(),
                delta: decimal(delta).map_err(invalid)?,
            }),
            _ => Err(invalid(usage(
                "AdjustRelationshipStat <owner> <target> <stat> <delta>",
            ))),
        },
        "triggerevent" => match args.split_first() {
            Some((event, roles)) => Ok(Effect::TriggerEvent {
                event: EventId::new(*event),
                roles: roles
                    .iter()
                    .map(|r| role(r))
                    .collect::<Result<_, _>>()
                    .map_err(invalid)?,
            }),
            None => Err(invalid(usage("TriggerEvent <event> [role...]"))),
        },
        _ => Err(invalid(format!("unknown effect verb: {verb}"))),
    }
}

/// Parse a list of authored effects, stopping at the first invalid one.
///
/// # Errors
///
/// Returns the [`LoaderError::Effect`] of the first invalid entry.
pub fn parse_effects(texts: &[String]) -> Result<Vec<Effect>, LoaderError> {
    texts.iter().map(|text| parse_effect(text)).collect()
}

/// Convert an authored duration to a [`TraitDuration`].
///
/// `-1` is unlimited; any other negative value, or a count beyond `u32`,
/// is `None`.
pub fn duration_from_ticks(value: i64) -> Option<TraitDuration> {
    if value == -1 {
        return Some(TraitDuration::Unlimited);
    }
    u32::try_from(value).ok().map(TraitDuration::Ticks)
}

// ---------------------------------------------------------------------------
// Argument helpers shared with the clause parser
// ---------------------------------------------------------------------------

pub(crate) fn normalize_verb(verb: &str) -> String {
    verb.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

pub(crate) fn role(arg: &str) -> Result<String, String> {
    if arg.len() > 1 && arg.starts_with('?') {
        Ok(arg.to_owned())
    } else {
        Err(format!("expected a role like ?target, found {arg}"))
    }
}

pub(crate) fn decimal(arg: &str) -> Result<Decimal, String> {
    arg.parse::<Decimal>()
        .map_err(|e| format!("invalid number {arg}: {e}"))
}

fn duration_arg(arg: &str) -> Result<TraitDuration, String> {
    arg.parse::<i64>()
        .ok()
        .and_then(duration_from_ticks)
        .ok_or_else(|| format!("invalid duration {arg}; expected ticks or -1"))
}

fn usage(form: &str) -> String {
    format!("expected {form}")
}
