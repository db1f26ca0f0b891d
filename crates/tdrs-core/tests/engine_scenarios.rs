//! End-to-end scenarios for the social engine: registration, trait
//! conflicts, event firing, effect policy, speculative evaluation, and
//! duration expiry.

// Integration tests use unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(clippy::unwrap_used, clippy::too_many_lines)]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tdrs_core::{
    Effect, EffectBindingContext, EffectResult, EngineConfig, EngineError, EventOutcome,
    EventResponse, SocialEngineState, SocialEvent, Trait,
};
use tdrs_types::{
    AgentId, EventId, StatChange, StatModifier, StatSchemaEntry, TraitDuration, TraitId,
};

// =============================================================================
// Helpers
// =============================================================================

fn id(name: &str) -> AgentId {
    AgentId::new(name)
}

fn tid(name: &str) -> TraitId {
    TraitId::new(name)
}

fn eid(name: &str) -> EventId {
    EventId::new(name)
}

fn config() -> EngineConfig {
    EngineConfig {
        relationship_stats: vec![StatSchemaEntry::new("affinity", dec!(0))],
        ..EngineConfig::default()
    }
}

fn engine_with(agents: &[&str]) -> SocialEngineState {
    let mut state = SocialEngineState::new(config());
    for agent in agents {
        assert!(state.register_agent(id(agent), &[], &BTreeMap::new()).unwrap());
    }
    state
}

fn insult_event() -> SocialEvent {
    SocialEvent::new("Insult", ["?initiator", "?target"], "[initiator] insults [target]!")
        .with_precondition("always true")
        .with_effect(Effect::AdjustRelationshipStat {
            owner: String::from("?target"),
            target: String::from("?initiator"),
            stat: String::from("affinity"),
            delta: dec!(-10),
        })
}

fn affinity(state: &SocialEngineState, owner: &str, target: &str) -> Decimal {
    state
        .relationship(&id(owner), &id(target))
        .unwrap()
        .stats()
        .value("affinity")
        .unwrap()
}

fn agent_traits(state: &SocialEngineState, agent: &str) -> Vec<String> {
    state
        .agent(&id(agent))
        .unwrap()
        .traits()
        .trait_ids()
        .map(ToString::to_string)
        .collect()
}

// =============================================================================
// Registration and graph
// =============================================================================

#[test]
fn register_and_lookup_agents() {
    let mut state = engine_with(&["alice"]);
    assert!(!state.register_agent(id("alice"), &[], &BTreeMap::new()).unwrap());
    assert_eq!(
        state.register_agent(id(""), &[], &BTreeMap::new()).err(),
        Some(EngineError::EmptyAgentId)
    );
    assert_eq!(
        state.agent(&id("ghost")).err(),
        Some(EngineError::AgentNotFound(id("ghost")))
    );
    assert!(state.has_agent(&id("alice")));
}

#[test]
fn register_agent_with_initial_traits_and_stats() {
    let mut state = SocialEngineState::new(EngineConfig {
        agent_stats: vec![StatSchemaEntry::new("charm", dec!(10))],
        ..config()
    });
    state.register_trait(
        Trait::new("charismatic").with_modifier(StatModifier::additive("charm", dec!(5))),
    );

    let stats = BTreeMap::from([
        (String::from("charm"), dec!(20)),
        (String::from("wit"), dec!(3)),
    ]);
    assert!(state
        .register_agent(id("alice"), &[tid("charismatic")], &stats)
        .unwrap());

    let alice = state.agent(&id("alice")).unwrap();
    assert_eq!(alice.stats().value("charm").unwrap(), dec!(25));
    assert_eq!(alice.stats().value("wit").unwrap(), dec!(3));
    assert!(alice.traits().has_trait(&tid("charismatic")));
}

#[test]
fn register_agent_with_unknown_trait_creates_nothing() {
    let mut state = engine_with(&[]);
    let err = state
        .register_agent(id("alice"), &[tid("ghost")], &BTreeMap::new())
        .err();
    assert_eq!(err, Some(EngineError::TraitNotFound(tid("ghost"))));
    assert!(!state.has_agent(&id("alice")));
}

#[test]
fn relationships_require_distinct_registered_agents() {
    let mut state = engine_with(&["alice", "bob"]);

    assert_eq!(
        state.get_or_create_relationship(&id("alice"), &id("alice")).err(),
        Some(EngineError::SelfRelationship(id("alice")))
    );
    assert_eq!(
        state.get_or_create_relationship(&id("alice"), &id("ghost")).err(),
        Some(EngineError::AgentNotFound(id("ghost")))
    );
    assert_eq!(
        state.relationship(&id("alice"), &id("bob")).err(),
        Some(EngineError::RelationshipNotFound {
            owner: id("alice"),
            target: id("bob"),
        })
    );

    state
        .get_or_create_relationship(&id("alice"), &id("bob"))
        .unwrap()
        .stats_mut()
        .adjust_base("affinity", dec!(3));
    state
        .get_or_create_relationship(&id("alice"), &id("bob"))
        .unwrap();

    assert_eq!(affinity(&state, "alice", "bob"), dec!(3));
    assert_eq!(state.agent(&id("alice")).unwrap().relationships().count(), 1);
    // Edges are directed.
    assert!(state.relationship(&id("bob"), &id("alice")).is_err());
}

#[test]
fn duplicate_definitions_rejected() {
    let mut state = engine_with(&[]);
    assert!(state.register_trait(Trait::new("polite")));
    assert!(!state.register_trait(Trait::new("polite").with_conflicts(["rude"])));
    assert!(state.trait_def(&tid("polite")).unwrap().conflicts.is_empty());

    assert!(state.register_event(insult_event()));
    assert!(!state.register_event(insult_event()));
    assert_eq!(
        state.event(&eid("Praise")).err(),
        Some(EngineError::EventNotFound(eid("Praise")))
    );
}

// =============================================================================
// Traits
// =============================================================================

#[test]
fn polite_and_rude_scenario() {
    let mut state = engine_with(&["alice", "bob"]);
    state.register_trait(Trait::new("polite"));
    state.register_trait(Trait::new("rude").with_conflicts(["polite"]));

    let alice = id("alice");
    assert!(state.add_agent_trait(&alice, &tid("polite"), None).unwrap());
    assert!(!state.add_agent_trait(&alice, &tid("rude"), None).unwrap());
    assert_eq!(agent_traits(&state, "alice"), vec!["polite"]);

    assert!(state.remove_agent_trait(&alice, &tid("polite")).unwrap());
    assert!(state.add_agent_trait(&alice, &tid("rude"), None).unwrap());
    assert_eq!(agent_traits(&state, "alice"), vec!["rude"]);
}

#[test]
fn unknown_trait_is_lookup_failure_but_absent_removal_is_rejection() {
    let mut state = engine_with(&["alice"]);
    assert_eq!(
        state.add_agent_trait(&id("alice"), &tid("ghost"), None).err(),
        Some(EngineError::TraitNotFound(tid("ghost")))
    );
    assert!(!state.remove_agent_trait(&id("alice"), &tid("ghost")).unwrap());
}

#[test]
fn attach_and_detach_effects_use_holder_bindings() {
    let mut state = engine_with(&["alice"]);
    state.register_trait(
        Trait::new("inspired")
            .with_description("[owner] feels inspired")
            .with_on_add(Effect::AdjustAgentStat {
                agent: String::from("?owner"),
                stat: String::from("creativity"),
                delta: dec!(4),
            })
            .with_on_remove(Effect::AdjustAgentStat {
                agent: String::from("?owner"),
                stat: String::from("creativity"),
                delta: dec!(-1),
            }),
    );

    state.add_agent_trait(&id("alice"), &tid("inspired"), None).unwrap();
    let creativity = |s: &SocialEngineState| {
        s.agent(&id("alice")).unwrap().stats().value("creativity").unwrap()
    };
    assert_eq!(creativity(&state), dec!(4));

    state.remove_agent_trait(&id("alice"), &tid("inspired")).unwrap();
    assert_eq!(creativity(&state), dec!(3));
}

#[test]
fn relationship_trait_modifies_edge_stats() {
    let mut state = engine_with(&["alice", "bob"]);
    state.register_trait(
        Trait::new("friends").with_modifier(StatModifier::additive("affinity", dec!(15))),
    );

    assert!(state
        .add_relationship_trait(&id("alice"), &id("bob"), &tid("friends"), None)
        .unwrap());
    assert_eq!(affinity(&state, "alice", "bob"), dec!(15));

    assert!(state
        .remove_relationship_trait(&id("alice"), &id("bob"), &tid("friends"))
        .unwrap());
    assert_eq!(affinity(&state, "alice", "bob"), dec!(0));
    assert!(!state
        .remove_relationship_trait(&id("bob"), &id("alice"), &tid("friends"))
        .unwrap());
}

// =============================================================================
// Events
// =============================================================================

#[test]
fn insult_scenario_fires_repeatedly() {
    let mut state = engine_with(&["alice", "bob"]);
    state.register_event(insult_event());
    let agents = [id("alice"), id("bob")];

    let outcome = state.fire_event(&eid("Insult"), &agents).unwrap();
    let fired = outcome.fired().unwrap();
    assert_eq!(fired.description(), "alice insults bob!");
    assert_eq!(fired.effect_results, vec![EffectResult::Applied]);
    assert_eq!(affinity(&state, "bob", "alice"), dec!(-10));

    state.fire_event(&eid("Insult"), &agents).unwrap();
    assert_eq!(affinity(&state, "bob", "alice"), dec!(-20));
}

#[test]
fn fire_event_validates_agents_and_role_count() {
    let mut state = engine_with(&["alice", "bob"]);
    state.register_event(insult_event());

    assert_eq!(
        state.fire_event(&eid("Insult"), &[id("alice")]).err(),
        Some(EngineError::RoleCountMismatch {
            event: eid("Insult"),
            expected: 2,
            actual: 1,
        })
    );
    assert_eq!(
        state.fire_event(&eid("Insult"), &[id("alice"), id("ghost")]).err(),
        Some(EngineError::AgentNotFound(id("ghost")))
    );
    assert_eq!(
        state.fire_event(&eid("Shove"), &[id("alice"), id("bob")]).err(),
        Some(EngineError::EventNotFound(eid("Shove")))
    );
}

#[test]
fn failed_preconditions_execute_nothing() {
    let mut state = SocialEngineState::with_evaluator(
        config(),
        |_: &[String], _: &EffectBindingContext, _: &SocialEngineState| false,
    );
    for agent in ["alice", "bob"] {
        state.register_agent(id(agent), &[], &BTreeMap::new()).unwrap();
    }
    state.register_event(insult_event());

    let outcome = state.fire_event(&eid("Insult"), &[id("alice"), id("bob")]).unwrap();
    assert_eq!(outcome, EventOutcome::PreconditionsFailed);
    assert!(state.relationship(&id("bob"), &id("alice")).is_err());
}

#[test]
fn rejected_effect_does_not_stop_later_effects() {
    let mut state = engine_with(&["alice", "bob"]);
    state.register_trait(Trait::new("polite"));
    state.register_trait(Trait::new("rude").with_conflicts(["polite"]));
    state.add_agent_trait(&id("alice"), &tid("polite"), None).unwrap();

    state.register_event(
        SocialEvent::new("Sneer", ["?initiator", "?target"], "[initiator] sneers at [target]")
            .with_effect(Effect::AddAgentTrait {
                agent: String::from("?initiator"),
                trait_id: tid("rude"),
                duration: None,
            })
            .with_effect(Effect::AdjustRelationshipStat {
                owner: String::from("?target"),
                target: String::from("?initiator"),
                stat: String::from("affinity"),
                delta: dec!(-5),
            }),
    );

    let outcome = state.fire_event(&eid("Sneer"), &[id("alice"), id("bob")]).unwrap();
    assert_eq!(
        outcome.fired().unwrap().effect_results,
        vec![EffectResult::Rejected, EffectResult::Applied]
    );
    assert_eq!(agent_traits(&state, "alice"), vec!["polite"]);
    assert_eq!(affinity(&state, "bob", "alice"), dec!(-5));
}

#[test]
fn lookup_failure_aborts_without_rollback() {
    let mut state = engine_with(&["alice", "bob"]);
    state.register_event(
        SocialEvent::new("Gossip", ["?initiator", "?target"], "[initiator] gossips")
            .with_effect(Effect::AdjustAgentStat {
                agent: String::from("?initiator"),
                stat: String::from("notoriety"),
                delta: dec!(1),
            })
            .with_effect(Effect::AdjustAgentStat {
                agent: String::from("?audience"),
                stat: String::from("notoriety"),
                delta: dec!(1),
            })
            .with_effect(Effect::AdjustAgentStat {
                agent: String::from("?target"),
                stat: String::from("notoriety"),
                delta: dec!(1),
            }),
    );

    let err = state.fire_event(&eid("Gossip"), &[id("alice"), id("bob")]).err();
    assert_eq!(err, Some(EngineError::UnboundRole(String::from("?audience"))));

    // The first effect stays applied; the third never ran.
    let alice = state.agent(&id("alice")).unwrap();
    assert_eq!(alice.stats().value("notoriety").unwrap(), dec!(1));
    let bob = state.agent(&id("bob")).unwrap();
    assert!(bob.stats().get("notoriety").is_err());
}

#[test]
fn responses_run_when_their_preconditions_hold() {
    let evaluator = |preconditions: &[String], _: &EffectBindingContext, _: &SocialEngineState| {
        preconditions.iter().all(|p| p != "never")
    };
    let mut state = SocialEngineState::with_evaluator(config(), evaluator);
    for agent in ["alice", "bob"] {
        state.register_agent(id(agent), &[], &BTreeMap::new()).unwrap();
    }
    state.register_event(
        insult_event()
            .with_response(EventResponse {
                preconditions: vec![String::from("never")],
                effects: vec![Effect::AdjustAgentStat {
                    agent: String::from("?target"),
                    stat: String::from("anger"),
                    delta: dec!(100),
                }],
                description: None,
            })
            .with_response(EventResponse {
                preconditions: Vec::new(),
                effects: vec![Effect::AdjustAgentStat {
                    agent: String::from("?target"),
                    stat: String::from("anger"),
                    delta: dec!(2),
                }],
                description: Some(String::from("[target] fumes at [initiator]")),
            }),
    );

    let outcome = state.fire_event(&eid("Insult"), &[id("alice"), id("bob")]).unwrap();
    let fired = outcome.fired().unwrap();
    assert_eq!(fired.responses.len(), 1);
    let response = fired.responses.first().unwrap();
    assert_eq!(response.index, 1);
    assert_eq!(response.description.as_deref(), Some("bob fumes at alice"));

    let bob = state.agent(&id("bob")).unwrap();
    assert_eq!(bob.stats().value("anger").unwrap(), dec!(2));
}

#[test]
fn nested_events_fire_and_depth_is_limited() {
    let mut state = SocialEngineState::new(EngineConfig {
        max_event_depth: 1,
        ..config()
    });
    for agent in ["alice", "bob"] {
        state.register_agent(id(agent), &[], &BTreeMap::new()).unwrap();
    }
    state.register_event(insult_event());
    state.register_event(
        SocialEvent::new("Argue", ["?a", "?b"], "[a] argues with [b]").with_effect(
            Effect::TriggerEvent {
                event: eid("Insult"),
                roles: vec![String::from("?b"), String::from("?a")],
            },
        ),
    );
    state.register_event(
        SocialEvent::new("Loop", ["?a", "?b"], "[a] loops").with_effect(Effect::TriggerEvent {
            event: eid("Loop"),
            roles: vec![String::from("?a"), String::from("?b")],
        }),
    );

    state.fire_event(&eid("Argue"), &[id("alice"), id("bob")]).unwrap();
    // Roles swapped: bob insulted alice.
    assert_eq!(affinity(&state, "alice", "bob"), dec!(-10));

    let err = state.fire_event(&eid("Loop"), &[id("alice"), id("bob")]).err();
    assert_eq!(
        err,
        Some(EngineError::EventDepthExceeded {
            event: eid("Loop"),
            max_depth: 1,
        })
    );
}

#[test]
fn self_perpetuating_trait_effects_hit_depth_limit() {
    let mut state = SocialEngineState::new(EngineConfig {
        max_event_depth: 3,
        ..config()
    });
    state.register_agent(id("alice"), &[], &BTreeMap::new()).unwrap();
    state.register_trait(
        Trait::new("flip")
            .with_on_add(Effect::RemoveAgentTrait {
                agent: String::from("?owner"),
                trait_id: tid("flip"),
            })
            .with_on_remove(Effect::AddAgentTrait {
                agent: String::from("?owner"),
                trait_id: tid("flip"),
                duration: None,
            }),
    );

    let err = state.add_agent_trait(&id("alice"), &tid("flip"), None).err();
    assert_eq!(
        err,
        Some(EngineError::TraitEffectDepthExceeded {
            trait_id: tid("flip"),
            max_depth: 3,
        })
    );
    // add, remove, add; the next removal is refused before it happens.
    assert_eq!(agent_traits(&state, "alice"), vec!["flip"]);
}

#[test]
fn notifications_follow_mutation_order_during_firing() {
    let mut state = engine_with(&["alice", "bob"]);
    state.register_trait(Trait::new("offended"));
    state.register_event(
        insult_event().with_effect(Effect::AddAgentTrait {
            agent: String::from("?target"),
            trait_id: tid("offended"),
            duration: Some(TraitDuration::Ticks(2)),
        }),
    );

    let log = Rc::new(RefCell::new(Vec::new()));
    state
        .get_or_create_relationship(&id("bob"), &id("alice"))
        .unwrap()
        .on_stat_changed({
            let log = Rc::clone(&log);
            move |change: &StatChange| log.borrow_mut().push(format!("{}={}", change.name, change.value))
        });
    state.agent_mut(&id("bob")).unwrap().on_trait_added({
        let log = Rc::clone(&log);
        move |trait_id: &TraitId| log.borrow_mut().push(format!("+{trait_id}"))
    });

    state.fire_event(&eid("Insult"), &[id("alice"), id("bob")]).unwrap();
    assert_eq!(*log.borrow(), vec!["affinity=-10", "+offended"]);
}

// =============================================================================
// Speculative evaluation
// =============================================================================

#[test]
fn speculative_evaluation_does_not_mutate() {
    let evaluator = |_: &[String], ctx: &EffectBindingContext, state: &SocialEngineState| {
        ctx.agent("?target")
            .ok()
            .and_then(|target| state.agent(target).ok())
            .is_some_and(|target| !target.traits().has_trait(&TraitId::new("guarded")))
    };
    let mut state = SocialEngineState::with_evaluator(config(), evaluator);
    state.register_trait(Trait::new("guarded"));
    for agent in ["alice", "bob", "carol"] {
        state.register_agent(id(agent), &[], &BTreeMap::new()).unwrap();
    }
    state.add_agent_trait(&id("carol"), &tid("guarded"), None).unwrap();
    state.register_event(insult_event());

    let candidates = vec![
        vec![id("alice"), id("bob")],
        vec![id("alice"), id("carol")],
        vec![id("bob"), id("alice")],
    ];
    let matches = state.matching_assignments(&eid("Insult"), &candidates).unwrap();
    let descriptions: Vec<&str> = matches.iter().map(EffectBindingContext::description).collect();
    assert_eq!(descriptions, vec!["alice insults bob!", "bob insults alice!"]);

    // Nothing fired, so no relationship was created.
    assert!(state.relationship(&id("bob"), &id("alice")).is_err());
    assert!(state.relationship(&id("alice"), &id("bob")).is_err());
}

#[test]
fn find_bindings_enumerates_unbound_roles() {
    let mut state = engine_with(&["alice", "bob", "carol"]);
    state.register_event(insult_event());

    let fixed = BTreeMap::from([(String::from("?initiator"), id("alice"))]);
    let found = state.find_bindings(&eid("Insult"), &fixed).unwrap();
    let targets: Vec<&str> = found
        .iter()
        .map(|ctx| ctx.agent("?target").unwrap().as_str())
        .collect();
    assert_eq!(targets, vec!["bob", "carol"]);

    let all = state.find_bindings(&eid("Insult"), &BTreeMap::new()).unwrap();
    assert_eq!(all.len(), 6);
}

#[test]
fn with_bindings_supports_speculative_role_swaps() {
    let mut state = engine_with(&["alice", "bob", "carol"]);
    state.register_event(insult_event());

    let base = state
        .evaluate_event(&eid("Insult"), &[id("alice"), id("bob")])
        .unwrap()
        .unwrap();
    let swapped = base.with_bindings([("?target", id("carol"))]);

    assert_eq!(base.agent("?target").unwrap(), &id("bob"));
    assert_eq!(swapped.agent("?target").unwrap(), &id("carol"));
    assert!(state.check_preconditions(&[], &swapped));
    assert_eq!(swapped.description(), base.description());
}

// =============================================================================
// Time
// =============================================================================

#[test]
fn tick_expires_traits_and_runs_detach_effects() {
    let mut state = engine_with(&["alice", "bob"]);
    state.register_trait(
        Trait::new("angry")
            .with_conflicts(["calm"])
            .with_duration(TraitDuration::Ticks(2))
            .with_modifier(StatModifier::additive("affinity", dec!(-30)))
            .with_on_remove(Effect::AdjustRelationshipStat {
                owner: String::from("?owner"),
                target: String::from("?target"),
                stat: String::from("affinity"),
                delta: dec!(5),
            }),
    );
    state.register_trait(Trait::new("calm"));

    state
        .add_relationship_trait(&id("alice"), &id("bob"), &tid("angry"), None)
        .unwrap();
    assert_eq!(affinity(&state, "alice", "bob"), dec!(-30));

    assert!(state.tick().is_empty());
    let expired = state.tick();
    assert_eq!(expired.len(), 1);
    let expiration = expired.first().unwrap();
    assert_eq!(expiration.owner, id("alice"));
    assert_eq!(expiration.target, Some(id("bob")));
    assert_eq!(expiration.definition.id, tid("angry"));
    assert_eq!(expiration.detach_error, None);

    // Modifier withdrawn, detach effect applied.
    assert_eq!(affinity(&state, "alice", "bob"), dec!(5));
    assert!(state
        .add_relationship_trait(&id("alice"), &id("bob"), &tid("calm"), None)
        .unwrap());
}

#[test]
fn failing_detach_effect_does_not_skip_other_expirations() {
    let mut state = engine_with(&["alice"]);
    state.register_trait(Trait::new("marker"));
    state.register_trait(
        Trait::new("a_bad")
            .with_duration(TraitDuration::Ticks(1))
            .with_on_remove(Effect::AddAgentTrait {
                agent: String::from("?owner"),
                trait_id: tid("ghost"),
                duration: None,
            }),
    );
    state.register_trait(
        Trait::new("z_good")
            .with_duration(TraitDuration::Ticks(1))
            .with_on_remove(Effect::AddAgentTrait {
                agent: String::from("?owner"),
                trait_id: tid("marker"),
                duration: None,
            }),
    );
    for name in ["a_bad", "z_good"] {
        assert!(state.add_agent_trait(&id("alice"), &tid(name), None).unwrap());
    }

    let expired = state.tick();
    let outcomes: Vec<(String, Option<EngineError>)> = expired
        .iter()
        .map(|e| (e.definition.id.to_string(), e.detach_error.clone()))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            (
                String::from("a_bad"),
                Some(EngineError::TraitNotFound(tid("ghost")))
            ),
            (String::from("z_good"), None),
        ]
    );
    assert_eq!(agent_traits(&state, "alice"), vec!["marker"]);
}

#[test]
fn explicit_duration_overrides_default() {
    let mut state = engine_with(&["alice"]);
    state.register_trait(Trait::new("dazed").with_duration(TraitDuration::Ticks(5)));
    state
        .add_agent_trait(&id("alice"), &tid("dazed"), Some(TraitDuration::Ticks(1)))
        .unwrap();

    let expired = state.tick();
    assert_eq!(expired.len(), 1);
    assert!(agent_traits(&state, "alice").is_empty());
}
