//! Role bindings and description templating for one effect instantiation.
//!
//! An [`EffectBindingContext`] maps role placeholders (`?initiator`) to
//! concrete agent IDs and carries a description with template placeholders
//! (`[initiator]`) already substituted. Contexts are values: extending one
//! with [`with_bindings`](EffectBindingContext::with_bindings) produces a
//! new context and leaves the original untouched.
//!
//! Only the constructors substitute the template. Substitution is a single
//! left-to-right pass, so an agent ID that happens to look like a
//! placeholder is never substituted again.

use std::collections::BTreeMap;

use tdrs_types::AgentId;
use tracing::warn;

use crate::agent::AgentNode;
use crate::error::EngineError;
use crate::event::SocialEvent;
use crate::relationship::RelationshipEdge;

/// Role bound to the holder in entity-scoped contexts.
pub const OWNER_ROLE: &str = "?owner";

/// Role bound to the edge target in relationship-scoped contexts.
pub const TARGET_ROLE: &str = "?target";

/// Bindings and resolved description for one event or effect occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectBindingContext {
    description: String,
    bindings: BTreeMap<String, AgentId>,
    /// Template placeholders that had no binding at substitution time.
    unresolved: Vec<String>,
}

impl EffectBindingContext {
    /// Bind an event's roles positionally to `agents`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RoleCountMismatch`] if the number of agents
    /// differs from the number of roles.
    pub fn for_event(event: &SocialEvent, agents: &[AgentId]) -> Result<Self, EngineError> {
        if event.roles.len() != agents.len() {
            return Err(EngineError::RoleCountMismatch {
                event: event.id.clone(),
                expected: event.roles.len(),
                actual: agents.len(),
            });
        }

        let bindings = event
            .roles
            .iter()
            .cloned()
            .zip(agents.iter().cloned())
            .collect();
        Ok(Self::new(&event.description, bindings))
    }

    /// Context for an agent-scoped template; binds `?owner`.
    pub fn for_agent(agent: &AgentNode, template: &str) -> Self {
        let bindings = BTreeMap::from([(String::from(OWNER_ROLE), agent.id().clone())]);
        Self::new(template, bindings)
    }

    /// Context for a relationship-scoped template; binds `?owner` and
    /// `?target`.
    pub fn for_relationship(relationship: &RelationshipEdge, template: &str) -> Self {
        let bindings = BTreeMap::from([
            (String::from(OWNER_ROLE), relationship.owner().clone()),
            (String::from(TARGET_ROLE), relationship.target().clone()),
        ]);
        Self::new(template, bindings)
    }

    /// General constructor from a template and an explicit binding map.
    pub fn new(template: &str, bindings: BTreeMap<String, AgentId>) -> Self {
        let (description, unresolved) = substitute(template, &bindings);
        if !unresolved.is_empty() {
            warn!(
                template,
                ?unresolved,
                "description template references unbound placeholders"
            );
        }
        Self {
            description,
            bindings,
            unresolved,
        }
    }

    /// Copy this context with `extra` bindings added or overwritten.
    ///
    /// The description is carried forward as-is; it is not re-templated.
    #[must_use]
    pub fn with_bindings<I, K>(&self, extra: I) -> Self
    where
        I: IntoIterator<Item = (K, AgentId)>,
        K: Into<String>,
    {
        let mut updated = self.clone();
        for (role, agent) in extra {
            updated.bindings.insert(role.into(), agent);
        }
        updated
    }

    /// The substituted description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Role placeholder to agent ID bindings.
    pub const fn bindings(&self) -> &BTreeMap<String, AgentId> {
        &self.bindings
    }

    /// Resolve a role to its bound agent.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnboundRole`] if the role has no binding.
    pub fn agent(&self, role: &str) -> Result<&AgentId, EngineError> {
        self.bindings
            .get(role)
            .ok_or_else(|| EngineError::UnboundRole(String::from(role)))
    }

    /// Placeholders left in the description because nothing was bound to
    /// them. Non-empty means the authored template has an error.
    pub fn unresolved_placeholders(&self) -> &[String] {
        &self.unresolved
    }
}

/// Replace every `[name]` whose role `?name` is bound, in one pass.
///
/// Returns the substituted text and the names of placeholders that had no
/// binding; those are left in the output verbatim.
fn substitute(template: &str, bindings: &BTreeMap<String, AgentId>) -> (String, Vec<String>) {
    let by_name: BTreeMap<&str, &AgentId> = bindings
        .iter()
        .map(|(role, agent)| (role.strip_prefix('?').unwrap_or(role), agent))
        .collect();

    let mut out = String::with_capacity(template.len());
    let mut unresolved = Vec::new();
    let mut rest = template;

    while let Some(open) = rest.find('[') {
        let (before, from_open) = rest.split_at(open);
        out.push_str(before);
        out.push('[');
        let after_open = from_open.get(1..).unwrap_or_default();

        let Some(close) = after_open.find(']') else {
            rest = after_open;
            break;
        };
        let (name, from_close) = after_open.split_at(close);

        if name.contains('[') {
            // Not a placeholder; rescan from the inner bracket.
            rest = after_open;
            continue;
        }

        if let Some(agent) = by_name.get(name) {
            out.pop();
            out.push_str(agent.as_str());
        } else if name.is_empty() {
            out.push(']');
        } else {
            out.push_str(name);
            out.push(']');
            unresolved.push(String::from(name));
        }
        rest = from_close.get(1..).unwrap_or_default();
    }

    out.push_str(rest);
    (out, unresolved)
}
