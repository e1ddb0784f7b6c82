//! Cascade rule registry.
//!
//! Maps an [`EventKind`] to the ordered list of rules that derive extra
//! invalidation keys from the mutated entity's *active* relationships. Rules
//! are pure functions over the typed event payload: a rule that has nothing
//! to contribute (missing association, foreign event kind) returns an empty
//! list, never an error. An event kind with no registered rules yields zero
//! cascade keys; the direct keys still apply.
//!
//! Rule order inside a list is stable so logged batches are reproducible;
//! correctness does not depend on it because results are merged as a set.

use std::collections::HashMap;

use super::events::{DomainEvent, EventKind};
use super::keys::CacheKey;

/// One cascade rule: a named, pure key derivation.
#[derive(Clone)]
pub struct CascadeRule {
    name: &'static str,
    derive: fn(&DomainEvent<'_>) -> Vec<CacheKey>,
}

impl CascadeRule {
    pub fn new(name: &'static str, derive: fn(&DomainEvent<'_>) -> Vec<CacheKey>) -> Self {
        Self { name, derive }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn derive(&self, event: &DomainEvent<'_>) -> Vec<CacheKey> {
        (self.derive)(event)
    }
}

impl std::fmt::Debug for CascadeRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CascadeRule").field("name", &self.name).finish()
    }
}

/// Ordered cascade rules grouped by event kind.
#[derive(Debug, Default)]
pub struct CascadeRegistry {
    rules: HashMap<EventKind, Vec<CascadeRule>>,
}

impl CascadeRegistry {
    /// A registry with no rules at all.
    pub fn empty() -> Self {
        Self {
            rules: HashMap::new(),
        }
    }

    /// The built-in rule set covering team lifecycle and user activation.
    pub fn with_default_rules() -> Self {
        let mut registry = Self::empty();

        for kind in [
            EventKind::TeamArchived,
            EventKind::TeamRestored,
            EventKind::TeamDeleted,
        ] {
            registry.register(kind, CascadeRule::new("team_channel_bucket", team_channels));
            registry.register(
                kind,
                CascadeRule::new("team_member_team_lists", team_member_team_lists),
            );
            registry.register(kind, CascadeRule::new("team_history_bucket", team_history));
        }

        for kind in [EventKind::UserActivated, EventKind::UserDeactivated] {
            registry.register(
                kind,
                CascadeRule::new("user_department_bucket", user_department),
            );
            registry.register(
                kind,
                CascadeRule::new("user_taught_subjects", user_taught_subjects),
            );
            registry.register(
                kind,
                CascadeRule::new("user_team_memberships", user_team_memberships),
            );
        }

        registry
    }

    /// Append a rule to an event kind's list.
    pub fn register(&mut self, kind: EventKind, rule: CascadeRule) {
        self.rules.entry(kind).or_default().push(rule);
    }

    /// The ordered rules for an event kind; empty for unregistered kinds.
    pub fn rules_for(&self, kind: EventKind) -> &[CascadeRule] {
        self.rules.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Evaluate every rule for the event, in registration order.
    pub fn expand(&self, event: &DomainEvent<'_>) -> Vec<CacheKey> {
        let mut keys = Vec::new();
        for rule in self.rules_for(event.kind()) {
            keys.extend(rule.derive(event));
        }
        keys
    }
}

// ----------------------------------------------------------------------------
// Built-in rules
// ----------------------------------------------------------------------------

fn team_channels(event: &DomainEvent<'_>) -> Vec<CacheKey> {
    match event {
        DomainEvent::TeamArchived(team)
        | DomainEvent::TeamRestored(team)
        | DomainEvent::TeamDeleted(team) => vec![CacheKey::TeamChannels(team.id.clone())],
        _ => Vec::new(),
    }
}

fn team_member_team_lists(event: &DomainEvent<'_>) -> Vec<CacheKey> {
    match event {
        DomainEvent::TeamArchived(team)
        | DomainEvent::TeamRestored(team)
        | DomainEvent::TeamDeleted(team) => team
            .active_member_ids()
            .map(|user_id| CacheKey::UserTeams(user_id.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn team_history(event: &DomainEvent<'_>) -> Vec<CacheKey> {
    match event {
        DomainEvent::TeamArchived(team)
        | DomainEvent::TeamRestored(team)
        | DomainEvent::TeamDeleted(team) => vec![CacheKey::TeamHistory(team.id.clone())],
        _ => Vec::new(),
    }
}

fn user_department(event: &DomainEvent<'_>) -> Vec<CacheKey> {
    match event {
        DomainEvent::UserActivated(user) | DomainEvent::UserDeactivated(user) => user
            .department_id
            .as_ref()
            .map(|dept| vec![CacheKey::DepartmentUsers(dept.clone())])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn user_taught_subjects(event: &DomainEvent<'_>) -> Vec<CacheKey> {
    match event {
        DomainEvent::UserActivated(user) | DomainEvent::UserDeactivated(user) => user
            .active_subject_ids()
            .map(|subject_id| CacheKey::SubjectTeachers(subject_id.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

fn user_team_memberships(event: &DomainEvent<'_>) -> Vec<CacheKey> {
    match event {
        DomainEvent::UserActivated(user) | DomainEvent::UserDeactivated(user) => user
            .active_team_ids()
            .map(|team_id| CacheKey::TeamMembers(team_id.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}
