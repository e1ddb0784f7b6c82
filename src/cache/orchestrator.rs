//! Invalidation orchestrator.
//!
//! One public operation per domain mutation. Every operation runs the same
//! three-phase pipeline:
//!
//! 1. **Direct keys** — the entity's identity key plus the list-level keys
//!    it participates in. For update events an optional partition key is
//!    included only when the field differs between the old and new snapshot,
//!    and symmetric changes (owner, status, school year/type, department,
//!    role, category) include *both* the old and the new partition.
//! 2. **Cascade expansion** — the registry's rules for the event kind,
//!    evaluated against the snapshot, merged into the same set.
//! 3. **Submission** — one deduplicated batch-remove call against the
//!    injected store, labeled with the event name and entity identity.
//!
//! The orchestrator is stateless between calls; a call either submits its
//! whole batch or propagates the store's error untouched.

use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::snapshots::{
    ChannelSnapshot, DepartmentSnapshot, SubjectSnapshot, TeamSnapshot, UserSnapshot,
};
use crate::domain::types::TeamStatus;

use super::batch::InvalidationBatch;
use super::events::DomainEvent;
use super::keys::{self, CacheKey};
use super::rules::CascadeRegistry;
use super::store::{CacheStore, CacheStoreError};

/// Failure surface of the orchestrator operations.
#[derive(Debug, Error)]
pub enum InvalidationError {
    /// An update event was handed snapshots of two different entities.
    /// Programmer error at the caller; rejected before any submission.
    #[error("snapshot identity mismatch: old `{old}` vs new `{new}`")]
    SnapshotMismatch { old: String, new: String },
    #[error(transparent)]
    Store(#[from] CacheStoreError),
}

/// The public invalidation surface of the engine.
pub struct CacheInvalidator {
    store: Arc<dyn CacheStore>,
    registry: CascadeRegistry,
}

impl CacheInvalidator {
    /// Build an invalidator over the given store with the built-in rules.
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self::with_registry(store, CascadeRegistry::with_default_rules())
    }

    pub fn with_registry(store: Arc<dyn CacheStore>, registry: CascadeRegistry) -> Self {
        Self { store, registry }
    }

    fn ensure_same_identity(&self, old: &str, new: &str) -> Result<(), InvalidationError> {
        if old != new {
            return Err(InvalidationError::SnapshotMismatch {
                old: old.to_string(),
                new: new.to_string(),
            });
        }
        Ok(())
    }

    /// Phase 2 + 3: merge cascade keys and submit one batch.
    async fn submit(
        &self,
        event: &DomainEvent<'_>,
        mut batch: InvalidationBatch,
    ) -> Result<(), InvalidationError> {
        batch.extend(self.registry.expand(event));
        self.store
            .invalidate_batch(&batch.into_keys(), &event.label())
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Teams
    // ------------------------------------------------------------------------

    pub async fn on_team_created(&self, team: &TeamSnapshot) -> Result<(), InvalidationError> {
        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::TeamsAllActive);
        batch.push(CacheKey::TeamsByStatus(team.status));
        batch.push(CacheKey::TeamsByOwner(team.owner_upn.clone()));
        batch.push(CacheKey::TeamById(team.id.clone()));
        if let Some(school_year) = &team.school_year_id {
            batch.push(CacheKey::TeamsBySchoolYear(school_year.clone()));
        }
        if let Some(school_type) = &team.school_type_id {
            batch.push(CacheKey::TeamsBySchoolType(school_type.clone()));
        }
        batch.push(CacheKey::TeamsExternalIds);

        self.submit(&DomainEvent::TeamCreated(team), batch).await
    }

    pub async fn on_team_updated(
        &self,
        new: &TeamSnapshot,
        old: &TeamSnapshot,
    ) -> Result<(), InvalidationError> {
        self.ensure_same_identity(&old.id, &new.id)?;

        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::TeamById(new.id.clone()));
        batch.push(CacheKey::TeamsAllActive);
        if new.owner_upn != old.owner_upn {
            batch.push(CacheKey::TeamsByOwner(old.owner_upn.clone()));
            batch.push(CacheKey::TeamsByOwner(new.owner_upn.clone()));
        }
        if new.status != old.status {
            batch.push(CacheKey::TeamsByStatus(old.status));
            batch.push(CacheKey::TeamsByStatus(new.status));
        }
        if new.school_year_id != old.school_year_id {
            for school_year in [&old.school_year_id, &new.school_year_id].into_iter().flatten() {
                batch.push(CacheKey::TeamsBySchoolYear(school_year.clone()));
            }
        }
        if new.school_type_id != old.school_type_id {
            for school_type in [&old.school_type_id, &new.school_type_id].into_iter().flatten() {
                batch.push(CacheKey::TeamsBySchoolType(school_type.clone()));
            }
        }
        if new.external_id != old.external_id {
            batch.push(CacheKey::TeamExternalId(new.id.clone()));
            batch.push(CacheKey::TeamsExternalIds);
        }

        self.submit(&DomainEvent::TeamUpdated { new, old }, batch)
            .await
    }

    pub async fn on_team_archived(&self, team: &TeamSnapshot) -> Result<(), InvalidationError> {
        self.team_status_transition(team, DomainEvent::TeamArchived(team))
            .await
    }

    pub async fn on_team_restored(&self, team: &TeamSnapshot) -> Result<(), InvalidationError> {
        self.team_status_transition(team, DomainEvent::TeamRestored(team))
            .await
    }

    /// Shared direct-key shape of Active ↔ Archived transitions: a
    /// status-partitioned list must drop the team from one bucket and make
    /// it eligible for the other, so both partitions are invalidated.
    async fn team_status_transition(
        &self,
        team: &TeamSnapshot,
        event: DomainEvent<'_>,
    ) -> Result<(), InvalidationError> {
        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::TeamById(team.id.clone()));
        batch.push(CacheKey::TeamsAllActive);
        batch.push(CacheKey::TeamsByStatus(TeamStatus::Active));
        batch.push(CacheKey::TeamsByStatus(TeamStatus::Archived));
        batch.push(CacheKey::TeamsByOwner(team.owner_upn.clone()));

        self.submit(&event, batch).await
    }

    /// Full deletion: explicit batch over every enumerable key, then a
    /// best-effort wildcard sweep for derived/legacy keys the naming
    /// convention does not cover.
    pub async fn on_team_deleted(&self, team: &TeamSnapshot) -> Result<(), InvalidationError> {
        let event = DomainEvent::TeamDeleted(team);

        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::TeamById(team.id.clone()));
        batch.push(CacheKey::TeamsAllActive);
        batch.push(CacheKey::TeamsByStatus(TeamStatus::Active));
        batch.push(CacheKey::TeamsByStatus(TeamStatus::Archived));
        batch.push(CacheKey::TeamsByOwner(team.owner_upn.clone()));
        if let Some(school_year) = &team.school_year_id {
            batch.push(CacheKey::TeamsBySchoolYear(school_year.clone()));
        }
        if let Some(school_type) = &team.school_type_id {
            batch.push(CacheKey::TeamsBySchoolType(school_type.clone()));
        }
        batch.push(CacheKey::TeamExternalId(team.id.clone()));
        batch.push(CacheKey::TeamsExternalIds);
        batch.push(CacheKey::TeamMembers(team.id.clone()));
        batch.extend(self.registry.expand(&event));

        let label = event.label();
        self.store
            .invalidate_batch(&batch.into_keys(), &label)
            .await?;
        self.store
            .invalidate_pattern(&keys::team_wipe_pattern(&team.id), &label)
            .await?;
        Ok(())
    }

    pub async fn on_team_member_added(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<(), InvalidationError> {
        self.team_membership_change(team_id, user_id, DomainEvent::TeamMemberAdded {
            team_id,
            user_id,
        })
        .await
    }

    pub async fn on_team_member_removed(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<(), InvalidationError> {
        self.team_membership_change(team_id, user_id, DomainEvent::TeamMemberRemoved {
            team_id,
            user_id,
        })
        .await
    }

    async fn team_membership_change(
        &self,
        team_id: &str,
        user_id: &str,
        event: DomainEvent<'_>,
    ) -> Result<(), InvalidationError> {
        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::TeamMembers(team_id.to_string()));
        batch.push(CacheKey::TeamById(team_id.to_string()));
        batch.push(CacheKey::UserTeams(user_id.to_string()));

        self.submit(&event, batch).await
    }

    /// Bulk membership change: the team's member list once, each affected
    /// user's personal team list individually. One call, not N.
    pub async fn on_team_members_bulk_changed(
        &self,
        team_id: &str,
        user_ids: &[String],
    ) -> Result<(), InvalidationError> {
        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::TeamMembers(team_id.to_string()));
        batch.push(CacheKey::TeamById(team_id.to_string()));
        for user_id in user_ids {
            batch.push(CacheKey::UserTeams(user_id.clone()));
        }

        self.submit(
            &DomainEvent::TeamMembersBulkChanged { team_id, user_ids },
            batch,
        )
        .await
    }

    // ------------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------------

    pub async fn on_user_created(&self, user: &UserSnapshot) -> Result<(), InvalidationError> {
        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::UserById(user.id.clone()));
        batch.push(CacheKey::UserByUpn(user.upn.clone()));
        batch.push(CacheKey::UsersAll);
        batch.push(CacheKey::UsersAllActive);
        if let Some(role) = &user.role {
            batch.push(CacheKey::UsersByRole(role.clone()));
        }
        if let Some(department) = &user.department_id {
            batch.push(CacheKey::DepartmentUsers(department.clone()));
        }
        if let Some(school_type) = &user.school_type_id {
            batch.push(CacheKey::UsersBySchoolType(school_type.clone()));
        }

        self.submit(&DomainEvent::UserCreated(user), batch).await
    }

    pub async fn on_user_updated(
        &self,
        new: &UserSnapshot,
        old: &UserSnapshot,
    ) -> Result<(), InvalidationError> {
        self.ensure_same_identity(&old.id, &new.id)?;

        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::UserById(new.id.clone()));
        batch.push(CacheKey::UsersAll);
        batch.push(CacheKey::UsersAllActive);
        if new.upn != old.upn {
            batch.push(CacheKey::UserByUpn(old.upn.clone()));
        }
        batch.push(CacheKey::UserByUpn(new.upn.clone()));
        if new.role != old.role {
            for role in [&old.role, &new.role].into_iter().flatten() {
                batch.push(CacheKey::UsersByRole(role.clone()));
            }
        }
        if new.department_id != old.department_id {
            for department in [&old.department_id, &new.department_id].into_iter().flatten() {
                batch.push(CacheKey::DepartmentUsers(department.clone()));
            }
        }
        if new.school_type_id != old.school_type_id {
            for school_type in [&old.school_type_id, &new.school_type_id].into_iter().flatten() {
                batch.push(CacheKey::UsersBySchoolType(school_type.clone()));
            }
        }
        self.submit(&DomainEvent::UserUpdated { new, old }, batch)
            .await
    }

    pub async fn on_user_activated(&self, user: &UserSnapshot) -> Result<(), InvalidationError> {
        self.user_activity_transition(user, DomainEvent::UserActivated(user))
            .await
    }

    pub async fn on_user_deactivated(&self, user: &UserSnapshot) -> Result<(), InvalidationError> {
        self.user_activity_transition(user, DomainEvent::UserDeactivated(user))
            .await
    }

    async fn user_activity_transition(
        &self,
        user: &UserSnapshot,
        event: DomainEvent<'_>,
    ) -> Result<(), InvalidationError> {
        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::UserById(user.id.clone()));
        batch.push(CacheKey::UserByUpn(user.upn.clone()));
        batch.push(CacheKey::UsersAll);
        batch.push(CacheKey::UsersAllActive);
        batch.push(CacheKey::UserTeams(user.id.clone()));
        batch.push(CacheKey::UserSubjects(user.id.clone()));
        if let Some(role) = &user.role {
            batch.push(CacheKey::UsersByRole(role.clone()));
        }

        self.submit(&event, batch).await
    }

    pub async fn on_user_school_type_changed(
        &self,
        user_id: &str,
        old_school_type_id: Option<&str>,
        new_school_type_id: Option<&str>,
    ) -> Result<(), InvalidationError> {
        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::UserById(user_id.to_string()));
        for school_type in [old_school_type_id, new_school_type_id].into_iter().flatten() {
            batch.push(CacheKey::UsersBySchoolType(school_type.to_string()));
        }

        self.submit(
            &DomainEvent::UserSchoolTypeChanged {
                user_id,
                old_school_type_id,
                new_school_type_id,
            },
            batch,
        )
        .await
    }

    pub async fn on_user_subject_changed(
        &self,
        user_id: &str,
        subject_id: &str,
        added: bool,
    ) -> Result<(), InvalidationError> {
        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::UserSubjects(user_id.to_string()));
        batch.push(CacheKey::SubjectTeachers(subject_id.to_string()));

        self.submit(
            &DomainEvent::UserSubjectChanged {
                user_id,
                subject_id,
                added,
            },
            batch,
        )
        .await
    }

    // ------------------------------------------------------------------------
    // Channels
    // ------------------------------------------------------------------------

    pub async fn on_channel_created(
        &self,
        channel: &ChannelSnapshot,
    ) -> Result<(), InvalidationError> {
        self.channel_change(channel, DomainEvent::ChannelCreated(channel))
            .await
    }

    pub async fn on_channel_updated(
        &self,
        channel: &ChannelSnapshot,
    ) -> Result<(), InvalidationError> {
        self.channel_change(channel, DomainEvent::ChannelUpdated(channel))
            .await
    }

    pub async fn on_channel_deleted(
        &self,
        channel: &ChannelSnapshot,
    ) -> Result<(), InvalidationError> {
        self.channel_change(channel, DomainEvent::ChannelDeleted(channel))
            .await
    }

    async fn channel_change(
        &self,
        channel: &ChannelSnapshot,
        event: DomainEvent<'_>,
    ) -> Result<(), InvalidationError> {
        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::ChannelById(channel.id.clone()));
        batch.push(CacheKey::TeamChannels(channel.team_id.clone()));
        batch.push(CacheKey::TeamById(channel.team_id.clone()));

        self.submit(&event, batch).await
    }

    // ------------------------------------------------------------------------
    // Departments & subjects
    // ------------------------------------------------------------------------

    pub async fn on_department_changed(
        &self,
        new: &DepartmentSnapshot,
        old: &DepartmentSnapshot,
    ) -> Result<(), InvalidationError> {
        self.ensure_same_identity(&old.id, &new.id)?;

        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::DepartmentById(new.id.clone()));
        batch.push(CacheKey::DepartmentsAll);
        batch.push(CacheKey::DepartmentUsers(new.id.clone()));

        self.submit(&DomainEvent::DepartmentChanged { new, old }, batch)
            .await
    }

    pub async fn on_subject_changed(
        &self,
        new: &SubjectSnapshot,
        old: &SubjectSnapshot,
    ) -> Result<(), InvalidationError> {
        self.ensure_same_identity(&old.id, &new.id)?;

        let mut batch = InvalidationBatch::new();
        batch.push(CacheKey::SubjectById(new.id.clone()));
        batch.push(CacheKey::SubjectsAll);
        batch.push(CacheKey::SubjectTeachers(new.id.clone()));
        if new.category_id != old.category_id {
            for category in [&old.category_id, &new.category_id].into_iter().flatten() {
                batch.push(CacheKey::SubjectsByCategory(category.clone()));
            }
        }

        self.submit(&DomainEvent::SubjectChanged { new, old }, batch)
            .await
    }

    // ------------------------------------------------------------------------
    // Composite workflows
    // ------------------------------------------------------------------------

    /// Invalidate an arbitrary set of named key lists in one deduplicated
    /// batch. The submission label concatenates the sub-operation names for
    /// traceability. An empty mapping is a no-op.
    pub async fn invalidate_composite(
        &self,
        operations: &BTreeMap<String, Vec<String>>,
    ) -> Result<(), InvalidationError> {
        if operations.is_empty() {
            return Ok(());
        }

        let label = operations
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("+");
        let mut batch = InvalidationBatch::new();
        for keys in operations.values() {
            for key in keys {
                batch.push_raw(key.clone());
            }
        }

        self.store
            .invalidate_batch(&batch.into_keys(), &label)
            .await?;
        Ok(())
    }
}
