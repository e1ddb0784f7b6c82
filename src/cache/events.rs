//! Domain event definitions.
//!
//! The closed set of entity mutations the engine knows how to invalidate
//! for. Events carry typed borrowed payloads; the fieldless [`EventKind`]
//! discriminant is what the cascade registry dispatches on, so an event kind
//! with no registered rules simply contributes nothing beyond its direct
//! keys.

use crate::domain::snapshots::{
    ChannelSnapshot, DepartmentSnapshot, SubjectSnapshot, TeamSnapshot, UserSnapshot,
};

/// One entity mutation, with the snapshot(s) the engine keys off.
///
/// Update-class events carry both the new and the prior snapshot; the
/// orchestrator diffs them field by field. Deletion events carry the
/// snapshot at time of deletion.
#[derive(Debug, Clone)]
pub enum DomainEvent<'a> {
    TeamCreated(&'a TeamSnapshot),
    TeamUpdated {
        new: &'a TeamSnapshot,
        old: &'a TeamSnapshot,
    },
    TeamArchived(&'a TeamSnapshot),
    TeamRestored(&'a TeamSnapshot),
    TeamDeleted(&'a TeamSnapshot),
    TeamMemberAdded {
        team_id: &'a str,
        user_id: &'a str,
    },
    TeamMemberRemoved {
        team_id: &'a str,
        user_id: &'a str,
    },
    TeamMembersBulkChanged {
        team_id: &'a str,
        user_ids: &'a [String],
    },
    UserCreated(&'a UserSnapshot),
    UserUpdated {
        new: &'a UserSnapshot,
        old: &'a UserSnapshot,
    },
    UserActivated(&'a UserSnapshot),
    UserDeactivated(&'a UserSnapshot),
    UserSchoolTypeChanged {
        user_id: &'a str,
        old_school_type_id: Option<&'a str>,
        new_school_type_id: Option<&'a str>,
    },
    UserSubjectChanged {
        user_id: &'a str,
        subject_id: &'a str,
        added: bool,
    },
    ChannelCreated(&'a ChannelSnapshot),
    ChannelUpdated(&'a ChannelSnapshot),
    ChannelDeleted(&'a ChannelSnapshot),
    DepartmentChanged {
        new: &'a DepartmentSnapshot,
        old: &'a DepartmentSnapshot,
    },
    SubjectChanged {
        new: &'a SubjectSnapshot,
        old: &'a SubjectSnapshot,
    },
}

/// Fieldless discriminant of [`DomainEvent`]; the cascade registry key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TeamCreated,
    TeamUpdated,
    TeamArchived,
    TeamRestored,
    TeamDeleted,
    TeamMemberAdded,
    TeamMemberRemoved,
    TeamMembersBulkChanged,
    UserCreated,
    UserUpdated,
    UserActivated,
    UserDeactivated,
    UserSchoolTypeChanged,
    UserSubjectChanged,
    ChannelCreated,
    ChannelUpdated,
    ChannelDeleted,
    DepartmentChanged,
    SubjectChanged,
}

impl EventKind {
    /// Dotted event name used in operation labels.
    pub fn name(&self) -> &'static str {
        match self {
            Self::TeamCreated => "Team.Created",
            Self::TeamUpdated => "Team.Updated",
            Self::TeamArchived => "Team.Archived",
            Self::TeamRestored => "Team.Restored",
            Self::TeamDeleted => "Team.Deleted",
            Self::TeamMemberAdded => "Team.MemberAdded",
            Self::TeamMemberRemoved => "Team.MemberRemoved",
            Self::TeamMembersBulkChanged => "Team.MembersBulkChanged",
            Self::UserCreated => "User.Created",
            Self::UserUpdated => "User.Updated",
            Self::UserActivated => "User.Activated",
            Self::UserDeactivated => "User.Deactivated",
            Self::UserSchoolTypeChanged => "User.SchoolTypeChanged",
            Self::UserSubjectChanged => "User.SubjectChanged",
            Self::ChannelCreated => "Channel.Created",
            Self::ChannelUpdated => "Channel.Updated",
            Self::ChannelDeleted => "Channel.Deleted",
            Self::DepartmentChanged => "Department.Changed",
            Self::SubjectChanged => "Subject.Changed",
        }
    }
}

impl DomainEvent<'_> {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::TeamCreated(_) => EventKind::TeamCreated,
            Self::TeamUpdated { .. } => EventKind::TeamUpdated,
            Self::TeamArchived(_) => EventKind::TeamArchived,
            Self::TeamRestored(_) => EventKind::TeamRestored,
            Self::TeamDeleted(_) => EventKind::TeamDeleted,
            Self::TeamMemberAdded { .. } => EventKind::TeamMemberAdded,
            Self::TeamMemberRemoved { .. } => EventKind::TeamMemberRemoved,
            Self::TeamMembersBulkChanged { .. } => EventKind::TeamMembersBulkChanged,
            Self::UserCreated(_) => EventKind::UserCreated,
            Self::UserUpdated { .. } => EventKind::UserUpdated,
            Self::UserActivated(_) => EventKind::UserActivated,
            Self::UserDeactivated(_) => EventKind::UserDeactivated,
            Self::UserSchoolTypeChanged { .. } => EventKind::UserSchoolTypeChanged,
            Self::UserSubjectChanged { .. } => EventKind::UserSubjectChanged,
            Self::ChannelCreated(_) => EventKind::ChannelCreated,
            Self::ChannelUpdated(_) => EventKind::ChannelUpdated,
            Self::ChannelDeleted(_) => EventKind::ChannelDeleted,
            Self::DepartmentChanged { .. } => EventKind::DepartmentChanged,
            Self::SubjectChanged { .. } => EventKind::SubjectChanged,
        }
    }

    /// Identity of the mutated entity, for labels only.
    fn entity_id(&self) -> &str {
        match self {
            Self::TeamCreated(team)
            | Self::TeamArchived(team)
            | Self::TeamRestored(team)
            | Self::TeamDeleted(team) => &team.id,
            Self::TeamUpdated { new, .. } => &new.id,
            Self::TeamMemberAdded { team_id, .. }
            | Self::TeamMemberRemoved { team_id, .. }
            | Self::TeamMembersBulkChanged { team_id, .. } => team_id,
            Self::UserCreated(user)
            | Self::UserActivated(user)
            | Self::UserDeactivated(user) => &user.id,
            Self::UserUpdated { new, .. } => &new.id,
            Self::UserSchoolTypeChanged { user_id, .. }
            | Self::UserSubjectChanged { user_id, .. } => user_id,
            Self::ChannelCreated(channel)
            | Self::ChannelUpdated(channel)
            | Self::ChannelDeleted(channel) => &channel.id,
            Self::DepartmentChanged { new, .. } => &new.id,
            Self::SubjectChanged { new, .. } => &new.id,
        }
    }

    /// Human-readable operation label, e.g. `Team.Archived:t1`.
    ///
    /// Used for logs and metrics only; never for correctness.
    pub fn label(&self) -> String {
        format!("{}:{}", self.kind().name(), self.entity_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshots::TeamSnapshot;

    #[test]
    fn label_composes_kind_and_identity() {
        let team = TeamSnapshot::new("t1", "o@x");
        let event = DomainEvent::TeamArchived(&team);
        assert_eq!(event.label(), "Team.Archived:t1");
        assert_eq!(event.kind(), EventKind::TeamArchived);
    }

    #[test]
    fn bulk_event_labels_with_team_identity() {
        let users = vec!["u1".to_string(), "u2".to_string()];
        let event = DomainEvent::TeamMembersBulkChanged {
            team_id: "t1",
            user_ids: &users,
        };
        assert_eq!(event.label(), "Team.MembersBulkChanged:t1");
    }

    #[test]
    fn update_event_labels_with_new_snapshot_identity() {
        let old = TeamSnapshot::new("t1", "old@x");
        let new = TeamSnapshot::new("t1", "new@x");
        let event = DomainEvent::TeamUpdated {
            new: &new,
            old: &old,
        };
        assert_eq!(event.label(), "Team.Updated:t1");
    }
}
