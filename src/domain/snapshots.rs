//! Entity snapshots.
//!
//! Immutable views of domain entities at a point in time, passed in by the
//! mutation-triggering services. The engine never reads the stores of record;
//! everything it needs to derive cache keys travels on these snapshots,
//! including the entity's associations filtered by their activity flag.

use crate::domain::types::TeamStatus;

/// A soft-deletable link to another entity.
///
/// Cascade expansion only ever walks associations whose `is_active` flag is
/// set; inactive records are retained by callers for audit purposes but are
/// invisible to invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Association {
    /// Identifier of the entity on the far side of the link.
    pub id: String,
    pub is_active: bool,
}

impl Association {
    pub fn active(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_active: true,
        }
    }

    pub fn inactive(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_active: false,
        }
    }
}

fn active_ids(associations: &[Association]) -> impl Iterator<Item = &str> {
    associations
        .iter()
        .filter(|a| a.is_active)
        .map(|a| a.id.as_str())
}

/// A provisioned Microsoft Team at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSnapshot {
    pub id: String,
    /// UPN of the owning staff member.
    pub owner_upn: String,
    pub status: TeamStatus,
    pub school_year_id: Option<String>,
    pub school_type_id: Option<String>,
    /// Resolved Graph identifier, once provisioning has completed.
    pub external_id: Option<String>,
    /// Member links (user ids), including inactive ones.
    pub members: Vec<Association>,
}

impl TeamSnapshot {
    pub fn new(id: impl Into<String>, owner_upn: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            owner_upn: owner_upn.into(),
            status: TeamStatus::Active,
            school_year_id: None,
            school_type_id: None,
            external_id: None,
            members: Vec::new(),
        }
    }

    /// Ids of the users still actively linked to this team.
    pub fn active_member_ids(&self) -> impl Iterator<Item = &str> {
        active_ids(&self.members)
    }
}

/// A staff or student account at a point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSnapshot {
    pub id: String,
    pub upn: String,
    pub role: Option<String>,
    pub is_active: bool,
    pub department_id: Option<String>,
    pub school_type_id: Option<String>,
    /// Team memberships (team ids), including inactive ones.
    pub teams: Vec<Association>,
    /// Taught-subject assignments (subject ids), including inactive ones.
    pub subjects: Vec<Association>,
}

impl UserSnapshot {
    pub fn new(id: impl Into<String>, upn: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            upn: upn.into(),
            role: None,
            is_active: true,
            department_id: None,
            school_type_id: None,
            teams: Vec::new(),
            subjects: Vec::new(),
        }
    }

    pub fn active_team_ids(&self) -> impl Iterator<Item = &str> {
        active_ids(&self.teams)
    }

    pub fn active_subject_ids(&self) -> impl Iterator<Item = &str> {
        active_ids(&self.subjects)
    }
}

/// A channel inside a provisioned team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub id: String,
    pub team_id: String,
    pub name: String,
}

impl ChannelSnapshot {
    pub fn new(
        id: impl Into<String>,
        team_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            team_id: team_id.into(),
            name: name.into(),
        }
    }
}

/// An organizational department.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentSnapshot {
    pub id: String,
    pub name: String,
}

impl DepartmentSnapshot {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A taught subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectSnapshot {
    pub id: String,
    pub name: String,
    pub category_id: Option<String>,
}

impl SubjectSnapshot {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_filter_excludes_inactive_links() {
        let mut team = TeamSnapshot::new("t1", "owner@school.example");
        team.members = vec![
            Association::active("u1"),
            Association::inactive("u2"),
            Association::active("u3"),
        ];

        let active: Vec<&str> = team.active_member_ids().collect();
        assert_eq!(active, vec!["u1", "u3"]);
    }

    #[test]
    fn user_association_filters_are_independent() {
        let mut user = UserSnapshot::new("u1", "u1@school.example");
        user.teams = vec![Association::active("t1"), Association::inactive("t2")];
        user.subjects = vec![Association::inactive("s1")];

        assert_eq!(user.active_team_ids().collect::<Vec<_>>(), vec!["t1"]);
        assert_eq!(user.active_subject_ids().count(), 0);
    }
}
