//! Cache key naming convention.
//!
//! Every key string in the side-cache is rendered from exactly one place:
//! the [`CacheKey`] enum below. The rendered form is
//! `<EntityKind>_<Qualifier>_<Value>` for parameterized lookups and a fixed
//! literal for list-level caches. Two identical variants always render
//! byte-identical strings, which is what makes invalidation deterministic.
//!
//! No other module may build a key or wildcard literal by hand.

use std::fmt;

use crate::domain::types::TeamStatus;

/// Typed cache key for one cached value or list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    // Teams
    /// A single team by id.
    TeamById(String),
    /// List of every active team.
    TeamsAllActive,
    /// Status partition (`Teams_Active` / `Teams_Archived`).
    TeamsByStatus(TeamStatus),
    /// Teams owned by one staff member (UPN).
    TeamsByOwner(String),
    TeamsBySchoolYear(String),
    TeamsBySchoolType(String),
    /// Resolved Graph identifiers for all teams.
    TeamsExternalIds,
    /// Resolved Graph identifier of one team.
    TeamExternalId(String),
    /// A team's member list.
    TeamMembers(String),
    /// A team's channel bucket.
    TeamChannels(String),
    /// A team's provisioning-operation history.
    TeamHistory(String),

    // Users
    UserById(String),
    UserByUpn(String),
    UsersAll,
    UsersAllActive,
    UsersByRole(String),
    UsersBySchoolType(String),
    /// The per-user list of teams the user belongs to.
    UserTeams(String),
    /// The per-user list of subjects the user teaches.
    UserSubjects(String),

    // Channels
    ChannelById(String),

    // Departments
    DepartmentById(String),
    DepartmentsAll,
    /// A department's user list.
    DepartmentUsers(String),

    // Subjects
    SubjectById(String),
    SubjectsAll,
    /// The teachers assigned to a subject.
    SubjectTeachers(String),
    SubjectsByCategory(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TeamById(id) => write!(f, "Team_Id_{id}"),
            Self::TeamsAllActive => f.write_str("Teams_AllActive"),
            Self::TeamsByStatus(status) => write!(f, "Teams_{}", status.as_str()),
            Self::TeamsByOwner(upn) => write!(f, "Teams_ByOwner_{upn}"),
            Self::TeamsBySchoolYear(id) => write!(f, "Teams_BySchoolYear_{id}"),
            Self::TeamsBySchoolType(id) => write!(f, "Teams_BySchoolType_{id}"),
            Self::TeamsExternalIds => f.write_str("Teams_ExternalIds"),
            Self::TeamExternalId(id) => write!(f, "Team_ExternalId_{id}"),
            Self::TeamMembers(id) => write!(f, "Team_Members_{id}"),
            Self::TeamChannels(id) => write!(f, "Team_Channels_{id}"),
            Self::TeamHistory(id) => write!(f, "Team_History_{id}"),
            Self::UserById(id) => write!(f, "User_Id_{id}"),
            Self::UserByUpn(upn) => write!(f, "User_Upn_{upn}"),
            Self::UsersAll => f.write_str("Users_All"),
            Self::UsersAllActive => f.write_str("Users_AllActive"),
            Self::UsersByRole(role) => write!(f, "Users_ByRole_{role}"),
            Self::UsersBySchoolType(id) => write!(f, "Users_BySchoolType_{id}"),
            Self::UserTeams(id) => write!(f, "User_Teams_{id}"),
            Self::UserSubjects(id) => write!(f, "User_Subjects_{id}"),
            Self::ChannelById(id) => write!(f, "Channel_Id_{id}"),
            Self::DepartmentById(id) => write!(f, "Department_Id_{id}"),
            Self::DepartmentsAll => f.write_str("Departments_All"),
            Self::DepartmentUsers(id) => write!(f, "Department_Users_{id}"),
            Self::SubjectById(id) => write!(f, "Subject_Id_{id}"),
            Self::SubjectsAll => f.write_str("Subjects_All"),
            Self::SubjectTeachers(id) => write!(f, "Subject_Teachers_{id}"),
            Self::SubjectsByCategory(id) => write!(f, "Subjects_ByCategory_{id}"),
        }
    }
}

impl CacheKey {
    /// Render the wire form submitted to the store.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

/// Wildcard pattern catching every key touching one team.
///
/// Used as a best-effort second pass after a full team deletion, to sweep up
/// derived or legacy keys the enumeration above does not cover. Never the
/// sole invalidation path.
pub fn team_wipe_pattern(team_id: &str) -> String {
    format!("*Team*{team_id}*")
}
