//! Domain layer: transient entity snapshots and their shared value types.

pub mod snapshots;
pub mod types;

pub use snapshots::{
    Association, ChannelSnapshot, DepartmentSnapshot, SubjectSnapshot, TeamSnapshot, UserSnapshot,
};
pub use types::TeamStatus;
