//! Sync planning from local state

use crate::inspect::LocalState;

/// Why a repository's target path cannot be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocked {
    /// Something other than a directory is in the way
    File,
    /// The directory lacks write or traverse permission
    Permission,
}

/// Action to take for one repository
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Clone,
    Fetch,
    Skip(Blocked),
}

/// Decide what to do for a repository given its local state
pub fn plan(state: LocalState) -> SyncAction {
    match state {
        LocalState::Absent | LocalState::Garbage => SyncAction::Clone,
        LocalState::ValidClone => SyncAction::Fetch,
        LocalState::BlockedFile => SyncAction::Skip(Blocked::File),
        LocalState::BlockedPermission => SyncAction::Skip(Blocked::Permission),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_decisions() {
        assert_eq!(plan(LocalState::Absent), SyncAction::Clone);
        assert_eq!(plan(LocalState::Garbage), SyncAction::Clone);
        assert_eq!(plan(LocalState::ValidClone), SyncAction::Fetch);
        assert_eq!(plan(LocalState::BlockedFile), SyncAction::Skip(Blocked::File));
        assert_eq!(
            plan(LocalState::BlockedPermission),
            SyncAction::Skip(Blocked::Permission)
        );
    }
}
