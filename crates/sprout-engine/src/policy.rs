//! Conflict and confirmation decisions, decoupled from any presentation layer.
//!
//! Callers supply a [`ConflictPolicy`] instead of the engine blocking on a
//! dialog. Interactive frontends prompt the user; tests and `--yes` runs use
//! the doubles below.

use sprout_resolver::DependencyConflict;

/// Decision returned when conflicts are found before an install
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictDecision {
    /// Install anyway
    Proceed,
    /// Halt with no side effects
    Abort,
}

/// Resolves conflict and uninstall confirmations on behalf of the caller
pub trait ConflictPolicy: Send + Sync {
    /// Decide whether to proceed despite the given conflicts
    fn resolve_conflicts(&self, conflicts: &[DependencyConflict]) -> ConflictDecision;

    /// Confirm removal of an installed package
    fn confirm_uninstall(&self, package: &str) -> bool;
}

/// Proceeds through every conflict and confirmation
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ConflictPolicy for AutoApprove {
    fn resolve_conflicts(&self, _conflicts: &[DependencyConflict]) -> ConflictDecision {
        ConflictDecision::Proceed
    }

    fn confirm_uninstall(&self, _package: &str) -> bool {
        true
    }
}

/// Aborts on any conflict and denies every confirmation
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoReject;

impl ConflictPolicy for AutoReject {
    fn resolve_conflicts(&self, _conflicts: &[DependencyConflict]) -> ConflictDecision {
        ConflictDecision::Abort
    }

    fn confirm_uninstall(&self, _package: &str) -> bool {
        false
    }
}
