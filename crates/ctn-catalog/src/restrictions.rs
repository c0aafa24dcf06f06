//! Per-student blocked-item set.
//!
//! Parents can block individual catalog items for their child; the POS and
//! the parent order page must refuse to sell those. The set is scoped to
//! exactly one student and reloaded on every student change.
//!
//! # Failure semantics
//!
//! If the load fails, the set is emptied and flagged *degraded*, and the
//! error is returned to the caller. Degraded means "unverified", not
//! "unrestricted": callers must surface a warning. Silently treating a
//! failed load as "no restrictions" would sell blocked food to a child.

use std::collections::HashSet;

use ctn_backend::{Backend, BackendError};
use tracing::{info, warn};

/// Restriction load failed; the set is in the degraded state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestrictionLoadError {
    pub student_id: i64,
    pub source: BackendError,
}

impl std::fmt::Display for RestrictionLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "could not load restrictions for student {}: {}",
            self.student_id, self.source
        )
    }
}

impl std::error::Error for RestrictionLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Blocked item ids for the currently selected student.
#[derive(Debug, Default)]
pub struct RestrictionSet {
    student_id: Option<i64>,
    blocked: HashSet<i64>,
    degraded: bool,
}

impl RestrictionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set with the given student's blocked items.
    ///
    /// Returns the number of blocked items on success.
    ///
    /// # Errors
    /// On fetch failure the set is emptied, marked degraded, and
    /// [`RestrictionLoadError`] is returned so the caller can warn.
    pub async fn load_for_student(
        &mut self,
        backend: &dyn Backend,
        student_id: i64,
    ) -> Result<usize, RestrictionLoadError> {
        self.student_id = Some(student_id);
        match backend.fetch_blocked_items(student_id).await {
            Ok(ids) => {
                self.blocked = ids.into_iter().collect();
                self.degraded = false;
                info!(
                    student_id,
                    blocked = self.blocked.len(),
                    "restriction set loaded"
                );
                Ok(self.blocked.len())
            }
            Err(source) => {
                self.blocked.clear();
                self.degraded = true;
                warn!(student_id, error = %source, "restriction load failed; set degraded");
                Err(RestrictionLoadError { student_id, source })
            }
        }
    }

    pub fn is_blocked(&self, item_id: i64) -> bool {
        self.blocked.contains(&item_id)
    }

    /// `true` when the last load failed and the set contents are unverified.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// The student this set belongs to, if any load was attempted.
    pub fn student_id(&self) -> Option<i64> {
        self.student_id
    }

    /// Drop all state (student deselected / session reset).
    pub fn clear(&mut self) {
        self.student_id = None;
        self.blocked.clear();
        self.degraded = false;
    }

    /// Test/seed constructor.
    pub fn from_blocked(student_id: i64, ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            student_id: Some(student_id),
            blocked: ids.into_iter().collect(),
            degraded: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_and_query() {
        let set = RestrictionSet::from_blocked(3, [7, 9]);
        assert!(set.is_blocked(7));
        assert!(!set.is_blocked(8));
        assert!(!set.is_degraded());
        assert_eq!(set.student_id(), Some(3));
    }

    #[test]
    fn clear_resets_everything() {
        let mut set = RestrictionSet::from_blocked(3, [7]);
        set.clear();
        assert!(!set.is_blocked(7));
        assert_eq!(set.student_id(), None);
    }
}
