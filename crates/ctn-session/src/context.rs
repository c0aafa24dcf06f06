//! Session context: the authenticated user plus the currently selected
//! student.
//!
//! Session state is an explicit object passed to each flow rather than an
//! ambient global, with replace-on-change semantics: selecting a different
//! student bumps an epoch counter, and any in-flight work that captured the
//! old epoch must abandon itself instead of applying stale restriction or
//! balance data to the new student.

use ctn_schemas::Money;

use crate::roles::Role;

// ---------------------------------------------------------------------------
// AuthStore
// ---------------------------------------------------------------------------

/// The authenticated user as the auth store reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub role: Role,
}

/// Narrow contract over wherever the token/user actually live (browser
/// storage, keychain, test fixture). Absence of either is
/// [`NotAuthenticatedError`]; what to do about it (redirect to login,
/// abort) is the caller's policy.
pub trait AuthStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn current_user(&self) -> Option<User>;
}

/// No token or no user in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotAuthenticatedError;

impl std::fmt::Display for NotAuthenticatedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "no authenticated session")
    }
}

impl std::error::Error for NotAuthenticatedError {}

/// Fetch the current user or fail closed.
pub fn require_user(store: &dyn AuthStore) -> Result<User, NotAuthenticatedError> {
    match (store.token(), store.current_user()) {
        (Some(_), Some(user)) => Ok(user),
        _ => Err(NotAuthenticatedError),
    }
}

// ---------------------------------------------------------------------------
// SessionContext
// ---------------------------------------------------------------------------

/// The student a parent/vendor is currently operating on, with the cached
/// (advisory) balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedStudent {
    pub id: i64,
    pub name: String,
    /// Advisory copy; the debit endpoint's response is authoritative.
    pub balance: Money,
}

/// Explicit session state passed to every flow.
#[derive(Debug, Clone)]
pub struct SessionContext {
    user: User,
    selected: Option<SelectedStudent>,
    epoch: u64,
}

impl SessionContext {
    pub fn new(user: User) -> Self {
        Self {
            user,
            selected: None,
            epoch: 0,
        }
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    /// Monotonic counter bumped on every selection change. Flows capture it
    /// at entry and refuse to continue if it has moved.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn selected(&self) -> Option<&SelectedStudent> {
        self.selected.as_ref()
    }

    /// Replace the selection wholesale and invalidate in-flight state for the
    /// previous student.
    pub fn select_student(&mut self, id: i64, name: impl Into<String>, balance: Money) {
        self.selected = Some(SelectedStudent {
            id,
            name: name.into(),
            balance,
        });
        self.epoch += 1;
    }

    /// Drop the selection (e.g. "new sale" reset). Also an epoch bump.
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.epoch += 1;
    }

    /// Update the cached balance for the current selection without changing
    /// identity; not an epoch bump.
    pub fn set_balance(&mut self, balance: Money) {
        if let Some(sel) = self.selected.as_mut() {
            sel.balance = balance;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
