//! ctn-session
//!
//! Session-side contracts for the cafeteria core: who is logged in, which
//! student they are operating on, and where each role lands after login.
//!
//! Authentication itself (token issuance, storage) is an external
//! collaborator; this crate only defines the narrow [`AuthStore`] contract
//! and fails closed with [`NotAuthenticatedError`] when it reports absence.

mod context;
mod roles;

pub use context::{
    require_user, AuthStore, NotAuthenticatedError, SelectedStudent, SessionContext, User,
};
pub use roles::{landing_page, Role};
