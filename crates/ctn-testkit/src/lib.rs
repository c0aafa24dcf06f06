//! ctn-testkit
//!
//! Deterministic test doubles for the cafeteria core: an in-memory
//! [`Backend`](ctn_backend::Backend) with failure injection, a canned auth
//! store, and seed helpers. No network I/O, no randomness.
//!
//! This crate must never appear in production dependencies of the other
//! workspace members; it exists for `[dev-dependencies]` only.

mod backend;

pub use backend::InMemoryBackend;

use ctn_schemas::{CatalogItem, Money, Student};
use ctn_session::{AuthStore, Role, User};

// ---------------------------------------------------------------------------
// MemoryAuthStore
// ---------------------------------------------------------------------------

/// Auth store with canned contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryAuthStore {
    token: Option<String>,
    user: Option<User>,
}

impl MemoryAuthStore {
    /// An authenticated session for the given role.
    pub fn logged_in(name: &str, role: Role) -> Self {
        Self {
            token: Some("test-jwt".to_string()),
            user: Some(User {
                name: name.to_string(),
                role,
            }),
        }
    }

    /// No token, no user.
    pub fn logged_out() -> Self {
        Self::default()
    }
}

impl AuthStore for MemoryAuthStore {
    fn token(&self) -> Option<String> {
        self.token.clone()
    }

    fn current_user(&self) -> Option<User> {
        self.user.clone()
    }
}

// ---------------------------------------------------------------------------
// Seed helpers
// ---------------------------------------------------------------------------

/// Catalog item with sane defaults for scenario tests.
pub fn seed_item(id: i64, name: &str, price_pesos: i64, stock: u32) -> CatalogItem {
    CatalogItem {
        id,
        name: name.to_string(),
        price: Money::from_pesos(price_pesos),
        stock,
        category: "Almuerzo".to_string(),
        calories: 250,
    }
}

/// Student with sane defaults for scenario tests.
pub fn seed_student(id: i64, cedula: &str, name: &str, balance_pesos: i64) -> Student {
    Student {
        id,
        cedula: cedula.to_string(),
        name: name.to_string(),
        balance: Money::from_pesos(balance_pesos),
        daily_limit: Money::ZERO,
    }
}

/// Install a fmt subscriber for scenario tests; safe to call repeatedly.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
