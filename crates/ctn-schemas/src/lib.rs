//! ctn-schemas
//!
//! Shared domain types and wire schemas for the cafeteria core:
//! - validated domain structs ([`CatalogItem`], [`Student`], [`Preorder`])
//! - per-endpoint wire DTOs with explicit boundary validation ([`wire`])
//! - fixed-point money ([`Money`], integer micros)
//!
//! This crate owns no I/O. Everything that crosses the REST boundary is
//! parsed here exactly once; downstream crates never see raw JSON shapes.

pub mod money;
pub mod wire;

pub use money::{Money, MoneyError, MICROS_PER_PESO};

use chrono::{DateTime, Utc};

// ---------------------------------------------------------------------------
// SchemaError
// ---------------------------------------------------------------------------

/// A wire payload deserialized but failed domain validation.
///
/// Distinct from a JSON decode failure (the transport layer reports those):
/// the shape was readable, but a value is outside the domain the rest of the
/// system is allowed to assume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A monetary field was not representable as micros.
    Money {
        field: &'static str,
        source: MoneyError,
    },
    /// A monetary field that must be non-negative was negative.
    NegativeAmount { field: &'static str },
    /// A count field (stock, calories, quantity) was negative or oversized.
    BadCount { field: &'static str, got: i64 },
    /// A required text field was empty or whitespace.
    EmptyField { field: &'static str },
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaError::Money { field, source } => {
                write!(f, "schema: field '{field}' not a valid amount: {source}")
            }
            SchemaError::NegativeAmount { field } => {
                write!(f, "schema: field '{field}' must be non-negative")
            }
            SchemaError::BadCount { field, got } => {
                write!(f, "schema: field '{field}' is not a valid count: {got}")
            }
            SchemaError::EmptyField { field } => {
                write!(f, "schema: field '{field}' must not be empty")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

/// A purchasable catalog item. Owned by the catalog cache; the whole set is
/// replaced on each refresh, never patched in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub price: Money,
    /// Cached stock. Optimistically decremented by local cart reservations;
    /// authoritative only until the next refresh.
    pub stock: u32,
    pub category: String,
    pub calories: u32,
}

/// A student as the backend reports them, with the cached balance.
///
/// The balance here is advisory: it is used for fail-fast pre-checks and
/// optimistic display only. The value returned by the debit endpoint is the
/// authoritative one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub id: i64,
    pub cedula: String,
    pub name: String,
    pub balance: Money,
    /// Parent-configured daily spending limit; zero means no limit is set.
    /// Enforced by the backend, carried here for display.
    pub daily_limit: Money,
}

/// A placed preorder. Created by the submission flow; the client never
/// mutates it afterwards except observing the delivered flag via refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preorder {
    pub id: i64,
    pub student_id: i64,
    /// Authoritative total computed by the backend (items + surcharge).
    pub total: Money,
    pub surcharge: Money,
    pub created_at: DateTime<Utc>,
    pub delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
}
