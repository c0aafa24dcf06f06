//! ctn-backend
//!
//! The single seam between the cafeteria flows and the remote REST API.
//!
//! Every flow (catalog refresh, restriction load, order submission,
//! fulfillment) talks to [`Backend`] and nothing else. `ctn-client` provides
//! the live reqwest implementation; `ctn-testkit` provides a deterministic
//! in-memory one. Keeping the trait backend-agnostic is what makes the money
//! paths provable without a network.

use ctn_schemas::{CatalogItem, Money, Preorder, SchemaError, Student};

/// Convenience alias used throughout the workspace.
pub type BackendResult<T> = Result<T, BackendError>;

// ---------------------------------------------------------------------------
// BackendError
// ---------------------------------------------------------------------------

/// Transport- and contract-level failures of a backend call.
///
/// The taxonomy matters to callers:
/// - [`Timeout`](BackendError::Timeout) and [`Network`](BackendError::Network)
///   (plus 5xx [`Status`](BackendError::Status)) are retryable — offer
///   "retry", not "contact support".
/// - [`NotAuthenticated`](BackendError::NotAuthenticated) means the session
///   is gone; redirect policy belongs to the caller.
/// - [`Schema`](BackendError::Schema) means the backend answered with a shape
///   we refuse to guess about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Non-success HTTP status. `detail` carries the backend's JSON `detail`
    /// field when present, otherwise the status text.
    Status { status: u16, detail: String },
    /// Connection-level failure (DNS, refused, reset, body read).
    Network(String),
    /// The bounded per-request wait expired.
    Timeout,
    /// No token available, or the backend answered 401/403.
    NotAuthenticated,
    /// Payload decoded but failed domain validation.
    Schema(SchemaError),
}

impl BackendError {
    /// HTTP status, when the failure was an HTTP-level reject.
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a caller may reasonably retry the same call unchanged.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Timeout | BackendError::Network(_) => true,
            BackendError::Status { status, .. } => *status >= 500,
            BackendError::NotAuthenticated | BackendError::Schema(_) => false,
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::Status { status, detail } => {
                write!(f, "backend rejected: status={status} detail={detail}")
            }
            BackendError::Network(msg) => write!(f, "backend unreachable: {msg}"),
            BackendError::Timeout => write!(f, "backend call timed out"),
            BackendError::NotAuthenticated => write!(f, "not authenticated"),
            BackendError::Schema(e) => write!(f, "backend payload invalid: {e}"),
        }
    }
}

impl std::error::Error for BackendError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BackendError::Schema(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SchemaError> for BackendError {
    fn from(e: SchemaError) -> Self {
        BackendError::Schema(e)
    }
}

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Optional server-side catalog filters (`GET /api/alimentos/?nombre=&categoria=`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub name: Option<String>,
    pub category: Option<String>,
}

impl CatalogFilter {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.category.is_none()
    }
}

/// One line of an order to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPreorderLine {
    pub item_id: i64,
    pub quantity: u32,
}

/// Payload for `POST /api/precompras/nueva`. The backend recomputes the
/// authoritative total from its own prices; unit prices are not sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPreorder {
    pub student_id: i64,
    pub lines: Vec<NewPreorderLine>,
    /// Flat per-order surcharge.
    pub surcharge: Money,
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Backend abstraction all flows route through.
///
/// Implementations must not retry internally — retry policy belongs to the
/// caller, which knows whether money has already moved.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    /// `GET /api/alimentos/` — the full purchasable catalog.
    async fn fetch_catalog(&self, filter: &CatalogFilter) -> BackendResult<Vec<CatalogItem>>;

    /// `GET /estudiantes/{id}/alimentosBloqueados` — blocked item ids for one student.
    async fn fetch_blocked_items(&self, student_id: i64) -> BackendResult<Vec<i64>>;

    /// `GET /estudiantes/cedula/{cedula}` — resolve a human-entered id.
    async fn find_student_by_cedula(&self, cedula: &str) -> BackendResult<Student>;

    /// `POST /api/precompras/nueva` — create an order; response carries the
    /// authoritative total.
    async fn create_preorder(&self, req: &NewPreorder) -> BackendResult<Preorder>;

    /// `POST /estudiantes/{id}/descargaSaldo` — debit the student's stored
    /// balance; response carries the authoritative new balance.
    async fn debit_balance(&self, student_id: i64, amount: Money) -> BackendResult<Student>;

    /// `GET /api/precompras/estudiante/{id}/pendientes` — undelivered orders.
    async fn pending_preorders(&self, student_id: i64) -> BackendResult<Vec<Preorder>>;

    /// `PATCH /api/precompras/{id}/entregar` — mark one order delivered.
    async fn mark_delivered(&self, preorder_id: i64) -> BackendResult<Preorder>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
