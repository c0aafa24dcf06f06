//! Pending-preorder fulfillment (the vendor window).
//!
//! A vendor types a student's cédula, sees that student's undelivered
//! preorders, and hands food over. Lookup is two-step against the backend
//! (cédula → student, student → pending list). After a successful delivery
//! the caller re-fetches the pending list instead of patching it locally,
//! because several vendor stations may be serving the same student.

use tracing::info;

use ctn_backend::{Backend, BackendError};
use ctn_schemas::{Preorder, Student};

// ---------------------------------------------------------------------------
// FulfillmentError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FulfillmentError {
    /// No student carries the typed cédula.
    StudentNotFound { cedula: String },
    /// No preorder with that id exists.
    OrderNotFound { order_id: i64 },
    /// The preorder was already marked delivered, here or at another
    /// station.
    AlreadyDelivered { order_id: i64 },
    /// Any other backend failure.
    Backend(BackendError),
}

impl std::fmt::Display for FulfillmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FulfillmentError::StudentNotFound { cedula } => {
                write!(f, "no student with cédula {cedula}")
            }
            FulfillmentError::OrderNotFound { order_id } => {
                write!(f, "preorder {order_id} does not exist")
            }
            FulfillmentError::AlreadyDelivered { order_id } => {
                write!(f, "preorder {order_id} was already delivered")
            }
            FulfillmentError::Backend(e) => write!(f, "fulfillment call failed: {e}"),
        }
    }
}

impl std::error::Error for FulfillmentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FulfillmentError::Backend(e) => Some(e),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Resolve a cédula to a student and fetch that student's undelivered
/// preorders.
///
/// # Errors
/// [`FulfillmentError::StudentNotFound`] when the cédula resolves to
/// nothing; [`FulfillmentError::Backend`] for everything else.
pub async fn pending_for_cedula(
    backend: &dyn Backend,
    cedula: &str,
) -> Result<(Student, Vec<Preorder>), FulfillmentError> {
    let student = match backend.find_student_by_cedula(cedula).await {
        Ok(s) => s,
        Err(e) if e.status() == Some(404) => {
            return Err(FulfillmentError::StudentNotFound {
                cedula: cedula.to_string(),
            })
        }
        Err(e) => return Err(FulfillmentError::Backend(e)),
    };

    let pending = backend
        .pending_preorders(student.id)
        .await
        .map_err(FulfillmentError::Backend)?;
    info!(
        student_id = student.id,
        pending = pending.len(),
        "pending preorders fetched"
    );
    Ok((student, pending))
}

/// Mark one preorder delivered.
///
/// The backend is the arbiter of delivery state: a 404 is
/// [`FulfillmentError::OrderNotFound`] and a 409
/// [`FulfillmentError::AlreadyDelivered`] (a concurrent station got there
/// first). Callers refresh the pending list after success.
pub async fn mark_delivered(
    backend: &dyn Backend,
    order_id: i64,
) -> Result<Preorder, FulfillmentError> {
    match backend.mark_delivered(order_id).await {
        Ok(order) => {
            info!(order_id, "preorder delivered");
            Ok(order)
        }
        Err(e) if e.status() == Some(404) => Err(FulfillmentError::OrderNotFound { order_id }),
        Err(e) if e.status() == Some(409) => Err(FulfillmentError::AlreadyDelivered { order_id }),
        Err(e) => Err(FulfillmentError::Backend(e)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ctn_testkit::{seed_student, InMemoryBackend};

    #[tokio::test]
    async fn unknown_cedula_is_student_not_found() {
        let backend = InMemoryBackend::new();
        backend.seed_student(seed_student(3, "1002003004", "Ana", 20_000));

        let err = pending_for_cedula(&backend, "9999")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            FulfillmentError::StudentNotFound {
                cedula: "9999".to_string()
            }
        );
    }

    #[tokio::test]
    async fn unknown_order_is_order_not_found() {
        let backend = InMemoryBackend::new();
        let err = mark_delivered(&backend, 42).await.unwrap_err();
        assert_eq!(err, FulfillmentError::OrderNotFound { order_id: 42 });
    }
}
