//! Order submission state machine.
//!
//! # Design
//!
//! A single submission attempt moves through an explicit state machine:
//!
//! ```text
//!   Idle ──► Validating ──► Submitting ──► DebitingBalance ──► Confirmed
//!               │                │                │
//!               ▼                ▼                ▼
//!           Rejected          Failed       PartiallyFailed
//!        (local, cart      (no order       (order EXISTS,
//!         preserved)        created,        debit did not
//!                           retryable)      happen)
//! ```
//!
//! The backend exposes order creation and balance debit as two separate
//! calls with no transaction around them. The machine exists to make the
//! resulting failure modes explicit instead of accidental:
//!
//! - Everything that can be rejected locally is rejected in `Validating`,
//!   before any network call.
//! - A failure in `Submitting` is clean: no order, no money moved, the
//!   cart is preserved and the caller may retry.
//! - A failure in `DebitingBalance` is the partial-failure window: the
//!   order exists but the balance was not debited.
//!   [`SubmitError::PartiallyFailed`] carries the created order id and the
//!   attempt id, is logged at `error`, and must reach a human. It is never
//!   collapsed into a generic failure.
//!
//! # Re-entry
//!
//! One attempt at a time. A second `submit` while one is outstanding fails
//! [`SubmitError::SubmissionInProgress`] before any work, so a double-click
//! cannot create a duplicate order. The guard is a `Cell`, which makes
//! [`SubmissionFlow`] deliberately not `Sync`: one flow per screen.

use std::cell::Cell;

use tracing::{debug, error, info};
use uuid::Uuid;

use ctn_backend::{Backend, BackendError, NewPreorder, NewPreorderLine};
use ctn_cart::CartLedger;
use ctn_catalog::RestrictionSet;
use ctn_schemas::{Money, Preorder};
use ctn_session::SessionContext;

// ---------------------------------------------------------------------------
// SubmissionPhase
// ---------------------------------------------------------------------------

/// Phases a submission attempt can occupy. Terminal phases persist on the
/// flow until the next attempt begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmissionPhase {
    /// No attempt in flight.
    #[default]
    Idle,
    /// Local checks: cart non-empty, restrictions, cached balance.
    Validating,
    /// `POST /api/precompras/nueva` in flight.
    Submitting,
    /// Order created; `POST /estudiantes/{id}/descargaSaldo` in flight.
    DebitingBalance,
    /// Order created and balance debited. **Terminal.**
    Confirmed,
    /// Local validation refused the attempt; nothing sent. **Terminal.**
    Rejected,
    /// Order creation failed; no order exists. **Terminal.**
    Failed,
    /// Order created but the debit failed. **Terminal.**
    PartiallyFailed,
}

impl SubmissionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Confirmed | Self::Rejected | Self::Failed | Self::PartiallyFailed
        )
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Local refusals from the `Validating` phase. No network call was made and
/// the cart is untouched; the user can fix the cart and try again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Nothing in the cart.
    EmptyCart,
    /// A cart line is blocked for the selected student. Restrictions can
    /// change mid-session, so this re-checks every line even though
    /// `add_line` already refused blocked items.
    BlockedItem { item_id: i64 },
    /// `subtotal + surcharge` exceeds the cached balance. Advisory — the
    /// debit endpoint re-checks against the stored balance — but failing
    /// here avoids creating an order that cannot be paid.
    InsufficientBalance { required: Money, available: Money },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::EmptyCart => write!(f, "cart is empty"),
            ValidationError::BlockedItem { item_id } => {
                write!(f, "item {item_id} is blocked for this student")
            }
            ValidationError::InsufficientBalance {
                required,
                available,
            } => write!(
                f,
                "balance {available} is below the order total {required}"
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Everything `submit` can fail with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    /// Another attempt is outstanding on this flow.
    SubmissionInProgress,
    /// No student is selected in the session.
    NoStudentSelected,
    /// The selection changed after the order screen bound to its student.
    /// Cart preserved; the caller must re-bind and re-validate.
    StaleStudentContext,
    /// Refused locally before any network call.
    Validation(ValidationError),
    /// Order creation failed; no order exists and the cart is preserved.
    Backend(BackendError),
    /// The order was created but the balance debit failed. The order id and
    /// amount are the reconciliation handle; the cart has been cleared (the
    /// order exists) and the cached balance was left untouched.
    PartiallyFailed {
        order_id: i64,
        amount: Money,
        attempt_id: Uuid,
        source: BackendError,
    },
}

impl std::fmt::Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::SubmissionInProgress => {
                write!(f, "a submission attempt is already in progress")
            }
            SubmitError::NoStudentSelected => write!(f, "no student selected"),
            SubmitError::StaleStudentContext => {
                write!(f, "student selection changed; order screen is stale")
            }
            SubmitError::Validation(e) => write!(f, "order rejected: {e}"),
            SubmitError::Backend(e) => write!(f, "order creation failed: {e}"),
            SubmitError::PartiallyFailed {
                order_id,
                amount,
                attempt_id,
                source,
            } => write!(
                f,
                "order {order_id} created but debit of {amount} failed \
                 (attempt {attempt_id}): {source}"
            ),
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmitError::Validation(e) => Some(e),
            SubmitError::Backend(e) => Some(e),
            SubmitError::PartiallyFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ValidationError> for SubmitError {
    fn from(e: ValidationError) -> Self {
        SubmitError::Validation(e)
    }
}

// ---------------------------------------------------------------------------
// Confirmation
// ---------------------------------------------------------------------------

/// A fully settled attempt: the order as the backend stored it, and the
/// authoritative balance returned by the debit endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Confirmation {
    pub order: Preorder,
    pub new_balance: Money,
    pub attempt_id: Uuid,
}

// ---------------------------------------------------------------------------
// SubmissionFlow
// ---------------------------------------------------------------------------

/// Drives one order attempt at a time through the submission state machine.
///
/// Not `Sync` on purpose: the re-entry guard is a `Cell`, scoping a flow to
/// a single screen/task. Dropping the flow mid-attempt releases the guard.
#[derive(Debug, Default)]
pub struct SubmissionFlow {
    in_flight: Cell<bool>,
    phase: Cell<SubmissionPhase>,
}

/// Releases the re-entry guard when the attempt ends, normally or by early
/// return.
struct InFlightGuard<'a> {
    flow: &'a SubmissionFlow,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flow.in_flight.set(false);
    }
}

impl SubmissionFlow {
    pub fn new() -> Self {
        Self {
            in_flight: Cell::new(false),
            phase: Cell::new(SubmissionPhase::Idle),
        }
    }

    /// Phase the last (or current) attempt reached.
    pub fn phase(&self) -> SubmissionPhase {
        self.phase.get()
    }

    fn begin(&self) -> Result<InFlightGuard<'_>, SubmitError> {
        if self.in_flight.get() {
            return Err(SubmitError::SubmissionInProgress);
        }
        self.in_flight.set(true);
        Ok(InFlightGuard { flow: self })
    }

    fn transition(&self, to: SubmissionPhase) {
        debug!(from = ?self.phase.get(), to = ?to, "submission phase");
        self.phase.set(to);
    }

    /// Submit the cart as one preorder for the selected student.
    ///
    /// `screen_epoch` is the session epoch the order screen captured when it
    /// bound to the current selection; if the selection has changed since
    /// (or changes before the create request goes out), the attempt fails
    /// [`SubmitError::StaleStudentContext`] with the cart preserved. Once
    /// the create request has succeeded the attempt runs to completion for
    /// the captured student.
    ///
    /// On success the cart is cleared and the session's cached balance is
    /// set to the debit endpoint's authoritative value.
    ///
    /// # Errors
    /// See [`SubmitError`]. Only
    /// [`PartiallyFailed`](SubmitError::PartiallyFailed) leaves money-state
    /// behind that needs reconciliation.
    pub async fn submit(
        &self,
        backend: &dyn Backend,
        session: &mut SessionContext,
        cart: &mut CartLedger,
        restrictions: &RestrictionSet,
        surcharge: Money,
        screen_epoch: u64,
    ) -> Result<Confirmation, SubmitError> {
        let _guard = self.begin()?;

        let (student_id, available) = match session.selected() {
            Some(sel) => (sel.id, sel.balance),
            None => {
                self.transition(SubmissionPhase::Rejected);
                return Err(SubmitError::NoStudentSelected);
            }
        };
        if session.epoch() != screen_epoch {
            self.transition(SubmissionPhase::Rejected);
            return Err(SubmitError::StaleStudentContext);
        }

        // --- Validating: everything local, before any network call -------
        self.transition(SubmissionPhase::Validating);
        if let Err(e) = validate(cart, restrictions, surcharge, available) {
            self.transition(SubmissionPhase::Rejected);
            return Err(e.into());
        }

        let attempt_id = Uuid::new_v4();
        let estimate = cart.subtotal().saturating_add(surcharge);
        info!(
            %attempt_id,
            student_id,
            lines = cart.len(),
            estimate = %estimate,
            "submitting preorder"
        );

        // Last look at the selection before the order becomes real.
        if session.epoch() != screen_epoch {
            self.transition(SubmissionPhase::Rejected);
            return Err(SubmitError::StaleStudentContext);
        }

        // --- Submitting ---------------------------------------------------
        self.transition(SubmissionPhase::Submitting);
        let req = NewPreorder {
            student_id,
            lines: cart
                .lines()
                .map(|l| NewPreorderLine {
                    item_id: l.item_id,
                    quantity: l.quantity,
                })
                .collect(),
            surcharge,
        };
        let order = match backend.create_preorder(&req).await {
            Ok(order) => order,
            Err(e) => {
                self.transition(SubmissionPhase::Failed);
                info!(%attempt_id, error = %e, "preorder creation failed; cart preserved");
                return Err(SubmitError::Backend(e));
            }
        };

        // --- DebitingBalance ----------------------------------------------
        // From here the order exists. The debit uses the backend's
        // authoritative total, not the local estimate.
        self.transition(SubmissionPhase::DebitingBalance);
        match backend.debit_balance(student_id, order.total).await {
            Ok(student) => {
                self.transition(SubmissionPhase::Confirmed);
                cart.clear();
                session.set_balance(student.balance);
                info!(
                    %attempt_id,
                    order_id = order.id,
                    total = %order.total,
                    new_balance = %student.balance,
                    "preorder confirmed"
                );
                Ok(Confirmation {
                    order,
                    new_balance: student.balance,
                    attempt_id,
                })
            }
            Err(source) => {
                self.transition(SubmissionPhase::PartiallyFailed);
                error!(
                    %attempt_id,
                    order_id = order.id,
                    student_id,
                    amount = %order.total,
                    error = %source,
                    "preorder created but balance debit FAILED; needs reconciliation"
                );
                // The order exists, so the cart must not be resubmittable;
                // the cached balance stays untouched because no debit landed.
                cart.clear();
                Err(SubmitError::PartiallyFailed {
                    order_id: order.id,
                    amount: order.total,
                    attempt_id,
                    source,
                })
            }
        }
    }
}

fn validate(
    cart: &CartLedger,
    restrictions: &RestrictionSet,
    surcharge: Money,
    available: Money,
) -> Result<(), ValidationError> {
    if cart.is_empty() {
        return Err(ValidationError::EmptyCart);
    }
    for line in cart.lines() {
        if restrictions.is_blocked(line.item_id) {
            return Err(ValidationError::BlockedItem {
                item_id: line.item_id,
            });
        }
    }
    let required = cart.subtotal().saturating_add(surcharge);
    if required > available {
        return Err(ValidationError::InsufficientBalance {
            required,
            available,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ctn_testkit::{seed_item, seed_student, InMemoryBackend};

    fn seeded_backend() -> InMemoryBackend {
        let b = InMemoryBackend::new();
        b.seed_item(seed_item(1, "Almuerzo corriente", 5_000, 10));
        b.seed_student(seed_student(3, "1002003004", "Ana", 20_000));
        b
    }

    fn parent_session() -> SessionContext {
        let mut ctx = SessionContext::new(ctn_session::User {
            name: "Luz".to_string(),
            role: ctn_session::Role::Parent,
        });
        ctx.select_student(3, "Ana", Money::from_pesos(20_000));
        ctx
    }

    #[test]
    fn flow_starts_idle() {
        let flow = SubmissionFlow::new();
        assert_eq!(flow.phase(), SubmissionPhase::Idle);
        assert!(!flow.phase().is_terminal());
    }

    #[test]
    fn terminal_phases_are_terminal() {
        assert!(SubmissionPhase::Confirmed.is_terminal());
        assert!(SubmissionPhase::Rejected.is_terminal());
        assert!(SubmissionPhase::Failed.is_terminal());
        assert!(SubmissionPhase::PartiallyFailed.is_terminal());
        assert!(!SubmissionPhase::DebitingBalance.is_terminal());
    }

    #[tokio::test]
    async fn second_submit_while_guard_held_is_refused_without_work() {
        let backend = seeded_backend();
        let mut session = parent_session();
        let epoch = session.epoch();
        let mut cart = CartLedger::new();
        let restrictions = RestrictionSet::from_blocked(3, []);

        let flow = SubmissionFlow::new();
        let _held = flow.begin().unwrap();

        let err = flow
            .submit(
                &backend,
                &mut session,
                &mut cart,
                &restrictions,
                Money::from_pesos(100),
                epoch,
            )
            .await
            .unwrap_err();
        assert_eq!(err, SubmitError::SubmissionInProgress);
        assert_eq!(backend.create_calls(), 0);
    }

    #[tokio::test]
    async fn guard_released_after_attempt_completes() {
        let backend = seeded_backend();
        let mut session = parent_session();
        let epoch = session.epoch();
        let mut cart = CartLedger::new();
        let restrictions = RestrictionSet::from_blocked(3, []);

        let flow = SubmissionFlow::new();
        // Empty cart → rejected, but the guard must be released.
        let first = flow
            .submit(
                &backend,
                &mut session,
                &mut cart,
                &restrictions,
                Money::from_pesos(100),
                epoch,
            )
            .await;
        assert_eq!(
            first,
            Err(SubmitError::Validation(ValidationError::EmptyCart))
        );
        assert_eq!(flow.phase(), SubmissionPhase::Rejected);

        let second = flow
            .submit(
                &backend,
                &mut session,
                &mut cart,
                &restrictions,
                Money::from_pesos(100),
                epoch,
            )
            .await;
        assert_ne!(second, Err(SubmitError::SubmissionInProgress));
    }

    #[tokio::test]
    async fn no_student_selected_is_refused() {
        let backend = seeded_backend();
        let mut session = SessionContext::new(ctn_session::User {
            name: "Luz".to_string(),
            role: ctn_session::Role::Parent,
        });
        let epoch = session.epoch();
        let mut cart = CartLedger::new();
        let restrictions = RestrictionSet::new();

        let err = SubmissionFlow::new()
            .submit(
                &backend,
                &mut session,
                &mut cart,
                &restrictions,
                Money::ZERO,
                epoch,
            )
            .await
            .unwrap_err();
        assert_eq!(err, SubmitError::NoStudentSelected);
        assert_eq!(backend.create_calls(), 0);
    }

    #[test]
    fn validate_orders_checks_deterministically() {
        // Blocked item reported before balance, regardless of amounts.
        let mut cart_catalog = ctn_catalog::CatalogCache::from_items([seed_item(
            7,
            "Gaseosa",
            2_000,
            5,
        )]);
        let mut cart = CartLedger::new();
        cart.add_line(
            &mut cart_catalog,
            &RestrictionSet::from_blocked(3, []),
            7,
            1,
        )
        .unwrap();

        let blocked_now = RestrictionSet::from_blocked(3, [7]);
        assert_eq!(
            validate(&cart, &blocked_now, Money::ZERO, Money::ZERO),
            Err(ValidationError::BlockedItem { item_id: 7 })
        );
    }
}
