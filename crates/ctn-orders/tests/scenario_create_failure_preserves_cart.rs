//! A failure during order creation is the clean failure mode: no order was
//! created, no money moved, the cart is preserved and a plain retry of the
//! same attempt succeeds.

use ctn_backend::BackendError;
use ctn_cart::CartLedger;
use ctn_catalog::{CatalogCache, RestrictionSet};
use ctn_orders::{SubmissionFlow, SubmissionPhase, SubmitError};
use ctn_schemas::Money;
use ctn_session::{Role, SessionContext, User};
use ctn_testkit::{seed_item, seed_student, InMemoryBackend};

#[tokio::test]
async fn create_failure_is_retryable_with_cart_intact() {
    let backend = InMemoryBackend::new();
    backend.seed_item(seed_item(1, "Almuerzo corriente", 5_000, 10));
    backend.seed_student(seed_student(3, "1002003004", "Ana", 20_000));
    backend.fail_next_create(BackendError::Status {
        status: 503,
        detail: "mantenimiento".to_string(),
    });

    let mut catalog = CatalogCache::new();
    catalog.refresh(&backend).await.unwrap();
    let restrictions = RestrictionSet::from_blocked(3, []);

    let mut session = SessionContext::new(User {
        name: "Luz".to_string(),
        role: Role::Parent,
    });
    session.select_student(3, "Ana", Money::from_pesos(20_000));
    let epoch = session.epoch();

    let mut cart = CartLedger::new();
    cart.add_line(&mut catalog, &restrictions, 1, 1).unwrap();

    let flow = SubmissionFlow::new();
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

    match &err {
        SubmitError::Backend(e) => assert!(e.is_retryable()),
        other => panic!("expected Backend, got {other:?}"),
    }
    assert_eq!(flow.phase(), SubmissionPhase::Failed);

    // Nothing happened on the money side.
    assert_eq!(backend.preorder_count(), 0);
    assert_eq!(backend.debit_calls(), 0);
    assert_eq!(cart.len(), 1);

    // Retry on the same flow goes through.
    let confirmation = flow
        .submit(
            &backend,
            &mut session,
            &mut cart,
            &restrictions,
            Money::from_pesos(100),
            epoch,
        )
        .await
        .unwrap();
    assert_eq!(confirmation.order.total, Money::from_pesos(5_100));
    assert_eq!(backend.preorder_count(), 1);
}
