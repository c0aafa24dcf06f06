//! Vendor fulfillment end to end: look up a student by cédula, see the
//! pending preorder, mark it delivered, and observe it gone on the next
//! fetch. A second delivery of the same order fails as already delivered
//! (another station may have raced us).

use ctn_backend::{Backend, NewPreorder, NewPreorderLine};
use ctn_orders::{mark_delivered, pending_for_cedula, FulfillmentError};
use ctn_schemas::Money;
use ctn_testkit::{seed_item, seed_student, InMemoryBackend};

async fn backend_with_pending_order() -> (InMemoryBackend, i64) {
    let backend = InMemoryBackend::new();
    backend.seed_item(seed_item(1, "Almuerzo corriente", 5_000, 10));
    backend.seed_student(seed_student(3, "1002003004", "Ana", 20_000));

    let order = backend
        .create_preorder(&NewPreorder {
            student_id: 3,
            lines: vec![NewPreorderLine {
                item_id: 1,
                quantity: 1,
            }],
            surcharge: Money::from_pesos(100),
        })
        .await
        .unwrap();
    (backend, order.id)
}

#[tokio::test]
async fn delivered_order_disappears_from_pending_on_refresh() {
    let (backend, order_id) = backend_with_pending_order().await;

    let (student, pending) = pending_for_cedula(&backend, "1002003004").await.unwrap();
    assert_eq!(student.id, 3);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, order_id);

    let delivered = mark_delivered(&backend, order_id).await.unwrap();
    assert!(delivered.delivered);
    assert!(delivered.delivered_at.is_some());

    // The pending list is re-fetched, not patched locally.
    let (_, pending) = pending_for_cedula(&backend, "1002003004").await.unwrap();
    assert!(pending.is_empty());
}

#[tokio::test]
async fn double_delivery_is_already_delivered() {
    let (backend, order_id) = backend_with_pending_order().await;

    mark_delivered(&backend, order_id).await.unwrap();
    let err = mark_delivered(&backend, order_id).await.unwrap_err();
    assert_eq!(err, FulfillmentError::AlreadyDelivered { order_id });
}
