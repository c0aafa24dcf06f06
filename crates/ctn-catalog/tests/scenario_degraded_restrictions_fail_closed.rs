//! A failed restriction load must not silently mean "no restrictions":
//! the set empties, flags itself degraded, and returns the error so the
//! caller can warn. A later successful reload clears the degraded flag.

use ctn_backend::BackendError;
use ctn_catalog::RestrictionSet;
use ctn_testkit::{seed_student, InMemoryBackend};

#[tokio::test]
async fn failed_load_marks_set_degraded_until_reload() {
    let backend = InMemoryBackend::new();
    backend.seed_student(seed_student(3, "1002003004", "Ana", 20_000));
    backend.block_item(3, 7);

    let mut restrictions = RestrictionSet::new();
    restrictions.load_for_student(&backend, 3).await.unwrap();
    assert!(restrictions.is_blocked(7));
    assert!(!restrictions.is_degraded());

    backend.fail_blocked(Some(BackendError::Timeout));
    let err = restrictions.load_for_student(&backend, 3).await.unwrap_err();
    assert_eq!(err.student_id, 3);
    assert_eq!(err.source, BackendError::Timeout);

    // Degraded: contents unverified, nothing reported blocked.
    assert!(restrictions.is_degraded());
    assert!(!restrictions.is_blocked(7));

    backend.fail_blocked(None);
    restrictions.load_for_student(&backend, 3).await.unwrap();
    assert!(!restrictions.is_degraded());
    assert!(restrictions.is_blocked(7));
}
