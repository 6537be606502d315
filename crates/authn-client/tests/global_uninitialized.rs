//! Using the process-wide client before initialising it

use authn_client::{global, subject_from};

#[test]
#[should_panic(expected = "not initialized")]
fn test_global_panics_before_init() {
    let _ = global();
}

#[tokio::test]
#[should_panic(expected = "not initialized")]
async fn test_subject_from_panics_before_init() {
    let _ = subject_from("a.b.c").await;
}
