//! Integration tests for the Kubernetes store client
//!
//! These tests require a reachable cluster with the ProducerService CRD
//! installed (`cargo run -p resource --bin crdgen | kubectl apply -f -`).
//! Set WATCH_NAMESPACE to pick the namespace used for point reads.

use resource::ResourceSpec;
use store_client::{ChangeType, KubeStoreClient, StoreClient, StoreError};
use std::time::Duration;
use tokio::sync::mpsc;

fn namespace() -> String {
    std::env::var("WATCH_NAMESPACE").unwrap_or_else(|_| "default".to_string())
}

#[tokio::test]
#[ignore] // Requires running cluster
async fn test_initial_list_ends_with_full_sync() {
    let client = KubeStoreClient::try_default(Some(namespace()))
        .await
        .expect("Failed to create client");

    let (tx, mut rx) = mpsc::channel(1024);
    let mut subscription = client
        .subscribe(&ResourceSpec::producer_service(), Duration::ZERO, tx)
        .expect("Failed to subscribe");
    subscription.start().await.expect("Failed to start watch");

    let full_sync = tokio::time::timeout(Duration::from_secs(30), async {
        while let Some(change) = rx.recv().await {
            println!("{}", change);
            if change.change_type == ChangeType::FullSync {
                return true;
            }
        }
        false
    })
    .await
    .expect("Timed out waiting for full sync");

    subscription.stop().await;
    assert!(full_sync);
}

#[tokio::test]
#[ignore]
async fn test_get_missing_object() {
    let client = KubeStoreClient::try_default(None)
        .await
        .expect("Failed to create client");

    let result = client
        .get(&ResourceSpec::producer_service(), &namespace(), "does-not-exist-0d3c")
        .await;
    assert!(matches!(result, Err(StoreError::NotFound(_))));
}
