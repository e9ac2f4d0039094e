//! Resource store client
//!
//! List/watch and point-read access to the external, versioned resource store
//! that Galley observes.
//!
//! # Example
//!
//! ```no_run
//! use resource::ResourceSpec;
//! use store_client::{KubeStoreClient, StoreClient};
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = KubeStoreClient::try_default(None).await?;
//! let spec = ResourceSpec::producer_service();
//!
//! // Stream notifications into a bounded sink
//! let (tx, mut rx) = mpsc::channel(64);
//! let mut subscription = client.subscribe(&spec, Duration::ZERO, tx)?;
//! subscription.start().await?;
//! while let Some(change) = rx.recv().await {
//!     println!("{}", change);
//! }
//!
//! // Read one object directly
//! let obj = client.get(&spec, "default", "billing").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod change;
pub mod convert;
pub mod error;
pub mod kube_store;
#[path = "trait.rs"]
pub mod store_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use change::{ChangeInfo, ChangeType};
pub use convert::to_domain;
pub use error::StoreError;
pub use kube_store::KubeStoreClient;
pub use store_trait::{ChangeSink, StoreClient, Subscription};
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockStoreClient;
