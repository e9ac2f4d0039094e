//! Galley resource model
//!
//! Identity and snapshot types shared by the watch adapter, the store client
//! and the downstream processor:
//! - `ResourceKind`, `ResourceKey`, `Version`, `VersionedKey`: identity
//! - `Entry`: a materialized resource at one version
//! - `Event`: the normalized change stream item
//! - `ResourceSpec`: which kind to watch and how to reach it in the API
//! - `ProducerService`: the custom resource served by default

#![warn(missing_docs)]

pub mod entry;
pub mod event;
pub mod key;
pub mod producer_service;
pub mod spec;

pub use entry::*;
pub use event::*;
pub use key::*;
pub use producer_service::*;
pub use spec::*;
