//! Galley runtime
//!
//! Consumes the normalized event stream of a [`Source`], keeps the current
//! set of entries and publishes immutable snapshots to a [`Distributor`]
//! once the source has fully synced.

#![warn(missing_docs)]

pub mod distributor;
pub mod error;
pub mod processor;
pub mod snapshot;
pub mod source;

pub use distributor::{Distributor, InMemoryDistributor};
pub use error::{RuntimeError, SourceError};
pub use processor::Processor;
pub use snapshot::{Snapshot, State};
pub use source::Source;
