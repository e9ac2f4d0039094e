//! Watch source
//!
//! Adapts a [`store_client::StoreClient`] subscription into the event stream
//! and point-read interface expected by the runtime ([`runtime::Source`]).

#![warn(missing_docs)]

pub mod adapter;
pub mod translate;

pub use adapter::{Phase, WatchSource, DEFAULT_CHANNEL_CAPACITY};
pub use translate::translate;
