//! Cache providers for Old School RuneScape snapshots
//!
//! A provider gives typed, memoized access to one published cache build.
//! Three flavours share the same [`CacheProvider`] surface:
//!
//! - [`RemoteProvider`] reads groups straight from the archive API
//! - [`DiskProvider`] reads a local snapshot directory
//! - [`HybridProvider`] reads disk first and writes remote hits back
//!
//! [`CacheInstaller`] seeds a snapshot directory in bulk from the flat export,
//! and [`LatestCacheResolver`] finds the newest snapshot without polling the
//! archive on every start.
//!
//! ```no_run
//! use osrs_cache::{CacheProvider, HybridProvider};
//! use osrs_formats::IndexId;
//! use osrs_protocol::{CacheSnapshot, OpenRs2Client};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = Arc::new(OpenRs2Client::with_defaults()?);
//! let provider = HybridProvider::new("osrs-cache", api, CacheSnapshot::osrs(1500));
//! if let Some(table) = provider.get_index(IndexId(2)).await? {
//!     println!("config index has {} archives", table.len());
//! }
//! provider.flush().await;
//! # Ok(())
//! # }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod config;
pub mod error;
pub mod installer;
pub mod latest;
pub mod provider;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::CacheConfig;
pub use error::{CacheError, CacheResult};
pub use installer::{CacheInstaller, InstallReport};
pub use latest::{
    JsonMetadataStore, LatestCacheResolver, LatestRecord, MemoryMetadataStore, MetadataStore,
    RefreshMode,
};
pub use provider::{
    CacheProvider, DiskProvider, DiskStore, GroupSource, HybridProvider, HybridSource,
    MemoizedProvider, RemoteProvider, RemoteSource, group_file_name,
};
