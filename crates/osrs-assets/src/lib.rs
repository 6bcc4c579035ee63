//! Game definition decoders for Old School RuneScape caches
//!
//! Each definition type is a pure decoder over bytes ([`Decode`]) with a
//! fixed place in the cache ([`Loadable`]). The [`Cache`] facade loads the
//! indices it needs up front and serves counts, single records and listings
//! of every [`AssetKind`].
//!
//! ```no_run
//! use osrs_assets::{Cache, Loadable, types::Item};
//! use osrs_cache::DiskProvider;
//! use osrs_protocol::CacheSnapshot;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = Arc::new(DiskProvider::new("osrs-cache", CacheSnapshot::osrs(1500)));
//! let cache = Cache::load(provider).await?;
//! if let Some(whip) = cache.get::<Item>(4151).await? {
//!     println!("{} costs {}", whip.name, whip.cost);
//! }
//! # Ok(())
//! # }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod cache;
pub mod error;
pub mod loadable;
pub mod params;
pub mod types;

pub use cache::{AssetKind, Cache, Listed};
pub use error::{AssetError, AssetResult};
pub use loadable::{CONFIG_INDEX, Decode, Layout, Loadable, SPRITE_INDEX, decode_record, is_unused};
pub use params::{ParamValue, Params};
