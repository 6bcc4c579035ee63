//! Client for the OpenRS2 cache archive
//!
//! The archive publishes every known Old School RuneScape cache as a
//! browsable snapshot. This crate exposes the four endpoints the cache
//! providers consume behind the [`ArchiveApi`] trait:
//!
//! - the cache listing (`caches.json`)
//! - single groups, as raw container bytes
//! - the XTEA key document of a snapshot
//! - the gzip-compressed flat export of a whole snapshot
//!
//! ```no_run
//! use osrs_protocol::{ArchiveApi, ClientConfig, OpenRs2Client};
//!
//! # async fn example() -> osrs_protocol::Result<()> {
//! let client = OpenRs2Client::new(&ClientConfig::from_env())?;
//! let caches = client.list_caches().await?;
//! println!("{} caches", caches.len());
//! # Ok(())
//! # }
//! ```

#![allow(clippy::uninlined_format_args)]

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod retry;

pub use api::{ArchiveApi, Build, CacheDescriptor, CacheSnapshot, OLDSCHOOL_GAME};
pub use client::{OpenRs2Client, ensure_crypto_provider};
pub use config::ClientConfig;
pub use error::{ProtocolError, Result};
pub use retry::RetryPolicy;
