//! Command-line front end for the OSRS cache crates
//!
//! Reads go through a [`HybridProvider`] rooted at the cache directory, so
//! every command leaves the groups it touched on disk for the next run.

#![allow(clippy::uninlined_format_args)]

pub mod cli;

pub use cli::{Cli, Command};

use anyhow::{Context, Result, bail};
use osrs_assets::types::{
    EnumDefinition, HealthBar, IdentityKit, Inventory, Item, Location, Npc, Overlay,
    ParamDefinition, SpriteSheet, StructDefinition, Underlay, Varbit,
};
use osrs_assets::{AssetKind, Cache, Loadable};
use osrs_cache::{
    CacheConfig, CacheInstaller, HybridProvider, JsonMetadataStore, LatestCacheResolver,
    RefreshMode,
};
use osrs_protocol::{ArchiveApi, CacheDescriptor, CacheSnapshot, ClientConfig, OpenRs2Client};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Everything a command needs, built once from the arguments
struct Session {
    cli: Cli,
    api: Arc<dyn ArchiveApi>,
    config: CacheConfig,
}

impl Session {
    fn new(cli: Cli) -> Result<Self> {
        let mut client_config = ClientConfig::from_env();
        if let Some(url) = &cli.archive_url {
            client_config = client_config.with_base_url(url.clone());
        }
        let api = Arc::new(
            OpenRs2Client::new(&client_config).context("invalid archive client configuration")?,
        );

        let mut config = CacheConfig::from_env();
        if let Some(dir) = &cli.cache_dir {
            config.cache_dir.clone_from(dir);
        }
        Ok(Self { cli, api, config })
    }

    /// Explicit snapshot, or the latest one for the game
    async fn snapshot(&self) -> Result<CacheSnapshot> {
        if let Some(id) = self.cli.cache_id {
            return Ok(CacheSnapshot::osrs(id));
        }
        let store = Arc::new(JsonMetadataStore::new(self.config.metadata_path()));
        let resolver = LatestCacheResolver::new(Arc::clone(&self.api), store, &self.config);
        let mode = if self.cli.refresh {
            RefreshMode::Forced
        } else {
            RefreshMode::Background
        };
        let Some(latest) = resolver.resolve(&self.cli.game, mode).await? else {
            bail!("the archive lists no {} caches", self.cli.game);
        };
        latest
            .snapshot()
            .with_context(|| format!("cache {} is not an Old School cache", latest.id))
    }

    async fn cache(&self) -> Result<(Arc<HybridProvider>, Cache)> {
        let snapshot = self.snapshot().await?;
        let provider = Arc::new(HybridProvider::new(
            &self.config.cache_dir,
            Arc::clone(&self.api),
            snapshot,
        ));
        let cache = Cache::load(provider.clone()).await?;
        Ok((provider, cache))
    }
}

/// Run one parsed command
pub async fn run(cli: Cli) -> Result<()> {
    let command = cli.command.clone();
    let session = Session::new(cli)?;
    match command {
        Command::Caches { limit } => list_caches(&session, limit).await,
        Command::Install => {
            let snapshot = session.snapshot().await?;
            let report = CacheInstaller::new(Arc::clone(&session.api), &session.config.cache_dir)
                .install(&snapshot)
                .await?;
            print_json(&report_json(&snapshot, report))
        }
        Command::Count { kind } => {
            let (provider, cache) = session.cache().await?;
            let count = cache.count(kind).await;
            provider.flush().await;
            println!("{}", count?);
            Ok(())
        }
        Command::Show { kind, id } => {
            let (provider, cache) = session.cache().await?;
            let record = show(&cache, kind, id).await;
            provider.flush().await;
            match record? {
                Some(value) => print_json(&value),
                None => bail!("{} {} not found", kind, id),
            }
        }
    }
}

async fn list_caches(session: &Session, limit: usize) -> Result<()> {
    let mut caches: Vec<CacheDescriptor> = session
        .api
        .list_caches()
        .await?
        .into_iter()
        .filter(|cache| cache.game == session.cli.game)
        .collect();
    caches.sort_by(|a, b| {
        if a.is_newer_than(b) {
            std::cmp::Ordering::Less
        } else if b.is_newer_than(a) {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });
    info!("{} {} caches listed", caches.len(), session.cli.game);

    for cache in caches.iter().take(limit) {
        let builds: Vec<String> = cache.builds.iter().map(ToString::to_string).collect();
        println!(
            "{:>6}  {:<24}  {:<8}  {}",
            cache.id,
            cache.timestamp.as_deref().unwrap_or("-"),
            cache.environment,
            builds.join(", ")
        );
    }
    Ok(())
}

async fn get_json<T: Loadable + Serialize>(
    cache: &Cache,
    id: u32,
) -> Result<Option<serde_json::Value>> {
    cache
        .get::<T>(id)
        .await?
        .map(serde_json::to_value)
        .transpose()
        .map_err(Into::into)
}

async fn show(cache: &Cache, kind: AssetKind, id: u32) -> Result<Option<serde_json::Value>> {
    match kind {
        AssetKind::Item => get_json::<Item>(cache, id).await,
        AssetKind::Npc => get_json::<Npc>(cache, id).await,
        AssetKind::Location => get_json::<Location>(cache, id).await,
        AssetKind::Enum => get_json::<EnumDefinition>(cache, id).await,
        AssetKind::Struct => get_json::<StructDefinition>(cache, id).await,
        AssetKind::Param => get_json::<ParamDefinition>(cache, id).await,
        AssetKind::Underlay => get_json::<Underlay>(cache, id).await,
        AssetKind::Overlay => get_json::<Overlay>(cache, id).await,
        AssetKind::Varbit => get_json::<Varbit>(cache, id).await,
        AssetKind::Inventory => get_json::<Inventory>(cache, id).await,
        AssetKind::IdentityKit => get_json::<IdentityKit>(cache, id).await,
        AssetKind::HealthBar => get_json::<HealthBar>(cache, id).await,
        AssetKind::Sprite => get_json::<SpriteSheet>(cache, id).await,
    }
}

fn report_json(snapshot: &CacheSnapshot, report: osrs_cache::InstallReport) -> serde_json::Value {
    serde_json::json!({
        "cache": snapshot.id,
        "written": report.written,
        "existing": report.existing,
        "skipped": report.skipped,
        "evicted": report.evicted,
    })
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use osrs_cache::InstallReport;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_json() {
        let report = InstallReport {
            written: 3,
            existing: 1,
            skipped: 0,
            evicted: 2,
        };
        let value = report_json(&CacheSnapshot::osrs(42), report);
        assert_eq!(value["cache"], 42);
        assert_eq!(value["written"], 3);
        assert_eq!(value["evicted"], 2);
    }
}
