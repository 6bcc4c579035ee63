//! Facade tests over hand-built snapshots

#![allow(clippy::unwrap_used, clippy::expect_used)]

use osrs_assets::types::{Item, Npc, SpriteSheet};
use osrs_assets::{AssetError, AssetKind, Cache, Listed, Loadable};
use osrs_cache::testing::{FakeArchive, archive_payload, container_none, reference_table};
use osrs_cache::{CacheProvider, DiskProvider, DiskStore, RemoteProvider};
use osrs_formats::{ArchiveId, IndexId};
use osrs_protocol::CacheSnapshot;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use tempfile::TempDir;

const CONFIG_REVISION: u32 = 5000;

fn item(name: &str, cost: i32) -> Vec<u8> {
    let mut data = vec![2];
    data.extend_from_slice(name.as_bytes());
    data.push(0);
    data.push(12);
    data.extend_from_slice(&cost.to_be_bytes());
    data.push(0);
    data
}

/// 1x1 sheet with one green pixel
fn sprite() -> Vec<u8> {
    vec![
        0, 1, 0x00, 0xFF, 0x00, 0x00, 0x01, 0x00, 0x01, 1, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
        0x00, 0x01, 0x00, 0x01,
    ]
}

/// Groups of a snapshot: item archive with a used, an unused, a used and a
/// corrupt slot, one NPC and one sprite sheet
fn groups() -> Vec<(IndexId, ArchiveId, Vec<u8>)> {
    let config = reference_table(
        CONFIG_REVISION,
        &[(9, 0, vec![0]), (10, 0, vec![0, 1, 2, 3])],
    );
    let sprites = reference_table(12, &[(5, 0, vec![0])]);

    let whip = item("Abyssal whip", 120_001);
    let coins = item("Coins", 1);
    let items = archive_payload(&[&whip[..], &[0][..], &coins[..], &[200, 0][..]]);

    let mut guard = vec![2];
    guard.extend_from_slice(b"Guard\0");
    guard.push(0);

    vec![
        (IndexId::META, ArchiveId(2), config),
        (IndexId::META, ArchiveId(8), sprites),
        (IndexId(2), ArchiveId(9), guard),
        (IndexId(2), ArchiveId(10), items),
        (IndexId(8), ArchiveId(5), sprite()),
    ]
}

async fn remote_cache() -> (Arc<FakeArchive>, Cache) {
    let fake = FakeArchive::new();
    for (index, group, payload) in groups() {
        fake.insert_group(index, group, container_none(&payload));
    }
    let provider = Arc::new(RemoteProvider::new(fake.clone(), CacheSnapshot::osrs(1)));
    let cache = Cache::load(provider).await.unwrap();
    (fake, cache)
}

#[tokio::test]
async fn test_counts_skip_unused_slots() {
    let (_, cache) = remote_cache().await;
    assert_eq!(cache.count(AssetKind::Item).await.unwrap(), 3);
    assert_eq!(cache.ids(AssetKind::Item).await.unwrap(), vec![0, 2, 3]);
    assert_eq!(cache.count(AssetKind::Npc).await.unwrap(), 1);
    assert_eq!(cache.count(AssetKind::Sprite).await.unwrap(), 1);
    assert_eq!(cache.count(AssetKind::Enum).await.unwrap(), 0);
    assert_eq!(cache.config_table().revision, CONFIG_REVISION);
}

#[tokio::test]
async fn test_get_single_records() {
    let (fake, cache) = remote_cache().await;

    let whip = cache.get::<Item>(0).await.unwrap().unwrap();
    assert_eq!(whip.name, "Abyssal whip");
    assert_eq!(whip.cost, 120_001);
    assert!(cache.get::<Item>(1).await.unwrap().is_none());
    assert!(cache.get::<Item>(99).await.unwrap().is_none());
    assert_eq!(cache.get::<Npc>(0).await.unwrap().unwrap().name, "Guard");

    let sheet = cache.get::<SpriteSheet>(5).await.unwrap().unwrap();
    assert_eq!(sheet.frames[0].pixels, vec![0xFF00_FF00]);
    assert!(cache.get::<SpriteSheet>(6).await.unwrap().is_none());

    // Item lookups share one fetch of the item archive
    assert_eq!(fake.group_calls(IndexId(2), ArchiveId(10)), 1);
}

#[tokio::test]
async fn test_corrupt_record_is_annotated() {
    let (_, cache) = remote_cache().await;

    let err = cache.get::<Item>(3).await.unwrap_err();
    assert!(matches!(err, AssetError::Decode { kind: "item", id: 3, .. }));

    let err = Item::load_all(cache.provider()).await.unwrap_err();
    assert!(matches!(err, AssetError::Decode { id: 3, .. }));
}

#[tokio::test]
async fn test_listing_keeps_going_past_corrupt_record() {
    let (_, cache) = remote_cache().await;

    let listed = cache.list::<Item>().await.unwrap();
    assert_eq!(listed.len(), 3);
    assert_eq!(listed[0].ok().unwrap().name, "Abyssal whip");
    assert_eq!(listed[1].ok().unwrap().name, "Coins");
    assert!(matches!(&listed[2], Listed::Failed { id: 3, .. }));
    assert_eq!(listed.iter().filter(|entry| entry.is_failed()).count(), 1);
}

#[tokio::test]
async fn test_missing_sprite_index_fails_load() {
    let fake = FakeArchive::new();
    fake.insert_table(IndexId(2), &reference_table(1, &[(10, 0, vec![0])]));
    let provider = Arc::new(RemoteProvider::new(fake, CacheSnapshot::osrs(1)));

    let err = Cache::load(provider).await.err().unwrap();
    assert!(matches!(err, AssetError::MissingIndex(IndexId(8))));
}

#[tokio::test]
async fn test_facade_over_disk_snapshot() {
    let temp = TempDir::new().unwrap();
    let snapshot = CacheSnapshot::osrs(77);
    let store = DiskStore::new(temp.path(), &snapshot);
    for (index, group, payload) in groups() {
        store
            .write_group(index, group, container_none(&payload))
            .await
            .unwrap();
    }

    let provider = Arc::new(DiskProvider::new(temp.path(), snapshot));
    let version = provider.get_version(IndexId(2)).await.unwrap();
    assert_eq!(version.index_revision, CONFIG_REVISION);

    let cache = Cache::load(provider).await.unwrap();
    let coins = cache.get::<Item>(2).await.unwrap().unwrap();
    assert_eq!(coins.name, "Coins");
    assert_eq!(coins.id, 2);
}
