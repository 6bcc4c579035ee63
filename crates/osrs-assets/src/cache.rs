//! Definition facade over one cache snapshot

use futures::future::try_join_all;
use osrs_cache::CacheProvider;
use osrs_formats::{IndexId, ReferenceTable};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AssetError, AssetResult};
use crate::loadable::{CONFIG_INDEX, Layout, Loadable, SPRITE_INDEX, decode_record, entries, record_ids};
use crate::types::{
    EnumDefinition, HealthBar, IdentityKit, Inventory, Item, Location, Npc, Overlay,
    ParamDefinition, SpriteSheet, StructDefinition, Underlay, Varbit,
};

/// Indices the facade needs before it can serve anything
const REQUIRED_INDICES: [IndexId; 2] = [CONFIG_INDEX, SPRITE_INDEX];

/// Every definition type the facade can list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Item,
    Npc,
    Location,
    Enum,
    Struct,
    Param,
    Underlay,
    Overlay,
    Varbit,
    Inventory,
    IdentityKit,
    HealthBar,
    Sprite,
}

impl AssetKind {
    pub const ALL: [Self; 13] = [
        Self::Item,
        Self::Npc,
        Self::Location,
        Self::Enum,
        Self::Struct,
        Self::Param,
        Self::Underlay,
        Self::Overlay,
        Self::Varbit,
        Self::Inventory,
        Self::IdentityKit,
        Self::HealthBar,
        Self::Sprite,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Npc => "npc",
            Self::Location => "location",
            Self::Enum => "enum",
            Self::Struct => "struct",
            Self::Param => "param",
            Self::Underlay => "underlay",
            Self::Overlay => "overlay",
            Self::Varbit => "varbit",
            Self::Inventory => "inventory",
            Self::IdentityKit => "identity-kit",
            Self::HealthBar => "health-bar",
            Self::Sprite => "sprite",
        }
    }

    pub const fn layout(self) -> Layout {
        match self {
            Self::Item => Item::LAYOUT,
            Self::Npc => Npc::LAYOUT,
            Self::Location => Location::LAYOUT,
            Self::Enum => EnumDefinition::LAYOUT,
            Self::Struct => StructDefinition::LAYOUT,
            Self::Param => ParamDefinition::LAYOUT,
            Self::Underlay => Underlay::LAYOUT,
            Self::Overlay => Overlay::LAYOUT,
            Self::Varbit => Varbit::LAYOUT,
            Self::Inventory => Inventory::LAYOUT,
            Self::IdentityKit => IdentityKit::LAYOUT,
            Self::HealthBar => HealthBar::LAYOUT,
            Self::Sprite => SpriteSheet::LAYOUT,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AssetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown asset kind: {s}"))
    }
}

/// One entry of a listing
///
/// A record that fails to decode becomes a placeholder instead of failing
/// the whole listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Listed<T> {
    Ok(T),
    Failed { id: u32, error: String },
}

impl<T> Listed<T> {
    pub fn ok(&self) -> Option<&T> {
        match self {
            Self::Ok(record) => Some(record),
            Self::Failed { .. } => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Typed definitions of one snapshot
pub struct Cache {
    provider: Arc<dyn CacheProvider>,
    config: Arc<ReferenceTable>,
    sprites: Arc<ReferenceTable>,
}

impl Cache {
    /// Fetch the required reference tables concurrently
    pub async fn load(provider: Arc<dyn CacheProvider>) -> AssetResult<Self> {
        let tables = try_join_all(REQUIRED_INDICES.map(|index| {
            let provider = Arc::clone(&provider);
            async move {
                provider
                    .get_index(index)
                    .await?
                    .ok_or(AssetError::MissingIndex(index))
            }
        }))
        .await?;
        let [config, sprites]: [Arc<ReferenceTable>; 2] = tables
            .try_into()
            .map_err(|_| AssetError::MissingIndex(SPRITE_INDEX))?;

        info!(
            "cache loaded: config revision {} ({} archives), {} sprite sheets",
            config.revision,
            config.len(),
            sprites.len()
        );
        Ok(Self {
            provider,
            config,
            sprites,
        })
    }

    pub fn provider(&self) -> &dyn CacheProvider {
        self.provider.as_ref()
    }

    /// Reference table of the config index
    pub fn config_table(&self) -> &ReferenceTable {
        &self.config
    }

    /// Number of records of `kind`
    pub async fn count(&self, kind: AssetKind) -> AssetResult<usize> {
        match kind.layout() {
            Layout::PerArchive { index } if index == SPRITE_INDEX => Ok(self.sprites.len()),
            layout => Ok(self.ids_of(layout).await?.len()),
        }
    }

    /// IDs of every record of `kind` in ascending order
    pub async fn ids(&self, kind: AssetKind) -> AssetResult<Vec<u32>> {
        self.ids_of(kind.layout()).await
    }

    async fn ids_of(&self, layout: Layout) -> AssetResult<Vec<u32>> {
        match layout {
            Layout::PerArchive { index } if index == SPRITE_INDEX => {
                Ok(self.sprites.archive_ids().map(|id| id.0).collect())
            }
            layout => record_ids(self.provider(), layout).await,
        }
    }

    /// One record, `None` when absent
    pub async fn get<T: Loadable>(&self, id: u32) -> AssetResult<Option<T>> {
        T::load(self.provider(), id).await
    }

    /// Every record of `T`, with undecodable ones as placeholders
    pub async fn list<T: Loadable>(&self) -> AssetResult<Vec<Listed<T>>> {
        let index = T::LAYOUT.index();
        let version = self.provider.get_version(index).await?;
        let listed: Vec<Listed<T>> = entries(self.provider(), T::LAYOUT)
            .await?
            .iter()
            .map(|(id, data)| match decode_record::<T>(data, *id, version) {
                Ok(record) => Listed::Ok(record),
                Err(e) => {
                    warn!("{}", e);
                    Listed::Failed {
                        id: *id,
                        error: e.to_string(),
                    }
                }
            })
            .collect();
        Ok(listed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in AssetKind::ALL {
            assert_eq!(kind.name().parse::<AssetKind>(), Ok(kind));
        }
        assert_eq!("NPC".parse::<AssetKind>(), Ok(AssetKind::Npc));
        assert!("model".parse::<AssetKind>().is_err());
    }

    #[test]
    fn test_kind_layouts() {
        assert_eq!(AssetKind::Sprite.layout().index(), SPRITE_INDEX);
        assert!(
            AssetKind::ALL
                .iter()
                .filter(|kind| **kind != AssetKind::Sprite)
                .all(|kind| kind.layout().index() == CONFIG_INDEX)
        );
    }
}
