use async_trait::async_trait;
use bytes::Bytes;
use osrs_formats::{ArchiveId, IndexId};
use osrs_protocol::{ArchiveApi, CacheSnapshot};
use std::sync::Arc;
use tracing::{debug, info};

use super::{GroupSource, MemoizedProvider};
use crate::error::CacheResult;

/// Groups fetched from the archive API, one request per group
#[derive(Clone)]
pub struct RemoteSource {
    api: Arc<dyn ArchiveApi>,
    snapshot: CacheSnapshot,
}

impl RemoteSource {
    pub fn new(api: Arc<dyn ArchiveApi>, snapshot: CacheSnapshot) -> Self {
        Self { api, snapshot }
    }

    pub fn api(&self) -> &Arc<dyn ArchiveApi> {
        &self.api
    }
}

#[async_trait]
impl GroupSource for RemoteSource {
    async fn read_group(&self, index: IndexId, group: ArchiveId) -> CacheResult<Option<Bytes>> {
        debug!("fetching group {}/{} from {}", index, group, self.snapshot);
        Ok(self.api.group(&self.snapshot, index, group).await?)
    }

    async fn read_keys(&self) -> CacheResult<Option<Bytes>> {
        Ok(Some(self.api.keys(&self.snapshot).await?))
    }
}

/// Provider reading every group from the network
pub type RemoteProvider = MemoizedProvider<RemoteSource>;

impl MemoizedProvider<RemoteSource> {
    pub fn new(api: Arc<dyn ArchiveApi>, snapshot: CacheSnapshot) -> Self {
        info!("remote provider for {}", snapshot);
        Self::with_source(RemoteSource::new(api, snapshot.clone()), snapshot)
    }
}
