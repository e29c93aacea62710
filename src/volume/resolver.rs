//! File id → volume locations, through the location cache

use crate::common::{FileId, Params, Result};
use crate::master::MasterClient;
use crate::volume::cache::{CacheStats, LocationCache};
use crate::volume::location::VolumeLocations;
use std::sync::Arc;

/// Whether a resolve may be answered from the location cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    Use,
    Bypass,
}

/// Cache modes of the successive attempts of an operation against a located server.
///
/// The first attempt trusts the cache; when it fails at the transport level the
/// location may be stale (volume moved, server gone), so the one retry asks the
/// master again. There is never a third attempt.
pub const LOCATED_ATTEMPTS: [CacheMode; 2] = [CacheMode::Use, CacheMode::Bypass];

pub struct VolumeResolver {
    master: MasterClient,
    cache: LocationCache,
}

impl VolumeResolver {
    pub fn new(master: MasterClient, cache: LocationCache) -> Self {
        Self { master, cache }
    }

    /// Locations of the volume holding `fid`.
    ///
    /// With [`CacheMode::Use`] a live cache entry answers without any network call.
    /// Otherwise the master is asked and its answer replaces the cached entry.
    pub async fn resolve(
        &self,
        fid: &FileId,
        params: &Params,
        mode: CacheMode,
    ) -> Result<Arc<VolumeLocations>> {
        let volume_id = fid.volume_id();

        if mode == CacheMode::Use {
            if let Some(locations) = self.cache.get(volume_id) {
                tracing::debug!("Location cache hit for volume {}", volume_id);
                return Ok(locations);
            }
            tracing::debug!("Location cache miss for volume {}", volume_id);
        }

        let lookup = self.master.lookup(volume_id, params).await?;
        let locations = Arc::new(lookup.locations);
        self.cache.put(volume_id, locations.clone());
        Ok(locations)
    }

    /// Parse `fid` and resolve it
    pub async fn resolve_str(
        &self,
        fid: &str,
        params: &Params,
        mode: CacheMode,
    ) -> Result<Arc<VolumeLocations>> {
        self.resolve(&FileId::parse(fid)?, params, mode).await
    }

    pub fn cache(&self) -> &LocationCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub(crate) fn close(&mut self) {
        self.cache.close();
    }
}
