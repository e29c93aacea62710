//! Public client
//!
//! Every data operation is two steps: find the volume server through the master
//! (or the location cache), then talk to that server directly. Reads go to a random
//! replica, writes and deletes to the primary. An operation that fails against a
//! cached location is retried once with a fresh lookup.

use crate::common::{AssignRequest, ClientConfig, FileId, GrowRequest, Params, Result};
use crate::master::{
    AssignResult, ClusterStatus, LookupResult, MasterClient, SubmitResult, SystemStatus,
};
use crate::transport::{server_url, ByteStream, HttpTransport, Transport};
use crate::volume::{
    Access, CacheMode, CacheStats, LocationCache, UploadDescriptor, Uploader, VolumeResolver,
    LOCATED_ATTEMPTS,
};
use bytes::{Bytes, BytesMut};
use futures_util::TryStreamExt;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use url::Url;

/// Result of a download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Downloaded<T> {
    /// File name announced by the volume server
    pub file_name: Option<String>,
    /// What the consumer produced from the content
    pub value: T,
}

pub struct Client {
    master: MasterClient,
    resolver: VolumeResolver,
    uploader: Uploader,
    transport: Arc<dyn Transport>,
}

impl Client {
    /// Client over the default HTTP transport
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Client over a caller-provided transport
    pub fn with_transport(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let base = Url::parse(&config.master_url)?;
        let master = MasterClient::new(base, transport.clone());

        Ok(Self {
            resolver: VolumeResolver::new(master.clone(), LocationCache::new(config.cache())),
            uploader: Uploader::new(master.clone(), transport.clone(), config.max_file_size),
            master,
            transport,
        })
    }

    pub fn master(&self) -> &MasterClient {
        &self.master
    }

    pub fn resolver(&self) -> &VolumeResolver {
        &self.resolver
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.resolver.cache_stats()
    }

    /// Stop the location cache sweeper and forget all cached locations
    pub fn close(&mut self) {
        self.resolver.close();
    }

    // === Cluster maintenance ===

    /// Pre-allocate empty volumes
    pub async fn grow(&self, request: &GrowRequest) -> Result<()> {
        self.master.grow(request).await
    }

    pub async fn grow_with(&self, params: &Params) -> Result<()> {
        self.master.grow_with(params).await
    }

    /// Force garbage collection of volumes with more than `threshold` reclaimable space
    pub async fn garbage_collect(&self, threshold: f64) -> Result<()> {
        self.master.vacuum(threshold).await
    }

    pub async fn delete_collection(&self, params: &Params) -> Result<()> {
        self.master.delete_collection(params).await
    }

    pub async fn status(&self) -> Result<SystemStatus> {
        self.master.status().await
    }

    pub async fn cluster_status(&self) -> Result<ClusterStatus> {
        self.master.cluster_status().await
    }

    // === Lookups ===

    /// Ask the master for the locations of a volume, bypassing the cache
    pub async fn lookup(&self, volume_id: &str, params: &Params) -> Result<LookupResult> {
        self.master.lookup(volume_id, params).await
    }

    /// Address of the server to use for `fid`: a random replica's public address
    /// for reads, the primary's internal address for writes.
    pub async fn lookup_server_by_file_id(
        &self,
        fid: &str,
        params: &Params,
        access: Access,
    ) -> Result<String> {
        let fid = FileId::parse(fid)?;
        let locations = self
            .resolver
            .resolve(&fid, params, CacheMode::Use)
            .await?;
        Ok(access.select(&locations).to_string())
    }

    /// Full URL of `fid` on the server picked for `access`
    pub async fn lookup_full_url_by_file_id(
        &self,
        fid: &str,
        params: &Params,
        access: Access,
    ) -> Result<Url> {
        let server = self.lookup_server_by_file_id(fid, params, access).await?;
        server_url(self.master.base_url(), &server, fid, &Params::new())
    }

    // === Reads and deletes ===

    /// Hand the content of `fid` to `consumer` as a stream of chunks.
    ///
    /// A transport failure, including one surfacing from the body stream inside the
    /// consumer, triggers one retry against a freshly looked-up replica. The consumer
    /// is then called again with a new stream that starts from the first byte.
    pub async fn download<F, Fut, T>(
        &self,
        fid: &str,
        params: &Params,
        mut consumer: F,
    ) -> Result<Downloaded<T>>
    where
        F: FnMut(ByteStream) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let fid = FileId::parse(fid)?;
        let mut attempt = 0;
        loop {
            let locations = self
                .resolver
                .resolve(&fid, params, LOCATED_ATTEMPTS[attempt])
                .await?;
            let server = Access::Read.select(&locations);
            let url = server_url(self.master.base_url(), server, fid.as_str(), &Params::new())?;

            match self.fetch(url, &mut consumer).await {
                Ok(downloaded) => return Ok(downloaded),
                Err(e) if e.is_retryable() && attempt + 1 < LOCATED_ATTEMPTS.len() => {
                    tracing::warn!(
                        "Download of {} from {} failed: {}, retrying with a fresh lookup",
                        fid,
                        server,
                        e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Download `fid` into memory
    pub async fn download_bytes(&self, fid: &str, params: &Params) -> Result<Downloaded<Bytes>> {
        self.download(fid, params, |body| async move {
            let data = body
                .try_fold(BytesMut::new(), |mut data, chunk| async move {
                    data.extend_from_slice(&chunk);
                    Ok::<_, crate::Error>(data)
                })
                .await?;
            Ok::<_, crate::Error>(data.freeze())
        })
        .await
    }

    async fn fetch<F, Fut, T>(&self, url: Url, consumer: &mut F) -> Result<Downloaded<T>>
    where
        F: FnMut(ByteStream) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        tracing::debug!("GET {}", url);
        let download = self.transport.download(url).await?;
        let value = consumer(download.body).await?;
        Ok(Downloaded {
            file_name: download.file_name,
            value,
        })
    }

    /// Delete `fid` on its primary replica, retrying once with a fresh lookup
    pub async fn delete_file(&self, fid: &str, params: &Params) -> Result<()> {
        let fid = FileId::parse(fid)?;
        let mut attempt = 0;
        loop {
            let locations = self
                .resolver
                .resolve(&fid, params, LOCATED_ATTEMPTS[attempt])
                .await?;
            let server = Access::Write.select(&locations);
            let url = server_url(self.master.base_url(), server, fid.as_str(), &Params::new())?;
            tracing::debug!("DELETE {}", url);

            match self.transport.delete(url).await {
                Ok(_) => return Ok(()),
                Err(e) if e.is_retryable() && attempt + 1 < LOCATED_ATTEMPTS.len() => {
                    tracing::warn!(
                        "Delete of {} on {} failed: {}, retrying with a fresh lookup",
                        fid,
                        server,
                        e
                    );
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    // === Writes ===

    /// Reserve file ids without uploading anything
    pub async fn assign(&self, request: &AssignRequest) -> Result<AssignResult> {
        self.master.assign(request).await
    }

    /// Assign a file id and upload the descriptor's content
    pub async fn upload(&self, descriptor: &mut UploadDescriptor) -> Result<AssignResult> {
        self.uploader.upload(descriptor).await
    }

    /// Upload a local file
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        collection: Option<&str>,
        ttl: Option<&str>,
    ) -> Result<(AssignResult, UploadDescriptor)> {
        let mut descriptor = UploadDescriptor::open(path).await?;
        descriptor.collection = collection.map(str::to_string);
        descriptor.ttl = ttl.map(str::to_string);
        let assign = self.uploader.upload(&mut descriptor).await?;
        Ok((assign, descriptor))
    }

    /// Let the master assign and store the descriptor's content in one call
    pub async fn submit(&self, descriptor: &mut UploadDescriptor) -> Result<SubmitResult> {
        self.uploader.submit(descriptor).await
    }

    /// Submit a local file to the master
    pub async fn submit_file(
        &self,
        path: impl AsRef<Path>,
        collection: Option<&str>,
        ttl: Option<&str>,
    ) -> Result<SubmitResult> {
        let mut descriptor = UploadDescriptor::open(path).await?;
        descriptor.collection = collection.map(str::to_string);
        descriptor.ttl = ttl.map(str::to_string);
        self.uploader.submit(&mut descriptor).await
    }
}
