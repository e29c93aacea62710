//! Master API
//!
//! The master is the directory authority of the cluster: it knows which volume
//! servers hold which volumes, reserves new file ids and runs cluster-wide
//! maintenance (volume growth, vacuum, collection removal).

pub mod types;

pub use types::{AssignResult, ClusterStatus, LookupResult, SubmitResult, SystemStatus};

use crate::common::{params, AssignRequest, GrowRequest, Params, Result};
use crate::transport::{endpoint, Transport, UploadPart};
use crate::volume::location::VolumeLocations;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use types::{Ack, LookupResponse};
use url::Url;

const LOOKUP: &str = "/dir/lookup";
const ASSIGN: &str = "/dir/assign";
const STATUS: &str = "/dir/status";
const CLUSTER_STATUS: &str = "/cluster/status";
const GROW: &str = "/vol/grow";
const VACUUM: &str = "/vol/vacuum";
const DELETE_COLLECTION: &str = "/col/delete";
const SUBMIT: &str = "/submit";

/// Thin client over the master HTTP endpoints
#[derive(Clone)]
pub struct MasterClient {
    base: Url,
    transport: Arc<dyn Transport>,
}

impl MasterClient {
    pub fn new(base: Url, transport: Arc<dyn Transport>) -> Self {
        Self { base, transport }
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn get(&self, path: &str, params: &Params) -> Result<Bytes> {
        let url = endpoint(&self.base, path, params);
        tracing::debug!("GET {}", url);
        self.transport.get(url).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, params: &Params) -> Result<T> {
        let body = self.get(path, params).await?;
        decode(path, &body)
    }

    /// Like `get_json`, but a non-2xx answer carrying an `error` field is decoded too,
    /// so the caller reports the master's own message.
    async fn get_answer<T: DeserializeOwned>(&self, path: &str, params: &Params) -> Result<T> {
        let body = error_answer(self.get(path, params).await)?;
        decode(path, &body)
    }

    /// Call an endpoint whose answer is only an acknowledgement
    async fn get_ack(&self, path: &str, params: &Params) -> Result<()> {
        let body = error_answer(self.get(path, params).await)?;
        // Acknowledgements are not always JSON; only an explicit error field counts.
        let ack: Ack = serde_json::from_slice(&body).unwrap_or_default();
        if ack.error.is_empty() {
            Ok(())
        } else {
            Err(crate::Error::Rejected {
                endpoint: path.to_string(),
                message: ack.error,
            })
        }
    }

    /// Locations of `volume_id`, straight from the master.
    ///
    /// `params` may carry filters such as the known collection.
    pub async fn lookup(&self, volume_id: &str, params: &Params) -> Result<LookupResult> {
        let params = params.clone().with(params::VOLUME_ID, volume_id);
        let response: LookupResponse = self.get_answer(LOOKUP, &params).await?;

        if !response.error.is_empty() {
            return Err(crate::Error::LookupFailed(response.error));
        }
        let locations =
            VolumeLocations::new(response.locations).ok_or_else(|| crate::Error::FileNotFound {
                volume_id: volume_id.to_string(),
            })?;

        let volume_id = if response.volume_id.is_empty() {
            volume_id.to_string()
        } else {
            response.volume_id
        };
        Ok(LookupResult {
            volume_id,
            locations,
        })
    }

    /// Reserve file ids and pick the volume server to write to
    pub async fn assign(&self, request: &AssignRequest) -> Result<AssignResult> {
        let result: AssignResult = self.get_answer(ASSIGN, &request.to_params()).await?;

        if result.count == 0 || !result.error.is_empty() {
            let message = if result.error.is_empty() {
                "no file id assigned".to_string()
            } else {
                result.error
            };
            return Err(crate::Error::AssignFailed(message));
        }
        if result.file_id.is_empty() || result.url.is_empty() {
            return Err(crate::Error::AssignFailed(format!(
                "incomplete assignment: fid {:?}, url {:?}",
                result.file_id, result.url
            )));
        }

        tracing::debug!("Assigned {} on {}", result.file_id, result.url);
        Ok(result)
    }

    /// Pre-allocate empty volumes
    pub async fn grow(&self, request: &GrowRequest) -> Result<()> {
        self.grow_with(&request.to_params()).await
    }

    pub async fn grow_with(&self, params: &Params) -> Result<()> {
        tracing::info!("Growing volumes: {:?}", params);
        self.get_ack(GROW, params).await
    }

    /// Vacuum volumes whose reclaimable fraction is above `threshold`
    pub async fn vacuum(&self, threshold: f64) -> Result<()> {
        tracing::info!("Vacuuming volumes above garbage threshold {}", threshold);
        let params = Params::new().with(params::GARBAGE_THRESHOLD, threshold.to_string());
        self.get_ack(VACUUM, &params).await
    }

    pub async fn delete_collection(&self, params: &Params) -> Result<()> {
        tracing::info!("Deleting collection: {:?}", params);
        self.get_ack(DELETE_COLLECTION, params).await
    }

    pub async fn status(&self) -> Result<SystemStatus> {
        self.get_json(STATUS, &Params::new()).await
    }

    pub async fn cluster_status(&self) -> Result<ClusterStatus> {
        self.get_json(CLUSTER_STATUS, &Params::new()).await
    }

    /// Send a file to the master, which assigns and stores it in one call
    pub async fn submit(&self, part: UploadPart, params: &Params) -> Result<SubmitResult> {
        let url = endpoint(&self.base, SUBMIT, params);
        tracing::debug!("POST {} ({})", url, part.file_name);
        let body = error_answer(self.transport.upload(url, part).await)?;
        let result: SubmitResult = decode(SUBMIT, &body)?;

        if !result.error.is_empty() {
            return Err(crate::Error::UploadFailed(result.error));
        }
        Ok(result)
    }
}

/// Turn a non-2xx answer whose body is JSON with a non-empty `error` field back into
/// a body, leaving every other failure as it is.
///
/// Masters and volume servers report refusals (unknown volume, no free volumes, read-only
/// volume) this way, with a 4xx/5xx status.
pub(crate) fn error_answer(result: Result<Bytes>) -> Result<Bytes> {
    match result {
        Err(crate::Error::Status { body, .. })
            if serde_json::from_str::<Ack>(&body).is_ok_and(|ack| !ack.error.is_empty()) =>
        {
            Ok(Bytes::from(body))
        }
        other => other,
    }
}

pub(crate) fn decode<T: DeserializeOwned>(endpoint: &str, body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| crate::Error::decode(endpoint, e, body))
}
