//! Two-phase write: assign a file id on the master, then stream the content to the
//! assigned volume server.

use crate::common::{params, unix_seconds, AssignRequest, Params, Result};
use crate::master::{decode, error_answer, AssignResult, MasterClient, SubmitResult};
use crate::transport::{server_url, Transport, UploadPart};
use futures_util::TryStreamExt;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_util::io::ReaderStream;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Content source of an upload
pub type ContentReader = Box<dyn AsyncRead + Send + Unpin + 'static>;

/// A file to upload, plus what the cluster told us about it once stored.
///
/// The content is consumed by the first upload or submit: it is moved into the
/// request and dropped (closed) when the transfer ends, successfully or not.
pub struct UploadDescriptor {
    content: Option<ContentReader>,
    pub file_name: String,
    /// Declared size; the stored size must match it
    pub file_size: u64,
    pub mime_type: Option<String>,
    /// Modification time, Unix seconds
    pub mod_time: Option<i64>,
    pub collection: Option<String>,
    /// Time to live, e.g. `3m`, `4h`, `5d`, `6w`, `7M`, `8y`
    pub ttl: Option<String>,

    /// Volume server that stored the file
    pub server: Option<String>,
    pub file_id: Option<String>,
    pub etag: Option<String>,
}

impl fmt::Debug for UploadDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadDescriptor")
            .field("file_name", &self.file_name)
            .field("file_size", &self.file_size)
            .field("mime_type", &self.mime_type)
            .field("mod_time", &self.mod_time)
            .field("collection", &self.collection)
            .field("ttl", &self.ttl)
            .field("server", &self.server)
            .field("file_id", &self.file_id)
            .field("etag", &self.etag)
            .field("consumed", &self.content.is_none())
            .finish()
    }
}

impl UploadDescriptor {
    /// Describe content read from `reader`; name and size must be known up front
    pub fn from_reader(
        reader: impl AsyncRead + Send + Unpin + 'static,
        file_name: impl Into<String>,
        file_size: u64,
    ) -> Self {
        let file_name = file_name.into();
        let mime_type = guess_mime_type(&file_name);
        Self {
            content: Some(Box::new(reader)),
            file_name,
            file_size,
            mime_type,
            mod_time: None,
            collection: None,
            ttl: None,
            server: None,
            file_id: None,
            etag: None,
        }
    }

    /// Open a local file, taking name, size and modification time from it
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        let meta = file.metadata().await?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut descriptor = Self::from_reader(file, file_name, meta.len());
        descriptor.mod_time = meta.modified().ok().map(unix_seconds);
        Ok(descriptor)
    }

    /// Open many files; on the first failure the ones already opened are closed
    pub async fn open_all<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Self>> {
        let mut descriptors = Vec::with_capacity(paths.len());
        for path in paths {
            descriptors.push(Self::open(path).await?);
        }
        Ok(descriptors)
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    pub fn with_ttl(mut self, ttl: impl Into<String>) -> Self {
        self.ttl = Some(ttl.into());
        self
    }

    /// Has the content already been sent?
    pub fn is_consumed(&self) -> bool {
        self.content.is_none()
    }

    pub fn effective_mime_type(&self) -> &str {
        self.mime_type
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MIME_TYPE)
    }

    fn params(&self) -> Params {
        Params::normalize(self.collection.as_deref(), self.ttl.as_deref())
    }

    /// Take the content as a multipart part, reading at most `limit` bytes
    fn take_part(&mut self, limit: u64) -> Result<UploadPart> {
        let reader = self
            .content
            .take()
            .ok_or(crate::Error::ContentUnavailable)?;
        let body = ReaderStream::new(reader.take(limit)).map_err(crate::Error::from);

        Ok(UploadPart {
            file_name: self.file_name.clone(),
            mime_type: self.effective_mime_type().to_string(),
            body: Box::pin(body),
        })
    }
}

fn guess_mime_type(file_name: &str) -> Option<String> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    mime_guess::from_ext(&ext)
        .first_raw()
        .map(str::to_string)
}

/// Assigns file ids and streams content to volume servers
#[derive(Clone)]
pub struct Uploader {
    master: MasterClient,
    transport: Arc<dyn Transport>,
    max_file_size: u64,
}

impl Uploader {
    pub fn new(master: MasterClient, transport: Arc<dyn Transport>, max_file_size: u64) -> Self {
        Self {
            master,
            transport,
            max_file_size,
        }
    }

    /// Assign a file id, then upload the descriptor's content to the assigned server.
    ///
    /// On success `file_id`, `etag` and `server` of the descriptor are set. They are
    /// left untouched on any failure, including a stored size that differs from the
    /// declared one.
    pub async fn upload(&self, descriptor: &mut UploadDescriptor) -> Result<AssignResult> {
        if descriptor.is_consumed() {
            return Err(crate::Error::ContentUnavailable);
        }

        let assign = self
            .master
            .assign(&AssignRequest {
                collection: descriptor.collection.clone(),
                ttl: descriptor.ttl.clone(),
                ..Default::default()
            })
            .await?;

        let mut params = descriptor.params();
        if let Some(mod_time) = descriptor.mod_time.filter(|t| *t != 0) {
            params.set(params::MOD_TIME, mod_time.to_string());
        }
        let url = server_url(self.master.base_url(), &assign.url, &assign.file_id, &params)?;

        let part = descriptor.take_part(self.max_file_size)?;
        tracing::debug!("POST {} ({}, {} bytes)", url, part.file_name, descriptor.file_size);
        let body = error_answer(self.transport.upload(url, part).await)?;

        let stored: crate::master::types::UploadResponse = decode(&assign.file_id, &body)?;
        if !stored.error.is_empty() {
            return Err(crate::Error::UploadFailed(stored.error));
        }
        if stored.size != descriptor.file_size {
            return Err(crate::Error::SizeMismatch {
                expected: descriptor.file_size,
                actual: stored.size,
            });
        }

        descriptor.file_id = Some(assign.file_id.clone());
        descriptor.server = Some(assign.url.clone());
        descriptor.etag = Some(stored.etag);
        tracing::info!(
            "Uploaded {} as {} to {}",
            descriptor.file_name,
            assign.file_id,
            assign.url
        );
        Ok(assign)
    }

    /// Send the descriptor's content to the master's `/submit` endpoint
    pub async fn submit(&self, descriptor: &mut UploadDescriptor) -> Result<SubmitResult> {
        let params = descriptor.params();
        let part = descriptor.take_part(self.max_file_size)?;
        let result = self.master.submit(part, &params).await?;

        if result.size != descriptor.file_size {
            return Err(crate::Error::SizeMismatch {
                expected: descriptor.file_size,
                actual: result.size,
            });
        }
        descriptor.file_id = Some(result.file_id.clone());
        tracing::info!("Submitted {} as {}", descriptor.file_name, result.file_id);
        Ok(result)
    }
}
