//! Request transport used for master and volume server traffic
//!
//! The client only ever talks to the cluster through the [`Transport`] trait, so a
//! caller can inject its own HTTP stack (or a fake in tests). [`HttpTransport`] is
//! the default, backed by `reqwest`.

mod http;

pub use http::HttpTransport;

use crate::common::{Params, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use std::fmt;
use std::pin::Pin;
use url::Url;

/// Body chunks of a streamed upload or download
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send + 'static>>;

/// One file sent as a multipart upload
pub struct UploadPart {
    pub file_name: String,
    pub mime_type: String,
    pub body: ByteStream,
}

impl fmt::Debug for UploadPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadPart")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

/// A download in progress
pub struct Download {
    /// File name announced by the server, if any
    pub file_name: Option<String>,
    pub body: ByteStream,
}

/// Bare HTTP verbs against absolute URLs.
///
/// Implementations return the response body on a 2xx answer, `Error::Status` on any
/// other status and `Error::Transport` on connection, timeout or stream failures.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: Url) -> Result<Bytes>;

    async fn delete(&self, url: Url) -> Result<Bytes>;

    /// POST `part` as a multipart form
    async fn upload(&self, url: Url, part: UploadPart) -> Result<Bytes>;

    async fn download(&self, url: Url) -> Result<Download>;
}

/// Join `path` onto `base` and append `params` as the query string
pub fn endpoint(base: &Url, path: &str, params: &Params) -> Url {
    let mut url = base.clone();
    url.set_path(path);
    url.set_query(None);
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params.iter());
    }
    url
}

/// URL of `fid` on the server at `host` (`host:port`), using the scheme of `base`
pub fn server_url(base: &Url, host: &str, fid: &str, params: &Params) -> Result<Url> {
    let mut url = Url::parse(&format!("{}://{}", base.scheme(), host))?;
    url.set_path(fid);
    if !params.is_empty() {
        url.query_pairs_mut().extend_pairs(params.iter());
    }
    Ok(url)
}
