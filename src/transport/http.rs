use super::{Download, Transport, UploadPart};
use crate::common::{content_disposition_filename, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::TryStreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response};
use std::time::Duration;
use url::Url;

/// `reqwest`-backed transport
#[derive(Clone, Debug)]
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Wrap an already configured `reqwest` client
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    async fn checked(response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let url = response.url().to_string();
        let body = response.text().await.unwrap_or_else(|e| {
            tracing::debug!("Could not read error body from {}: {}", url, e);
            String::new()
        });
        Err(crate::Error::Status {
            url,
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: Url) -> Result<Bytes> {
        let response = self.http.get(url).send().await?;
        Ok(Self::checked(response).await?.bytes().await?)
    }

    async fn delete(&self, url: Url) -> Result<Bytes> {
        let response = self.http.delete(url).send().await?;
        Ok(Self::checked(response).await?.bytes().await?)
    }

    async fn upload(&self, url: Url, part: UploadPart) -> Result<Bytes> {
        let file = Part::stream(Body::wrap_stream(part.body))
            .file_name(part.file_name)
            .mime_str(&part.mime_type)?;
        let form = Form::new().part("file", file);

        let response = self.http.post(url).multipart(form).send().await?;
        Ok(Self::checked(response).await?.bytes().await?)
    }

    async fn download(&self, url: Url) -> Result<Download> {
        let response = Self::checked(self.http.get(url).send().await?).await?;
        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(content_disposition_filename);

        Ok(Download {
            file_name,
            body: Box::pin(response.bytes_stream().map_err(crate::Error::from)),
        })
    }
}
