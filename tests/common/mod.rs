//! In-memory transport for client tests: scripted replies, recorded calls.

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{stream, TryStreamExt};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use swfs_client::transport::{Download, Transport, UploadPart};
use swfs_client::{Client, ClientConfig, Error, Result};
use url::Url;

pub const MASTER: &str = "http://master:9333";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Delete,
    Upload,
    Download,
}

/// What the fake answers with
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Raw(&'static str),
    /// Transport-level failure with this message
    Fail(&'static str),
    Status(u16),
    /// Non-2xx status with a JSON body
    StatusJson(u16, Value),
    /// Download body in chunks, optionally breaking after them
    Chunks {
        chunks: Vec<&'static str>,
        file_name: Option<&'static str>,
        broken: bool,
    },
}

impl Reply {
    pub fn body(content: &'static str) -> Self {
        Reply::Chunks {
            chunks: vec![content],
            file_name: None,
            broken: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedPart {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub url: Url,
    pub upload: Option<UploadedPart>,
}

impl Call {
    pub fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }
}

/// Replies are keyed by method and `host:port/path`. Each reply is used once, except
/// the last one queued for a key, which keeps answering.
#[derive(Default)]
pub struct FakeTransport {
    replies: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    calls: Mutex<Vec<Call>>,
}

fn key(url: &Url) -> String {
    format!(
        "{}:{}{}",
        url.host_str().unwrap_or_default(),
        url.port_or_known_default().unwrap_or_default(),
        url.path()
    )
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, method: Method, target: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry((method, target.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    /// Script `/dir/lookup` answers
    pub fn on_lookup(&self, reply: Value) -> &Self {
        self.on(Method::Get, "master:9333/dir/lookup", Reply::Json(reply))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: Method, target: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && key(&c.url) == target)
            .collect()
    }

    pub fn lookups(&self) -> usize {
        self.calls_to(Method::Get, "master:9333/dir/lookup").len()
    }

    fn record(&self, method: Method, url: &Url, upload: Option<UploadedPart>) -> Reply {
        self.calls.lock().unwrap().push(Call {
            method,
            url: url.clone(),
            upload,
        });

        let mut replies = self.replies.lock().unwrap();
        let queue = replies.get_mut(&(method, key(url)));
        match queue {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Reply::Status(404),
        }
    }

    fn into_bytes(url: &Url, reply: Reply) -> Result<Bytes> {
        match reply {
            Reply::Json(value) => Ok(Bytes::from(value.to_string())),
            Reply::Raw(body) => Ok(Bytes::from_static(body.as_bytes())),
            Reply::Fail(message) => Err(Error::Transport(message.to_string())),
            Reply::Status(status) => Err(Error::Status {
                url: url.to_string(),
                status,
                body: String::new(),
            }),
            Reply::StatusJson(status, body) => Err(Error::Status {
                url: url.to_string(),
                status,
                body: body.to_string(),
            }),
            Reply::Chunks { chunks, .. } => Ok(Bytes::from(chunks.concat())),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get(&self, url: Url) -> Result<Bytes> {
        let reply = self.record(Method::Get, &url, None);
        Self::into_bytes(&url, reply)
    }

    async fn delete(&self, url: Url) -> Result<Bytes> {
        let reply = self.record(Method::Delete, &url, None);
        Self::into_bytes(&url, reply)
    }

    async fn upload(&self, url: Url, part: UploadPart) -> Result<Bytes> {
        let chunks: Vec<Bytes> = part.body.try_collect().await?;
        let uploaded = UploadedPart {
            file_name: part.file_name,
            mime_type: part.mime_type,
            data: chunks.concat(),
        };
        let reply = self.record(Method::Upload, &url, Some(uploaded));
        Self::into_bytes(&url, reply)
    }

    async fn download(&self, url: Url) -> Result<Download> {
        match self.record(Method::Download, &url, None) {
            Reply::Chunks {
                chunks,
                file_name,
                broken,
            } => {
                let mut items: Vec<Result<Bytes>> = chunks
                    .into_iter()
                    .map(|c| Ok(Bytes::from_static(c.as_bytes())))
                    .collect();
                if broken {
                    items.push(Err(Error::Transport("connection reset".into())));
                }
                Ok(Download {
                    file_name: file_name.map(str::to_string),
                    body: Box::pin(stream::iter(items)),
                })
            }
            other => Err(Self::into_bytes(&url, other)
                .err()
                .unwrap_or_else(|| Error::Transport("not a download reply".into()))),
        }
    }
}

pub fn client(transport: &Arc<FakeTransport>) -> Client {
    client_with(transport, ClientConfig::new(MASTER))
}

pub fn client_with(transport: &Arc<FakeTransport>, config: ClientConfig) -> Client {
    Client::with_transport(&config, transport.clone()).unwrap()
}

pub fn location(url: &str, public_url: &str) -> Value {
    serde_json::json!({ "url": url, "publicUrl": public_url })
}

pub fn lookup_reply(volume_id: &str, locations: Vec<Value>) -> Value {
    serde_json::json!({ "volumeId": volume_id, "locations": locations })
}
