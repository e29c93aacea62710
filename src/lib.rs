//! # swfs-client
//!
//! Async client for SeaweedFS-style blob clusters:
//! - Master lookups with an expiring volume location cache
//! - Random-replica reads, primary-replica writes and deletes
//! - One cache-bypassing retry when a cached location turns out stale
//! - Two-phase writes (assign on the master, stream to the volume server)
//! - Cluster maintenance: volume growth, vacuum, collection removal, status
//!
//! ## Architecture
//!
//! ```text
//!            ┌──────────────────────────────┐
//!            │            Master            │
//!            │  /dir/lookup   /dir/assign   │
//!            └──────▲───────────────▲───────┘
//!       lookup      │               │ assign
//!   ┌───────────────┴──┐      ┌─────┴────────┐
//!   │  VolumeResolver  │      │   Uploader   │
//!   │ + LocationCache  │      │              │
//!   └───────┬──────────┘      └─────┬────────┘
//!           │ GET / DELETE          │ POST (multipart)
//!   ┌───────▼───────┐   ┌───────────▼───┐   ┌──────────────┐
//!   │ Volume srv 1  │   │ Volume srv 2  │   │ Volume srv 3 │
//!   └───────────────┘   └───────────────┘   └──────────────┘
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use swfs_client::{Client, ClientConfig, Params, UploadDescriptor};
//!
//! # async fn run() -> swfs_client::Result<()> {
//! let client = Client::new(&ClientConfig::new("http://localhost:9333"))?;
//!
//! let mut file = UploadDescriptor::open("./photo.jpg").await?.with_collection("pictures");
//! client.upload(&mut file).await?;
//! let fid = file.file_id.clone().unwrap_or_default();
//!
//! let photo = client.download_bytes(&fid, &Params::new()).await?;
//! println!("{} bytes", photo.value.len());
//!
//! client.delete_file(&fid, &Params::new()).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### CLI
//! ```bash
//! swfs --master http://localhost:9333 upload ./photo.jpg --collection pictures
//! swfs download 3,01637037d6 --output ./photo.jpg
//! swfs delete 3,01637037d6
//! swfs vacuum --threshold 0.3
//! ```

pub mod client;
pub mod common;
pub mod master;
pub mod transport;
pub mod volume;

// Re-export commonly used types
pub use client::{Client, Downloaded};
pub use common::{ClientConfig, Error, FileId, Params, Result};
pub use transport::{HttpTransport, Transport};
pub use volume::{Access, UploadDescriptor};

/// Current version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
