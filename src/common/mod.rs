//! Common utilities and types shared across swfs-client

pub mod config;
pub mod error;
pub mod fid;
pub mod params;
pub mod utils;

pub use config::{CacheConfig, ClientConfig};
pub use error::{Error, Result};
pub use fid::FileId;
pub use params::{AssignRequest, GrowRequest, Params};
pub use utils::{content_disposition_filename, format_bytes, parse_duration, unix_seconds};
