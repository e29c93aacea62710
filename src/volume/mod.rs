//! Volume-side client logic
//!
//! - Volume locations and read/write server selection
//! - Expiring location cache
//! - Resolution of file ids through the cache and the master
//! - Assign + upload of new files

pub mod cache;
pub mod location;
pub mod resolver;
pub mod upload;

pub use cache::{CacheStats, LocationCache};
pub use location::{
    Access, HeadWritePick, RandomReadPick, SelectionPolicy, ServerLocation, VolumeLocations,
};
pub use resolver::{CacheMode, VolumeResolver, LOCATED_ATTEMPTS};
pub use upload::{UploadDescriptor, Uploader};
