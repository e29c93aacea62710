//! Volume locations and server selection
//!
//! The master lists the primary replica first. Reads are spread over all replicas,
//! writes and deletes always go to the primary.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// One volume server holding a replica of a volume
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerLocation {
    /// `host:port` for server-to-server traffic
    pub url: String,
    /// `host:port` for client-facing traffic
    #[serde(rename = "publicUrl")]
    pub public_url: String,
}

impl ServerLocation {
    pub fn new(url: impl Into<String>, public_url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            public_url: public_url.into(),
        }
    }
}

/// Non-empty, primary-first list of the servers holding a volume
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VolumeLocations(Vec<ServerLocation>);

impl VolumeLocations {
    /// `None` for an empty list: no locations means the volume was not found
    pub fn new(locations: Vec<ServerLocation>) -> Option<Self> {
        if locations.is_empty() {
            None
        } else {
            Some(Self(locations))
        }
    }

    /// The primary replica
    pub fn head(&self) -> &ServerLocation {
        &self.0[0]
    }

    pub fn random_pick(&self) -> &ServerLocation {
        self.0
            .choose(&mut rand::thread_rng())
            .unwrap_or_else(|| self.head())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false, `new` rejects an empty list
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServerLocation> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ServerLocation] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a VolumeLocations {
    type Item = &'a ServerLocation;
    type IntoIter = std::slice::Iter<'a, ServerLocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Picks the server address an operation is sent to
pub trait SelectionPolicy {
    fn select<'a>(&self, locations: &'a VolumeLocations) -> &'a str;
}

/// Uniformly random replica, public address. Used for reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomReadPick;

impl SelectionPolicy for RandomReadPick {
    fn select<'a>(&self, locations: &'a VolumeLocations) -> &'a str {
        &locations.random_pick().public_url
    }
}

/// Primary replica, internal address. Used for writes and deletes.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadWritePick;

impl SelectionPolicy for HeadWritePick {
    fn select<'a>(&self, locations: &'a VolumeLocations) -> &'a str {
        &locations.head().url
    }
}

/// What the caller intends to do with a located file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl Access {
    pub fn select<'a>(&self, locations: &'a VolumeLocations) -> &'a str {
        match self {
            Access::Read => RandomReadPick.select(locations),
            Access::Write => HeadWritePick.select(locations),
        }
    }
}
