//! Query parameters understood by the master and volume servers
//!
//! The names are part of the wire contract and must match exactly.

use std::collections::BTreeMap;

/// Collection the file or volume belongs to
pub const COLLECTION: &str = "collection";
/// Time to live, e.g. `3m`, `4h`, `5d`, `6w`, `7M`, `8y`
pub const TTL: &str = "ttl";
/// How many file ids to reserve, or how many volumes to grow
pub const COUNT: &str = "count";
/// Replication class, e.g. `001`
pub const REPLICATION: &str = "replication";
pub const DATA_CENTER: &str = "dataCenter";
pub const VOLUME_ID: &str = "volumeId";
/// Prettified JSON answers. Should normally be left unset.
pub const PRETTY: &str = "pretty";
/// Fraction of reclaimable space above which a volume gets vacuumed
pub const GARBAGE_THRESHOLD: &str = "garbageThreshold";
/// Modification time hint on upload, Unix seconds
pub const MOD_TIME: &str = "ts";

/// Ordered set of query parameters, one value per name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: BTreeMap<String, String>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters carrying an optional collection and TTL; empty values are not sent.
    pub fn normalize(collection: Option<&str>, ttl: Option<&str>) -> Self {
        Self::new().collection(collection).ttl(ttl)
    }

    /// Set a value, replacing any previous one for that name
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Set `name` only when `value` is present and non-empty
    pub fn with_opt(mut self, name: &str, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.set(name, value);
        }
        self
    }

    pub fn collection(self, collection: Option<&str>) -> Self {
        self.with_opt(COLLECTION, collection)
    }

    pub fn ttl(self, ttl: Option<&str>) -> Self {
        self.with_opt(TTL, ttl)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Arguments of `/dir/assign`
#[derive(Debug, Clone, Default)]
pub struct AssignRequest {
    pub count: u32,
    pub collection: Option<String>,
    pub replication: Option<String>,
    pub data_center: Option<String>,
    pub ttl: Option<String>,
}

impl AssignRequest {
    pub fn to_params(&self) -> Params {
        let params = Params::normalize(self.collection.as_deref(), self.ttl.as_deref())
            .with_opt(REPLICATION, self.replication.as_deref())
            .with_opt(DATA_CENTER, self.data_center.as_deref());
        if self.count > 0 {
            params.with(COUNT, self.count.to_string())
        } else {
            params
        }
    }
}

/// Arguments of `/vol/grow`
#[derive(Debug, Clone, Default)]
pub struct GrowRequest {
    /// Number of empty volumes to pre-allocate
    pub count: u32,
    pub collection: Option<String>,
    pub replication: Option<String>,
    pub data_center: Option<String>,
    pub ttl: Option<String>,
}

impl GrowRequest {
    pub fn to_params(&self) -> Params {
        let params = Params::normalize(self.collection.as_deref(), self.ttl.as_deref())
            .with_opt(REPLICATION, self.replication.as_deref())
            .with_opt(DATA_CENTER, self.data_center.as_deref());
        if self.count > 0 {
            params.with(COUNT, self.count.to_string())
        } else {
            params
        }
    }
}
