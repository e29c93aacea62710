//! File identifiers: `<volumeId>,<key+cookie>` (or `<volumeId>/<key+cookie>`)

use std::fmt;

/// A parsed file identifier.
///
/// The separator is `,` when the string contains one, `/` otherwise. The identifier
/// must split into exactly two non-empty parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileId {
    raw: String,
    split: usize,
}

impl FileId {
    pub fn parse(fid: &str) -> crate::Result<Self> {
        let sep = if fid.contains(',') { ',' } else { '/' };
        let mut parts = fid.split(sep);

        match (parts.next(), parts.next(), parts.next()) {
            (Some(volume), Some(rest), None) if !volume.is_empty() && !rest.is_empty() => {
                Ok(Self {
                    raw: fid.to_string(),
                    split: volume.len(),
                })
            }
            _ => Err(crate::Error::InvalidFileId(fid.to_string())),
        }
    }

    pub fn volume_id(&self) -> &str {
        &self.raw[..self.split]
    }

    /// Needle key and cookie, everything after the separator
    pub fn rest(&self) -> &str {
        &self.raw[self.split + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl std::str::FromStr for FileId {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}
