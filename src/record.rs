//! Persisted anchor record.
//!
//! The host's own persistence mechanism owns the payload's storage slot; this
//! module gives it a concrete scalar record to put there. [`AnchorRecord`]
//! imposes no structure on the payload beyond the `"nil"` default.
//!
//! Hosts that embed the record in their own scene format only need the serde
//! derives. For hosts that persist anchor records standalone, the
//! `serialize-ron` and `serialize-bincode` features add ready-made codecs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::anchor::{Anchor, NIL_PAYLOAD};

/// Encoding or decoding failure in a record codec.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordFormatError {
    /// Record could not be encoded.
    #[error("encode error: {0}")]
    Encode(String),
    /// Persisted data could not be decoded into a record.
    #[error("decode error: {0}")]
    Decode(String),
}

/// The on-disk representation of one anchor: its payload, nothing else.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorRecord {
    /// The opaque payload string, as produced by the last
    /// [`on_before_serialize`](Anchor::on_before_serialize).
    pub payload: String,
}

impl Default for AnchorRecord {
    fn default() -> Self {
        Self {
            payload: NIL_PAYLOAD.to_string(),
        }
    }
}

impl AnchorRecord {
    /// Snapshots `anchor`'s payload. The host calls this after
    /// [`on_before_serialize`](Anchor::on_before_serialize) has run.
    pub fn capture(anchor: &Anchor) -> Self {
        Self {
            payload: anchor.payload.clone(),
        }
    }

    /// Writes this record's payload into a freshly created anchor. The host
    /// fires [`on_after_deserialize`](Anchor::on_after_deserialize) next.
    pub fn apply(&self, anchor: &mut Anchor) {
        anchor.payload = self.payload.clone();
    }
}

#[cfg(feature = "serialize-ron")]
impl AnchorRecord {
    /// Encodes this record as RON text.
    pub fn to_ron(&self) -> Result<String, RecordFormatError> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| RecordFormatError::Encode(e.to_string()))
    }

    /// Decodes a record from RON text.
    pub fn from_ron(text: &str) -> Result<Self, RecordFormatError> {
        ron::from_str(text).map_err(|e| RecordFormatError::Decode(e.to_string()))
    }
}

#[cfg(feature = "serialize-bincode")]
impl AnchorRecord {
    /// Encodes this record as compact bincode bytes.
    pub fn to_bincode(&self) -> Result<Vec<u8>, RecordFormatError> {
        bincode::serialize(self).map_err(|e| RecordFormatError::Encode(e.to_string()))
    }

    /// Decodes a record from bincode bytes.
    pub fn from_bincode(bytes: &[u8]) -> Result<Self, RecordFormatError> {
        bincode::deserialize(bytes).map_err(|e| RecordFormatError::Decode(e.to_string()))
    }
}
