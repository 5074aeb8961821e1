//! Payload preparation: raw image bytes + options → encoded payload + hashes.
//!
//! The coordinator never touches pixels; it hands the raw source and the
//! resolved options to a [`PayloadPreparer`] and receives the wire-ready
//! payload back. Preparation failures reject the submission that triggered
//! them and never affect session state.

pub mod image;

use async_trait::async_trait;
use bytes::Bytes;

use crate::types::{HashKind, HashResult, InputEncoding, SizingMode};
use crate::Result;

pub use self::image::{ImagePreparer, SERVICE_INPUT_HEIGHT, SERVICE_INPUT_WIDTH};

/// Output of payload preparation.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedPayload {
    /// Wire payload after sizing and encoding.
    pub data: Bytes,
    /// Resolved payload format, e.g. `"raw-rgb8"` or `"png"`.
    pub format: String,
    pub encoding: InputEncoding,
    /// Requested hashes over the final payload bytes; blank digests filtered.
    pub hashes: Vec<HashResult>,
}

/// Converts a caller-supplied image source into a wire-ready payload.
#[async_trait]
pub trait PayloadPreparer: Send + Sync {
    /// Prepare one payload. Must reject with a preparation error when
    /// `sizing` is [`SizingMode::Explicit`] and the image is not at the
    /// service's fixed dimensions; with [`SizingMode::Resize`] any decodable
    /// image succeeds.
    async fn prepare(
        &self,
        image: Bytes,
        encoding: InputEncoding,
        sizing: SizingMode,
        hash_kinds: &[HashKind],
    ) -> Result<PreparedPayload>;
}
