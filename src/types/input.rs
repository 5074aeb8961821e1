//! Caller-facing input model.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Content hash algorithms the service understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HashKind {
    Sha256,
    Sha512,
}

impl HashKind {
    /// Hash kinds computed when the caller does not request any explicitly.
    pub const DEFAULT_SET: [HashKind; 2] = [HashKind::Sha256, HashKind::Sha512];

    pub fn as_str(&self) -> &'static str {
        match self {
            HashKind::Sha256 => "sha-256",
            HashKind::Sha512 => "sha-512",
        }
    }
}

/// A computed content hash. Blank digests are filtered out during
/// preparation and never reach the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashResult {
    pub kind: HashKind,
    pub value: String,
}

/// Payload encoding applied after sizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputEncoding {
    #[default]
    Uncompressed,
    /// zlib deflate over the sized payload.
    Deflate,
}

/// Encoded image formats accepted for passthrough submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImageFormat {
    Png,
    Jpeg,
    Bmp,
}

impl ImageFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Bmp => "bmp",
        }
    }
}

/// How the raw image is turned into the payload the service expects.
///
/// The service accepts inputs only at its fixed dimensions. `Resize` decodes
/// the image and scales it to those dimensions as a raw RGB8 buffer;
/// `Explicit` passes the encoded bytes through unchanged and fails
/// preparation if the decoded dimensions do not already match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizingMode {
    Resize,
    Explicit(ImageFormat),
}

/// Resolved format string for a resized raw pixel payload.
pub const RAW_RGB8_FORMAT: &str = "raw-rgb8";

/// One image submission as supplied by the caller.
///
/// Unset fields fall back to defaults at submission time: affiliate to the
/// configured default, correlation id to a freshly generated v4 UUID,
/// encoding to [`InputEncoding::Uncompressed`], and hashes to
/// [`HashKind::DEFAULT_SET`]. The correlation id is the sole join key between
/// an input and its eventual result.
#[derive(Debug, Clone)]
pub struct ClassificationInput {
    pub affiliate: Option<String>,
    pub correlation_id: Option<String>,
    pub image: Bytes,
    pub encoding: Option<InputEncoding>,
    pub hashes: Option<Vec<HashKind>>,
    pub sizing: SizingMode,
}

impl ClassificationInput {
    /// Input that will be resized to the service's fixed dimensions.
    pub fn resized(image: impl Into<Bytes>) -> Self {
        Self {
            affiliate: None,
            correlation_id: None,
            image: image.into(),
            encoding: None,
            hashes: None,
            sizing: SizingMode::Resize,
        }
    }

    /// Input passed through in the stated format; the image must already be
    /// at the service's fixed dimensions.
    pub fn with_format(image: impl Into<Bytes>, format: ImageFormat) -> Self {
        Self {
            affiliate: None,
            correlation_id: None,
            image: image.into(),
            encoding: None,
            hashes: None,
            sizing: SizingMode::Explicit(format),
        }
    }

    pub fn affiliate(mut self, affiliate: impl Into<String>) -> Self {
        self.affiliate = Some(affiliate.into());
        self
    }

    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn encoding(mut self, encoding: InputEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }

    pub fn hashes(mut self, kinds: Vec<HashKind>) -> Self {
        self.hashes = Some(kinds);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_hash_set_is_two_distinct_kinds() {
        let set = HashKind::DEFAULT_SET;
        assert_eq!(set.len(), 2);
        assert_ne!(set[0], set[1]);
    }

    #[test]
    fn test_builder_style_options() {
        let input = ClassificationInput::resized(vec![1u8, 2, 3])
            .affiliate("acme")
            .correlation_id("abc")
            .encoding(InputEncoding::Deflate)
            .hashes(vec![HashKind::Sha256]);
        assert_eq!(input.affiliate.as_deref(), Some("acme"));
        assert_eq!(input.correlation_id.as_deref(), Some("abc"));
        assert_eq!(input.encoding, Some(InputEncoding::Deflate));
        assert_eq!(input.sizing, SizingMode::Resize);
    }

    #[test]
    fn test_format_strings() {
        assert_eq!(ImageFormat::Png.as_str(), "png");
        assert_eq!(HashKind::Sha512.as_str(), "sha-512");
    }
}
