//! Default image preparer: decode, size, compress, hash.
//!
//! Decoding and resizing are CPU-bound, so the work runs on the blocking
//! pool rather than the async executor.

use std::io::Write;

use async_trait::async_trait;
use bytes::Bytes;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::imageops::FilterType;
use sha2::{Digest, Sha256, Sha512};

use super::{PayloadPreparer, PreparedPayload};
use crate::types::input::RAW_RGB8_FORMAT;
use crate::types::{HashKind, HashResult, InputEncoding, SizingMode};
use crate::{Error, ErrorContext, Result};

/// Fixed input width the service expects.
pub const SERVICE_INPUT_WIDTH: u32 = 224;
/// Fixed input height the service expects.
pub const SERVICE_INPUT_HEIGHT: u32 = 224;

/// Prepares payloads with the `image` crate.
///
/// `Resize` submissions are scaled to the fixed dimensions and emitted as a
/// raw RGB8 buffer (canonical channel order). `Explicit` submissions pass the
/// encoded bytes through unchanged but are rejected when the decoded
/// dimensions do not match.
#[derive(Debug, Clone)]
pub struct ImagePreparer {
    width: u32,
    height: u32,
}

impl ImagePreparer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ImagePreparer {
    fn default() -> Self {
        Self::new(SERVICE_INPUT_WIDTH, SERVICE_INPUT_HEIGHT)
    }
}

#[async_trait]
impl PayloadPreparer for ImagePreparer {
    async fn prepare(
        &self,
        image: Bytes,
        encoding: InputEncoding,
        sizing: SizingMode,
        hash_kinds: &[HashKind],
    ) -> Result<PreparedPayload> {
        let width = self.width;
        let height = self.height;
        let kinds = hash_kinds.to_vec();

        tokio::task::spawn_blocking(move || {
            prepare_blocking(image, encoding, sizing, &kinds, width, height)
        })
        .await
        .map_err(|e| {
            Error::preparation_with_context(
                format!("preparation task failed: {e}"),
                ErrorContext::new().with_source("image_preparer"),
            )
        })?
    }
}

fn prepare_blocking(
    image: Bytes,
    encoding: InputEncoding,
    sizing: SizingMode,
    hash_kinds: &[HashKind],
    width: u32,
    height: u32,
) -> Result<PreparedPayload> {
    let decoded = image::load_from_memory(&image).map_err(|e| {
        Error::preparation_with_context(
            format!("failed to decode image: {e}"),
            ErrorContext::new().with_source("image_preparer"),
        )
    })?;

    let (sized, format) = match sizing {
        SizingMode::Resize => {
            let resized = decoded.resize_exact(width, height, FilterType::Triangle);
            (Bytes::from(resized.to_rgb8().into_raw()), RAW_RGB8_FORMAT.to_string())
        }
        SizingMode::Explicit(format) => {
            if decoded.width() != width || decoded.height() != height {
                return Err(Error::preparation_with_context(
                    "image dimensions do not match the service input size",
                    ErrorContext::new()
                        .with_details(format!(
                            "expected {}x{}, got {}x{}",
                            width,
                            height,
                            decoded.width(),
                            decoded.height()
                        ))
                        .with_source("image_preparer"),
                ));
            }
            (image, format.as_str().to_string())
        }
    };

    let data = match encoding {
        InputEncoding::Uncompressed => sized,
        InputEncoding::Deflate => deflate(&sized)?,
    };

    let hashes = hash_kinds
        .iter()
        .map(|kind| HashResult {
            kind: *kind,
            value: digest(*kind, &data),
        })
        .filter(|h| !h.value.trim().is_empty())
        .collect();

    Ok(PreparedPayload {
        data,
        format,
        encoding,
        hashes,
    })
}

fn deflate(data: &[u8]) -> Result<Bytes> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(Bytes::from(encoder.finish()?))
}

fn digest(kind: HashKind, data: &[u8]) -> String {
    use std::fmt::Write as _;

    let raw = match kind {
        HashKind::Sha256 => Sha256::digest(data).to_vec(),
        HashKind::Sha512 => Sha512::digest(data).to_vec(),
    };
    let mut out = String::with_capacity(raw.len() * 2);
    for byte in raw {
        // Writing to a String is infallible.
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
