//! Header-only probing of uploaded images.
//!
//! The host renders pixels; the core only needs to know that an upload is a
//! decodable image and how large it is, so only the header is read.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use image::ImageReader;

use crate::coords::Size;
use crate::error::CoreError;

/// A loaded image reference with its intrinsic dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSource {
    /// What goes into a share payload: a `data:` URI or an opaque reference.
    pub reference: String,
    /// Declared media type, e.g. `image/png`. Empty when unknown.
    pub media_type: String,
    /// Intrinsic size in pixels.
    pub size: Size,
}

impl ImageSource {
    /// Decode a `data:image/...;base64,` URI far enough to read its
    /// dimensions.
    pub fn from_data_uri(uri: &str) -> Result<Self, CoreError> {
        let (media_type, bytes) = decode_data_uri(uri)?;
        let (width, height) = probe_dimensions(&bytes)?;
        Ok(Self {
            reference: uri.to_string(),
            media_type,
            size: Size::new(f64::from(width), f64::from(height)),
        })
    }

    /// Resolve a share's image reference. Data URIs are probed here; any
    /// other reference (a URL or blob) needs a size the host measured.
    pub fn from_reference(reference: &str, measured: Option<Size>) -> Result<Self, CoreError> {
        if reference.starts_with("data:") {
            return Self::from_data_uri(reference);
        }
        match measured {
            Some(size) => Self::measured(reference, size),
            None => Err(CoreError::ImageDecode(format!(
                "image reference '{reference}' is not a data URI and has no measured size"
            ))),
        }
    }

    /// An image the host has already measured (for references that are not
    /// data URIs).
    pub fn measured(reference: impl Into<String>, size: Size) -> Result<Self, CoreError> {
        size.validate("image")?;
        Ok(Self {
            reference: reference.into(),
            media_type: String::new(),
            size,
        })
    }
}

/// Split a base64 data URI into its media type and decoded bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>), CoreError> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| CoreError::ImageDecode("not a data URI".to_string()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CoreError::ImageDecode("data URI has no payload".to_string()))?;
    let (media_type, encoding) = match header.split_once(';') {
        Some((media_type, params)) => (media_type, params),
        None => (header, ""),
    };
    if !media_type.starts_with("image/") {
        return Err(CoreError::ImageDecode(format!(
            "unsupported media type '{media_type}'"
        )));
    }
    if !encoding.split(';').any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(CoreError::ImageDecode(
            "only base64 data URIs are supported".to_string(),
        ));
    }
    let bytes = B64
        .decode(payload.trim())
        .map_err(|e| CoreError::ImageDecode(format!("invalid base64 payload: {e}")))?;
    Ok((media_type.to_string(), bytes))
}

/// Read width and height from an encoded image's header.
pub fn probe_dimensions(bytes: &[u8]) -> Result<(u32, u32), CoreError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CoreError::ImageDecode(e.to_string()))?;
    if reader.format().is_none() {
        return Err(CoreError::ImageDecode("unrecognised image format".to_string()));
    }
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| CoreError::ImageDecode(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(CoreError::ImageDecode(format!(
            "image has empty dimensions {width}x{height}"
        )));
    }
    Ok((width, height))
}
