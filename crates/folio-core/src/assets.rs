//! Uploaded image assets, the drag-and-drop payload and data URLs.

use crate::ids::{AssetId, IdGenerator};
use crate::model::{self, ElementType, PageElement};
use base64::{Engine, engine::general_purpose::STANDARD};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

/// Transfer key carrying an [`AssetPayload`] during drag-and-drop.
pub const ASSET_DRAG_KEY: &str = "application/x-asset";

/// Asset errors.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Not an image: {0}")]
    NotAnImage(String),
    #[error("Failed to decode image {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to read image {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AssetError>;

/// Image formats accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
}

impl ImageFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "png" => Some(ImageFormat::Png),
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            _ => None,
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }
        None
    }
}

/// Encode bytes as a `data:<mime>;base64,` URL.
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Split a base64 data URL into its MIME type and decoded bytes.
pub fn parse_data_url(src: &str) -> Option<(String, Vec<u8>)> {
    let rest = src.strip_prefix("data:")?;
    let (header, data) = rest.split_once(',')?;
    let mime_type = header.strip_suffix(";base64")?;
    let bytes = STANDARD.decode(data.trim()).ok()?;
    Some((mime_type.to_string(), bytes))
}

/// A file handed over by a file picker or an OS drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    /// MIME type reported by the source, e.g. `image/png`.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Build from a file name alone, guessing the MIME type from the extension
    /// and falling back to the magic bytes.
    pub fn from_path_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let format = name
            .rsplit_once('.')
            .and_then(|(_, ext)| ImageFormat::from_extension(ext))
            .or_else(|| ImageFormat::from_magic_bytes(&bytes));
        let mime_type = format.map_or("application/octet-stream", |f| f.mime_type());
        Self::new(name, mime_type, bytes)
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// An image in the asset library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedAsset {
    pub id: AssetId,
    pub name: String,
    /// Data URL holding the full image.
    pub src: String,
    pub natural_width: u32,
    pub natural_height: u32,
    /// Size of the original file in bytes.
    pub byte_size: usize,
}

impl UploadedAsset {
    /// Drag payload that drops this asset as an image element.
    pub fn payload(&self) -> AssetPayload {
        AssetPayload {
            element_type: ElementType::Image,
            src: Some(self.src.clone()),
            file_name: Some(self.name.clone()),
            natural_width: Some(f64::from(self.natural_width)),
            natural_height: Some(f64::from(self.natural_height)),
        }
    }
}

/// Decode an uploaded file into an asset record.
///
/// Non-image MIME types are rejected before any decoding happens.
pub fn decode_upload(file: &UploadedFile, ids: &mut dyn IdGenerator) -> Result<UploadedAsset> {
    if !file.is_image() {
        return Err(AssetError::NotAnImage(file.mime_type.clone()));
    }
    let reader = image::ImageReader::new(Cursor::new(&file.bytes))
        .with_guessed_format()
        .map_err(|source| AssetError::Io { name: file.name.clone(), source })?;
    let (natural_width, natural_height) = reader
        .into_dimensions()
        .map_err(|source| AssetError::Decode { name: file.name.clone(), source })?;

    Ok(UploadedAsset {
        id: ids.asset_id(),
        name: file.name.clone(),
        src: to_data_url(&file.mime_type, &file.bytes),
        natural_width,
        natural_height,
        byte_size: file.bytes.len(),
    })
}

/// Uploaded images, in upload order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetLibrary {
    assets: Vec<UploadedAsset>,
}

impl AssetLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, asset: UploadedAsset) {
        self.assets.push(asset);
    }

    pub fn remove(&mut self, id: &AssetId) -> Option<UploadedAsset> {
        let index = self.assets.iter().position(|asset| &asset.id == id)?;
        Some(self.assets.remove(index))
    }

    pub fn get(&self, id: &AssetId) -> Option<&UploadedAsset> {
        self.assets.iter().find(|asset| &asset.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadedAsset> {
        self.assets.iter()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// JSON payload carried under [`ASSET_DRAG_KEY`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPayload {
    #[serde(rename = "type")]
    pub element_type: ElementType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub natural_height: Option<f64>,
}

impl AssetPayload {
    /// Payload for a built-in element kind (text, note or shape).
    pub fn element(element_type: ElementType) -> Self {
        Self {
            element_type,
            src: None,
            file_name: None,
            natural_width: None,
            natural_height: None,
        }
    }

    /// Parse a drop payload. Malformed input yields `None`.
    pub fn parse(data: &str) -> Option<Self> {
        match serde_json::from_str(data) {
            Ok(payload) => Some(payload),
            Err(err) => {
                log::debug!("Ignoring malformed asset payload: {err}");
                None
            }
        }
    }

    pub fn to_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Build the element this payload drops. Image payloads need a source
    /// and natural dimensions; without them the drop is ignored.
    pub fn to_element(&self, ids: &mut dyn IdGenerator, position: Point) -> Option<PageElement> {
        match self.element_type {
            ElementType::Text => Some(model::create_text_element(ids, position, None)),
            ElementType::Note => Some(model::create_note_element(ids, position)),
            ElementType::Shape => Some(model::create_shape_element(ids, position)),
            ElementType::Image => {
                let (Some(src), Some(width), Some(height)) =
                    (&self.src, self.natural_width, self.natural_height)
                else {
                    log::debug!("Ignoring image payload without source or dimensions");
                    return None;
                };
                let file_name = self.file_name.as_deref().unwrap_or("image");
                Some(model::create_image_element(ids, position, src.as_str(), file_name, width, height))
            }
        }
    }
}
