use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::StudioError;

pub const MAX_IMAGE_BYTES: usize = 20 * 1024 * 1024;

/// Image attached to the next request, encoded as a `data:` URL.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    name: Option<String>,
    mime: String,
    size: usize,
    data_url: String,
}

impl ImageAttachment {
    pub fn from_bytes(bytes: &[u8], mime: &str) -> Result<Self, StudioError> {
        if !mime.starts_with("image/") {
            return Err(StudioError::InvalidImage(
                "Please select an image file".to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(StudioError::InvalidImage("Image file is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(StudioError::InvalidImage(
                "Image too large. Max size is 20MB.".to_string(),
            ));
        }
        Ok(Self {
            name: None,
            mime: mime.to_string(),
            size: bytes.len(),
            data_url: format!("data:{};base64,{}", mime, STANDARD.encode(bytes)),
        })
    }

    /// Read an image file, inferring its type from the extension.
    pub fn from_path(path: &Path) -> Result<Self, StudioError> {
        let mime = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_for_extension)
            .ok_or_else(|| StudioError::InvalidImage("Please select an image file".to_string()))?;

        let size = fs::metadata(path)
            .map_err(|e| StudioError::InvalidImage(format!("{}: {}", path.display(), e)))?
            .len();
        if size > MAX_IMAGE_BYTES as u64 {
            return Err(StudioError::InvalidImage(
                "Image too large. Max size is 20MB.".to_string(),
            ));
        }

        let bytes = fs::read(path)
            .map_err(|e| StudioError::InvalidImage(format!("{}: {}", path.display(), e)))?;
        let mut attachment = Self::from_bytes(&bytes, mime)?;
        attachment.name = path.file_name().map(|n| n.to_string_lossy().into_owned());
        Ok(attachment)
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }
}

// The data URL can be megabytes long; keep it out of logs.
impl fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("name", &self.name)
            .field("mime", &self.mime)
            .field("size", &self.size)
            .finish()
    }
}

pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}
