//! Image selection: sniffing, preview metadata, and the shared payload that
//! every request of a session reuses.

use std::{fmt, io::Cursor, sync::Arc};

use image::{ImageFormat, ImageReader};

use crate::error::WorkflowError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview {
    pub format: ImageFormat,
    pub mime_type: &'static str,
    /// Header-derived size; absent when the decoder for the format is not built in.
    pub dimensions: Option<(u32, u32)>,
}

impl ImagePreview {
    fn derive(bytes: &[u8], format: ImageFormat) -> Self {
        let dimensions = ImageReader::with_format(Cursor::new(bytes), format)
            .into_dimensions()
            .ok();
        Self {
            format,
            mime_type: format.to_mime_type(),
            dimensions,
        }
    }
}

/// A selected image. Cloning shares the underlying bytes.
#[derive(Clone)]
pub struct ImagePayload {
    bytes: Arc<[u8]>,
    file_name: String,
    preview: ImagePreview,
}

impl ImagePayload {
    pub fn sniff(bytes: impl Into<Vec<u8>>) -> Result<Self, WorkflowError> {
        let bytes: Vec<u8> = bytes.into();
        if bytes.is_empty() {
            return Err(WorkflowError::InvalidInput(
                "image payload is empty".to_string(),
            ));
        }
        let format = image::guess_format(&bytes).map_err(|_| {
            WorkflowError::InvalidInput("payload is not a recognised image format".to_string())
        })?;
        let preview = ImagePreview::derive(&bytes, format);
        let extension = format.extensions_str().first().copied().unwrap_or("img");

        Ok(Self {
            bytes: Arc::from(bytes),
            file_name: format!("upload.{extension}"),
            preview,
        })
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        if !file_name.trim().is_empty() {
            self.file_name = file_name;
        }
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &'static str {
        self.preview.mime_type
    }

    pub fn preview(&self) -> &ImagePreview {
        &self.preview
    }

    /// True when both payloads share the same allocation, i.e. one is a clone of the other.
    pub fn is_same_selection(&self, other: &ImagePayload) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .field("preview", &self.preview)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/intake_tests.rs"]
mod tests;
