pub mod pdf_reader;
pub mod renderer;

pub use pdf_reader::PdfReader;
pub use renderer::{PageRenderer, RenderedPage};

use anyhow::Result;
use std::path::Path;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tiff", "bmp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Image,
    Pdf,
    /// Pre-computed detections in JSON.
    Detections,
}

impl InputKind {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();

        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Ok(InputKind::Image)
        } else if ext == "pdf" {
            Ok(InputKind::Pdf)
        } else if ext == "json" {
            Ok(InputKind::Detections)
        } else {
            anyhow::bail!("unsupported input type: {}", path.display())
        }
    }
}
