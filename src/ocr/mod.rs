pub mod bridge;
pub mod classes;
pub mod reader;
pub mod tesseract;

pub use bridge::DetectorBridge;
pub use classes::ClassNames;
pub use reader::RegionReader;
pub use tesseract::TesseractRecognizer;

use anyhow::Result;
use image::DynamicImage;
use std::path::Path;

use crate::core::geometry::BBox;

/// A labeled box reported by the object detector, before any text is read.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub label: String,
    pub confidence: f32,
    pub bbox: BBox,
}

pub trait Detector {
    fn detect(&self, image_path: &Path) -> Result<Vec<Region>>;
}

pub trait TextRecognizer {
    fn recognize(&self, image: &DynamicImage, bbox: &BBox) -> Result<String>;
}
