use anyhow::{Context, Result};
use image::{DynamicImage, ImageReader};
use std::path::Path;
use tracing::{debug, warn};

use crate::core::model::RawDetection;
use crate::core::text::normalize_text;
use crate::ocr::{Detector, Region, TextRecognizer};

/// Detections read from one page image.
#[derive(Debug, Clone)]
pub struct PageRegions {
    pub detections: Vec<RawDetection>,
    pub width: u32,
    pub height: u32,
}

/// Pairs a detector with a text recognizer to turn a page image into detections.
#[derive(Debug)]
pub struct RegionReader<D, R> {
    detector: D,
    recognizer: R,
}

impl<D: Detector, R: TextRecognizer> RegionReader<D, R> {
    pub fn new(detector: D, recognizer: R) -> Self {
        Self {
            detector,
            recognizer,
        }
    }

    pub fn read_page(&self, image_path: &Path) -> Result<PageRegions> {
        let image = ImageReader::open(image_path)
            .with_context(|| format!("failed to open image {}", image_path.display()))?
            .decode()
            .with_context(|| format!("failed to decode image {}", image_path.display()))?;

        let regions = self
            .detector
            .detect(image_path)
            .with_context(|| format!("detection failed for {}", image_path.display()))?;
        debug!(regions = regions.len(), image = %image_path.display(), "detector finished");

        Ok(PageRegions {
            detections: self.read_regions(&image, regions),
            width: image.width(),
            height: image.height(),
        })
    }

    /// Read the text of every region. A failed read leaves that region's text empty.
    ///
    /// Box coordinates are truncated to whole pixels first; both OCR and row
    /// building see the truncated box.
    pub fn read_regions(&self, image: &DynamicImage, regions: Vec<Region>) -> Vec<RawDetection> {
        regions
            .into_iter()
            .map(|region| {
                let bbox = region.bbox.truncated();
                let text = match self.recognizer.recognize(image, &bbox) {
                    Ok(raw) => normalize_text(&raw),
                    Err(err) => {
                        warn!(label = %region.label, error = %err, "text recognition failed");
                        String::new()
                    }
                };
                RawDetection {
                    class_label: Some(region.label),
                    text,
                    confidence: region.confidence,
                    xmin: Some(bbox.x0),
                    ymin: Some(bbox.y0),
                    xmax: Some(bbox.x1),
                    ymax: Some(bbox.y1),
                }
            })
            .collect()
    }
}
