use anyhow::{Context, Result};
use image::{imageops, DynamicImage};
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::config::OcrConfig;
use crate::core::geometry::BBox;
use crate::ocr::TextRecognizer;

/// Reads one region at a time with the `tesseract` CLI.
#[derive(Debug)]
pub struct TesseractRecognizer {
    work_dir: PathBuf,
    cmd: String,
    lang: String,
    psm: u32,
    counter: AtomicUsize,
}

impl TesseractRecognizer {
    pub fn new(work_dir: PathBuf) -> Self {
        Self {
            work_dir,
            cmd: "tesseract".to_string(),
            lang: "spa".to_string(),
            psm: 6,
            counter: AtomicUsize::new(0),
        }
    }

    pub fn from_config(work_dir: PathBuf, config: &OcrConfig) -> Self {
        Self::new(work_dir)
            .with_cmd(config.tesseract_cmd.clone())
            .with_lang(config.lang.clone())
            .with_psm(config.psm)
    }

    pub fn with_cmd(mut self, cmd: String) -> Self {
        self.cmd = cmd;
        self
    }

    pub fn with_lang(mut self, lang: String) -> Self {
        self.lang = lang;
        self
    }

    pub fn with_psm(mut self, psm: u32) -> Self {
        self.psm = psm;
        self
    }
}

/// Crop `bbox` out of `image` and prepare it for OCR (grayscale, light blur).
/// Returns `None` when the box has no area inside the image.
pub fn prepare_region(image: &DynamicImage, bbox: &BBox) -> Option<DynamicImage> {
    let (x, y, w, h) = bbox.pixel_rect(image.width(), image.height())?;
    let gray = image.crop_imm(x, y, w, h).to_luma8();
    Some(DynamicImage::ImageLuma8(imageops::blur(&gray, 1.0)))
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &DynamicImage, bbox: &BBox) -> Result<String> {
        let Some(region) = prepare_region(image, bbox) else {
            return Ok(String::new());
        };

        fs::create_dir_all(&self.work_dir)?;
        let idx = self.counter.fetch_add(1, Ordering::Relaxed);
        let crop_path = self.work_dir.join(format!("region_{idx:05}.png"));
        region
            .save(&crop_path)
            .with_context(|| format!("failed to write crop {}", crop_path.display()))?;

        let output = Command::new(&self.cmd)
            .arg(&crop_path)
            .arg("stdout")
            .arg("--psm")
            .arg(self.psm.to_string())
            .arg("-l")
            .arg(&self.lang)
            .output()
            .with_context(|| "failed to invoke tesseract; is it installed?");
        let _ = fs::remove_file(&crop_path);
        let output = output?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("tesseract failed: {stderr}");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
