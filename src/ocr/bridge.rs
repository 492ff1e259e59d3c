use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::OcrConfig;
use crate::core::geometry::BBox;
use crate::ocr::classes::ClassNames;
use crate::ocr::{Detector, Region};

/// One box as printed by the detector script.
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
    pub confidence: f32,
    #[serde(rename = "class")]
    pub class_id: f64,
    #[serde(default)]
    pub name: Option<String>,
}

/// Runs the object-detector script as a subprocess and parses its JSON output.
#[derive(Debug, Clone)]
pub struct DetectorBridge {
    python: String,
    script_path: PathBuf,
    confidence: f32,
    classes: ClassNames,
}

impl DetectorBridge {
    pub fn new(script_path: PathBuf) -> Self {
        Self {
            python: "python3".to_string(),
            script_path,
            confidence: 0.25,
            classes: ClassNames::default(),
        }
    }

    pub fn from_config(config: &OcrConfig) -> Self {
        let classes = config
            .class_names
            .clone()
            .map(ClassNames::new)
            .unwrap_or_default();
        Self::new(config.detector_script.clone())
            .with_python(config.python.clone())
            .with_confidence(config.detector_confidence)
            .with_classes(classes)
    }

    pub fn with_python(mut self, python: String) -> Self {
        self.python = python;
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_classes(mut self, classes: ClassNames) -> Self {
        self.classes = classes;
        self
    }

    pub fn parse_output(&self, stdout: &str) -> Result<Vec<Region>> {
        let boxes: Vec<DetectorBox> =
            serde_json::from_str(stdout).with_context(|| "failed to parse detector JSON output")?;
        Ok(boxes.into_iter().map(|b| self.to_region(b)).collect())
    }

    /// Negative or non-finite ids never index the table.
    fn label_for(&self, class_id: f64) -> String {
        if class_id.is_finite() && class_id >= 0.0 {
            self.classes.name(class_id.trunc() as usize)
        } else {
            format!("Clase_{class_id}")
        }
    }

    fn to_region(&self, b: DetectorBox) -> Region {
        let label = b.name.unwrap_or_else(|| self.label_for(b.class_id));
        Region {
            label,
            confidence: b.confidence,
            bbox: BBox::new(b.xmin, b.ymin, b.xmax, b.ymax),
        }
    }
}

impl Detector for DetectorBridge {
    fn detect(&self, image_path: &Path) -> Result<Vec<Region>> {
        let output = Command::new(&self.python)
            .arg(&self.script_path)
            .arg("--image")
            .arg(image_path)
            .arg("--conf")
            .arg(self.confidence.to_string())
            .output()
            .with_context(|| "failed to invoke detector script")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("detector failed: {stderr}");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        self.parse_output(&stdout)
    }
}
