use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::DetectionError;
use crate::core::geometry::BBox;

/// Text written into a column that received no detections.
pub const PLACEHOLDER: &str = "No detectado";

/// Detector class name, lower-cased once on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ClassLabel(String);

impl ClassLabel {
    pub fn new(label: &str) -> Self {
        Self(label.to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.0.contains(needle)
    }
}

impl From<String> for ClassLabel {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for ClassLabel {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<ClassLabel> for String {
    fn from(value: ClassLabel) -> Self {
        value.0
    }
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Detection as handed over by the detector/OCR boundary or read from a file.
///
/// Every field is optional here so a malformed record can be reported and
/// skipped instead of failing the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDetection {
    #[serde(rename = "class", default)]
    pub class_label: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub confidence: f32,
    pub xmin: Option<f32>,
    pub ymin: Option<f32>,
    pub xmax: Option<f32>,
    pub ymax: Option<f32>,
}

/// One labeled, localized, OCR-read region of a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub label: ClassLabel,
    pub confidence: f32,
    pub bbox: BBox,
    pub text: String,
}

impl Detection {
    pub fn new(label: &str, text: &str, confidence: f32, bbox: BBox) -> Self {
        Self {
            label: ClassLabel::new(label),
            confidence,
            bbox,
            text: text.to_string(),
        }
    }

    pub fn y_center(&self) -> f32 {
        self.bbox.y_center()
    }

    pub fn x_center(&self) -> f32 {
        self.bbox.x_center()
    }
}

impl TryFrom<RawDetection> for Detection {
    type Error = DetectionError;

    fn try_from(raw: RawDetection) -> Result<Self, Self::Error> {
        let label = raw
            .class_label
            .filter(|label| !label.trim().is_empty())
            .ok_or(DetectionError::MissingLabel)?;

        let x0 = coordinate("xmin", raw.xmin)?;
        let y0 = coordinate("ymin", raw.ymin)?;
        let x1 = coordinate("xmax", raw.xmax)?;
        let y1 = coordinate("ymax", raw.ymax)?;

        if !raw.confidence.is_finite() {
            return Err(DetectionError::NonFiniteConfidence(raw.confidence));
        }

        let bbox = BBox::new(x0, y0, x1, y1);
        if !bbox.is_ordered() {
            return Err(DetectionError::InvertedBox { x0, y0, x1, y1 });
        }

        Ok(Self {
            label: ClassLabel::new(&label),
            confidence: raw.confidence,
            bbox,
            text: raw.text,
        })
    }
}

fn coordinate(name: &'static str, value: Option<f32>) -> Result<f32, DetectionError> {
    let value = value.ok_or(DetectionError::MissingCoordinate(name))?;
    if !value.is_finite() {
        return Err(DetectionError::NonFiniteCoordinate { name, value });
    }
    Ok(value)
}

/// Detections judged to sit on the same horizontal table line.
#[derive(Debug, Clone)]
pub struct Row {
    members: Vec<Detection>,
    y_sum: f32,
    center: f32,
}

impl Row {
    pub fn new(first: Detection) -> Self {
        let center = first.y_center();
        Self {
            members: vec![first],
            y_sum: center,
            center,
        }
    }

    /// Append a member and move the row center to the mean of all member centers.
    pub fn push(&mut self, detection: Detection) {
        self.y_sum += detection.y_center();
        self.members.push(detection);
        self.center = self.y_sum / self.members.len() as f32;
    }

    pub fn center(&self) -> f32 {
        self.center
    }

    pub fn members(&self) -> &[Detection] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Description,
    Quantity,
    Price,
}

impl Column {
    pub fn label(&self) -> &'static str {
        match self {
            Column::Description => "descripcion",
            Column::Quantity => "cantidad",
            Column::Price => "precio",
        }
    }
}

/// Final structured line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowRecord {
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "cantidad")]
    pub quantity: String,
    #[serde(rename = "precio")]
    pub price: String,
    pub confidence: f32,
}

impl RowRecord {
    pub fn field(&self, column: Column) -> &str {
        match column {
            Column::Description => &self.description,
            Column::Quantity => &self.quantity,
            Column::Price => &self.price,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTable {
    pub source: String,
    pub pages: Vec<PageTable>,
}

impl DocumentTable {
    pub fn row_count(&self) -> usize {
        self.pages.iter().map(|page| page.rows.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageTable {
    pub page_idx: usize,
    pub rows: Vec<RowRecord>,
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<PageDebug>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageDebug {
    /// Page image the detections were read from, if any.
    pub image: Option<String>,
    pub detections: Vec<Detection>,
}
