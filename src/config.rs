use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::confidence::RowConfidence;
use crate::core::model::{ClassLabel, Column};

pub const DEFAULT_ROW_TOLERANCE: f32 = 15.0;
pub const DEFAULT_X_DESC_MAX: f32 = 700.0;
/// Description boundary used by the older column helper.
pub const LEGACY_X_DESC_MAX: f32 = 900.0;
pub const DEFAULT_X_CANT_MAX: f32 = 1200.0;
pub const DEFAULT_MAX_DETECTIONS: usize = 5000;

const EXCLUDED_CLASSES: &[&str] = &[
    "logo",
    "r.u.c",
    "ruc",
    "fecha_hora",
    "numero_factura",
    "razon_social",
];

/// Options of the layout-to-table engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Maximum vertical-center distance (exclusive) for joining the current row.
    pub row_tolerance: f32,
    /// Geometric fallback: `x_center` below this is a description.
    pub x_desc_max: f32,
    /// Geometric fallback: `x_center` below this (and past `x_desc_max`) is a quantity.
    pub x_cant_max: f32,
    pub excluded_classes: Vec<String>,
    pub column_synonyms: ColumnSynonyms,
    pub relabel_from_text: bool,
    pub row_confidence: RowConfidence,
    pub max_detections: Option<usize>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            row_tolerance: DEFAULT_ROW_TOLERANCE,
            x_desc_max: DEFAULT_X_DESC_MAX,
            x_cant_max: DEFAULT_X_CANT_MAX,
            excluded_classes: EXCLUDED_CLASSES.iter().map(|c| c.to_string()).collect(),
            column_synonyms: ColumnSynonyms::default(),
            relabel_from_text: false,
            row_confidence: RowConfidence::Fixed,
            max_detections: Some(DEFAULT_MAX_DETECTIONS),
        }
    }
}

impl TableConfig {
    /// Defaults of the older column helper, which split description at x = 900.
    pub fn legacy() -> Self {
        Self {
            x_desc_max: LEGACY_X_DESC_MAX,
            ..Self::default()
        }
    }

    pub fn with_row_tolerance(mut self, row_tolerance: f32) -> Self {
        self.row_tolerance = row_tolerance;
        self
    }

    /// Lower-case every class name so comparisons against [`ClassLabel`] are exact.
    pub fn normalized(mut self) -> Self {
        lowercase_all(&mut self.excluded_classes);
        self.column_synonyms = self.column_synonyms.normalized();
        self
    }

    pub fn is_excluded(&self, label: &ClassLabel) -> bool {
        self.excluded_classes.iter().any(|c| c == label.as_str())
    }
}

/// Class names that pin a detection to a column regardless of its position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSynonyms {
    pub quantity: Vec<String>,
    pub price: Vec<String>,
    pub description: Vec<String>,
}

impl Default for ColumnSynonyms {
    fn default() -> Self {
        Self {
            quantity: vec!["cantidad".to_string()],
            price: vec![
                "precio".to_string(),
                "precio_unitario".to_string(),
                "precio_total".to_string(),
            ],
            description: vec!["descripcion".to_string()],
        }
    }
}

impl ColumnSynonyms {
    pub fn normalized(mut self) -> Self {
        lowercase_all(&mut self.quantity);
        lowercase_all(&mut self.price);
        lowercase_all(&mut self.description);
        self
    }

    /// Quantity wins over price, price over description.
    pub fn column_for(&self, label: &ClassLabel) -> Option<Column> {
        let label = label.as_str();
        if self.quantity.iter().any(|s| s == label) {
            Some(Column::Quantity)
        } else if self.price.iter().any(|s| s == label) {
            Some(Column::Price)
        } else if self.description.iter().any(|s| s == label) {
            Some(Column::Description)
        } else {
            None
        }
    }
}

fn lowercase_all(values: &mut [String]) {
    for value in values.iter_mut() {
        *value = value.to_lowercase();
    }
}

/// External OCR collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    pub python: String,
    pub detector_script: PathBuf,
    pub detector_confidence: f32,
    pub tesseract_cmd: String,
    pub lang: String,
    pub psm: u32,
    pub dpi: u32,
    /// Overrides the built-in detector class table, indexed by class id.
    pub class_names: Option<Vec<String>>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            detector_script: PathBuf::from("detector/detect.py"),
            detector_confidence: 0.25,
            tesseract_cmd: "tesseract".to_string(),
            lang: "spa".to_string(),
            psm: 6,
            dpi: 200,
            class_names: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub table: TableConfig,
    pub ocr: OcrConfig,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        let table = &self.table;
        if !(table.row_tolerance.is_finite() && table.row_tolerance > 0.0) {
            anyhow::bail!("table.row_tolerance must be a positive number");
        }
        if !(table.x_desc_max.is_finite() && table.x_cant_max.is_finite()) {
            anyhow::bail!("table column bounds must be finite");
        }
        if table.x_desc_max > table.x_cant_max {
            anyhow::bail!(
                "table.x_desc_max ({}) must not exceed table.x_cant_max ({})",
                table.x_desc_max,
                table.x_cant_max
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_yields_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.table.x_desc_max, 700.0);
        assert_eq!(config.table.row_tolerance, 15.0);
    }

    #[test]
    fn partial_table_section_keeps_other_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [table]
            row_tolerance = 20.0
            row_confidence = "mean"
            excluded_classes = ["Logo", "IVA"]

            [ocr]
            lang = "spa+eng"
            "#,
        )
        .unwrap();
        assert_eq!(config.table.row_tolerance, 20.0);
        assert_eq!(config.table.row_confidence, RowConfidence::Mean);
        assert_eq!(config.table.x_cant_max, 1200.0);
        assert_eq!(config.ocr.lang, "spa+eng");
        assert_eq!(config.ocr.psm, 6);

        let table = config.table.normalized();
        assert_eq!(table.excluded_classes, vec!["logo", "iva"]);
        assert!(table.is_excluded(&ClassLabel::new("IVA")));
    }

    #[test]
    fn rejects_inverted_column_bounds() {
        let err = AppConfig::from_toml("[table]\nx_desc_max = 1300.0\n").unwrap_err();
        assert!(err.to_string().contains("x_desc_max"));
    }

    #[test]
    fn legacy_helper_uses_wider_description_band() {
        assert_eq!(TableConfig::legacy().x_desc_max, 900.0);
        assert_eq!(TableConfig::legacy().x_cant_max, 1200.0);
    }

    #[test]
    fn synonyms_follow_precedence() {
        let synonyms = ColumnSynonyms {
            quantity: vec!["total".to_string()],
            price: vec!["total".to_string()],
            description: vec![],
        };
        assert_eq!(
            synonyms.column_for(&ClassLabel::new("TOTAL")),
            Some(Column::Quantity)
        );
        assert_eq!(
            ColumnSynonyms::default().column_for(&ClassLabel::new("Precio_Total")),
            Some(Column::Price)
        );
        assert_eq!(ColumnSynonyms::default().column_for(&ClassLabel::new("misc")), None);
    }
}
