//! Layout-to-table reconstruction.
//!
//! Turns per-box detections into ordered line-item records in three stages:
//! metadata filtering, vertical row clustering, and per-row column assignment
//! with text aggregation.

pub mod assign;
pub mod cluster;
pub mod filter;
pub mod relabel;

use tracing::{debug, warn};

use crate::config::TableConfig;
use crate::core::model::{Detection, RawDetection, RowRecord};

pub trait TableEngine {
    fn build_rows(&self, detections: Vec<Detection>) -> Vec<RowRecord>;
}

#[derive(Debug, Clone)]
pub struct HeuristicTableEngine {
    config: TableConfig,
}

impl Default for HeuristicTableEngine {
    fn default() -> Self {
        Self::new(TableConfig::default())
    }
}

impl HeuristicTableEngine {
    pub fn new(config: TableConfig) -> Self {
        Self {
            config: config.normalized(),
        }
    }

    /// Validate raw records, skipping malformed ones, then build rows.
    pub fn build_rows_from_raw(&self, raw: Vec<RawDetection>) -> Vec<RowRecord> {
        self.build_rows(validate_detections(raw))
    }

    /// Bound the page and apply text relabeling when enabled.
    pub fn prepare(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
        if let Some(limit) = self.config.max_detections {
            if detections.len() > limit {
                warn!(
                    total = detections.len(),
                    limit, "too many detections on one page, dropping the excess"
                );
                detections.truncate(limit);
            }
        }

        if self.config.relabel_from_text {
            relabel::relabel_from_text(&mut detections);
        }
        detections
    }

    /// Filter, cluster and assemble detections already passed through [`Self::prepare`].
    pub fn rows_from_prepared(&self, detections: Vec<Detection>) -> Vec<RowRecord> {
        let total = detections.len();
        let kept = filter::filter_line_items(detections, &self.config);
        if kept.is_empty() {
            debug!(total, "no line-item detections left after filtering");
            return Vec::new();
        }

        let kept_count = kept.len();
        let rows = cluster::cluster_rows(kept, self.config.row_tolerance);
        debug!(
            total,
            kept = kept_count,
            rows = rows.len(),
            "clustered detections into rows"
        );

        rows.iter()
            .map(|row| assign::assemble_row(row, &self.config))
            .collect()
    }
}

impl TableEngine for HeuristicTableEngine {
    fn build_rows(&self, detections: Vec<Detection>) -> Vec<RowRecord> {
        self.rows_from_prepared(self.prepare(detections))
    }
}

/// Convert raw records into detections, logging and skipping invalid ones.
pub fn validate_detections(raw: Vec<RawDetection>) -> Vec<Detection> {
    raw.into_iter()
        .enumerate()
        .filter_map(|(idx, record)| match Detection::try_from(record) {
            Ok(det) => Some(det),
            Err(err) => {
                warn!(index = idx, error = %err, "skipping malformed detection");
                None
            }
        })
        .collect()
}

/// Run the default engine over already-validated detections.
pub fn extract_rows(detections: Vec<Detection>, config: &TableConfig) -> Vec<RowRecord> {
    HeuristicTableEngine::new(config.clone()).build_rows(detections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;
    use crate::core::model::PLACEHOLDER;
    use pretty_assertions::assert_eq;

    fn det(label: &str, text: &str, bbox: (f32, f32, f32, f32)) -> Detection {
        Detection::new(label, text, 0.9, BBox::new(bbox.0, bbox.1, bbox.2, bbox.3))
    }

    #[test]
    fn builds_one_row_from_aligned_cells() {
        let engine = HeuristicTableEngine::default();
        let rows = engine.build_rows(vec![
            det("descripcion", "Tornillo", (10.0, 10.0, 100.0, 30.0)),
            det("cantidad", "5", (150.0, 12.0, 200.0, 28.0)),
            det("precio_unitario", "$1.50", (300.0, 11.0, 360.0, 29.0)),
        ]);
        assert_eq!(
            rows,
            vec![RowRecord {
                description: "Tornillo".to_string(),
                quantity: "5".to_string(),
                price: "$1.50".to_string(),
                confidence: 1.0,
            }]
        );
    }

    #[test]
    fn truncates_past_the_detection_limit() {
        let engine = HeuristicTableEngine::new(TableConfig {
            max_detections: Some(1),
            ..TableConfig::default()
        });
        let rows = engine.build_rows(vec![
            det("misc", "kept", (0.0, 0.0, 10.0, 10.0)),
            det("misc", "dropped", (0.0, 500.0, 10.0, 510.0)),
        ]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "kept");
    }

    #[test]
    fn relabeling_runs_before_filtering_and_assignment() {
        let engine = HeuristicTableEngine::new(TableConfig {
            relabel_from_text: true,
            ..TableConfig::default()
        });
        let rows = engine.build_rows(vec![det("misc", "12", (0.0, 0.0, 20.0, 20.0))]);
        assert_eq!(rows[0].quantity, "12");
        assert_eq!(rows[0].description, PLACEHOLDER);
    }

    #[test]
    fn skips_malformed_raw_records() {
        let raw = vec![
            RawDetection {
                class_label: Some("descripcion".to_string()),
                text: "ok".to_string(),
                confidence: 0.9,
                xmin: Some(0.0),
                ymin: Some(0.0),
                xmax: Some(10.0),
                ymax: Some(10.0),
            },
            RawDetection {
                class_label: Some("descripcion".to_string()),
                text: "broken".to_string(),
                confidence: 0.9,
                xmin: None,
                ..RawDetection::default()
            },
            RawDetection {
                class_label: None,
                text: "unlabeled".to_string(),
                xmin: Some(0.0),
                ymin: Some(0.0),
                xmax: Some(10.0),
                ymax: Some(10.0),
                ..RawDetection::default()
            },
        ];
        let rows = HeuristicTableEngine::default().build_rows_from_raw(raw);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description, "ok");
    }

    #[test]
    fn synonyms_from_config_are_case_normalized() {
        let mut config = TableConfig::default();
        config.column_synonyms.quantity.push("Unidades".to_string());
        let rows = extract_rows(
            vec![det("UNIDADES", "3", (0.0, 0.0, 10.0, 10.0))],
            &config,
        );
        assert_eq!(rows[0].quantity, "3");
    }
}
