use crate::config::TableConfig;
use crate::core::model::Detection;

/// Drop header/metadata detections, keeping the relative order of the rest.
pub fn filter_line_items(detections: Vec<Detection>, config: &TableConfig) -> Vec<Detection> {
    detections
        .into_iter()
        .filter(|det| !config.is_excluded(&det.label))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;
    use pretty_assertions::assert_eq;

    fn det(label: &str, text: &str) -> Detection {
        Detection::new(label, text, 0.9, BBox::new(0.0, 0.0, 10.0, 10.0))
    }

    #[test]
    fn removes_metadata_classes_case_insensitively() {
        let config = TableConfig::default().normalized();
        let kept = filter_line_items(
            vec![
                det("Logo", "ACME"),
                det("descripcion", "Tornillo"),
                det("R.U.C", "123"),
                det("cantidad", "5"),
                det("Fecha_Hora", "2024"),
                det("misc", "x"),
            ],
            &config,
        );
        let texts: Vec<_> = kept.iter().map(|d| d.text.as_str()).collect();
        assert_eq!(texts, vec!["Tornillo", "5", "x"]);
    }

    #[test]
    fn everything_filtered_is_empty() {
        let config = TableConfig::default().normalized();
        assert!(filter_line_items(vec![det("logo", "ACME")], &config).is_empty());
    }
}
