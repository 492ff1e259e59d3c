use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::{Column, DocumentTable, RowRecord};
use crate::export::Exporter;

/// Tab-separated rows, one block per page.
#[derive(Debug, Clone)]
pub struct TextExporter {
    out_dir: PathBuf,
}

impl TextExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    fn format_row(row: &RowRecord) -> String {
        [Column::Description, Column::Quantity, Column::Price]
            .iter()
            .map(|column| row.field(*column).replace(['\t', '\n'], " "))
            .collect::<Vec<_>>()
            .join("\t")
    }
}

impl Exporter for TextExporter {
    fn export(&self, document: &DocumentTable) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;

        let mut text = String::new();
        for page in &document.pages {
            text.push_str(&format!("=== Page {} ===\n", page.page_idx + 1));
            text.push_str("descripcion\tcantidad\tprecio\n");
            for row in &page.rows {
                text.push_str(&Self::format_row(row));
                text.push('\n');
            }
            text.push('\n');
        }

        fs::write(self.out_dir.join("rows.txt"), text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_inside_cells_are_flattened() {
        let row = RowRecord {
            description: "Caja\tgrande".to_string(),
            quantity: "2".to_string(),
            price: "No detectado".to_string(),
            confidence: 1.0,
        };
        assert_eq!(TextExporter::format_row(&row), "Caja grande\t2\tNo detectado");
    }
}
