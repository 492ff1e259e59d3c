use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::{DocumentTable, PageTable};
use crate::export::Exporter;

#[derive(Debug, Clone)]
pub struct MarkdownExporter {
    out_dir: PathBuf,
}

impl MarkdownExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn render(document: &DocumentTable) -> String {
        let mut markdown = String::new();
        markdown.push_str(&format!("# {}\n\n", escape_cell(&document.source)));

        for page in &document.pages {
            markdown.push_str(&format!("## Page {}\n\n", page.page_idx + 1));
            markdown.push_str(&Self::render_page(page));
            markdown.push('\n');
        }
        markdown
    }

    fn render_page(page: &PageTable) -> String {
        if page.rows.is_empty() {
            return "_No line items detected._\n".to_string();
        }

        let mut table = String::new();
        table.push_str("| # | Descripción | Cantidad | Precio | Confianza |\n");
        table.push_str("|---|---|---|---|---|\n");
        for (idx, row) in page.rows.iter().enumerate() {
            table.push_str(&format!(
                "| {} | {} | {} | {} | {:.2} |\n",
                idx + 1,
                escape_cell(&row.description),
                escape_cell(&row.quantity),
                escape_cell(&row.price),
                row.confidence
            ));
        }
        table
    }
}

// Cells are single-line and must not close the table early.
fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace(['\n', '\r'], " ")
}

impl Exporter for MarkdownExporter {
    fn export(&self, document: &DocumentTable) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let output_path = self.out_dir.join("rows.md");
        fs::write(output_path, Self::render(document))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::RowRecord;

    fn page(rows: Vec<RowRecord>) -> PageTable {
        PageTable {
            page_idx: 0,
            rows,
            width: 100,
            height: 100,
            debug: None,
        }
    }

    #[test]
    fn renders_one_table_per_page() {
        let document = DocumentTable {
            source: "factura.png".to_string(),
            pages: vec![page(vec![RowRecord {
                description: "Tubo | PVC".to_string(),
                quantity: "5".to_string(),
                price: "1.50".to_string(),
                confidence: 1.0,
            }])],
        };
        let markdown = MarkdownExporter::render(&document);
        assert!(markdown.starts_with("# factura.png\n"));
        assert!(markdown.contains("## Page 1"));
        assert!(markdown.contains("| 1 | Tubo \\| PVC | 5 | 1.50 | 1.00 |"));
    }

    #[test]
    fn empty_page_gets_a_note() {
        let document = DocumentTable {
            source: "x".to_string(),
            pages: vec![page(Vec::new())],
        };
        assert!(MarkdownExporter::render(&document).contains("_No line items detected._"));
    }
}
