use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::TableConfig;
use crate::core::model::{Column, Detection, DocumentTable, PageTable};
use crate::export::Exporter;
use crate::table::assign::assign_column;

/// One HTML page per document page: detection boxes over the page image,
/// followed by the extracted rows.
#[derive(Debug, Clone)]
pub struct HtmlDebugExporter {
    out_dir: PathBuf,
    table: TableConfig,
}

impl HtmlDebugExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            out_dir,
            table: TableConfig::default().normalized(),
        }
    }

    /// Column colors follow the same bounds and synonyms the rows were built with.
    pub fn with_table_config(mut self, table: TableConfig) -> Self {
        self.table = table.normalized();
        self
    }

    fn detection_to_div(&self, det: &Detection) -> String {
        let kind = if self.table.is_excluded(&det.label) {
            "excluded"
        } else {
            column_class(assign_column(det, &self.table))
        };
        format!(
            r#"<div class='bbox {kind}' style='left:{x0}px; top:{y0}px; width:{w}px; height:{h}px;' data-label='{label_attr}' data-text='{text_attr}' data-confidence='{conf:.2}'><span class='caption'>{label} ({conf:.2})</span></div>"#,
            kind = kind,
            x0 = det.bbox.x0,
            y0 = det.bbox.y0,
            w = det.bbox.width(),
            h = det.bbox.height(),
            label_attr = html_escape::encode_single_quoted_attribute(det.label.as_str()),
            text_attr = html_escape::encode_single_quoted_attribute(&det.text),
            label = html_escape::encode_text(det.label.as_str()),
            conf = det.confidence,
        )
    }

    fn rows_table(page: &PageTable) -> String {
        let mut html = String::from(
            "<table id='rows'><tr><th>#</th><th>descripcion</th><th>cantidad</th><th>precio</th><th>confidence</th></tr>\n",
        );
        for (idx, row) in page.rows.iter().enumerate() {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>\n",
                idx + 1,
                html_escape::encode_text(&row.description),
                html_escape::encode_text(&row.quantity),
                html_escape::encode_text(&row.price),
                row.confidence
            ));
        }
        html.push_str("</table>");
        html
    }

    pub fn render_page(&self, page: &PageTable) -> String {
        let mut boxes_html = String::new();
        let mut image_html = String::new();
        if let Some(debug) = &page.debug {
            for det in &debug.detections {
                boxes_html.push_str(&self.detection_to_div(det));
            }
            if let Some(image) = &debug.image {
                image_html = format!(
                    "<img src='{}' />",
                    html_escape::encode_single_quoted_attribute(&image_src(image))
                );
            }
        }

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset='utf-8'>
<title>docrows page {page_no}</title>
<style>
body {{ margin: 0; font-family: Arial, sans-serif; }}
#canvas {{ position: relative; width: {width}px; height: {height}px; }}
#canvas img {{ display: block; }}
.bbox {{ position: absolute; border: 2px solid rgba(0,160,0,0.7); box-sizing: border-box; }}
.bbox.description {{ border-color: rgba(0,0,255,0.6); background: rgba(100,100,255,0.1); }}
.bbox.quantity {{ border-color: rgba(255,140,0,0.7); background: rgba(255,165,0,0.12); }}
.bbox.price {{ border-color: rgba(0,160,0,0.7); background: rgba(0,200,0,0.1); }}
.bbox.excluded {{ border-style: dashed; border-color: rgba(128,128,128,0.7); }}
.caption {{ position: absolute; top: -16px; left: 0; font-size: 11px; color: #c00; white-space: nowrap; }}
#rows {{ border-collapse: collapse; margin: 16px; }}
#rows td, #rows th {{ border: 1px solid #ccc; padding: 4px 8px; }}
</style>
</head>
<body>
<div id='canvas'>
{image}
{boxes}
</div>
{rows}
</body>
</html>"#,
            page_no = page.page_idx + 1,
            width = page.width,
            height = page.height,
            image = image_html,
            boxes = boxes_html,
            rows = Self::rows_table(page),
        )
    }
}

fn column_class(column: Column) -> &'static str {
    match column {
        Column::Description => "description",
        Column::Quantity => "quantity",
        Column::Price => "price",
    }
}

fn image_src(image: &str) -> String {
    let path = Path::new(image);
    path.canonicalize()
        .map(|p| format!("file://{}", p.display()))
        .unwrap_or_else(|_| image.to_string())
}

impl Exporter for HtmlDebugExporter {
    fn export(&self, document: &DocumentTable) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        for page in &document.pages {
            let path = self
                .out_dir
                .join(format!("page_{:03}.html", page.page_idx + 1));
            fs::write(path, self.render_page(page))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geometry::BBox;
    use crate::core::model::{PageDebug, RowRecord};

    #[test]
    fn draws_boxes_with_captions_and_rows() {
        let page = PageTable {
            page_idx: 0,
            rows: vec![RowRecord {
                description: "Tornillo <M6>".to_string(),
                quantity: "5".to_string(),
                price: "No detectado".to_string(),
                confidence: 1.0,
            }],
            width: 800,
            height: 600,
            debug: Some(PageDebug {
                image: None,
                detections: vec![
                    Detection::new("logo", "ACME", 0.87, BBox::new(0.0, 0.0, 50.0, 20.0)),
                    Detection::new("cantidad", "5", 0.9, BBox::new(150.0, 12.0, 200.0, 28.0)),
                ],
            }),
        };
        let html = HtmlDebugExporter::new(PathBuf::from("unused")).render_page(&page);
        assert!(html.contains("class='bbox excluded'"));
        assert!(html.contains("logo (0.87)"));
        assert!(html.contains("class='bbox quantity'"));
        assert!(html.contains("Tornillo &lt;M6&gt;"));
    }

    #[test]
    fn quotes_in_text_stay_inside_the_attribute() {
        let page = PageTable {
            page_idx: 0,
            rows: Vec::new(),
            width: 100,
            height: 100,
            debug: Some(PageDebug {
                image: None,
                detections: vec![Detection::new(
                    "descripcion",
                    "Llave 1/2' x'",
                    0.9,
                    BBox::new(0.0, 0.0, 50.0, 20.0),
                )],
            }),
        };
        let html = HtmlDebugExporter::new(PathBuf::from("unused")).render_page(&page);
        assert!(html.contains("data-text='Llave 1/2&#x27; x&#x27;'"));
        assert!(!html.contains("1/2' x'"));
    }
}
