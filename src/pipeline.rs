use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::core::model::{DocumentTable, PageDebug, PageTable, RawDetection};
use crate::export::html_debug_export::HtmlDebugExporter;
use crate::export::json_export::JsonExporter;
use crate::export::markdown_export::MarkdownExporter;
use crate::export::text_export::TextExporter;
use crate::export::{ExportFormat, Exporter};
use crate::ocr::{Detector, DetectorBridge, RegionReader, TesseractRecognizer, TextRecognizer};
use crate::source::{InputKind, PageRenderer, PdfReader};
use crate::table::{validate_detections, HeuristicTableEngine};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub app: AppConfig,
    /// Keep per-page detections in the JSON output.
    pub debug: bool,
}

impl PipelineConfig {
    pub fn new(input: PathBuf, output: PathBuf, app: AppConfig) -> Self {
        Self {
            input,
            output,
            app,
            debug: false,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.app.ocr.dpi = dpi;
        self
    }
}

/// Build the row table for any supported input: image, PDF, or detections JSON.
pub fn build_document(config: &PipelineConfig) -> Result<DocumentTable> {
    match InputKind::from_path(&config.input)? {
        InputKind::Detections => rows_from_detections_file(&config.input, config),
        InputKind::Image | InputKind::Pdf => {
            let detector = DetectorBridge::from_config(&config.app.ocr);
            let recognizer =
                TesseractRecognizer::from_config(config.output.join("ocr"), &config.app.ocr);
            let reader = RegionReader::new(detector, recognizer);
            build_document_with(config, &reader)
        }
    }
}

/// Image/PDF path with caller-supplied detector and recognizer.
pub fn build_document_with<D, R>(
    config: &PipelineConfig,
    reader: &RegionReader<D, R>,
) -> Result<DocumentTable>
where
    D: Detector,
    R: TextRecognizer,
{
    let engine = HeuristicTableEngine::new(config.app.table.clone());
    let mut pages = Vec::new();

    match InputKind::from_path(&config.input)? {
        InputKind::Image => {
            pages.push(read_image_page(&engine, reader, &config.input, 0)?);
        }
        InputKind::Pdf => {
            let pdf = PdfReader::new(config.input.clone());
            let page_count = pdf.page_count()?;
            let renderer = PageRenderer::new(config.output.join("debug"), config.app.ocr.dpi);
            for page_idx in 0..page_count {
                let rendered = renderer.render_page(pdf.path(), page_idx)?;
                pages.push(read_image_page(&engine, reader, &rendered.path, page_idx)?);
            }
        }
        InputKind::Detections => {
            anyhow::bail!(
                "{} holds detections, not an image",
                config.input.display()
            );
        }
    }

    Ok(DocumentTable {
        source: source_name(&config.input),
        pages,
    })
}

fn read_image_page<D: Detector, R: TextRecognizer>(
    engine: &HeuristicTableEngine,
    reader: &RegionReader<D, R>,
    image_path: &Path,
    page_idx: usize,
) -> Result<PageTable> {
    let regions = reader.read_page(image_path)?;
    let mut page = page_from_raw(engine, page_idx, regions.detections, regions.width, regions.height);
    if let Some(debug) = page.debug.as_mut() {
        debug.image = Some(image_path.display().to_string());
    }
    info!(page = page_idx + 1, rows = page.rows.len(), "page processed");
    Ok(page)
}

fn page_from_raw(
    engine: &HeuristicTableEngine,
    page_idx: usize,
    raw: Vec<RawDetection>,
    width: u32,
    height: u32,
) -> PageTable {
    let detections = engine.prepare(validate_detections(raw));
    let rows = engine.rows_from_prepared(detections.clone());
    PageTable {
        page_idx,
        rows,
        width,
        height,
        debug: Some(PageDebug {
            image: None,
            detections,
        }),
    }
}

/// Detections file: either a bare array for one page or a list of pages.
/// Records stay untyped here so one bad record cannot fail the whole file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DetectionsFile {
    Pages(Vec<DetectionsPage>),
    Page(Vec<Value>),
}

#[derive(Debug, Deserialize)]
struct DetectionsPage {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    detections: Vec<Value>,
}

/// Decode each record on its own, logging and skipping the ones that do not fit.
fn decode_records(page_idx: usize, records: Vec<Value>) -> Vec<RawDetection> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(idx, record)| match serde_json::from_value::<RawDetection>(record) {
            Ok(raw) => Some(raw),
            Err(err) => {
                warn!(page = page_idx + 1, index = idx, error = %err, "skipping undecodable detection");
                None
            }
        })
        .collect()
}

pub fn rows_from_detections_file(path: &Path, config: &PipelineConfig) -> Result<DocumentTable> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut document = rows_from_detections_json(&content, config)
        .with_context(|| format!("failed to parse detections in {}", path.display()))?;
    document.source = source_name(path);
    Ok(document)
}

pub fn rows_from_detections_json(content: &str, config: &PipelineConfig) -> Result<DocumentTable> {
    let file: DetectionsFile = serde_json::from_str(content)
        .context("expected an array of detections or an array of pages")?;
    let pages = match file {
        DetectionsFile::Pages(pages) if !pages.is_empty() => pages,
        DetectionsFile::Pages(_) => vec![DetectionsPage {
            image: None,
            width: 0,
            height: 0,
            detections: Vec::new(),
        }],
        DetectionsFile::Page(detections) => vec![DetectionsPage {
            image: None,
            width: 0,
            height: 0,
            detections,
        }],
    };

    let engine = HeuristicTableEngine::new(config.app.table.clone());
    let pages = pages
        .into_iter()
        .enumerate()
        .map(|(page_idx, page)| {
            let raw = decode_records(page_idx, page.detections);
            let mut table = page_from_raw(&engine, page_idx, raw, page.width, page.height);
            if let Some(debug) = table.debug.as_mut() {
                debug.image = page.image;
            }
            table
        })
        .collect();

    Ok(DocumentTable {
        source: source_name(&config.input),
        pages,
    })
}

pub fn export_document(
    document: &DocumentTable,
    config: &PipelineConfig,
    formats: &[ExportFormat],
) -> Result<()> {
    let output = &config.output;
    for format in formats {
        match format {
            ExportFormat::Json => JsonExporter::new(output.to_path_buf())
                .with_debug(config.debug)
                .export(document)?,
            ExportFormat::Markdown => MarkdownExporter::new(output.to_path_buf()).export(document)?,
            ExportFormat::Text => TextExporter::new(output.to_path_buf()).export(document)?,
            ExportFormat::Html => HtmlDebugExporter::new(output.join("debug"))
                .with_table_config(config.app.table.clone())
                .export(document)?,
        }
    }
    Ok(())
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    use crate::core::model::PLACEHOLDER;

    fn temp_output_dir(prefix: &str) -> PathBuf {
        let mut out = std::env::temp_dir();
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_millis();
        let pid = std::process::id();
        out.push(format!("{prefix}-{pid}-{now}"));
        out
    }

    fn config(output: PathBuf) -> PipelineConfig {
        PipelineConfig::new(PathBuf::from("factura.json"), output, AppConfig::default())
    }

    #[test]
    fn parses_single_page_array() -> Result<()> {
        let json = r#"[
            {"class": "descripcion", "text": "Tornillo", "confidence": 0.9, "xmin": 10, "ymin": 10, "xmax": 100, "ymax": 30},
            {"class": "logo", "text": "ACME", "confidence": 0.9, "xmin": 0, "ymin": 0, "xmax": 50, "ymax": 20},
            {"class": "cantidad", "text": "5", "confidence": 0.9, "xmin": 150, "ymax": 28}
        ]"#;
        let document = rows_from_detections_json(json, &config(PathBuf::from("out")))?;
        assert_eq!(document.source, "factura.json");
        assert_eq!(document.pages.len(), 1);
        let page = &document.pages[0];
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].description, "Tornillo");
        assert_eq!(page.rows[0].quantity, PLACEHOLDER);
        // The malformed third record never reaches the page.
        assert_eq!(page.debug.as_ref().map(|d| d.detections.len()), Some(2));
        Ok(())
    }

    #[test]
    fn parses_multi_page_file() -> Result<()> {
        let json = r#"[
            {"image": "p1.png", "width": 1000, "height": 1400, "detections": [
                {"class": "descripcion", "text": "A", "confidence": 0.9, "xmin": 0, "ymin": 0, "xmax": 10, "ymax": 10}
            ]},
            {"detections": []}
        ]"#;
        let document = rows_from_detections_json(json, &config(PathBuf::from("out")))?;
        assert_eq!(document.pages.len(), 2);
        assert_eq!(document.pages[0].width, 1000);
        assert_eq!(
            document.pages[0].debug.as_ref().and_then(|d| d.image.clone()),
            Some("p1.png".to_string())
        );
        assert!(document.pages[1].rows.is_empty());
        assert_eq!(document.pages[1].page_idx, 1);
        Ok(())
    }

    #[test]
    fn wrongly_typed_records_are_skipped_not_fatal() -> Result<()> {
        let json = r#"[
            {"class": "descripcion", "text": "Tornillo", "confidence": 0.9, "xmin": 10, "ymin": 10, "xmax": 100, "ymax": 30},
            {"class": "cantidad", "text": "5", "confidence": null, "xmin": 150, "ymin": 12, "xmax": 200, "ymax": 28},
            {"class": "precio", "text": "1.50", "confidence": 0.9, "xmin": "1300", "ymin": 10, "xmax": 1400, "ymax": 30},
            {"class": 7, "text": null, "confidence": 0.9, "xmin": 0, "ymin": 0, "xmax": 1, "ymax": 1}
        ]"#;
        let document = rows_from_detections_json(json, &config(PathBuf::from("out")))?;
        let page = &document.pages[0];
        assert_eq!(page.rows.len(), 1);
        assert_eq!(page.rows[0].description, "Tornillo");
        assert_eq!(page.rows[0].quantity, PLACEHOLDER);
        assert_eq!(page.debug.as_ref().map(|d| d.detections.len()), Some(1));
        Ok(())
    }

    #[test]
    fn bad_record_inside_a_page_list_keeps_the_page() -> Result<()> {
        let json = r#"[
            {"image": "p1.png", "detections": [
                {"class": "descripcion", "text": "A", "confidence": 0.9, "xmin": 0, "ymin": 0, "xmax": 10, "ymax": 10},
                {"class": "descripcion", "text": "B", "confidence": "high", "xmin": 0, "ymin": 0, "xmax": 10, "ymax": 10}
            ]}
        ]"#;
        let document = rows_from_detections_json(json, &config(PathBuf::from("out")))?;
        assert_eq!(document.pages.len(), 1);
        assert_eq!(document.pages[0].rows[0].description, "A");
        Ok(())
    }

    #[test]
    fn debug_detections_carry_relabeled_classes() -> Result<()> {
        let mut app = AppConfig::default();
        app.table.relabel_from_text = true;
        let config = PipelineConfig::new(PathBuf::from("factura.json"), PathBuf::from("out"), app);
        let document = rows_from_detections_json(
            r#"[{"class": "misc", "text": "12", "confidence": 0.9, "xmin": 10, "ymin": 0, "xmax": 30, "ymax": 20}]"#,
            &config,
        )?;
        let page = &document.pages[0];
        assert_eq!(page.rows[0].quantity, "12");
        let debug = page.debug.as_ref().expect("debug detections");
        assert_eq!(debug.detections[0].label.as_str(), "cantidad");

        let html = HtmlDebugExporter::new(PathBuf::from("unused"))
            .with_table_config(config.app.table.clone())
            .render_page(page);
        assert!(html.contains("class='bbox quantity'"));
        Ok(())
    }

    #[test]
    fn empty_array_is_one_empty_page() -> Result<()> {
        let document = rows_from_detections_json("[]", &config(PathBuf::from("out")))?;
        assert_eq!(document.pages.len(), 1);
        assert!(document.pages[0].rows.is_empty());
        Ok(())
    }

    #[test]
    fn export_document_writes_requested_formats() -> Result<()> {
        let output = temp_output_dir("docrows-pipeline");
        let config = config(output.clone());
        let document = rows_from_detections_json(
            r#"[{"class": "precio", "text": "9.99", "confidence": 0.9, "xmin": 1300, "ymin": 0, "xmax": 1400, "ymax": 20}]"#,
            &config,
        )?;

        export_document(
            &document,
            &config,
            &[ExportFormat::Json, ExportFormat::Markdown, ExportFormat::Html],
        )?;

        assert!(output.join("rows.json").exists());
        assert!(output.join("rows.md").exists());
        assert!(output.join("debug/page_001.html").exists());
        assert!(!output.join("rows.txt").exists());

        let json = fs::read_to_string(output.join("rows.json"))?;
        assert!(json.contains("\"precio\": \"9.99\""));
        assert!(!json.contains("detections"));

        let _ = fs::remove_dir_all(&output);
        Ok(())
    }
}
