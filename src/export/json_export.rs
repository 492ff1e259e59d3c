use std::fs;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::model::DocumentTable;
use crate::export::Exporter;

#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
    include_debug: bool,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self {
            out_dir,
            include_debug: false,
        }
    }

    /// Keep the per-page detections in `rows.json`.
    pub fn with_debug(mut self, include_debug: bool) -> Self {
        self.include_debug = include_debug;
        self
    }
}

impl Exporter for JsonExporter {
    fn export(&self, document: &DocumentTable) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join("rows.json");
        let data = if self.include_debug {
            serde_json::to_string_pretty(document)?
        } else {
            let mut stripped = document.clone();
            for page in &mut stripped.pages {
                page.debug = None;
            }
            serde_json::to_string_pretty(&stripped)?
        };
        fs::write(path, data)?;
        Ok(())
    }
}
