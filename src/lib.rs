pub mod config;
pub mod core;
pub mod export;
pub mod ocr;
pub mod pipeline;
pub mod source;
pub mod table;

pub use config::{AppConfig, TableConfig};
pub use crate::core::model::{Detection, DocumentTable, PageTable, RawDetection, RowRecord};
pub use table::{extract_rows, HeuristicTableEngine, TableEngine};
