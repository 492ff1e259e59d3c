use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use docrows::config::AppConfig;
use docrows::core::model::ClassLabel;
use docrows::export::ExportFormat;
use docrows::ocr::ClassNames;
use docrows::pipeline::{
    build_document, export_document, rows_from_detections_file, PipelineConfig,
};

#[derive(Parser, Debug)]
#[command(name = "docrows")]
#[command(version, about = "Invoice line-item extraction from detector boxes and OCR text", long_about = None)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract line items from an image, PDF or detections JSON file
    Process {
        /// Input file path
        input: PathBuf,

        /// Output directory (default: ./<input_name>_output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format(s) to generate
        #[arg(short, long, value_enum, default_values_t = vec![Format::Json, Format::Markdown])]
        format: Vec<Format>,

        /// Rendering DPI for PDF pages
        #[arg(long)]
        dpi: Option<u32>,

        /// Keep detections in rows.json and write the HTML overlay
        #[arg(short, long)]
        debug: bool,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },

    /// Build rows from a detections JSON file, skipping detection and OCR
    Rows {
        /// Detections file (one array per page, or a list of pages)
        detections: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_values_t = vec![Format::Json])]
        format: Vec<Format>,
    },

    /// Process several inputs into one output directory each
    Batch {
        /// Input files
        inputs: Vec<PathBuf>,

        /// Base output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum, default_values_t = vec![Format::Json, Format::Markdown])]
        format: Vec<Format>,

        #[arg(long)]
        dpi: Option<u32>,
    },

    /// Print the detector class table in use
    Classes {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum Format {
    Json,
    Markdown,
    Text,
    Html,
}

impl From<Format> for ExportFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Json => ExportFormat::Json,
            Format::Markdown => ExportFormat::Markdown,
            Format::Text => ExportFormat::Text,
            Format::Html => ExportFormat::Html,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Process {
            input,
            output,
            config,
            format,
            dpi,
            debug,
            quiet,
        } => {
            let app = AppConfig::load_or_default(config.as_deref())?;
            process_single(input, output, app, &format, dpi, debug, quiet)
        }
        Commands::Rows {
            detections,
            output,
            config,
            format,
        } => {
            let app = AppConfig::load_or_default(config.as_deref())?;
            rows_only(detections, output, app, &format)
        }
        Commands::Batch {
            inputs,
            output,
            config,
            format,
            dpi,
        } => {
            let app = AppConfig::load_or_default(config.as_deref())?;
            process_batch(inputs, output, app, &format, dpi)
        }
        Commands::Classes { config } => {
            let app = AppConfig::load_or_default(config.as_deref())?;
            show_classes(&app)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter(filter)
        .init();
}

fn default_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    PathBuf::from(format!("{}_output", stem))
}

fn export_formats(formats: &[Format]) -> Vec<ExportFormat> {
    formats.iter().copied().map(ExportFormat::from).collect()
}

fn process_single(
    input: PathBuf,
    output: Option<PathBuf>,
    app: AppConfig,
    formats: &[Format],
    dpi: Option<u32>,
    debug: bool,
    quiet: bool,
) -> Result<()> {
    if !input.is_file() {
        anyhow::bail!("Input file does not exist: {}", input.display());
    }

    let output_dir = output.unwrap_or_else(|| default_output(&input));
    let mut config = PipelineConfig::new(input.clone(), output_dir.clone(), app).with_debug(debug);
    if let Some(dpi) = dpi {
        config = config.with_dpi(dpi);
    }

    if !quiet {
        println!("[*] Processing: {}", input.display());
        println!("[*] Output: {}", output_dir.display());
    }

    let document = build_document(&config)
        .with_context(|| format!("Failed to process: {}", input.display()))?;

    let mut formats = export_formats(formats);
    if debug && !formats.contains(&ExportFormat::Html) {
        formats.push(ExportFormat::Html);
    }
    export_document(&document, &config, &formats)
        .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

    if !quiet {
        println!(
            "[✓] {} row(s) over {} page(s) saved to: {}",
            document.row_count(),
            document.pages.len(),
            output_dir.display()
        );
    }

    Ok(())
}

fn rows_only(
    detections: PathBuf,
    output: Option<PathBuf>,
    app: AppConfig,
    formats: &[Format],
) -> Result<()> {
    let output_dir = output.unwrap_or_else(|| default_output(&detections));
    let config = PipelineConfig::new(detections.clone(), output_dir.clone(), app);

    let document = rows_from_detections_file(&detections, &config)?;
    export_document(&document, &config, &export_formats(formats))
        .with_context(|| format!("Failed to export to: {}", output_dir.display()))?;

    println!(
        "[✓] {} row(s) saved to: {}",
        document.row_count(),
        output_dir.display()
    );
    Ok(())
}

fn process_batch(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    app: AppConfig,
    formats: &[Format],
    dpi: Option<u32>,
) -> Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let base_output = output.unwrap_or_else(|| PathBuf::from("batch_output"));

    println!("[*] Batch processing {} file(s)", inputs.len());
    println!("[*] Base output: {}\n", base_output.display());

    let mut success = 0;
    let mut failed = 0;

    for (i, input) in inputs.iter().enumerate() {
        println!("[{}/{}] Processing: {}", i + 1, inputs.len(), input.display());

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("input_{}", i + 1));
        let output_dir = base_output.join(stem);

        match process_single(
            input.clone(),
            Some(output_dir),
            app.clone(),
            formats,
            dpi,
            false,
            true,
        ) {
            Ok(()) => {
                println!("  [✓] Success");
                success += 1;
            }
            Err(e) => {
                eprintln!("  [✗] Failed: {:#}", e);
                failed += 1;
            }
        }
    }

    println!("\n[*] Summary: {} succeeded, {} failed", success, failed);

    if failed > 0 {
        anyhow::bail!("{} file(s) failed to process", failed);
    }

    Ok(())
}

fn show_classes(app: &AppConfig) -> Result<()> {
    let classes = app
        .ocr
        .class_names
        .clone()
        .map(ClassNames::new)
        .unwrap_or_default();
    let table = app.table.clone().normalized();

    println!("Detector classes");
    println!("================");
    for (id, name) in classes.iter() {
        let label = ClassLabel::new(name);
        let role = if table.is_excluded(&label) {
            "excluded".to_string()
        } else {
            table
                .column_synonyms
                .column_for(&label)
                .map(|column| column.label().to_string())
                .unwrap_or_else(|| "by position".to_string())
        };
        println!("{id:>3}  {name:<22} {role}");
    }

    Ok(())
}
