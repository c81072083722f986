//! Batch command - digitize multiple documents with per-item isolation.
//!
//! One failing document never blocks the rest: each item's draft is
//! written to the output directory as soon as the item finishes, and the
//! failure is reported in the final summary instead of aborting the run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use invox_core::{DigitizeOutcome, Digitizer, DocumentFile, ExtractStatus, InvoiceDraft};

use super::{load_config, load_masterdata, load_prompts};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory for per-document drafts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each draft
    #[arg(short, long, value_enum, default_value = "json")]
    format: super::digitize::OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Master data JSON file (partners, currencies, taxes)
    #[arg(short, long)]
    masterdata: Option<PathBuf>,

    /// Extra prompt templates JSON file
    #[arg(short, long)]
    prompts: Option<PathBuf>,

    /// Abort on the first failed document instead of continuing
    #[arg(long)]
    fail_fast: bool,
}

/// Result of processing a single file.
struct ItemResult {
    path: PathBuf,
    draft: InvoiceDraft,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Load configuration and collaborators
    let config = load_config(config_path)?;
    let prompts = load_prompts(args.prompts.as_deref())?;
    let masterdata = load_masterdata(args.masterdata.as_deref())?;
    let default_currency = config.extraction.default_currency.clone();

    let digitizer = Digitizer::from_config(config, prompts, Box::new(masterdata))?;

    // Expand glob pattern
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(
                ext.to_lowercase().as_str(),
                "pdf" | "png" | "jpg" | "jpeg" | "webp" | "tiff" | "tif" | "bmp"
            )
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} documents to digitize",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let (draft, item_error) = process_single(&digitizer, &path, &default_currency).await;
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        // Persist this item's draft before moving on, so earlier results
        // survive a failure later in the run.
        if let Some(ref output_dir) = args.output_dir {
            if let Err(e) = write_draft(output_dir, &path, &draft, args.format) {
                warn!("Failed to write output for {}: {}", path.display(), e);
            }
        }

        if let Some(error_msg) = &item_error {
            if args.fail_fast {
                pb.finish_and_clear();
                error!("Failed to digitize {}: {}", path.display(), error_msg);
                anyhow::bail!("Digitization failed: {}", error_msg);
            }
            warn!("Failed to digitize {}: {}", path.display(), error_msg);
        }

        results.push(ItemResult {
            path,
            draft,
            error: item_error,
            processing_time_ms,
        });

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    // Generate summary if requested
    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    // Print summary
    let successful: Vec<_> = results.iter().filter(|r| r.error.is_none()).collect();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Digitized {} documents in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(successful.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed documents:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

/// Run the digitizer for one file, mapping every failure mode onto the
/// draft so the caller always has something to persist.
async fn process_single(
    digitizer: &Digitizer,
    path: &Path,
    default_currency: &str,
) -> (InvoiceDraft, Option<String>) {
    let mut draft = InvoiceDraft::new(default_currency);
    draft.source_filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .map(str::to_string);

    let document = match DocumentFile::from_path(path) {
        Ok(document) => document,
        Err(e) => {
            let message = format!("could not load document: {e}");
            draft.extract_status = ExtractStatus::Error;
            draft.extract_error = Some(message.clone());
            return (draft, Some(message));
        }
    };

    match digitizer.digitize(&mut draft, &document).await {
        DigitizeOutcome::Completed { .. } => (draft, None),
        DigitizeOutcome::Skipped => {
            let message = "the extraction engine returned no result or is disabled".to_string();
            draft.extract_error = Some(message.clone());
            (draft, Some(message))
        }
        DigitizeOutcome::Failed { error } => (draft, Some(error)),
    }
}

fn write_draft(
    output_dir: &Path,
    source: &Path,
    draft: &InvoiceDraft,
    format: super::digitize::OutputFormat,
) -> anyhow::Result<()> {
    let output_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("invoice");

    let extension = match format {
        super::digitize::OutputFormat::Json => "json",
        super::digitize::OutputFormat::Csv => "csv",
        super::digitize::OutputFormat::Text => "txt",
    };

    let output_path = output_dir.join(format!("{}.{}", output_name, extension));
    let content = super::digitize::format_draft(draft, format)?;
    fs::write(&output_path, content)?;

    Ok(())
}

fn write_summary(path: &Path, results: &[ItemResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "reference",
        "document_number",
        "invoice_date",
        "partner_name",
        "total_gross",
        "currency",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        let draft = &result.draft;
        let status = if result.error.is_none() {
            "success"
        } else {
            "error"
        };

        wtr.write_record([
            filename.to_string(),
            status.to_string(),
            draft.reference.clone().unwrap_or_default(),
            draft.document_number.clone().unwrap_or_default(),
            draft
                .invoice_date
                .map(|d| d.to_string())
                .unwrap_or_default(),
            draft.partner_name.clone().unwrap_or_default(),
            draft.totals.gross.to_string(),
            draft.currency_code.clone(),
            result.processing_time_ms.to_string(),
            result.error.clone().unwrap_or_default(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
