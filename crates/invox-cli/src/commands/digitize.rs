//! Digitize command - run AI extraction for a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::debug;

use invox_core::{DigitizeOutcome, Digitizer, DocumentFile, InvoiceDraft};

use super::{load_config, load_masterdata, load_prompts};

/// Arguments for the digitize command.
#[derive(Args)]
pub struct DigitizeArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Master data JSON file (partners, currencies, taxes)
    #[arg(short, long)]
    masterdata: Option<PathBuf>,

    /// Extra prompt templates JSON file
    #[arg(short, long)]
    prompts: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

pub async fn run(args: DigitizeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let prompts = load_prompts(args.prompts.as_deref())?;
    let masterdata = load_masterdata(args.masterdata.as_deref())?;
    let default_currency = config.extraction.default_currency.clone();

    let digitizer = Digitizer::from_config(config, prompts, Box::new(masterdata))?;

    let document = DocumentFile::from_path(&args.input)?;
    let mut draft = InvoiceDraft::new(&default_currency);
    draft.source_filename = Some(document.filename.clone());

    match digitizer.digitize(&mut draft, &document).await {
        DigitizeOutcome::Completed { warnings } => {
            if !warnings.is_empty() {
                eprintln!("{}", style("Warnings:").yellow());
                for warning in &warnings {
                    eprintln!("  - {}", warning);
                }
            }
        }
        DigitizeOutcome::Skipped => {
            anyhow::bail!(
                "Digitization is disabled; enable it in the configuration (company.enabled)."
            );
        }
        DigitizeOutcome::Failed { error } => {
            anyhow::bail!("Digitization failed: {}", error);
        }
    }

    let output = format_draft(&draft, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub fn format_draft(draft: &InvoiceDraft, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string(draft)?),
        OutputFormat::Csv => format_csv(draft),
        OutputFormat::Text => Ok(format_text(draft)),
    }
}

fn format_csv(draft: &InvoiceDraft) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    // Write header
    wtr.write_record([
        "reference",
        "document_number",
        "invoice_date",
        "due_date",
        "partner_name",
        "currency",
        "total_net",
        "total_tax",
        "total_gross",
        "extract_status",
    ])?;

    // Write data
    wtr.write_record([
        draft.reference.clone().unwrap_or_default(),
        draft.document_number.clone().unwrap_or_default(),
        draft.invoice_date.map(|d| d.to_string()).unwrap_or_default(),
        draft.due_date.map(|d| d.to_string()).unwrap_or_default(),
        draft.partner_name.clone().unwrap_or_default(),
        draft.currency_code.clone(),
        draft.totals.net.to_string(),
        draft.totals.tax.to_string(),
        draft.totals.gross.to_string(),
        draft.extract_status.as_str().to_string(),
    ])?;

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_text(draft: &InvoiceDraft) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Invoice: {}\n",
        draft.reference.as_deref().unwrap_or("-")
    ));
    if let Some(number) = &draft.document_number {
        output.push_str(&format!("Document number: {}\n", number));
    }
    if let Some(date) = draft.invoice_date {
        output.push_str(&format!("Date: {}\n", date));
    }
    output.push('\n');

    output.push_str("Partner:\n");
    output.push_str(&format!(
        "  {}\n",
        draft.partner_name.as_deref().unwrap_or("(not matched)")
    ));
    output.push('\n');

    if !draft.lines.is_empty() {
        output.push_str("Lines:\n");
        for line in &draft.lines {
            output.push_str(&format!(
                "  {} x {} @ {} = {} {}\n",
                line.quantity,
                line.description,
                line.unit_price,
                line.total_gross,
                draft.currency_code
            ));
        }
        output.push('\n');
    }

    output.push_str("Summary:\n");
    output.push_str(&format!(
        "  Net:   {} {}\n",
        draft.totals.net, draft.currency_code
    ));
    output.push_str(&format!(
        "  Tax:   {} {}\n",
        draft.totals.tax, draft.currency_code
    ));
    output.push_str(&format!(
        "  Gross: {} {}\n",
        draft.totals.gross, draft.currency_code
    ));

    if let Some(due_date) = draft.due_date {
        output.push_str(&format!("\nPayment due: {}\n", due_date));
    }

    output
}
