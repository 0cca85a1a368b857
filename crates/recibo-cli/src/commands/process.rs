//! Process command - extract data from a single receipt file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use recibo_core::models::config::RecConfig;
use recibo_core::{DocumentKind, ExtractedData, ProcessResponse, format_clp, parse_raw_date};

use super::{build_processor, load_config, resolve_model_dir, text_processor};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF, image or .txt OCR dump)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Show OCR confidence and processing time
    #[arg(long)]
    show_confidence: bool,
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

impl OutputFormat {
    /// File extension for outputs written in this format.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb.set_message("Processing...");

    let response = process_file(&args.input, &config, args.model_dir.as_deref())?;

    pb.finish_and_clear();

    let output = format_response(&response, args.format, &display_name(&args.input))?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!("{} Output written to {}", style("✓").green(), output_path.display());
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        eprintln!();
        eprintln!(
            "{} OCR confidence: {:.1}%",
            style("ℹ").blue(),
            response.confidence * 100.0
        );
        eprintln!("{} Processing time: {}ms", style("ℹ").blue(), start.elapsed().as_millis());
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Run one file through the document processor.
///
/// Text dumps never need models; PDFs and images fail early with a hint
/// when the OCR models are missing.
pub fn process_file(
    path: &Path,
    config: &RecConfig,
    model_dir: Option<&Path>,
) -> anyhow::Result<ProcessResponse> {
    let name = display_name(path);
    let kind = DocumentKind::detect(Some(&name), None);
    let model_dir = resolve_model_dir(config, model_dir);

    if kind == DocumentKind::Image && !config.models.is_complete(&model_dir) {
        anyhow::bail!(
            "OCR models not found at {}.\n\n\
             Run 'recibo models download --base-url <URL>' to download them.",
            model_dir.display()
        );
    }

    let data = fs::read(path)?;
    let processor = match kind {
        DocumentKind::Text => text_processor(config),
        _ => build_processor(config, &model_dir),
    };
    Ok(processor.process(&data, Some(&name), None)?)
}

/// File name for messages and output records.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("document")
        .to_string()
}

pub fn format_response(
    response: &ProcessResponse,
    format: OutputFormat,
    name: &str,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(response)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record(CSV_HEADER)?;
            wtr.write_record(csv_record(name, response))?;
            Ok(String::from_utf8(wtr.into_inner()?)?)
        }
        OutputFormat::Text => Ok(format_text(response)),
    }
}

/// Columns written by [`csv_record`].
pub const CSV_HEADER: [&str; 12] = [
    "file",
    "amount",
    "currency",
    "date",
    "date_iso",
    "due_date",
    "vendor",
    "invoice_number",
    "category",
    "description",
    "confidence",
    "error",
];

/// One CSV row for a processed document.
pub fn csv_record(name: &str, response: &ProcessResponse) -> Vec<String> {
    let confidence = format!("{:.2}", response.confidence);

    match &response.extracted_data {
        ExtractedData::Fields(fields) => vec![
            name.to_string(),
            fields.amount.map(|a| a.to_string()).unwrap_or_default(),
            fields.currency.code().to_string(),
            fields.date.clone().unwrap_or_default(),
            iso_date(fields.date.as_deref())
                .map(|d| d.to_string())
                .unwrap_or_default(),
            fields.due_date.clone().unwrap_or_default(),
            fields.vendor.clone().unwrap_or_default(),
            fields.invoice_number.clone().unwrap_or_default(),
            fields.category.map(|c| c.to_string()).unwrap_or_default(),
            fields.description.clone().unwrap_or_default(),
            confidence,
            String::new(),
        ],
        ExtractedData::Failed { error } => {
            let mut record = vec![String::new(); CSV_HEADER.len()];
            record[0] = name.to_string();
            record[10] = confidence;
            record[11] = error.clone();
            record
        }
    }
}

fn iso_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.and_then(parse_raw_date)
}

fn format_text(response: &ProcessResponse) -> String {
    let mut output = String::new();

    let fields = match &response.extracted_data {
        ExtractedData::Fields(fields) => fields,
        ExtractedData::Failed { error } => {
            output.push_str(&format!("{}\n", response.text));
            output.push_str(&format!("Error: {}\n", error));
            return output;
        }
    };

    if let Some(description) = &fields.description {
        output.push_str(&format!("{}\n\n", description));
    }

    if let Some(vendor) = &fields.vendor {
        output.push_str(&format!("Vendor:   {}\n", vendor));
    }
    if let Some(amount) = fields.amount.and_then(format_clp) {
        output.push_str(&format!("Amount:   ${} {}\n", amount, fields.currency));
    }
    if let Some(date) = &fields.date {
        match iso_date(Some(date)) {
            Some(iso) => output.push_str(&format!("Date:     {} ({})\n", date, iso)),
            None => output.push_str(&format!("Date:     {}\n", date)),
        }
    }
    if let Some(due_date) = &fields.due_date {
        output.push_str(&format!("Due:      {}\n", due_date));
    }
    if let Some(number) = &fields.invoice_number {
        output.push_str(&format!("Number:   {}\n", number));
    }
    if let Some(category) = fields.category {
        output.push_str(&format!("Category: {}\n", category));
    }

    if fields.is_empty() {
        output.push_str("No fields found\n");
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use recibo_core::extract_text;

    fn response(text: &str) -> ProcessResponse {
        ProcessResponse::extracted(text.to_string(), extract_text(text))
    }

    #[test]
    fn test_csv_record_for_fields() {
        let record = csv_record("boleta.txt", &response("Jumbo\nTotal: $12.990\n05/03/2024"));

        assert_eq!(record.len(), CSV_HEADER.len());
        assert_eq!(record[1], "12990");
        assert_eq!(record[2], "CLP");
        assert_eq!(record[4], "2024-03-05");
        assert_eq!(record[6], "Jumbo");
        assert_eq!(record[8], "supermercado");
    }

    #[test]
    fn test_csv_record_for_failure() {
        let record = csv_record("foto.png", &ProcessResponse::ocr_failed("engine crashed"));

        assert_eq!(record[0], "foto.png");
        assert_eq!(record[1], "");
        assert_eq!(record[10], "0.00");
        assert_eq!(record[11], "engine crashed");
    }

    #[test]
    fn test_text_summary() {
        let text = format_text(&response("Jumbo\nTotal: $12.990"));

        assert!(text.starts_with("Pago a Jumbo (supermercado) por $12.990\n"));
        assert!(text.contains("Amount:   $12.990 CLP"));
    }
}
