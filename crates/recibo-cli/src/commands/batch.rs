//! Batch processing command for multiple receipt files.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use recibo_core::{DocumentKind, ProcessResponse};

use super::process::{CSV_HEADER, OutputFormat, csv_record, display_name, format_response};
use super::{build_processor, load_config, resolve_model_dir, text_processor};

const SUPPORTED_EXTENSIONS: &[&str] = &[
    "pdf", "png", "jpg", "jpeg", "tif", "tiff", "bmp", "webp", "txt",
];

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// Result of processing a single file.
struct FileResult {
    path: PathBuf,
    response: Option<ProcessResponse>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!("{} Found {} files to process", style("ℹ").blue(), files.len());

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let model_dir = resolve_model_dir(&config, args.model_dir.as_deref());
    let needs_ocr = files
        .iter()
        .any(|p| DocumentKind::detect(Some(&display_name(p)), None) != DocumentKind::Text);

    // Models are loaded once for the whole batch
    let processor = if needs_ocr {
        if !config.models.is_complete(&model_dir) {
            warn!("OCR models not found at {}, OCR will fail", model_dir.display());
        }
        build_processor(&config, &model_dir)
    } else {
        text_processor(&config)
    };

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files",
            )?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(files.len());

    for path in files {
        let file_start = Instant::now();
        let name = display_name(&path);

        let result = fs::read(&path)
            .map_err(anyhow::Error::from)
            .and_then(|data| Ok(processor.process(&data, Some(&name), None)?));

        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(response) => results.push(FileResult {
                path,
                response: Some(response),
                error: None,
                processing_time_ms,
            }),
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(FileResult {
                        path,
                        response: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_and_clear();

    if let Some(output_dir) = &args.output_dir {
        for result in &results {
            let Some(response) = &result.response else {
                continue;
            };
            let stem = result.path.file_stem().and_then(|s| s.to_str()).unwrap_or("receipt");
            let output_path = output_dir.join(format!("{}.{}", stem, args.format.extension()));

            let content = format_response(response, args.format, &display_name(&result.path))?;
            fs::write(&output_path, content)?;
            debug!("Wrote output to {}", output_path.display());
        }
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!("{} Summary written to {}", style("✓").green(), summary_path.display());
    }

    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    eprintln!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn write_summary(path: &Path, results: &[FileResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = CSV_HEADER.to_vec();
    header.push("processing_time_ms");
    wtr.write_record(&header)?;

    for result in results {
        let name = display_name(&result.path);
        let mut record = match &result.response {
            Some(response) => csv_record(&name, response),
            None => {
                let mut record = vec![String::new(); CSV_HEADER.len()];
                record[0] = name;
                record[CSV_HEADER.len() - 1] = result.error.clone().unwrap_or_default();
                record
            }
        };
        record.push(result.processing_time_ms.to_string());
        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(is_supported(Path::new("boleta.PDF")));
        assert!(is_supported(Path::new("dump.txt")));
        assert!(is_supported(Path::new("foto.jpeg")));
        assert!(!is_supported(Path::new("notes.md")));
        assert!(!is_supported(Path::new("README")));
    }
}
