//! Models command - download and manage OCR models.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;
use futures_util::StreamExt;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use recibo_core::models::config::ModelConfig;

use super::{load_config, resolve_model_dir};

/// Arguments for the models command.
#[derive(Args)]
pub struct ModelsArgs {
    #[command(subcommand)]
    command: ModelsCommand,
}

#[derive(Subcommand)]
enum ModelsCommand {
    /// List the model files recibo needs
    List,

    /// Download models
    Download(DownloadArgs),

    /// Check model status
    Status(DirArgs),

    /// Remove downloaded models
    Clean(DirArgs),
}

#[derive(Args)]
struct DownloadArgs {
    /// Base URL the model files are served from; each file is fetched
    /// from `<base-url>/<file name>`
    #[arg(long)]
    base_url: String,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force re-download even if files exist
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct DirArgs {
    /// Model directory (default: from config or the data directory)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,
}

/// What each model file is for.
fn describe(models: &ModelConfig, filename: &str) -> &'static str {
    if filename == models.detection_model {
        "Text detection (DB)"
    } else if filename == models.recognition_model {
        "Text recognition (Latin script)"
    } else {
        "Character dictionary"
    }
}

pub async fn run(args: ModelsArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    match args.command {
        ModelsCommand::List => list_models(&config.models, &resolve_model_dir(&config, None)),
        ModelsCommand::Download(download_args) => {
            let dir = resolve_model_dir(&config, download_args.output.as_deref());
            download_models(&config.models, &dir, &download_args).await
        }
        ModelsCommand::Status(dir_args) => {
            let dir = resolve_model_dir(&config, dir_args.model_dir.as_deref());
            check_status(&config.models, &dir).map(|_| ())
        }
        ModelsCommand::Clean(dir_args) => {
            let dir = resolve_model_dir(&config, dir_args.model_dir.as_deref());
            clean_models(&config.models, &dir)
        }
    }
}

fn list_models(models: &ModelConfig, model_dir: &Path) -> anyhow::Result<()> {
    println!("{}", style("OCR Model Files").bold());
    println!();

    for filename in models.files() {
        println!("    {:<20} {}", filename, describe(models, filename));
    }

    println!();
    println!("Model directory: {}", model_dir.display());
    println!();
    println!("Commands:");
    println!("  recibo models download --base-url <URL>    Download the model files");
    println!("  recibo models status                       Check which files are present");

    Ok(())
}

async fn download_models(
    models: &ModelConfig,
    output_dir: &Path,
    args: &DownloadArgs,
) -> anyhow::Result<()> {
    fs::create_dir_all(output_dir)?;

    println!(
        "{} Downloading models to {}",
        style("ℹ").blue(),
        output_dir.display()
    );
    println!();

    let client = reqwest::Client::builder()
        .user_agent(concat!("recibo-cli/", env!("CARGO_PKG_VERSION")))
        .timeout(std::time::Duration::from_secs(300))
        .build()?;

    let multi_progress = MultiProgress::new();
    let mut success_count = 0;
    let mut skip_count = 0;
    let mut error_count = 0;

    let base_url = args.base_url.trim_end_matches('/');

    for filename in models.files() {
        let path = output_dir.join(filename);

        if path.exists() && !args.force {
            let size = fs::metadata(&path)?.len();
            if size > 0 {
                println!(
                    "  {} {} (already exists, {})",
                    style("✓").green(),
                    filename,
                    format_size(size)
                );
                skip_count += 1;
                continue;
            }
        }

        let url = format!("{}/{}", base_url, filename);

        let pb = multi_progress.add(ProgressBar::new(0));
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "  {spinner:.green} {msg:<30} [{bar:25.cyan/blue}] {bytes}/{total_bytes}",
                )?
                .progress_chars("=>-"),
        );
        pb.set_message(filename.to_string());

        match download_file(&client, &url, &path, &pb).await {
            Ok(()) => {
                pb.finish_with_message(format!("{} {}", style("✓").green(), filename));
                success_count += 1;
            }
            Err(e) => {
                pb.finish_with_message(format!("{} {} - {}", style("✗").red(), filename, e));
                error_count += 1;
            }
        }
    }

    println!();

    if error_count == 0 {
        println!("{} Models downloaded successfully!", style("✓").green().bold());
        if skip_count > 0 {
            println!("   {} downloaded, {} already present", success_count, skip_count);
        }
    } else {
        println!("{} Download completed with errors", style("⚠").yellow().bold());
        println!(
            "   {} downloaded, {} skipped, {} failed",
            success_count, skip_count, error_count
        );
        println!();
        println!("Retry with: recibo models download --base-url {} --force", base_url);
    }

    println!();
    check_status(models, output_dir)?;

    Ok(())
}

async fn download_file(
    client: &reqwest::Client,
    url: &str,
    path: &Path,
    pb: &ProgressBar,
) -> anyhow::Result<()> {
    let response = client.get(url).send().await?;

    if !response.status().is_success() {
        anyhow::bail!("HTTP {}", response.status());
    }

    if let Some(content_length) = response.content_length() {
        pb.set_length(content_length);
    }

    // Download into a temp file so an interrupted transfer never looks complete
    let temp_path = path.with_extension("tmp");
    let mut file = File::create(&temp_path)?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk)?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush()?;
    drop(file);

    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Print the status of each model file. Returns true when all are present.
fn check_status(models: &ModelConfig, model_dir: &Path) -> anyhow::Result<bool> {
    println!("{}", style("Model Status").bold());
    println!("{}", model_dir.display());

    let mut all_present = true;
    let mut total_size: u64 = 0;

    for filename in models.files() {
        let path = model_dir.join(filename);
        let (status, size_str) = match fs::metadata(&path) {
            Ok(metadata) if metadata.len() > 0 => {
                total_size += metadata.len();
                (style("✓").green(), format_size(metadata.len()))
            }
            Ok(_) => {
                all_present = false;
                (style("⚠").yellow(), "empty".to_string())
            }
            Err(_) => {
                all_present = false;
                (style("✗").red(), "missing".to_string())
            }
        };

        println!("    {} {:<25} {:>10}", status, filename, size_str);
    }

    if all_present {
        println!("    {} Ready ({} total)", style("✓").green(), format_size(total_size));
    } else {
        println!(
            "    {} Run 'recibo models download --base-url <URL>' to download",
            style("⚠").yellow()
        );
    }

    Ok(all_present)
}

fn clean_models(models: &ModelConfig, model_dir: &Path) -> anyhow::Result<()> {
    if !model_dir.exists() {
        println!("{} No model files to remove.", style("ℹ").blue());
        return Ok(());
    }

    let mut total_removed = 0;
    let mut total_freed: u64 = 0;

    for filename in models.files() {
        let path = model_dir.join(filename);
        if path.exists() {
            let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            fs::remove_file(&path)?;
            total_removed += 1;
            total_freed += size;
            println!("  {} Removed {}", style("✓").green(), filename);
        }
    }

    // Leftovers from interrupted downloads
    if let Ok(entries) = fs::read_dir(model_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "tmp").unwrap_or(false) {
                let _ = fs::remove_file(&path);
            }
        }
    }

    if total_removed > 0 {
        println!();
        println!(
            "{} Removed {} files, freed {}",
            style("✓").green(),
            total_removed,
            format_size(total_freed)
        );
    } else {
        println!("{} No model files to remove.", style("ℹ").blue());
    }

    Ok(())
}

fn format_size(bytes: u64) -> String {
    if bytes >= 1_000_000_000 {
        format!("{:.1}GB", bytes as f64 / 1_000_000_000.0)
    } else if bytes >= 1_000_000 {
        format!("{:.1}MB", bytes as f64 / 1_000_000.0)
    } else if bytes >= 1_000 {
        format!("{:.1}KB", bytes as f64 / 1_000.0)
    } else {
        format!("{}B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(2_500), "2.5KB");
        assert_eq!(format_size(9_800_000), "9.8MB");
    }

    #[test]
    fn test_describe_files() {
        let models = ModelConfig::default();
        assert_eq!(describe(&models, "det.onnx"), "Text detection (DB)");
        assert_eq!(describe(&models, "latin_dict.txt"), "Character dictionary");
    }
}
