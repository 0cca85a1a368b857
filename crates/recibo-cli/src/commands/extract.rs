//! Extract command - run field extraction over raw OCR text.

use std::fs;
use std::io::Read;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use recibo_core::ExtractionEngine;

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Text file with OCR output (default: stdin)
    input: Option<PathBuf>,

    /// Print compact JSON on one line
    #[arg(long)]
    compact: bool,
}

pub async fn run(args: ExtractArgs) -> anyhow::Result<()> {
    let text = match &args.input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let result = ExtractionEngine::new().extract_text(&text);

    let output = if args.compact {
        serde_json::to_string(&result)?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    println!("{}", output);

    Ok(())
}
