// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Clipscan — identity-document capture and OCR upload
//
// Entry point. Initialises logging, resolves configuration, and runs one
// subcommand against the capture pipeline.

mod commands;
mod services;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use clipscan_core::error::Result;
use clipscan_core::human_errors::humanize_error;
use clipscan_core::registry::DocumentRegistry;
use clipscan_core::types::{OcrFields, Viewport};

use commands::{SaveOcrOptions, ScanOptions, ScanReport};
use services::data_dir::{data_dir, data_subdir};
use services::settings::{ConfigOverrides, resolve_config};

#[derive(Parser)]
#[command(name = "clipscan")]
#[command(about = "Capture an identity document, crop it to the guide frame, and send it for OCR")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: ConfigOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a document from an image file and send it to /ocr/scan
    Scan {
        /// Image standing in for the camera
        #[arg(long)]
        image: PathBuf,
        /// Document type code (see `clipscan types`)
        #[arg(long = "type", value_name = "ID")]
        document_type: Option<String>,
        #[command(flatten)]
        viewport: ViewportArgs,
        /// Upload after capture even if auto_upload is off
        #[arg(long)]
        upload: bool,
    },
    /// List the supported document types
    Types,
    /// Print the guide frame for a preview size
    Frame {
        #[arg(long)]
        width: f32,
        #[arg(long)]
        height: f32,
        #[arg(long = "type", value_name = "ID", default_value = "01")]
        document_type: String,
    },
    /// Send already-extracted OCR values with their image to /ocr/save
    SaveOcr {
        #[arg(long)]
        image: PathBuf,
        #[arg(long = "type", value_name = "ID")]
        document_type: String,
        #[command(flatten)]
        fields: OcrFieldArgs,
    },
    /// Draw the guide frame over an image and write it as a new file
    Preview {
        #[arg(long)]
        image: PathBuf,
        #[arg(long = "type", value_name = "ID", default_value = "01")]
        document_type: String,
        #[command(flatten)]
        viewport: ViewportArgs,
        /// Output path; the format follows the extension
        #[arg(long, short)]
        output: PathBuf,
    },
}

#[derive(Args)]
struct ViewportArgs {
    /// Preview width the frame is laid out in (defaults to the image width)
    #[arg(long = "viewport-width", requires = "viewport_height")]
    viewport_width: Option<f32>,
    /// Preview height the frame is laid out in (defaults to the image height)
    #[arg(long = "viewport-height", requires = "viewport_width")]
    viewport_height: Option<f32>,
}

impl ViewportArgs {
    fn viewport(&self) -> Option<Viewport> {
        Some(Viewport::new(self.viewport_width?, self.viewport_height?))
    }
}

#[derive(Args)]
struct OcrFieldArgs {
    #[arg(long)]
    number: Option<String>,
    #[arg(long)]
    birth_day: Option<String>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    expire_date: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    reserved: Option<String>,
}

impl From<OcrFieldArgs> for OcrFields {
    fn from(args: OcrFieldArgs) -> Self {
        Self {
            ocr_number: args.number,
            ocr_birth_day: args.birth_day,
            ocr_name: args.name,
            ocr_expire_date: args.expire_date,
            ocr_address: args.address,
            ocr_reserved: args.reserved,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "clipscan failed");
            let human = humanize_error(&e);
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli.config, &data_dir()?)?;
    let registry = DocumentRegistry::default();

    match cli.command {
        Commands::Scan {
            image,
            document_type,
            viewport,
            upload,
        } => {
            let options = ScanOptions {
                image,
                document_type,
                viewport: viewport.viewport(),
                upload,
            };
            match commands::scan(config, options, &data_subdir("scans")?).await? {
                ScanReport::Captured(image) => println!("{}", image.path.display()),
                ScanReport::Uploaded(response) => {
                    println!("{}", serde_json::to_string_pretty(&response)?);
                }
                ScanReport::Cancelled => eprintln!("Capture cancelled."),
            }
        }
        Commands::Types => {
            for line in commands::list_types(&registry) {
                println!("{line}");
            }
        }
        Commands::Frame {
            width,
            height,
            document_type,
        } => {
            let report =
                commands::frame_report(&registry, Viewport::new(width, height), &document_type)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::SaveOcr {
            image,
            document_type,
            fields,
        } => {
            let options = SaveOcrOptions {
                image,
                document_type,
                fields: fields.into(),
            };
            let response = commands::save_ocr(&config, options).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Preview {
            image,
            document_type,
            viewport,
            output,
        } => {
            let frame = commands::preview(
                &registry,
                &image,
                &document_type,
                viewport.viewport(),
                &output,
            )?;
            tracing::debug!(?frame, "guide frame drawn");
            println!("{}", output.display());
        }
    }
    Ok(())
}
