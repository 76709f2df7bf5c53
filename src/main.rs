//! # Scanner Binary Entry Point
//!
//! Thin wrapper that runs image files through the full extraction pipeline:
//! load configuration, start the workers, feed every input frame, print the
//! surfaced detections.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -- --config config/scanner.toml suspect1.png suspect2.png
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use env_logger::Builder;
use log::{info, LevelFilter};
use std::io::Write;

use stegscan::capture::{FileSource, VideoSource};
use stegscan::decode::QrDecoder;
use stegscan::scan::FramePipeline;
use stegscan::ScannerConfig;

/// Command-line arguments for the scanner binary.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the scanner configuration file (TOML format)
    #[arg(short, long)]
    config: Option<String>,

    /// Image files to scan for hidden payloads
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

/// Initialize the logging system with timestamp, level, and message
/// formatting. Format: `[HH:MM:SS] [LEVEL] message`.
fn init_logger() {
    Builder::new()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ScannerConfig::from_file(path)?,
        None => ScannerConfig::default(),
    };

    info!("🚀 Scanner starting with {} input file(s)", args.inputs.len());

    let decoder = Arc::new(QrDecoder::new());
    let (pipeline, mut detections) = FramePipeline::spawn(config.pipeline_config(), decoder);

    // Presentation is a pure sink on the result queue.
    let presenter = tokio::spawn(async move {
        let mut surfaced = 0u64;
        while let Some(hit) = detections.next().await {
            surfaced += 1;
            info!(
                "✅ Hidden payload: {} (plane {}, channel {})",
                hit.text,
                hit.plane,
                hit.channel_label()
            );
        }
        surfaced
    });

    let mut source = FileSource::new(args.inputs);
    let mut fed = 0u64;
    while let Some(frame) = source.next_frame() {
        // Static files all matter, so wait for queue space instead of the
        // drop-on-full discipline a live camera loop would use.
        if !pipeline.feed(frame).await {
            break;
        }
        fed += 1;
    }
    info!("📷 Capture finished after {} frame(s)", fed);

    pipeline.shutdown().await;
    let surfaced = presenter.await?;
    info!("🏁 Done: {} detection(s) surfaced", surfaced);

    Ok(())
}
