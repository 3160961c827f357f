//! The `graphex inspect` command: scan only, no decoding.

use clap::Args;
use graphex_core::{Config, Extractor, ImageObject};
use std::path::PathBuf;

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// PDF document to scan
    #[arg(required = true)]
    pub document: PathBuf,
}

/// Execute the inspect command.
pub fn execute(args: InspectArgs, config: Config) -> anyhow::Result<()> {
    let extractor = Extractor::new(config);
    let bytes = extractor.read_document(&args.document)?;
    let objects = extractor.scan(&bytes)?;

    if objects.is_empty() {
        tracing::warn!("No image objects found in {:?}", args.document);
        return Ok(());
    }
    for image in &objects {
        println!("{}", describe(image));
    }
    tracing::info!("{} image object(s)", objects.len());
    Ok(())
}

fn describe(image: &ImageObject) -> String {
    format!(
        "obj{:<6} {:>6}x{:<6} {:<12} bpc={:<2} {:<14} {} bytes",
        image.object_number,
        image.width,
        image.height,
        image.color_space,
        image.bits_per_component,
        image.filter,
        image.raw_stream.len()
    )
}
