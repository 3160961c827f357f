//! The `graphex extract` command: the full pipeline, written to disk.

use clap::{Args, ValueEnum};
use graphex_core::{write_outputs, Config, Extractor, Manifest, OutputFormat as CoreOutputFormat};
use std::path::PathBuf;
use std::time::Instant;

/// Supported manifest formats.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}

/// Arguments for the `extract` command.
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// PDF document to extract images from
    #[arg(required = true)]
    pub document: PathBuf,

    /// Output directory (defaults to `output.dir` from config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Manifest format (defaults to `output.format` from config)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Number of parallel workers
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Write the manifest without indentation
    #[arg(long)]
    pub compact: bool,

    /// Also write every image as a standalone file in the output directory
    #[arg(long)]
    pub write_images: bool,
}

/// Manual Default impl for constructing ExtractArgs outside of clap.
impl Default for ExtractArgs {
    fn default() -> Self {
        Self {
            document: PathBuf::new(),
            output: None,
            format: None,
            parallel: None,
            compact: false,
            write_images: false,
        }
    }
}

/// Execute the extract command.
pub async fn execute(args: ExtractArgs, config: Config) -> anyhow::Result<()> {
    let config = apply_overrides(config, &args)?;
    let format = resolve_format(&config, args.format)?;
    let output_dir = config.output_dir();

    let extractor = Extractor::new(config);
    let bytes = extractor.read_document(&args.document)?;
    tracing::info!(
        "Extracting images from {:?} ({} bytes)",
        args.document,
        bytes.len()
    );

    let start = Instant::now();
    let progress = create_progress_bar()?;
    let manifest = extractor
        .extract_with_progress(
            &bytes,
            |total| {
                progress.set_length(total as u64);
                progress.set_message("processing...");
            },
            |outcome| {
                if let Ok(entry) = outcome {
                    progress.set_message(entry.name.clone());
                }
                progress.inc(1);
            },
        )
        .await;
    progress.finish_and_clear();
    let manifest = manifest?;

    if manifest.total() == 0 {
        tracing::warn!("No image objects found in {:?}", args.document);
    }

    let written = write_outputs(
        &output_dir,
        &manifest,
        &extractor.config().output,
        format,
        args.write_images,
    )?;
    tracing::info!(
        "Wrote {} entries to {:?}",
        manifest.entries.len(),
        written.manifest
    );
    if let Some(errors) = &written.errors {
        tracing::info!("Wrote {} error lines to {:?}", manifest.errors.len(), errors);
    }

    print_summary(&manifest, start.elapsed());
    Ok(())
}

/// Fold command-line flags into the loaded configuration.
fn apply_overrides(mut config: Config, args: &ExtractArgs) -> anyhow::Result<Config> {
    if let Some(parallel) = args.parallel {
        if parallel == 0 {
            anyhow::bail!("--parallel must be at least 1");
        }
        config.processing.parallel_workers = parallel;
    }
    if let Some(dir) = &args.output {
        config.output.dir = dir.clone();
    }
    if args.compact {
        config.output.pretty = false;
    }
    Ok(config)
}

fn resolve_format(config: &Config, flag: Option<OutputFormat>) -> anyhow::Result<CoreOutputFormat> {
    match flag {
        Some(format) => Ok(format.into()),
        None => CoreOutputFormat::parse(&config.output.format).ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown output format '{}' in config (expected json or jsonl)",
                config.output.format
            )
        }),
    }
}

/// Create a progress bar; its length is set once the scan has finished.
fn create_progress_bar() -> anyhow::Result<indicatif::ProgressBar> {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
            )?
            .progress_chars("##-"),
    );
    pb.set_message("scanning...");
    Ok(pb)
}

/// Print a formatted summary table after extraction.
fn print_summary(manifest: &Manifest, elapsed: std::time::Duration) {
    let captured = manifest.entries.len();
    let failed = manifest.errors.len();
    let rate = if elapsed.as_secs_f64() > 0.0 {
        manifest.total() as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    };

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Captured:     {:>8}", captured);
    if failed > 0 {
        eprintln!("    Failed:       {:>8}", failed);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Total:        {:>8}", manifest.total());
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("    Rate:         {:>7.1} img/sec", rate);
    eprintln!("  ====================================");
}
