use anyhow::{Context, Result};
use clap::Parser;
use converter::{driver, Codec, ConvertConfig, ConvertError};
use std::path::PathBuf;
use log::info;

/// Batch-convert marked WAV recordings with ffmpeg
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory to scan for *_TrLR.wav files, or a single file to convert
    input: PathBuf,

    /// Write converted files here instead of next to each source
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output codec: mp3, aac or pcm
    #[arg(long, value_parser = parse_codec)]
    codec: Option<Codec>,

    /// Target bitrate in kbps
    #[arg(short, long)]
    bitrate: Option<u32>,

    /// Number of conversions run together
    #[arg(short = 'j', long)]
    parallel: Option<usize>,

    /// Kill a conversion after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Path to the ffmpeg binary
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Path to configuration file (JSON or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_codec(s: &str) -> Result<Codec, String> {
    s.parse().map_err(|e: ConvertError| e.to_string())
}

impl Args {
    /// Flags given on the command line win over the config file
    fn apply_to(&self, cfg: &mut ConvertConfig) {
        if let Some(output) = &self.output {
            cfg.output_dir = Some(output.clone());
        }
        if let Some(codec) = self.codec {
            cfg.codec = codec;
        }
        if let Some(bitrate) = self.bitrate {
            cfg.bitrate_kbps = bitrate;
        }
        if let Some(parallel) = self.parallel {
            cfg.max_parallel = parallel;
        }
        if let Some(timeout) = self.timeout {
            cfg.job_timeout_secs = Some(timeout);
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            cfg.ffmpeg_bin = ffmpeg.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise info, or debug with --verbose
    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .init();

    let mut cfg = ConvertConfig::load_config(args.config.as_deref())
        .context("Failed to load configuration")?;
    args.apply_to(&mut cfg);

    info!("Configuration:");
    info!("  Codec: {} ({})", cfg.codec, cfg.codec.ffmpeg_name());
    info!("  Bitrate: {}k", cfg.bitrate_kbps);
    match &cfg.output_dir {
        Some(dir) => info!("  Output dir: {}", dir.display()),
        None => info!("  Output dir: next to each source"),
    }
    info!("  Window size: {}", cfg.max_parallel);

    let summary = if args.input.is_file() {
        info!("Converting single file: {}", args.input.display());
        driver::convert_file(&args.input, &cfg).await
    } else {
        driver::convert_tree(&args.input, &cfg).await
    }
    .with_context(|| format!("Conversion of {} failed", args.input.display()))?;

    let elapsed = summary.finished_at - summary.started_at;
    info!("✅ Done: {}/{} file(s) in {} window(s), {:.1}s",
          summary.processed, summary.total, summary.windows,
          elapsed.num_milliseconds() as f64 / 1000.0);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary).context("Failed to serialize summary")?);
    }

    Ok(())
}
