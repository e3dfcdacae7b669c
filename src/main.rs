use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::Parser;

use readqc::qc::{DEFAULT_BAD_BASES, DEFAULT_LOW_QUALITY, DEFAULT_MAX_PAIRS, MIN_MAX_PAIRS};
use readqc::{run_qc, QcConfig, QualityEncoding};


#[derive(Parser)]
#[command(name = "readqc")]
#[command(about = "Check quality of paired-end sequencing reads", long_about = None)]
#[command(version)]
struct Cli {
    /// First read file (fastq, optionally compressed)
    #[arg(value_name = "1.FQ")]
    read1: PathBuf,

    /// Second read file (fastq, optionally compressed)
    #[arg(value_name = "2.FQ")]
    read2: PathBuf,

    /// Show verbose messages (repeat for more)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quality base value, 33 or 64
    #[arg(short = 'q', long, value_name = "INT", default_value = "auto",
          value_parser = parse_quality_base)]
    quality_base: QualityBase,

    /// Maximum low base quality value
    #[arg(short = 'L', long, value_name = "INT", default_value_t = DEFAULT_LOW_QUALITY)]
    low_quality: i32,

    /// Minimum bad bases for a low quality read (a fraction of the read if below 1)
    #[arg(short = 'n', long, value_name = "NUM", default_value_t = DEFAULT_BAD_BASES)]
    bad_bases: f64,

    /// Maximum pairs to check
    #[arg(short = 'N', long, value_name = "INT", default_value_t = DEFAULT_MAX_PAIRS,
          value_parser = clap::value_parser!(u64).range(MIN_MAX_PAIRS..))]
    max_pairs: u64,
}


/// Quality encoding given on the command line, `None` for "auto".
#[derive(Debug, Clone, Copy)]
struct QualityBase(Option<QualityEncoding>);

fn parse_quality_base(s: &str) -> std::result::Result<QualityBase, String> {
    if s.eq_ignore_ascii_case("auto") {
        return Ok(QualityBase(None));
    }
    s.parse::<QualityEncoding>()
        .map(|encoding| QualityBase(Some(encoding)))
        .map_err(|e| e.to_string())
}


fn run(cli: Cli) -> Result<()> {
    let config = QcConfig {
        encoding: cli.quality_base.0,
        low_quality: cli.low_quality,
        bad_bases: cli.bad_bases,
        max_pairs: cli.max_pairs,
    };
    config.validate()?;

    log::info!("Checking '{}' and '{}'", cli.read1.display(), cli.read2.display());
    let report = run_qc(&cli.read1, &cli.read2, &config)
        .with_context(|| format!("Quality check of '{}' and '{}' failed",
                                 cli.read1.display(), cli.read2.display()))?;
    println!("{}", report);
    Ok(())
}


fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(e) = run(cli) {
        log::error!("{:#}", e);
        process::exit(1);
    }
}
