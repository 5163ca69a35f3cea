//! Command-line interface for sc3ml-repair

#[cfg(feature = "cli")]
use clap::{ArgAction, Parser};

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use sc3ml_repair::{limits::Limits, repair, Loader, NormalizeOptions};

#[cfg(feature = "cli")]
use tracing::Level;

#[cfg(feature = "cli")]
use tracing_subscriber::FmtSubscriber;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "sc3ml-repair")]
#[command(author, version, about = "Force numeric station attributes in SC3ML (namespace/case-insensitive)", long_about = None)]
struct Cli {
    /// Input SC3ML (.xml or .xml.gz)
    #[arg(long = "in", value_name = "PATH")]
    input: PathBuf,

    /// Output SC3ML (.xml or .xml.gz)
    #[arg(long = "out", value_name = "PATH")]
    output: PathBuf,

    /// Also normalize stream azimuth/dip/sampleRate
    #[arg(long)]
    fix_channels: bool,

    /// Reject inputs whose decompressed size exceeds this many bytes
    #[arg(long, value_name = "BYTES")]
    max_size: Option<usize>,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[cfg(feature = "cli")]
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    // Only fails if a subscriber is already installed.
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = NormalizeOptions::default().with_fix_channels(cli.fix_channels);
    let loader = Loader::new().with_limits(Limits::default().with_max_xml_size(cli.max_size));
    let report = repair(&loader, &cli.input, &cli.output, options)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report);
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
