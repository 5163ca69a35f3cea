//! List all stations and channels in an inventory file

#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use sc3ml_repair::inventory::read_inventory;

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "sc3ml-list")]
#[command(author, version, about = "List all stations in an inventory", long_about = None)]
struct Cli {
    /// Path to the SC3ML file (.xml or .xml.gz)
    #[arg(long, value_name = "PATH")]
    inventory: PathBuf,
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::WARN)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match read_inventory(&cli.inventory) {
        Ok(inventory) => print!("{}", inventory),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
