use clap::Parser;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use omnichord_overlay::overlay_map::{OverlayMap, RowNudge};

/// Nudges chord rows of an existing overlay map downwards, in reference pixels.
#[derive(Parser, Debug)]
#[command(name = "shift_rows", version)]
struct Cli {
    /// Overlay map JSON, rewritten in place
    map: PathBuf,

    /// Offset for the major row
    #[arg(long = "maj", default_value_t = 2.0, allow_negative_numbers = true)]
    maj: f64,

    /// Offset for the minor row
    #[arg(long = "min", default_value_t = 14.0, allow_negative_numbers = true)]
    min: f64,

    /// Offset for the seventh row
    #[arg(long = "seventh", default_value_t = 3.0, allow_negative_numbers = true)]
    seventh: f64,
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let mut map = OverlayMap::read(&cli.map)?;
    let nudge = RowNudge::new([("maj", cli.maj), ("min", cli.min), ("7", cli.seventh)]);
    let moved = map.shift_rows(&nudge);
    map.write(&cli.map)?;
    tracing::info!(
        "Shifted {moved} chord elements in {} (reference height {})",
        cli.map.display(),
        map.reference.height
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
