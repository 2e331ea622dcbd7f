use clap::Parser;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use omnichord_overlay::OverlayConfig;
use omnichord_overlay::kornia::EdgeContourExtractor;
use omnichord_overlay::pipeline::{OverlayRun, generate_overlay_map_detailed, open_image};
use omnichord_overlay::plot_overlay::render_overlay_rgba;

#[derive(Parser, Debug)]
#[command(
    name = "overlay_map",
    about = "Generate a chord-button overlay map (JSON) from an omnichord panel photograph",
    version
)]
struct Cli {
    /// Reference photograph of the panel
    image: PathBuf,

    /// Where to write the overlay map JSON
    out: PathBuf,

    /// JSON file overriding the geometric priors
    #[arg(long = "config", short = 'c')]
    config: Option<PathBuf>,

    /// Value stored as `reference.image` (defaults to IMAGE as given)
    #[arg(long = "reference-image")]
    reference_image: Option<String>,

    /// Also render a PNG preview of the detected overlay
    #[arg(long = "preview", short = 'p')]
    preview: Option<PathBuf>,
}

fn write_preview(
    path: &Path,
    image: &image::DynamicImage,
    run: &OverlayRun,
) -> Result<(), Box<dyn Error>> {
    let background = image.to_rgb8();
    let (w, h) = background.dimensions();
    let pixels = render_overlay_rgba(w, h, &run.map, Some(&run.calibration), Some(&background))?;
    let rgba = image::RgbaImage::from_raw(w, h, pixels)
        .ok_or_else(|| format!("Failed to build RGBA image for preview ({w}x{h})"))?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    rgba.save(path)?;
    Ok(())
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => OverlayConfig::load(path)?,
        None => OverlayConfig::default(),
    };

    tracing::info!("Loading image: {}", cli.image.display());
    let image = open_image(&cli.image)?;
    tracing::info!("Image size: {}x{}", image.width(), image.height());

    let label = cli
        .reference_image
        .clone()
        .unwrap_or_else(|| cli.image.display().to_string());
    let extractor = EdgeContourExtractor::new(config.extractor.clone());
    let run = generate_overlay_map_detailed(&image, &extractor, &label, &config)?;

    tracing::info!(
        "{} labels, {} buttons; slope {:.3}; {} chord elements",
        run.filtered.labels.len(),
        run.filtered.buttons.len(),
        run.calibration.fit.slope,
        run.map.elements.len()
    );

    run.map.write(&cli.out)?;
    tracing::info!("Wrote {}", cli.out.display());

    if let Some(preview) = &cli.preview {
        if let Err(e) = write_preview(preview, &image, &run) {
            tracing::warn!("Failed to write preview {}: {e}", preview.display());
        } else {
            tracing::info!("Wrote preview {}", preview.display());
        }
    }

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
