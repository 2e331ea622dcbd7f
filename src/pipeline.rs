//! Single forward pass: candidates -> filter -> calibration -> rows -> identities.

use std::path::Path;

use image::{DynamicImage, GenericImageView};
use tracing::debug;

use crate::calibrate::{Calibration, calibrate};
use crate::config::OverlayConfig;
use crate::error::OverlayError;
use crate::filter::{FilteredCandidates, filter_candidates};
use crate::geometry::RawRegion;
use crate::identity::column_elements;
use crate::kornia::candidates::CandidateExtractor;
use crate::overlay_map::{OverlayMap, Reference};
use crate::rows::rank_rows;

/// Overlay map together with the intermediate results that produced it.
#[derive(Debug, Clone)]
pub struct OverlayRun {
    pub map: OverlayMap,
    pub filtered: FilteredCandidates,
    pub calibration: Calibration,
}

pub fn open_image(path: &Path) -> Result<DynamicImage, OverlayError> {
    image::open(path).map_err(|e| OverlayError::UnreadableInput {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Builds the overlay from already extracted regions of a `width` x `height`
/// image. `image_label` is stored verbatim as `reference.image`.
pub fn overlay_from_regions_detailed(
    regions: &[RawRegion],
    width: u32,
    height: u32,
    image_label: &str,
    config: &OverlayConfig,
) -> Result<OverlayRun, OverlayError> {
    config.validate().map_err(OverlayError::InvalidConfig)?;

    let filtered = filter_candidates(regions, &config.priors);
    let calibration = calibrate(
        &filtered.labels,
        &filtered.buttons,
        config.priors.label_count,
        &config.skew,
    )?;

    let mut elements = Vec::new();
    for (column, root) in config.roots.iter().enumerate().take(calibration.anchors.len()) {
        let members = calibration.column_members(&filtered.buttons, column);
        let ranked = rank_rows(&members, config.row_count(), &config.rows);
        if ranked.len() < config.row_count() {
            debug!(
                "column {} ({}): {} buttons, {} of {} rows found",
                column,
                root,
                members.len(),
                ranked.len(),
                config.row_count()
            );
        }
        elements.extend(column_elements(root, &ranked, &config.qualities, width, height));
    }

    let map = OverlayMap {
        reference: Reference {
            width,
            height,
            image: image_label.to_string(),
        },
        elements,
    };
    Ok(OverlayRun {
        map,
        filtered,
        calibration,
    })
}

pub fn overlay_from_regions(
    regions: &[RawRegion],
    width: u32,
    height: u32,
    image_label: &str,
    config: &OverlayConfig,
) -> Result<OverlayMap, OverlayError> {
    overlay_from_regions_detailed(regions, width, height, image_label, config).map(|run| run.map)
}

pub fn generate_overlay_map_detailed(
    image: &DynamicImage,
    extractor: &impl CandidateExtractor,
    image_label: &str,
    config: &OverlayConfig,
) -> Result<OverlayRun, OverlayError> {
    let (width, height) = image.dimensions();
    let regions = extractor.detect(image)?;
    overlay_from_regions_detailed(&regions, width, height, image_label, config)
}

/// Runs the whole pipeline on a decoded image.
pub fn generate_overlay_map(
    image: &DynamicImage,
    extractor: &impl CandidateExtractor,
    image_label: &str,
    config: &OverlayConfig,
) -> Result<OverlayMap, OverlayError> {
    generate_overlay_map_detailed(image, extractor, image_label, config).map(|run| run.map)
}
