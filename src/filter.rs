//! Geometric filter: drops regions that cannot be a label or a chord button and
//! splits the survivors into the two classes.

use tracing::debug;

use crate::config::GeometryPriors;
use crate::geometry::{BoxCandidate, RawRegion};

/// Survivors of the geometric filter, in detection order.
#[derive(Debug, Clone, Default)]
pub struct FilteredCandidates {
    pub labels: Vec<BoxCandidate>,
    pub buttons: Vec<BoxCandidate>,
    /// Regions in the label row that fail the label width check.
    pub label_fragments: usize,
}

/// Area, aspect ratio, panel placement and side-length checks; all must hold.
pub fn passes_priors(region: &RawRegion, priors: &GeometryPriors) -> bool {
    priors.area.contains(region.area())
        && priors.aspect.contains(region.aspect())
        && priors.panel_x.contains(region.x)
        && priors.panel_y.contains(region.y)
        && priors.width.contains(region.w)
        && priors.height.contains(region.h)
}

/// Top edge inside the label band and no taller than a label.
pub fn in_label_row(region: &RawRegion, priors: &GeometryPriors) -> bool {
    priors.label_band_y.contains(region.y) && region.h <= priors.label_max_height
}

pub fn is_label(region: &RawRegion, priors: &GeometryPriors) -> bool {
    in_label_row(region, priors) && priors.label_width.contains(region.w)
}

pub fn filter_candidates(regions: &[RawRegion], priors: &GeometryPriors) -> FilteredCandidates {
    let mut out = FilteredCandidates::default();

    for (index, region) in regions.iter().enumerate() {
        if !passes_priors(region, priors) {
            continue;
        }
        let candidate = BoxCandidate {
            region: *region,
            index,
        };
        if is_label(region, priors) {
            out.labels.push(candidate);
        } else if in_label_row(region, priors) {
            out.label_fragments += 1;
        } else {
            out.buttons.push(candidate);
        }
    }

    debug!(
        "filtered {} regions -> {} labels, {} buttons, {} label fragments dropped",
        regions.len(),
        out.labels.len(),
        out.buttons.len(),
        out.label_fragments
    );
    out
}
