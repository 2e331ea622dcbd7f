//! Chord identities and normalized boxes for ranked column representatives.

use crate::geometry::{BoxCandidate, RawRegion};
use crate::overlay_map::{CHORD_TYPE, ChordElement, HOLD_GESTURE};

/// `chord_<root>_<quality>` with `#` spelled `s`, e.g. `chord_Fs_min`.
pub fn chord_id(root: &str, quality: &str) -> String {
    format!("chord_{root}_{quality}").replace('#', "s")
}

/// Rounds to six decimal places.
pub fn round6(value: f64) -> f64 {
    format!("{value:.6}").parse().unwrap_or(value)
}

pub fn normalized_bbox(region: &RawRegion, width: u32, height: u32) -> [f64; 4] {
    let w = width.max(1) as f64;
    let h = height.max(1) as f64;
    [
        round6(region.x as f64 / w),
        round6(region.y as f64 / h),
        round6(region.w as f64 / w),
        round6(region.h as f64 / h),
    ]
}

/// Elements for one column. Rank `i` takes `qualities[i]`; ranks the column
/// did not produce are skipped rather than filled in.
pub fn column_elements(
    root: &str,
    ranked: &[BoxCandidate],
    qualities: &[String],
    width: u32,
    height: u32,
) -> Vec<ChordElement> {
    qualities
        .iter()
        .zip(ranked)
        .map(|(quality, rep)| ChordElement {
            id: chord_id(root, quality),
            kind: CHORD_TYPE.to_string(),
            root: root.to_string(),
            quality: quality.clone(),
            bbox: normalized_bbox(&rep.region, width, height),
            gesture: HOLD_GESTURE.to_string(),
        })
        .collect()
}
