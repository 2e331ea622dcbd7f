//! Named priors for the reference panel photograph.
//!
//! The pixel-space values are tied to the resolution and framing of the
//! reference image. Recalibrating for a different photograph means loading an
//! override file with [`OverlayConfig::load`], not editing the algorithm.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::OverlayError;

const MIN_AREA: u64 = 200;
const MAX_AREA: u64 = 20_000;
const MIN_ASPECT: f64 = 0.7;
const MAX_ASPECT: f64 = 1.3;
const PANEL_X: (u32, u32) = (20, 1200);
const PANEL_Y: (u32, u32) = (360, 650);
const BOX_SIDE: (u32, u32) = (28, 60);
const LABEL_BAND_Y: (u32, u32) = (390, 415);
const LABEL_MAX_HEIGHT: u32 = 40;
const LABEL_WIDTH: (u32, u32) = (43, 48);

const SLOPE_MIN: f64 = -1.2;
const SLOPE_MAX: f64 = 1.2;
const SLOPE_SAMPLES: usize = 1201;

const SEED_PERCENTILE_LOW: f64 = 0.1;
const SEED_PERCENTILE_HIGH: f64 = 0.9;
const MAX_CLUSTER_ITERATIONS: usize = 30;
const CONVERGENCE_RTOL: f64 = 1e-5;
const CONVERGENCE_ATOL: f64 = 1e-8;

const BLUR_SIGMA: f32 = 1.1;
const CANNY_LOW: f32 = 40.0;
const CANNY_HIGH: f32 = 120.0;
const DILATE_RADIUS: u8 = 1;

/// Root-note columns on the panel.
pub const LABEL_COUNT: usize = 12;
/// Chord-quality rows per column.
pub const ROW_COUNT: usize = 3;

const ROOTS: [&str; LABEL_COUNT] = ["D#", "Ab", "Eb", "Bb", "F", "C", "G", "D", "A", "E", "B", "F#"];
const QUALITIES: [&str; ROW_COUNT] = ["maj", "min", "7"];

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T: PartialOrd + Copy> Bounds<T> {
    pub const fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: T) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Shape and placement priors applied by the geometric filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryPriors {
    pub area: Bounds<u64>,
    pub aspect: Bounds<f64>,
    /// Allowed range of a region's top-left corner.
    pub panel_x: Bounds<u32>,
    pub panel_y: Bounds<u32>,
    pub width: Bounds<u32>,
    pub height: Bounds<u32>,
    /// Vertical band (top edge) holding the root-note labels.
    pub label_band_y: Bounds<u32>,
    pub label_max_height: u32,
    pub label_width: Bounds<u32>,
    /// Number of label columns the panel carries.
    pub label_count: usize,
}

impl Default for GeometryPriors {
    fn default() -> Self {
        Self {
            area: Bounds::new(MIN_AREA, MAX_AREA),
            aspect: Bounds::new(MIN_ASPECT, MAX_ASPECT),
            panel_x: Bounds::new(PANEL_X.0, PANEL_X.1),
            panel_y: Bounds::new(PANEL_Y.0, PANEL_Y.1),
            width: Bounds::new(BOX_SIDE.0, BOX_SIDE.1),
            height: Bounds::new(BOX_SIDE.0, BOX_SIDE.1),
            label_band_y: Bounds::new(LABEL_BAND_Y.0, LABEL_BAND_Y.1),
            label_max_height: LABEL_MAX_HEIGHT,
            label_width: Bounds::new(LABEL_WIDTH.0, LABEL_WIDTH.1),
            label_count: LABEL_COUNT,
        }
    }
}

/// Grid of shear slopes searched by the column calibrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkewSearch {
    pub min_slope: f64,
    pub max_slope: f64,
    pub samples: usize,
}

impl Default for SkewSearch {
    fn default() -> Self {
        Self {
            min_slope: SLOPE_MIN,
            max_slope: SLOPE_MAX,
            samples: SLOPE_SAMPLES,
        }
    }
}

impl SkewSearch {
    /// Evenly spaced slopes from `min_slope` to `max_slope` inclusive, ascending.
    pub fn slopes(&self) -> Vec<f64> {
        match self.samples {
            0 => Vec::new(),
            1 => vec![self.min_slope],
            n => {
                let step = (self.max_slope - self.min_slope) / (n - 1) as f64;
                let mut out: Vec<f64> = (0..n).map(|i| self.min_slope + i as f64 * step).collect();
                out[n - 1] = self.max_slope;
                out
            }
        }
    }
}

/// Parameters of the per-column 1-D clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowClustering {
    /// Percentiles (0..1) of the first and last seed; the rest are spaced evenly between.
    pub seed_low: f64,
    pub seed_high: f64,
    pub max_iterations: usize,
    pub rtol: f64,
    pub atol: f64,
}

impl Default for RowClustering {
    fn default() -> Self {
        Self {
            seed_low: SEED_PERCENTILE_LOW,
            seed_high: SEED_PERCENTILE_HIGH,
            max_iterations: MAX_CLUSTER_ITERATIONS,
            rtol: CONVERGENCE_RTOL,
            atol: CONVERGENCE_ATOL,
        }
    }
}

/// Edge-detector parameters of the reference candidate extractor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Chebyshev radius of the dilation; 1 is a 3x3 square.
    pub dilate_radius: u8,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            blur_sigma: BLUR_SIGMA,
            canny_low: CANNY_LOW,
            canny_high: CANNY_HIGH,
            dilate_radius: DILATE_RADIUS,
        }
    }
}

/// Complete configuration of one overlay run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub priors: GeometryPriors,
    pub skew: SkewSearch,
    pub rows: RowClustering,
    pub extractor: ExtractorConfig,
    /// Root note per column, left to right.
    pub roots: Vec<String>,
    /// Chord quality per row, top to bottom.
    pub qualities: Vec<String>,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            priors: GeometryPriors::default(),
            skew: SkewSearch::default(),
            rows: RowClustering::default(),
            extractor: ExtractorConfig::default(),
            roots: ROOTS.iter().map(|r| r.to_string()).collect(),
            qualities: QUALITIES.iter().map(|q| q.to_string()).collect(),
        }
    }
}

impl OverlayConfig {
    /// Reads a JSON override file. Omitted fields keep their reference values.
    pub fn load(path: &Path) -> Result<Self, OverlayError> {
        let contents = fs::read_to_string(path).map_err(|e| OverlayError::ConfigFile {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let config: OverlayConfig =
            serde_json::from_str(&contents).map_err(|e| OverlayError::ConfigFile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        config.validate().map_err(|reason| OverlayError::ConfigFile {
            path: path.to_path_buf(),
            reason,
        })?;
        Ok(config)
    }

    /// Number of row clusters per column.
    pub fn row_count(&self) -> usize {
        ROW_COUNT
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.priors.label_count != LABEL_COUNT {
            return Err(format!(
                "label_count is {}, the panel has {LABEL_COUNT} label columns",
                self.priors.label_count
            ));
        }
        if self.roots.len() != LABEL_COUNT {
            return Err(format!(
                "{} roots configured for {LABEL_COUNT} label columns",
                self.roots.len()
            ));
        }
        if self.qualities.len() != ROW_COUNT {
            return Err(format!(
                "{} qualities configured for {ROW_COUNT} chord rows",
                self.qualities.len()
            ));
        }
        if self.skew.samples == 0 || self.skew.min_slope > self.skew.max_slope {
            return Err(format!(
                "empty slope grid [{}, {}] x {}",
                self.skew.min_slope, self.skew.max_slope, self.skew.samples
            ));
        }
        if !(0.0..=1.0).contains(&self.rows.seed_low)
            || !(0.0..=1.0).contains(&self.rows.seed_high)
            || self.rows.seed_low > self.rows.seed_high
        {
            return Err(format!(
                "seed percentiles must satisfy 0 <= low <= high <= 1 (got {}, {})",
                self.rows.seed_low, self.rows.seed_high
            ));
        }
        Ok(())
    }
}
