//! Column calibration.
//!
//! The label row gives twelve column anchors along a horizontal baseline. The
//! buttons below them drift sideways with depth because the panel is curved
//! and photographed at an angle, so a button's x is corrected by a linear
//! shear `x + slope * (y - y0)` before it is matched to the nearest anchor.
//! The slope is chosen by exhaustive search over a fixed grid: the objective
//! is piecewise because the nearest anchor changes with the slope.

use tracing::{debug, warn};

use crate::config::SkewSearch;
use crate::error::OverlayError;
use crate::geometry::BoxCandidate;

/// Column anchors, sorted left to right by x-center.
#[derive(Debug, Clone)]
pub struct LabelAnchors {
    pub labels: Vec<BoxCandidate>,
    pub centers_x: Vec<f64>,
    /// Mean y-center of the anchors.
    pub baseline_y: f64,
}

impl LabelAnchors {
    /// Sorts the label candidates by x-center and keeps the `count` leftmost.
    ///
    /// Fewer than `count` labels makes every downstream column ambiguous, so
    /// that aborts the run instead of guessing.
    pub fn select(labels: &[BoxCandidate], count: usize) -> Result<Self, OverlayError> {
        if labels.len() < count {
            return Err(OverlayError::CalibrationInfeasible {
                found: labels.len(),
                required: count,
            });
        }
        if labels.len() > count {
            warn!(
                "{} label candidates detected; using the {} leftmost",
                labels.len(),
                count
            );
        }

        let mut sorted = labels.to_vec();
        sorted.sort_by(|a, b| a.center_x().total_cmp(&b.center_x()));
        sorted.truncate(count);

        let centers_x: Vec<f64> = sorted.iter().map(BoxCandidate::center_x).collect();
        let baseline_y = if sorted.is_empty() {
            0.0
        } else {
            sorted.iter().map(BoxCandidate::center_y).sum::<f64>() / sorted.len() as f64
        };

        Ok(Self {
            labels: sorted,
            centers_x,
            baseline_y,
        })
    }

    pub fn len(&self) -> usize {
        self.centers_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.centers_x.is_empty()
    }

    /// Index of the closest anchor; the leftmost wins on a tie.
    pub fn nearest(&self, x: f64) -> usize {
        let mut best = 0usize;
        let mut best_d = f64::INFINITY;
        for (i, &cx) in self.centers_x.iter().enumerate() {
            let d = (x - cx).abs();
            if d < best_d {
                best_d = d;
                best = i;
            }
        }
        best
    }

    pub fn corrected_x(&self, button: &BoxCandidate, slope: f64) -> f64 {
        button.center_x() + slope * (button.center_y() - self.baseline_y)
    }

    /// Mean squared distance between each corrected button x and its nearest
    /// anchor. An empty button set scores zero.
    pub fn score(&self, buttons: &[BoxCandidate], slope: f64) -> f64 {
        if buttons.is_empty() || self.is_empty() {
            return 0.0;
        }
        let total: f64 = buttons
            .iter()
            .map(|b| {
                let x = self.corrected_x(b, slope);
                let residual = x - self.centers_x[self.nearest(x)];
                residual * residual
            })
            .sum();
        total / buttons.len() as f64
    }

    pub fn assign(&self, buttons: &[BoxCandidate], slope: f64) -> Vec<usize> {
        buttons
            .iter()
            .map(|b| self.nearest(self.corrected_x(b, slope)))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SkewFit {
    pub slope: f64,
    pub score: f64,
}

/// Evaluates every slope of the grid and keeps the first strict minimum.
pub fn search_slope(anchors: &LabelAnchors, buttons: &[BoxCandidate], search: &SkewSearch) -> SkewFit {
    let mut best = SkewFit {
        slope: search.min_slope,
        score: f64::INFINITY,
    };
    for slope in search.slopes() {
        let score = anchors.score(buttons, slope);
        if score < best.score {
            best = SkewFit { slope, score };
        }
    }
    best
}

/// Calibrated columns: anchors, shear, and the column of every button.
#[derive(Debug, Clone)]
pub struct Calibration {
    pub anchors: LabelAnchors,
    pub fit: SkewFit,
    /// Column index per button, parallel to the button slice it was built from.
    pub columns: Vec<usize>,
}

impl Calibration {
    /// Buttons of one column, in detection order.
    pub fn column_members<'a>(
        &self,
        buttons: &'a [BoxCandidate],
        column: usize,
    ) -> Vec<&'a BoxCandidate> {
        buttons
            .iter()
            .zip(&self.columns)
            .filter(|&(_, &c)| c == column)
            .map(|(b, _)| b)
            .collect()
    }
}

pub fn calibrate(
    labels: &[BoxCandidate],
    buttons: &[BoxCandidate],
    label_count: usize,
    search: &SkewSearch,
) -> Result<Calibration, OverlayError> {
    let anchors = LabelAnchors::select(labels, label_count)?;
    if buttons.is_empty() {
        warn!("no button candidates survived filtering");
    }

    let fit = search_slope(&anchors, buttons, search);
    let columns = anchors.assign(buttons, fit.slope);
    debug!(
        "calibrated {} columns: baseline y0={:.2} slope={:.3} mse={:.3}",
        anchors.len(),
        anchors.baseline_y,
        fit.slope,
        fit.score
    );

    Ok(Calibration {
        anchors,
        fit,
        columns,
    })
}
