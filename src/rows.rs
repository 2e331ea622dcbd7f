//! Row clustering within a column.
//!
//! Each column holds up to one button per chord quality, stacked vertically.
//! Detection noise adds fragments and duplicates, so the column's y-centers
//! are partitioned with a small 1-D k-means seeded at fixed percentiles, which
//! keeps the partition identical from run to run. The largest box of each
//! cluster represents its row.

use crate::config::RowClustering;
use crate::geometry::BoxCandidate;

/// Cluster label per input value, and the final centroids.
#[derive(Debug, Clone, PartialEq)]
pub struct Clustering {
    pub labels: Vec<usize>,
    pub centroids: Vec<f64>,
}

/// Percentile `q` in `[0, 1]` of an ascending slice, linearly interpolated
/// between the closest ranks.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = q.clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}

fn seed_centroids(values: &[f64], k: usize, params: &RowClustering) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    (0..k)
        .map(|i| {
            let q = if k == 1 {
                params.seed_low
            } else {
                params.seed_low + (params.seed_high - params.seed_low) * i as f64 / (k - 1) as f64
            };
            percentile(&sorted, q)
        })
        .collect()
}

fn nearest_centroid(value: f64, centroids: &[f64]) -> usize {
    let mut best = 0usize;
    let mut best_d = f64::INFINITY;
    for (i, &c) in centroids.iter().enumerate() {
        let d = (value - c).abs();
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

fn converged(new: &[f64], old: &[f64], params: &RowClustering) -> bool {
    new.iter()
        .zip(old)
        .all(|(&n, &o)| (n - o).abs() <= params.atol + params.rtol * o.abs())
}

/// Lloyd iterations on a line. An empty cluster keeps its previous centroid.
pub fn kmeans_1d(values: &[f64], k: usize, params: &RowClustering) -> Clustering {
    if values.is_empty() || k == 0 {
        return Clustering {
            labels: vec![0; values.len()],
            centroids: Vec::new(),
        };
    }

    let mut centroids = seed_centroids(values, k, params);
    let mut labels = vec![0usize; values.len()];

    for _ in 0..params.max_iterations {
        for (label, &v) in labels.iter_mut().zip(values) {
            *label = nearest_centroid(v, &centroids);
        }

        let mut sums = vec![0f64; k];
        let mut counts = vec![0usize; k];
        for (&label, &v) in labels.iter().zip(values) {
            sums[label] += v;
            counts[label] += 1;
        }
        let updated: Vec<f64> = (0..k)
            .map(|i| {
                if counts[i] > 0 {
                    sums[i] / counts[i] as f64
                } else {
                    centroids[i]
                }
            })
            .collect();

        if converged(&updated, &centroids, params) {
            break;
        }
        centroids = updated;
    }

    Clustering { labels, centroids }
}

/// Largest-area member; the earliest detection wins on equal area.
fn representative<'a>(members: impl Iterator<Item = &'a BoxCandidate>) -> Option<&'a BoxCandidate> {
    let mut best: Option<&BoxCandidate> = None;
    for m in members {
        match best {
            Some(b) if m.area() <= b.area() => {}
            _ => best = Some(m),
        }
    }
    best
}

/// Up to `rows` representatives of one column, ranked top to bottom.
///
/// Empty clusters contribute nothing, so a sparse column yields fewer ranks.
pub fn rank_rows(members: &[&BoxCandidate], rows: usize, params: &RowClustering) -> Vec<BoxCandidate> {
    if members.is_empty() || rows == 0 {
        return Vec::new();
    }

    let ys: Vec<f64> = members.iter().map(|b| b.center_y()).collect();
    let clustering = kmeans_1d(&ys, rows, params);

    let mut reps: Vec<BoxCandidate> = (0..rows)
        .filter_map(|cluster| {
            representative(
                members
                    .iter()
                    .zip(&clustering.labels)
                    .filter(|&(_, &l)| l == cluster)
                    .map(|(b, _)| *b),
            )
        })
        .copied()
        .collect();

    reps.sort_by(|a, b| a.center_y().total_cmp(&b.center_y()));
    reps
}
