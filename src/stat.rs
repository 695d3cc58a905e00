//! Small numeric helpers shared by the heuristics and the calibration step.

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Some(sorted[mid])
    } else {
        Some((sorted[mid - 1] + sorted[mid]) / 2.)
    }
}

/// Min-max rescale into `[0, 1]`.
///
/// A constant input maps to all zeros.
pub fn rescale(values: &[f64]) -> Vec<f64> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if values.is_empty() || min == max {
        return vec![0.; values.len()];
    }
    let span = max - min;
    values.iter().map(|v| (v - min) / span).collect()
}

/// Round to the nearest multiple of `resolution`.
#[inline]
pub fn round_resolution(value: f64, resolution: f64) -> f64 {
    (value / resolution).round() * resolution
}
