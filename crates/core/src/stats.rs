//! Descriptive statistics over a numeric column.

use serde::Serialize;

use crate::error::CoreError;

/// Minimum number of values needed before statistics are computed.
pub const MIN_STATS_SAMPLES: usize = 2;

/// IQR multiplier for Tukey outlier fences.
pub const OUTLIER_FENCE: f64 = 1.5;

/// Summary returned by `/loans/stats`. Every figure is rounded to one decimal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvancedStats {
    pub mean: f64,
    pub median: f64,
    pub mode: Option<f64>,
    pub q1: f64,
    pub q3: f64,
    pub outliers: Vec<f64>,
}

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percentile of an ascending slice with linear interpolation between ranks.
///
/// `p` is in `[0, 100]`. Returns `None` for an empty slice.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let rank = (p / 100.0).clamp(0.0, 1.0) * last as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Most frequent value; the smallest wins a tie.
pub fn mode(sorted: &[f64]) -> Option<f64> {
    let mut best: Option<(f64, usize)> = None;
    let mut i = 0;
    while i < sorted.len() {
        let value = sorted[i];
        let run = sorted[i..].iter().take_while(|v| **v == value).count();
        if best.is_none_or(|(_, count)| run > count) {
            best = Some((value, run));
        }
        i += run;
    }
    best.map(|(value, _)| value)
}

/// Compute mean, median, mode, quartiles and Tukey outliers.
///
/// NaN values are ignored. Fences are derived from the rounded quartiles.
pub fn compute_advanced_stats(values: &[f64]) -> Result<AdvancedStats, CoreError> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.len() < MIN_STATS_SAMPLES {
        return Err(CoreError::Validation(
            "Not enough data points to compute statistics".to_string(),
        ));
    }
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let quantile = |p: f64| percentile(&sorted, p).map(round1).unwrap_or_default();
    let median = quantile(50.0);
    let q1 = quantile(25.0);
    let q3 = quantile(75.0);

    let iqr = q3 - q1;
    let lower = q1 - OUTLIER_FENCE * iqr;
    let upper = q3 + OUTLIER_FENCE * iqr;
    let outliers = sorted
        .iter()
        .filter(|v| **v < lower || **v > upper)
        .map(|v| round1(*v))
        .collect();

    Ok(AdvancedStats {
        mean: round1(mean),
        median,
        mode: mode(&sorted).map(round1),
        q1,
        q3,
        outliers,
    })
}

/// One histogram bucket. The last bucket is closed on both ends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: u64,
}

/// Split `values` into `bins` equal-width buckets spanning their range.
///
/// When every value is identical the range is widened to `v ± 0.5`.
/// Non-finite values are skipped.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut min = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }
    let width = (max - min) / bins as f64;

    let mut counts = vec![0u64; bins];
    for v in finite {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: min + width * i as f64,
            end: if i + 1 == bins { max } else { min + width * (i + 1) as f64 },
            count,
        })
        .collect()
}
