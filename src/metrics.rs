//! Regression metrics.
//!
//! Every metric takes `(predictions, targets)`, the argument order the
//! cross-validator passes, and panics if the lengths differ. Empty inputs
//! score `0.0`.

use serde::{Deserialize, Serialize};

fn check_lengths(predictions: &[f64], targets: &[f64]) {
    assert_eq!(
        predictions.len(),
        targets.len(),
        "predictions and targets must have the same length"
    );
}

/// Mean Absolute Error.
///
/// MAE = mean(|y_true - y_pred|)
pub fn mean_absolute_error(predictions: &[f64], targets: &[f64]) -> f64 {
    check_lengths(predictions, targets);
    if targets.is_empty() {
        return 0.0;
    }
    let sum_abs: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(&p, &t)| (t - p).abs())
        .sum();
    sum_abs / targets.len() as f64
}

/// Mean Squared Error.
///
/// MSE = mean((y_true - y_pred)^2)
pub fn mean_squared_error(predictions: &[f64], targets: &[f64]) -> f64 {
    check_lengths(predictions, targets);
    if targets.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(&p, &t)| (t - p).powi(2))
        .sum();
    sum_sq / targets.len() as f64
}

/// Root Mean Squared Error, in the units of the target.
pub fn root_mean_squared_error(predictions: &[f64], targets: &[f64]) -> f64 {
    mean_squared_error(predictions, targets).sqrt()
}

/// R² (coefficient of determination).
///
/// R² = 1 - SS_res / SS_tot. A perfect fit scores 1, predicting the mean scores
/// 0, and worse models go negative. A constant target scores 1 for an exact
/// fit and 0 otherwise.
pub fn r2_score(predictions: &[f64], targets: &[f64]) -> f64 {
    check_lengths(predictions, targets);
    if targets.is_empty() {
        return 0.0;
    }
    let mean = targets.iter().sum::<f64>() / targets.len() as f64;
    let ss_res: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(&p, &t)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = targets.iter().map(|&t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Aggregate of per-fold scores.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub n: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl ScoreSummary {
    /// Summarise `scores`; `None` when empty.
    pub fn from_scores(scores: &[f64]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let n = scores.len();
        let mean = scores.iter().sum::<f64>() / n as f64;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n as f64;
        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            n,
            mean,
            std_dev: variance.sqrt(),
            min,
            max,
        })
    }
}

impl std::fmt::Display for ScoreSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:.4} +/- {:.4} (min {:.4}, max {:.4}, n = {})",
            self.mean, self.std_dev, self.min, self.max, self.n
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mae() {
        let pred = [1.0, 2.0, 3.0];
        let target = [1.5, 2.0, 1.0];
        assert!((mean_absolute_error(&pred, &target) - 2.5 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_mse_and_rmse() {
        let pred = [0.0, 0.0];
        let target = [3.0, 4.0];
        assert_eq!(mean_squared_error(&pred, &target), 12.5);
        assert_eq!(root_mean_squared_error(&pred, &target), 12.5_f64.sqrt());
    }

    #[test]
    fn test_r2_perfect_and_mean() {
        let target = [1.0, 2.0, 3.0];
        assert_eq!(r2_score(&target, &target), 1.0);
        assert_eq!(r2_score(&[2.0, 2.0, 2.0], &target), 0.0);
    }

    #[test]
    fn test_r2_constant_target() {
        assert_eq!(r2_score(&[5.0, 5.0], &[5.0, 5.0]), 1.0);
        assert_eq!(r2_score(&[4.0, 5.0], &[5.0, 5.0]), 0.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
        assert_eq!(r2_score(&[], &[]), 0.0);
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_length_mismatch_panics() {
        mean_absolute_error(&[1.0], &[1.0, 2.0]);
    }

    #[test]
    fn test_score_summary() {
        let summary = ScoreSummary::from_scores(&[1.0, 3.0]).unwrap();
        assert_eq!(summary.n, 2);
        assert_eq!(summary.mean, 2.0);
        assert_eq!(summary.std_dev, 1.0);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 3.0);
        assert_eq!(summary.to_string(), "2.0000 +/- 1.0000 (min 1.0000, max 3.0000, n = 2)");
        assert!(ScoreSummary::from_scores(&[]).is_none());
    }
}
