//! Regression metrics used for fit reports and search scoring.
//!
//! Both metrics operate on 2-D `(rows × outputs)` arrays and average
//! uniformly across output columns, so single- and multi-output models are
//! scored the same way.

use crate::core::error::{Result, SurrogateError};
use ndarray::ArrayView2;

fn validate_shapes(targets: &ArrayView2<'_, f64>, predictions: &ArrayView2<'_, f64>) -> Result<()> {
    if targets.shape() != predictions.shape() {
        return Err(SurrogateError::dimension_mismatch(
            format!("targets {:?}", targets.shape()),
            format!("predictions {:?}", predictions.shape()),
        ));
    }
    if targets.is_empty() {
        return Err(SurrogateError::dataset("cannot score empty arrays"));
    }
    Ok(())
}

/// Coefficient of determination, uniform-averaged over output columns.
///
/// A column with zero target variance scores 1.0 when predicted exactly and
/// 0.0 otherwise.
pub fn r2_score(targets: &ArrayView2<'_, f64>, predictions: &ArrayView2<'_, f64>) -> Result<f64> {
    validate_shapes(targets, predictions)?;
    let n = targets.nrows() as f64;
    let mut total = 0.0;
    for k in 0..targets.ncols() {
        let y = targets.column(k);
        let p = predictions.column(k);
        let mean = y.sum() / n;
        let ss_tot: f64 = y.iter().map(|v| (v - mean) * (v - mean)).sum();
        let ss_res: f64 = y
            .iter()
            .zip(p.iter())
            .map(|(v, q)| (v - q) * (v - q))
            .sum();
        total += if ss_tot == 0.0 {
            if ss_res == 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            1.0 - ss_res / ss_tot
        };
    }
    Ok(total / targets.ncols() as f64)
}

/// Mean squared error, uniform-averaged over output columns.
pub fn mean_squared_error(
    targets: &ArrayView2<'_, f64>,
    predictions: &ArrayView2<'_, f64>,
) -> Result<f64> {
    validate_shapes(targets, predictions)?;
    let n = targets.len() as f64;
    let sse: f64 = targets
        .iter()
        .zip(predictions.iter())
        .map(|(y, p)| (y - p) * (y - p))
        .sum();
    Ok(sse / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_perfect_predictions() {
        let y = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        assert_abs_diff_eq!(r2_score(&y.view(), &y.view()).unwrap(), 1.0);
        assert_abs_diff_eq!(mean_squared_error(&y.view(), &y.view()).unwrap(), 0.0);
    }

    #[test]
    fn test_mean_prediction_scores_zero_r2() {
        let y = array![[0.0], [1.0], [2.0]];
        let p = array![[1.0], [1.0], [1.0]];
        assert_abs_diff_eq!(r2_score(&y.view(), &p.view()).unwrap(), 0.0);
        assert_abs_diff_eq!(
            mean_squared_error(&y.view(), &p.view()).unwrap(),
            2.0 / 3.0
        );
    }

    #[test]
    fn test_uniform_average_across_outputs() {
        // First column predicted perfectly, second at the mean
        let y = array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]];
        let p = array![[0.0, 1.0], [1.0, 1.0], [2.0, 1.0]];
        assert_abs_diff_eq!(r2_score(&y.view(), &p.view()).unwrap(), 0.5);
    }

    #[test]
    fn test_constant_targets() {
        let y = array![[2.0], [2.0], [2.0]];
        let exact = array![[2.0], [2.0], [2.0]];
        let off = array![[2.0], [2.5], [2.0]];
        assert_abs_diff_eq!(r2_score(&y.view(), &exact.view()).unwrap(), 1.0);
        assert_abs_diff_eq!(r2_score(&y.view(), &off.view()).unwrap(), 0.0);
    }

    #[test]
    fn test_shape_mismatch_is_rejected() {
        let y = array![[1.0], [2.0]];
        let p = array![[1.0, 2.0]];
        assert!(r2_score(&y.view(), &p.view()).is_err());
        assert!(mean_squared_error(&y.view(), &p.view()).is_err());
    }
}
