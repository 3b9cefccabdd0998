//! Weighted least squares line fit.
//!
//! The fitter repeatedly solves small problems of the form:
//!
//! ```text
//! minimize Σ w_i (y_i - (intercept + slope * t_i))^2
//! ```
//!
//! once per Huber IRLS iteration, with `y = ln(daily_deaths)`.
//!
//! Implementation choices:
//! - Rows are scaled by `sqrt(w_i)` and the problem is solved as ordinary
//!   least squares.
//! - We use SVD so the tall 2-column system solves robustly even when day
//!   indices are nearly degenerate (very short segments).

use nalgebra::{DMatrix, DVector};

/// Fit `y = intercept + slope * t` with per-point weights.
///
/// Returns `None` if the system is too ill-conditioned to solve, which in
/// practice means the segment has no spread in `t`.
pub fn fit_weighted_line(ts: &[f64], ys: &[f64], ws: &[f64]) -> Option<(f64, f64)> {
    let n = ts.len();
    if n < 2 || ys.len() != n || ws.len() != n {
        return None;
    }
    // A line needs spread on the time axis; SVD would otherwise return a
    // minimum-norm solution with a meaningless slope.
    if ts.iter().all(|&t| t == ts[0]) {
        return None;
    }

    let mut x = DMatrix::<f64>::zeros(n, 2);
    let mut y = DVector::<f64>::zeros(n);
    for i in 0..n {
        if !(ts[i].is_finite() && ys[i].is_finite() && ws[i].is_finite() && ws[i] > 0.0) {
            return None;
        }
        let sw = ws[i].sqrt();
        x[(i, 0)] = sw;
        x[(i, 1)] = ts[i] * sw;
        y[i] = ys[i] * sw;
    }

    let svd = x.svd(true, true);

    // Try progressively looser tolerances if the strict solve fails.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(&y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some((beta[0], beta[1]));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_exact_line() {
        let ts = [0.0, 1.0, 2.0, 3.0];
        let ys = [2.0, 5.0, 8.0, 11.0];
        let ws = [1.0; 4];
        let (intercept, slope) = fit_weighted_line(&ts, &ys, &ws).unwrap();
        assert!((intercept - 2.0).abs() < 1e-10);
        assert!((slope - 3.0).abs() < 1e-10);
    }

    #[test]
    fn weights_pull_the_fit() {
        // An outlier with near-zero weight should barely move the line.
        let ts = [0.0, 1.0, 2.0, 3.0, 4.0];
        let ys = [1.0, 1.0, 1.0, 1.0, 100.0];
        let ws = [1.0, 1.0, 1.0, 1.0, 1e-9];
        let (intercept, slope) = fit_weighted_line(&ts, &ys, &ws).unwrap();
        assert!((intercept - 1.0).abs() < 1e-3);
        assert!(slope.abs() < 1e-3);
    }

    #[test]
    fn degenerate_t_axis_fails() {
        let ts = [2.0, 2.0, 2.0];
        let ys = [1.0, 2.0, 3.0];
        let ws = [1.0; 3];
        assert!(fit_weighted_line(&ts, &ys, &ws).is_none());
    }
}
