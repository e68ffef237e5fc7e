//! Ridge-regularized least squares for two-column designs.
//!
//! The estimator solves one tiny regression per call:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2 + λ ‖β‖^2,    x_i = [1, month_i]
//! ```
//!
//! With two columns the normal equations are a 2×2 system, so we accumulate
//! `XᵀX` / `Xᵀy` row by row and invert in closed form:
//!
//! ```text
//! β = (XᵀX + λI)^-1 Xᵀy
//! ```
//!
//! The penalty is applied to the intercept as well. A near-zero determinant
//! yields `None` instead of an error; callers fall back to their baseline.

use nalgebra::{Matrix2, Vector2};

/// Determinants below this magnitude are treated as singular.
pub const DET_EPS: f64 = 1e-9;

/// Running `XᵀX` and `Xᵀy` for a 2-column design.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalEquations2 {
    xtx: Matrix2<f64>,
    xty: Vector2<f64>,
    rows: usize,
}

impl Default for NormalEquations2 {
    fn default() -> Self {
        Self::new()
    }
}

impl NormalEquations2 {
    pub fn new() -> Self {
        Self {
            xtx: Matrix2::zeros(),
            xty: Vector2::zeros(),
            rows: 0,
        }
    }

    /// Add one design row `x` with response `y`.
    pub fn push(&mut self, x: [f64; 2], y: f64) {
        let x = Vector2::new(x[0], x[1]);
        self.xtx += x * x.transpose();
        self.xty += x * y;
        self.rows += 1;
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Solve `(XᵀX + λI) β = Xᵀy`.
    ///
    /// Returns `None` if `|det| < DET_EPS` or the solution is not finite.
    pub fn solve_ridge(&self, lambda: f64) -> Option<Vector2<f64>> {
        let mut a = self.xtx;
        a[(0, 0)] += lambda;
        a[(1, 1)] += lambda;

        let det = a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)];
        if !det.is_finite() || det.abs() < DET_EPS {
            return None;
        }

        let inv = Matrix2::new(a[(1, 1)], -a[(0, 1)], -a[(1, 0)], a[(0, 0)]) / det;
        let beta = inv * self.xty;

        if beta.iter().all(|v| v.is_finite()) {
            Some(beta)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_penalty_recovers_exact_line() {
        // y = 2 + 3x on x = [0, 1, 2]
        let mut ne = NormalEquations2::new();
        for x in [0.0, 1.0, 2.0] {
            ne.push([1.0, x], 2.0 + 3.0 * x);
        }
        let beta = ne.solve_ridge(0.0).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
        assert_eq!(ne.rows(), 3);
    }

    #[test]
    fn matches_hand_computed_ridge_solution() {
        // Rows [1,1], [1,2], [1,3]; y = [1, 2, 3]; λ = 0.5.
        // XᵀX + λI = [[3.5, 6], [6, 14.5]], Xᵀy = [6, 14], det = 14.75.
        let mut ne = NormalEquations2::new();
        for m in 1..=3 {
            ne.push([1.0, m as f64], m as f64);
        }
        let beta = ne.solve_ridge(0.5).unwrap();
        let b0 = (14.5 * 6.0 - 6.0 * 14.0) / 14.75;
        let b1 = (-6.0 * 6.0 + 3.5 * 14.0) / 14.75;
        assert!((beta[0] - b0).abs() < 1e-12);
        assert!((beta[1] - b1).abs() < 1e-12);
    }

    #[test]
    fn singular_system_without_penalty_is_rejected() {
        let mut ne = NormalEquations2::new();
        for _ in 0..4 {
            ne.push([1.0, 5.0], 10.0);
        }
        assert!(ne.solve_ridge(0.0).is_none());
        // The penalty makes the same system solvable.
        assert!(ne.solve_ridge(0.5).is_some());
    }

    #[test]
    fn empty_system_with_penalty_gives_zero_coefficients() {
        let ne = NormalEquations2::new();
        let beta = ne.solve_ridge(0.5).unwrap();
        assert_eq!(beta[0], 0.0);
        assert_eq!(beta[1], 0.0);
    }
}
