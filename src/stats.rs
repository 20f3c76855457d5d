//! Numerical helpers shared by the scores
//!
//! Covariance and correlation matrices, partial correlation, the
//! Fisher Z test and log-determinants, on top of `nalgebra`.

use crate::data::DataSet;
use crate::error::{CausalError, Result};
use nalgebra::{DMatrix, DVector};

/// Maximum-likelihood covariance (divisor `n`) of `columns` over `rows`
pub fn covariance(data: &DataSet, columns: &[usize], rows: &[usize]) -> Result<DMatrix<f64>> {
    let n = rows.len();
    if n == 0 {
        return Err(CausalError::numerical("covariance of an empty sample"));
    }
    let p = columns.len();
    let means: Vec<f64> = columns
        .iter()
        .map(|&c| rows.iter().map(|&r| data.value(r, c)).sum::<f64>() / n as f64)
        .collect();

    let mut cov = DMatrix::zeros(p, p);
    for i in 0..p {
        for j in i..p {
            let s: f64 = rows
                .iter()
                .map(|&r| {
                    (data.value(r, columns[i]) - means[i]) * (data.value(r, columns[j]) - means[j])
                })
                .sum();
            cov[(i, j)] = s / n as f64;
            cov[(j, i)] = cov[(i, j)];
        }
    }
    Ok(cov)
}

/// Rescale a covariance matrix to a correlation matrix
pub fn correlation(cov: &DMatrix<f64>) -> Result<DMatrix<f64>> {
    let sd: Vec<f64> = (0..cov.nrows()).map(|i| cov[(i, i)].sqrt()).collect();
    if let Some(i) = sd.iter().position(|s| *s <= 0.0 || !s.is_finite()) {
        return Err(CausalError::numerical(format!(
            "column {} has zero or undefined variance",
            i
        )));
    }
    Ok(DMatrix::from_fn(cov.nrows(), cov.ncols(), |i, j| {
        cov[(i, j)] / (sd[i] * sd[j])
    }))
}

/// Extract the square submatrix on `indices`
pub fn submatrix(m: &DMatrix<f64>, indices: &[usize]) -> DMatrix<f64> {
    DMatrix::from_fn(indices.len(), indices.len(), |i, j| m[(indices[i], indices[j])])
}

/// Partial correlation of `x` and `y` given `z`, from a correlation (or covariance) matrix
pub fn partial_correlation(m: &DMatrix<f64>, x: usize, y: usize, z: &[usize]) -> Result<f64> {
    let mut indices = vec![x, y];
    indices.extend_from_slice(z);
    let precision = submatrix(m, &indices)
        .try_inverse()
        .ok_or_else(|| CausalError::numerical("singular matrix in partial correlation"))?;
    let r = -precision[(0, 1)] / (precision[(0, 0)] * precision[(1, 1)]).sqrt();
    Ok(r.clamp(-1.0, 1.0))
}

/// Variance of `y` left after regressing on `regressors`
pub fn residual_variance(m: &DMatrix<f64>, y: usize, regressors: &[usize]) -> Result<f64> {
    let var_y = m[(y, y)];
    if regressors.is_empty() {
        return Ok(var_y);
    }
    let szz = submatrix(m, regressors);
    let szy = DVector::from_iterator(regressors.len(), regressors.iter().map(|&z| m[(z, y)]));
    let chol = szz
        .cholesky()
        .ok_or_else(|| CausalError::numerical("regressor covariance is not positive definite"))?;
    let beta = chol.solve(&szy);
    Ok(var_y - szy.dot(&beta))
}

/// Natural log of the determinant of a symmetric positive-definite matrix
pub fn log_det(m: &DMatrix<f64>) -> Result<f64> {
    let chol = m
        .clone()
        .cholesky()
        .ok_or_else(|| CausalError::numerical("matrix is not positive definite"))?;
    let diagonal = chol.l().diagonal();
    // A zero pivot still factors, but the matrix is singular
    if diagonal.iter().any(|d| *d <= 1e-12 || !d.is_finite()) {
        return Err(CausalError::numerical("matrix is singular"));
    }
    Ok(2.0 * diagonal.iter().map(|d| d.ln()).sum::<f64>())
}

/// Two-sided p-value of the Fisher Z test for a partial correlation
///
/// `n` is the sample size and `k` the size of the conditioning set.
pub fn fisher_z_p_value(r: f64, n: usize, k: usize) -> Result<f64> {
    let dof = n as f64 - k as f64 - 3.0;
    if dof <= 0.0 {
        return Err(CausalError::numerical(format!(
            "sample of {} too small to condition on {} variables",
            n, k
        )));
    }
    let r = r.clamp(-1.0 + 1e-12, 1.0 - 1e-12);
    let z = 0.5 * dof.sqrt() * ((1.0 + r) / (1.0 - r)).ln();
    Ok(2.0 * (1.0 - normal_cdf(z.abs())))
}

/// Standard normal CDF
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + erf(x / std::f64::consts::SQRT_2))
}

// Abramowitz & Stegun 7.1.26, |error| < 1.5e-7
fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}

/// Equal-frequency bin edges splitting `values` into `bins` categories
///
/// Returns `bins - 1` cut points; NaNs are ignored.
pub fn equal_frequency_cuts(values: &[f64], bins: usize) -> Vec<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    if sorted.is_empty() || bins < 2 {
        return Vec::new();
    }
    sorted.sort_by(f64::total_cmp);
    let m = sorted.len();
    (1..bins)
        .map(|j| sorted[(j * m / bins).min(m - 1)])
        .collect()
}

/// Category of `x` given cut points from [`equal_frequency_cuts`]
pub fn bin_of(x: f64, cuts: &[f64]) -> usize {
    cuts.iter().filter(|c| x >= **c).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_normal_cdf() {
        assert!(close(normal_cdf(0.0), 0.5, 1e-7));
        assert!(close(normal_cdf(1.959_964), 0.975, 1e-6));
        assert!(close(normal_cdf(-1.0), 0.158_655, 1e-6));
    }

    #[test]
    fn test_covariance_and_correlation() {
        let data = DataSet::continuous(
            "t",
            &["A", "B"],
            vec![vec![1.0, 2.0, 3.0, 4.0], vec![2.0, 4.0, 6.0, 8.0]],
        )
        .unwrap();
        let cov = covariance(&data, &[0, 1], &[0, 1, 2, 3]).unwrap();
        assert!(close(cov[(0, 0)], 1.25, 1e-12));
        assert!(close(cov[(0, 1)], 2.5, 1e-12));
        let corr = correlation(&cov).unwrap();
        assert!(close(corr[(0, 1)], 1.0, 1e-12));
    }

    #[test]
    fn test_zero_variance_is_an_error() {
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]);
        assert!(correlation(&cov).is_err());
    }

    #[test]
    fn test_partial_correlation_removes_common_cause() {
        // X <- Z -> Y with unit loadings: corr(X,Y) = 0.5, partial given Z = 0
        let m = DMatrix::from_row_slice(3, 3, &[1.0, 0.5, 0.7071, 0.5, 1.0, 0.7071, 0.7071, 0.7071, 1.0]);
        let r_xy = partial_correlation(&m, 0, 1, &[]).unwrap();
        assert!(close(r_xy, 0.5, 1e-9));
        let r_xy_z = partial_correlation(&m, 0, 1, &[2]).unwrap();
        assert!(r_xy_z.abs() < 1e-3);
    }

    #[test]
    fn test_residual_variance_and_log_det() {
        let m = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
        assert!(close(residual_variance(&m, 0, &[1]).unwrap(), 1.5, 1e-12));
        assert!(close(residual_variance(&m, 0, &[]).unwrap(), 2.0, 1e-12));
        assert!(close(log_det(&m).unwrap(), 3.0f64.ln(), 1e-12));
        let singular = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        assert!(log_det(&singular).is_err());
    }

    #[test]
    fn test_fisher_z() {
        let p_zero = fisher_z_p_value(0.0, 100, 0).unwrap();
        assert!(close(p_zero, 1.0, 1e-7));
        let p_strong = fisher_z_p_value(0.6, 100, 1).unwrap();
        assert!(p_strong < 1e-6);
        assert!(fisher_z_p_value(0.3, 4, 2).is_err());
    }

    #[test]
    fn test_equal_frequency_bins() {
        let values = [6.0, 1.0, 5.0, 2.0, 4.0, 3.0, f64::NAN];
        let cuts = equal_frequency_cuts(&values, 3);
        assert_eq!(cuts, vec![3.0, 5.0]);
        assert_eq!(bin_of(1.0, &cuts), 0);
        assert_eq!(bin_of(3.0, &cuts), 1);
        assert_eq!(bin_of(6.0, &cuts), 2);
    }
}
