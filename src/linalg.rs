//! Small, fixed-size numeric kernels needed by the Gaussian sampler and the
//! cluster-covariance pass. Kept hand-rolled and local rather than pulled
//! in from a general linear-algebra crate — a heavyweight dependency for a
//! 2x2/3x3 problem.

/// Lower-triangular Cholesky factor `L` of a 2x2 symmetric positive
/// semi-definite matrix, such that `L * L^T == m`. Negative or
/// numerically-zero diagonal entries are clamped to zero so that a
/// degenerate (rank-deficient) covariance still produces a usable (if
/// collapsed) sampler rather than propagating a NaN.
pub fn cholesky_2x2(m: [[f64; 2]; 2]) -> [[f64; 2]; 2] {
    let a = m[0][0].max(0.0);
    let l00 = a.sqrt();
    let l10 = if l00 > 0.0 { m[1][0] / l00 } else { 0.0 };
    let remainder = (m[1][1] - l10 * l10).max(0.0);
    let l11 = remainder.sqrt();
    [[l00, 0.0], [l10, l11]]
}

/// Applies a 2x2 lower-triangular matrix to a column vector: `l * v`.
pub fn mat2_vec(l: [[f64; 2]; 2], v: [f64; 2]) -> [f64; 2] {
    [
        l[0][0] * v[0] + l[0][1] * v[1],
        l[1][0] * v[0] + l[1][1] * v[1],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cholesky_reconstructs_identity() {
        let l = cholesky_2x2([[1.0, 0.0], [0.0, 1.0]]);
        assert_eq!(l, [[1.0, 0.0], [0.0, 1.0]]);
    }

    #[test]
    fn cholesky_reconstructs_spd_matrix() {
        let m = [[4.0, 2.0], [2.0, 3.0]];
        let l = cholesky_2x2(m);
        let reconstructed = [
            [
                l[0][0] * l[0][0] + l[0][1] * l[0][1],
                l[0][0] * l[1][0] + l[0][1] * l[1][1],
            ],
            [
                l[1][0] * l[0][0] + l[1][1] * l[0][1],
                l[1][0] * l[1][0] + l[1][1] * l[1][1],
            ],
        ];
        for i in 0..2 {
            for j in 0..2 {
                assert!((reconstructed[i][j] - m[i][j]).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn cholesky_of_degenerate_matrix_does_not_nan() {
        let l = cholesky_2x2([[0.0, 0.0], [0.0, 0.0]]);
        assert!(l.iter().flatten().all(|v| v.is_finite()));
    }
}
