//! Externally-supplied Gaussian hypotheses for guided resampling (spec §4.4.4,
//! §9). A multi-hypothesis tracker upstream of this crate proposes candidate
//! pose regions; `resample_hyps`/`resample_hyps_3` inject samples into them.

use crate::pose::Pose;

/// One externally-supplied candidate pose region.
///
/// **Covariance convention (spec §9 Open Question).** `cov`'s 2x2 (x, y)
/// sub-block is *not* a conventional covariance: per the source this crate
/// preserves output parity with, `cov.0[0][0]` and `cov.0[1][1]` are
/// standard deviations (not variances), and `cov.0[0][1]` is a raw
/// correlation numerator meant to be divided by
/// `cov.0[0][0] * cov.0[1][1]` to recover a correlation coefficient. This is
/// very likely a latent bug in the system this crate reimplements, but the
/// spec requires preserving the behavior rather than silently "fixing" it
/// — see [`Hypothesis::xy_covariance`].
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Hypothesis {
    pub mean: Pose,
    /// Raw covariance-ish matrix as supplied by the caller — see the
    /// struct-level doc for the (non-obvious, intentionally preserved)
    /// convention governing this field's contents.
    pub cov: [[f64; 3]; 3],
}

impl Hypothesis {
    pub fn new(mean: Pose, cov: [[f64; 3]; 3]) -> Self {
        Hypothesis { mean, cov }
    }

    /// Reinterprets `cov`'s 2x2 xy sub-block per the §9 convention: treats
    /// the diagonal as standard deviations and recovers a genuine
    /// covariance matrix from them plus the correlation numerator, for
    /// feeding into [`crate::sampling::sample_gaussian`]. Preserved
    /// deliberately, not corrected — see the struct doc.
    pub fn xy_covariance(&self) -> [[f64; 2]; 2] {
        let std_x = self.cov[0][0];
        let std_y = self.cov[1][1];
        let var_x = std_x * std_x;
        let var_y = std_y * std_y;
        let rho_numerator = self.cov[0][1];
        let denom = std_x * std_y;
        let cov_xy = if denom != 0.0 {
            rho_numerator / denom * std_x * std_y
        } else {
            0.0
        };
        [[var_x, cov_xy], [cov_xy, var_y]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagonal_hypothesis_has_zero_cross_term() {
        let h = Hypothesis::new(
            Pose::new(5.0, 5.0, 0.0),
            [[0.3, 0.0, 0.0], [0.0, 0.3, 0.0], [0.0, 0.0, 0.1]],
        );
        let cov = h.xy_covariance();
        assert!((cov[0][0] - 0.09).abs() < 1e-12);
        assert!((cov[1][1] - 0.09).abs() < 1e-12);
        assert_eq!(cov[0][1], 0.0);
    }
}
