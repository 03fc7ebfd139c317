//! The robot pose vector and its covariance, plus the circular-mean helpers
//! that heading (a circular quantity) requires.

use std::f64::consts::PI;

/// A 2-D robot pose: position plus heading.
///
/// Heading is a *circular* quantity — an arithmetic mean of two headings is
/// meaningless (`(-179deg + 179deg) / 2 == 0deg`, not `180deg`). Callers that
/// need an average heading should go through [`circular_mean`] rather than
/// averaging `theta` directly.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

impl Pose {
    pub fn new(x: f64, y: f64, theta: f64) -> Self {
        Pose { x, y, theta }
    }

    /// Wraps `theta` into `(-pi, pi]`, the convention used throughout this
    /// crate for stored headings.
    pub fn normalized(mut self) -> Self {
        self.theta = normalize_angle(self.theta);
        self
    }
}

/// Wraps an angle (radians) into `(-pi, pi]`.
pub fn normalize_angle(theta: f64) -> f64 {
    let two_pi = 2.0 * PI;
    let mut a = (theta + PI) % two_pi;
    if a < 0.0 {
        a += two_pi;
    }
    a - PI
}

/// 3x3 symmetric pose covariance. Only the 2x2 (x, y) sub-block and the
/// scalar theta variance carry meaning (the remaining off-diagonal terms
/// relating theta to x/y are unused by this crate — see spec §3).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Cov3(pub [[f64; 3]; 3]);

impl Cov3 {
    pub fn diagonal(var_x: f64, var_y: f64, var_theta: f64) -> Self {
        Cov3([
            [var_x, 0.0, 0.0],
            [0.0, var_y, 0.0],
            [0.0, 0.0, var_theta],
        ])
    }

    pub fn zero() -> Self {
        Cov3([[0.0; 3]; 3])
    }

    /// The 2x2 (x, y) sub-block.
    pub fn xy(&self) -> [[f64; 2]; 2] {
        [[self.0[0][0], self.0[0][1]], [self.0[1][0], self.0[1][1]]]
    }

    pub fn theta_var(&self) -> f64 {
        self.0[2][2]
    }
}

/// The circular mean of a set of angles, weighted by `weights`, expressed as
/// `atan2(sum(w * sin(theta)), sum(w * cos(theta)))`. Returns `0.0` if the
/// accumulated resultant vector has (numerically) zero length.
pub fn circular_mean(angles: impl Iterator<Item = (f64, f64)>) -> f64 {
    let (mut sum_cos, mut sum_sin) = (0.0, 0.0);
    for (weight, theta) in angles {
        sum_cos += weight * theta.cos();
        sum_sin += weight * theta.sin();
    }
    if sum_cos == 0.0 && sum_sin == 0.0 {
        0.0
    } else {
        sum_sin.atan2(sum_cos)
    }
}

/// The circular variance (dispersion) identity used by AMCL's cluster
/// statistics: `-2 * ln(sqrt(m2^2 + m3^2))`, where `m2`/`m3` are the
/// weighted sums of `cos(theta)`/`sin(theta)` *normalized* by total weight.
pub fn circular_variance(mean_resultant_length: f64) -> f64 {
    -2.0 * mean_resultant_length.max(f64::MIN_POSITIVE).ln()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_wraps_into_range() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1e-9);
        assert!((normalize_angle(-3.0 * PI) - PI).abs() < 1e-9);
        assert!(normalize_angle(0.1) > 0.0);
    }

    #[test]
    fn circular_mean_near_wraparound_is_not_zero() {
        let mean = circular_mean(
            [(1.0, PI - 0.01), (1.0, -PI + 0.01)].into_iter(),
        );
        assert!(mean.abs() > 3.0, "expected mean near +/-pi, got {mean}");
    }

    #[test]
    fn circular_mean_of_equal_opposite_angles_is_not_skewed_to_zero() {
        // this is the textbook failure mode of a naive arithmetic mean
        let naive = (std::f64::consts::FRAC_PI_2 + (-std::f64::consts::FRAC_PI_2)) / 2.0;
        assert_eq!(naive, 0.0);
    }
}
