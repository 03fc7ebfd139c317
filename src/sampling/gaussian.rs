//! Multivariate Gaussian pose sampler (spec §4.2): a Cholesky-based draw on
//! the linear (x, y) components, with heading sampled independently and
//! uniformly on `(-pi, pi]` unless the caller supplies a fixed heading
//! (used by `init_map`'s `InitHeading::Zero`, spec §9).

use crate::linalg::{cholesky_2x2, mat2_vec};
use crate::pose::{normalize_angle, Cov3, Pose};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// How `theta` is drawn when sampling a pose from a Gaussian.
#[derive(Clone, Copy, Debug)]
pub enum HeadingSpread {
    /// Uniform on `(-pi, pi]` — the default for a genuine 3-D Gaussian draw.
    Uniform,
    /// Drawn from a 1-D Gaussian centered on `mean.theta` with the
    /// covariance's theta variance.
    Gaussian,
    /// Forced to a fixed value (spec §9's `init_heading: zero` parity knob).
    Fixed(f64),
}

/// Draws one pose from `N(mean, cov)`. The (x, y) draw is
/// `mean.xy + L * z` where `L` is the Cholesky factor of the covariance's
/// 2x2 xy sub-block and `z` is a pair of independent standard normals.
pub fn sample_gaussian(
    rng: &mut impl Rng,
    mean: &Pose,
    cov: &Cov3,
    heading: HeadingSpread,
) -> Pose {
    let l = cholesky_2x2(cov.xy());
    let z = [
        StandardNormal.sample(rng),
        StandardNormal.sample(rng),
    ];
    let offset = mat2_vec(l, z);

    let theta = match heading {
        HeadingSpread::Uniform => rng.random_range(-std::f64::consts::PI..=std::f64::consts::PI),
        HeadingSpread::Gaussian => {
            let sigma = cov.theta_var().max(0.0).sqrt();
            let draw: f64 = StandardNormal.sample(rng);
            normalize_angle(mean.theta + sigma * draw)
        }
        HeadingSpread::Fixed(theta) => theta,
    };

    Pose::new(mean.x + offset[0], mean.y + offset[1], theta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn gaussian_draws_cluster_around_mean() {
        let mean = Pose::new(5.0, -2.0, 0.0);
        let cov = Cov3::diagonal(0.01, 0.01, 0.01);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let n = 2000;
        let (mut sx, mut sy) = (0.0, 0.0);
        for _ in 0..n {
            let p = sample_gaussian(&mut rng, &mean, &cov, HeadingSpread::Uniform);
            sx += p.x;
            sy += p.y;
        }
        assert!((sx / n as f64 - mean.x).abs() < 0.05);
        assert!((sy / n as f64 - mean.y).abs() < 0.05);
    }

    #[test]
    fn fixed_heading_is_exact() {
        let mean = Pose::new(0.0, 0.0, 0.0);
        let cov = Cov3::diagonal(1.0, 1.0, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let p = sample_gaussian(&mut rng, &mean, &cov, HeadingSpread::Fixed(0.0));
        assert_eq!(p.theta, 0.0);
    }
}
