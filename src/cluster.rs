//! Cluster statistics pass (spec §4.6): for each connected component of
//! occupied histogram buckets, accumulate weighted pose moments and derive
//! a mean pose (with a circular heading mean) and covariance. Also the
//! whole-set CEP statistic, a cheap pose/uncertainty readout that skips
//! clustering entirely.

use crate::pose::{circular_mean, circular_variance, Cov3, Pose};

/// Cluster table capacity (spec §3 — "a cluster table of capacity 100").
/// Clusters beyond this are silently dropped (spec §7, pool exhaustion).
pub const MAX_CLUSTERS: usize = 100;

/// Running weighted moments for one cluster, per spec §4.6: `m0`/`m1`
/// accumulate weighted x/y, `m2`/`m3` accumulate weighted cos/sin(theta),
/// and `c` is the weighted (x, y) outer-product accumulator.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClusterAccumulator {
    pub count: usize,
    pub weight: f64,
    m0: f64,
    m1: f64,
    m2: f64,
    m3: f64,
    c: [[f64; 2]; 2],
}

impl ClusterAccumulator {
    pub(crate) fn accumulate(&mut self, pose: &Pose, w: f64) {
        self.count += 1;
        self.weight += w;
        self.m0 += w * pose.x;
        self.m1 += w * pose.y;
        self.m2 += w * pose.theta.cos();
        self.m3 += w * pose.theta.sin();
        self.c[0][0] += w * pose.x * pose.x;
        self.c[0][1] += w * pose.x * pose.y;
        self.c[1][0] += w * pose.y * pose.x;
        self.c[1][1] += w * pose.y * pose.y;
    }

    /// `(weight, mean pose, covariance)`, or `None` if the cluster never
    /// accumulated any weight (spec §4.6 step 4).
    pub fn stats(&self) -> Option<(f64, Pose, Cov3)> {
        if self.weight <= 0.0 {
            return None;
        }
        let mean_x = self.m0 / self.weight;
        let mean_y = self.m1 / self.weight;
        let mean_theta = self.m3.atan2(self.m2);

        let resultant_len = ((self.m2 * self.m2 + self.m3 * self.m3).sqrt() / self.weight).min(1.0);
        let theta_var = circular_variance(resultant_len);

        let cov_xx = self.c[0][0] / self.weight - mean_x * mean_x;
        let cov_xy = self.c[0][1] / self.weight - mean_x * mean_y;
        let cov_yy = self.c[1][1] / self.weight - mean_y * mean_y;

        let mean = Pose::new(mean_x, mean_y, mean_theta);
        let cov = Cov3([
            [cov_xx, cov_xy, 0.0],
            [cov_xy, cov_yy, 0.0],
            [0.0, 0.0, theta_var],
        ]);
        Some((self.weight, mean, cov))
    }
}

/// The whole-set circular-error-probable readout (spec §4.6): weighted
/// (x, y) mean plus a single scalar spatial variance, with no clustering.
#[derive(Clone, Copy, Debug)]
pub struct CepStats {
    pub mean: Pose,
    pub variance: f64,
}

/// Accumulates CEP statistics over an arbitrary iterator of (pose, weight).
/// `theta` in `mean` is the circular mean of the input headings.
pub fn cep_stats<'a>(samples: impl Iterator<Item = (&'a Pose, f64)>) -> CepStats {
    let mut sum_w = 0.0;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_x2 = 0.0;
    let mut sum_y2 = 0.0;
    let mut thetas = Vec::new();

    for (pose, w) in samples {
        sum_w += w;
        sum_x += w * pose.x;
        sum_y += w * pose.y;
        sum_x2 += w * pose.x * pose.x;
        sum_y2 += w * pose.y * pose.y;
        thetas.push((w, pose.theta));
    }

    if sum_w <= 0.0 {
        return CepStats {
            mean: Pose::default(),
            variance: 0.0,
        };
    }

    let mean_x = sum_x / sum_w;
    let mean_y = sum_y / sum_w;
    let e_x2 = sum_x2 / sum_w;
    let e_y2 = sum_y2 / sum_w;
    let variance = (e_x2 + e_y2) - (mean_x * mean_x + mean_y * mean_y);
    let theta = circular_mean(thetas.into_iter());

    CepStats {
        mean: Pose::new(mean_x, mean_y, theta),
        variance: variance.max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_point_cluster_has_zero_covariance() {
        let mut acc = ClusterAccumulator::default();
        acc.accumulate(&Pose::new(1.0, 2.0, 0.0), 1.0);
        let (weight, mean, cov) = acc.stats().unwrap();
        assert_eq!(weight, 1.0);
        assert_eq!(mean.x, 1.0);
        assert_eq!(mean.y, 2.0);
        assert!(cov.xy()[0][0].abs() < 1e-9);
        assert!(cov.xy()[1][1].abs() < 1e-9);
    }

    #[test]
    fn cluster_mean_matches_sample_moments_for_tight_blob() {
        let points = [
            Pose::new(0.0, 0.0, 0.0),
            Pose::new(0.1, 0.0, 0.0),
            Pose::new(0.0, 0.1, 0.0),
            Pose::new(-0.1, -0.1, 0.0),
        ];
        let mut acc = ClusterAccumulator::default();
        for p in &points {
            acc.accumulate(p, 1.0);
        }
        let (_, mean, _) = acc.stats().unwrap();
        let expected_x = points.iter().map(|p| p.x).sum::<f64>() / points.len() as f64;
        let expected_y = points.iter().map(|p| p.y).sum::<f64>() / points.len() as f64;
        assert!((mean.x - expected_x).abs() < 1e-9);
        assert!((mean.y - expected_y).abs() < 1e-9);
    }

    #[test]
    fn cluster_circular_mean_near_wraparound_is_not_zero() {
        let mut acc = ClusterAccumulator::default();
        acc.accumulate(&Pose::new(0.0, 0.0, std::f64::consts::PI - 0.01), 1.0);
        acc.accumulate(&Pose::new(0.0, 0.0, -std::f64::consts::PI + 0.01), 1.0);
        let (_, mean, _) = acc.stats().unwrap();
        assert!(mean.theta.abs() > 3.0);
    }

    #[test]
    fn empty_accumulator_has_no_stats() {
        let acc = ClusterAccumulator::default();
        assert!(acc.stats().is_none());
    }

    #[test]
    fn cep_stats_of_constant_pose_has_zero_variance() {
        let samples = vec![Pose::new(1.0, 1.0, 0.0); 5];
        let stats = cep_stats(samples.iter().map(|p| (p, 1.0)));
        assert!(stats.variance.abs() < 1e-9);
        assert_eq!(stats.mean.x, 1.0);
    }
}
