//! The adaptive particle filter orchestrator (spec §2, §4.3): owns a pair
//! of ping-ponged [`SampleSet`]s and drives the init / action-update /
//! sensor-update / resample cycle over them.

use crate::hypothesis::Hypothesis;
use crate::kld::KldParams;
use crate::map::MapView;
use crate::pose::{Cov3, Pose};
use crate::resample::{resample, resample_add_particles, resample_hyps, resample_hyps_3, resample_map};
use crate::sample_set::SampleSet;
use crate::sampling::{sample_gaussian, sample_uniform_free, sample_uniform_in_box, HeadingSpread};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// How `init_map` draws each sample's heading (spec §9 Open Question: the
/// original forces `theta = 0`; this crate keeps that available as
/// `Fixed(0.0)`/[`InitHeading::Zero`] but defaults to `Uniform`, the
/// statistically correct choice for a map with no heading prior).
#[derive(Clone, Copy, Debug, Default)]
pub enum InitHeading {
    /// Forced to `0.0` — parity knob for callers that need the original's
    /// literal (arguably buggy) behavior.
    Zero,
    /// Drawn uniformly on `(-pi, pi]` — the default.
    #[default]
    Uniform,
    Fixed(f64),
}

impl InitHeading {
    fn spread(self) -> HeadingSpread {
        match self {
            InitHeading::Zero => HeadingSpread::Fixed(0.0),
            InitHeading::Uniform => HeadingSpread::Uniform,
            InitHeading::Fixed(theta) => HeadingSpread::Fixed(theta),
        }
    }
}

/// Construction-time configuration (spec §7 ambient configuration
/// surface): no file parsing, just a plain struct passed to `new`.
#[derive(Clone, Debug)]
pub struct FilterConfig {
    pub min_samples: usize,
    pub max_samples: usize,
    /// Extra samples appended by [`AdaptiveParticleFilter::resample_add`]
    /// on top of whatever the KLD cutoff already drew.
    pub overhead_samples: usize,
    pub pop_err: f64,
    pub pop_z: f64,
    pub init_heading: InitHeading,
    /// Deterministic PRNG seed. `None` seeds from `rand::rng()` at
    /// construction (spec §9 — exactly one PRNG per filter instance).
    pub seed: Option<u64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            min_samples: 100,
            max_samples: 5000,
            overhead_samples: 0,
            pop_err: 0.01,
            pop_z: 3.0,
            init_heading: InitHeading::default(),
            seed: None,
        }
    }
}

impl FilterConfig {
    fn kld(&self) -> KldParams {
        KldParams {
            pop_err: self.pop_err,
            pop_z: self.pop_z,
            min_samples: self.min_samples,
            max_samples: self.max_samples,
        }
    }
}

/// The orchestrator: two sample sets ping-ponged across resample calls
/// (spec §5 — the `current_set` flip is the sole linearization point), one
/// owned PRNG, and the configuration that parameterizes every operation.
pub struct AdaptiveParticleFilter {
    sets: [SampleSet; 2],
    current: usize,
    rng: ChaCha8Rng,
    config: FilterConfig,
}

impl AdaptiveParticleFilter {
    pub fn new(config: FilterConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        };
        AdaptiveParticleFilter {
            sets: [SampleSet::alloc(config.max_samples), SampleSet::alloc(config.max_samples)],
            current: 0,
            rng,
            config,
        }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// The live sample set (spec §4.3 query surface).
    pub fn current_set(&self) -> &SampleSet {
        &self.sets[self.current]
    }

    fn scratch_index(&self) -> usize {
        1 - self.current
    }

    fn flip(&mut self) {
        self.current = self.scratch_index();
    }

    /// Fills the current set from `N(mean, cov)`, uniform weights,
    /// rebuilds the histogram, and clusters (spec §4.3 `init_gaussian`).
    pub fn init_gaussian(&mut self, mean: &Pose, cov: &Cov3) {
        let spread = self.config.init_heading.spread();
        let rng = &mut self.rng;
        let set = &mut self.sets[self.current];
        for s in set.samples_mut() {
            s.pose = sample_gaussian(rng, mean, cov, spread);
            s.weight = 1.0 / set.len() as f64;
        }
        self.sets[self.current].set_uniform_weights();
        self.finish_init();
    }

    /// Fills the current set by rejection-sampling uniformly over the
    /// map's free cells (spec §4.3 `init_map`).
    pub fn init_map(&mut self, map: &impl MapView) {
        let heading = self.config.init_heading;
        let rng = &mut self.rng;
        let set = &mut self.sets[self.current];
        for s in set.samples_mut() {
            let mut pose = sample_uniform_free(rng, map);
            if let InitHeading::Zero = heading {
                pose.theta = 0.0;
            } else if let InitHeading::Fixed(theta) = heading {
                pose.theta = theta;
            }
            s.pose = pose;
        }
        self.finish_init();
    }

    /// Fills the current set by repeatedly calling a caller-supplied
    /// sampler closure (spec §4.3 `init_model` / §6 init-sampler callback).
    /// `sampler` receives the RNG and must return a pose; this crate does
    /// not interpret what distribution it draws from.
    pub fn init_model<F: FnMut(&mut ChaCha8Rng) -> Pose>(&mut self, mut sampler: F) {
        let rng = &mut self.rng;
        let set = &mut self.sets[self.current];
        for s in set.samples_mut() {
            s.pose = sampler(rng);
        }
        self.finish_init();
    }

    /// Fills the current set uniformly within a `var`-wide box centered at
    /// `(x, y)`, theta uniform, subject to the map's cell *bounds* — not its
    /// free-cell predicate, unlike [`init_map`](Self::init_map) (spec §4.3
    /// `init_to_point`). The distinction matters: this op is meant for a
    /// caller who knows roughly where the robot is but may be imprecise
    /// about exactly which cell, not for rejecting draws that land on
    /// known obstacles.
    pub fn init_to_point(&mut self, map: &impl MapView, x: f64, y: f64, var: f64) {
        let rng = &mut self.rng;
        let set = &mut self.sets[self.current];
        for s in set.samples_mut() {
            s.pose = sample_uniform_in_box(rng, map, x, y, var);
        }
        self.finish_init();
    }

    /// Collapses the current set onto a single exact pose, every sample
    /// identical. Not a spec'd operation — a degenerate zero-uncertainty
    /// helper kept for deterministic "I know exactly where I am, down to
    /// the millimeter" testing/debugging use, distinct from
    /// [`init_to_point`](Self::init_to_point)'s uniform-in-box sampling.
    pub fn init_exact_pose(&mut self, pose: Pose) {
        let set = &mut self.sets[self.current];
        for s in set.samples_mut() {
            s.pose = pose;
        }
        self.finish_init();
    }

    fn finish_init(&mut self) {
        let set = &mut self.sets[self.current];
        set.set_uniform_weights();
        set.rebuild_histogram();
        set.compute_cluster_stats();
    }

    /// Applies a motion-model callback to every sample in place, leaving
    /// the histogram/cluster table untouched (spec §4.3 `update_action`'s
    /// first variant — for callers that will call `resample` next and have
    /// no use for cluster stats in between).
    pub fn update_action<D>(&mut self, data: &D, mut motion: impl FnMut(&mut ChaCha8Rng, Pose, &D) -> Pose) {
        let rng = &mut self.rng;
        for s in self.sets[self.current].samples_mut() {
            s.pose = motion(rng, s.pose, data);
        }
    }

    /// As [`update_action`](Self::update_action), but rebuilds the
    /// histogram and recomputes cluster stats in place afterward (spec
    /// §4.3 `update_action`'s second variant — for callers that want
    /// cluster stats between an action update and the next sensor update).
    pub fn update_action_and_recluster<D>(&mut self, data: &D, mut motion: impl FnMut(&mut ChaCha8Rng, Pose, &D) -> Pose) {
        let rng = &mut self.rng;
        for s in self.sets[self.current].samples_mut() {
            s.pose = motion(rng, s.pose, data);
        }
        let set = &mut self.sets[self.current];
        set.rebuild_histogram();
        set.compute_cluster_stats();
    }

    /// Per-sample motion-model variant (spec §4.3 `update_action`'s second
    /// form): `motion` additionally receives each sample's *index*, for
    /// callers whose control input varies per particle (e.g. per-particle
    /// odometry noise already drawn upstream).
    pub fn update_action_indexed<D>(&mut self, data: &D, mut motion: impl FnMut(&mut ChaCha8Rng, usize, Pose, &D) -> Pose) {
        let rng = &mut self.rng;
        let set = &mut self.sets[self.current];
        for i in 0..set.len() {
            let pose = set.samples()[i].pose;
            set.samples_mut()[i].pose = motion(rng, i, pose, data);
        }
    }

    /// Applies a sensor-model weighting callback, normalizes the result,
    /// and returns the post-normalization sum of squared weights — the
    /// effective-sample-size surrogate spec §4.3 calls for. Falls back to
    /// uniform weights (and logs) if every sample's likelihood collapses
    /// to zero (spec §7).
    pub fn update_sensor<D>(&mut self, data: &D, mut sensor: impl FnMut(Pose, &D) -> f64) -> f64 {
        let set = &mut self.sets[self.current];
        let mut total = 0.0;
        for s in set.samples_mut() {
            let likelihood = sensor(s.pose, data);
            s.weight *= likelihood;
            total += s.weight;
        }

        if total <= 0.0 {
            #[cfg(feature = "tracing")]
            tracing::warn!("sensor update collapsed all weights to zero, falling back to uniform");
            set.set_uniform_weights();
            return 1.0 / set.len().max(1) as f64;
        }

        set.normalize_weights(total)
    }

    /// Plain KLD-adaptive resample into the scratch set, then flips
    /// `current_set` to it (spec §4.4.1).
    pub fn resample(&mut self) -> usize {
        let kld = self.config.kld();
        let scratch = self.scratch_index();
        let (from, to) = split_pair(&mut self.sets, self.current, scratch);
        let n = resample(&mut self.rng, from, to, &kld);
        self.flip();
        n
    }

    /// Map-guided resample with low-population top-up (spec §4.4.2): caps
    /// the importance-resample pass at `max_samples - overhead_samples`,
    /// then tops up with fresh map-uniform draws if the result came in under
    /// `min_samples + 10`.
    pub fn resample_map(&mut self, map: &impl MapView) -> usize {
        let kld = self.config.kld();
        let overhead = self.config.overhead_samples;
        let scratch = self.scratch_index();
        let (from, to) = split_pair(&mut self.sets, self.current, scratch);
        let n = resample_map(&mut self.rng, from, to, map, &kld, overhead);
        self.flip();
        n
    }

    /// Fixed-injection resample (spec §4.4.3): caps the importance-resample
    /// pass at `max_samples - overhead_samples`, then appends exactly
    /// `overhead_samples` fresh map-uniform samples.
    pub fn resample_add_particles(&mut self, map: &impl MapView) -> usize {
        let kld = self.config.kld();
        let k = self.config.overhead_samples;
        let scratch = self.scratch_index();
        let (from, to) = split_pair(&mut self.sets, self.current, scratch);
        let n = resample_add_particles(&mut self.rng, from, to, k, map, &kld);
        self.flip();
        n
    }

    /// Hypothesis-guided resample (spec §4.4.4): an ordinary importance
    /// resample capped at `max_samples - overhead_samples`, topped up with
    /// an equal, map-free-cell-checked share of fresh draws per hypothesis.
    pub fn resample_hyps(&mut self, map: &impl MapView, hyps: &[Hypothesis]) -> usize {
        let kld = self.config.kld();
        let overhead = self.config.overhead_samples;
        let scratch = self.scratch_index();
        let (from, to) = split_pair(&mut self.sets, self.current, scratch);
        let n = resample_hyps(&mut self.rng, from, to, map, hyps, &kld, overhead);
        self.flip();
        n
    }

    /// Per-hypothesis KLD cutoff resample variant (spec §4.4.4/§9).
    pub fn resample_hyps_3(&mut self, hyps: &[Hypothesis]) -> usize {
        let kld = self.config.kld();
        let scratch = self.scratch_index();
        let to = &mut self.sets[scratch];
        let n = resample_hyps_3(&mut self.rng, to, hyps, &kld);
        self.flip();
        n
    }

    /// `(weighted mean pose, spatial variance)` over the whole current set,
    /// with no clustering (spec §4.6, §6 `get_cep_stats`).
    pub fn cep_stats(&self) -> (Pose, f64) {
        let stats = self.sets[self.current].cep_stats();
        (stats.mean, stats.variance)
    }

    /// Number of clusters found by the current set's most recent
    /// clustering pass (spec §6 `get_cluster_stats_set`'s cluster-count
    /// companion).
    pub fn num_clusters(&self) -> usize {
        self.sets[self.current].num_clusters()
    }

    /// `(weight, mean, covariance)` for cluster `label` in the current set
    /// (spec §6 `get_cluster_stats`), `None` if `label` is out of range.
    pub fn cluster_stats(&self, label: usize) -> Option<(f64, Pose, Cov3)> {
        self.sets[self.current].cluster_stats(label)
    }
}

fn split_pair(sets: &mut [SampleSet; 2], from: usize, to: usize) -> (&SampleSet, &mut SampleSet) {
    debug_assert_ne!(from, to);
    let (a, b) = sets.split_at_mut(1);
    if from == 0 {
        (&a[0], &mut b[0])
    } else {
        (&b[0], &mut a[0])
    }
}
