#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::private_intra_doc_links)]

//! # amcl-core
//!
//! An adaptive Monte Carlo localization (KLD-sampling) particle filter
//! core: a fixed-capacity, double-buffered sample set; a bucketed
//! 3-D (x, y, theta) histogram that doubles as a single-linkage cluster
//! index; the Fox KLD resample-limit formula; and the family of
//! resamplers (plain, map-guided, hypothesis-guided) built on top of them.
//!
//! This crate is a pure sampling/resampling engine. It does not own a map,
//! a motion model, or a sensor model — those are supplied by the caller as
//! plain closures or a narrow [`MapView`] trait implementation. See
//! [`filter::AdaptiveParticleFilter`] for the orchestrator that ties a
//! pair of sample sets, a single owned PRNG, and the resampling family
//! together into the init / update / resample cycle.
//!
//! ## Usage
//!
//! ```rust
//! use amcl_core::{AdaptiveParticleFilter, FilterConfig, Pose, Cov3};
//!
//! let mut filter = AdaptiveParticleFilter::new(FilterConfig {
//!     min_samples: 100,
//!     max_samples: 1000,
//!     seed: Some(42),
//!     ..FilterConfig::default()
//! });
//!
//! filter.init_gaussian(&Pose::new(0.0, 0.0, 0.0), &Cov3::diagonal(0.25, 0.25, 0.1));
//! filter.update_action(&(0.1_f64, 0.0_f64), |_rng, pose, &(dx, dtheta)| {
//!     Pose::new(pose.x + dx, pose.y, pose.theta + dtheta).normalized()
//! });
//! filter.update_sensor(&(), |_pose, _obs| 1.0);
//! let n = filter.resample();
//! assert!(n >= 100);
//! ```
//!
//! ## Optional features
//! * **tracing** (default) — structured diagnostics for the recoverable
//!   degeneracy/exhaustion paths spec'd in the error-handling design
//!   (sensor-weight collapse, kd-tree/cluster-table pool exhaustion).
//! * **serialize** — `serde` `Serialize`/`Deserialize` on [`Pose`],
//!   [`Cov3`], and [`Hypothesis`].

pub mod cluster;
pub mod filter;
pub mod hypothesis;
pub mod kdtree;
pub mod kld;
pub mod linalg;
pub mod map;
pub mod pose;
pub mod resample;
pub mod sample_set;
pub mod sampling;

pub use cluster::{cep_stats, CepStats, ClusterAccumulator, MAX_CLUSTERS};
pub use filter::{AdaptiveParticleFilter, FilterConfig, InitHeading};
pub use hypothesis::Hypothesis;
pub use kdtree::KdTree;
pub use kld::{resample_limit, KldParams};
pub use map::{MapView, OccState};
pub use pose::{circular_mean, circular_variance, normalize_angle, Cov3, Pose};
pub use resample::{resample, resample_add_particles, resample_hyps, resample_hyps_2, resample_hyps_3, resample_map};
pub use sample_set::{Sample, SampleSet};
pub use sampling::{sample_gaussian, sample_uniform_free, sample_uniform_in_box, Categorical, HeadingSpread};
