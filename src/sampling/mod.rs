//! Sampling primitives consumed by the resampling family (spec §4.2): a
//! categorical (discrete) distribution over a weight vector, a
//! Cholesky-based bivariate Gaussian pose sampler, and a map-constrained
//! rejection sampler.
//!
//! Each primitive takes `&mut impl Rng` at the call site rather than
//! owning a generator, and the categorical distribution builds a
//! cumulative-weight table once and binary-searches it per draw rather
//! than re-scanning on every sample.

mod categorical;
mod gaussian;
mod uniform;

pub use categorical::Categorical;
pub use gaussian::{sample_gaussian, HeadingSpread};
pub use uniform::{sample_uniform_free, sample_uniform_in_box};
