//! Min-plus and max-plus convolution of ultimately pseudo-periodic curves.
//!
//! Every strategy computes the same functions; [`ConvolutionSettings`]
//! selects one, and [`verify::cross_check`] runs several side by side.

/**
 * The convolution interface, its errors and the entry points.
 */
mod convolution;
pub use convolution::*;

/**
 * These are the strategies implementing the convolution interface.
 */
mod impls;
pub use impls::*;

/**
 * Knobs selecting the strategy and its speed-ups.
 */
mod settings;
pub use settings::*;

/**
 * Running several strategies against each other.
 */
pub mod verify;

mod envelope;
mod pairs;
mod term;

// Ordered by insertion, with a fast non-cryptographic hasher
pub type Map<K, V> = indexmap::IndexMap<K, V, rustc_hash::FxBuildHasher>;
