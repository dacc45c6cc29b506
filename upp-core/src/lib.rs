//! Exact-rational, ultimately pseudo-periodic piecewise-linear curves.
//!
//! A [`Curve`] is a function on `[0, +inf)` described by a finite base
//! [`Sequence`] of points and open segments plus a pseudo-period
//! `(T, d, c)`: past `T` the shape repeats every `d`, `c` higher each time.
//! All arithmetic is carried out on [`Rational`] values, so results are
//! bit-for-bit reproducible.
//!
//! The convolution operators live in the `upp-conv` crate; this crate holds
//! the data model, the closed-form generators, pseudo-inverses and the
//! upper-bound fits.

/// Arbitrary-precision rationals extended with `+inf` and `-inf`.
mod rational;
pub use rational::{Rational, RationalError};

/// Points and open segments, the pieces a sequence is made of.
mod element;
pub use element::{Element, Point, Segment};

/// Gap-free, alternating runs of points and segments.
mod sequence;
pub use sequence::{Sequence, SequenceError, merge_collinear};

/// The curve type together with its generators and transforms.
pub mod curve;
pub use curve::{Curve, CurveError, equivalent};

/// Fitting a curve under a sigma-rho or rate-latency shape.
pub mod bounds;
pub use bounds::{rate_latency_upper_bound, sigma_rho_upper_bound};
