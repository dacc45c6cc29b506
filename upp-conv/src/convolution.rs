use crate::envelope::Partial;
use crate::{
    ConvolutionKind, ConvolutionSettings, DirectConvolution, InversionConvolution,
    IsospeedConvolution, Strategy, SuperIsospeedConvolution,
};
use thiserror::Error;
use tracing::{Level, event};
use upp_core::curve::generators;
use upp_core::{Curve, CurveError, Rational};

/// The ways a convolution can fail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvolutionError {
    /// An operand is unsuitable, or a curve operation underneath failed
    #[error(transparent)]
    Curve(#[from] CurveError),

    /// Two strategies produced different functions for the same operands.
    /// Only raised by cross-checking; it always indicates a bug.
    #[error("{first} and {second} strategies disagree on {f} and {g}")]
    StrategyDisagreement {
        first: Strategy,
        second: Strategy,
        f: String,
        g: String,
    },
}

/// The Convolution trait defines the interface of a convolution strategy.
///
/// Every implementation computes the same functions; they differ in how much
/// of the operands' structure they exploit.
pub trait Convolution {
    /// The configuration type for this strategy
    type Settings;

    /// Create a new instance with the provided settings
    fn new(settings: Self::Settings) -> Self;

    /// `(f ⊗ g)(t) = inf_{0 <= s <= t} f(s) + g(t - s)`
    fn min_plus(&self, f: &Curve, g: &Curve) -> Result<Curve, ConvolutionError>;

    /// `(f ⊗̄ g)(t) = sup_{0 <= s <= t} f(s) + g(t - s)`
    ///
    /// Both operands must be right-continuous. Unless overridden this is
    /// `-((-f) ⊗ (-g))`.
    fn max_plus(&self, f: &Curve, g: &Curve) -> Result<Curve, ConvolutionError> {
        check_max_plus_operands(f, g)?;
        if let Some(result) = shortcut(f, g, ConvolutionKind::MaxPlus) {
            return Ok(result?);
        }
        Ok(self.min_plus(&f.negate(), &g.negate())?.negate())
    }
}

/// Convolve with the strategy the settings select
pub fn convolution(
    f: &Curve,
    g: &Curve,
    kind: ConvolutionKind,
    settings: &ConvolutionSettings,
) -> Result<Curve, ConvolutionError> {
    let strategy = settings.strategy();
    event!(Level::DEBUG, %strategy, ?kind, parallel = settings.use_parallelism);
    match strategy {
        Strategy::Direct => apply(&DirectConvolution::new(settings.clone()), f, g, kind),
        Strategy::Isospeed => apply(&IsospeedConvolution::new(settings.clone()), f, g, kind),
        Strategy::SuperIsospeed => {
            apply(&SuperIsospeedConvolution::new(settings.clone()), f, g, kind)
        }
        Strategy::Inversion => apply(&InversionConvolution::new(settings.clone()), f, g, kind),
    }
}

/// `f ⊗ g` with the strategy the settings select
pub fn min_plus_convolution(
    f: &Curve,
    g: &Curve,
    settings: &ConvolutionSettings,
) -> Result<Curve, ConvolutionError> {
    convolution(f, g, ConvolutionKind::MinPlus, settings)
}

/// `f ⊗̄ g` with the strategy the settings select
pub fn max_plus_convolution(
    f: &Curve,
    g: &Curve,
    settings: &ConvolutionSettings,
) -> Result<Curve, ConvolutionError> {
    convolution(f, g, ConvolutionKind::MaxPlus, settings)
}

fn apply(
    engine: &impl Convolution,
    f: &Curve,
    g: &Curve,
    kind: ConvolutionKind,
) -> Result<Curve, ConvolutionError> {
    match kind {
        ConvolutionKind::MinPlus => engine.min_plus(f, g),
        ConvolutionKind::MaxPlus => engine.max_plus(f, g),
    }
}

pub(crate) fn check_max_plus_operands(f: &Curve, g: &Curve) -> Result<(), CurveError> {
    if f.is_right_continuous() && g.is_right_continuous() {
        Ok(())
    } else {
        Err(CurveError::InvalidCurveShape(
            "max-plus convolution needs right-continuous operands",
        ))
    }
}

/// The result when an operand makes the convolution trivial, before any
/// strategy runs.
///
/// For min-plus, a delay service curve `δ_T` shifts the other operand right
/// by `T`, holding its value at the origin; `δ_0` is the identity. For
/// either kind, a zero operand against a non-decreasing `g` gives the running
/// minimum `g(0)` (min-plus) or `g` itself (max-plus). Any other operand with
/// infinite values is rejected.
pub(crate) fn shortcut(
    f: &Curve,
    g: &Curve,
    kind: ConvolutionKind,
) -> Option<Result<Curve, CurveError>> {
    if kind == ConvolutionKind::MinPlus {
        match (f.delay_service_latency(), g.delay_service_latency()) {
            (Some(a), Some(b)) => return Some(generators::delay_service(a + b)),
            (Some(delay), None) => return Some(delayed(g, &delay)),
            (None, Some(delay)) => return Some(delayed(f, &delay)),
            (None, None) => {}
        }
    }
    if !(f.is_finite() && g.is_finite()) {
        return Some(Err(CurveError::InvalidCurveShape(
            "infinite values are only supported in delay service curves",
        )));
    }

    let other = if f.is_zero() {
        g
    } else if g.is_zero() {
        f
    } else {
        return None;
    };
    if !other.is_non_decreasing() {
        return None;
    }
    match kind {
        ConvolutionKind::MinPlus => Some(generators::constant(other.value_at(&Rational::zero()))),
        ConvolutionKind::MaxPlus => Some(Ok(other.clone())),
    }
}

// f ⊗ δ_T: the minimum of f over the last T, which for non-decreasing f is
// f delayed by T
fn delayed(f: &Curve, delay: &Rational) -> Result<Curve, CurveError> {
    if delay.is_zero() {
        return Ok(f.clone());
    }
    if !f.is_finite() {
        return Err(CurveError::InvalidCurveShape(
            "infinite values are only supported in delay service curves",
        ));
    }
    if !f.is_non_decreasing() {
        return Err(CurveError::InvalidCurveShape(
            "convolution with a positive delay needs a non-decreasing operand",
        ));
    }
    event!(Level::DEBUG, %delay, "convolution with a delay service curve");
    f.shift_right(delay)
}

/// Build the result curve from an envelope covering `[0, start + length)`
pub(crate) fn into_curve(
    envelope: Partial,
    start: Rational,
    length: Rational,
    height: Rational,
) -> Result<Curve, CurveError> {
    let horizon = &start + &length;
    let base = envelope.cut(&Rational::zero(), &horizon).into_sequence()?;
    Ok(Curve::new(base, start, length, height)?.simplify())
}

#[cfg(test)]
mod tests {
    use super::*;
    use upp_core::curve::generators::{delay_service, rate_latency, sigma_rho, zero};

    #[test]
    fn zero_operands_short_circuit() {
        let curve = sigma_rho(4, 2).unwrap();
        assert_eq!(
            shortcut(&zero(), &curve, ConvolutionKind::MaxPlus),
            Some(Ok(curve.clone()))
        );
        let min = shortcut(&curve, &zero(), ConvolutionKind::MinPlus).unwrap().unwrap();
        assert!(min.is_zero());
        assert_eq!(shortcut(&curve, &curve, ConvolutionKind::MinPlus), None);
        // Decreasing operands go the long way
        assert_eq!(
            shortcut(&zero(), &curve.negate(), ConvolutionKind::MinPlus),
            None
        );
    }

    #[test]
    fn delay_service_operands_short_circuit() {
        let curve = rate_latency(2, 1).unwrap();
        let identity = delay_service(0).unwrap();
        let same = shortcut(&identity, &curve, ConvolutionKind::MinPlus).unwrap().unwrap();
        assert_eq!(same, curve);

        let delayed = shortcut(&curve, &delay_service(3).unwrap(), ConvolutionKind::MinPlus)
            .unwrap()
            .unwrap();
        assert!(delayed.equivalent(&rate_latency(2, 4).unwrap()));

        let both = shortcut(&delay_service(1).unwrap(), &delay_service(2).unwrap(), ConvolutionKind::MinPlus)
            .unwrap()
            .unwrap();
        assert_eq!(both.delay_service_latency(), Some(Rational::from(3)));

        assert!(matches!(
            shortcut(&curve.negate(), &delay_service(1).unwrap(), ConvolutionKind::MinPlus),
            Some(Err(CurveError::InvalidCurveShape(_)))
        ));
        assert!(matches!(
            shortcut(&curve, &identity, ConvolutionKind::MaxPlus),
            Some(Err(CurveError::InvalidCurveShape(_)))
        ));
    }

    #[test]
    fn max_plus_rejects_jumps_to_the_right() {
        let jumpy = sigma_rho(4, 2).unwrap();
        let smooth = rate_latency(1, 1).unwrap();
        assert!(check_max_plus_operands(&smooth, &smooth).is_ok());
        assert_eq!(
            check_max_plus_operands(&smooth, &jumpy).unwrap_err(),
            CurveError::InvalidCurveShape("max-plus convolution needs right-continuous operands")
        );
    }
}
