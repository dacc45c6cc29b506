use crate::convolution::{check_max_plus_operands, shortcut};
use crate::{
    Convolution, ConvolutionError, ConvolutionKind, ConvolutionSettings, Strategy,
    max_plus_convolution, min_plus_convolution,
};
use tracing::{Level, event};
use upp_core::{Curve, CurveError, Rational};

/// Convolution through pseudo-inverses.
///
/// `f ⊗ g` is the lower pseudo-inverse of the max-plus convolution of the
/// upper pseudo-inverses, and dually for `f ⊗̄ g`. The inner convolution runs
/// with the remaining flags of the settings.
pub struct InversionConvolution(ConvolutionSettings);

impl Default for InversionConvolution {
    fn default() -> Self {
        Self(ConvolutionSettings::for_strategy(Strategy::Inversion))
    }
}

impl Convolution for InversionConvolution {
    type Settings = ConvolutionSettings;

    fn new(settings: Self::Settings) -> Self {
        Self(settings)
    }

    fn min_plus(&self, f: &Curve, g: &Curve) -> Result<Curve, ConvolutionError> {
        if let Some(result) = shortcut(f, g, ConvolutionKind::MinPlus) {
            return Ok(result?);
        }
        check_operands(f, g)?;
        if !(f.is_left_continuous() && g.is_left_continuous()) {
            return Err(CurveError::InvalidCurveShape(
                "min-plus convolution by inversion needs left-continuous operands",
            )
            .into());
        }

        event!(Level::DEBUG, "min-plus convolution by inversion");
        let inner = self.0.without_inversion();
        let dual = max_plus_convolution(
            &f.upper_pseudo_inverse()?,
            &g.upper_pseudo_inverse()?,
            &inner,
        )?;
        Ok(dual.lower_pseudo_inverse()?.simplify())
    }

    fn max_plus(&self, f: &Curve, g: &Curve) -> Result<Curve, ConvolutionError> {
        check_max_plus_operands(f, g)?;
        if let Some(result) = shortcut(f, g, ConvolutionKind::MaxPlus) {
            return Ok(result?);
        }
        check_operands(f, g)?;

        event!(Level::DEBUG, "max-plus convolution by inversion");
        let inner = self.0.without_inversion();
        let dual = min_plus_convolution(
            &f.lower_pseudo_inverse()?,
            &g.lower_pseudo_inverse()?,
            &inner,
        )?;
        Ok(dual.upper_pseudo_inverse()?.simplify())
    }
}

// Both operands must be invertible and pass through the origin
fn check_operands(f: &Curve, g: &Curve) -> Result<(), CurveError> {
    if !(f.is_non_decreasing() && g.is_non_decreasing()) {
        return Err(CurveError::NotInvertible(
            "convolution by inversion needs non-decreasing operands",
        ));
    }
    let zero = Rational::zero();
    if !(f.value_at(&zero).is_zero() && g.value_at(&zero).is_zero()) {
        return Err(CurveError::InvalidCurveShape(
            "convolution by inversion needs operands that are zero at the origin",
        ));
    }
    Ok(())
}
