use crate::convolution::{into_curve, shortcut};
use crate::pairs::convolve_sequences;
use crate::{Convolution, ConvolutionError, ConvolutionKind, ConvolutionSettings, Strategy};
use tracing::{Level, event};
use upp_core::{Curve, CurveError, Element, Rational};

pub struct DirectConvolution(ConvolutionSettings);

impl Default for DirectConvolution {
    fn default() -> Self {
        Self(ConvolutionSettings::for_strategy(Strategy::Direct))
    }
}

impl Convolution for DirectConvolution {
    type Settings = ConvolutionSettings;

    fn new(settings: Self::Settings) -> Self {
        Self(settings)
    }

    fn min_plus(&self, f: &Curve, g: &Curve) -> Result<Curve, ConvolutionError> {
        if let Some(result) = shortcut(f, g, ConvolutionKind::MinPlus) {
            return Ok(result?);
        }
        Ok(direct(f, g, &self.0)?)
    }
}

/// Convolve every element pair up to the end of the result's first
/// pseudo-period
pub(crate) fn direct(
    f: &Curve,
    g: &Curve,
    settings: &ConvolutionSettings,
) -> Result<Curve, CurveError> {
    let (start, length, height) = descriptor(f, g)?;
    let horizon = &start + &length;
    event!(Level::DEBUG, %start, %length, %height, "direct convolution");

    let zero = Rational::zero();
    let envelope = convolve_sequences(
        &f.cut(&zero, &horizon)?,
        &g.cut(&zero, &horizon)?,
        &horizon,
        settings,
    );
    into_curve(envelope, start, length, height)
}

// (T, d, c) of f ⊗ g
fn descriptor(f: &Curve, g: &Curve) -> Result<(Rational, Rational, Rational), CurveError> {
    let length = f
        .pseudo_period_length()
        .least_common_multiple(g.pseudo_period_length())?;
    let (rho_f, rho_g) = (f.pseudo_period_slope(), g.pseudo_period_slope());

    if rho_f == rho_g {
        let start = f.pseudo_period_start() + g.pseudo_period_start() + &length;
        let height = &length * &rho_f;
        return Ok((start, length, height));
    }

    // The flatter operand dominates in the long run
    let (low, high) = if rho_f < rho_g { (f, g) } else { (g, f) };
    let start = low.pseudo_period_start() + &crossing_bound(low, high);
    let height = &length * &low.pseudo_period_slope();
    Ok((start, length, height))
}

// How far into `high` an optimal split can reach once `low` is periodic.
// Splits past it cost more than following `low` alone from the origin.
fn crossing_bound(low: &Curve, high: &Curve) -> Rational {
    let (rho_low, rho_high) = (low.pseudo_period_slope(), high.pseudo_period_slope());

    let max_low = offsets(low.periodic_elements(), &rho_low)
        .max()
        .unwrap_or_default();
    let min_low = offsets(low.base_sequence().elements(), &rho_low)
        .min()
        .unwrap_or_default();
    let min_high = offsets(high.base_sequence().elements(), &rho_high)
        .min()
        .unwrap_or_default();

    let slack = max_low + high.value_at(&Rational::zero()) - min_low - min_high;
    (slack / (rho_high - rho_low)).max(Rational::zero())
}

// `v - rate * t` over every corner
fn offsets<'a>(elements: &'a [Element], rate: &'a Rational) -> impl Iterator<Item = Rational> + 'a {
    elements
        .iter()
        .flat_map(Element::corner_points)
        .map(move |point| &point.value - &(rate * &point.time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use upp_core::curve::generators::{constant_jumps_staircase, rate_latency, sigma_rho};

    fn r(text: &str) -> Rational {
        text.parse().unwrap()
    }

    #[test]
    fn equal_slopes_use_the_common_period() {
        let f = constant_jumps_staircase(&[], &[r("2"), r("1")]).unwrap();
        let g = constant_jumps_staircase(&[], &[r("3"), r("3/2")]).unwrap();
        let (start, length, height) = descriptor(&f, &g).unwrap();
        assert_eq!(start, r("6"));
        assert_eq!(length, r("6"));
        assert_eq!(height, r("3"));
    }

    #[test]
    fn different_slopes_follow_the_flatter_operand() {
        let f = rate_latency(10, 11).unwrap();
        let g = sigma_rho(4, 2).unwrap();
        let (start, length, height) = descriptor(&f, &g).unwrap();
        assert_eq!(length, r("1"));
        assert_eq!(height, r("2"));
        assert!(start >= r("1"));
    }

    #[test]
    fn rate_latency_with_sigma_rho() {
        let f = rate_latency(10, 11).unwrap();
        let g = sigma_rho(4, 2).unwrap();
        let h = direct(&f, &g, &ConvolutionSettings::default()).unwrap();
        assert_eq!(h.value_at(&r("11")), r("0"));
        assert_eq!(h.value_at(&r("23/2")), r("5"));
        assert_eq!(h.value_at(&r("12")), r("6"));
        assert_eq!(h.value_at(&r("40")), r("62"));
        assert_eq!(h.pseudo_period_slope(), r("2"));
    }
}
