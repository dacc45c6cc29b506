use crate::convolution::{into_curve, shortcut};
use crate::envelope::{Partial, lower_envelope};
use crate::impls::direct;
use crate::pairs::convolve_sequences;
use crate::term::Term;
use crate::{Convolution, ConvolutionError, ConvolutionKind, ConvolutionSettings, Strategy};
use tracing::{Level, event};
use upp_core::curve::MAX_UNROLLED_ELEMENTS;
use upp_core::{Curve, CurveError, Rational};

/// Convolution that splits both operands into transient and periodic parts.
///
/// The periodic part of one operand is convolved with a single period of the
/// other; its tail follows from shifted copies of that one result instead of
/// the full common period.
pub struct IsospeedConvolution(ConvolutionSettings);

impl Default for IsospeedConvolution {
    fn default() -> Self {
        Self(ConvolutionSettings::for_strategy(Strategy::Isospeed))
    }
}

impl Convolution for IsospeedConvolution {
    type Settings = ConvolutionSettings;

    fn new(settings: Self::Settings) -> Self {
        Self(settings)
    }

    fn min_plus(&self, f: &Curve, g: &Curve) -> Result<Curve, ConvolutionError> {
        if let Some(result) = shortcut(f, g, ConvolutionKind::MinPlus) {
            return Ok(result?);
        }
        // The longer period is the one cut to a single copy
        let (f, g) = if f.pseudo_period_length() <= g.pseudo_period_length() {
            (f, g)
        } else {
            (g, f)
        };
        Ok(isospeed(f, g, &self.0)?)
    }
}

/// Isospeed on minimised operands, with the roles picked by estimated cost
///
/// Minimising only pays off when an operand's representation is larger than
/// its function: a period made of repeated copies, or a transient that
/// already repeats. On operands that are minimal to begin with the result and
/// the work are those of [`IsospeedConvolution`], plus the cost of
/// `simplify`.
pub struct SuperIsospeedConvolution(ConvolutionSettings);

impl Default for SuperIsospeedConvolution {
    fn default() -> Self {
        Self(ConvolutionSettings::for_strategy(Strategy::SuperIsospeed))
    }
}

impl Convolution for SuperIsospeedConvolution {
    type Settings = ConvolutionSettings;

    fn new(settings: Self::Settings) -> Self {
        Self(settings)
    }

    fn min_plus(&self, f: &Curve, g: &Curve) -> Result<Curve, ConvolutionError> {
        if let Some(result) = shortcut(f, g, ConvolutionKind::MinPlus) {
            return Ok(result?);
        }
        let (f, g) = (f.simplify(), g.simplify());
        if f.pseudo_period_slope() != g.pseudo_period_slope() {
            return Ok(direct(&f, &g, &self.0)?);
        }

        let (forward, backward) = (cost(&f, &g), cost(&g, &f));
        event!(Level::DEBUG, %forward, %backward, "isospeed role costs");
        if backward < forward {
            Ok(isospeed(&g, &f, &self.0)?)
        } else {
            Ok(isospeed(&f, &g, &self.0)?)
        }
    }
}

// Element pairs in the periodic part when one period of `g` is used
fn cost(f: &Curve, g: &Curve) -> Rational {
    let (d_f, d_g) = (f.pseudo_period_length(), g.pseudo_period_length());
    let periods_of_f = (d_f + d_g) / d_f;
    Rational::from(f.periodic_elements().len())
        * periods_of_f
        * Rational::from(g.periodic_elements().len())
}

/// `f ⊗ g` for operands of equal long-run slope, using one period of `g`.
///
/// Falls back to the direct computation when the slopes differ.
pub(crate) fn isospeed(
    f: &Curve,
    g: &Curve,
    settings: &ConvolutionSettings,
) -> Result<Curve, CurveError> {
    let slope = f.pseudo_period_slope();
    if slope != g.pseudo_period_slope() {
        event!(Level::DEBUG, "slopes differ, convolving directly");
        return direct(f, g, settings);
    }

    let zero = Rational::zero();
    let (t_f, d_f, c_f) = (
        f.pseudo_period_start(),
        f.pseudo_period_length(),
        f.pseudo_period_height(),
    );
    let (t_g, d_g, c_g) = (
        g.pseudo_period_start(),
        g.pseudo_period_length(),
        g.pseudo_period_height(),
    );
    let from = t_f + t_g;
    let mut terms = Vec::with_capacity(3);

    // Transient of f against all of g
    if t_f.is_positive() {
        let horizon = &from + d_g;
        let partial =
            convolve_sequences(&f.cut(&zero, t_f)?, &g.cut(&zero, &horizon)?, &horizon, settings);
        terms.push(Term::new(partial, zero.clone(), from.clone(), d_g.clone(), c_g.clone()));
    }

    // Transient of g against all of f
    if t_g.is_positive() {
        let horizon = &from + d_f;
        let partial =
            convolve_sequences(&g.cut(&zero, t_g)?, &f.cut(&zero, &horizon)?, &horizon, settings);
        terms.push(Term::new(partial, zero.clone(), from.clone(), d_f.clone(), c_f.clone()));
    }

    terms.push(periodic_term(f, g, &from, settings)?);

    let length = terms
        .iter()
        .try_fold(terms[0].length().clone(), |length, term| {
            length.least_common_multiple(term.length())
        })?;
    let start = terms
        .iter()
        .map(|term| term.start().clone())
        .max()
        .unwrap_or_default();
    let height = &length * &slope;
    let horizon = &start + &length;
    event!(Level::DEBUG, terms = terms.len(), %start, %length, "isospeed convolution");

    let parts = terms
        .iter()
        .map(|term| term.unroll(&horizon))
        .collect::<Result<Vec<Partial>, CurveError>>()?;
    into_curve(
        lower_envelope(parts, settings.use_parallelism),
        start,
        length,
        height,
    )
}

// Periodic part of f against periodic part of g: one period of g gives a
// curve with f's period, whose copies shifted by g's period fill the tail
fn periodic_term(
    f: &Curve,
    g: &Curve,
    from: &Rational,
    settings: &ConvolutionSettings,
) -> Result<Term, CurveError> {
    let (t_f, d_f, c_f) = (
        f.pseudo_period_start(),
        f.pseudo_period_length(),
        f.pseudo_period_height(),
    );
    let (t_g, d_g, c_g) = (
        g.pseudo_period_start(),
        g.pseudo_period_length(),
        g.pseudo_period_height(),
    );

    let single_start = from + d_g;
    let single = convolve_sequences(
        &f.cut(t_f, &(t_f + d_g + d_f))?,
        &g.cut(t_g, &(t_g + d_g))?,
        &(&single_start + d_f),
        settings,
    );
    let single = Term::new(
        single,
        from.clone(),
        single_start,
        d_f.clone(),
        c_f.clone(),
    );

    let common = d_f.least_common_multiple(d_g)?;
    let horizon = from + &common + d_g;
    let unrolled = single.unroll(&horizon)?;
    let copies = (&common / d_g)
        .to_usize()
        .filter(|&n| {
            n.checked_mul(unrolled.elements().len())
                .is_some_and(|total| total <= MAX_UNROLLED_ELEMENTS)
        })
        .ok_or_else(|| CurveError::HorizonTooLarge(horizon.clone()))?;
    let shifted = (0..=copies)
        .map(|k| {
            let k = Rational::from(k);
            unrolled.translate(&(&k * d_g), &(&k * c_g))
        })
        .collect();

    Ok(Term::new(
        lower_envelope(shifted, settings.use_parallelism).cut(from, &horizon),
        from.clone(),
        from + &common,
        d_g.clone(),
        c_g.clone(),
    ))
}
