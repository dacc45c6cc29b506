use crate::{Curve, CurveError, Element, Point, Rational, Segment, Sequence};

/// The curve that is zero everywhere
pub fn zero() -> Curve {
    // A constant is always well-formed
    match constant(Rational::zero()) {
        Ok(curve) => curve,
        Err(err) => unreachable!("{err}"),
    }
}

/// The curve equal to `value` everywhere, origin included
pub fn constant(value: impl Into<Rational>) -> Result<Curve, CurveError> {
    let value = value.into();
    let base = Sequence::new(vec![
        Point::new(0, value.clone()).into(),
        Segment::constant(0, 1, value).into(),
    ])?;
    Curve::new(base, 0, 1, 0)
}

/// `rate * max(0, t - latency)`: zero up to `latency`, then growing at `rate`
pub fn rate_latency(
    rate: impl Into<Rational>,
    latency: impl Into<Rational>,
) -> Result<Curve, CurveError> {
    let rate = rate.into();
    let latency = latency.into();
    if rate.is_negative() || latency.is_negative() {
        return Err(CurveError::InvalidParameter(format!(
            "rate-latency needs non-negative parameters, got rate {rate} and latency {latency}"
        )));
    }

    let one = Rational::one();
    let mut elements: Vec<Element> = vec![Point::origin().into()];
    if latency.is_positive() {
        elements.push(Segment::constant(0, &latency, 0).into());
        elements.push(Point::new(&latency, 0).into());
    }
    elements.push(Segment::new(&latency, &latency + &one, 0, &rate).into());

    Curve::new(Sequence::new(elements)?, latency, one, rate)
}

/// `sigma + rho * t` for `t > 0`, zero at the origin
pub fn sigma_rho(sigma: impl Into<Rational>, rho: impl Into<Rational>) -> Result<Curve, CurveError> {
    let sigma = sigma.into();
    let rho = rho.into();
    if sigma.is_negative() || rho.is_negative() {
        return Err(CurveError::InvalidParameter(format!(
            "sigma-rho needs non-negative parameters, got sigma {sigma} and rho {rho}"
        )));
    }

    // The jump at the origin cannot repeat, so the period starts at 1
    let after_one = &sigma + &rho;
    let base = Sequence::new(vec![
        Point::origin().into(),
        Segment::new(0, 1, &sigma, &rho).into(),
        Point::new(1, &after_one).into(),
        Segment::new(1, 2, after_one, &rho).into(),
    ])?;
    Curve::new(base, 1, 1, rho)
}

/// The delay service curve `δ_T`: zero on `[0, T]`, `+inf` afterwards
///
/// `δ_0` is the neutral element of min-plus convolution, and `f ⊗ δ_T` is `f`
/// delayed by `T` for non-decreasing `f`.
pub fn delay_service(delay: impl Into<Rational>) -> Result<Curve, CurveError> {
    let delay = delay.into();
    if delay.is_negative() || !delay.is_finite() {
        return Err(CurveError::InvalidParameter(format!(
            "delay service needs a finite, non-negative delay, got {delay}"
        )));
    }

    let infinity = Rational::PLUS_INFINITY;
    let one = Rational::one();
    let after = &delay + &one;
    let mut elements: Vec<Element> = vec![Point::origin().into()];
    if delay.is_positive() {
        elements.push(Segment::constant(0, &delay, 0).into());
        elements.push(Point::new(&delay, 0).into());
    }
    elements.push(Segment::constant(&delay, &after, infinity.clone()).into());
    elements.push(Point::new(&after, infinity.clone()).into());
    elements.push(Segment::constant(&after, &after + &one, infinity).into());

    Curve::new(Sequence::new(elements)?, after, one, 0)
}

// Running state of a staircase under construction
struct Stairs {
    elements: Vec<Element>,
    time: Rational,
    value: Rational,
}

impl Stairs {
    fn new() -> Self {
        Self {
            elements: Vec::new(),
            time: Rational::zero(),
            value: Rational::zero(),
        }
    }

    // A point at the current corner, then a segment of `length` starting `jump` higher
    fn step(mut self, length: &Rational, jump: &Rational, slope: &Rational) -> Self {
        let segment = Segment::new(
            self.time.clone(),
            &self.time + length,
            &self.value + jump,
            slope,
        );
        self.elements
            .push(Point::new(self.time.clone(), self.value.clone()).into());
        self.time = segment.end.clone();
        self.value = segment.left_limit_at_end();
        self.elements.push(segment.into());
        self
    }

    // Record where the periodic part begins
    fn mark(self) -> (Self, Rational, Rational) {
        let (time, value) = (self.time.clone(), self.value.clone());
        (self, time, value)
    }

    fn finish(self, start: Rational, start_value: Rational) -> Result<Curve, CurveError> {
        let length = &self.time - &start;
        let height = &self.value - &start_value;
        Curve::new(Sequence::new(self.elements)?, start, length, height)
    }
}

fn check_parameters(
    name: &str,
    transient: &[Rational],
    transient_ok: bool,
    periodic: &[Rational],
    periodic_ok: bool,
) -> Result<(), CurveError> {
    if !transient_ok {
        return Err(CurveError::InvalidParameter(format!(
            "{name}: invalid number of transient parameters: {}",
            transient.len()
        )));
    }
    if !periodic_ok || periodic.is_empty() {
        return Err(CurveError::InvalidParameter(format!(
            "{name}: invalid number of periodic parameters: {}",
            periodic.len()
        )));
    }
    if transient.iter().chain(periodic).any(|p| !p.is_positive() || !p.is_finite()) {
        return Err(CurveError::InvalidParameter(format!(
            "{name}: all parameters must be strictly positive"
        )));
    }
    Ok(())
}

/// A left-continuous staircase that jumps right after each step starts and
/// stays flat.
///
/// `transient` is empty or holds `1 + 2n` values: the length of an initial
/// flat step at zero, then `(length, jump)` pairs. `periodic` holds `2n, n > 0`
/// values of `(length, jump)` pairs; one pass over them is a pseudo-period.
pub fn constant_jumps_staircase(
    transient: &[Rational],
    periodic: &[Rational],
) -> Result<Curve, CurveError> {
    check_parameters(
        "constant-jumps staircase",
        transient,
        transient.is_empty() || transient.len() % 2 == 1,
        periodic,
        periodic.len() % 2 == 0,
    )?;
    let zero = Rational::zero();

    let stairs = match transient.split_first() {
        Some((first, rest)) => rest
            .chunks_exact(2)
            .fold(Stairs::new().step(first, &zero, &zero), |stairs, pair| {
                stairs.step(&pair[0], &pair[1], &zero)
            }),
        None => Stairs::new(),
    };
    let (stairs, start, start_value) = stairs.mark();
    periodic
        .chunks_exact(2)
        .fold(stairs, |stairs, pair| stairs.step(&pair[0], &pair[1], &zero))
        .finish(start, start_value)
}

/// A staircase whose steps jump and then rise linearly.
///
/// `transient` is empty or holds `2 + 3n` values: `(length, slope)` of an
/// initial ramp from zero, then `(length, jump, slope)` triples. `periodic`
/// holds `3n, n > 0` values of `(length, jump, slope)` triples.
pub fn many_jumps_staircase(
    transient: &[Rational],
    periodic: &[Rational],
) -> Result<Curve, CurveError> {
    check_parameters(
        "many-jumps staircase",
        transient,
        transient.is_empty() || (transient.len() >= 2 && (transient.len() - 2) % 3 == 0),
        periodic,
        periodic.len() % 3 == 0,
    )?;
    let zero = Rational::zero();

    let stairs = match transient {
        [length, slope, rest @ ..] => rest.chunks_exact(3).fold(
            Stairs::new().step(length, &zero, slope),
            |stairs, triple| stairs.step(&triple[0], &triple[1], &triple[2]),
        ),
        _ => Stairs::new(),
    };
    let (stairs, start, start_value) = stairs.mark();
    periodic
        .chunks_exact(3)
        .fold(stairs, |stairs, triple| {
            stairs.step(&triple[0], &triple[1], &triple[2])
        })
        .finish(start, start_value)
}

/// A continuous staircase alternating linear rises and flat stretches.
///
/// Both lists hold `(rise length, rise slope, flat length)` triples;
/// `transient` may be empty, `periodic` may not.
pub fn many_constants_staircase(
    transient: &[Rational],
    periodic: &[Rational],
) -> Result<Curve, CurveError> {
    check_parameters(
        "many-constants staircase",
        transient,
        transient.len() % 3 == 0,
        periodic,
        periodic.len() % 3 == 0,
    )?;
    let zero = Rational::zero();
    let rise_then_rest = |stairs: Stairs, triple: &[Rational]| {
        stairs
            .step(&triple[0], &zero, &triple[1])
            .step(&triple[2], &zero, &zero)
    };

    let stairs = transient.chunks_exact(3).fold(Stairs::new(), rise_then_rest);
    let (stairs, start, start_value) = stairs.mark();
    periodic
        .chunks_exact(3)
        .fold(stairs, rise_then_rest)
        .finish(start, start_value)
}
