use crate::{Element, Point, Rational, RationalError, Segment, Sequence, SequenceError};
use std::fmt;
use std::sync::OnceLock;
use thiserror::Error;

/// Closed-form constructors for the common curve families
pub mod generators;

mod equivalence;
pub use equivalence::equivalent;

mod closure;
mod inverse;
mod simplify;
mod text;

/// The most elements a single cut or unroll may materialise
pub const MAX_UNROLLED_ELEMENTS: usize = 1 << 24;

/// Reserves room for `count` unrolled elements, reporting `horizon` as too
/// large when the count overflowed or exceeds [`MAX_UNROLLED_ELEMENTS`].
pub fn reserve_unrolled(
    elements: &mut Vec<Element>,
    count: Option<usize>,
    horizon: &Rational,
) -> Result<(), CurveError> {
    let too_large = || CurveError::HorizonTooLarge(horizon.clone());
    let count = count
        .filter(|&n| n <= MAX_UNROLLED_ELEMENTS)
        .ok_or_else(too_large)?;
    elements.try_reserve(count).map_err(|_| too_large())
}

/// An ultimately pseudo-periodic, piecewise-linear function on `[0, +inf)`
///
/// The curve is given by a base sequence covering `[0, T + d)` and the
/// pseudo-period descriptor `(T, d, c)`: for every `t >= T`,
/// `f(t + d) = f(t) + c`. Values beyond the base sequence are never stored;
/// they are folded back into the first pseudo-period on demand.
///
/// Curves are validated once, at construction, and immutable afterwards.
/// Shape predicates are computed on first use and cached.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "CurveDto", into = "CurveDto"))]
pub struct Curve {
    base_sequence: Sequence,
    pseudo_period_start: Rational,
    pseudo_period_length: Rational,
    pseudo_period_height: Rational,
    // Index of the point at `pseudo_period_start` within the base sequence
    periodic_index: usize,
    right_continuous: OnceLock<bool>,
    left_continuous: OnceLock<bool>,
    non_decreasing: OnceLock<bool>,
}

/// The ways curve construction and curve operations can fail
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurveError {
    /// The base sequence is not a valid sequence
    #[error("malformed curve: {0}")]
    MalformedSequence(#[from] SequenceError),

    /// The base sequence and pseudo-period descriptor do not describe a curve
    #[error("malformed curve: {0}")]
    MalformedCurve(&'static str),

    /// The operation needs a shape (continuity, value at the origin) the curve lacks
    #[error("invalid curve shape: {0}")]
    InvalidCurveShape(&'static str),

    /// A pseudo-inverse was requested for a curve that has none
    #[error("curve is not invertible: {0}")]
    NotInvertible(&'static str),

    /// No bound of the requested family exists for the curve
    #[error("curve cannot be upper-bounded: {0}")]
    NonUpperBoundable(&'static str),

    /// A generator or operation received an argument outside its domain
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The elements needed to reach a horizon exceed [`MAX_UNROLLED_ELEMENTS`]
    #[error("horizon {0} is too large to materialise")]
    HorizonTooLarge(Rational),

    /// The text form of a curve could not be read back
    #[error("cannot parse curve text: {0}")]
    Parse(String),

    #[error(transparent)]
    Rational(#[from] RationalError),
}

impl Curve {
    /// Creates a new curve, validating all constraints
    ///
    /// The base sequence must start at time zero and end with a segment at
    /// `pseudo_period_start + pseudo_period_length`; the length must be
    /// positive and the start non-negative. A segment straddling the
    /// pseudo-period start is split there.
    pub fn new(
        base_sequence: Sequence,
        pseudo_period_start: impl Into<Rational>,
        pseudo_period_length: impl Into<Rational>,
        pseudo_period_height: impl Into<Rational>,
    ) -> Result<Self, CurveError> {
        let start = pseudo_period_start.into();
        let length = pseudo_period_length.into();
        let height = pseudo_period_height.into();

        if !(start.is_finite() && length.is_finite() && height.is_finite()) {
            return Err(CurveError::MalformedCurve(
                "pseudo-period descriptor must be finite",
            ));
        }
        if start.is_negative() {
            return Err(CurveError::MalformedCurve(
                "pseudo-period start must not be negative",
            ));
        }
        if !length.is_positive() {
            return Err(CurveError::MalformedCurve(
                "pseudo-period length must be positive",
            ));
        }
        if !base_sequence.start().is_zero() {
            return Err(CurveError::MalformedCurve(
                "base sequence must start at time zero",
            ));
        }
        if !base_sequence.is_right_open() || base_sequence.end() != &(&start + &length) {
            return Err(CurveError::MalformedCurve(
                "base sequence must end with a segment at the end of the first pseudo-period",
            ));
        }

        let base_sequence = base_sequence.split_at(&start);
        let periodic_index = base_sequence
            .locate(&start)
            .ok_or(CurveError::MalformedCurve(
                "pseudo-period start is not covered by the base sequence",
            ))?;

        Ok(Self {
            base_sequence,
            pseudo_period_start: start,
            pseudo_period_length: length,
            pseudo_period_height: height,
            periodic_index,
            right_continuous: OnceLock::new(),
            left_continuous: OnceLock::new(),
            non_decreasing: OnceLock::new(),
        })
    }

    /// The elements covering `[0, T + d)`
    pub fn base_sequence(&self) -> &Sequence {
        &self.base_sequence
    }

    /// `T`: the time from which the curve repeats
    pub fn pseudo_period_start(&self) -> &Rational {
        &self.pseudo_period_start
    }

    /// `d`: the length of one pseudo-period
    pub fn pseudo_period_length(&self) -> &Rational {
        &self.pseudo_period_length
    }

    /// `c`: the growth over one pseudo-period
    pub fn pseudo_period_height(&self) -> &Rational {
        &self.pseudo_period_height
    }

    /// `c / d`: the long-run growth rate
    pub fn pseudo_period_slope(&self) -> Rational {
        &self.pseudo_period_height / &self.pseudo_period_length
    }

    /// `T + d`
    pub fn first_period_end(&self) -> Rational {
        &self.pseudo_period_start + &self.pseudo_period_length
    }

    /// The elements before `T`
    pub fn transient_elements(&self) -> &[Element] {
        &self.base_sequence.elements()[..self.periodic_index]
    }

    /// The elements covering `[T, T + d)`, starting with the point at `T`
    pub fn periodic_elements(&self) -> &[Element] {
        &self.base_sequence.elements()[self.periodic_index..]
    }

    /// Whether the curve has no transient part
    pub fn is_purely_periodic(&self) -> bool {
        self.pseudo_period_start.is_zero()
    }

    // Splits a time at or past `T + d` into a position inside the first
    // pseudo-period and the number of whole periods folded away.
    fn fold(&self, time: &Rational) -> (Rational, Rational) {
        if time < &self.first_period_end() {
            return (time.clone(), Rational::zero());
        }
        let periods = ((time - &self.pseudo_period_start) / &self.pseudo_period_length).floor();
        (time - &(&periods * &self.pseudo_period_length), periods)
    }

    /// The value at `time`
    ///
    /// # Panics
    ///
    /// Curves are defined on `[0, +inf)`; a negative or infinite `time` panics.
    pub fn value_at(&self, time: &Rational) -> Rational {
        assert!(
            time.is_finite() && !time.is_negative(),
            "curves are defined on [0, +inf), got {time}"
        );
        let (position, periods) = self.fold(time);
        match self.base_sequence.value_at(&position) {
            Some(value) => value + &periods * &self.pseudo_period_height,
            None => unreachable!("base sequence covers the first pseudo-period"),
        }
    }

    /// The limit from the right at `time`
    ///
    /// # Panics
    ///
    /// A negative or infinite `time` panics.
    pub fn right_limit_at(&self, time: &Rational) -> Rational {
        assert!(
            time.is_finite() && !time.is_negative(),
            "curves are defined on [0, +inf), got {time}"
        );
        let (position, periods) = self.fold(time);
        match self.base_sequence.right_limit_at(&position) {
            Some(value) => value + &periods * &self.pseudo_period_height,
            None => unreachable!("base sequence ends with a segment"),
        }
    }

    /// The limit from the left at `time`
    ///
    /// # Panics
    ///
    /// There is no left limit at the origin: `time` must be positive and finite.
    pub fn left_limit_at(&self, time: &Rational) -> Rational {
        assert!(
            time.is_finite() && time.is_positive(),
            "left limits need a positive time, got {time}"
        );
        let (position, periods) = if time <= &self.first_period_end() {
            (time.clone(), Rational::zero())
        } else {
            let periods = ((time - &self.pseudo_period_start) / &self.pseudo_period_length).ceil()
                - Rational::one();
            (time - &(&periods * &self.pseudo_period_length), periods)
        };
        match self.base_sequence.left_limit_at(&position) {
            Some(value) => value + &periods * &self.pseudo_period_height,
            None => unreachable!("base sequence covers the first pseudo-period"),
        }
    }

    // f(T), and f(T + d) = f(T) + c
    fn value_at_period_start(&self) -> &Rational {
        match &self.base_sequence.elements()[self.periodic_index] {
            Element::Point(point) => &point.value,
            Element::Segment(segment) => &segment.value_at_start,
        }
    }

    fn value_at_period_end(&self) -> Rational {
        self.value_at_period_start() + &self.pseudo_period_height
    }

    fn closing_left_limit(&self) -> Rational {
        match self.base_sequence.elements().last() {
            Some(Element::Segment(segment)) => segment.left_limit_at_end(),
            _ => unreachable!("base sequence ends with a segment"),
        }
    }

    /// Whether every point agrees with the segment to its right
    pub fn is_right_continuous(&self) -> bool {
        *self.right_continuous.get_or_init(|| {
            self.base_sequence
                .elements()
                .windows(2)
                .all(|pair| match pair {
                    [Element::Point(point), Element::Segment(segment)] => {
                        point.value == segment.value_at_start
                    }
                    _ => true,
                })
        })
    }

    /// Whether every point agrees with the segment to its left, including the
    /// point at `T + d` implied by periodicity
    pub fn is_left_continuous(&self) -> bool {
        *self.left_continuous.get_or_init(|| {
            let inner = self
                .base_sequence
                .elements()
                .windows(2)
                .all(|pair| match pair {
                    [Element::Segment(segment), Element::Point(point)] => {
                        segment.left_limit_at_end() == point.value
                    }
                    _ => true,
                });
            inner && self.closing_left_limit() == self.value_at_period_end()
        })
    }

    pub fn is_continuous(&self) -> bool {
        self.is_left_continuous() && self.is_right_continuous()
    }

    /// Whether `s <= t` implies `f(s) <= f(t)`
    pub fn is_non_decreasing(&self) -> bool {
        *self.non_decreasing.get_or_init(|| {
            let elements = self.base_sequence.elements();
            let slopes = self.base_sequence.segments().all(|s| !s.slope.is_negative());
            let joints = elements.windows(2).all(|pair| match pair {
                [Element::Point(point), Element::Segment(segment)] => {
                    point.value <= segment.value_at_start
                }
                [Element::Segment(segment), Element::Point(point)] => {
                    segment.left_limit_at_end() <= point.value
                }
                _ => true,
            });
            slopes && joints && self.closing_left_limit() <= self.value_at_period_end()
        })
    }

    /// Whether the curve is zero everywhere
    pub fn is_zero(&self) -> bool {
        self.pseudo_period_height.is_zero()
            && self.base_sequence.elements().iter().all(|e| match e {
                Element::Point(point) => point.value.is_zero(),
                Element::Segment(segment) => {
                    segment.value_at_start.is_zero() && segment.slope.is_zero()
                }
            })
    }

    /// Whether no value is `+inf`
    pub fn is_finite(&self) -> bool {
        self.base_sequence.elements().iter().all(Element::is_finite)
    }

    /// The latency `T` when this is the delay service curve `δ_T`: zero on
    /// `[0, T]` and `+inf` afterwards.
    pub fn delay_service_latency(&self) -> Option<Rational> {
        let infinite = |e: &Element| match e {
            Element::Point(point) => point.value.is_plus_infinite(),
            Element::Segment(segment) => segment.value_at_start.is_plus_infinite(),
        };
        let elements = self.base_sequence.elements();
        let split = elements.iter().position(infinite)?;
        let zero_before = elements[..split].iter().all(|e| match e {
            Element::Point(point) => point.value.is_zero(),
            Element::Segment(segment) => {
                segment.value_at_start.is_zero() && segment.is_constant()
            }
        });
        // Periodic repeats of a finite piece would bring finite values back
        let infinite_after = self.periodic_index >= split && elements[split..].iter().all(infinite);
        match &elements[split] {
            Element::Segment(segment) if zero_before && infinite_after => {
                Some(segment.start.clone())
            }
            _ => None,
        }
    }

    /// The curve over the right-open interval `[start, end)`, unrolling as
    /// many pseudo-periods as needed.
    pub fn cut(&self, start: &Rational, end: &Rational) -> Result<Sequence, CurveError> {
        if start.is_negative() || start >= end || !end.is_finite() {
            return Err(CurveError::InvalidParameter(format!(
                "cannot cut a curve to [{start}, {end})"
            )));
        }

        let period_end = self.first_period_end();
        if end <= &period_end {
            return Ok(self.base_sequence.cut(start, end)?);
        }

        let last = ((end - &period_end) / &self.pseudo_period_length)
            .ceil()
            .to_usize()
            .ok_or_else(|| CurveError::HorizonTooLarge(end.clone()))?;

        // Start from the base sequence, or skip straight to the period holding `start`
        let (mut elements, first) = if start < &period_end {
            (self.base_sequence.elements().to_vec(), 1)
        } else {
            let first = ((start - &self.pseudo_period_start) / &self.pseudo_period_length)
                .floor()
                .to_usize()
                .ok_or_else(|| CurveError::HorizonTooLarge(start.clone()))?;
            (Vec::new(), first)
        };

        let periodic = self.periodic_elements();
        let count = last
            .checked_add(1)
            .and_then(|n| n.checked_sub(first))
            .and_then(|n| n.checked_mul(periodic.len()));
        reserve_unrolled(&mut elements, count, end)?;
        for k in first..=last {
            let k = Rational::from(k);
            let time = &k * &self.pseudo_period_length;
            let value = &k * &self.pseudo_period_height;
            elements.extend(periodic.iter().map(|e| e.translate(&time, &value)));
        }

        Ok(Sequence::new(elements)?.cut(start, end)?)
    }

    /// The curve shifted right by `delay`: zero on `[0, delay)` and
    /// `f(t - delay)` from `delay` on.
    pub fn delay_by(&self, delay: &Rational) -> Result<Curve, CurveError> {
        self.prepend_constant(delay, Rational::zero())
    }

    /// The curve shifted right by `delay`, holding `f(0)` on `[0, delay)`.
    ///
    /// For a non-decreasing curve this is its min-plus convolution with the
    /// delay service curve of latency `delay`.
    pub fn shift_right(&self, delay: &Rational) -> Result<Curve, CurveError> {
        self.prepend_constant(delay, self.value_at(&Rational::zero()))
    }

    fn prepend_constant(&self, delay: &Rational, value: Rational) -> Result<Curve, CurveError> {
        if delay.is_negative() || !delay.is_finite() {
            return Err(CurveError::InvalidParameter(format!(
                "delay must be finite and non-negative, got {delay}"
            )));
        }
        if delay.is_zero() {
            return Ok(self.clone());
        }

        let zero = Rational::zero();
        let mut elements: Vec<Element> = vec![
            Point::new(zero.clone(), value.clone()).into(),
            Segment::constant(zero.clone(), delay, value).into(),
        ];
        elements.extend(
            self.base_sequence
                .elements()
                .iter()
                .map(|e| e.translate(delay, &zero)),
        );

        Curve::new(
            Sequence::new(elements)?,
            &self.pseudo_period_start + delay,
            self.pseudo_period_length.clone(),
            self.pseudo_period_height.clone(),
        )
    }

    /// The pointwise negation `-f`
    pub fn negate(&self) -> Curve {
        Self {
            base_sequence: self.base_sequence.negate(),
            pseudo_period_start: self.pseudo_period_start.clone(),
            pseudo_period_length: self.pseudo_period_length.clone(),
            pseudo_period_height: -&self.pseudo_period_height,
            periodic_index: self.periodic_index,
            right_continuous: self.right_continuous.clone(),
            left_continuous: self.left_continuous.clone(),
            non_decreasing: OnceLock::new(),
        }
    }
}

impl PartialEq for Curve {
    /// Representation equality; see [`Curve::equivalent`] for value equality.
    fn eq(&self, other: &Self) -> bool {
        self.base_sequence == other.base_sequence
            && self.pseudo_period_start == other.pseudo_period_start
            && self.pseudo_period_length == other.pseudo_period_length
            && self.pseudo_period_height == other.pseudo_period_height
    }
}

impl Eq for Curve {}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Curve({}, {}, {}, {})",
            self.base_sequence,
            self.pseudo_period_start,
            self.pseudo_period_length,
            self.pseudo_period_height
        )
    }
}

/// The wire form of a [`Curve`]
#[cfg(feature = "serde")]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurveDto {
    base_sequence: Sequence,
    pseudo_period_start: Rational,
    pseudo_period_length: Rational,
    pseudo_period_height: Rational,
}

#[cfg(feature = "serde")]
impl TryFrom<CurveDto> for Curve {
    type Error = CurveError;

    fn try_from(value: CurveDto) -> Result<Self, Self::Error> {
        Self::new(
            value.base_sequence,
            value.pseudo_period_start,
            value.pseudo_period_length,
            value.pseudo_period_height,
        )
    }
}

#[cfg(feature = "serde")]
impl From<Curve> for CurveDto {
    fn from(value: Curve) -> Self {
        Self {
            base_sequence: value.base_sequence,
            pseudo_period_start: value.pseudo_period_start,
            pseudo_period_length: value.pseudo_period_length,
            pseudo_period_height: value.pseudo_period_height,
        }
    }
}
