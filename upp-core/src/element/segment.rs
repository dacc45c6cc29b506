use crate::Rational;
use std::fmt;

/// A linear piece over the open interval `(start, end)`
///
/// The segment carries its right limit at `start` and a constant slope, so its
/// value at any interior `t` is `value_at_start + slope * (t - start)`. The
/// endpoints themselves are not part of the segment; a [`Sequence`](crate::Sequence)
/// places points there.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Segment {
    /// Left endpoint (excluded)
    pub start: Rational,
    /// Right endpoint (excluded)
    pub end: Rational,
    /// The right limit at `start`
    #[cfg_attr(feature = "serde", serde(rename = "rightLimitAtStartTime"))]
    pub value_at_start: Rational,
    /// Rate of change across the interval
    pub slope: Rational,
}

impl Segment {
    /// Construct a segment. Does not check that `start < end`; sequences do.
    pub fn new(
        start: impl Into<Rational>,
        end: impl Into<Rational>,
        value_at_start: impl Into<Rational>,
        slope: impl Into<Rational>,
    ) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            value_at_start: value_at_start.into(),
            slope: slope.into(),
        }
    }

    /// A flat segment
    pub fn constant(
        start: impl Into<Rational>,
        end: impl Into<Rational>,
        value: impl Into<Rational>,
    ) -> Self {
        Self::new(start, end, value, Rational::zero())
    }

    pub fn length(&self) -> Rational {
        &self.end - &self.start
    }

    /// The linear extension evaluated at `time`. Meaningful for `start <= time <= end`,
    /// where the endpoints give the one-sided limits.
    pub fn value_at(&self, time: &Rational) -> Rational {
        &self.value_at_start + &(&self.slope * &(time - &self.start))
    }

    /// The left limit at `end`
    pub fn left_limit_at_end(&self) -> Rational {
        &self.value_at_start + &(&self.slope * &self.length())
    }

    /// Whether `time` lies strictly inside the interval
    pub fn contains(&self, time: &Rational) -> bool {
        &self.start < time && time < &self.end
    }

    pub fn is_constant(&self) -> bool {
        self.slope.is_zero()
    }

    /// The same line over the sub-interval `(start, end)`.
    pub fn restrict(&self, start: &Rational, end: &Rational) -> Self {
        Self {
            start: start.clone(),
            end: end.clone(),
            value_at_start: self.value_at(start),
            slope: self.slope.clone(),
        }
    }

    /// Shift the segment right by `time` and up by `value`.
    pub fn translate(&self, time: &Rational, value: &Rational) -> Self {
        Self {
            start: &self.start + time,
            end: &self.end + time,
            value_at_start: &self.value_at_start + value,
            slope: self.slope.clone(),
        }
    }

    /// Mirror the segment across the time axis.
    pub fn negate(&self) -> Self {
        Self {
            start: self.start.clone(),
            end: self.end.clone(),
            value_at_start: -&self.value_at_start,
            slope: -&self.slope,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Segment({}, {}, {}, {})",
            self.start, self.end, self.value_at_start, self.slope
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(text: &str) -> Rational {
        text.parse().unwrap()
    }

    #[test]
    fn evaluation() {
        let s = Segment::new(1, 4, 2, r("1/2"));
        assert_eq!(s.length(), r("3"));
        assert_eq!(s.value_at(&r("2")), r("5/2"));
        assert_eq!(s.left_limit_at_end(), r("7/2"));
        assert!(s.contains(&r("3")));
        assert!(!s.contains(&r("4")));
        assert!(!s.contains(&r("1")));
    }

    #[test]
    fn restrict_keeps_the_line() {
        let s = Segment::new(0, 10, 1, 2);
        let t = s.restrict(&r("3"), &r("5"));
        assert_eq!(t, Segment::new(3, 5, 7, 2));
        assert_eq!(t.left_limit_at_end(), s.value_at(&r("5")));
    }

    #[test]
    fn translate_and_negate() {
        let s = Segment::new(0, 2, 1, -3).translate(&r("1"), &r("1"));
        assert_eq!(s, Segment::new(1, 3, 2, -3));
        assert_eq!(s.negate(), Segment::new(1, 3, -2, 3));
    }
}
