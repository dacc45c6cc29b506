use crate::Rational;
use std::fmt;

/// The value of a curve at a single instant
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point {
    /// The instant
    pub time: Rational,
    /// The value at that instant
    pub value: Rational,
}

impl Point {
    pub fn new(time: impl Into<Rational>, value: impl Into<Rational>) -> Self {
        Self {
            time: time.into(),
            value: value.into(),
        }
    }

    /// The point `(0, 0)`
    pub fn origin() -> Self {
        Self::new(Rational::zero(), Rational::zero())
    }

    /// Shift the point right by `time` and up by `value`.
    pub fn translate(&self, time: &Rational, value: &Rational) -> Self {
        Self {
            time: &self.time + time,
            value: &self.value + value,
        }
    }

    /// Mirror the point across the time axis.
    pub fn negate(&self) -> Self {
        Self {
            time: self.time.clone(),
            value: -&self.value,
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point({}, {})", self.time, self.value)
    }
}
