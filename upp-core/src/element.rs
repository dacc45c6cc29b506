use crate::Rational;
use std::fmt;

mod point;
pub use point::Point;

mod segment;
pub use segment::Segment;

/// One piece of a sequence: either a point or an open segment
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "camelCase"))]
pub enum Element {
    Point(Point),
    Segment(Segment),
}

impl Element {
    /// The first instant covered (or bounded, for a segment)
    pub fn start(&self) -> &Rational {
        match self {
            Self::Point(point) => &point.time,
            Self::Segment(segment) => &segment.start,
        }
    }

    /// The last instant covered (or bounded, for a segment)
    pub fn end(&self) -> &Rational {
        match self {
            Self::Point(point) => &point.time,
            Self::Segment(segment) => &segment.end,
        }
    }

    pub fn is_point(&self) -> bool {
        matches!(self, Self::Point(_))
    }

    pub fn is_segment(&self) -> bool {
        matches!(self, Self::Segment(_))
    }

    /// Shift the element right by `time` and up by `value`.
    pub fn translate(&self, time: &Rational, value: &Rational) -> Self {
        match self {
            Self::Point(point) => Self::Point(point.translate(time, value)),
            Self::Segment(segment) => Self::Segment(segment.translate(time, value)),
        }
    }

    /// Mirror the element across the time axis.
    pub fn negate(&self) -> Self {
        match self {
            Self::Point(point) => Self::Point(point.negate()),
            Self::Segment(segment) => Self::Segment(segment.negate()),
        }
    }

    /// The values an element attains or approaches: a point yields itself, a
    /// segment its right limit at `start` and its left limit at `end`.
    ///
    /// Extremes of any linear functional over an element are found among these.
    pub fn corner_points(&self) -> Vec<Point> {
        match self {
            Self::Point(point) => vec![point.clone()],
            Self::Segment(segment) => vec![
                Point {
                    time: segment.start.clone(),
                    value: segment.value_at_start.clone(),
                },
                Point {
                    time: segment.end.clone(),
                    value: segment.left_limit_at_end(),
                },
            ],
        }
    }

    /// The largest value attained or approached, for non-decreasing pieces
    pub(crate) fn last_value(&self) -> Rational {
        match self {
            Self::Point(point) => point.value.clone(),
            Self::Segment(segment) => segment.left_limit_at_end(),
        }
    }

    /// Finite times and slopes. Values are finite, or `+inf` on points and
    /// flat segments.
    pub(crate) fn is_well_formed(&self) -> bool {
        let value = |v: &Rational| v.is_finite() || v.is_plus_infinite();
        match self {
            Self::Point(point) => point.time.is_finite() && value(&point.value),
            Self::Segment(segment) => {
                segment.start.is_finite()
                    && segment.end.is_finite()
                    && segment.slope.is_finite()
                    && (segment.value_at_start.is_finite()
                        || (segment.value_at_start.is_plus_infinite() && segment.is_constant()))
            }
        }
    }

    pub(crate) fn is_finite(&self) -> bool {
        match self {
            Self::Point(point) => point.time.is_finite() && point.value.is_finite(),
            Self::Segment(segment) => {
                segment.start.is_finite()
                    && segment.end.is_finite()
                    && segment.value_at_start.is_finite()
                    && segment.slope.is_finite()
            }
        }
    }
}

impl From<Point> for Element {
    fn from(value: Point) -> Self {
        Self::Point(value)
    }
}

impl From<Segment> for Element {
    fn from(value: Segment) -> Self {
        Self::Segment(value)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point(point) => fmt::Display::fmt(point, f),
            Self::Segment(segment) => fmt::Display::fmt(segment, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_of_a_segment() {
        let element = Element::from(Segment::new(1, 3, 2, 5));
        assert_eq!(
            element.corner_points(),
            vec![Point::new(1, 2), Point::new(3, 12)]
        );
        assert_eq!(element.start(), &Rational::from(1));
        assert_eq!(element.end(), &Rational::from(3));
    }

    #[test]
    fn infinite_values_only_where_flat() {
        let infinity = Rational::PLUS_INFINITY;
        assert!(Element::from(Point::new(1, infinity.clone())).is_well_formed());
        assert!(Element::from(Segment::constant(1, 2, infinity.clone())).is_well_formed());
        assert!(!Element::from(Segment::new(1, 2, infinity.clone(), 1)).is_well_formed());
        assert!(!Element::from(Point::new(1, Rational::MINUS_INFINITY)).is_well_formed());
        assert!(!Element::from(Point::new(infinity.clone(), 0)).is_well_formed());
        assert!(!Element::from(Segment::constant(1, 2, infinity)).is_finite());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_is_tagged_by_type() {
        let element = Element::from(Point::new(1, 2));
        let json = serde_json::to_value(&element).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "type": "point", "time": "1", "value": "2" })
        );
        let back: Element = serde_json::from_value(json).unwrap();
        assert_eq!(back, element);
    }
}
