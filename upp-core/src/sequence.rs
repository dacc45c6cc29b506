use crate::{Element, Point, Rational, Segment};
use std::fmt;
use thiserror::Error;

/// A finite, gap-free run of elements
///
/// A sequence starts with a point, alternates points and segments, and every
/// element begins exactly where the previous one ends. It may end with a point
/// (closed on the right) or a segment (open on the right).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "Vec<Element>", into = "Vec<Element>"))]
pub struct Sequence {
    elements: Vec<Element>,
}

/// The ways a list of elements can fail to be a sequence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("a sequence needs at least one element")]
    Empty,

    #[error("a sequence must start with a point")]
    StartsWithSegment,

    #[error("element {index} has the same kind as its predecessor")]
    NotAlternating { index: usize },

    #[error("element {index} does not start where its predecessor ends")]
    Discontiguous { index: usize },

    #[error("segment {index} has an empty interval")]
    EmptySegment { index: usize },

    #[error("element {index} has an infinite time or slope, or an unsupported infinite value")]
    NonFinite { index: usize },

    #[error("interval [{start}, {end}) is not within the sequence")]
    OutOfRange { start: Rational, end: Rational },
}

impl Sequence {
    /// Creates a new sequence, validating all constraints
    pub fn new(elements: Vec<Element>) -> Result<Self, SequenceError> {
        match elements.first() {
            None => return Err(SequenceError::Empty),
            Some(Element::Segment(_)) => return Err(SequenceError::StartsWithSegment),
            Some(Element::Point(_)) => {}
        }

        for (index, element) in elements.iter().enumerate() {
            if !element.is_well_formed() {
                return Err(SequenceError::NonFinite { index });
            }
            if let Element::Segment(segment) = element {
                if segment.start >= segment.end {
                    return Err(SequenceError::EmptySegment { index });
                }
            }
        }

        for (offset, pair) in elements.windows(2).enumerate() {
            let index = offset + 1;
            if pair[0].is_point() == pair[1].is_point() {
                return Err(SequenceError::NotAlternating { index });
            }
            if pair[0].end() != pair[1].start() {
                return Err(SequenceError::Discontiguous { index });
            }
        }

        Ok(Self { elements })
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<Element> {
        self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Always false: sequences hold at least one element
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The time of the first point
    pub fn start(&self) -> &Rational {
        // Non-empty by construction
        self.elements[0].start()
    }

    /// The time of the last point, or the (excluded) end of the last segment
    pub fn end(&self) -> &Rational {
        self.elements[self.elements.len() - 1].end()
    }

    /// Whether the sequence ends with a segment
    pub fn is_right_open(&self) -> bool {
        self.elements[self.elements.len() - 1].is_segment()
    }

    /// Index of the element defined at `time`
    pub fn locate(&self, time: &Rational) -> Option<usize> {
        let first = self.elements.partition_point(|e| e.end() < time);
        (first..(first + 2).min(self.elements.len())).find(|&i| match &self.elements[i] {
            Element::Point(point) => &point.time == time,
            Element::Segment(segment) => segment.contains(time),
        })
    }

    /// The value at `time`, if the sequence covers it
    pub fn value_at(&self, time: &Rational) -> Option<Rational> {
        self.locate(time).map(|i| match &self.elements[i] {
            Element::Point(point) => point.value.clone(),
            Element::Segment(segment) => segment.value_at(time),
        })
    }

    /// The limit from the right at `time`, if the sequence extends past it
    pub fn right_limit_at(&self, time: &Rational) -> Option<Rational> {
        let i = self.locate(time)?;
        match &self.elements[i] {
            Element::Segment(segment) => Some(segment.value_at(time)),
            Element::Point(_) => match self.elements.get(i + 1) {
                Some(Element::Segment(segment)) => Some(segment.value_at_start.clone()),
                _ => None,
            },
        }
    }

    /// The limit from the left at `time`, if the sequence extends before it
    pub fn left_limit_at(&self, time: &Rational) -> Option<Rational> {
        if self.is_right_open() && time == self.end() {
            if let Some(Element::Segment(segment)) = self.elements.last() {
                return Some(segment.left_limit_at_end());
            }
        }
        let i = self.locate(time)?;
        match &self.elements[i] {
            Element::Segment(segment) => Some(segment.value_at(time)),
            Element::Point(_) => match i.checked_sub(1).map(|j| &self.elements[j]) {
                Some(Element::Segment(segment)) => Some(segment.left_limit_at_end()),
                _ => None,
            },
        }
    }

    /// The restriction to the right-open interval `[start, end)`.
    ///
    /// A segment straddling `start` gains a point there; one straddling `end`
    /// is shortened.
    pub fn cut(&self, start: &Rational, end: &Rational) -> Result<Sequence, SequenceError> {
        let covered = start >= self.start() && start < end && end <= self.end();
        if !covered {
            return Err(SequenceError::OutOfRange {
                start: start.clone(),
                end: end.clone(),
            });
        }

        let mut elements = Vec::new();
        for element in &self.elements {
            match element {
                Element::Point(point) => {
                    if &point.time >= start && &point.time < end {
                        elements.push(element.clone());
                    }
                }
                Element::Segment(segment) => {
                    if &segment.end <= start || &segment.start >= end {
                        continue;
                    }
                    let from = segment.start.clone().max(start.clone());
                    let to = segment.end.clone().min(end.clone());
                    if segment.start < *start {
                        elements.push(Point::new(start, segment.value_at(start)).into());
                    }
                    elements.push(segment.restrict(&from, &to).into());
                }
            }
        }
        Sequence::new(elements)
    }

    /// The same function with a breakpoint at `time`: a segment straddling it
    /// is split around a point carrying its value.
    pub fn split_at(&self, time: &Rational) -> Sequence {
        if let Some(i) = self.locate(time) {
            if let Element::Segment(segment) = &self.elements[i] {
                let mut elements = Vec::with_capacity(self.elements.len() + 2);
                elements.extend_from_slice(&self.elements[..i]);
                elements.push(segment.restrict(&segment.start, time).into());
                elements.push(Point::new(time, segment.value_at(time)).into());
                elements.push(segment.restrict(time, &segment.end).into());
                elements.extend_from_slice(&self.elements[i + 1..]);
                return Sequence { elements };
            }
        }
        self.clone()
    }

    /// Shift every element right by `time` and up by `value`.
    pub fn translate(&self, time: &Rational, value: &Rational) -> Sequence {
        Sequence {
            elements: self
                .elements
                .iter()
                .map(|e| e.translate(time, value))
                .collect(),
        }
    }

    /// Mirror the sequence across the time axis.
    pub fn negate(&self) -> Sequence {
        Sequence {
            elements: self.elements.iter().map(Element::negate).collect(),
        }
    }

    /// Drop every breakpoint that is not one: a point joining two collinear
    /// segments it is continuous with.
    pub fn simplify(&self) -> Sequence {
        Sequence {
            elements: merge_collinear(self.elements.iter().cloned()),
        }
    }

    /// Join sequences end to end.
    ///
    /// Each sequence must start where the previous one ends; a right-open
    /// sequence is completed by the first point of the next.
    pub fn concat<I>(sequences: I) -> Result<Sequence, SequenceError>
    where
        I: IntoIterator<Item = Sequence>,
    {
        let mut elements: Vec<Element> = Vec::new();
        for sequence in sequences {
            let mut rest = sequence.elements.into_iter();
            // Two closed sequences share their joining point
            if let (Some(Element::Point(last)), Some(Element::Point(first))) =
                (elements.last(), rest.as_slice().first())
            {
                if last != first {
                    return Err(SequenceError::Discontiguous {
                        index: elements.len(),
                    });
                }
                rest.next();
            }
            elements.extend(rest);
        }
        Sequence::new(elements)
    }

    /// Iterate over the segments
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.elements.iter().filter_map(|e| match e {
            Element::Segment(segment) => Some(segment),
            Element::Point(_) => None,
        })
    }

    /// Iterate over the points
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.elements.iter().filter_map(|e| match e {
            Element::Point(point) => Some(point),
            Element::Segment(_) => None,
        })
    }
}

/// Merge every `Segment, Point, Segment` run that describes a single line.
///
/// The input only needs to be sorted and non-overlapping; gaps are kept, and
/// elements are merged only when they touch.
pub fn merge_collinear<I>(elements: I) -> Vec<Element>
where
    I: IntoIterator<Item = Element>,
{
    let mut merged: Vec<Element> = Vec::new();
    for element in elements {
        if let Element::Segment(next) = &element {
            if let [.., Element::Segment(prev), Element::Point(point)] = merged.as_slice() {
                let joined = prev.end == point.time
                    && point.time == next.start
                    && prev.slope == next.slope
                    && point.value == next.value_at_start
                    && prev.left_limit_at_end() == point.value;
                if joined {
                    let line = Segment {
                        start: prev.start.clone(),
                        end: next.end.clone(),
                        value_at_start: prev.value_at_start.clone(),
                        slope: prev.slope.clone(),
                    };
                    merged.truncate(merged.len() - 2);
                    merged.push(line.into());
                    continue;
                }
            }
        }
        merged.push(element);
    }
    merged
}

impl TryFrom<Vec<Element>> for Sequence {
    type Error = SequenceError;

    fn try_from(value: Vec<Element>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Sequence> for Vec<Element> {
    fn from(value: Sequence) -> Self {
        value.elements
    }
}

impl fmt::Display for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sequence([")?;
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{element}")?;
        }
        f.write_str("])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(text: &str) -> Rational {
        text.parse().unwrap()
    }

    fn p(t: i64, v: i64) -> Element {
        Point::new(t, v).into()
    }

    fn s(a: i64, b: i64, v: i64, m: i64) -> Element {
        Segment::new(a, b, v, m).into()
    }

    fn staircase() -> Sequence {
        Sequence::new(vec![p(0, 0), s(0, 2, 1, 0), p(2, 1), s(2, 4, 3, 1)]).unwrap()
    }

    #[test]
    fn validation() {
        assert_eq!(Sequence::new(vec![]).unwrap_err(), SequenceError::Empty);
        assert_eq!(
            Sequence::new(vec![s(0, 1, 0, 0)]).unwrap_err(),
            SequenceError::StartsWithSegment
        );
        assert_eq!(
            Sequence::new(vec![p(0, 0), p(0, 0)]).unwrap_err(),
            SequenceError::NotAlternating { index: 1 }
        );
        assert_eq!(
            Sequence::new(vec![p(0, 0), s(1, 2, 0, 0)]).unwrap_err(),
            SequenceError::Discontiguous { index: 1 }
        );
        assert_eq!(
            Sequence::new(vec![p(0, 0), s(0, 0, 0, 0)]).unwrap_err(),
            SequenceError::EmptySegment { index: 1 }
        );
        assert_eq!(
            Sequence::new(vec![Point::new(0, Rational::MINUS_INFINITY).into()]).unwrap_err(),
            SequenceError::NonFinite { index: 0 }
        );
        assert_eq!(
            Sequence::new(vec![
                p(0, 0),
                Segment::new(0, 1, Rational::PLUS_INFINITY, 1).into()
            ])
            .unwrap_err(),
            SequenceError::NonFinite { index: 1 }
        );
        let unbounded = Sequence::new(vec![
            p(0, 0),
            Segment::constant(0, 1, Rational::PLUS_INFINITY).into(),
            Point::new(1, Rational::PLUS_INFINITY).into(),
        ])
        .unwrap();
        assert_eq!(unbounded.value_at(&r("1/2")), Some(Rational::PLUS_INFINITY));
        assert!(Sequence::new(vec![p(3, 1)]).is_ok());
    }

    #[test]
    fn lookups() {
        let seq = staircase();
        assert_eq!(seq.value_at(&r("0")), Some(r("0")));
        assert_eq!(seq.value_at(&r("1")), Some(r("1")));
        assert_eq!(seq.value_at(&r("2")), Some(r("1")));
        assert_eq!(seq.value_at(&r("3")), Some(r("4")));
        assert_eq!(seq.value_at(&r("4")), None);
        assert_eq!(seq.right_limit_at(&r("0")), Some(r("1")));
        assert_eq!(seq.right_limit_at(&r("2")), Some(r("3")));
        assert_eq!(seq.left_limit_at(&r("2")), Some(r("1")));
        assert_eq!(seq.left_limit_at(&r("4")), Some(r("5")));
        assert_eq!(seq.left_limit_at(&r("0")), None);
    }

    #[test]
    fn cut_inside_segments() {
        let seq = staircase();
        let cut = seq.cut(&r("1"), &r("3")).unwrap();
        assert_eq!(
            cut.elements(),
            &[p(1, 1), s(1, 2, 1, 0), p(2, 1), s(2, 3, 3, 1)]
        );
        let whole = seq.cut(&r("0"), &r("4")).unwrap();
        assert_eq!(whole, seq);
        assert!(matches!(
            seq.cut(&r("3"), &r("5")),
            Err(SequenceError::OutOfRange { .. })
        ));
    }

    #[test]
    fn cut_at_a_point_keeps_it() {
        let cut = staircase().cut(&r("2"), &r("5/2")).unwrap();
        assert_eq!(
            cut.elements(),
            &[p(2, 1), Segment::new(2, r("5/2"), 3, 1).into()]
        );
        assert_eq!(cut.end(), &r("5/2"));
    }

    #[test]
    fn split_inserts_a_point() {
        let split = staircase().split_at(&r("3"));
        assert_eq!(
            split.elements(),
            &[p(0, 0), s(0, 2, 1, 0), p(2, 1), s(2, 3, 3, 1), p(3, 4), s(3, 4, 4, 1)]
        );
        assert_eq!(split.simplify(), staircase());
        assert_eq!(staircase().split_at(&r("2")), staircase());
    }

    #[test]
    fn simplify_merges_collinear_runs() {
        let seq = Sequence::new(vec![
            p(0, 0),
            s(0, 1, 0, 2),
            p(1, 2),
            s(1, 3, 2, 2),
            p(3, 6),
            s(3, 4, 7, 2),
        ])
        .unwrap();
        assert_eq!(
            seq.simplify().elements(),
            &[p(0, 0), s(0, 3, 0, 2), p(3, 6), s(3, 4, 7, 2)]
        );
    }

    #[test]
    fn merge_keeps_gaps() {
        let merged = merge_collinear(vec![s(0, 1, 0, 0), p(2, 0), s(2, 3, 0, 0)]);
        assert_eq!(merged.len(), 3);
    }

    #[test]
    fn concat_joins_abutting_sequences() {
        let a = Sequence::new(vec![p(0, 0), s(0, 1, 0, 1)]).unwrap();
        let b = Sequence::new(vec![p(1, 1), s(1, 2, 1, 1), p(2, 2)]).unwrap();
        let c = Sequence::new(vec![p(2, 2), s(2, 3, 2, 0)]).unwrap();
        let joined = Sequence::concat([a, b, c]).unwrap();
        assert_eq!(joined.len(), 6);
        assert_eq!(joined.value_at(&r("5/2")), Some(r("2")));
        assert_eq!(joined.simplify().len(), 4);
    }

    #[test]
    fn display() {
        assert_eq!(
            staircase().to_string(),
            "Sequence([Point(0, 0), Segment(0, 2, 1, 0), Point(2, 1), Segment(2, 4, 3, 1)])"
        );
    }
}
