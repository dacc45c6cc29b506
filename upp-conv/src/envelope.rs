use upp_core::{CurveError, Element, Point, Rational, Segment, Sequence, merge_collinear};

/// A function known on part of the time axis: sorted, non-overlapping
/// elements that may leave gaps between them.
///
/// Convolution pieces live here until the lower envelope has filled in the
/// whole horizon and the result can become a [`Sequence`].
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Partial {
    elements: Vec<Element>,
}

impl Partial {
    /// Elements must already be sorted and non-overlapping
    pub fn new(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn value_at(&self, time: &Rational) -> Option<Rational> {
        let first = self.elements.partition_point(|e| e.end() < time);
        self.elements[first..]
            .iter()
            .take(2)
            .find_map(|element| match element {
                Element::Point(point) if &point.time == time => Some(point.value.clone()),
                Element::Segment(segment) if segment.contains(time) => {
                    Some(segment.value_at(time))
                }
                _ => None,
            })
    }

    // The segment spanning all of (start, end), if there is one
    fn segment_over(&self, start: &Rational, end: &Rational) -> Option<&Segment> {
        let first = self.elements.partition_point(|e| e.end() <= start);
        match self.elements.get(first) {
            Some(Element::Segment(segment)) if &segment.start <= start && &segment.end >= end => {
                Some(segment)
            }
            _ => None,
        }
    }

    pub fn translate(&self, time: &Rational, value: &Rational) -> Partial {
        Partial {
            elements: self
                .elements
                .iter()
                .map(|e| e.translate(time, value))
                .collect(),
        }
    }

    /// The part over `[start, end)`; a segment straddling `start` gains a point
    /// there.
    pub fn cut(&self, start: &Rational, end: &Rational) -> Partial {
        let first = self.elements.partition_point(|e| e.end() < start);
        let mut elements = Vec::new();
        for element in &self.elements[first..] {
            if element.start() >= end {
                break;
            }
            match element {
                Element::Point(point) => {
                    if &point.time >= start {
                        elements.push(element.clone());
                    }
                }
                Element::Segment(segment) => {
                    if &segment.end <= start {
                        continue;
                    }
                    let from = segment.start.clone().max(start.clone());
                    let to = segment.end.clone().min(end.clone());
                    if &segment.start < start {
                        elements.push(Point::new(start, segment.value_at(start)).into());
                    }
                    elements.push(segment.restrict(&from, &to).into());
                }
            }
        }
        Partial { elements }
    }

    /// Fails if the elements leave a gap
    pub fn into_sequence(self) -> Result<Sequence, CurveError> {
        Ok(Sequence::new(self.elements)?)
    }

    fn breakpoints(&self) -> impl Iterator<Item = &Rational> {
        self.elements.iter().flat_map(|element| match element {
            Element::Point(point) => [&point.time, &point.time],
            Element::Segment(segment) => [&segment.start, &segment.end],
        })
    }
}

impl From<Sequence> for Partial {
    fn from(value: Sequence) -> Self {
        Self::new(value.into_elements())
    }
}

/// The pointwise minimum of two partial functions, over the union of where
/// they are known
pub(crate) fn merge(a: &Partial, b: &Partial) -> Partial {
    if a.is_empty() {
        return b.clone();
    }
    if b.is_empty() {
        return a.clone();
    }

    let mut times: Vec<&Rational> = a.breakpoints().chain(b.breakpoints()).collect();
    times.sort_unstable();
    times.dedup();

    let mut elements: Vec<Element> = Vec::with_capacity(2 * times.len());
    for (i, &time) in times.iter().enumerate() {
        let value = match (a.value_at(time), b.value_at(time)) {
            (Some(x), Some(y)) => Some(x.min(y)),
            (x, y) => x.or(y),
        };
        if let Some(value) = value {
            elements.push(Point::new(time, value).into());
        }

        let Some(&next) = times.get(i + 1) else {
            continue;
        };
        match (a.segment_over(time, next), b.segment_over(time, next)) {
            (Some(x), Some(y)) => {
                lower_of(&x.restrict(time, next), &y.restrict(time, next), &mut elements)
            }
            (Some(x), None) | (None, Some(x)) => {
                elements.push(x.restrict(time, next).into());
            }
            (None, None) => {}
        }
    }

    Partial::new(merge_collinear(elements))
}

// Two segments over the same interval; a strict crossing splits the interval
fn lower_of(x: &Segment, y: &Segment, out: &mut Vec<Element>) {
    let at_start = &x.value_at_start - &y.value_at_start;
    let at_end = x.left_limit_at_end() - y.left_limit_at_end();

    if !at_start.is_positive() && !at_end.is_positive() {
        out.push(x.clone().into());
    } else if !at_start.is_negative() && !at_end.is_negative() {
        out.push(y.clone().into());
    } else {
        let (first, second) = if at_start.is_negative() { (x, y) } else { (y, x) };
        let crossing = &x.start + &((&y.value_at_start - &x.value_at_start) / (&x.slope - &y.slope));
        out.push(first.restrict(&first.start, &crossing).into());
        out.push(Point::new(&crossing, first.value_at(&crossing)).into());
        out.push(second.restrict(&crossing, &second.end).into());
    }
}

/// The pointwise minimum of all the parts, merged as a balanced tree
pub(crate) fn lower_envelope(mut parts: Vec<Partial>, parallel: bool) -> Partial {
    while parts.len() > 1 {
        parts = merge_pairs(parts, parallel);
    }
    parts.pop().unwrap_or_default()
}

fn merge_chunk(chunk: &[Partial]) -> Partial {
    match chunk {
        [a, b] => merge(a, b),
        [a] => a.clone(),
        _ => Partial::default(),
    }
}

#[cfg(feature = "rayon")]
fn merge_pairs(parts: Vec<Partial>, parallel: bool) -> Vec<Partial> {
    use rayon::prelude::*;

    if parallel {
        parts.par_chunks(2).map(merge_chunk).collect()
    } else {
        parts.chunks(2).map(merge_chunk).collect()
    }
}

#[cfg(not(feature = "rayon"))]
fn merge_pairs(parts: Vec<Partial>, _parallel: bool) -> Vec<Partial> {
    parts.chunks(2).map(merge_chunk).collect()
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

    #[test]
    fn lookups_respect_gaps() {
        let partial = Partial::new(vec![p(0, 1), s(0, 2, 1, 1), p(4, 0), s(4, 5, 0, 0)]);
        assert_eq!(partial.value_at(&r("1")), Some(r("2")));
        assert_eq!(partial.value_at(&r("2")), None);
        assert_eq!(partial.value_at(&r("3")), None);
        assert_eq!(partial.value_at(&r("4")), Some(r("0")));
        assert_eq!(partial.value_at(&r("9/2")), Some(r("0")));
    }

    #[test]
    fn crossing_lines_split() {
        // y = t and y = 2 - t cross at 1
        let a = Partial::new(vec![p(0, 0), s(0, 2, 0, 1)]);
        let b = Partial::new(vec![p(0, 2), s(0, 2, 2, -1)]);
        let min = merge(&a, &b);
        assert_eq!(
            min.elements(),
            &[p(0, 0), s(0, 1, 0, 1), p(1, 1), s(1, 2, 1, -1)]
        );
        assert_eq!(merge(&b, &a), min);
    }

    #[test]
    fn disjoint_parts_keep_their_gap() {
        let a = Partial::new(vec![p(0, 0), s(0, 1, 0, 0)]);
        let b = Partial::new(vec![p(2, 5), s(2, 3, 5, 0)]);
        let min = merge(&a, &b);
        assert_eq!(min.elements(), &[p(0, 0), s(0, 1, 0, 0), p(2, 5), s(2, 3, 5, 0)]);
        assert!(min.into_sequence().is_err());
    }

    #[test]
    fn touching_collinear_pieces_are_joined() {
        let a = Partial::new(vec![p(0, 0), s(0, 1, 0, 1)]);
        let b = Partial::new(vec![p(1, 1), s(1, 3, 1, 1)]);
        let min = merge(&a, &b);
        assert_eq!(min.elements(), &[p(0, 0), s(0, 3, 0, 1)]);
    }

    #[test]
    fn envelope_of_many() {
        let parts: Vec<Partial> = (0..5)
            .map(|k| Partial::new(vec![p(0, k), s(0, 4, k, 1 - k)]))
            .collect();
        for parallel in [false, true] {
            let min = lower_envelope(parts.clone(), parallel);
            // Every line passes through (1, 1): k = 0 is lowest before, k = 4 after
            assert_eq!(min.value_at(&r("0")), Some(r("0")));
            assert_eq!(min.value_at(&r("1/2")), Some(r("1/2")));
            assert_eq!(min.value_at(&r("1")), Some(r("1")));
            assert_eq!(min.value_at(&r("2")), Some(r("-2")));
            assert_eq!(min.value_at(&r("3")), Some(r("-5")));
        }
    }

    #[test]
    fn cut_inserts_a_point() {
        let partial = Partial::new(vec![p(0, 0), s(0, 4, 0, 1)]);
        assert_eq!(
            partial.cut(&r("1"), &r("3")).elements(),
            &[p(1, 1), s(1, 3, 1, 1)]
        );
        assert_eq!(partial.cut(&r("0"), &r("4")), partial);
    }
}
