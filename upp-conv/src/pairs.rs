use crate::ConvolutionSettings;
use crate::envelope::{Partial, lower_envelope};
use upp_core::{Element, Point, Rational, Segment, Sequence};

/// The min-plus convolution of two elements.
///
/// Points add; a point shifts a segment; two segments give the convex chain
/// that follows the smaller slope first.
pub(crate) fn convolve_elements(a: &Element, b: &Element) -> Partial {
    match (a, b) {
        (Element::Point(p), Element::Point(q)) => Partial::new(vec![
            Point::new(&p.time + &q.time, &p.value + &q.value).into(),
        ]),
        (Element::Point(p), Element::Segment(s)) | (Element::Segment(s), Element::Point(p)) => {
            Partial::new(vec![s.translate(&p.time, &p.value).into()])
        }
        (Element::Segment(s), Element::Segment(u)) => {
            let (first, second) = if s.slope <= u.slope { (s, u) } else { (u, s) };
            let start = &first.start + &second.start;
            let value = &first.value_at_start + &second.value_at_start;
            if first.slope == second.slope {
                return Partial::new(vec![
                    Segment::new(start, &first.end + &second.end, value, &first.slope).into(),
                ]);
            }
            let corner = &start + &first.length();
            let corner_value = &value + &(&first.slope * &first.length());
            Partial::new(vec![
                Segment::new(start, &corner, value, &first.slope).into(),
                Point::new(&corner, &corner_value).into(),
                Segment::new(&corner, &first.end + &second.end, corner_value, &second.slope).into(),
            ])
        }
    }
}

// Everything one element of `f` contributes before `horizon`
fn row(element: &Element, g: &Sequence, horizon: &Rational, by_sequence: bool) -> Partial {
    let in_range = g
        .elements()
        .iter()
        .take_while(|other| &(element.start() + other.start()) < horizon);

    match element {
        Element::Point(point) if by_sequence => {
            Partial::new(in_range.map(|other| other.translate(&point.time, &point.value)).collect())
        }
        _ => lower_envelope(
            in_range.map(|other| convolve_elements(element, other)).collect(),
            false,
        ),
    }
}

/// The min-plus convolution of two finite sequences over `[start, horizon)`,
/// where `start` is the sum of their start times.
///
/// Both sequences must cover everything that can reach the horizon.
pub(crate) fn convolve_sequences(
    f: &Sequence,
    g: &Sequence,
    horizon: &Rational,
    settings: &ConvolutionSettings,
) -> Partial {
    let start = f.start() + g.start();
    let by_sequence = settings.use_by_sequence_optimization;
    let relevant = f
        .elements()
        .iter()
        .take_while(|element| &(element.start() + g.start()) < horizon);

    let rows: Vec<Partial> = if settings.use_parallelism {
        par_rows(relevant.collect(), g, horizon, by_sequence)
    } else {
        relevant
            .map(|element| row(element, g, horizon, by_sequence))
            .collect()
    };

    lower_envelope(rows, settings.use_parallelism).cut(&start, horizon)
}

#[cfg(feature = "rayon")]
fn par_rows(elements: Vec<&Element>, g: &Sequence, horizon: &Rational, by_sequence: bool) -> Vec<Partial> {
    use rayon::prelude::*;

    elements
        .into_par_iter()
        .map(|element| row(element, g, horizon, by_sequence))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn par_rows(elements: Vec<&Element>, g: &Sequence, horizon: &Rational, by_sequence: bool) -> Vec<Partial> {
    elements
        .into_iter()
        .map(|element| row(element, g, horizon, by_sequence))
        .collect()
}
