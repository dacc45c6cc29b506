use crate::{Curve, CurveError, Element, Point, Rational, Segment, Sequence};

impl Curve {
    /// The largest non-decreasing curve below this one, `t -> inf_{s >= t} f(s)`.
    ///
    /// The pseudo-period descriptor is kept. A curve with a negative long-run
    /// slope falls without bound and has no such closure.
    pub fn to_lower_non_decreasing(&self) -> Result<Curve, CurveError> {
        if self.is_non_decreasing() {
            return Ok(self.clone());
        }
        if self.pseudo_period_slope().is_negative() {
            return Err(CurveError::InvalidCurveShape(
                "a curve with negative long-run slope has no non-decreasing lower closure",
            ));
        }

        // Past T + d the curve never goes below the lowest value of its first
        // period, raised by one height
        let lowest = self
            .periodic_elements()
            .iter()
            .flat_map(Element::corner_points)
            .map(|point| point.value)
            .fold(Rational::PLUS_INFINITY, Rational::min);
        let mut floor = lowest + self.pseudo_period_height();

        let elements = self.base_sequence().elements();
        let mut closed: Vec<Element> = Vec::with_capacity(elements.len() * 2);
        for element in elements.iter().rev() {
            match element {
                Element::Point(point) => {
                    floor = floor.min(point.value.clone());
                    closed.push(Point::new(point.time.clone(), floor.clone()).into());
                }
                Element::Segment(segment) => {
                    let end_value = segment.left_limit_at_end();
                    if segment.slope.is_negative() {
                        floor = floor.min(end_value);
                        closed.push(flat(segment, &segment.start, &floor));
                    } else if end_value <= floor {
                        floor = segment.value_at_start.clone();
                        closed.push(element.clone());
                    } else if segment.value_at_start >= floor {
                        closed.push(flat(segment, &segment.start, &floor));
                    } else {
                        // Rises through the floor: flat from the crossing on
                        let crossing = &segment.start
                            + &((&floor - &segment.value_at_start) / &segment.slope);
                        closed.push(flat(segment, &crossing, &floor));
                        closed.push(Point::new(crossing.clone(), floor.clone()).into());
                        closed.push(segment.restrict(&segment.start, &crossing).into());
                        floor = segment.value_at_start.clone();
                    }
                }
            }
        }
        closed.reverse();

        let curve = Curve::new(
            Sequence::new(closed)?.simplify(),
            self.pseudo_period_start().clone(),
            self.pseudo_period_length().clone(),
            self.pseudo_period_height().clone(),
        )?;
        Ok(curve.simplify())
    }
}

// `value` over the rest of `segment` from `start`
fn flat(segment: &Segment, start: &Rational, value: &Rational) -> Element {
    Segment::constant(start.clone(), segment.end.clone(), value.clone()).into()
}
