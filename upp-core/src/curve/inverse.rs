use crate::{Curve, CurveError, Element, Point, Rational, Segment, Sequence};

#[derive(Clone, Copy)]
enum Side {
    // inf { t : f(t) >= y }
    Lower,
    // inf { t : f(t) > y }
    Upper,
}

impl Curve {
    /// The lower pseudo-inverse `y -> inf { t : f(t) >= y }`, a left-continuous
    /// curve.
    ///
    /// Requires a non-decreasing curve with positive pseudo-period height;
    /// the result has the pseudo-period length and height swapped.
    pub fn lower_pseudo_inverse(&self) -> Result<Curve, CurveError> {
        self.pseudo_inverse(Side::Lower)
    }

    /// The upper pseudo-inverse `y -> inf { t : f(t) > y }` (equivalently
    /// `sup { t : f(t) <= y }`), a right-continuous curve.
    ///
    /// Same requirements as [`Curve::lower_pseudo_inverse`].
    pub fn upper_pseudo_inverse(&self) -> Result<Curve, CurveError> {
        self.pseudo_inverse(Side::Upper)
    }

    fn pseudo_inverse(&self, side: Side) -> Result<Curve, CurveError> {
        if !self.is_non_decreasing() {
            return Err(CurveError::NotInvertible("curve is not non-decreasing"));
        }
        if !self.pseudo_period_height().is_positive() {
            return Err(CurveError::NotInvertible("curve is ultimately constant"));
        }

        let length = self.pseudo_period_height().clone();
        let height = self.pseudo_period_length().clone();
        // Every value past f(T + d) is reached only within the periodic part
        let start = (&self.value_at(&self.first_period_end()) + &length).max(Rational::zero());
        let end = &start + &length;

        // Materialise enough of the curve to reach every value below `end`
        let periods = ((&end - self.value_at(self.pseudo_period_start())) / &length).ceil()
            + Rational::one();
        let horizon = self.pseudo_period_start() + &(&periods * self.pseudo_period_length());
        let horizon = horizon.max(self.first_period_end());
        let sequence = self.cut(&Rational::zero(), &horizon)?;
        let elements = sequence.elements();

        // The inverse can only bend at values the curve attains or approaches
        let zero = Rational::zero();
        let mut breakpoints: Vec<Rational> = elements
            .iter()
            .flat_map(Element::corner_points)
            .map(|point| point.value)
            .filter(|value| value > &zero && value < &end)
            .collect();
        breakpoints.push(zero);
        breakpoints.push(end);
        breakpoints.sort();
        breakpoints.dedup();

        let evaluate = |y: &Rational| inverse_at(elements, y, side);

        let mut inverse: Vec<Element> = Vec::with_capacity(2 * breakpoints.len());
        for pair in breakpoints.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            inverse.push(Point::new(a, evaluate(a)?).into());

            // Linear between breakpoints: recover the line from two interior samples
            let third = (b - a) / Rational::from(3);
            let first = a + &third;
            let second = &first + &third;
            let (first_value, second_value) = (evaluate(&first)?, evaluate(&second)?);
            let slope = (&second_value - &first_value) / &third;
            let value_at_start = &first_value - &(&slope * &third);
            inverse.push(Segment::new(a, b, value_at_start, slope).into());
        }

        let curve = Curve::new(Sequence::new(inverse)?, start, length, height)?;
        Ok(curve.simplify())
    }
}

fn inverse_at(elements: &[Element], y: &Rational, side: Side) -> Result<Rational, CurveError> {
    // The largest value reached by each element is non-decreasing along the sequence
    let index = match side {
        Side::Lower => elements.partition_point(|e| &e.last_value() < y),
        Side::Upper => elements.partition_point(|e| &e.last_value() <= y),
    };
    match elements.get(index) {
        Some(Element::Point(point)) => Ok(point.time.clone()),
        Some(Element::Segment(segment)) => {
            let reached = match side {
                Side::Lower => &segment.value_at_start >= y,
                Side::Upper => &segment.value_at_start > y,
            };
            if reached {
                Ok(segment.start.clone())
            } else {
                // Only a rising segment can pass from below `y` to above it
                Ok(&segment.start + &((y - &segment.value_at_start) / &segment.slope))
            }
        }
        None => Err(CurveError::NotInvertible(
            "value lies beyond the materialised horizon",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::generators::{constant, constant_jumps_staircase, rate_latency, sigma_rho};

    fn r(text: &str) -> Rational {
        text.parse().unwrap()
    }

    fn rs(values: &[i64]) -> Vec<Rational> {
        values.iter().map(|&v| Rational::from(v)).collect()
    }

    #[test]
    fn rate_latency_inverts_to_an_affine_curve() {
        let curve = rate_latency(r("10"), r("11")).unwrap();
        for inverse in [
            curve.lower_pseudo_inverse().unwrap(),
            curve.upper_pseudo_inverse().unwrap(),
        ] {
            assert_eq!(inverse.value_at(&r("1")), r("111/10"));
            assert_eq!(inverse.value_at(&r("30")), r("14"));
            assert_eq!(inverse.pseudo_period_slope(), r("1/10"));
        }
        // The flat stretch on [0, 11] collapses differently at y = 0
        assert_eq!(curve.lower_pseudo_inverse().unwrap().value_at(&r("0")), r("0"));
        assert_eq!(curve.upper_pseudo_inverse().unwrap().value_at(&r("0")), r("11"));
    }

    #[test]
    fn staircase_inverses() {
        let curve = constant_jumps_staircase(&[], &rs(&[3, 5])).unwrap();
        let lower = curve.lower_pseudo_inverse().unwrap();
        let upper = curve.upper_pseudo_inverse().unwrap();

        for (y, l, u) in [
            ("0", "0", "0"),
            ("5/2", "0", "0"),
            ("5", "0", "3"),
            ("6", "3", "3"),
            ("10", "3", "6"),
            ("21", "12", "12"),
        ] {
            assert_eq!(lower.value_at(&r(y)), r(l), "lower at {y}");
            assert_eq!(upper.value_at(&r(y)), r(u), "upper at {y}");
        }
        assert!(lower.is_left_continuous());
        assert!(upper.is_right_continuous());
    }

    #[test]
    fn round_trip_on_continuous_increasing_curves() {
        let curve = rate_latency(r("2"), r("3")).unwrap();
        let inverse = curve.lower_pseudo_inverse().unwrap();
        for k in 1..30 {
            let t = Rational::new(k, 2).unwrap() + r("3");
            let y = curve.value_at(&t);
            assert_eq!(inverse.value_at(&y), t);
        }
        let back = inverse.upper_pseudo_inverse().unwrap();
        assert!(back.equivalent(&curve));
    }

    #[test]
    fn sigma_rho_round_trip() {
        let curve = sigma_rho(r("4"), r("2")).unwrap();
        let back = curve
            .upper_pseudo_inverse()
            .unwrap()
            .lower_pseudo_inverse()
            .unwrap();
        assert!(back.equivalent(&curve));
    }

    #[test]
    fn rejects_non_invertible_curves() {
        assert_eq!(
            constant(r("3")).unwrap().lower_pseudo_inverse().unwrap_err(),
            CurveError::NotInvertible("curve is ultimately constant")
        );
        let decreasing = rate_latency(r("1"), r("0")).unwrap().negate();
        assert_eq!(
            decreasing.upper_pseudo_inverse().unwrap_err(),
            CurveError::NotInvertible("curve is not non-decreasing")
        );
    }
}
