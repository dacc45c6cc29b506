use crate::{Curve, Rational};

impl Curve {
    /// Whether the two curves take the same value at every `t >= 0`,
    /// regardless of how they are represented.
    ///
    /// Both curves repeat with period `lcm(d_a, d_b)` from `max(T_a, T_b)` on
    /// (when their long-run slopes agree), so comparing one joint period after
    /// the later transient settles the question. Within it, values are checked
    /// at every breakpoint of either curve and at two interior points of every
    /// piece in between. Curves whose joint period holds more than
    /// [`MAX_UNROLLED_ELEMENTS`](crate::curve::MAX_UNROLLED_ELEMENTS) elements
    /// are reported as different.
    pub fn equivalent(&self, other: &Curve) -> bool {
        if self.pseudo_period_slope() != other.pseudo_period_slope() {
            return false;
        }
        let Ok(length) = self
            .pseudo_period_length()
            .least_common_multiple(other.pseudo_period_length())
        else {
            return false;
        };
        let start = self
            .pseudo_period_start()
            .clone()
            .max(other.pseudo_period_start().clone());
        let horizon = &start + &length;

        let (Ok(a), Ok(b)) = (
            self.cut(&Rational::zero(), &horizon),
            other.cut(&Rational::zero(), &horizon),
        ) else {
            return false;
        };

        let mut times: Vec<Rational> = a
            .elements()
            .iter()
            .chain(b.elements())
            .flat_map(|e| [e.start().clone(), e.end().clone()])
            .collect();
        times.push(horizon);
        times.sort();
        times.dedup();

        let same = |t: &Rational| a.value_at(t) == b.value_at(t);
        let three = Rational::from(3);
        times.windows(2).all(|pair| {
            let third = (&pair[1] - &pair[0]) / &three;
            let first = &pair[0] + &third;
            let second = &first + &third;
            same(&pair[0]) && same(&first) && same(&second)
        })
    }
}

/// Value equality of two curves; see [`Curve::equivalent`].
pub fn equivalent(a: &Curve, b: &Curve) -> bool {
    a.equivalent(b)
}
