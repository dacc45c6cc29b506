use crate::{Curve, Element, Rational, Sequence};

impl Curve {
    /// A value-identical curve with a representation as small as this crate
    /// can find.
    ///
    /// Collinear segments are merged, the pseudo-period is shrunk to a
    /// divisor when the period consists of identical repeats, and the
    /// pseudo-period start is moved back by whole periods while the transient
    /// already follows the periodic pattern.
    pub fn simplify(&self) -> Curve {
        let curve = self.with_base(self.base_sequence().simplify(), self.pseudo_period_start().clone());
        let curve = curve.shortest_period();
        curve.earliest_start()
    }

    fn with_base(&self, base: Sequence, start: Rational) -> Curve {
        Curve::new(
            base,
            start,
            self.pseudo_period_length().clone(),
            self.pseudo_period_height().clone(),
        )
        .unwrap_or_else(|_| self.clone())
    }

    // The window [start, start + length) with its breakpoints made canonical
    fn window(&self, start: &Rational, length: &Rational) -> Option<Vec<Element>> {
        self.cut(start, &(start + length))
            .ok()
            .map(|sequence| sequence.simplify().into_elements())
    }

    fn repeats(&self, from: &Rational, length: &Rational, height: &Rational) -> bool {
        let (Some(earlier), Some(later)) = (self.window(from, length), self.window(&(from + length), length))
        else {
            return false;
        };
        earlier.len() == later.len()
            && earlier
                .iter()
                .zip(&later)
                .all(|(a, b)| &a.translate(length, height) == b)
    }

    fn shortest_period(self) -> Curve {
        let segments = self
            .periodic_elements()
            .iter()
            .filter(|e| e.is_segment())
            .count();

        // Try the finest split first
        for parts in (2..=segments).rev() {
            if segments % parts != 0 {
                continue;
            }
            let parts_rational = Rational::from(parts);
            let length = self.pseudo_period_length() / &parts_rational;
            let height = self.pseudo_period_height() / &parts_rational;
            let start = self.pseudo_period_start();
            let all_repeat = (0..parts - 1).all(|k| {
                let from = start + &(&Rational::from(k) * &length);
                self.repeats(&from, &length, &height)
            });
            if !all_repeat {
                continue;
            }
            let reduced = self
                .cut(&Rational::zero(), &(start + &length))
                .ok()
                .and_then(|base| Curve::new(base.simplify(), start.clone(), length, height).ok());
            if let Some(reduced) = reduced {
                return reduced;
            }
        }
        self
    }

    fn earliest_start(self) -> Curve {
        let mut start = self.pseudo_period_start().clone();
        let length = self.pseudo_period_length();
        let height = self.pseudo_period_height();
        while &start >= length {
            let earlier = &start - length;
            if !self.repeats(&earlier, length, height) {
                break;
            }
            start = earlier;
        }
        if &start == self.pseudo_period_start() {
            return self;
        }
        match self.cut(&Rational::zero(), &(&start + length)) {
            Ok(base) => self.with_base(base.simplify(), start),
            Err(_) => self,
        }
    }
}
