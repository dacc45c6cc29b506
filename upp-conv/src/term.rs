use crate::envelope::Partial;
use upp_core::curve::reserve_unrolled;
use upp_core::{CurveError, Rational};

/// One summand of a decomposed convolution: known on `[from, start + length)`
/// and pseudo-periodic with `(start, length, height)` from there on.
#[derive(Clone, Debug)]
pub(crate) struct Term {
    partial: Partial,
    from: Rational,
    start: Rational,
    length: Rational,
    height: Rational,
}

impl Term {
    pub fn new(
        partial: Partial,
        from: Rational,
        start: Rational,
        length: Rational,
        height: Rational,
    ) -> Self {
        Self {
            partial,
            from,
            start,
            length,
            height,
        }
    }

    pub fn start(&self) -> &Rational {
        &self.start
    }

    pub fn length(&self) -> &Rational {
        &self.length
    }

    /// The term over `[from, horizon)`, repeating the first period as needed
    pub fn unroll(&self, horizon: &Rational) -> Result<Partial, CurveError> {
        let period_end = &self.start + &self.length;
        if horizon <= &period_end {
            return Ok(self.partial.cut(&self.from, horizon));
        }

        let periods = ((horizon - &period_end) / &self.length)
            .ceil()
            .to_usize()
            .ok_or_else(|| CurveError::HorizonTooLarge(horizon.clone()))?;
        let period = self.partial.cut(&self.start, &period_end);

        let mut elements = self.partial.cut(&self.from, &self.start).elements().to_vec();
        let count = periods
            .checked_add(1)
            .and_then(|n| n.checked_mul(period.elements().len()));
        reserve_unrolled(&mut elements, count, horizon)?;
        for k in 0..=periods {
            let k = Rational::from(k);
            let shifted = period.translate(&(&k * &self.length), &(&k * &self.height));
            elements.extend_from_slice(shifted.elements());
        }
        Ok(Partial::new(elements).cut(&self.from, horizon))
    }
}
