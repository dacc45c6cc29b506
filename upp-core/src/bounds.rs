use crate::curve::generators::{rate_latency, sigma_rho};
use crate::{Curve, CurveError, Point, Rational};

// One-sided end values of every element in the base sequence
fn corner_points(curve: &Curve) -> impl Iterator<Item = Point> + '_ {
    curve
        .base_sequence()
        .elements()
        .iter()
        .flat_map(|element| element.corner_points())
}

/// The smallest sigma-rho curve above `curve` for `t > 0`.
///
/// The rate is the pseudo-period slope; the burst is the largest excess
/// `f(t) - rate * t` over the corner points, and never negative. Past the
/// base sequence that excess repeats, so the corners of one period suffice.
///
/// A negative sustained rate is rejected: sigma-rho curves only grow.
pub fn sigma_rho_upper_bound(curve: &Curve) -> Result<Curve, CurveError> {
    let rate = curve.pseudo_period_slope();
    if rate.is_negative() {
        return Err(CurveError::NonUpperBoundable(
            "sustained rate is negative",
        ));
    }
    let burst = corner_points(curve)
        .map(|point| &point.value - &(&point.time * &rate))
        .fold(Rational::zero(), Rational::max);
    sigma_rho(burst, rate)
}

/// The rate-latency curve with the curve's sustained rate and the largest
/// latency that still stays above `curve`.
///
/// Fails when the curve is positive right after the origin (no latency can
/// cover it), when its sustained rate is not positive, or when the required
/// latency would be negative.
pub fn rate_latency_upper_bound(curve: &Curve) -> Result<Curve, CurveError> {
    let rate = curve.pseudo_period_slope();
    if !rate.is_positive() {
        return Err(CurveError::NonUpperBoundable(
            "sustained rate is not positive",
        ));
    }
    if curve.right_limit_at(&Rational::zero()).is_positive() {
        return Err(CurveError::NonUpperBoundable(
            "curve is positive right after the origin",
        ));
    }

    let latency = corner_points(curve)
        .filter(|point| !point.time.is_zero() && point.value.is_positive())
        .map(|point| &point.time - &(&point.value / &rate))
        .min()
        .ok_or(CurveError::NonUpperBoundable("curve is never positive"))?;
    if latency.is_negative() {
        return Err(CurveError::NonUpperBoundable(
            "bounding latency would be negative",
        ));
    }
    rate_latency(rate, latency)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::generators::{constant, constant_jumps_staircase, many_constants_staircase};
    use rstest::rstest;

    fn r(text: &str) -> Rational {
        text.parse().unwrap()
    }

    fn rs(values: &[i64]) -> Vec<Rational> {
        values.iter().map(|&v| Rational::from(v)).collect()
    }

    fn assert_above(bound: &Curve, curve: &Curve) {
        for k in 1..120 {
            let t = Rational::new(k, 4).unwrap();
            assert!(bound.value_at(&t) >= curve.value_at(&t), "at {t}");
        }
    }

    #[test]
    fn sigma_rho_of_a_staircase() {
        // Jumps by 5 right after every multiple of 3
        let curve = constant_jumps_staircase(&[], &rs(&[3, 5])).unwrap();
        let bound = sigma_rho_upper_bound(&curve).unwrap();
        assert_eq!(bound.pseudo_period_slope(), r("5/3"));
        assert_eq!(bound.right_limit_at(&r("0")), r("5"));
        assert_above(&bound, &curve);
    }

    #[rstest]
    #[case("4", "2")]
    #[case("0", "3")]
    fn sigma_rho_is_its_own_bound(#[case] sigma: &str, #[case] rho: &str) {
        let curve = sigma_rho(r(sigma), r(rho)).unwrap();
        assert!(sigma_rho_upper_bound(&curve).unwrap().equivalent(&curve));
    }

    #[test]
    fn sigma_rho_needs_a_growing_curve() {
        let falling = rate_latency(r("2"), r("1")).unwrap().negate();
        assert_eq!(
            sigma_rho_upper_bound(&falling).unwrap_err(),
            CurveError::NonUpperBoundable("sustained rate is negative")
        );
    }

    #[test]
    fn rate_latency_of_a_delayed_staircase() {
        // Flat until 2, then unit jumps after every unit of time
        let curve = constant_jumps_staircase(&rs(&[2, 1, 1]), &rs(&[1, 1])).unwrap();
        let bound = rate_latency_upper_bound(&curve).unwrap();
        assert_eq!(bound.pseudo_period_slope(), r("1"));
        assert_eq!(bound.value_at(&r("1")), r("0"));
        assert_eq!(bound.value_at(&r("2")), r("1"));
        assert_above(&bound, &curve);
    }

    #[test]
    fn rate_latency_needs_a_slow_start() {
        // Rises faster than its sustained rate straight away
        let curve = many_constants_staircase(&[], &rs(&[1, 2, 1])).unwrap();
        assert_eq!(
            rate_latency_upper_bound(&curve).unwrap_err(),
            CurveError::NonUpperBoundable("bounding latency would be negative")
        );
    }

    #[test]
    fn rate_latency_is_its_own_bound() {
        let curve = rate_latency(r("10"), r("11")).unwrap();
        assert!(rate_latency_upper_bound(&curve).unwrap().equivalent(&curve));
    }

    #[test]
    fn rate_latency_rejections() {
        assert_eq!(
            rate_latency_upper_bound(&sigma_rho(r("4"), r("2")).unwrap()).unwrap_err(),
            CurveError::NonUpperBoundable("curve is positive right after the origin")
        );
        assert_eq!(
            rate_latency_upper_bound(&constant(r("0")).unwrap()).unwrap_err(),
            CurveError::NonUpperBoundable("sustained rate is not positive")
        );
    }
}
