use rstest::*;
use rstest_reuse::{self, *};
use upp_conv::{Convolution, ConvolutionError, ConvolutionKind, ConvolutionSettings, Strategy};
use upp_core::curve::generators::{
    constant_jumps_staircase, delay_service, rate_latency, sigma_rho, zero,
};
use upp_core::{CurveError, Rational};

use all_strategies::all_strategies;

mod common;
use common::{init_tracing, r, rs};

#[apply(all_strategies)]
fn rate_latency_with_sigma_rho(engine: impl Convolution) {
    init_tracing();
    let f = rate_latency(10, 11).unwrap();
    let g = sigma_rho(4, 2).unwrap();
    let h = engine.min_plus(&f, &g).unwrap();

    // Zero until the service starts, then the burst drains at rate 2
    assert_eq!(h.value_at(&r("23/2")), r("5"));
    for t in 0..=50i64 {
        let expected = if t <= 11 { 0 } else { 2 * t - 18 };
        assert_eq!(h.value_at(&Rational::from(t)), Rational::from(expected), "at {t}");
    }
    assert!(h.equivalent(&engine.min_plus(&g, &f).unwrap()));
}

#[apply(all_strategies)]
fn staircase_is_subadditive(engine: impl Convolution) {
    let f = constant_jumps_staircase(&[], &rs(&["3", "5"])).unwrap();
    let h = engine.min_plus(&f, &f).unwrap();
    assert_eq!(h.value_at(&r("3")), r("5"));
    assert_eq!(h.value_at(&r("6")), r("10"));
    assert_eq!(h.value_at(&r("13/2")), r("15"));
    assert!(h.equivalent(&f));
}

#[apply(all_strategies)]
fn max_plus_of_rate_latencies(engine: impl Convolution) {
    let f = rate_latency(2, 3).unwrap();
    let g = rate_latency(1, 1).unwrap();
    let h = engine.max_plus(&f, &g).unwrap();
    for (t, v) in [("0", "0"), ("1", "0"), ("2", "1"), ("5", "4"), ("10", "14")] {
        assert_eq!(h.value_at(&r(t)), r(v), "at {t}");
    }
    assert!(h.equivalent(&engine.max_plus(&g, &f).unwrap()));
}

#[apply(all_strategies)]
fn zero_operands(engine: impl Convolution) {
    let rising = rate_latency(1, 1).unwrap();
    assert!(engine.max_plus(&zero(), &rising).unwrap().equivalent(&rising));
    assert!(engine.max_plus(&rising, &zero()).unwrap().equivalent(&rising));

    let bursty = sigma_rho(4, 2).unwrap();
    assert!(engine.min_plus(&zero(), &bursty).unwrap().is_zero());
}

#[apply(all_strategies)]
fn delay_commutes_with_convolution(engine: impl Convolution) {
    let f = constant_jumps_staircase(&[], &rs(&["3", "5"])).unwrap();
    let g = rate_latency(1, 1).unwrap();
    let delay = r("2");

    let delayed_first = engine.min_plus(&f.delay_by(&delay).unwrap(), &g).unwrap();
    let delayed_after = engine.min_plus(&f, &g).unwrap().delay_by(&delay).unwrap();
    assert!(delayed_first.equivalent(&delayed_after));
}

#[apply(all_strategies)]
fn no_delay_is_the_identity(engine: impl Convolution) {
    let identity = delay_service(0).unwrap();
    let operands = [
        rate_latency(10, 11).unwrap(),
        sigma_rho(4, 2).unwrap(),
        constant_jumps_staircase(&[], &rs(&["3", "5"])).unwrap(),
        rate_latency(1, 1).unwrap().negate(),
    ];
    for f in &operands {
        assert!(engine.min_plus(f, &identity).unwrap().equivalent(f), "{f}");
        assert!(engine.min_plus(&identity, f).unwrap().equivalent(f), "{f}");
    }
}

#[apply(all_strategies)]
fn delay_service_delays(engine: impl Convolution) {
    let delay = r("2");
    let f = constant_jumps_staircase(&[], &rs(&["3", "5"])).unwrap();
    let g = delay_service(delay.clone()).unwrap();
    let h = engine.min_plus(&f, &g).unwrap();
    assert!(h.equivalent(&f.delay_by(&delay).unwrap()));
    assert_eq!(h.value_at(&r("2")), r("0"));
    assert_eq!(h.value_at(&r("5/2")), r("5"));
    assert_eq!(h.value_at(&r("11/2")), r("10"));

    let chained = engine.min_plus(&g, &delay_service(3).unwrap()).unwrap();
    assert_eq!(chained.delay_service_latency(), Some(r("5")));

    assert!(matches!(
        engine.min_plus(&rate_latency(1, 1).unwrap().negate(), &g),
        Err(ConvolutionError::Curve(CurveError::InvalidCurveShape(_)))
    ));
    assert!(matches!(
        engine.max_plus(&f, &g),
        Err(ConvolutionError::Curve(CurveError::InvalidCurveShape(_)))
    ));
}

#[apply(all_strategies)]
fn max_plus_needs_right_continuity(engine: impl Convolution) {
    let bursty = sigma_rho(4, 2).unwrap();
    let rising = rate_latency(1, 1).unwrap();
    assert!(matches!(
        engine.max_plus(&bursty, &rising),
        Err(ConvolutionError::Curve(CurveError::InvalidCurveShape(_)))
    ));
}

#[rstest]
fn entry_points_follow_the_settings(
    #[values(Strategy::Direct, Strategy::Isospeed, Strategy::SuperIsospeed, Strategy::Inversion)]
    strategy: Strategy,
    #[values(false, true)] parallel: bool,
) {
    let settings = ConvolutionSettings {
        use_parallelism: parallel,
        ..ConvolutionSettings::for_strategy(strategy)
    };
    let f = rate_latency(10, 11).unwrap();
    let g = sigma_rho(4, 2).unwrap();
    let h = upp_conv::min_plus_convolution(&f, &g, &settings).unwrap();
    assert_eq!(h.value_at(&r("20")), r("22"));

    let f = rate_latency(2, 3).unwrap();
    let g = rate_latency(1, 1).unwrap();
    let h = upp_conv::convolution(&f, &g, ConvolutionKind::MaxPlus, &settings).unwrap();
    assert!(h.equivalent(&upp_conv::max_plus_convolution(&g, &f, &settings).unwrap()));
    assert_eq!(h.value_at(&r("10")), r("14"));
}
