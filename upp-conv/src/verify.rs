use crate::{ConvolutionError, ConvolutionKind, ConvolutionSettings, Map, Strategy, convolution};
use tracing::{Level, event};
use upp_core::Curve;

/// Convolve with every requested strategy and check that all of them give
/// the same function.
///
/// Each strategy runs with `settings`' speed-ups. Results are keyed by
/// strategy in the order requested; the first disagreement with the first
/// strategy is logged and returned as [`ConvolutionError::StrategyDisagreement`].
pub fn cross_check(
    f: &Curve,
    g: &Curve,
    kind: ConvolutionKind,
    strategies: &[Strategy],
    settings: &ConvolutionSettings,
) -> Result<Map<Strategy, Curve>, ConvolutionError> {
    let mut results = Map::default();
    for &strategy in strategies {
        let result = convolution(f, g, kind, &settings.clone().with_strategy(strategy))?;

        if let Some((&first, expected)) = results.first() {
            if !result.equivalent(expected) {
                event!(
                    Level::ERROR,
                    %first,
                    second = %strategy,
                    f = %f,
                    g = %g,
                    "convolution strategies disagree"
                );
                return Err(ConvolutionError::StrategyDisagreement {
                    first,
                    second: strategy,
                    f: f.to_string(),
                    g: g.to_string(),
                });
            }
        }
        results.insert(strategy, result);
    }
    Ok(results)
}
