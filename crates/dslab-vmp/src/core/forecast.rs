//! Score trend forecasting.

/// Smoothing factor of the level.
pub const ALPHA: f64 = 0.5;
/// Smoothing factor of the trend.
pub const BETA: f64 = 0.5;

/// Forecasts `n` values ahead with double exponential (Holt) smoothing.
///
/// The level starts at the first value and the trend at the difference of the first two.
pub fn double_exponential_smoothing(series: &[f64], alpha: f64, beta: f64, n: usize) -> Vec<f64> {
    let mut level = 0.;
    let mut trend = 0.;
    for i in 1..series.len() {
        if i == 1 {
            level = series[0];
            trend = series[1] - series[0];
        }
        let last_level = level;
        level = alpha * series[i] + (1. - alpha) * (level + trend);
        trend = beta * (level - last_level) + (1. - beta) * trend;
    }
    (1..=n).map(|k| level + k as f64 * trend).collect()
}

/// Whether the score is expected to get worse: the forecast never decreases.
///
/// At least two values are needed to estimate a trend, shorter series never trigger.
pub fn call_to_reconfiguration(series: &[f64], forecast_size: usize) -> bool {
    if series.len() < 2 {
        return false;
    }
    let forecast = double_exponential_smoothing(series, ALPHA, BETA, forecast_size);
    forecast.windows(2).all(|w| w[0] <= w[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_series_is_extrapolated() {
        let forecast = double_exponential_smoothing(&[1., 2., 3., 4.], ALPHA, BETA, 2);
        assert_eq!(forecast.len(), 2);
        assert!(forecast[0] > 4. - 1e-9);
        assert!(forecast[1] > forecast[0]);
    }

    #[test]
    fn test_flat_series_triggers() {
        assert!(call_to_reconfiguration(&[0.5, 0.5, 0.5, 0.5], 3));
    }

    #[test]
    fn test_short_series_does_not_trigger() {
        assert!(!call_to_reconfiguration(&[], 5));
        assert!(!call_to_reconfiguration(&[0.9], 5));
        assert!(call_to_reconfiguration(&[0.4, 0.9], 5));
    }
}
