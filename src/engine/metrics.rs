use statrs::statistics::Statistics;

/// Annualization basis for continuously-traded assets.
pub const PERIODS_PER_YEAR: f64 = 365.0;

/// Sharpe-style ratio: mean / sample std dev * sqrt(periods per year).
/// Fewer than two points or zero dispersion score 0 — an always-flat
/// strategy is neither rewarded nor treated as an error.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> f64 {
    if returns.len() < 2 {
        return 0.0;
    }
    let mean = returns.iter().mean();
    let std_dev = returns.iter().std_dev();
    if std_dev == 0.0 || !std_dev.is_finite() {
        return 0.0;
    }
    (mean / std_dev) * periods_per_year.sqrt()
}

/// Convert a total log return to a simple percentage return.
pub fn percent_return(total_log_return: f64) -> f64 {
    total_log_return.exp() - 1.0
}

/// Fraction of `values` strictly below `score`.
pub fn percentile_rank(values: &[f64], score: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|&&v| v < score).count() as f64 / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharpe_positive_for_uptrending_series() {
        let returns = vec![0.01, 0.02, 0.015, 0.03, 0.01];
        assert!(sharpe_ratio(&returns, 365.0) > 0.0);
    }

    #[test]
    fn test_sharpe_zero_variance_scores_zero() {
        let returns = vec![0.0; 50];
        assert_eq!(sharpe_ratio(&returns, 365.0), 0.0);
        let returns = vec![0.02; 50];
        assert_eq!(sharpe_ratio(&returns, 365.0), 0.0);
    }

    #[test]
    fn test_sharpe_short_series_scores_zero() {
        assert_eq!(sharpe_ratio(&[], 365.0), 0.0);
        assert_eq!(sharpe_ratio(&[0.05], 365.0), 0.0);
    }

    #[test]
    fn test_sharpe_matches_hand_computation() {
        let returns = vec![0.01, 0.03];
        // mean 0.02, sample std dev = 0.01414..., annualized over 365
        let mean = 0.02;
        let sd = ((0.01f64 - 0.02).powi(2) + (0.03f64 - 0.02).powi(2)).sqrt();
        let expected = mean / sd * 365.0f64.sqrt();
        assert!((sharpe_ratio(&returns, 365.0) - expected).abs() < 1e-10);
    }

    #[test]
    fn test_percent_return() {
        assert!((percent_return(0.0) - 0.0).abs() < 1e-12);
        assert!((percent_return(2.0f64.ln()) - 1.0).abs() < 1e-12);
        assert!((percent_return(0.5f64.ln()) - (-0.5)).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_rank() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile_rank(&values, 2.5), 0.5);
        assert_eq!(percentile_rank(&values, 0.5), 0.0);
        assert_eq!(percentile_rank(&values, 10.0), 1.0);
        assert_eq!(percentile_rank(&[], 1.0), 0.0);
    }
}
