use serde::Serialize;
use statrs::distribution::{Binomial, ContinuousCDF, Discrete, StudentsT};
use statrs::function::beta::inv_beta_reg;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::YearCount;
use crate::streaks::StreakSet;

/// Relative tolerance when comparing outcome probabilities in the exact test
const PMF_RELATIVE_TOLERANCE: f64 = 1e-7;

#[derive(Error, Debug)]
pub enum StatisticsError {
    #[error("Confidence level must lie strictly between 0 and 1, got {0}")]
    ConfidenceLevel(f64),

    #[error("Invalid distribution parameters: {0}")]
    Distribution(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParitySummary {
    pub odd_count: usize,
    pub even_count: usize,
    pub total: usize,
    /// Point estimate of the odd-length proportion
    pub proportion_odd: f64,
    /// Exact two-sided binomial test against 0.5
    pub p_value: f64,
    pub ci_low: f64,
    pub ci_high: f64,
    pub confidence_level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ParityTest {
    Computed(ParitySummary),
    InsufficientData { odd_count: usize, even_count: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSummary {
    pub years: usize,
    pub slope: f64,
    pub intercept: f64,
    pub slope_std_error: f64,
    /// `None` for a perfect fit, where the statistic is unbounded
    pub t_statistic: Option<f64>,
    pub slope_p_value: f64,
    /// `None` when every year has the same total
    pub r_squared: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrendTest {
    Computed(TrendSummary),
    InsufficientData { years: usize },
}

/// Hypothesis tests on streak parity and yearly totals
#[derive(Debug, Clone)]
pub struct StatisticsService {
    confidence_level: f64,
}

impl StatisticsService {
    pub fn new(confidence_level: f64) -> Result<Self, StatisticsError> {
        if !(confidence_level > 0.0 && confidence_level < 1.0) {
            return Err(StatisticsError::ConfidenceLevel(confidence_level));
        }
        Ok(Self { confidence_level })
    }

    pub fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    pub fn streak_parity(&self, streaks: &StreakSet) -> Result<ParityTest, StatisticsError> {
        self.parity_test(streaks.odd_count(), streaks.even_count())
    }

    /// Test whether odd-length streaks are as common as even-length ones
    pub fn parity_test(
        &self,
        odd_count: usize,
        even_count: usize,
    ) -> Result<ParityTest, StatisticsError> {
        let total = odd_count + even_count;
        if total == 0 {
            info!("No streaks, skipping parity test");
            return Ok(ParityTest::InsufficientData {
                odd_count,
                even_count,
            });
        }

        let p_value = binomial_test_two_sided(odd_count as u64, total as u64, 0.5)?;
        let (ci_low, ci_high) =
            clopper_pearson(odd_count as u64, total as u64, self.confidence_level)?;

        let summary = ParitySummary {
            odd_count,
            even_count,
            total,
            proportion_odd: odd_count as f64 / total as f64,
            p_value,
            ci_low,
            ci_high,
            confidence_level: self.confidence_level,
        };
        info!(
            "Streak parity: {}/{} odd (p = {:.3e})",
            odd_count, total, summary.p_value
        );

        Ok(ParityTest::Computed(summary))
    }

    /// Ordinary least squares of yearly totals on year
    pub fn trend_test(&self, totals: &[YearCount]) -> Result<TrendTest, StatisticsError> {
        let n = totals.len();
        if n < 3 {
            info!("Only {} years of data, skipping trend test", n);
            return Ok(TrendTest::InsufficientData { years: n });
        }

        let xs: Vec<f64> = totals.iter().map(|t| t.year as f64).collect();
        let ys: Vec<f64> = totals.iter().map(|t| t.count as f64).collect();
        let mean_x = xs.iter().sum::<f64>() / n as f64;
        let mean_y = ys.iter().sum::<f64>() / n as f64;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        let mut syy = 0.0;
        for (x, y) in xs.iter().zip(&ys) {
            sxx += (x - mean_x).powi(2);
            sxy += (x - mean_x) * (y - mean_y);
            syy += (y - mean_y).powi(2);
        }
        if sxx == 0.0 {
            return Ok(TrendTest::InsufficientData { years: n });
        }

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        let sse: f64 = xs
            .iter()
            .zip(&ys)
            .map(|(x, y)| (y - (intercept + slope * x)).powi(2))
            .sum();

        let df = (n - 2) as f64;
        let slope_std_error = (sse / df / sxx).sqrt();

        let (t_statistic, slope_p_value) = if slope_std_error == 0.0 {
            (None, if slope == 0.0 { 1.0 } else { 0.0 })
        } else {
            let t = slope / slope_std_error;
            let dist = StudentsT::new(0.0, 1.0, df)
                .map_err(|e| StatisticsError::Distribution(e.to_string()))?;
            (Some(t), (2.0 * dist.sf(t.abs())).min(1.0))
        };

        let r_squared = (syy > 0.0).then(|| 1.0 - sse / syy);

        debug!(
            "Trend over {} years: slope {:.4} ± {:.4}",
            n, slope, slope_std_error
        );

        Ok(TrendTest::Computed(TrendSummary {
            years: n,
            slope,
            intercept,
            slope_std_error,
            t_statistic,
            slope_p_value,
            r_squared,
        }))
    }
}

/// Exact two-sided binomial test
///
/// Sums the probability of every outcome no more likely than the observed
/// one.
pub fn binomial_test_two_sided(
    successes: u64,
    trials: u64,
    p: f64,
) -> Result<f64, StatisticsError> {
    let dist =
        Binomial::new(p, trials).map_err(|e| StatisticsError::Distribution(e.to_string()))?;
    let bound = dist.pmf(successes) * (1.0 + PMF_RELATIVE_TOLERANCE);

    let p_value: f64 = (0..=trials)
        .map(|k| dist.pmf(k))
        .filter(|&pk| pk <= bound)
        .sum();

    Ok(p_value.min(1.0))
}

/// Clopper-Pearson interval for a binomial proportion
pub fn clopper_pearson(
    successes: u64,
    trials: u64,
    confidence_level: f64,
) -> Result<(f64, f64), StatisticsError> {
    let alpha = 1.0 - confidence_level;
    let x = successes as f64;
    let n = trials as f64;

    // Beta quantiles via the inverse regularized incomplete beta function
    let low = if successes == 0 {
        0.0
    } else {
        inv_beta_reg(x, n - x + 1.0, alpha / 2.0)
    };
    let high = if successes >= trials {
        1.0
    } else {
        inv_beta_reg(x + 1.0, n - x, 1.0 - alpha / 2.0)
    };

    Ok((low, high))
}
