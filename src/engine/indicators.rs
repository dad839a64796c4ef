//! Rolling mean and Bollinger-style bands over a close series.
//!
//! Output series are index-aligned with the input: the first `window - 1`
//! entries are `None` (warmup). Standard deviation is the population form
//! (divide by N).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndicatorError {
    #[error("insufficient data: need {needed} samples, have {available}")]
    InsufficientData { needed: usize, available: usize },
    #[error("window must be greater than zero")]
    ZeroWindow,
}

/// Index-aligned indicator output; `None` during warmup.
pub type Series = Vec<Option<f64>>;

/// Band offsets in standard deviations, applied as `mean + m * std`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandMultipliers {
    pub upper: f64,
    pub mid: f64,
    pub lower: f64,
}

impl BandMultipliers {
    /// Symmetric `{+k, 0, -k}` bands.
    pub fn symmetric(k: f64) -> Self {
        Self {
            upper: k,
            mid: 0.0,
            lower: -k,
        }
    }
}

impl Default for BandMultipliers {
    fn default() -> Self {
        Self::symmetric(2.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bands {
    pub upper: Series,
    pub mid: Series,
    pub lower: Series,
}

fn check_window(len: usize, window: usize) -> Result<(), IndicatorError> {
    if window == 0 {
        return Err(IndicatorError::ZeroWindow);
    }
    if len < window {
        return Err(IndicatorError::InsufficientData {
            needed: window,
            available: len,
        });
    }
    Ok(())
}

fn window_mean(window: &[f64]) -> f64 {
    window.iter().sum::<f64>() / window.len() as f64
}

fn window_pstd(window: &[f64], mean: f64) -> f64 {
    let variance = window
        .iter()
        .map(|v| {
            let diff = v - mean;
            diff * diff
        })
        .sum::<f64>()
        / window.len() as f64;
    variance.sqrt()
}

/// Mean of the `window` most recent samples ending at each index.
pub fn rolling_mean(series: &[f64], window: usize) -> Result<Series, IndicatorError> {
    check_window(series.len(), window)?;
    let warmup = window - 1;

    Ok((0..series.len())
        .map(|i| {
            if i < warmup {
                return None;
            }
            Some(window_mean(&series[i + 1 - window..=i]))
        })
        .collect())
}

/// Population standard deviation over the trailing window.
pub fn rolling_std(series: &[f64], window: usize) -> Result<Series, IndicatorError> {
    check_window(series.len(), window)?;
    let warmup = window - 1;

    Ok((0..series.len())
        .map(|i| {
            if i < warmup {
                return None;
            }
            let slice = &series[i + 1 - window..=i];
            Some(window_pstd(slice, window_mean(slice)))
        })
        .collect())
}

/// Named bands `mean + m * std` for each multiplier.
pub fn rolling_bands(
    series: &[f64],
    window: usize,
    multipliers: BandMultipliers,
) -> Result<Bands, IndicatorError> {
    let means = rolling_mean(series, window)?;
    let stds = rolling_std(series, window)?;

    let band = |m: f64| -> Series {
        means
            .iter()
            .zip(stds.iter())
            .map(|(mean, std)| match (mean, std) {
                (Some(mean), Some(std)) => Some(mean + m * std),
                _ => None,
            })
            .collect()
    };

    Ok(Bands {
        upper: band(multipliers.upper),
        mid: band(multipliers.mid),
        lower: band(multipliers.lower),
    })
}

/// Last defined value of a series.
pub fn latest(series: &[Option<f64>]) -> Option<f64> {
    series.last().copied().flatten()
}
