//! Kernel density estimation and the normal reference curve.

#[cfg(feature = "parallel-density")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::primitives::{finite_mean, sample_deviation};
use crate::core::record::Record;
use crate::error::{ScrollyError, ScrollyResult};

pub const DEFAULT_BANDWIDTH: f64 = 10.0;
pub const DEFAULT_SAMPLE_COUNT: usize = 60;
/// Padding added on both sides of the observed range when sampling curves.
pub const DOMAIN_PADDING: f64 = 10.0;

/// Epanechnikov kernel: `0.75 * (1 - u^2) / bandwidth` for `|u| <= 1`.
#[must_use]
pub fn epanechnikov(bandwidth: f64, distance: f64) -> f64 {
    let u = distance / bandwidth;
    if u.abs() <= 1.0 {
        0.75 * (1.0 - u * u) / bandwidth
    } else {
        0.0
    }
}

/// Numeric record attribute plotted by the density stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DensityFilter {
    /// Nothing plotted.
    #[default]
    None,
    PropSentServed,
    TimeServedAtInterview,
    TimePastMinimum,
    Age,
    AgeEntered,
    MinSentence,
    MaxSentence,
}

impl DensityFilter {
    pub const ALL: [Self; 8] = [
        Self::None,
        Self::PropSentServed,
        Self::TimeServedAtInterview,
        Self::TimePastMinimum,
        Self::Age,
        Self::AgeEntered,
        Self::MinSentence,
        Self::MaxSentence,
    ];

    /// Key used by filter buttons. `None` is `"null"`.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::None => "null",
            Self::PropSentServed => "prop_sent_served",
            Self::TimeServedAtInterview => "time_serv_at_int",
            Self::TimePastMinimum => "time_past_min",
            Self::Age => "age",
            Self::AgeEntered => "age_entered",
            Self::MinSentence => "min_sent",
            Self::MaxSentence => "max_sent",
        }
    }

    pub fn parse(key: &str) -> ScrollyResult<Self> {
        let key = key.trim();
        if key.is_empty() || key.eq_ignore_ascii_case("none") {
            return Ok(Self::None);
        }
        Self::ALL
            .into_iter()
            .find(|filter| filter.key() == key)
            .ok_or_else(|| ScrollyError::UnknownFilter(key.to_owned()))
    }

    /// Attribute value of one record, if present and finite.
    #[must_use]
    pub fn value(self, record: &Record) -> Option<f64> {
        let value = match self {
            Self::None => None,
            Self::PropSentServed => record.prop_sent_served,
            Self::TimeServedAtInterview => record.time_served,
            Self::TimePastMinimum => record.time_past_min,
            Self::Age => record.age,
            Self::AgeEntered => record.age_entered,
            Self::MinSentence => record.min_sentence,
            Self::MaxSentence => record.max_sentence,
        };
        value.filter(|value| value.is_finite())
    }

    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::None
    }
}

/// One sampled point of a density curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityPoint {
    pub x: f64,
    pub density: f64,
}

fn density_at(values: &[f64], bandwidth: f64, x: f64) -> f64 {
    values
        .iter()
        .map(|value| epanechnikov(bandwidth, x - value))
        .sum::<f64>()
        / values.len() as f64
}

/// Estimates density at every sample x.
///
/// An empty value set yields all-zero densities. Non-finite values must be
/// filtered out by the caller.
#[must_use]
pub fn kernel_density(values: &[f64], sample_xs: &[f64], bandwidth: f64) -> Vec<DensityPoint> {
    if values.is_empty() || bandwidth <= 0.0 || !bandwidth.is_finite() {
        return sample_xs
            .iter()
            .map(|x| DensityPoint { x: *x, density: 0.0 })
            .collect();
    }

    trace!(
        values = values.len(),
        samples = sample_xs.len(),
        bandwidth,
        "estimating kernel density"
    );

    #[cfg(feature = "parallel-density")]
    let points: Vec<DensityPoint> = sample_xs
        .par_iter()
        .map(|x| DensityPoint {
            x: *x,
            density: density_at(values, bandwidth, *x),
        })
        .collect();

    #[cfg(not(feature = "parallel-density"))]
    let points: Vec<DensityPoint> = sample_xs
        .iter()
        .map(|x| DensityPoint {
            x: *x,
            density: density_at(values, bandwidth, *x),
        })
        .collect();

    points
}

/// Evenly spaced sample positions covering `[start, end]` inclusive.
#[must_use]
pub fn sample_positions(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|index| start + step * index as f64).collect()
        }
    }
}

/// Sampling domain for a value set: `[-padding, max + padding]`.
#[must_use]
pub fn padded_domain(values: &[f64]) -> (f64, f64) {
    let max = values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(0.0_f64, f64::max);
    (-DOMAIN_PADDING, max + DOMAIN_PADDING)
}

/// Normal curve fitted to a value set with the sample standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalCurve {
    pub mean: f64,
    pub std_dev: f64,
}

impl NormalCurve {
    /// Fits the curve; `None` for fewer than two values or zero spread.
    #[must_use]
    pub fn fit(values: &[f64]) -> Option<Self> {
        let mean = finite_mean(values.iter().copied())?;
        let std_dev = sample_deviation(values)?;
        if std_dev <= 0.0 {
            return None;
        }
        Some(Self { mean, std_dev })
    }

    #[must_use]
    pub fn pdf(self, x: f64) -> f64 {
        let z = (x - self.mean) / self.std_dev;
        (-0.5 * z * z).exp() / (self.std_dev * (2.0 * std::f64::consts::PI).sqrt())
    }

    #[must_use]
    pub fn sample(self, sample_xs: &[f64]) -> Vec<DensityPoint> {
        sample_xs
            .iter()
            .map(|x| DensityPoint {
                x: *x,
                density: self.pdf(*x),
            })
            .collect()
    }
}
