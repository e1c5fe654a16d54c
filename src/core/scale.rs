use std::f64::consts::{FRAC_PI_2, TAU};

use serde::{Deserialize, Serialize};

use crate::error::{ScrollyError, ScrollyResult};
use crate::render::Color;

/// Continuous domain to pixel mapping. The domain start maps to the range start,
/// so inverted ranges give top-down y axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
    range_start: f64,
    range_end: f64,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> ScrollyResult<Self> {
        if !domain.0.is_finite() || !domain.1.is_finite() {
            return Err(ScrollyError::InvalidData(
                "scale domain must be finite".to_owned(),
            ));
        }
        if !range.0.is_finite() || !range.1.is_finite() {
            return Err(ScrollyError::InvalidData(
                "scale range must be finite".to_owned(),
            ));
        }

        Ok(Self {
            domain_start: domain.0,
            domain_end: domain.1,
            range_start: range.0,
            range_end: range.1,
        })
    }

    /// Count scale over `[0, domain_max]`.
    pub fn from_max(domain_max: f64, range: (f64, f64)) -> ScrollyResult<Self> {
        Self::new((0.0, domain_max), range)
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    #[must_use]
    pub fn range(self) -> (f64, f64) {
        (self.range_start, self.range_end)
    }

    /// Maps a domain value to pixels. A zero-width domain maps everything to
    /// the range start.
    #[must_use]
    pub fn map(self, value: f64) -> f64 {
        let span = self.domain_end - self.domain_start;
        if span == 0.0 {
            return self.range_start;
        }
        let normalized = (value - self.domain_start) / span;
        self.range_start + normalized * (self.range_end - self.range_start)
    }

    /// Length in pixels of `[domain_start, value]`, always non-negative.
    #[must_use]
    pub fn extent(self, value: f64) -> f64 {
        (self.map(value) - self.range_start).abs()
    }

    #[must_use]
    pub fn invert(self, pixel: f64) -> f64 {
        let span = self.range_end - self.range_start;
        if span == 0.0 {
            return self.domain_start;
        }
        let normalized = (pixel - self.range_start) / span;
        self.domain_start + normalized * (self.domain_end - self.domain_start)
    }

    /// Round tick values inside the domain, roughly `count` of them, using
    /// steps of 1, 2, or 5 times a power of ten.
    #[must_use]
    pub fn ticks(self, count: usize) -> Vec<f64> {
        let (low, high) = if self.domain_start <= self.domain_end {
            (self.domain_start, self.domain_end)
        } else {
            (self.domain_end, self.domain_start)
        };
        if count == 0 || low == high {
            return if count == 0 { Vec::new() } else { vec![low] };
        }

        let raw_step = (high - low) / count as f64;
        let power = raw_step.log10().floor();
        let error = raw_step / 10_f64.powf(power);
        let factor = if error >= 50_f64.sqrt() {
            10.0
        } else if error >= 10_f64.sqrt() {
            5.0
        } else if error >= 2_f64.sqrt() {
            2.0
        } else {
            1.0
        };

        // Negative powers divide by the inverse step to keep ticks exact.
        let step = factor * 10_f64.powf(power);
        let inverse = (power < 0.0).then(|| 10_f64.powf(-power) / factor);
        let (first, last) = match inverse {
            Some(inverse) => ((low * inverse).ceil(), (high * inverse).floor()),
            None => ((low / step).ceil(), (high / step).floor()),
        };
        let to_value = |index: f64| inverse.map_or(index * step, |inverse| index / inverse);

        let mut ticks = Vec::new();
        let mut index = first;
        while index <= last {
            ticks.push(to_value(index));
            index += 1.0;
        }
        ticks
    }
}

/// Evenly spaced bands for a category list.
///
/// Inner and outer padding are equal, so each band gives up `padding * step`
/// of space, split evenly on both sides.
#[derive(Debug, Clone, PartialEq)]
pub struct BandScale<C> {
    categories: Vec<C>,
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl<C: Copy + PartialEq> BandScale<C> {
    pub fn new(categories: Vec<C>, range: (f64, f64), padding: f64) -> ScrollyResult<Self> {
        if !(0.0..1.0).contains(&padding) {
            return Err(ScrollyError::InvalidData(
                "band padding must be in [0, 1)".to_owned(),
            ));
        }
        if !range.0.is_finite() || !range.1.is_finite() {
            return Err(ScrollyError::InvalidData(
                "band range must be finite".to_owned(),
            ));
        }

        let count = categories.len() as f64;
        let span = range.1 - range.0;
        let step = span / (count - padding + 2.0 * padding).max(1.0);
        let start = range.0 + (span - step * (count - padding)) * 0.5;

        Ok(Self {
            categories,
            start,
            step,
            bandwidth: step * (1.0 - padding),
        })
    }

    #[must_use]
    pub fn categories(&self) -> &[C] {
        &self.categories
    }

    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }

    #[must_use]
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Leading edge of the band for `category`.
    #[must_use]
    pub fn position(&self, category: C) -> Option<f64> {
        self.categories
            .iter()
            .position(|candidate| *candidate == category)
            .map(|index| self.start + self.step * index as f64)
    }

    #[must_use]
    pub fn center(&self, category: C) -> Option<f64> {
        self.position(category)
            .map(|position| position + self.bandwidth / 2.0)
    }
}

/// Stable category to color assignment that cycles through a palette.
#[derive(Debug, Clone, PartialEq)]
pub struct OrdinalColorScale<C> {
    categories: Vec<C>,
    palette: Vec<Color>,
}

impl<C: Copy + PartialEq> OrdinalColorScale<C> {
    pub fn new(categories: Vec<C>, palette: Vec<Color>) -> ScrollyResult<Self> {
        if palette.is_empty() {
            return Err(ScrollyError::InvalidData(
                "color palette must not be empty".to_owned(),
            ));
        }
        Ok(Self {
            categories,
            palette,
        })
    }

    /// Unknown categories get the first palette color.
    #[must_use]
    pub fn color(&self, category: C) -> Color {
        let index = self
            .categories
            .iter()
            .position(|candidate| *candidate == category)
            .unwrap_or(0);
        self.palette[index % self.palette.len()]
    }
}

/// Area-proportional radius: `max_radius * sqrt(value / domain_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SqrtScale {
    domain_max: f64,
    max_radius: f64,
}

impl SqrtScale {
    #[must_use]
    pub fn new(domain_max: f64, max_radius: f64) -> Self {
        Self {
            domain_max,
            max_radius,
        }
    }

    #[must_use]
    pub fn radius(self, value: f64) -> f64 {
        if self.domain_max <= 0.0 || !self.domain_max.is_finite() || !value.is_finite() {
            return 0.0;
        }
        self.max_radius * (value.max(0.0) / self.domain_max).sqrt()
    }
}

/// Angular extent of one pie slice, in radians clockwise from twelve o'clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PieArc {
    pub start_angle: f64,
    pub end_angle: f64,
}

impl PieArc {
    #[must_use]
    pub fn sweep(self) -> f64 {
        self.end_angle - self.start_angle
    }

    /// Midpoint of the arc band between `inner` and `outer` radius, relative
    /// to the pie center.
    #[must_use]
    pub fn centroid(self, inner: f64, outer: f64) -> (f64, f64) {
        let radius = (inner + outer) / 2.0;
        let angle = (self.start_angle + self.end_angle) / 2.0 - FRAC_PI_2;
        (angle.cos() * radius, angle.sin() * radius)
    }
}

/// Assigns angles in caller order, starting at zero.
///
/// A zero or non-finite total yields zero-width arcs. Negative values count as
/// zero.
#[must_use]
pub fn pie_angles(values: &[f64]) -> Vec<PieArc> {
    let total: f64 = values.iter().map(|value| value.max(0.0)).sum();
    if total <= 0.0 || !total.is_finite() {
        return values
            .iter()
            .map(|_| PieArc {
                start_angle: 0.0,
                end_angle: 0.0,
            })
            .collect();
    }

    let mut cursor = 0.0;
    values
        .iter()
        .map(|value| {
            let start_angle = cursor;
            cursor += value.max(0.0) / total * TAU;
            PieArc {
                start_angle,
                end_angle: cursor,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::category::Outcome;

    #[test]
    fn nice_ticks_follow_decimal_steps() {
        let scale = LinearScale::new((0.0, 100.0), (0.0, 500.0)).expect("scale");
        assert_eq!(
            scale.ticks(5),
            vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]
        );

        let small = LinearScale::new((0.0, 0.5), (0.0, 1.0)).expect("scale");
        assert_eq!(small.ticks(5), vec![0.0, 0.1, 0.2, 0.3, 0.4, 0.5]);
    }

    #[test]
    fn band_scale_splits_padding_evenly() {
        let bands = BandScale::new(
            vec![Outcome::Granted, Outcome::Denied],
            (0.0, 100.0),
            0.2,
        )
        .expect("bands");
        let first = bands.position(Outcome::Granted).expect("granted");
        let second = bands.position(Outcome::Denied).expect("denied");
        let trailing = 100.0 - (second + bands.bandwidth());
        assert!((first - trailing).abs() <= 1e-9);
        assert!((bands.step() - 100.0 / 2.2).abs() <= 1e-9);
        assert!(bands.position(Outcome::Other).is_none());
    }

    #[test]
    fn zero_total_pie_is_all_zero_arcs() {
        let arcs = pie_angles(&[0.0, 0.0]);
        assert!(arcs.iter().all(|arc| arc.sweep() == 0.0));
    }
}
