use serde::{Deserialize, Serialize};

use crate::error::{ScrollyError, ScrollyResult};

/// Easing curves for stage transitions. `Power1` is quadratic, `Power2` cubic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ease {
    Linear,
    Power1In,
    #[default]
    Power1Out,
    Power1InOut,
    Power2In,
    Power2Out,
    Power2InOut,
}

impl Ease {
    /// Maps linear progress to eased progress. Input is clamped to `[0, 1]`.
    #[must_use]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Power1In => t * t,
            Self::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
            Self::Power1InOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(2) / 2.0)
                }
            }
            Self::Power2In => t * t * t,
            Self::Power2Out => 1.0 - (1.0 - t).powi(3),
            Self::Power2InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }

    /// Parses names like `none`, `linear`, `power1.out`, `power2.inOut`.
    pub fn parse(name: &str) -> ScrollyResult<Self> {
        let normalized = name.trim().to_ascii_lowercase();
        let ease = match normalized.as_str() {
            "none" | "linear" => Self::Linear,
            "power1.in" => Self::Power1In,
            "power1" | "power1.out" => Self::Power1Out,
            "power1.inout" => Self::Power1InOut,
            "power2.in" => Self::Power2In,
            "power2" | "power2.out" => Self::Power2Out,
            "power2.inout" => Self::Power2InOut,
            _ => {
                return Err(ScrollyError::InvalidData(format!(
                    "unknown ease `{name}`"
                )));
            }
        };
        Ok(ease)
    }
}
