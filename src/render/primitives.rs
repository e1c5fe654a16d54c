use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::primitives::lerp;
use crate::error::{ScrollyError, ScrollyResult};

/// RGBA color in normalized 0..=1 channel values.
///
/// Serializes as `#rrggbb` (or `#rrggbbaa` when not opaque).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
    pub alpha: f64,
}

impl Color {
    #[must_use]
    pub const fn rgba(red: f64, green: f64, blue: f64, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    #[must_use]
    pub const fn rgb(red: f64, green: f64, blue: f64) -> Self {
        Self::rgba(red, green, blue, 1.0)
    }

    /// Parses `#rgb`, `#rrggbb`, or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> ScrollyResult<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || ScrollyError::InvalidData(format!("invalid hex color `{hex}`"));
        if !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |slice: &str| {
            u8::from_str_radix(slice, 16)
                .map(|value| f64::from(value) / 255.0)
                .map_err(|_| invalid())
        };

        match digits.len() {
            3 => {
                let mut channels = [0.0; 3];
                for (slot, index) in channels.iter_mut().zip(0..3) {
                    let nibble = &digits[index..=index];
                    *slot = channel(&format!("{nibble}{nibble}"))?;
                }
                Ok(Self::rgb(channels[0], channels[1], channels[2]))
            }
            6 => Ok(Self::rgb(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            8 => Ok(Self::rgba(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
                channel(&digits[6..8])?,
            )),
            _ => Err(invalid()),
        }
    }

    #[must_use]
    pub fn to_hex(self) -> String {
        let byte = |value: f64| (value.clamp(0.0, 1.0) * 255.0).round() as u8;
        if self.alpha >= 1.0 {
            format!(
                "#{:02x}{:02x}{:02x}",
                byte(self.red),
                byte(self.green),
                byte(self.blue)
            )
        } else {
            format!(
                "#{:02x}{:02x}{:02x}{:02x}",
                byte(self.red),
                byte(self.green),
                byte(self.blue),
                byte(self.alpha)
            )
        }
    }

    #[must_use]
    pub fn lerp(self, to: Self, t: f64) -> Self {
        Self::rgba(
            lerp(self.red, to.red, t),
            lerp(self.green, to.green, t),
            lerp(self.blue, to.blue, t),
            lerp(self.alpha, to.alpha, t),
        )
    }

    pub fn validate(self) -> ScrollyResult<()> {
        for (channel, value) in [
            ("red", self.red),
            ("green", self.green),
            ("blue", self.blue),
            ("alpha", self.alpha),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ScrollyError::InvalidData(format!(
                    "color channel `{channel}` must be finite and in [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = ScrollyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_hex()
    }
}

/// Identifier of one scene element, e.g. `bar1-GRANTED`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(String);

impl ElementId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ElementId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ElementId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Rect,
    Circle,
    Slice,
    Text,
    Path,
    Group,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKey {
    X,
    Y,
    Width,
    Height,
    Cx,
    Cy,
    Radius,
    InnerRadius,
    StartAngle,
    EndAngle,
    Opacity,
    Fill,
    Visible,
    Value,
    Points,
    Text,
}

impl PropertyKey {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Width => "width",
            Self::Height => "height",
            Self::Cx => "cx",
            Self::Cy => "cy",
            Self::Radius => "radius",
            Self::InnerRadius => "inner_radius",
            Self::StartAngle => "start_angle",
            Self::EndAngle => "end_angle",
            Self::Opacity => "opacity",
            Self::Fill => "fill",
            Self::Visible => "visible",
            Self::Value => "value",
            Self::Points => "points",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Value of one visual property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    Number(f64),
    Color(Color),
    Visible(bool),
    Points(Vec<(f64, f64)>),
    Text(String),
}

impl PropertyValue {
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_visible(&self) -> Option<bool> {
        match self {
            Self::Visible(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_points(&self) -> Option<&[(f64, f64)]> {
        match self {
            Self::Points(points) => Some(points),
            _ => None,
        }
    }

    /// Interpolates between two values.
    ///
    /// Numbers, colors, and equal-length point lists blend continuously.
    /// Everything else switches to `to` as soon as `t > 0`.
    #[must_use]
    pub fn interpolate(from: &Self, to: &Self, t: f64) -> Self {
        if t >= 1.0 {
            return to.clone();
        }
        match (from, to) {
            (Self::Number(a), Self::Number(b)) => Self::Number(lerp(*a, *b, t)),
            (Self::Color(a), Self::Color(b)) => Self::Color(a.lerp(*b, t)),
            (Self::Points(a), Self::Points(b)) if a.len() == b.len() => Self::Points(
                a.iter()
                    .zip(b)
                    .map(|(p, q)| (lerp(p.0, q.0, t), lerp(p.1, q.1, t)))
                    .collect(),
            ),
            _ if t > 0.0 => to.clone(),
            _ => from.clone(),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<Color> for PropertyValue {
    fn from(value: Color) -> Self {
        Self::Color(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Visible(value)
    }
}
