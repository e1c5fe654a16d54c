use serde::{Deserialize, Serialize};

use crate::error::{ScrollyError, ScrollyResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    #[must_use]
    pub fn is_valid(self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn validate(self) -> ScrollyResult<Self> {
        if !self.is_valid() {
            return Err(ScrollyError::InvalidViewport {
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }

    #[must_use]
    pub fn center(self) -> (f64, f64) {
        (f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Pixel margins around the drawable chart area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 20.0,
            right: 20.0,
            bottom: 80.0,
            left: 20.0,
        }
    }
}

impl Margins {
    pub fn validate(self, viewport: Viewport) -> ScrollyResult<Self> {
        for (side, value) in [
            ("top", self.top),
            ("right", self.right),
            ("bottom", self.bottom),
            ("left", self.left),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ScrollyError::InvalidData(format!(
                    "margin `{side}` must be finite and >= 0"
                )));
            }
        }

        if self.left + self.right >= f64::from(viewport.width)
            || self.top + self.bottom >= f64::from(viewport.height)
        {
            return Err(ScrollyError::InvalidData(
                "margins must leave a drawable area inside the viewport".to_owned(),
            ));
        }
        Ok(self)
    }

    /// Horizontal pixel range `[left, width - right]`.
    #[must_use]
    pub fn x_range(self, viewport: Viewport) -> (f64, f64) {
        (self.left, f64::from(viewport.width) - self.right)
    }

    /// Vertical pixel range `[top, height - bottom]`.
    #[must_use]
    pub fn y_range(self, viewport: Viewport) -> (f64, f64) {
        (self.top, f64::from(viewport.height) - self.bottom)
    }
}
