use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ScrollyError, ScrollyResult};

/// A point on an element or on the viewport: a fraction of its height plus a
/// pixel offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorPoint {
    pub fraction: f64,
    pub offset: f64,
}

impl AnchorPoint {
    fn parse(token: &str, source: &str) -> ScrollyResult<Self> {
        let invalid = || ScrollyError::InvalidTrigger(format!("cannot parse anchor `{source}`"));

        let (base, offset) = match token.find("+=").or_else(|| token.find("-=")) {
            Some(index) => {
                let magnitude: f64 = token[index + 2..].trim().parse().map_err(|_| invalid())?;
                let sign = if token[index..].starts_with('-') {
                    -1.0
                } else {
                    1.0
                };
                (&token[..index], sign * magnitude)
            }
            None => (token, 0.0),
        };

        let (fraction, base_offset) = match base {
            "top" => (0.0, 0.0),
            "center" => (0.5, 0.0),
            "bottom" => (1.0, 0.0),
            percent if percent.ends_with('%') => {
                let value: f64 = percent[..percent.len() - 1]
                    .parse()
                    .map_err(|_| invalid())?;
                (value / 100.0, 0.0)
            }
            pixels => {
                let value: f64 = pixels
                    .trim_end_matches("px")
                    .parse()
                    .map_err(|_| invalid())?;
                (0.0, value)
            }
        };

        if !fraction.is_finite() || !(base_offset + offset).is_finite() {
            return Err(invalid());
        }
        Ok(Self {
            fraction,
            offset: base_offset + offset,
        })
    }

    fn resolve(self, top: f64, height: f64) -> f64 {
        top + self.fraction * height + self.offset
    }
}

/// `"<element point> <viewport point>"`, e.g. `"top center"`: the region edge
/// is reached when the element point meets the viewport point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TriggerAnchor {
    pub element: AnchorPoint,
    pub viewport: AnchorPoint,
}

impl TriggerAnchor {
    /// Parses anchors such as `"top center"`, `"bottom+=100 center"`, or
    /// `"top 80%"`.
    pub fn parse(source: &str) -> ScrollyResult<Self> {
        let mut tokens = source.split_whitespace();
        let (Some(element), Some(viewport), None) = (tokens.next(), tokens.next(), tokens.next())
        else {
            return Err(ScrollyError::InvalidTrigger(format!(
                "anchor `{source}` must have an element and a viewport position"
            )));
        };
        Ok(Self {
            element: AnchorPoint::parse(element, source)?,
            viewport: AnchorPoint::parse(viewport, source)?,
        })
    }

    /// Scroll offset at which this anchor is reached.
    #[must_use]
    pub fn scroll_offset(self, section: SectionBox, viewport_height: f64) -> f64 {
        self.element.resolve(section.top, section.height)
            - self.viewport.resolve(0.0, viewport_height)
    }
}

fn format_point(point: AnchorPoint) -> String {
    let base = if point.fraction == 0.0 {
        "top".to_owned()
    } else if point.fraction == 0.5 {
        "center".to_owned()
    } else if point.fraction == 1.0 {
        "bottom".to_owned()
    } else {
        format!("{}%", point.fraction * 100.0)
    };
    if point.offset > 0.0 {
        format!("{base}+={}", point.offset)
    } else if point.offset < 0.0 {
        format!("{base}-={}", -point.offset)
    } else {
        base
    }
}

impl TryFrom<String> for TriggerAnchor {
    type Error = ScrollyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TriggerAnchor> for String {
    fn from(value: TriggerAnchor) -> Self {
        format!(
            "{} {}",
            format_point(value.element),
            format_point(value.viewport)
        )
    }
}

/// Declared scroll region of a stage, anchored to a named section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerRegionSpec {
    pub section: String,
    pub start: TriggerAnchor,
    pub end: TriggerAnchor,
}

impl TriggerRegionSpec {
    pub fn new(section: impl Into<String>, start: &str, end: &str) -> ScrollyResult<Self> {
        Ok(Self {
            section: section.into(),
            start: TriggerAnchor::parse(start)?,
            end: TriggerAnchor::parse(end)?,
        })
    }
}

/// Resolved `[start, end]` scroll offsets of a stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollRegion {
    pub start: f64,
    pub end: f64,
}

impl ScrollRegion {
    /// `clamp((y - start) / (end - start), 0, 1)`. Zero-length regions jump
    /// from 0 to 1 at `start`.
    #[must_use]
    pub fn progress(self, y: f64) -> f64 {
        let span = self.end - self.start;
        if span <= 0.0 {
            return if y >= self.start { 1.0 } else { 0.0 };
        }
        ((y - self.start) / span).clamp(0.0, 1.0)
    }

    #[must_use]
    pub fn contains(self, y: f64) -> bool {
        y >= self.start && y <= self.end
    }

    /// True when the open interiors intersect.
    #[must_use]
    pub fn overlaps(self, other: ScrollRegion) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Vertical placement of a named narrative section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionBox {
    pub top: f64,
    pub height: f64,
}

/// Measured layout of the scroll container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrollLayout {
    pub viewport_height: f64,
    pub sections: IndexMap<String, SectionBox>,
}

impl ScrollLayout {
    #[must_use]
    pub fn new(viewport_height: f64) -> Self {
        Self {
            viewport_height,
            sections: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_section(mut self, name: impl Into<String>, top: f64, height: f64) -> Self {
        self.sections.insert(name.into(), SectionBox { top, height });
        self
    }

    /// Sections of equal height stacked from offset 0, in the given order.
    #[must_use]
    pub fn uniform<I, S>(viewport_height: f64, section_height: f64, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        names
            .into_iter()
            .enumerate()
            .fold(Self::new(viewport_height), |layout, (index, name)| {
                layout.with_section(name, index as f64 * section_height, section_height)
            })
    }

    pub fn resolve(&self, spec: &TriggerRegionSpec) -> ScrollyResult<ScrollRegion> {
        let section = self.sections.get(&spec.section).copied().ok_or_else(|| {
            ScrollyError::InvalidTrigger(format!("unknown section `{}`", spec.section))
        })?;
        let start = spec.start.scroll_offset(section, self.viewport_height);
        let end = spec.end.scroll_offset(section, self.viewport_height);
        if end < start {
            return Err(ScrollyError::InvalidTrigger(format!(
                "region of section `{}` ends before it starts ({end} < {start})",
                spec.section
            )));
        }
        Ok(ScrollRegion { start, end })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    /// Progress follows scroll position inside the region.
    Scrub,
    /// Plays fully on forward entry, reverses fully on backward exit.
    Discrete,
}
