use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::core::{Margins, Viewport};
use crate::error::{ScrollyError, ScrollyResult};
use crate::render::Color;
use crate::sequencer::TriggerAnchor;

/// Public engine bootstrap configuration.
///
/// This type is serializable so host applications can persist/load the
/// presentation setup without inventing their own ad-hoc format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrollyConfig {
    pub viewport: Viewport,
    #[serde(default)]
    pub margins: Margins,
    #[serde(default = "default_circle_radius")]
    pub circle_radius: f64,
    #[serde(default = "default_final_radius")]
    pub final_radius: f64,
    #[serde(default = "default_max_bubble_radius")]
    pub max_bubble_radius: f64,
    #[serde(default = "default_headline_band_padding")]
    pub headline_band_padding: f64,
    #[serde(default = "default_category_band_padding")]
    pub category_band_padding: f64,
    /// Upper bound of both butterfly percentage axes.
    #[serde(default = "default_butterfly_max_percent")]
    pub butterfly_max_percent: f64,
    #[serde(default = "default_age_split_threshold")]
    pub age_split_threshold: f64,
    #[serde(default)]
    pub palettes: PaletteConfig,
    #[serde(default)]
    pub density: DensityConfig,
    /// Seconds per discrete stage transition unit.
    #[serde(default = "default_discrete_time_scale")]
    pub discrete_time_scale: f64,
    /// Per-stage trigger anchor overrides keyed by stage id.
    #[serde(default)]
    pub stage_anchors: IndexMap<String, StageAnchorConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteConfig {
    #[serde(default = "default_race_colors")]
    pub race: Vec<Color>,
    #[serde(default = "default_bar_colors")]
    pub bar: Vec<Color>,
    #[serde(default = "default_bubble_colors")]
    pub bubble: Vec<Color>,
    #[serde(default = "default_age_colors")]
    pub age: Vec<Color>,
    #[serde(default = "default_denied_color")]
    pub denied: Color,
    #[serde(default = "default_granted_color")]
    pub granted: Color,
    #[serde(default = "default_normal_overlay_color")]
    pub normal_overlay: Color,
}

impl Default for PaletteConfig {
    fn default() -> Self {
        Self {
            race: default_race_colors(),
            bar: default_bar_colors(),
            bubble: default_bubble_colors(),
            age: default_age_colors(),
            denied: default_denied_color(),
            granted: default_granted_color(),
            normal_overlay: default_normal_overlay_color(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityConfig {
    #[serde(default = "default_bandwidth")]
    pub bandwidth: f64,
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,
    #[serde(default = "default_axis_tick_count")]
    pub axis_tick_count: usize,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            bandwidth: default_bandwidth(),
            sample_count: default_sample_count(),
            axis_tick_count: default_axis_tick_count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageAnchorConfig {
    pub start: TriggerAnchor,
    pub end: TriggerAnchor,
}

impl ScrollyConfig {
    /// Creates a config with the default narrative geometry.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            margins: Margins::default(),
            circle_radius: default_circle_radius(),
            final_radius: default_final_radius(),
            max_bubble_radius: default_max_bubble_radius(),
            headline_band_padding: default_headline_band_padding(),
            category_band_padding: default_category_band_padding(),
            butterfly_max_percent: default_butterfly_max_percent(),
            age_split_threshold: default_age_split_threshold(),
            palettes: PaletteConfig::default(),
            density: DensityConfig::default(),
            discrete_time_scale: default_discrete_time_scale(),
            stage_anchors: IndexMap::new(),
        }
    }

    #[must_use]
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins = margins;
        self
    }

    #[must_use]
    pub fn with_radii(mut self, circle_radius: f64, final_radius: f64, max_bubble_radius: f64) -> Self {
        self.circle_radius = circle_radius;
        self.final_radius = final_radius;
        self.max_bubble_radius = max_bubble_radius;
        self
    }

    #[must_use]
    pub fn with_palettes(mut self, palettes: PaletteConfig) -> Self {
        self.palettes = palettes;
        self
    }

    #[must_use]
    pub fn with_density(mut self, density: DensityConfig) -> Self {
        self.density = density;
        self
    }

    #[must_use]
    pub fn with_age_split_threshold(mut self, threshold: f64) -> Self {
        self.age_split_threshold = threshold;
        self
    }

    /// Overrides the trigger region anchors of one stage.
    #[must_use]
    pub fn with_stage_anchor(
        mut self,
        stage_id: impl Into<String>,
        start: TriggerAnchor,
        end: TriggerAnchor,
    ) -> Self {
        self.stage_anchors
            .insert(stage_id.into(), StageAnchorConfig { start, end });
        self
    }

    pub fn validate(&self) -> ScrollyResult<()> {
        self.viewport.validate()?;
        self.margins.validate(self.viewport)?;

        for (name, value) in [
            ("circle_radius", self.circle_radius),
            ("final_radius", self.final_radius),
            ("max_bubble_radius", self.max_bubble_radius),
            ("butterfly_max_percent", self.butterfly_max_percent),
            ("density.bandwidth", self.density.bandwidth),
            ("discrete_time_scale", self.discrete_time_scale),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ScrollyError::InvalidData(format!(
                    "`{name}` must be finite and > 0"
                )));
            }
        }
        for (name, value) in [
            ("headline_band_padding", self.headline_band_padding),
            ("category_band_padding", self.category_band_padding),
        ] {
            if !(0.0..1.0).contains(&value) {
                return Err(ScrollyError::InvalidData(format!(
                    "`{name}` must be in [0, 1)"
                )));
            }
        }
        if self.density.sample_count < 2 {
            return Err(ScrollyError::InvalidData(
                "density.sample_count must be >= 2".to_owned(),
            ));
        }
        for (name, palette) in [
            ("race", &self.palettes.race),
            ("bar", &self.palettes.bar),
            ("bubble", &self.palettes.bubble),
            ("age", &self.palettes.age),
        ] {
            if palette.is_empty() {
                return Err(ScrollyError::InvalidData(format!(
                    "palette `{name}` must not be empty"
                )));
            }
        }
        Ok(())
    }

    /// Serializes config to pretty JSON for debug/config files.
    pub fn to_json_pretty(&self) -> ScrollyResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ScrollyError::InvalidData(format!("failed to serialize config: {e}")))
    }

    /// Deserializes config from JSON.
    pub fn from_json_str(input: &str) -> ScrollyResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| ScrollyError::InvalidData(format!("failed to parse config: {e}")))
    }
}

fn palette(hexes: &[&str]) -> Vec<Color> {
    hexes
        .iter()
        .filter_map(|hex| Color::from_hex(hex).ok())
        .collect()
}

fn hex_or_black(hex: &str) -> Color {
    Color::from_hex(hex).unwrap_or(Color::rgb(0.0, 0.0, 0.0))
}

fn default_circle_radius() -> f64 {
    50.0
}

fn default_final_radius() -> f64 {
    120.0
}

fn default_max_bubble_radius() -> f64 {
    120.0
}

fn default_headline_band_padding() -> f64 {
    0.2
}

fn default_category_band_padding() -> f64 {
    0.1
}

fn default_butterfly_max_percent() -> f64 {
    50.0
}

fn default_age_split_threshold() -> f64 {
    crate::core::aggregate::AGE_SPLIT_THRESHOLD
}

fn default_discrete_time_scale() -> f64 {
    1.0
}

fn default_race_colors() -> Vec<Color> {
    palette(&["#2292A4", "#D96C06", "#FADF63", "#A67DB8", "#E0607E", "#D0AE8E"])
}

fn default_bar_colors() -> Vec<Color> {
    palette(&["#BCD979", "#B15E6C", "#3A5683", "#93BEDF", "#35A66D"])
}

fn default_bubble_colors() -> Vec<Color> {
    palette(&["#9395D3", "#99621E", "#EDB6A3", "#483A58", "#6EFAFB"])
}

fn default_age_colors() -> Vec<Color> {
    palette(&["#87BBA2", "#72195A", "#CBBAED", "#E9DF00", "#F78764"])
}

fn default_denied_color() -> Color {
    hex_or_black("#B15E6C")
}

fn default_granted_color() -> Color {
    hex_or_black("#BCD979")
}

fn default_normal_overlay_color() -> Color {
    Color::rgb(1.0, 0.0, 0.0)
}

fn default_bandwidth() -> f64 {
    crate::core::density::DEFAULT_BANDWIDTH
}

fn default_sample_count() -> usize {
    crate::core::density::DEFAULT_SAMPLE_COUNT
}

fn default_axis_tick_count() -> usize {
    5
}
