use tracing::debug;

pub use crate::core::density::DensityFilter;

use crate::core::category::Outcome;
use crate::core::density::{DensityPoint, NormalCurve, kernel_density, padded_domain};
use crate::core::record::Record;
use crate::core::LinearScale;
use crate::error::ScrollyResult;
use crate::render::{Color, ElementId, ElementKind, PropertyKey, PropertyValue, SceneAdapter};
use crate::sequencer::StageHook;

use super::RenderContext;

pub const KDE_DENIED_ID: &str = "kde-denied";
pub const KDE_GRANTED_ID: &str = "kde-granted";
pub const KDE_NORMAL_ID: &str = "kde-normal";
pub const KDE_X_AXIS_ID: &str = "kde-x-axis";
pub const KDE_Y_AXIS_ID: &str = "kde-y-axis";

const CURVE_OPACITY: f64 = 0.6;

/// Density elements owned by the filter controller. No stage writes them.
pub const DENSITY_ELEMENT_IDS: [&str; 5] = [
    KDE_DENIED_ID,
    KDE_GRANTED_ID,
    KDE_NORMAL_ID,
    KDE_X_AXIS_ID,
    KDE_Y_AXIS_ID,
];

/// Denied and granted curves of one attribute with the scales they were
/// drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityPlot {
    pub filter: DensityFilter,
    pub x_scale: LinearScale,
    pub y_scale: LinearScale,
    pub denied: Vec<DensityPoint>,
    pub granted: Vec<DensityPoint>,
}

impl DensityPlot {
    /// Builds both curves over every interview holding a value for `filter`.
    ///
    /// Returns `None` for [`DensityFilter::None`].
    pub fn build(filter: DensityFilter, context: &RenderContext) -> ScrollyResult<Option<Self>> {
        if filter.is_none() {
            return Ok(None);
        }
        let config = &context.config;
        let values_for = |outcome: Option<Outcome>| -> Vec<f64> {
            context
                .records
                .iter()
                .filter(|record| outcome.is_none_or(|outcome| record.outcome == outcome))
                .filter_map(|record| filter.value(record))
                .collect()
        };

        let all_values = values_for(None);
        let x_scale = LinearScale::new(
            padded_domain(&all_values),
            config.margins.x_range(config.viewport),
        )?;
        let sample_xs = x_scale.ticks(config.density.sample_count);
        let denied = kernel_density(
            &values_for(Some(Outcome::Denied)),
            &sample_xs,
            config.density.bandwidth,
        );
        let granted = kernel_density(
            &values_for(Some(Outcome::Granted)),
            &sample_xs,
            config.density.bandwidth,
        );

        let max_density = denied
            .iter()
            .chain(&granted)
            .map(|point| point.density)
            .fold(0.0_f64, f64::max);
        let max_density = if max_density > 0.0 { max_density } else { 1.0 };
        let (top, bottom) = config.margins.y_range(config.viewport);
        let y_scale = LinearScale::new((0.0, max_density), (bottom, top))?;

        debug!(
            filter = filter.key(),
            values = all_values.len(),
            samples = sample_xs.len(),
            max_density,
            "built density plot"
        );

        Ok(Some(Self {
            filter,
            x_scale,
            y_scale,
            denied,
            granted,
        }))
    }

    /// Curve points in pixel space.
    #[must_use]
    pub fn project(&self, points: &[DensityPoint]) -> Vec<(f64, f64)> {
        points
            .iter()
            .map(|point| (self.x_scale.map(point.x), self.y_scale.map(point.density)))
            .collect()
    }
}

fn values_of(records: &[Record], filter: DensityFilter) -> Vec<f64> {
    records
        .iter()
        .filter_map(|record| filter.value(record))
        .collect()
}

fn axis_points(scale: LinearScale, count: usize) -> PropertyValue {
    PropertyValue::Points(
        scale
            .ticks(count)
            .into_iter()
            .map(|tick| (tick, scale.map(tick)))
            .collect(),
    )
}

fn show_path<S: SceneAdapter>(
    scene: &mut S,
    id: &str,
    points: Vec<(f64, f64)>,
    color: Option<Color>,
) -> ScrollyResult<()> {
    let id = ElementId::new(id);
    scene.set_property(&id, PropertyKey::Points, PropertyValue::Points(points))?;
    if let Some(color) = color {
        scene.set_property(&id, PropertyKey::Fill, PropertyValue::Color(color))?;
    }
    scene.set_property(&id, PropertyKey::Visible, PropertyValue::Visible(true))
}

fn clear_path<S: SceneAdapter>(scene: &mut S, id: &str) -> ScrollyResult<()> {
    let id = ElementId::new(id);
    scene.set_property(&id, PropertyKey::Points, PropertyValue::Points(Vec::new()))?;
    scene.set_property(&id, PropertyKey::Visible, PropertyValue::Visible(false))
}

/// Owns the density plot state and redraws it when the selected attribute
/// changes, whether from a button or from a stage boundary hook.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterController {
    density: DensityFilter,
    normal_overlay: DensityFilter,
    plot: Option<DensityPlot>,
    normal: Option<NormalCurve>,
}

impl FilterController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn density_filter(&self) -> DensityFilter {
        self.density
    }

    #[must_use]
    pub fn normal_overlay(&self) -> DensityFilter {
        self.normal_overlay
    }

    #[must_use]
    pub fn plot(&self) -> Option<&DensityPlot> {
        self.plot.as_ref()
    }

    #[must_use]
    pub fn normal_curve(&self) -> Option<NormalCurve> {
        self.normal
    }

    /// Creates the density elements, hidden with empty point lists.
    pub fn create_elements<S: SceneAdapter>(scene: &mut S) -> ScrollyResult<()> {
        for id in DENSITY_ELEMENT_IDS {
            scene.create_element(&ElementId::new(id), ElementKind::Path)?;
            clear_path(scene, id)?;
        }
        Ok(())
    }

    /// Button entry point: `button_id` is a [`DensityFilter`] key.
    pub fn click<S: SceneAdapter>(
        &mut self,
        button_id: &str,
        context: &RenderContext,
        scene: &mut S,
    ) -> ScrollyResult<()> {
        let filter = DensityFilter::parse(button_id)?;
        self.on_filter_selected(filter, context, scene)
    }

    pub fn apply_hook<S: SceneAdapter>(
        &mut self,
        hook: StageHook,
        context: &RenderContext,
        scene: &mut S,
    ) -> ScrollyResult<()> {
        match hook {
            StageHook::SetDensityFilter(filter) => self.on_filter_selected(filter, context, scene),
            StageHook::SetNormalOverlay(filter) => self.set_normal_overlay(filter, context, scene),
        }
    }

    /// Recomputes both density curves and their axes. `None` clears them.
    ///
    /// An active normal overlay is redrawn against the new scales.
    pub fn on_filter_selected<S: SceneAdapter>(
        &mut self,
        filter: DensityFilter,
        context: &RenderContext,
        scene: &mut S,
    ) -> ScrollyResult<()> {
        self.density = filter;
        self.plot = DensityPlot::build(filter, context)?;
        let palettes = &context.config.palettes;

        match &self.plot {
            Some(plot) => {
                let ticks = context.config.density.axis_tick_count;
                for (id, points, color) in [
                    (KDE_DENIED_ID, &plot.denied, palettes.denied),
                    (KDE_GRANTED_ID, &plot.granted, palettes.granted),
                ] {
                    show_path(scene, id, plot.project(points), Some(color))?;
                    scene.set_property(
                        &ElementId::new(id),
                        PropertyKey::Opacity,
                        PropertyValue::Number(CURVE_OPACITY),
                    )?;
                }
                for (id, scale) in [(KDE_X_AXIS_ID, plot.x_scale), (KDE_Y_AXIS_ID, plot.y_scale)] {
                    let id = ElementId::new(id);
                    scene.set_property(&id, PropertyKey::Points, axis_points(scale, ticks))?;
                    scene.set_property(&id, PropertyKey::Visible, PropertyValue::Visible(true))?;
                }
            }
            None => {
                for id in [KDE_DENIED_ID, KDE_GRANTED_ID, KDE_X_AXIS_ID, KDE_Y_AXIS_ID] {
                    clear_path(scene, id)?;
                }
            }
        }

        self.redraw_normal(context, scene)
    }

    /// Draws a normal curve fitted to the attribute's mean and sample
    /// deviation over the current density scales. `None` removes it.
    pub fn set_normal_overlay<S: SceneAdapter>(
        &mut self,
        filter: DensityFilter,
        context: &RenderContext,
        scene: &mut S,
    ) -> ScrollyResult<()> {
        self.normal_overlay = filter;
        self.redraw_normal(context, scene)
    }

    fn redraw_normal<S: SceneAdapter>(
        &mut self,
        context: &RenderContext,
        scene: &mut S,
    ) -> ScrollyResult<()> {
        self.normal = if self.normal_overlay.is_none() {
            None
        } else {
            NormalCurve::fit(&values_of(&context.records, self.normal_overlay))
        };

        match (self.normal, &self.plot) {
            (Some(curve), Some(plot)) => {
                let sample_xs = plot.x_scale.ticks(context.config.density.sample_count);
                let points = plot.project(&curve.sample(&sample_xs));
                show_path(
                    scene,
                    KDE_NORMAL_ID,
                    points,
                    Some(context.config.palettes.normal_overlay),
                )
            }
            _ => clear_path(scene, KDE_NORMAL_ID),
        }
    }

    /// Redraws both layers for the current selection, e.g. after a resize.
    pub fn redraw<S: SceneAdapter>(
        &mut self,
        context: &RenderContext,
        scene: &mut S,
    ) -> ScrollyResult<()> {
        self.on_filter_selected(self.density, context, scene)
    }
}
