//! Default parole-interview narrative: the element set, its baseline values,
//! and the ordered stage list bound to the page sections.

use std::f64::consts::TAU;

use indexmap::IndexMap;
use tracing::debug;

use crate::animation::{Ease, SceneState, TimelineSpec, Tween};
use crate::core::aggregate::CombinedPercentage;
use crate::core::primitives::safe_percent;
use crate::core::{AgeBucket, BandScale, Category, EthnicityBucket, Outcome, PieSlice};
use crate::error::ScrollyResult;
use crate::render::{Color, ElementId, ElementKind, PropertyKey, PropertyValue};
use crate::sequencer::{ScrollLayout, Stage, StageHook, TriggerMode};

use super::scale_registry::{HeadlineRow, PieLayout};
use super::{DensityFilter, RenderContext};

/// Page sections in scroll order.
pub const SECTION_NAMES: [&str; 16] = [
    "section1",
    "section2",
    "section3",
    "section4",
    "section5",
    "section6",
    "section7",
    "section8",
    "section9",
    "section10",
    "section11",
    "section12",
    "section13",
    "section14",
    "section15",
    "section16",
];

pub const STAGE_HEADLINE: &str = "headline";
pub const STAGE_OUTCOME_FLYOUT: &str = "outcome-flyout";
pub const STAGE_OUTCOME_BARS: &str = "outcome-bars";
pub const STAGE_OUTCOME_CIRCLES: &str = "outcome-circles";
pub const STAGE_RACE_PIES: &str = "race-pies";
pub const STAGE_RACE_PIES_WHITE: &str = "race-pies-white";
pub const STAGE_RACE_PIES_BLACK: &str = "race-pies-black";
pub const STAGE_RACE_BUTTERFLY: &str = "race-butterfly";
pub const STAGE_RACE_BUTTERFLY_HIGHLIGHT: &str = "race-butterfly-highlight";
pub const STAGE_AGE_BUTTERFLY: &str = "age-butterfly";
pub const STAGE_AGE_BUTTERFLY_HIGHLIGHT: &str = "age-butterfly-highlight";
pub const STAGE_DENSITY: &str = "density";
pub const STAGE_NORMAL_OVERLAY: &str = "normal-overlay";
pub const STAGE_TIME_SERVED: &str = "time-served";
pub const STAGE_BUBBLES: &str = "bubbles";

const MOVE_UP_LABEL: &str = "move_up";
const DIMMED_OPACITY: f64 = 0.3;
const FADED_LABEL_OPACITY: f64 = 0.2;
const BUTTERFLY_TICKS: [f64; 3] = [0.0, 25.0, 50.0];

/// Element id builders shared by the baseline, the stages, and hosts.
pub mod ids {
    use crate::core::{Category, InterviewType, Outcome};

    pub const UNIQUE_BAR: &str = "bar2";
    pub const REPEAT_BAR: &str = "bar3";
    pub const COUNT_TEXT: &str = "count-text";
    pub const OUTCOME_AXIS: &str = "outcome-axis";
    pub const DENIED_CIRCLE: &str = "denied-circle";
    pub const GRANTED_CIRCLE: &str = "granted-circle";
    pub const DENIED_CIRCLE_LABEL: &str = "circle-label-denied";
    pub const GRANTED_CIRCLE_LABEL: &str = "circle-label-granted";
    pub const BUTTERFLY_AXIS_LEFT: &str = "butterfly-axis-left";
    pub const BUTTERFLY_AXIS_RIGHT: &str = "butterfly-axis-right";
    pub const RACE_BUTTERFLY_AXIS: &str = "race-butterfly-axis";
    pub const AGE_BUTTERFLY_AXIS: &str = "age-butterfly-axis";
    pub const LOAD_STATUS: &str = "load-status";

    fn side(outcome: Outcome) -> &'static str {
        match outcome {
            Outcome::Denied => "denied",
            _ => "granted",
        }
    }

    /// Segment of the stacked headline bar, later one vertical outcome bar.
    #[must_use]
    pub fn headline_bar(outcome: Outcome) -> String {
        format!("bar1-{}", outcome.token())
    }

    #[must_use]
    pub fn pie_slice<C: Category>(outcome: Outcome, category: C) -> String {
        format!("{}-slice-{}", side(outcome), category.token())
    }

    #[must_use]
    pub fn pie_label<C: Category>(outcome: Outcome, category: C) -> String {
        format!("pie-text-{}-{}", side(outcome), category.token())
    }

    /// `chart` is `"race"` or `"age"`.
    #[must_use]
    pub fn butterfly_bar<C: Category>(chart: &str, outcome: Outcome, category: C) -> String {
        format!("{chart}-butterfly-{}-{}", side(outcome), category.token())
    }

    #[must_use]
    pub fn butterfly_label<C: Category>(chart: &str, outcome: Outcome, category: C) -> String {
        format!(
            "{chart}-butterfly-percentage-{}-{}",
            side(outcome),
            category.token()
        )
    }

    #[must_use]
    pub fn bubble(interview_type: InterviewType) -> String {
        format!("bubble-{}", interview_type.token())
    }

    #[must_use]
    pub fn bubble_label(interview_type: InterviewType) -> String {
        format!("bubble-label-{}", interview_type.token())
    }
}

/// Element kinds plus the value of every property before any stage runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneBlueprint {
    elements: IndexMap<ElementId, ElementKind>,
    baseline: SceneState,
}

impl SceneBlueprint {
    fn add<I>(&mut self, id: impl Into<ElementId>, kind: ElementKind, properties: I)
    where
        I: IntoIterator<Item = (PropertyKey, PropertyValue)>,
    {
        let id = id.into();
        for (key, value) in properties {
            self.baseline.set(id.clone(), key, value);
        }
        self.elements.insert(id, kind);
    }

    pub fn elements(&self) -> impl Iterator<Item = (&ElementId, ElementKind)> {
        self.elements.iter().map(|(id, kind)| (id, *kind))
    }

    #[must_use]
    pub fn kind(&self, id: &str) -> Option<ElementKind> {
        self.elements.get(&ElementId::new(id)).copied()
    }

    #[must_use]
    pub fn baseline(&self) -> &SceneState {
        &self.baseline
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// Blueprint and stages built from one render context.
#[derive(Debug, Clone)]
pub struct Narrative {
    pub blueprint: SceneBlueprint,
    pub stages: Vec<Stage>,
}

impl Narrative {
    pub fn build(context: &RenderContext) -> ScrollyResult<Self> {
        let blueprint = build_blueprint(context);
        let mut stages = default_stages(context)?;

        for stage in &mut stages {
            if let Some(anchor) = context.config.stage_anchors.get(&stage.id) {
                stage.region.start = anchor.start;
                stage.region.end = anchor.end;
            }
        }

        debug!(
            elements = blueprint.len(),
            stages = stages.len(),
            "built narrative"
        );
        Ok(Self { blueprint, stages })
    }
}

/// Sections one viewport tall, stacked in [`SECTION_NAMES`] order.
#[must_use]
pub fn default_layout(viewport_height: f64) -> ScrollLayout {
    ScrollLayout::uniform(viewport_height, viewport_height, SECTION_NAMES)
}

fn number(value: f64) -> PropertyValue {
    PropertyValue::Number(value)
}

fn visible(value: bool) -> PropertyValue {
    PropertyValue::Visible(value)
}

fn text(value: impl Into<String>) -> PropertyValue {
    PropertyValue::Text(value.into())
}

fn band_start<C: Copy + PartialEq>(scale: &BandScale<C>, category: C) -> f64 {
    scale.position(category).unwrap_or_default()
}

fn band_center<C: Copy + PartialEq>(scale: &BandScale<C>, category: C) -> f64 {
    scale.center(category).unwrap_or_default()
}

fn format_percent(value: f64) -> String {
    format!("{value:.1}%")
}

const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
const GRAY: Color = Color::rgb(128.0 / 255.0, 128.0 / 255.0, 128.0 / 255.0);
const SILVER: Color = Color::rgb(192.0 / 255.0, 192.0 / 255.0, 192.0 / 255.0);

fn build_blueprint(context: &RenderContext) -> SceneBlueprint {
    let mut blueprint = SceneBlueprint::default();
    add_headline(context, &mut blueprint);
    add_outcome_circles(context, &mut blueprint);
    add_pies(context, &mut blueprint);
    add_butterfly_axes(context, &mut blueprint);
    add_butterfly(
        context,
        &mut blueprint,
        "race",
        &context.aggregates.combined_race,
        &context.scales.race_butterfly_y,
    );
    add_butterfly(
        context,
        &mut blueprint,
        "age",
        &context.aggregates.combined_age,
        &context.scales.age_butterfly_y,
    );
    add_bubbles(context, &mut blueprint);
    blueprint
}

fn add_headline(context: &RenderContext, blueprint: &mut SceneBlueprint) {
    let scales = &context.scales;
    let aggregates = &context.aggregates;
    let band = scales.headline_y.bandwidth();
    let total = aggregates.headline.total_interviews as f64;

    for outcome in Outcome::all() {
        let start = aggregates
            .outcome_stack
            .iter()
            .find(|segment| segment.category == *outcome)
            .map_or(total, |segment| segment.start);
        blueprint.add(
            ids::headline_bar(*outcome),
            ElementKind::Rect,
            [
                (PropertyKey::X, number(scales.headline_x.map(start))),
                (PropertyKey::Y, number(scales.geometry.center_y)),
                (PropertyKey::Width, number(0.0)),
                (PropertyKey::Height, number(band)),
                (PropertyKey::Fill, PropertyValue::Color(BLACK)),
                (PropertyKey::Opacity, number(1.0)),
                (PropertyKey::Visible, visible(true)),
            ],
        );
    }

    let left = context.config.margins.left;
    for (id, count, fill) in [
        (ids::UNIQUE_BAR, aggregates.headline.unique_persons, GRAY),
        (ids::REPEAT_BAR, aggregates.headline.repeat_persons, SILVER),
    ] {
        blueprint.add(
            id,
            ElementKind::Rect,
            [
                (PropertyKey::X, number(left)),
                (PropertyKey::Y, number(scales.geometry.height)),
                (PropertyKey::Width, number(scales.headline_x.extent(count as f64))),
                (PropertyKey::Height, number(band)),
                (PropertyKey::Fill, PropertyValue::Color(fill)),
                (PropertyKey::Visible, visible(false)),
            ],
        );
    }

    blueprint.add(
        ids::COUNT_TEXT,
        ElementKind::Text,
        [
            (PropertyKey::X, number(scales.headline_x.map(total) - 120.0)),
            (
                PropertyKey::Y,
                number(band_start(&scales.headline_y, HeadlineRow::TotalInterviews) + band / 1.5),
            ),
            (PropertyKey::Value, number(0.0)),
            (PropertyKey::Text, text(HeadlineRow::TotalInterviews.label())),
            (PropertyKey::Visible, visible(false)),
        ],
    );

    let (_, axis_y) = context.config.margins.y_range(context.config.viewport);
    blueprint.add(
        ids::OUTCOME_AXIS,
        ElementKind::Group,
        [
            (PropertyKey::Y, number(axis_y)),
            (PropertyKey::Visible, visible(false)),
        ],
    );
}

fn add_outcome_circles(context: &RenderContext, blueprint: &mut SceneBlueprint) {
    let scales = &context.scales;
    let config = &context.config;
    let geometry = scales.geometry;

    for (id, outcome, color) in [
        (ids::DENIED_CIRCLE, Outcome::Denied, config.palettes.denied),
        (ids::GRANTED_CIRCLE, Outcome::Granted, config.palettes.granted),
    ] {
        blueprint.add(
            id,
            ElementKind::Circle,
            [
                (PropertyKey::Cx, number(band_center(&scales.outcome_x, outcome))),
                (PropertyKey::Cy, number(geometry.circle_center_y)),
                (PropertyKey::Radius, number(config.circle_radius)),
                (PropertyKey::Fill, PropertyValue::Color(color)),
                (PropertyKey::Visible, visible(false)),
            ],
        );
    }

    for (id, outcome, x) in [
        (ids::DENIED_CIRCLE_LABEL, Outcome::Denied, geometry.right_center_x),
        (ids::GRANTED_CIRCLE_LABEL, Outcome::Granted, geometry.left_center_x),
    ] {
        blueprint.add(
            id,
            ElementKind::Text,
            [
                (PropertyKey::X, number(x)),
                (
                    PropertyKey::Y,
                    number(geometry.center_y + config.final_radius + 30.0),
                ),
                (PropertyKey::Text, text(outcome.label())),
                (PropertyKey::Visible, visible(false)),
            ],
        );
    }
}

fn add_pie<C: Category>(
    context: &RenderContext,
    blueprint: &mut SceneBlueprint,
    outcome: Outcome,
    layout: &PieLayout<C>,
    values: impl Fn(C) -> usize,
    color: impl Fn(C) -> Color,
) {
    let geometry = context.scales.geometry;
    let radius = context.config.final_radius;
    let center_x = match outcome {
        Outcome::Denied => geometry.right_center_x,
        _ => geometry.left_center_x,
    };
    let total: usize = layout.iter().map(|(category, _)| values(*category)).sum();

    for (category, arc) in layout {
        blueprint.add(
            ids::pie_slice(outcome, *category),
            ElementKind::Slice,
            [
                (PropertyKey::Cx, number(center_x)),
                (PropertyKey::Cy, number(geometry.center_y)),
                (PropertyKey::InnerRadius, number(0.0)),
                (PropertyKey::Radius, number(radius)),
                (PropertyKey::StartAngle, number(arc.start_angle)),
                (PropertyKey::EndAngle, number(arc.end_angle)),
                (PropertyKey::Fill, PropertyValue::Color(color(*category))),
                (PropertyKey::Opacity, number(1.0)),
                (PropertyKey::Visible, visible(false)),
            ],
        );

        let (dx, dy) = arc.centroid(0.0, radius);
        let share = safe_percent(values(*category) as f64, total as f64);
        blueprint.add(
            ids::pie_label(outcome, *category),
            ElementKind::Text,
            [
                (PropertyKey::X, number(center_x + dx)),
                (PropertyKey::Y, number(geometry.center_y + dy)),
                (PropertyKey::Text, text(format_percent(share))),
                (PropertyKey::Opacity, number(1.0)),
                (PropertyKey::Visible, visible(false)),
            ],
        );
    }
}

fn add_pies(context: &RenderContext, blueprint: &mut SceneBlueprint) {
    let pies = &context.aggregates.race_pies;
    let colors = &context.scales.race_colors;
    let value_in = |slices: &[PieSlice<EthnicityBucket>], category: EthnicityBucket| {
        slices
            .iter()
            .find(|slice| slice.category == category)
            .map_or(0, |slice| slice.value)
    };

    add_pie(
        context,
        blueprint,
        Outcome::Denied,
        &context.scales.race_pie_denied,
        |category| value_in(&pies.denied, category),
        |category| colors.color(category),
    );
    add_pie(
        context,
        blueprint,
        Outcome::Granted,
        &context.scales.race_pie_granted,
        |category| value_in(&pies.granted, category),
        |category| colors.color(category),
    );
}

fn add_butterfly_axes(context: &RenderContext, blueprint: &mut SceneBlueprint) {
    let scales = &context.scales;
    let margins = context.config.margins;

    for (id, scale) in [
        (ids::BUTTERFLY_AXIS_LEFT, scales.butterfly_left),
        (ids::BUTTERFLY_AXIS_RIGHT, scales.butterfly_right),
    ] {
        let ticks = BUTTERFLY_TICKS
            .iter()
            .map(|tick| (*tick, scale.map(*tick)))
            .collect();
        blueprint.add(
            id,
            ElementKind::Group,
            [
                (PropertyKey::Y, number(margins.top)),
                (PropertyKey::Points, PropertyValue::Points(ticks)),
                (PropertyKey::Visible, visible(false)),
            ],
        );
    }

    for id in [ids::RACE_BUTTERFLY_AXIS, ids::AGE_BUTTERFLY_AXIS] {
        blueprint.add(
            id,
            ElementKind::Group,
            [
                (PropertyKey::X, number(margins.left)),
                (PropertyKey::Opacity, number(1.0)),
                (PropertyKey::Visible, visible(false)),
            ],
        );
    }
}

fn add_butterfly<C: Category>(
    context: &RenderContext,
    blueprint: &mut SceneBlueprint,
    chart: &str,
    table: &[CombinedPercentage<C>],
    bands: &BandScale<C>,
) {
    let scales = &context.scales;
    let palettes = &context.config.palettes;
    let middle = scales.geometry.width / 2.0;

    for entry in table {
        let top = band_start(bands, entry.category);
        let label_y = band_center(bands, entry.category);
        let granted_x = scales.butterfly_left.map(entry.percent_of_category_granted);
        let denied_end = scales.butterfly_right.map(entry.percent_of_category_denied);

        for (outcome, x, width, fill, label_x, percent) in [
            (
                Outcome::Granted,
                granted_x,
                middle - granted_x,
                palettes.granted,
                (middle + granted_x) / 2.0,
                entry.percent_of_category_granted,
            ),
            (
                Outcome::Denied,
                middle,
                denied_end - middle,
                palettes.denied,
                (middle + denied_end) / 2.0,
                entry.percent_of_category_denied,
            ),
        ] {
            blueprint.add(
                ids::butterfly_bar(chart, outcome, entry.category),
                ElementKind::Rect,
                [
                    (PropertyKey::X, number(x)),
                    (PropertyKey::Y, number(top)),
                    (PropertyKey::Width, number(width)),
                    (PropertyKey::Height, number(bands.bandwidth())),
                    (PropertyKey::Fill, PropertyValue::Color(fill)),
                    (PropertyKey::Opacity, number(1.0)),
                    (PropertyKey::Visible, visible(false)),
                ],
            );
            blueprint.add(
                ids::butterfly_label(chart, outcome, entry.category),
                ElementKind::Text,
                [
                    (PropertyKey::X, number(label_x)),
                    (PropertyKey::Y, number(label_y)),
                    (PropertyKey::Text, text(format_percent(percent))),
                    (PropertyKey::Opacity, number(1.0)),
                    (PropertyKey::Visible, visible(false)),
                ],
            );
        }
    }
}

/// Final position of the bubble at `index` out of `count`, on a circle
/// around the canvas center.
fn bubble_target(context: &RenderContext, index: usize, count: usize) -> (f64, f64) {
    let geometry = context.scales.geometry;
    let angle = TAU * index as f64 / count.max(1) as f64;
    (
        geometry.center_x + geometry.spread_radius * angle.cos(),
        geometry.center_y + geometry.spread_radius * angle.sin(),
    )
}

fn add_bubbles(context: &RenderContext, blueprint: &mut SceneBlueprint) {
    let geometry = context.scales.geometry;
    let proportions = &context.aggregates.type_proportions;

    for (index, entry) in proportions.iter().enumerate() {
        let (x, y) = bubble_target(context, index, proportions.len());
        blueprint.add(
            ids::bubble(entry.interview_type),
            ElementKind::Circle,
            [
                (PropertyKey::Cx, number(geometry.center_x)),
                (PropertyKey::Cy, number(geometry.center_y)),
                (PropertyKey::Radius, number(0.0)),
                (
                    PropertyKey::Fill,
                    PropertyValue::Color(context.scales.bubble_colors.color(entry.interview_type)),
                ),
                (PropertyKey::Visible, visible(true)),
            ],
        );
        blueprint.add(
            ids::bubble_label(entry.interview_type),
            ElementKind::Text,
            [
                (PropertyKey::X, number(x)),
                (PropertyKey::Y, number(y)),
                (PropertyKey::Text, text(entry.interview_type.label())),
                (PropertyKey::Visible, visible(false)),
            ],
        );
    }
}

fn race_slices(context: &RenderContext) -> Vec<String> {
    let scales = &context.scales;
    scales
        .race_pie_denied
        .iter()
        .map(|(category, _)| ids::pie_slice(Outcome::Denied, *category))
        .chain(
            scales
                .race_pie_granted
                .iter()
                .map(|(category, _)| ids::pie_slice(Outcome::Granted, *category)),
        )
        .collect()
}

fn race_slice_labels(context: &RenderContext, only: Option<EthnicityBucket>) -> Vec<String> {
    let scales = &context.scales;
    scales
        .race_pie_denied
        .iter()
        .map(|(category, _)| (Outcome::Denied, *category))
        .chain(
            scales
                .race_pie_granted
                .iter()
                .map(|(category, _)| (Outcome::Granted, *category)),
        )
        .filter(|(_, category)| only.is_none_or(|only| only == *category))
        .map(|(outcome, category)| ids::pie_label(outcome, category))
        .collect()
}

/// Bars (or labels when `labels` is set) of one butterfly chart, split by
/// whether the category is in `focus`.
fn butterfly_ids<C: Category>(
    chart: &str,
    table: &[CombinedPercentage<C>],
    outcomes: &[Outcome],
    labels: bool,
    focus: &[C],
) -> (Vec<String>, Vec<String>) {
    let mut focused = Vec::new();
    let mut others = Vec::new();
    for entry in table {
        for outcome in outcomes {
            let id = if labels {
                ids::butterfly_label(chart, *outcome, entry.category)
            } else {
                ids::butterfly_bar(chart, *outcome, entry.category)
            };
            if focus.contains(&entry.category) {
                focused.push(id);
            } else {
                others.push(id);
            }
        }
    }
    (focused, others)
}

fn all_butterfly_ids<C: Category>(
    chart: &str,
    table: &[CombinedPercentage<C>],
    outcomes: &[Outcome],
    labels: bool,
) -> Vec<String> {
    let (_, all) = butterfly_ids::<C>(chart, table, outcomes, labels, &[]);
    all
}

const BOTH_SIDES: [Outcome; 2] = [Outcome::Granted, Outcome::Denied];

fn headline_stage(context: &RenderContext) -> ScrollyResult<Stage> {
    let scales = &context.scales;
    let counts = &context.aggregates.outcome_counts;
    let outcomes = Outcome::all();

    let bars_end: f64 = (0..outcomes.len()).map(|index| 1.5 + index as f64 * 0.02).sum();
    let mut timeline = TimelineSpec::new().label(MOVE_UP_LABEL, bars_end);

    for (index, outcome) in outcomes.iter().enumerate() {
        timeline.push(
            Tween::to([ids::headline_bar(*outcome)])
                .set(
                    PropertyKey::Width,
                    scales.headline_x.extent(counts.get(*outcome) as f64),
                )
                .duration(1.5)
                .ease(Ease::Linear)
                .after_previous(index as f64 * 0.02),
        );
    }

    timeline.push(
        Tween::to([ids::COUNT_TEXT])
            .set(PropertyKey::Visible, true)
            .set(
                PropertyKey::Value,
                context.aggregates.headline.total_interviews as f64,
            )
            .duration(6.0)
            .at(0.0),
    );
    timeline.push(
        Tween::to(outcomes.iter().map(|outcome| ids::headline_bar(*outcome)))
            .set(
                PropertyKey::Y,
                band_start(&scales.headline_y, HeadlineRow::TotalInterviews),
            )
            .duration(1.0)
            .at_label(MOVE_UP_LABEL),
    );
    timeline.push(
        Tween::to([ids::UNIQUE_BAR])
            .set(PropertyKey::Visible, true)
            .set(
                PropertyKey::Y,
                band_start(&scales.headline_y, HeadlineRow::UniquePersons),
            )
            .duration(1.0)
            .at_label(MOVE_UP_LABEL),
    );
    timeline.push(
        Tween::to([ids::REPEAT_BAR])
            .set(PropertyKey::Visible, true)
            .set(
                PropertyKey::Y,
                band_start(&scales.headline_y, HeadlineRow::RepeatPersons),
            )
            .duration(1.0)
            .at(bars_end + 1.0),
    );

    Ok(Stage::in_section(STAGE_HEADLINE, "section1", TriggerMode::Discrete)?.with_timeline(timeline))
}

fn outcome_flyout_stage() -> ScrollyResult<Stage> {
    let timeline = TimelineSpec::new().tween(
        Tween::to([ids::UNIQUE_BAR, ids::COUNT_TEXT, ids::REPEAT_BAR])
            .shift(PropertyKey::Y, -200.0)
            .set(PropertyKey::Visible, false)
            .duration(0.5)
            .stagger(0.1),
    );
    Ok(Stage::in_section(STAGE_OUTCOME_FLYOUT, "section2", TriggerMode::Scrub)?
        .with_timeline(timeline))
}

fn outcome_bars_stage(context: &RenderContext) -> ScrollyResult<Stage> {
    let scales = &context.scales;
    let (_, baseline_y) = context.config.margins.y_range(context.config.viewport);
    let bandwidth = scales.outcome_x.bandwidth();
    let mut timeline = TimelineSpec::new();

    for outcome in Outcome::all() {
        let top = scales
            .outcome_y
            .map(context.aggregates.outcome_counts.get(*outcome) as f64);
        timeline.push(
            Tween::to([ids::headline_bar(*outcome)])
                .set(PropertyKey::Height, baseline_y - top)
                .set(PropertyKey::Y, top)
                .set(
                    PropertyKey::X,
                    band_start(&scales.outcome_x, *outcome) + bandwidth / 4.0,
                )
                .set(PropertyKey::Width, bandwidth / 2.0)
                .set(PropertyKey::Fill, scales.outcome_colors.color(*outcome))
                .duration(2.0)
                .ease(Ease::Power1InOut)
                .with_previous(0.0),
        );
    }
    timeline.push(
        Tween::to([ids::OUTCOME_AXIS])
            .set(PropertyKey::Visible, true)
            .duration(2.0)
            .ease(Ease::Power1InOut)
            .with_previous(0.0),
    );

    Ok(Stage::in_section(STAGE_OUTCOME_BARS, "section2", TriggerMode::Scrub)?
        .with_timeline(timeline))
}

fn outcome_circles_stage(context: &RenderContext) -> ScrollyResult<Stage> {
    let geometry = context.scales.geometry;
    let config = &context.config;
    let circles = [ids::DENIED_CIRCLE, ids::GRANTED_CIRCLE];

    let timeline = TimelineSpec::new()
        .tween(
            Tween::to([
                ids::headline_bar(Outcome::Other),
                ids::headline_bar(Outcome::Postponed),
            ])
            .shift(PropertyKey::Y, -300.0)
            .set(PropertyKey::Visible, false)
            .duration(3.0)
            .ease(Ease::Power1InOut)
            .at(0.0),
        )
        .tween(
            Tween::to([ids::OUTCOME_AXIS])
                .set(PropertyKey::Visible, false)
                .duration(3.0)
                .ease(Ease::Power1InOut)
                .with_previous(0.0),
        )
        .tween(
            Tween::to(circles)
                .set(PropertyKey::Visible, true)
                .set(PropertyKey::Radius, config.circle_radius)
                .duration(3.0)
                .ease(Ease::Power1InOut)
                .after_previous(0.0),
        )
        .tween(
            Tween::to([ids::DENIED_CIRCLE])
                .set(PropertyKey::Cx, geometry.right_center_x)
                .set(PropertyKey::Cy, geometry.center_y)
                .set(PropertyKey::Radius, config.final_radius)
                .duration(3.0)
                .ease(Ease::Power1InOut)
                .after_previous(0.0),
        )
        .tween(
            Tween::to([ids::GRANTED_CIRCLE])
                .set(PropertyKey::Cx, geometry.left_center_x)
                .set(PropertyKey::Cy, geometry.center_y)
                .set(PropertyKey::Radius, config.final_radius)
                .duration(3.0)
                .ease(Ease::Power1InOut)
                .with_previous(0.0),
        )
        .tween(
            Tween::to([
                ids::headline_bar(Outcome::Denied),
                ids::headline_bar(Outcome::Granted),
            ])
            .set(PropertyKey::Y, geometry.circle_center_y)
            .set(PropertyKey::Height, 0.0)
            .set(PropertyKey::Visible, false)
            .duration(3.0)
            .ease(Ease::Power1InOut)
            .with_previous(0.0),
        )
        .tween(
            Tween::to([ids::DENIED_CIRCLE_LABEL, ids::GRANTED_CIRCLE_LABEL])
                .set(PropertyKey::Visible, true)
                .duration(2.0)
                .ease(Ease::Power1InOut)
                .after_previous(1.0),
        );

    Ok(Stage::in_section(STAGE_OUTCOME_CIRCLES, "section3", TriggerMode::Scrub)?
        .with_timeline(timeline))
}

fn race_pies_stage(context: &RenderContext) -> ScrollyResult<Stage> {
    let timeline = TimelineSpec::new()
        .tween(
            Tween::to([ids::DENIED_CIRCLE, ids::GRANTED_CIRCLE])
                .set(PropertyKey::Visible, false)
                .duration(2.0)
                .ease(Ease::Power1Out),
        )
        .tween(
            Tween::to(race_slices(context))
                .set(PropertyKey::Visible, true)
                .duration(2.0)
                .ease(Ease::Power1In)
                .with_previous(0.0),
        );
    Ok(Stage::in_section(STAGE_RACE_PIES, "section4", TriggerMode::Scrub)?.with_timeline(timeline))
}

/// Dims every slice except `focus` and reveals the focus labels. Labels in
/// `faded` stay visible at low opacity.
fn pie_highlight_stage(
    context: &RenderContext,
    id: &str,
    section: &str,
    focus: EthnicityBucket,
    faded: Option<EthnicityBucket>,
) -> ScrollyResult<Stage> {
    let (focused, others): (Vec<String>, Vec<String>) = {
        let scales = &context.scales;
        let slices = scales
            .race_pie_denied
            .iter()
            .map(|(category, _)| (Outcome::Denied, *category))
            .chain(
                scales
                    .race_pie_granted
                    .iter()
                    .map(|(category, _)| (Outcome::Granted, *category)),
            );
        let (focused, others): (Vec<_>, Vec<_>) =
            slices.partition(|(_, category)| *category == focus);
        (
            focused
                .into_iter()
                .map(|(outcome, category)| ids::pie_slice(outcome, category))
                .collect(),
            others
                .into_iter()
                .map(|(outcome, category)| ids::pie_slice(outcome, category))
                .collect(),
        )
    };

    let mut timeline = TimelineSpec::new()
        .tween(
            Tween::to(focused)
                .set(PropertyKey::Visible, true)
                .set(PropertyKey::Opacity, 1.0)
                .duration(1.0)
                .ease(Ease::Power1InOut)
                .at(0.0),
        )
        .tween(
            Tween::to(others)
                .set(PropertyKey::Visible, true)
                .set(PropertyKey::Opacity, DIMMED_OPACITY)
                .duration(1.0)
                .ease(Ease::Power1InOut)
                .at(0.0),
        )
        .tween(
            Tween::to(race_slice_labels(context, Some(focus)))
                .set(PropertyKey::Visible, true)
                .set(PropertyKey::Opacity, 1.0)
                .duration(1.0)
                .ease(Ease::Power1InOut)
                .at(0.0),
        );
    if let Some(faded) = faded {
        timeline.push(
            Tween::to(race_slice_labels(context, Some(faded)))
                .set(PropertyKey::Visible, true)
                .set(PropertyKey::Opacity, FADED_LABEL_OPACITY)
                .duration(1.0)
                .ease(Ease::Power1InOut)
                .at(0.0),
        );
    }

    Ok(Stage::in_section(id, section, TriggerMode::Scrub)?.with_timeline(timeline))
}

fn race_butterfly_stage(context: &RenderContext) -> ScrollyResult<Stage> {
    let table = &context.aggregates.combined_race;
    let mut hidden = race_slices(context);
    hidden.extend(race_slice_labels(context, None));
    let mut revealed = all_butterfly_ids("race", table, &BOTH_SIDES, false);
    revealed.push(ids::RACE_BUTTERFLY_AXIS.to_owned());

    let timeline = TimelineSpec::new()
        .tween(
            Tween::to(hidden)
                .set(PropertyKey::Visible, false)
                .duration(2.0)
                .ease(Ease::Power1In),
        )
        .tween(
            Tween::to([ids::DENIED_CIRCLE, ids::GRANTED_CIRCLE])
                .set(PropertyKey::Visible, true)
                .duration(2.0)
                .ease(Ease::Power1Out)
                .with_previous(0.0),
        )
        .tween(
            Tween::to([ids::DENIED_CIRCLE, ids::GRANTED_CIRCLE])
                .set(PropertyKey::Radius, 0.0)
                .duration(2.0)
                .after_previous(0.0),
        )
        .tween(
            Tween::to([ids::DENIED_CIRCLE_LABEL, ids::GRANTED_CIRCLE_LABEL])
                .set(PropertyKey::Y, context.scales.geometry.height - 50.0)
                .with_previous(0.0),
        )
        .tween(
            Tween::to(revealed)
                .set(PropertyKey::Visible, true)
                .duration(2.0)
                .ease(Ease::Power1InOut)
                .after_previous(0.0),
        )
        .tween(
            Tween::to([ids::BUTTERFLY_AXIS_LEFT, ids::BUTTERFLY_AXIS_RIGHT])
                .set(PropertyKey::Visible, true)
                .duration(1.0)
                .ease(Ease::Power1InOut)
                .with_previous(0.0),
        );

    Ok(Stage::in_section(STAGE_RACE_BUTTERFLY, "section7", TriggerMode::Scrub)?
        .with_timeline(timeline))
}

fn butterfly_highlight_stage<C: Category>(
    id: &str,
    section: &str,
    chart: &str,
    table: &[CombinedPercentage<C>],
    focus: &[C],
) -> ScrollyResult<Stage> {
    let (_, dimmed) = butterfly_ids(chart, table, &BOTH_SIDES, false, focus);
    let (labels, _) = butterfly_ids(chart, table, &BOTH_SIDES, true, focus);

    let timeline = TimelineSpec::new()
        .tween(
            Tween::to(dimmed)
                .set(PropertyKey::Opacity, DIMMED_OPACITY)
                .duration(1.0)
                .ease(Ease::Power1InOut)
                .at(0.0),
        )
        .tween(
            Tween::to(labels)
                .set(PropertyKey::Visible, true)
                .set(PropertyKey::Opacity, 1.0)
                .duration(1.0)
                .ease(Ease::Power1InOut)
                .at(0.0),
        );
    Ok(Stage::in_section(id, section, TriggerMode::Scrub)?.with_timeline(timeline))
}

/// Collapses both sides of a butterfly chart into the center line.
fn collapse_butterfly<C: Category>(
    timeline: &mut TimelineSpec,
    chart: &str,
    table: &[CombinedPercentage<C>],
    middle: f64,
    duration: f64,
    ease: Ease,
) {
    timeline.push(
        Tween::to(all_butterfly_ids(chart, table, &[Outcome::Denied], false))
            .set(PropertyKey::Width, 0.0)
            .duration(duration)
            .ease(ease)
            .at(0.0),
    );
    timeline.push(
        Tween::to(all_butterfly_ids(chart, table, &[Outcome::Granted], false))
            .set(PropertyKey::X, middle)
            .set(PropertyKey::Width, 0.0)
            .duration(duration)
            .ease(ease)
            .with_previous(0.0),
    );
}

fn age_butterfly_stage(context: &RenderContext) -> ScrollyResult<Stage> {
    let race = &context.aggregates.combined_race;
    let middle = context.scales.butterfly_left.map(0.0);
    let mut timeline = TimelineSpec::new();
    collapse_butterfly(&mut timeline, "race", race, middle, 3.0, Ease::Power1InOut);

    let mut hidden = all_butterfly_ids("race", race, &BOTH_SIDES, true);
    hidden.push(ids::RACE_BUTTERFLY_AXIS.to_owned());
    timeline.push(
        Tween::to(hidden)
            .set(PropertyKey::Visible, false)
            .duration(1.0)
            .ease(Ease::Power1InOut)
            .after_previous(0.0),
    );
    timeline.push(
        Tween::to(all_butterfly_ids(
            "age",
            &context.aggregates.combined_age,
            &BOTH_SIDES,
            false,
        ))
        .set(PropertyKey::Visible, true)
        .duration(3.0)
        .ease(Ease::Power1InOut)
        .after_previous(0.0),
    );
    timeline.push(
        Tween::to([ids::AGE_BUTTERFLY_AXIS])
            .set(PropertyKey::Visible, true)
            .duration(1.0)
            .ease(Ease::Power1InOut)
            .with_previous(0.0),
    );

    Ok(Stage::in_section(STAGE_AGE_BUTTERFLY, "section9", TriggerMode::Scrub)?
        .with_timeline(timeline))
}

fn density_stage(context: &RenderContext) -> ScrollyResult<Stage> {
    let age = &context.aggregates.combined_age;
    let middle = context.scales.butterfly_left.map(0.0);
    let mut timeline = TimelineSpec::new();
    collapse_butterfly(&mut timeline, "age", age, middle, 1.0, Ease::Linear);

    let mut hidden = all_butterfly_ids("age", age, &BOTH_SIDES, true);
    hidden.extend(
        [
            ids::AGE_BUTTERFLY_AXIS,
            ids::BUTTERFLY_AXIS_LEFT,
            ids::BUTTERFLY_AXIS_RIGHT,
            ids::DENIED_CIRCLE_LABEL,
            ids::GRANTED_CIRCLE_LABEL,
        ]
        .map(str::to_owned),
    );
    timeline.push(
        Tween::to(hidden)
            .set(PropertyKey::Visible, false)
            .duration(1.0)
            .ease(Ease::Power1InOut)
            .with_previous(0.0),
    );

    Ok(Stage::in_section(STAGE_DENSITY, "section12", TriggerMode::Scrub)?
        .with_timeline(timeline)
        .on_enter(StageHook::SetDensityFilter(DensityFilter::PropSentServed))
        .on_leave_back(StageHook::SetDensityFilter(DensityFilter::None)))
}

fn normal_overlay_stage() -> ScrollyResult<Stage> {
    let prop = DensityFilter::PropSentServed;
    Ok(
        Stage::in_section(STAGE_NORMAL_OVERLAY, "section13", TriggerMode::Scrub)?
            .on_enter(StageHook::SetDensityFilter(prop))
            .on_enter(StageHook::SetNormalOverlay(prop))
            .on_leave(StageHook::SetDensityFilter(prop))
            .on_leave(StageHook::SetNormalOverlay(prop))
            .on_leave_back(StageHook::SetNormalOverlay(DensityFilter::None)),
    )
}

fn time_served_stage() -> ScrollyResult<Stage> {
    let prop = DensityFilter::PropSentServed;
    Ok(
        Stage::in_section(STAGE_TIME_SERVED, "section15", TriggerMode::Scrub)?
            .on_enter(StageHook::SetDensityFilter(
                DensityFilter::TimeServedAtInterview,
            ))
            .on_enter(StageHook::SetNormalOverlay(DensityFilter::None))
            .on_leave_back(StageHook::SetDensityFilter(prop))
            .on_leave_back(StageHook::SetNormalOverlay(prop)),
    )
}

fn bubbles_stage(context: &RenderContext) -> ScrollyResult<Stage> {
    let proportions = &context.aggregates.type_proportions;
    let mut timeline = TimelineSpec::new();

    for (index, entry) in proportions.iter().enumerate() {
        let (x, y) = bubble_target(context, index, proportions.len());
        timeline.push(
            Tween::to([ids::bubble(entry.interview_type)])
                .set(
                    PropertyKey::Radius,
                    context.scales.bubble_radius.radius(entry.proportion),
                )
                .set(PropertyKey::Cx, x)
                .set(PropertyKey::Cy, y)
                .duration(3.0)
                .ease(Ease::Power1Out)
                .after_previous(0.0),
        );
    }
    timeline.push(
        Tween::to(
            proportions
                .iter()
                .map(|entry| ids::bubble_label(entry.interview_type)),
        )
        .set(PropertyKey::Visible, true)
        .duration(1.0)
        .ease(Ease::Power1Out)
        .after_previous(0.0),
    );

    Ok(Stage::in_section(STAGE_BUBBLES, "section16", TriggerMode::Scrub)?
        .with_timeline(timeline)
        .on_enter(StageHook::SetDensityFilter(DensityFilter::None))
        .on_enter(StageHook::SetNormalOverlay(DensityFilter::None))
        .on_leave_back(StageHook::SetDensityFilter(
            DensityFilter::TimeServedAtInterview,
        )))
}

/// The full stage list in scroll order.
pub fn default_stages(context: &RenderContext) -> ScrollyResult<Vec<Stage>> {
    let race = &context.aggregates.combined_race;
    let age = &context.aggregates.combined_age;

    Ok(vec![
        headline_stage(context)?,
        outcome_flyout_stage()?,
        outcome_bars_stage(context)?,
        outcome_circles_stage(context)?,
        race_pies_stage(context)?,
        pie_highlight_stage(
            context,
            STAGE_RACE_PIES_WHITE,
            "section5",
            EthnicityBucket::White,
            None,
        )?,
        pie_highlight_stage(
            context,
            STAGE_RACE_PIES_BLACK,
            "section6",
            EthnicityBucket::Black,
            Some(EthnicityBucket::White),
        )?,
        race_butterfly_stage(context)?,
        butterfly_highlight_stage(
            STAGE_RACE_BUTTERFLY_HIGHLIGHT,
            "section8",
            "race",
            race,
            &[EthnicityBucket::Black, EthnicityBucket::White],
        )?,
        age_butterfly_stage(context)?,
        butterfly_highlight_stage(
            STAGE_AGE_BUTTERFLY_HIGHLIGHT,
            "section10",
            "age",
            age,
            &[AgeBucket::Under25, AgeBucket::From45To54],
        )?,
        density_stage(context)?,
        normal_overlay_stage()?,
        time_served_stage()?,
        bubbles_stage(context)?,
    ])
}
