use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::aggregate::{Aggregates, PieSlice};
use crate::core::{
    AgeBucket, BandScale, Category, EthnicityBucket, InterviewType, LinearScale,
    OrdinalColorScale, Outcome, PieArc, SqrtScale, pie_angles,
};
use crate::error::ScrollyResult;

use super::ScrollyConfig;

/// Rows of the opening headline bar chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadlineRow {
    TotalInterviews,
    UniquePersons,
    RepeatPersons,
}

impl HeadlineRow {
    pub const ALL: [Self; 3] = [Self::TotalInterviews, Self::UniquePersons, Self::RepeatPersons];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::TotalInterviews => "Total Interviews",
            Self::UniquePersons => "Unique Persons",
            Self::RepeatPersons => "IDs More Than Once",
        }
    }
}

/// Fixed anchor points of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasGeometry {
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub center_y: f64,
    pub left_center_x: f64,
    pub right_center_x: f64,
    pub circle_center_y: f64,
    pub spread_radius: f64,
}

/// Pie slices of one outcome with their assigned angles.
pub type PieLayout<C> = Vec<(C, PieArc)>;

fn layout_pie<C: Category>(slices: &[PieSlice<C>]) -> PieLayout<C> {
    let values: Vec<f64> = slices.iter().map(|slice| slice.value as f64).collect();
    slices
        .iter()
        .map(|slice| slice.category)
        .zip(pie_angles(&values))
        .collect()
}

/// Every position, size, and color mapping the narrative stages use.
///
/// Rebuilt whenever the aggregates or the viewport change; building twice
/// from the same inputs gives identical scales.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleRegistry {
    pub geometry: CanvasGeometry,
    pub headline_x: LinearScale,
    pub headline_y: BandScale<HeadlineRow>,
    pub outcome_x: BandScale<Outcome>,
    pub outcome_y: LinearScale,
    pub outcome_colors: OrdinalColorScale<Outcome>,
    pub race_colors: OrdinalColorScale<EthnicityBucket>,
    pub age_colors: OrdinalColorScale<AgeBucket>,
    pub bubble_colors: OrdinalColorScale<InterviewType>,
    pub butterfly_left: LinearScale,
    pub butterfly_right: LinearScale,
    pub race_butterfly_y: BandScale<EthnicityBucket>,
    pub age_butterfly_y: BandScale<AgeBucket>,
    pub bubble_radius: SqrtScale,
    pub race_pie_denied: PieLayout<EthnicityBucket>,
    pub race_pie_granted: PieLayout<EthnicityBucket>,
    pub age_pie_denied: PieLayout<AgeBucket>,
    pub age_pie_granted: PieLayout<AgeBucket>,
}

impl ScaleRegistry {
    pub fn build(aggregates: &Aggregates, config: &ScrollyConfig) -> ScrollyResult<Self> {
        config.validate()?;
        let viewport = config.viewport;
        let margins = config.margins;
        let width = f64::from(viewport.width);
        let height = f64::from(viewport.height);
        let x_range = margins.x_range(viewport);
        let y_range = margins.y_range(viewport);
        let inverted_y = (y_range.1, y_range.0);

        let geometry = CanvasGeometry {
            width,
            height,
            center_x: width / 2.0,
            center_y: height / 2.0 - margins.top,
            left_center_x: width / 2.0 - width / 6.0,
            right_center_x: width / 2.0 + width / 6.0,
            circle_center_y: height / 2.0,
            spread_radius: width.min(height) / 3.0,
        };

        let headline = aggregates.headline;
        let headline_max = headline
            .total_interviews
            .max(headline.unique_persons)
            .max(headline.repeat_persons) as f64;

        let outcome_max = aggregates.outcome_counts.max() as f64;
        let proportion_max = aggregates
            .type_proportions
            .iter()
            .map(|entry| entry.proportion)
            .fold(0.0_f64, f64::max);

        let registry = Self {
            geometry,
            headline_x: LinearScale::from_max(headline_max, x_range)?,
            headline_y: BandScale::new(
                HeadlineRow::ALL.to_vec(),
                y_range,
                config.headline_band_padding,
            )?,
            outcome_x: BandScale::new(
                Outcome::all().to_vec(),
                x_range,
                config.category_band_padding,
            )?,
            outcome_y: LinearScale::from_max(outcome_max, inverted_y)?,
            outcome_colors: OrdinalColorScale::new(
                Outcome::all().to_vec(),
                config.palettes.bar.clone(),
            )?,
            race_colors: OrdinalColorScale::new(
                EthnicityBucket::all().to_vec(),
                config.palettes.race.clone(),
            )?,
            age_colors: OrdinalColorScale::new(
                AgeBucket::all().to_vec(),
                config.palettes.age.clone(),
            )?,
            bubble_colors: OrdinalColorScale::new(
                InterviewType::all().to_vec(),
                config.palettes.bubble.clone(),
            )?,
            butterfly_left: LinearScale::from_max(
                config.butterfly_max_percent,
                (width / 2.0, margins.left),
            )?,
            butterfly_right: LinearScale::from_max(
                config.butterfly_max_percent,
                (width / 2.0, width - margins.right),
            )?,
            race_butterfly_y: BandScale::new(
                aggregates
                    .combined_race
                    .iter()
                    .map(|entry| entry.category)
                    .collect(),
                y_range,
                config.category_band_padding,
            )?,
            age_butterfly_y: BandScale::new(
                aggregates
                    .combined_age
                    .iter()
                    .map(|entry| entry.category)
                    .collect(),
                y_range,
                config.category_band_padding,
            )?,
            bubble_radius: SqrtScale::new(proportion_max, config.max_bubble_radius),
            race_pie_denied: layout_pie(&aggregates.race_pies.denied),
            race_pie_granted: layout_pie(&aggregates.race_pies.granted),
            age_pie_denied: layout_pie(&aggregates.age_pies.denied),
            age_pie_granted: layout_pie(&aggregates.age_pies.granted),
        };

        debug!(
            width,
            height,
            headline_max,
            outcome_max,
            "built scale registry"
        );
        Ok(registry)
    }
}
