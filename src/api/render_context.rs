use tracing::debug;

use crate::core::aggregate::{
    AGE_SPLIT_THRESHOLD, Aggregates, IndividualView, age_split_summary, build_individuals,
};
use crate::core::record::Record;
use crate::error::ScrollyResult;

use super::{ScaleRegistry, ScrollyConfig};

/// Everything derived from the loaded records, owned in one place.
///
/// Built once after load and rebuilt as a whole when the viewport changes;
/// nothing here is mutated piecemeal.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub config: ScrollyConfig,
    pub records: Vec<Record>,
    pub individuals: IndividualView,
    pub aggregates: Aggregates,
    pub scales: ScaleRegistry,
}

impl RenderContext {
    pub fn build(config: ScrollyConfig, records: Vec<Record>) -> ScrollyResult<Self> {
        let individuals = build_individuals(&records);
        let mut aggregates = Aggregates::build(&records, &individuals);
        if config.age_split_threshold != AGE_SPLIT_THRESHOLD {
            aggregates.age_split =
                age_split_summary(individuals.records(), config.age_split_threshold);
        }
        let scales = ScaleRegistry::build(&aggregates, &config)?;
        debug!(
            records = records.len(),
            individuals = individuals.len(),
            "built render context"
        );
        Ok(Self {
            config,
            records,
            individuals,
            aggregates,
            scales,
        })
    }

    /// Returns a copy with scales rebuilt for `config`. Aggregates are reused;
    /// `self` is left untouched when the scales cannot be built.
    pub fn relayout(&self, config: ScrollyConfig) -> ScrollyResult<Self> {
        let scales = ScaleRegistry::build(&self.aggregates, &config)?;
        let mut aggregates = self.aggregates.clone();
        if config.age_split_threshold != self.config.age_split_threshold {
            aggregates.age_split =
                age_split_summary(self.individuals.records(), config.age_split_threshold);
        }
        Ok(Self {
            config,
            records: self.records.clone(),
            individuals: self.individuals.clone(),
            aggregates,
            scales,
        })
    }
}
