use indexmap::IndexMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::category::{AgeBucket, Category, EthnicityBucket, InterviewType, Outcome};
use crate::core::primitives::{finite_mean, safe_percent};
use crate::core::record::Record;

/// Latest interview of one person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    pub record: Record,
    pub interview_count: usize,
    pub interviewed_more_than_once: bool,
}

/// One entry per distinct person id, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndividualView {
    individuals: Vec<Individual>,
}

impl IndividualView {
    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    #[must_use]
    pub fn repeat_count(&self) -> usize {
        self.individuals
            .iter()
            .filter(|individual| individual.interviewed_more_than_once)
            .count()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> + Clone {
        self.individuals.iter().map(|individual| &individual.record)
    }

    #[must_use]
    pub fn get(&self, person_id: &str) -> Option<&Individual> {
        self.individuals
            .iter()
            .find(|individual| individual.record.person_id == person_id)
    }
}

/// Collapses interviews into one entry per person holding the latest record.
///
/// Dated records win over undated ones; on equal dates the first record seen
/// is kept.
#[must_use]
pub fn build_individuals(records: &[Record]) -> IndividualView {
    let mut by_id: IndexMap<&str, Individual> = IndexMap::with_capacity(records.len());

    for record in records {
        match by_id.get_mut(record.person_id.as_str()) {
            Some(existing) => {
                existing.interview_count += 1;
                existing.interviewed_more_than_once = true;
                if record.interview_date > existing.record.interview_date {
                    existing.record = record.clone();
                }
            }
            None => {
                by_id.insert(
                    record.person_id.as_str(),
                    Individual {
                        record: record.clone(),
                        interview_count: 1,
                        interviewed_more_than_once: false,
                    },
                );
            }
        }
    }

    let view = IndividualView {
        individuals: by_id.into_values().collect(),
    };
    debug!(
        interviews = records.len(),
        individuals = view.len(),
        repeat = view.repeat_count(),
        "built individual view"
    );
    view
}

/// Count per category, in canonical category order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts<C: Category> {
    counts: IndexMap<C, usize>,
}

impl<C: Category> Default for CategoryCounts<C> {
    fn default() -> Self {
        Self {
            counts: IndexMap::new(),
        }
    }
}

impl<C: Category> CategoryCounts<C> {
    #[must_use]
    pub fn get(&self, category: C) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    #[must_use]
    pub fn max(&self) -> usize {
        self.counts.values().copied().max().unwrap_or(0)
    }

    /// Categories with at least one member.
    #[must_use]
    pub fn categories(&self) -> Vec<C> {
        self.counts.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (C, usize)> + '_ {
        self.counts.iter().map(|(category, count)| (*category, *count))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// Records per category, in canonical category order.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRecords<'a, C: Category> {
    groups: IndexMap<C, Vec<&'a Record>>,
}

impl<'a, C: Category> GroupedRecords<'a, C> {
    #[must_use]
    pub fn get(&self, category: C) -> &[&'a Record] {
        self.groups.get(&category).map_or(&[], Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (C, &[&'a Record])> + '_ {
        self.groups
            .iter()
            .map(|(category, records)| (*category, records.as_slice()))
    }

    #[must_use]
    pub fn counts(&self) -> CategoryCounts<C> {
        CategoryCounts {
            counts: self
                .groups
                .iter()
                .map(|(category, records)| (*category, records.len()))
                .collect(),
        }
    }
}

fn canonical_order<C: Category, V>(mut map: IndexMap<C, V>) -> IndexMap<C, V> {
    map.sort_by(|left, _, right, _| left.cmp(right));
    map
}

/// Groups records by a categorical key.
#[must_use]
pub fn group_by<'a, C, I, F>(records: I, key: F) -> GroupedRecords<'a, C>
where
    C: Category,
    I: IntoIterator<Item = &'a Record>,
    F: Fn(&Record) -> C,
{
    let mut groups: IndexMap<C, Vec<&'a Record>> = IndexMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }
    GroupedRecords {
        groups: canonical_order(groups),
    }
}

/// Counts records by a categorical key.
#[must_use]
pub fn count_by<'a, C, I, F>(records: I, key: F) -> CategoryCounts<C>
where
    C: Category,
    I: IntoIterator<Item = &'a Record>,
    F: Fn(&Record) -> C,
{
    let mut counts: IndexMap<C, usize> = IndexMap::new();
    for record in records {
        *counts.entry(key(record)).or_insert(0) += 1;
    }
    CategoryCounts {
        counts: canonical_order(counts),
    }
}

/// Logs and reports whether a grouping still accounts for every record.
pub fn check_total_preserved<C: Category>(
    grouping: &str,
    counts: &CategoryCounts<C>,
    expected: usize,
) -> bool {
    let total = counts.total();
    if total != expected {
        warn!(grouping, total, expected, "bucket totals do not match record count");
        return false;
    }
    true
}

/// Outcome split for one category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CombinedPercentage<C: Category> {
    pub category: C,
    pub category_total: usize,
    pub percent_of_category_denied: f64,
    pub percent_of_category_granted: f64,
    pub percent_of_total_denied: f64,
    pub percent_of_total_granted: f64,
}

/// Builds the per-category denied/granted table, sorted by descending
/// `percent_of_category_denied`.
///
/// Empty denominators yield `0.0`, never `NaN`.
#[must_use]
pub fn combined_percentages<C, F>(records: &[Record], key: F) -> Vec<CombinedPercentage<C>>
where
    C: Category,
    F: Fn(&Record) -> C,
{
    let total_denied = records
        .iter()
        .filter(|record| record.outcome == Outcome::Denied)
        .count() as f64;
    let total_granted = records
        .iter()
        .filter(|record| record.outcome == Outcome::Granted)
        .count() as f64;

    let grouped = group_by(records, &key);
    let mut table: Vec<CombinedPercentage<C>> = grouped
        .iter()
        .map(|(category, members)| {
            let category_total = members.len();
            let denied = members
                .iter()
                .filter(|record| record.outcome == Outcome::Denied)
                .count() as f64;
            let granted = members
                .iter()
                .filter(|record| record.outcome == Outcome::Granted)
                .count() as f64;
            CombinedPercentage {
                category,
                category_total,
                percent_of_category_denied: safe_percent(denied, category_total as f64),
                percent_of_category_granted: safe_percent(granted, category_total as f64),
                percent_of_total_denied: safe_percent(denied, total_denied),
                percent_of_total_granted: safe_percent(granted, total_granted),
            }
        })
        .collect();

    table.sort_by_key(|entry| std::cmp::Reverse(OrderedFloat(entry.percent_of_category_denied)));
    table
}

/// One pie slice before angle assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PieSlice<C: Category> {
    pub category: C,
    pub value: usize,
}

/// Slice values for one outcome, one slice per category present in `records`,
/// sorted ascending by value. Equal values keep canonical category order.
#[must_use]
pub fn pie_slices<C, F>(records: &[Record], key: F, outcome: Outcome) -> Vec<PieSlice<C>>
where
    C: Category,
    F: Fn(&Record) -> C,
{
    let mut slices: Vec<PieSlice<C>> = group_by(records, key)
        .iter()
        .map(|(category, members)| PieSlice {
            category,
            value: members
                .iter()
                .filter(|record| record.outcome == outcome)
                .count(),
        })
        .collect();
    slices.sort_by_key(|slice| slice.value);
    slices
}

/// Cumulative `[start, end)` range of one category in a stacked bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StackSegment<C: Category> {
    pub category: C,
    pub start: f64,
    pub end: f64,
}

impl<C: Category> StackSegment<C> {
    #[must_use]
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() <= 0.0
    }
}

#[must_use]
pub fn stack_segments<C: Category>(counts: &CategoryCounts<C>) -> Vec<StackSegment<C>> {
    let mut cursor = 0.0;
    counts
        .iter()
        .map(|(category, count)| {
            let start = cursor;
            cursor += count as f64;
            StackSegment {
                category,
                start,
                end: cursor,
            }
        })
        .collect()
}

/// Averages for one side of the age split used by the butterfly comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgeSideSummary {
    pub count: usize,
    pub avg_age: f64,
    pub avg_age_entered: f64,
    pub avg_time_served: f64,
    pub avg_min_sentence: f64,
    pub avg_max_sentence: f64,
    pub avg_prop_sent_served: f64,
    /// Mean share of life spent in prison, `(age - age_entered) / age * 100`.
    pub avg_life_in_prison: f64,
    pub percent_granted: f64,
    pub percent_denied: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgeSplitSummary {
    pub threshold: f64,
    pub under: AgeSideSummary,
    pub at_or_over: AgeSideSummary,
}

fn summarize_side<'a>(records: impl Iterator<Item = &'a Record> + Clone) -> AgeSideSummary {
    let count = records.clone().count();
    if count == 0 {
        return AgeSideSummary::default();
    }
    let mean_of = |field: fn(&Record) -> Option<f64>| {
        finite_mean(records.clone().filter_map(field)).unwrap_or(0.0)
    };
    let granted = records
        .clone()
        .filter(|record| record.outcome == Outcome::Granted)
        .count() as f64;
    let denied = records
        .clone()
        .filter(|record| record.outcome == Outcome::Denied)
        .count() as f64;

    AgeSideSummary {
        count,
        avg_age: mean_of(|record| record.age),
        avg_age_entered: mean_of(|record| record.age_entered),
        avg_time_served: mean_of(|record| record.time_served),
        avg_min_sentence: mean_of(|record| record.min_sentence),
        avg_max_sentence: mean_of(|record| record.max_sentence),
        avg_prop_sent_served: mean_of(|record| record.prop_sent_served),
        avg_life_in_prison: mean_of(|record| match (record.age, record.age_entered) {
            (Some(age), Some(entered)) if age > 0.0 => Some((age - entered) / age * 100.0),
            _ => None,
        }),
        percent_granted: safe_percent(granted, count as f64),
        percent_denied: safe_percent(denied, count as f64),
    }
}

/// Splits people at `threshold` years of age and summarizes both sides.
///
/// Records without an age are excluded from both sides.
#[must_use]
pub fn age_split_summary<'a>(
    records: impl Iterator<Item = &'a Record> + Clone,
    threshold: f64,
) -> AgeSplitSummary {
    let under = records
        .clone()
        .filter(move |record| record.age.is_some_and(|age| age < threshold));
    let at_or_over = records.filter(move |record| record.age.is_some_and(|age| age >= threshold));
    AgeSplitSummary {
        threshold,
        under: summarize_side(under),
        at_or_over: summarize_side(at_or_over),
    }
}

/// Share of all interviews held for one interview type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TypeProportion {
    pub interview_type: InterviewType,
    pub count: usize,
    pub proportion: f64,
}

#[must_use]
pub fn type_proportions(counts: &CategoryCounts<InterviewType>) -> Vec<TypeProportion> {
    let total = counts.total() as f64;
    counts
        .iter()
        .map(|(interview_type, count)| TypeProportion {
            interview_type,
            count,
            proportion: if total > 0.0 {
                count as f64 / total
            } else {
                0.0
            },
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineCounts {
    pub total_interviews: usize,
    pub unique_persons: usize,
    pub repeat_persons: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PiePair<C: Category> {
    pub denied: Vec<PieSlice<C>>,
    pub granted: Vec<PieSlice<C>>,
}

impl<C: Category> PiePair<C> {
    fn build<F>(records: &[Record], key: F) -> Self
    where
        F: Fn(&Record) -> C + Copy,
    {
        Self {
            denied: pie_slices(records, key, Outcome::Denied),
            granted: pie_slices(records, key, Outcome::Granted),
        }
    }
}

/// Every derived collection the narrative stages consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub headline: HeadlineCounts,
    pub outcome_counts: CategoryCounts<Outcome>,
    pub type_counts: CategoryCounts<InterviewType>,
    pub ethnicity_counts: CategoryCounts<EthnicityBucket>,
    pub age_counts: CategoryCounts<AgeBucket>,
    pub outcome_stack: Vec<StackSegment<Outcome>>,
    pub race_pies: PiePair<EthnicityBucket>,
    pub age_pies: PiePair<AgeBucket>,
    pub combined_race: Vec<CombinedPercentage<EthnicityBucket>>,
    pub combined_age: Vec<CombinedPercentage<AgeBucket>>,
    pub combined_type: Vec<CombinedPercentage<InterviewType>>,
    pub age_split: AgeSplitSummary,
    pub type_proportions: Vec<TypeProportion>,
}

pub const AGE_SPLIT_THRESHOLD: f64 = 55.0;

impl Aggregates {
    #[must_use]
    pub fn build(records: &[Record], individuals: &IndividualView) -> Self {
        let outcome_counts = count_by(records, |record| record.outcome);
        let type_counts = count_by(records, |record| record.interview_type);
        let ethnicity_counts = count_by(records, |record| record.ethnicity);
        let age_counts = count_by(records, |record| record.age_bucket);

        check_total_preserved("outcome", &outcome_counts, records.len());
        check_total_preserved("interview_type", &type_counts, records.len());
        check_total_preserved("ethnicity", &ethnicity_counts, records.len());
        check_total_preserved("age", &age_counts, records.len());

        let aggregates = Self {
            headline: HeadlineCounts {
                total_interviews: records.len(),
                unique_persons: individuals.len(),
                repeat_persons: individuals.repeat_count(),
            },
            outcome_stack: stack_segments(&outcome_counts),
            race_pies: PiePair::build(records, |record| record.ethnicity),
            age_pies: PiePair::build(records, |record| record.age_bucket),
            combined_race: combined_percentages(records, |record| record.ethnicity),
            combined_age: combined_percentages(records, |record| record.age_bucket),
            combined_type: combined_percentages(records, |record| record.interview_type),
            age_split: age_split_summary(individuals.records(), AGE_SPLIT_THRESHOLD),
            type_proportions: type_proportions(&type_counts),
            outcome_counts,
            type_counts,
            ethnicity_counts,
            age_counts,
        };
        debug!(
            outcomes = aggregates.outcome_counts.len(),
            types = aggregates.type_counts.len(),
            "built aggregates"
        );
        aggregates
    }
}
