use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::core::category::{AgeBucket, Category, EthnicityBucket, InterviewType, Outcome};
use crate::core::primitives::parse_interview_date;

/// One interview row exactly as it appears in the bulk export.
///
/// Every field is lenient: missing keys, `null`, and numbers encoded as
/// strings all deserialize. Shape problems are handled during normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub parole_interview_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub interview_decision: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub parole_board_interview_type: Option<String>,
    #[serde(default, rename = "race__ethnicity", deserialize_with = "lenient_string")]
    pub race_ethnicity: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub age: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub prop_sent_served: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub time_serv_at_int: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub min_sent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub max_sent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub age_entered: Option<f64>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number.to_string()),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|parsed| parsed.is_finite()))
}

/// Normalized interview record with closed-vocabulary categories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub person_id: String,
    pub interview_date: Option<NaiveDate>,
    pub outcome: Outcome,
    pub interview_type: InterviewType,
    pub ethnicity: EthnicityBucket,
    pub age: Option<f64>,
    pub age_bucket: AgeBucket,
    /// Share of the sentence served, in percent `[0, 100]`.
    pub prop_sent_served: Option<f64>,
    pub time_served: Option<f64>,
    pub min_sentence: Option<f64>,
    pub max_sentence: Option<f64>,
    pub age_entered: Option<f64>,
    pub time_past_min: Option<f64>,
    pub time_under_min: Option<f64>,
}

impl Record {
    /// Builds a normalized record from a raw export row.
    ///
    /// Missing ids fall back to a positional id so the row still counts as one
    /// distinct person.
    #[must_use]
    pub fn from_raw(raw: &RawRecord, index: usize) -> Self {
        let person_id = raw
            .id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(|| format!("__missing_id_{index}"), str::to_owned);

        let interview_date = raw
            .parole_interview_date
            .as_deref()
            .and_then(parse_interview_date);

        let (time_past_min, time_under_min) = match (raw.time_serv_at_int, raw.min_sent) {
            (Some(served), Some(minimum)) if served > minimum => (Some(served - minimum), None),
            (Some(served), Some(minimum)) if served < minimum => (None, Some(minimum - served)),
            _ => (None, None),
        };

        Self {
            person_id,
            interview_date,
            outcome: Outcome::recode(raw.interview_decision.as_deref().unwrap_or_default()),
            interview_type: InterviewType::recode(
                raw.parole_board_interview_type
                    .as_deref()
                    .unwrap_or_default(),
            ),
            ethnicity: EthnicityBucket::recode(raw.race_ethnicity.as_deref().unwrap_or_default()),
            age: raw.age,
            age_bucket: AgeBucket::from_age(raw.age),
            prop_sent_served: raw.prop_sent_served.map(normalize_prop_sent_served),
            time_served: raw.time_serv_at_int,
            min_sentence: raw.min_sent,
            max_sentence: raw.max_sent,
            age_entered: raw.age_entered,
            time_past_min,
            time_under_min,
        }
    }
}

/// Converts a served proportion to percent.
///
/// Fractions in `[0, 1]` scale by 100. Any value above 1 becomes 100, even
/// one that already looks like a percent, and negative values become 0.
#[must_use]
pub fn normalize_prop_sent_served(value: f64) -> f64 {
    if value <= 0.0 {
        0.0
    } else if value <= 1.0 {
        value * 100.0
    } else {
        100.0
    }
}

/// Normalizes every raw row. The output has the same length and order.
#[must_use]
pub fn normalize_records(raw: &[RawRecord]) -> Vec<Record> {
    let records: Vec<Record> = raw
        .iter()
        .enumerate()
        .map(|(index, row)| Record::from_raw(row, index))
        .collect();

    let other_outcomes = records
        .iter()
        .filter(|record| record.outcome == Outcome::Other)
        .count();
    let undated = records
        .iter()
        .filter(|record| record.interview_date.is_none())
        .count();
    debug!(
        count = records.len(),
        other_outcomes, undated, "normalized interview records"
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_fields_accept_mixed_json_shapes() {
        let raw: RawRecord = serde_json::from_str(
            r#"{"id": 42, "age": "37", "prop_sent_served": null, "min_sent": "n/a"}"#,
        )
        .expect("lenient row");
        assert_eq!(raw.id.as_deref(), Some("42"));
        assert_eq!(raw.age, Some(37.0));
        assert_eq!(raw.prop_sent_served, None);
        assert_eq!(raw.min_sent, None);
        assert_eq!(raw.interview_decision, None);
    }

    #[test]
    fn prop_served_fraction_and_overflow() {
        assert!((normalize_prop_sent_served(0.42) - 42.0).abs() <= 1e-9);
        assert_eq!(normalize_prop_sent_served(1.0), 100.0);
        assert_eq!(normalize_prop_sent_served(3.5), 100.0);
        assert_eq!(normalize_prop_sent_served(42.0), 100.0);
        assert_eq!(normalize_prop_sent_served(-0.2), 0.0);
    }

    #[test]
    fn time_relative_to_minimum_is_split() {
        let raw = RawRecord {
            time_serv_at_int: Some(10.0),
            min_sent: Some(6.0),
            ..RawRecord::default()
        };
        let record = Record::from_raw(&raw, 0);
        assert_eq!(record.time_past_min, Some(4.0));
        assert_eq!(record.time_under_min, None);
        assert_eq!(record.person_id, "__missing_id_0");
        assert_eq!(record.outcome, Outcome::Other);
        assert_eq!(record.age_bucket, AgeBucket::Unknown);
    }
}
