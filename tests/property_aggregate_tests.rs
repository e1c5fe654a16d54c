use proptest::prelude::*;
use scrolly_rs::core::{Aggregates, RawRecord, build_individuals, normalize_records};

const DECISIONS: [&str; 6] = ["GRANTED", "DENIED", "OPEN DATE", "OR EARLIER", "**********", ""];
const RACES: [&str; 5] = ["WHITE", "BLACK", "HISPANIC", "ASIAN/PACIFIC", "?"];

fn raw_row() -> impl Strategy<Value = RawRecord> {
    (
        0u8..20,
        0usize..DECISIONS.len(),
        0usize..RACES.len(),
        prop::option::of(15.0f64..90.0),
        1u32..28,
    )
        .prop_map(|(id, decision, race, age, day)| RawRecord {
            id: Some(format!("p{id}")),
            parole_interview_date: Some(format!("2020-02-{day:02}")),
            interview_decision: Some(DECISIONS[decision].to_owned()),
            race_ethnicity: Some(RACES[race].to_owned()),
            age,
            ..RawRecord::default()
        })
}

proptest! {
    #[test]
    fn bucket_totals_match_record_count(rows in prop::collection::vec(raw_row(), 0..120)) {
        let records = normalize_records(&rows);
        let individuals = build_individuals(&records);
        let aggregates = Aggregates::build(&records, &individuals);

        prop_assert_eq!(aggregates.outcome_counts.total(), records.len());
        prop_assert_eq!(aggregates.ethnicity_counts.total(), records.len());
        prop_assert_eq!(aggregates.age_counts.total(), records.len());
        prop_assert_eq!(aggregates.type_counts.total(), records.len());

        let pie_total: usize = aggregates
            .race_pies
            .denied
            .iter()
            .chain(&aggregates.race_pies.granted)
            .map(|slice| slice.value)
            .sum();
        prop_assert!(pie_total <= records.len());
    }

    #[test]
    fn individuals_never_exceed_interviews(rows in prop::collection::vec(raw_row(), 0..120)) {
        let records = normalize_records(&rows);
        let individuals = build_individuals(&records);

        prop_assert!(individuals.len() <= records.len());
        prop_assert!(individuals.repeat_count() <= individuals.len());
        let counted: usize = individuals
            .individuals()
            .iter()
            .map(|individual| individual.interview_count)
            .sum();
        prop_assert_eq!(counted, records.len());
    }

    #[test]
    fn percentages_stay_in_range(rows in prop::collection::vec(raw_row(), 0..120)) {
        let records = normalize_records(&rows);
        let aggregates = Aggregates::build(&records, &build_individuals(&records));

        for entry in &aggregates.combined_race {
            for value in [
                entry.percent_of_category_denied,
                entry.percent_of_category_granted,
                entry.percent_of_total_denied,
                entry.percent_of_total_granted,
            ] {
                prop_assert!(value.is_finite());
                prop_assert!((0.0..=100.0 + 1e-9).contains(&value));
            }
        }
        for pair in aggregates.combined_age.windows(2) {
            prop_assert!(pair[0].percent_of_category_denied >= pair[1].percent_of_category_denied);
        }
    }
}
