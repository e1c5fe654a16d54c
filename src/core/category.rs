//! Closed vocabularies for the categorical record fields.
//!
//! Raw exports use an open, inconsistent set of labels. Every raw label is
//! recoded into exactly one variant; anything unrecognized lands in an explicit
//! catch-all variant so no record is ever dropped from a grouping.

use std::fmt::Debug;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// Shared behavior of the recoded categorical fields.
pub trait Category: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// All variants in canonical display order.
    fn all() -> &'static [Self];

    /// Stable identifier, safe to embed in element ids.
    fn token(self) -> &'static str;

    /// Human readable label.
    fn label(self) -> &'static str;

    /// Maps a raw label to its bucket. Recoded tokens map to themselves.
    fn recode(raw: &str) -> Self;

    /// Parses a token produced by [`Category::token`].
    fn from_token(token: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|variant| variant.token() == token)
    }
}

fn normalize_label(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Granted,
    Denied,
    Postponed,
    Other,
}

impl Category for Outcome {
    fn all() -> &'static [Self] {
        &[Self::Granted, Self::Denied, Self::Postponed, Self::Other]
    }

    fn token(self) -> &'static str {
        match self {
            Self::Granted => "GRANTED",
            Self::Denied => "DENIED",
            Self::Postponed => "POSTPONED",
            Self::Other => "OTHER",
        }
    }

    fn label(self) -> &'static str {
        self.token()
    }

    fn recode(raw: &str) -> Self {
        match normalize_label(raw).as_str() {
            "GRANTED" | "OPEN DATE" | "PAROLED" | "RCND&RELSE" | "REINSTATE" => Self::Granted,
            "DENIED" | "NOT GRANTD" | "RCND&HOLD" => Self::Denied,
            "POSTPONED" | "OR EARLIER" => Self::Postponed,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewType {
    Initial,
    Reappear,
    Other,
}

impl Category for InterviewType {
    fn all() -> &'static [Self] {
        &[Self::Initial, Self::Reappear, Self::Other]
    }

    fn token(self) -> &'static str {
        match self {
            Self::Initial => "INITIAL",
            Self::Reappear => "REAPPEAR",
            Self::Other => "OTHER",
        }
    }

    fn label(self) -> &'static str {
        self.token()
    }

    fn recode(raw: &str) -> Self {
        match normalize_label(raw).as_str() {
            "INITIAL" | "MERIT TIME" | "PIE" | "MEDICAL" | "ECPDO" | "SUPP MERIT" => {
                Self::Initial
            }
            "REAPPEAR" => Self::Reappear,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EthnicityBucket {
    White,
    Black,
    Hispanic,
    AmerindAlsk,
    AsianPacific,
    UnknownOther,
}

impl Category for EthnicityBucket {
    fn all() -> &'static [Self] {
        &[
            Self::White,
            Self::Black,
            Self::Hispanic,
            Self::AmerindAlsk,
            Self::AsianPacific,
            Self::UnknownOther,
        ]
    }

    fn token(self) -> &'static str {
        match self {
            Self::White => "WHITE",
            Self::Black => "BLACK",
            Self::Hispanic => "HISPANIC",
            Self::AmerindAlsk => "AMERIND_ALSK",
            Self::AsianPacific => "ASIAN_PACIFIC",
            Self::UnknownOther => "UNKNOWN_OTHER",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::White => "WHITE",
            Self::Black => "BLACK",
            Self::Hispanic => "HISPANIC",
            Self::AmerindAlsk => "AMERICAN INDIAN / ALASKAN",
            Self::AsianPacific => "ASIAN / PACIFIC ISLANDER",
            Self::UnknownOther => "UNKNOWN / OTHER",
        }
    }

    fn recode(raw: &str) -> Self {
        match normalize_label(raw).as_str() {
            "WHITE" => Self::White,
            "BLACK" => Self::Black,
            "HISPANIC" => Self::Hispanic,
            "AMERIND_ALSK" | "AMERIND/ALSK" | "AMERIND ALSK" => Self::AmerindAlsk,
            "ASIAN_PACIFIC" | "ASIAN/PACIFIC" | "ASIAN PACIFIC" => Self::AsianPacific,
            _ => Self::UnknownOther,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgeBucket {
    #[serde(rename = "UNDER25")]
    Under25,
    #[serde(rename = "25_34")]
    From25To34,
    #[serde(rename = "35_44")]
    From35To44,
    #[serde(rename = "45_54")]
    From45To54,
    #[serde(rename = "OVER55")]
    Over55,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl AgeBucket {
    /// Buckets an age using half-open intervals:
    /// `(-inf, 25) [25, 35) [35, 45) [45, 55) [55, inf)`.
    #[must_use]
    pub fn from_age(age: Option<f64>) -> Self {
        match age {
            Some(age) if age.is_finite() => {
                if age < 25.0 {
                    Self::Under25
                } else if age < 35.0 {
                    Self::From25To34
                } else if age < 45.0 {
                    Self::From35To44
                } else if age < 55.0 {
                    Self::From45To54
                } else {
                    Self::Over55
                }
            }
            _ => Self::Unknown,
        }
    }
}

impl Category for AgeBucket {
    fn all() -> &'static [Self] {
        &[
            Self::Under25,
            Self::From25To34,
            Self::From35To44,
            Self::From45To54,
            Self::Over55,
            Self::Unknown,
        ]
    }

    fn token(self) -> &'static str {
        match self {
            Self::Under25 => "UNDER25",
            Self::From25To34 => "25_34",
            Self::From35To44 => "35_44",
            Self::From45To54 => "45_54",
            Self::Over55 => "OVER55",
            Self::Unknown => "UNKNOWN",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Under25 => "UNDER 25",
            Self::From25To34 => "25-34",
            Self::From35To44 => "35-44",
            Self::From45To54 => "45-54",
            Self::Over55 => "OVER 55",
            Self::Unknown => "UNKNOWN",
        }
    }

    fn recode(raw: &str) -> Self {
        Self::from_token(normalize_label(raw).as_str()).unwrap_or(Self::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tokens_are_fixed_points<C: Category>() {
        for variant in C::all() {
            assert_eq!(C::recode(variant.token()), *variant);
            assert_eq!(C::from_token(variant.token()), Some(*variant));
        }
    }

    #[test]
    fn tokens_recode_to_themselves() {
        assert_tokens_are_fixed_points::<Outcome>();
        assert_tokens_are_fixed_points::<InterviewType>();
        assert_tokens_are_fixed_points::<EthnicityBucket>();
        assert_tokens_are_fixed_points::<AgeBucket>();
    }

    #[test]
    fn age_bucket_edges_are_half_open() {
        assert_eq!(AgeBucket::from_age(Some(24.99)), AgeBucket::Under25);
        assert_eq!(AgeBucket::from_age(Some(25.0)), AgeBucket::From25To34);
        assert_eq!(AgeBucket::from_age(Some(34.5)), AgeBucket::From25To34);
        assert_eq!(AgeBucket::from_age(Some(54.9)), AgeBucket::From45To54);
        assert_eq!(AgeBucket::from_age(Some(55.0)), AgeBucket::Over55);
        assert_eq!(AgeBucket::from_age(None), AgeBucket::Unknown);
        assert_eq!(AgeBucket::from_age(Some(f64::NAN)), AgeBucket::Unknown);
    }

    #[test]
    fn sentinel_outcome_is_other() {
        assert_eq!(Outcome::recode("**********"), Outcome::Other);
        assert_eq!(Outcome::recode(" paroled "), Outcome::Granted);
        assert_eq!(Outcome::recode("NOT GRANTD"), Outcome::Denied);
    }
}
