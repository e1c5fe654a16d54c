use std::fs;
use std::path::Path;

use tracing::debug;

use crate::core::{RawRecord, Record, normalize_records};
use crate::error::{ScrollyError, ScrollyResult};

/// Parses the bulk export: a JSON array of interview rows.
pub fn load_records_from_str(input: &str) -> ScrollyResult<Vec<RawRecord>> {
    let rows: Vec<RawRecord> = serde_json::from_str(input)
        .map_err(|e| ScrollyError::LoadFailure(format!("malformed record export: {e}")))?;
    debug!(rows = rows.len(), "parsed record export");
    Ok(rows)
}

pub fn load_records_from_path(path: impl AsRef<Path>) -> ScrollyResult<Vec<RawRecord>> {
    let path = path.as_ref();
    let input = fs::read_to_string(path).map_err(|e| {
        ScrollyError::LoadFailure(format!("cannot read `{}`: {e}", path.display()))
    })?;
    load_records_from_str(&input)
}

/// Parses and normalizes in one pass.
pub fn parse_interviews(input: &str) -> ScrollyResult<Vec<Record>> {
    load_records_from_str(input).map(|rows| normalize_records(&rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_array_payload_is_a_load_failure() {
        assert!(matches!(
            load_records_from_str(r#"{"id": 1}"#),
            Err(ScrollyError::LoadFailure(_))
        ));
        assert!(matches!(
            load_records_from_path("/definitely/not/here.json"),
            Err(ScrollyError::LoadFailure(_))
        ));
    }

    #[test]
    fn empty_array_is_valid() {
        assert!(parse_interviews("[]").expect("empty").is_empty());
    }
}
