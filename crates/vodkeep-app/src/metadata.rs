//! Metadata serialisation fallback (spec §4.1, §9): turning the
//! extractor's info dict into the `metadata_json` column must never fail
//! the `finish_ok` transition, even if a value the extractor reported
//! can't round-trip through JSON (e.g. a non-finite float some extractor
//! plugin smuggled into a number field).

use vodkeep_extractor::InfoDict;

/// Serialise `info` to a JSON string. On the (expected to be vanishingly
/// rare) case that `serde_json` itself refuses the value — a non-finite
/// float is the only way this can happen, since [`InfoDict`] only holds
/// JSON-representable types otherwise — falls back to a minimal JSON
/// object carrying the failure and a best-effort debug rendering, so the
/// job still completes (spec §9: "lossy-but-total").
#[must_use]
pub(crate) fn serialize_metadata(info: &InfoDict) -> String {
    match serde_json::to_string(info) {
        Ok(json) => json,
        Err(err) => {
            tracing::warn!(
                error = %err,
                "metadata serialisation failed, falling back to lossy rendering"
            );
            serde_json::json!({
                "metadata_serialization_error": err.to_string(),
                "debug": format!("{info:?}"),
            })
            .to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_a_populated_info_dict() {
        let info = InfoDict {
            id: Some("abc123".to_string()),
            title: Some("A Title".to_string()),
            ..Default::default()
        };
        let json = serialize_metadata(&info);
        assert!(json.contains("abc123"));
        assert!(json.contains("A Title"));
    }

    #[test]
    fn serializes_an_empty_info_dict_without_panicking() {
        let json = serialize_metadata(&InfoDict::default());
        assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());
    }
}
