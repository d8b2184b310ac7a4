//! Scanning service response types.

use serde::Serialize;
use serde_json::Value;

use crate::error::{ScanError, ScanResult};

/// Label value that signals a positive detection.
pub const FAKE_LABEL: &str = "FAKE";

/// Parsed scan response.
///
/// Only `result.label` has defined meaning; everything else in the response is
/// kept verbatim in `raw` for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    /// `result.label`, if present and a string
    pub label: Option<String>,
    /// Full response body
    pub raw: Value,
}

impl ScanReport {
    /// Interpret a decoded response body.
    ///
    /// A body without `result` is an API-level error, not a negative detection.
    pub fn from_value(raw: Value) -> ScanResult<Self> {
        if raw.get("result").is_none() {
            return Err(ScanError::MissingResult { body: raw });
        }

        let result = &raw["result"];
        let result = result
            .as_object()
            .ok_or_else(|| ScanError::MalformedResult(format!("expected an object, got {}", result)))?;

        let label = result
            .get("label")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self { label, raw })
    }

    /// True only for an exact `"FAKE"` label.
    pub fn is_fake(&self) -> bool {
        self.label.as_deref() == Some(FAKE_LABEL)
    }

    /// The `result` object.
    pub fn result(&self) -> &Value {
        &self.raw["result"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fake_label() {
        let report = ScanReport::from_value(json!({"result": {"label": "FAKE", "score": 0.97}})).unwrap();
        assert!(report.is_fake());
        assert_eq!(report.label.as_deref(), Some("FAKE"));
        assert_eq!(report.result()["score"], 0.97);
    }

    #[test]
    fn test_other_labels_are_negative() {
        for body in [
            json!({"result": {"label": "REAL"}}),
            json!({"result": {"label": "fake"}}),
            json!({"result": {"label": null}}),
            json!({"result": {"label": 1}}),
            json!({"result": {}}),
        ] {
            let report = ScanReport::from_value(body.clone()).unwrap();
            assert!(!report.is_fake(), "{} should be negative", body);
        }
    }

    #[test]
    fn test_missing_result_is_error() {
        let err = ScanReport::from_value(json!({})).unwrap_err();
        assert!(matches!(err, ScanError::MissingResult { .. }));

        let err = ScanReport::from_value(json!({"error": "quota exceeded"})).unwrap_err();
        match err {
            ScanError::MissingResult { body } => assert_eq!(body["error"], "quota exceeded"),
            other => panic!("unexpected error: {:?}", other),
        }

        let err = ScanReport::from_value(json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, ScanError::MissingResult { .. }));
    }

    #[test]
    fn test_non_object_result_is_malformed() {
        let err = ScanReport::from_value(json!({"result": null})).unwrap_err();
        assert!(matches!(err, ScanError::MalformedResult(_)));

        let err = ScanReport::from_value(json!({"result": "FAKE"})).unwrap_err();
        assert!(matches!(err, ScanError::MalformedResult(_)));
    }
}
