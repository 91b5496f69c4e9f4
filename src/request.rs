//! The `POST /api/generate-pdf` request body and its schema validation.

use serde::Deserialize;

use crate::error::{Error, Result};

/// A validated request: `htmlTable` is present and not blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRequest {
    pub html_table: String,
}

/// Wire shape. Unknown fields are rejected rather than ignored.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTableRequest {
    #[serde(rename = "htmlTable", default)]
    html_table: Option<String>,
}

impl TableRequest {
    /// Parse and validate a JSON request body.
    ///
    /// Every failure is an [`Error::Validation`]: the caller has to fix the
    /// payload, so there is no benefit in retrying.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_slice(body)
            .map_err(|e| Error::Validation(format!("Malformed JSON body: {e}")))?;
        if !value.is_object() {
            return Err(Error::Validation(
                "Request body must be a JSON object with an 'htmlTable' field".to_string(),
            ));
        }

        let raw: RawTableRequest = serde_json::from_value(value)
            .map_err(|e| Error::Validation(format!("Invalid request body: {e}")))?;

        let html_table = raw.html_table.ok_or_else(|| {
            Error::Validation("Missing required field 'htmlTable' in request body".to_string())
        })?;
        if html_table.trim().is_empty() {
            return Err(Error::Validation("htmlTable cannot be empty".to_string()));
        }
        Ok(Self { html_table })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(body: &str) -> String {
        match TableRequest::from_json(body.as_bytes()) {
            Err(Error::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_table_payload() {
        let req = TableRequest::from_json(br#"{"htmlTable": "<table></table>"}"#).unwrap();
        assert_eq!(req.html_table, "<table></table>");
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(message("{htmlTable:").starts_with("Malformed JSON body"));
        assert!(message("").starts_with("Malformed JSON body"));
    }

    #[test]
    fn rejects_missing_and_null_field() {
        assert!(message("{}").contains("Missing required field"));
        assert!(message(r#"{"htmlTable": null}"#).contains("Missing required field"));
    }

    #[test]
    fn rejects_empty_and_blank_strings() {
        assert_eq!(message(r#"{"htmlTable": ""}"#), "htmlTable cannot be empty");
        assert_eq!(message(r#"{"htmlTable": "  \n"}"#), "htmlTable cannot be empty");
    }

    #[test]
    fn rejects_unrecognized_shapes() {
        assert!(message(r#"["<table></table>"]"#).contains("JSON object"));
        assert!(message(r#"{"htmlTable": 5}"#).starts_with("Invalid request body"));
        assert!(message(r#"{"htmlTable": "<table/>", "extra": 1}"#).contains("unknown field"));
    }
}
