//! Partial product updates.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single `{op, path, value}` operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchRequest {
    pub op: String,
    pub path: String,
    #[serde(default)]
    pub value: Value,
}

impl PatchRequest {
    pub fn replace(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            op: "replace".to_string(),
            path: path.into(),
            value: value.into(),
        }
    }

    /// The value, when it is a JSON string
    pub fn value_as_str(&self) -> Option<&str> {
        self.value.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_patch() {
        let patch: PatchRequest =
            serde_json::from_str(r#"{"op": "replace", "path": "pay_api_token", "value": "new"}"#)
                .unwrap();
        assert_eq!(patch, PatchRequest::replace("pay_api_token", "new"));
        assert_eq!(patch.value_as_str(), Some("new"));

        let no_value: PatchRequest =
            serde_json::from_str(r#"{"op": "replace", "path": "pay_api_token"}"#).unwrap();
        assert!(no_value.value_as_str().is_none());
    }
}
