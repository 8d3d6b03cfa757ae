//! Product metadata: free-form key-value pairs attached to a product.
//!
//! Requests carry exactly one pair as a JSON object, e.g. `{"colour": "blue"}`.
//! Keys are compared case-insensitively.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::validation::ValidationError;

/// Most pairs a single product may carry
pub const MAX_KEY_VALUE_PAIRS: usize = 10;
pub const MAX_KEY_LENGTH: usize = 30;
pub const MAX_VALUE_LENGTH: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductMetadata {
    pub key: String,
    pub value: String,
}

impl ProductMetadata {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Read the single pair of a request payload
    pub fn from_payload(payload: &Value) -> Result<Self, ValidationError> {
        let object = payload
            .as_object()
            .ok_or_else(|| ValidationError::new("Payload must be a JSON object"))?;

        if object.is_empty() {
            return Err(ValidationError::new("Empty payload is not allowed"));
        }
        if object.len() > 1 {
            return Err(ValidationError::new("Only one key-value pair is allowed"));
        }

        let Some((key, value)) = object.iter().next() else {
            return Err(ValidationError::new("Empty payload is not allowed"));
        };

        if key.chars().count() > MAX_KEY_LENGTH {
            return Err(ValidationError::with_code(
                format!("Maximum key field length is [ {} ]", MAX_KEY_LENGTH),
                "KEY_LENGTH_OVER_MAX_SIZE",
            ));
        }

        let value = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                return Err(ValidationError::new(format!(
                    "Value of key [ {} ] must be a string, number or boolean",
                    key
                )))
            }
        };

        if value.chars().count() > MAX_VALUE_LENGTH {
            return Err(ValidationError::with_code(
                format!("Maximum value field length is [ {} ]", MAX_VALUE_LENGTH),
                "VALUE_LENGTH_OVER_MAX_SIZE",
            ));
        }

        Ok(Self::new(key.clone(), value))
    }

    fn has_key(&self, key: &str) -> bool {
        self.key.to_lowercase() == key.to_lowercase()
    }
}

/// Check a new pair fits next to the product's existing ones
pub fn check_can_add(existing: &[ProductMetadata], key: &str) -> Result<(), ValidationError> {
    if existing.len() >= MAX_KEY_VALUE_PAIRS {
        return Err(ValidationError::with_code(
            format!(
                "Maximum number of allowed metadata [ {} ] exceeded",
                MAX_KEY_VALUE_PAIRS
            ),
            "MAX_METADATA_LENGTH_EXCEEDED",
        ));
    }

    if existing.iter().any(|m| m.has_key(key)) {
        return Err(ValidationError::with_code(
            format!("Key [ {} ] already exists, duplicate keys not allowed", key),
            "DUPLICATE_METADATA_KEYS",
        ));
    }

    Ok(())
}

/// Check the key being updated is already present
pub fn check_can_update(existing: &[ProductMetadata], key: &str) -> Result<(), ValidationError> {
    if existing.iter().any(|m| m.has_key(key)) {
        Ok(())
    } else {
        Err(ValidationError::new(format!("Key [ {} ] does not exist", key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};

    fn pair(key: &str, value: &str) -> Value {
        let mut object = Map::new();
        object.insert(key.to_string(), Value::String(value.to_string()));
        Value::Object(object)
    }

    #[test]
    fn test_single_pair_accepted() {
        let metadata = ProductMetadata::from_payload(&json!({"colour": "blue"})).unwrap();
        assert_eq!(metadata, ProductMetadata::new("colour", "blue"));

        let numeric = ProductMetadata::from_payload(&json!({"count": 3})).unwrap();
        assert_eq!(numeric.value, "3");
    }

    #[test]
    fn test_payload_shape_rejected() {
        let empty = ProductMetadata::from_payload(&json!({})).unwrap_err();
        assert_eq!(empty.to_string(), "Empty payload is not allowed");

        let two = ProductMetadata::from_payload(&json!({"a": "1", "b": "2"})).unwrap_err();
        assert_eq!(two.to_string(), "Only one key-value pair is allowed");

        assert!(ProductMetadata::from_payload(&json!(["a"])).is_err());
        assert!(ProductMetadata::from_payload(&json!({"a": {"nested": true}})).is_err());
    }

    #[test]
    fn test_length_limits() {
        let long_key = "k".repeat(MAX_KEY_LENGTH + 1);
        let err = ProductMetadata::from_payload(&pair(&long_key, "v")).unwrap_err();
        assert_eq!(err.code, Some("KEY_LENGTH_OVER_MAX_SIZE"));

        let long_value = "v".repeat(MAX_VALUE_LENGTH + 1);
        let err = ProductMetadata::from_payload(&pair("key", &long_value)).unwrap_err();
        assert_eq!(err.code, Some("VALUE_LENGTH_OVER_MAX_SIZE"));

        let at_limit = "k".repeat(MAX_KEY_LENGTH);
        assert!(ProductMetadata::from_payload(&pair(&at_limit, "v")).is_ok());
    }

    #[test]
    fn test_duplicate_keys_ignore_case() {
        let existing = vec![ProductMetadata::new("Colour", "blue")];

        let err = check_can_add(&existing, "colour").unwrap_err();
        assert_eq!(err.code, Some("DUPLICATE_METADATA_KEYS"));
        assert!(check_can_add(&existing, "size").is_ok());

        assert!(check_can_update(&existing, "COLOUR").is_ok());
        assert!(check_can_update(&existing, "size").is_err());
    }

    #[test]
    fn test_pair_limit() {
        let existing: Vec<_> = (0..MAX_KEY_VALUE_PAIRS)
            .map(|i| ProductMetadata::new(format!("k{}", i), "v"))
            .collect();

        let err = check_can_add(&existing, "another").unwrap_err();
        assert_eq!(err.code, Some("MAX_METADATA_LENGTH_EXCEEDED"));
    }
}
