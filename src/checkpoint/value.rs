//! Datamodel values inside checkpoints.
//!
//! `serde_json::Value` needs a self-describing format to deserialize, which
//! bincode is not. Non-human-readable formats therefore store values as JSON
//! text; human-readable formats store them inline.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::ops::Deref;

/// A datamodel value that round-trips through both JSON and bincode.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct StoredValue(pub Value);

impl Deref for StoredValue {
    type Target = Value;

    fn deref(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for StoredValue {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl Serialize for StoredValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            self.0.serialize(serializer)
        } else {
            serializer.serialize_str(&self.0.to_string())
        }
    }
}

impl<'de> Deserialize<'de> for StoredValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            Value::deserialize(deserializer).map(StoredValue)
        } else {
            let text = String::deserialize(deserializer)?;
            serde_json::from_str(&text)
                .map(StoredValue)
                .map_err(serde::de::Error::custom)
        }
    }
}

/// `#[serde(with = ...)]` adapter for `Option<Value>` fields.
pub mod optional {
    use super::StoredValue;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::Value;

    pub fn serialize<S: Serializer>(value: &Option<Value>, serializer: S) -> Result<S::Ok, S::Error> {
        value.clone().map(StoredValue).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
        Option::<StoredValue>::deserialize(deserializer).map(|stored| stored.map(|s| s.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_survive_bincode() {
        let value = StoredValue(json!({"list": [1, "two", null], "flag": true}));
        let bytes = bincode::serialize(&value).unwrap();
        let restored: StoredValue = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, value);
    }

    #[test]
    fn values_stay_inline_in_json() {
        let value = StoredValue(json!({"n": 1}));
        assert_eq!(serde_json::to_string(&value).unwrap(), r#"{"n":1}"#);
    }
}
