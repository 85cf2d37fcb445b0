use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Identifier assigned by a sink to a stored record.
pub type Id = i64;

/// Ids published by a seeding node. Shared by every dependent without copying.
pub type Ids = Arc<Vec<Id>>;

/// Name of the field that holds a reference to a record of `dependency`.
pub fn reference_field(dependency: &str) -> String {
    format!("{dependency}_id")
}

/// A generated row: its kind and a flat set of named values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    kind: String,
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The id this record points at in `dependency`, if any.
    pub fn reference(&self, dependency: &str) -> Option<Id> {
        self.fields
            .get(&reference_field(dependency))
            .and_then(Value::as_i64)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.fields) {
            Ok(json) => write!(f, "{} {}", self.kind, json),
            Err(_) => write!(f, "{} <unprintable>", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_lookup() {
        let card = Record::new("cards")
            .with_field("seq", 0)
            .with_field(reference_field("users"), 42);

        assert_eq!(card.kind(), "cards");
        assert_eq!(card.reference("users"), Some(42));
        assert_eq!(card.reference("payments"), None);
        assert_eq!(card.to_string(), r#"cards {"seq":0,"users_id":42}"#);
    }
}
