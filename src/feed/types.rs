// Feed data types.
// Records parsed from the cached JSON array and the fixed set of renderable fields.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A renderable feed field, in substitution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Title,
    Location,
    Description,
    PublishTime,
    EndTime,
    AdUrl,
    ApplyUrl,
}

impl Field {
    /// Every field, in the order placeholders are substituted.
    pub const ALL: [Field; 7] = [
        Field::Title,
        Field::Location,
        Field::Description,
        Field::PublishTime,
        Field::EndTime,
        Field::AdUrl,
        Field::ApplyUrl,
    ];

    /// Key in the feed JSON and name used in placeholders.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Location => "location",
            Field::Description => "description",
            Field::PublishTime => "publishTime",
            Field::EndTime => "endTime",
            Field::AdUrl => "adUrl",
            Field::ApplyUrl => "applyUrl",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// One job posting from the feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeedRecord {
    fields: BTreeMap<String, Value>,
}

impl FeedRecord {
    /// Value of a field as text. Missing, null and nested values are `None`.
    pub fn get(&self, field: Field) -> Option<String> {
        match self.fields.get(field.name())? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FeedRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
