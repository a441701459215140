use std::collections::HashMap;

use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Values that can be stored in a database row or used as bound parameters.
///
/// ```rust
/// use mysql_middleware::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Unsigned integer value, for `BIGINT UNSIGNED` columns
    UInt(u64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_uint(&self) -> Option<u64> {
        match self {
            RowValues::UInt(value) => Some(*value),
            RowValues::Int(value) => u64::try_from(*value).ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<&bool> {
        if let RowValues::Bool(value) = self {
            return Some(value);
        } else if let Some(i) = self.as_int() {
            if *i == 1 {
                return Some(&true);
            } else if *i == 0 {
                return Some(&false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        if let RowValues::Timestamp(value) = self {
            return Some(*value);
        } else if let Some(s) = self.as_text() {
            // MySQL DATETIME text form
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
                return Some(dt);
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
                return Some(dt);
            }
        }
        None
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        if let RowValues::Float(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let RowValues::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Render the value the way it would be used as a map key when re-indexing
    /// rows by a column.
    #[must_use]
    pub fn to_key_string(&self) -> String {
        match self {
            RowValues::Int(v) => v.to_string(),
            RowValues::UInt(v) => v.to_string(),
            RowValues::Float(v) => v.to_string(),
            RowValues::Text(v) => v.clone(),
            RowValues::Bool(v) => u8::from(*v).to_string(),
            RowValues::Timestamp(v) => v.format("%Y-%m-%d %H:%M:%S").to_string(),
            RowValues::Null => String::new(),
            RowValues::JSON(v) => v.to_string(),
            RowValues::Blob(v) => String::from_utf8_lossy(v).into_owned(),
        }
    }

    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            RowValues::Int(v) => JsonValue::from(*v),
            RowValues::UInt(v) => JsonValue::from(*v),
            RowValues::Float(v) => JsonValue::from(*v),
            RowValues::Text(v) => JsonValue::from(v.as_str()),
            RowValues::Bool(v) => JsonValue::from(*v),
            RowValues::Timestamp(v) => {
                JsonValue::from(v.format("%Y-%m-%d %H:%M:%S").to_string())
            }
            RowValues::Null => JsonValue::Null,
            RowValues::JSON(v) => v.clone(),
            RowValues::Blob(v) => JsonValue::from(String::from_utf8_lossy(v).into_owned()),
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<i32> for RowValues {
    fn from(value: i32) -> Self {
        RowValues::Int(i64::from(value))
    }
}

impl From<u64> for RowValues {
    fn from(value: u64) -> Self {
        RowValues::UInt(value)
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<NaiveDateTime> for RowValues {
    fn from(value: NaiveDateTime) -> Self {
        RowValues::Timestamp(value)
    }
}

impl From<Vec<u8>> for RowValues {
    fn from(value: Vec<u8>) -> Self {
        RowValues::Blob(value)
    }
}

impl<T: Into<RowValues>> From<Option<T>> for RowValues {
    fn from(value: Option<T>) -> Self {
        value.map_or(RowValues::Null, Into::into)
    }
}

/// Read/write label assigned to a statement from its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    /// Statements that return rows; eligible for cache hints.
    Read,
    /// Statements that change data or session state; no rows are fetched.
    Write,
}

/// Shape of the rows fetched for a read query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
pub enum FetchMode {
    /// Rows addressed by column name, rendered as JSON objects.
    #[default]
    Object,
    /// Rows addressed by column name.
    Assoc,
    /// Rows addressed by column name or by position (`"0"`, `"1"`, ...).
    Both,
}

/// Insertion-ordered `{column: value}` mapping used for binds and statement building.
///
/// Setting a column that is already present replaces its value in place, so the
/// column order is the order in which columns were first added. Lookups go
/// through a name index, so building large bulk statements stays linear.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    entries: Vec<(String, RowValues)>,
    index: HashMap<String, usize>,
}

impl PartialEq for Fields {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Fields {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Builder-style [`Fields::set`].
    #[must_use]
    pub fn with(mut self, column: impl Into<String>, value: impl Into<RowValues>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<RowValues>) {
        let column = column.into();
        let value = value.into();
        if let Some(&slot) = self.index.get(&column) {
            self.entries[slot].1 = value;
        } else {
            self.index.insert(column.clone(), self.entries.len());
            self.entries.push((column, value));
        }
    }

    #[must_use]
    pub fn get(&self, column: &str) -> Option<&RowValues> {
        self.index
            .get(column)
            .and_then(|&slot| self.entries.get(slot))
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn contains_key(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &RowValues> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Append every entry of `other`, replacing values for columns already present.
    pub fn extend(&mut self, other: Fields) {
        for (column, value) in other.entries {
            self.set(column, value);
        }
    }

    /// True when both mappings carry the same column names, in any order.
    #[must_use]
    pub fn same_columns(&self, other: &Fields) -> bool {
        self.len() == other.len() && self.keys().all(|key| other.contains_key(key))
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<String>,
    V: Into<RowValues>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (column, value) in iter {
            fields.set(column, value);
        }
        fields
    }
}

impl IntoIterator for Fields {
    type Item = (String, RowValues);
    type IntoIter = std::vec::IntoIter<(String, RowValues)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_keep_first_insertion_order() {
        let mut fields = Fields::new().with("name", "Alice").with("age", "30");
        fields.set("name", "Bob");

        let keys: Vec<&str> = fields.keys().collect();
        assert_eq!(keys, vec!["name", "age"]);
        assert_eq!(fields.get("name"), Some(&RowValues::Text("Bob".into())));
    }

    #[test]
    fn replacing_a_value_keeps_lookups_consistent() {
        let mut fields = Fields::with_capacity(4);
        for idx in 0..4 {
            fields.set(format!("c{idx}"), idx);
        }
        fields.set("c2", 20);
        assert_eq!(fields.len(), 4);
        assert_eq!(fields.get("c2"), Some(&RowValues::Int(20)));
        assert_eq!(fields.get("c3"), Some(&RowValues::Int(3)));
        assert!(!fields.contains_key("c4"));
        assert_eq!(fields, Fields::new().with("c0", 0).with("c1", 1).with("c2", 20).with("c3", 3));
    }

    #[test]
    fn same_columns_ignores_order() {
        let a = Fields::new().with("a", 1).with("b", 2);
        let b = Fields::new().with("b", 3).with("a", 4);
        let c = Fields::new().with("a", 1).with("c", 2);
        assert!(a.same_columns(&b));
        assert!(!a.same_columns(&c));
    }

    #[test]
    fn option_converts_to_null() {
        let value: RowValues = Option::<i64>::None.into();
        assert!(value.is_null());
        let value: RowValues = Some(7_i64).into();
        assert_eq!(value.as_int(), Some(&7));
    }

    #[test]
    fn key_strings_are_stable() {
        assert_eq!(RowValues::Int(5).to_key_string(), "5");
        assert_eq!(RowValues::Bool(true).to_key_string(), "1");
        assert_eq!(RowValues::Null.to_key_string(), "");
    }
}
