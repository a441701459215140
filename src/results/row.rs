use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value as JsonValue};

use crate::types::{FetchMode, RowValues};

/// A row from a query result.
///
/// Column names and the name-to-index map are shared by every row of one result set.
#[derive(Debug, Clone)]
pub struct CustomDbRow {
    /// Column names in select order
    pub column_names: Arc<Vec<String>>,
    /// Values in column order
    pub rows: Vec<RowValues>,
    #[doc(hidden)]
    pub(crate) column_index_cache: Arc<HashMap<String, usize>>,
}

impl PartialEq for CustomDbRow {
    fn eq(&self, other: &Self) -> bool {
        self.column_names == other.column_names && self.rows == other.rows
    }
}

pub(crate) fn index_columns(column_names: &[String]) -> Arc<HashMap<String, usize>> {
    let mut cache = HashMap::with_capacity(column_names.len());
    for (i, name) in column_names.iter().enumerate() {
        // Duplicate column names resolve to the last occurrence.
        cache.insert(name.clone(), i);
    }
    Arc::new(cache)
}

impl CustomDbRow {
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, rows: Vec<RowValues>) -> Self {
        let column_index_cache = index_columns(&column_names);
        Self {
            column_names,
            rows,
            column_index_cache,
        }
    }

    #[must_use]
    pub fn get_column_index(&self, column_name: &str) -> Option<usize> {
        self.column_index_cache.get(column_name).copied()
    }

    /// Value of a column by name.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&RowValues> {
        self.get_column_index(column_name)
            .and_then(|idx| self.rows.get(idx))
    }

    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&RowValues> {
        self.rows.get(index)
    }

    /// Look a key up the way `mode` addresses columns.
    ///
    /// `FetchMode::Both` also accepts a decimal position (`"0"`, `"1"`, ...) when no
    /// column carries that name.
    #[must_use]
    pub fn lookup(&self, key: &str, mode: FetchMode) -> Option<&RowValues> {
        match (self.get(key), mode) {
            (Some(value), _) => Some(value),
            (None, FetchMode::Both) => key
                .parse::<usize>()
                .ok()
                .and_then(|idx| self.get_by_index(idx)),
            (None, _) => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RowValues)> {
        self.column_names
            .iter()
            .map(String::as_str)
            .zip(self.rows.iter())
    }

    /// Render as a JSON object. `FetchMode::Both` adds positional keys after the
    /// named ones.
    #[must_use]
    pub fn to_json(&self, mode: FetchMode) -> JsonValue {
        let mut map = Map::with_capacity(self.rows.len());
        for (name, value) in self.iter() {
            map.insert(name.to_string(), value.to_json());
        }
        if mode == FetchMode::Both {
            for (idx, value) in self.rows.iter().enumerate() {
                map.entry(idx.to_string()).or_insert_with(|| value.to_json());
            }
        }
        JsonValue::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> CustomDbRow {
        CustomDbRow::new(
            Arc::new(vec!["id".to_string(), "name".to_string()]),
            vec![RowValues::Int(1), RowValues::Text("Alice".into())],
        )
    }

    #[test]
    fn lookup_by_name_and_position() {
        let row = row();
        assert_eq!(row.get("name"), Some(&RowValues::Text("Alice".into())));
        assert_eq!(row.lookup("1", FetchMode::Assoc), None);
        assert_eq!(
            row.lookup("1", FetchMode::Both),
            Some(&RowValues::Text("Alice".into()))
        );
        assert_eq!(row.lookup("missing", FetchMode::Both), None);
    }

    #[test]
    fn json_rendering_honours_mode() {
        let row = row();
        let assoc = row.to_json(FetchMode::Assoc);
        assert_eq!(assoc, serde_json::json!({"id": 1, "name": "Alice"}));
        let both = row.to_json(FetchMode::Both);
        assert_eq!(
            both,
            serde_json::json!({"id": 1, "name": "Alice", "0": 1, "1": "Alice"})
        );
    }
}
