use sqlx::mysql::{MySql, MySqlArguments};
use sqlx::query::Query;
use sqlx::types::Json;

use crate::types::RowValues;

/// Bind one value onto a prepared MySQL query.
pub fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &RowValues,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        RowValues::Int(i) => query.bind(*i),
        RowValues::UInt(u) => query.bind(*u),
        RowValues::Float(f) => query.bind(*f),
        RowValues::Text(s) => query.bind(s.clone()),
        RowValues::Bool(b) => query.bind(*b),
        RowValues::Timestamp(dt) => query.bind(*dt),
        RowValues::Null => query.bind(Option::<String>::None),
        RowValues::JSON(v) => query.bind(Json(v.clone())),
        RowValues::Blob(bytes) => query.bind(bytes.clone()),
    }
}

/// Bind every value in order.
pub fn bind_all<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    values: &[RowValues],
) -> Query<'q, MySql, MySqlArguments> {
    for value in values {
        query = bind_value(query, value);
    }
    query
}
