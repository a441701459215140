use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlColumn, MySqlRow};
use sqlx::types::Json;
use sqlx::{Column, Row, TypeInfo};

use crate::connection::{DriverError, DriverPhase};
use crate::results::ResultSet;
use crate::types::RowValues;

/// Decode fetched rows. Column names come from the first row, so an empty fetch
/// yields a result set without columns.
///
/// # Errors
/// Returns a `Fetch` phase `DriverError` if a cell cannot be decoded.
pub fn build_result_set(rows: &[MySqlRow]) -> Result<ResultSet, DriverError> {
    let mut result_set = ResultSet::with_capacity(rows.len());
    let Some(first) = rows.first() else {
        return Ok(result_set);
    };
    let column_names: Vec<String> = first
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let values = row
            .columns()
            .iter()
            .map(|col| mysql_extract_value(row, col))
            .collect::<Result<Vec<_>, _>>()?;
        result_set.add_row_values(values);
    }
    Ok(result_set)
}

fn is_integer(type_name: &str) -> bool {
    let base = type_name.trim_end_matches(" UNSIGNED");
    matches!(base, "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT")
}

/// Extract one cell as `RowValues`, choosing the decoder from the column type name.
///
/// # Errors
/// Returns a `Fetch` phase `DriverError` if the value does not decode.
pub fn mysql_extract_value(row: &MySqlRow, column: &MySqlColumn) -> Result<RowValues, DriverError> {
    let idx = column.ordinal();
    let type_name = column.type_info().name();
    let decode_err = |e: sqlx::Error| {
        DriverError::new(
            DriverPhase::Fetch,
            None,
            format!("cannot decode column {} ({type_name}): {e}", column.name()),
        )
    };

    let value = match type_name {
        "NULL" => RowValues::Null,
        "BOOLEAN" => row
            .try_get::<Option<bool>, _>(idx)
            .map_err(decode_err)?
            .map_or(RowValues::Null, RowValues::Bool),
        name if is_integer(name) && name.ends_with("UNSIGNED") => row
            .try_get::<Option<u64>, _>(idx)
            .map_err(decode_err)?
            .map_or(RowValues::Null, |v| {
                i64::try_from(v).map_or(RowValues::UInt(v), RowValues::Int)
            }),
        name if is_integer(name) => row
            .try_get::<Option<i64>, _>(idx)
            .map_err(decode_err)?
            .map_or(RowValues::Null, RowValues::Int),
        "YEAR" => row
            .try_get_unchecked::<Option<i64>, _>(idx)
            .map_err(decode_err)?
            .map_or(RowValues::Null, RowValues::Int),
        "FLOAT" => row
            .try_get::<Option<f32>, _>(idx)
            .map_err(decode_err)?
            .map_or(RowValues::Null, |v| RowValues::Float(f64::from(v))),
        "DOUBLE" => row
            .try_get::<Option<f64>, _>(idx)
            .map_err(decode_err)?
            .map_or(RowValues::Null, RowValues::Float),
        // Exact decimals stay text so no precision is lost.
        "DECIMAL" => row
            .try_get_unchecked::<Option<String>, _>(idx)
            .map_err(decode_err)?
            .map_or(RowValues::Null, RowValues::Text),
        "DATETIME" | "TIMESTAMP" => match row.try_get::<Option<NaiveDateTime>, _>(idx) {
            Ok(value) => value.map_or(RowValues::Null, RowValues::Timestamp),
            Err(_) => temporal_text(row, idx, Temporal::DateTime).map_err(decode_err)?,
        },
        "DATE" => match row.try_get::<Option<NaiveDate>, _>(idx) {
            Ok(value) => value.map_or(RowValues::Null, |d| {
                RowValues::Timestamp(d.and_time(NaiveTime::MIN))
            }),
            Err(_) => temporal_text(row, idx, Temporal::Date).map_err(decode_err)?,
        },
        "TIME" => match row.try_get::<Option<NaiveTime>, _>(idx) {
            Ok(value) => value.map_or(RowValues::Null, |t| {
                RowValues::Text(t.format("%H:%M:%S").to_string())
            }),
            Err(_) => temporal_text(row, idx, Temporal::Time).map_err(decode_err)?,
        },
        "JSON" => row
            .try_get::<Option<Json<JsonValue>>, _>(idx)
            .map_err(decode_err)?
            .map_or(RowValues::Null, |json| RowValues::JSON(json.0)),
        "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => row
            .try_get_unchecked::<Option<Vec<u8>>, _>(idx)
            .map_err(decode_err)?
            .map_or(RowValues::Null, RowValues::Blob),
        _ => row
            .try_get_unchecked::<Option<String>, _>(idx)
            .map_err(decode_err)?
            .map_or(RowValues::Null, RowValues::Text),
    };
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Temporal {
    Date,
    DateTime,
    Time,
}

/// Zero dates (`0000-00-00`) and times outside a single day have no chrono
/// representation; they come back as the text MySQL would print.
fn temporal_text(row: &MySqlRow, idx: usize, kind: Temporal) -> Result<RowValues, sqlx::Error> {
    let Some(bytes) = row.try_get_unchecked::<Option<Vec<u8>>, _>(idx)? else {
        return Ok(RowValues::Null);
    };
    raw_temporal_text(&bytes, kind)
        .map(RowValues::Text)
        .ok_or_else(|| sqlx::Error::Decode(format!("unreadable {kind:?} value").into()))
}

/// Render a temporal cell from either wire format. Binary-protocol values carry a
/// leading length byte; text-protocol values are already printed.
fn raw_temporal_text(bytes: &[u8], kind: Temporal) -> Option<String> {
    let (&len, body) = bytes.split_first()?;
    if usize::from(len) != body.len() || body.len() > 12 {
        return std::str::from_utf8(bytes).ok().map(str::to_string);
    }
    let mut b = [0_u8; 12];
    b[..body.len()].copy_from_slice(body);
    match kind {
        Temporal::Date | Temporal::DateTime => {
            let year = u16::from_le_bytes([b[0], b[1]]);
            let date = format!("{year:04}-{:02}-{:02}", b[2], b[3]);
            if kind == Temporal::Date {
                return Some(date);
            }
            let micros = u32::from_le_bytes([b[7], b[8], b[9], b[10]]);
            Some(format!(
                "{date} {:02}:{:02}:{:02}{}",
                b[4],
                b[5],
                b[6],
                fraction(micros)
            ))
        }
        Temporal::Time => {
            let sign = if b[0] == 1 { "-" } else { "" };
            let days = u32::from_le_bytes([b[1], b[2], b[3], b[4]]);
            let hours = u64::from(days) * 24 + u64::from(b[5]);
            let micros = u32::from_le_bytes([b[8], b[9], b[10], b[11]]);
            Some(format!(
                "{sign}{hours:02}:{:02}:{:02}{}",
                b[6],
                b[7],
                fraction(micros)
            ))
        }
    }
}

fn fraction(micros: u32) -> String {
    if micros == 0 {
        String::new()
    } else {
        format!(".{micros:06}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_type_names() {
        assert!(is_integer("INT"));
        assert!(is_integer("BIGINT UNSIGNED"));
        assert!(is_integer("TINYINT"));
        assert!(!is_integer("BOOLEAN"));
        assert!(!is_integer("DECIMAL"));
    }

    #[test]
    fn zero_dates_render_as_text() {
        assert_eq!(
            raw_temporal_text(&[0], Temporal::DateTime).as_deref(),
            Some("0000-00-00 00:00:00")
        );
        assert_eq!(
            raw_temporal_text(&[0], Temporal::Date).as_deref(),
            Some("0000-00-00")
        );
        assert_eq!(
            raw_temporal_text(b"0000-00-00 00:00:00", Temporal::DateTime).as_deref(),
            Some("0000-00-00 00:00:00")
        );
        // 2024-00-15 10:20:30
        assert_eq!(
            raw_temporal_text(&[7, 0xE8, 0x07, 0, 15, 10, 20, 30], Temporal::DateTime).as_deref(),
            Some("2024-00-15 10:20:30")
        );
    }

    #[test]
    fn long_times_render_as_text() {
        // -2 days 03:04:05.000006
        let bytes = [12, 1, 2, 0, 0, 0, 3, 4, 5, 6, 0, 0, 0];
        assert_eq!(
            raw_temporal_text(&bytes, Temporal::Time).as_deref(),
            Some("-51:04:05.000006")
        );
        assert_eq!(
            raw_temporal_text(b"838:59:59", Temporal::Time).as_deref(),
            Some("838:59:59")
        );
        assert_eq!(raw_temporal_text(&[], Temporal::Time), None);
    }
}
