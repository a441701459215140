use tracing::warn;

use crate::error::DbError;
use crate::types::Fields;

use super::{BoundStatement, check_columns, column_list, quote_ident};

/// `INSERT INTO `table` ( `a`, `b`) VALUES ( :a, :b)`, optionally followed by an
/// `ON DUPLICATE KEY UPDATE` clause that rebinds the same values under
/// `u_`-prefixed names.
///
/// # Errors
/// `DbError::EmptyInput` when `fields` is empty, `DbError::InvalidIdentifier` when a
/// column name cannot serve as a placeholder name.
pub fn build_insert(
    table: &str,
    fields: &Fields,
    update_on_duplicate: bool,
) -> Result<BoundStatement, DbError> {
    if fields.is_empty() {
        return Err(DbError::EmptyInput(format!(
            "insert into {table} called with no fields"
        )));
    }
    check_columns(fields)?;

    let mut params = fields.clone();
    let values = fields
        .keys()
        .map(|key| format!(" :{key}"))
        .collect::<Vec<_>>()
        .join(",");
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(table),
        column_list(fields),
        values
    );

    if update_on_duplicate {
        let prefix = update_prefix(fields);
        let assignments = fields
            .iter()
            .map(|(key, value)| {
                params.set(format!("{prefix}{key}"), value.clone());
                format!(" {} = :{prefix}{key}", quote_ident(key))
            })
            .collect::<Vec<_>>()
            .join(",");
        sql.push_str(" ON DUPLICATE KEY UPDATE");
        sql.push_str(&assignments);
    }

    Ok(BoundStatement::new(sql, params))
}

/// `u_`, lengthened to `u__`, `u___`... until no rebound name collides with a column.
fn update_prefix(fields: &Fields) -> String {
    let mut prefix = String::from("u_");
    while fields
        .keys()
        .any(|key| fields.contains_key(&format!("{prefix}{key}")))
    {
        prefix.push('_');
    }
    prefix
}

/// One multi-row `INSERT` for rows sharing the first row's column set.
///
/// Each value is bound as `:r{row}_{column}`, so names are unique across rows
/// regardless of the values. Rows whose column set differs from the first row's
/// are skipped.
///
/// # Errors
/// `DbError::EmptyInput` when no usable row remains, `DbError::InvalidIdentifier`
/// when a column name cannot serve as a placeholder name.
pub fn build_bulk_insert(table: &str, rows: &[Fields]) -> Result<BoundStatement, DbError> {
    let Some(first) = rows.first().filter(|row| !row.is_empty()) else {
        return Err(DbError::EmptyInput(format!(
            "bulk insert into {table} called with no rows"
        )));
    };
    check_columns(first)?;

    let mut params = Fields::with_capacity(first.len() * rows.len());
    let mut groups = Vec::with_capacity(rows.len());
    for (row_idx, row) in rows.iter().enumerate() {
        if !row.same_columns(first) {
            warn!(table, row = row_idx, "skipping bulk insert row with mismatched columns");
            continue;
        }
        let placeholders = first
            .keys()
            .map(|key| {
                let name = format!("r{row_idx}_{key}");
                if let Some(value) = row.get(key) {
                    params.set(name.clone(), value.clone());
                }
                format!(" :{name}")
            })
            .collect::<Vec<_>>()
            .join(",");
        groups.push(format!("({placeholders})"));
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES {}",
        quote_ident(table),
        column_list(first),
        groups.join(", ")
    );
    Ok(BoundStatement::new(sql, params))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::types::RowValues;

    fn users() -> Fields {
        Fields::new().with("name", "Alice").with("age", "30")
    }

    #[test]
    fn insert_matches_legacy_shape() {
        let stmt = build_insert("users", &users(), false).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO `users` ( `name`, `age`) VALUES ( :name, :age)"
        );
        assert_eq!(stmt.params, users());
        assert_eq!(stmt.placeholder_names(), vec!["name", "age"]);
        stmt.validate().unwrap();
    }

    #[test]
    fn insert_with_update_on_duplicate_uses_distinct_names() {
        let stmt = build_insert("users", &users(), true).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO `users` ( `name`, `age`) VALUES ( :name, :age) \
             ON DUPLICATE KEY UPDATE `name` = :u_name, `age` = :u_age"
        );
        assert_eq!(stmt.params.get("u_name"), Some(&RowValues::Text("Alice".into())));
        assert_eq!(stmt.params.len(), 4);
        stmt.validate().unwrap();
    }

    #[test]
    fn update_prefix_avoids_column_collisions() {
        let fields = Fields::new().with("name", "a").with("u_name", "b");
        let stmt = build_insert("t", &fields, true).unwrap();
        let names = stmt.placeholder_names();
        let plain: HashSet<&str> = names[..2].iter().copied().collect();
        let rebound: HashSet<&str> = names[2..].iter().copied().collect();
        assert!(plain.is_disjoint(&rebound));
        assert_eq!(rebound, HashSet::from(["u__name", "u__u_name"]));
        stmt.validate().unwrap();
    }

    #[test]
    fn insert_rejects_empty_and_bad_columns() {
        assert!(matches!(
            build_insert("t", &Fields::new(), false),
            Err(DbError::EmptyInput(_))
        ));
        let bad = Fields::new().with("first name", "x");
        assert!(matches!(
            build_insert("t", &bad, false),
            Err(DbError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn bulk_insert_names_are_unique_across_rows() {
        let rows = vec![
            Fields::new().with("a", 1).with("b", "x"),
            Fields::new().with("a", 1).with("b", "x"),
            Fields::new().with("b", "y").with("a", 2),
        ];
        let stmt = build_bulk_insert("t", &rows).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO `t` ( `a`, `b`) VALUES ( :r0_a, :r0_b), ( :r1_a, :r1_b), ( :r2_a, :r2_b)"
        );
        let names = stmt.placeholder_names();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), 6);
        assert_eq!(unique.len(), 6);
        assert_eq!(stmt.params.get("r2_a"), Some(&RowValues::Int(2)));
        stmt.validate().unwrap();
    }

    #[test]
    fn bulk_insert_skips_mismatched_rows_without_dangling_separator() {
        let rows = vec![
            Fields::new().with("a", 1),
            Fields::new().with("z", 9),
            Fields::new().with("a", 3),
        ];
        let stmt = build_bulk_insert("t", &rows).unwrap();
        assert_eq!(stmt.sql, "INSERT INTO `t` ( `a`) VALUES ( :r0_a), ( :r2_a)");
        stmt.validate().unwrap();
    }

    #[test]
    fn large_bulk_insert_binds_every_value() {
        let rows: Vec<Fields> = (0..5_000_i64)
            .map(|n| Fields::new().with("id", n).with("name", format!("user{n}")))
            .collect();
        let stmt = build_bulk_insert("t", &rows).unwrap();
        assert_eq!(stmt.params.len(), 10_000);
        assert_eq!(stmt.params.get("r4999_id"), Some(&RowValues::Int(4999)));

        let bound = crate::translation::bind_named(&stmt.sql, &stmt.params).unwrap();
        assert_eq!(bound.params.len(), 10_000);
        assert_eq!(bound.params[9_999], RowValues::Text("user4999".into()));
    }

    #[test]
    fn bulk_insert_rejects_no_rows() {
        assert!(matches!(
            build_bulk_insert("t", &[]),
            Err(DbError::EmptyInput(_))
        ));
    }
}
