use crate::error::{DbError, QueryContext};
use crate::types::Fields;

use super::{BoundStatement, WhereClause, check_columns, quote_ident};

/// `UPDATE `table` SET `a` = :a, `b` = :b` plus an optional WHERE clause.
///
/// # Errors
/// `DbError::EmptyInput` when `fields` is empty or the WHERE clause renders empty,
/// `DbError::InvalidIdentifier` for unusable column names, `DbError::Bind` if a
/// predicate placeholder would shadow a SET placeholder.
pub fn build_update(
    table: &str,
    fields: &Fields,
    where_clause: Option<&WhereClause>,
) -> Result<BoundStatement, DbError> {
    if fields.is_empty() {
        return Err(DbError::EmptyInput(format!(
            "update of {table} called with no fields"
        )));
    }
    check_columns(fields)?;

    let assignments = fields
        .keys()
        .map(|key| format!(" {} = :{key}", quote_ident(key)))
        .collect::<Vec<_>>()
        .join(",");
    let mut sql = format!("UPDATE {} SET{}", quote_ident(table), assignments);
    let mut params = fields.clone();

    if let Some(clause) = where_clause {
        let (where_sql, binds) = clause.render()?;
        sql.push_str(" WHERE ");
        sql.push_str(&where_sql);
        if let Some(shadowed) = binds.keys().find(|name| params.contains_key(name)) {
            return Err(DbError::Bind {
                context: QueryContext::new(sql.clone()),
                message: format!("predicate placeholder :{shadowed} collides with a SET column"),
            });
        }
        params.extend(binds);
    }

    Ok(BoundStatement::new(sql, params))
}

/// `DELETE FROM `table` WHERE <clause>`.
///
/// Backticks in `table` are stripped before quoting. A `WhereClause::Raw` is not
/// parameterized; use a `Predicate` to bind values.
///
/// # Errors
/// `DbError::EmptyInput` when the WHERE clause renders empty.
pub fn build_delete(table: &str, where_clause: &WhereClause) -> Result<BoundStatement, DbError> {
    let (where_sql, params) = where_clause.render()?;
    let table = table.replace('`', "");
    Ok(BoundStatement::new(
        format!("DELETE FROM {} WHERE {where_sql}", quote_ident(&table)),
        params,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_builder::Predicate;
    use crate::types::RowValues;

    #[test]
    fn update_without_where() {
        let fields = Fields::new().with("name", "Bob").with("age", 31);
        let stmt = build_update("users", &fields, None).unwrap();
        assert_eq!(stmt.sql, "UPDATE `users` SET `name` = :name, `age` = :age");
        assert_eq!(stmt.placeholder_names(), vec!["name", "age"]);
    }

    #[test]
    fn update_with_raw_where() {
        let fields = Fields::new().with("name", "Bob");
        let stmt = build_update("users", &fields, Some(&"`id` = 3".into())).unwrap();
        assert_eq!(stmt.sql, "UPDATE `users` SET `name` = :name WHERE `id` = 3");
        stmt.validate().unwrap();
    }

    #[test]
    fn update_with_predicate_binds_both_sets() {
        let fields = Fields::new().with("id", 10);
        let clause = WhereClause::from(Predicate::new().eq("id", 3));
        let stmt = build_update("users", &fields, Some(&clause)).unwrap();
        assert_eq!(stmt.sql, "UPDATE `users` SET `id` = :id WHERE `id` = :w0_id");
        assert_eq!(stmt.params.get("id"), Some(&RowValues::Int(10)));
        assert_eq!(stmt.params.get("w0_id"), Some(&RowValues::Int(3)));
        stmt.validate().unwrap();
    }

    #[test]
    fn update_detects_shadowed_predicate_names() {
        let fields = Fields::new().with("w0_id", 1);
        let clause = WhereClause::from(Predicate::new().eq("id", 3));
        assert!(matches!(
            build_update("t", &fields, Some(&clause)),
            Err(DbError::Bind { .. })
        ));
    }

    #[test]
    fn delete_keeps_raw_clause_and_strips_backticks() {
        let stmt = build_delete("`tbl_entries`", &"`id` = 5".into()).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM `tbl_entries` WHERE `id` = 5");
        assert!(stmt.params.is_empty());
    }

    #[test]
    fn delete_with_predicate_is_parameterized() {
        let stmt = build_delete("t", &Predicate::new().eq("id", 5).into()).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM `t` WHERE `id` = :w0_id");
        assert_eq!(stmt.params.get("w0_id"), Some(&RowValues::Int(5)));
    }

    #[test]
    fn delete_requires_a_clause() {
        assert!(matches!(
            build_delete("t", &"".into()),
            Err(DbError::EmptyInput(_))
        ));
    }
}
