use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{Connection, ToSql, params_from_iter};

use super::{Row, StorageReader};
use crate::error::Result;
use crate::sql::SelectQuery;
use crate::value::Value;

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Owned(rusqlite::types::Value::Null),
            Value::Integer(i) => ToSqlOutput::Owned(rusqlite::types::Value::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Owned(rusqlite::types::Value::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl FromSql for Value {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        Ok(Value::from(value))
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(text) => Value::Text(String::from_utf8_lossy(text).into()),
            ValueRef::Blob(blob) => Value::Blob(blob.to_vec()),
        }
    }
}

impl StorageReader for Connection {
    fn execute_select(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        crate::joinery_profile_scope!("storage", "rusqlite");

        let (sql, params) = query.build();

        let mut stmt = self.prepare(&sql)?;
        let width = stmt.column_count();
        let rows = stmt.query_map(params_from_iter(params.iter()), |row| {
            (0..width)
                .map(|i| row.get_ref(i).map(Value::from))
                .collect::<rusqlite::Result<Vec<_>>>()
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(Row::new(row?));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;
    use crate::sql::{ColumnRef, Condition};

    #[test]
    fn reads_rows_in_select_order() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, avatar BLOB);
             INSERT INTO people VALUES (1, 'Ann', NULL), (2, 'Bo', x'0102');",
        )
        .unwrap();

        let mut query = SelectQuery::new(Dialect::SQLite, "people");
        query.select(ColumnRef::new("people", "name"));
        query.select(ColumnRef::new("people", "avatar"));
        query.and_where(Condition::In(ColumnRef::new("people", "id"), vec![2.into()]));

        let rows = conn.execute_select(&query).unwrap();
        assert_eq!(
            rows,
            vec![Row::new(vec![Value::from("Bo"), Value::Blob(vec![1, 2])])]
        );
    }

    #[test]
    fn sql_errors_surface() {
        let conn = Connection::open_in_memory().unwrap();
        let query = SelectQuery::new(Dialect::SQLite, "missing");
        assert!(matches!(
            conn.execute_select(&query),
            Err(crate::error::PlanError::Rusqlite(_))
        ));
    }
}
