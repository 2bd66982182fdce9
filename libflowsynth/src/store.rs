use rusqlite::types::{ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

use super::error::StoreError;
use super::table::{Column, ColumnType, Table, Value};

/// The only two operations the pipeline needs from an analytical store.
///
/// A relation is not considered written until `create_or_replace_table` returns Ok.
pub trait TableStore {
    /// Create the named relation from a table, replacing any relation of the same name
    fn create_or_replace_table(&mut self, name: &str, table: &Table) -> Result<(), StoreError>;

    /// Run a query and return its result set
    fn query(&self, sql: &str) -> Result<Table, StoreError>;
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Null => ToSqlOutput::Borrowed(ValueRef::Null),
            Value::Integer(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v)),
            Value::Real(v) => ToSqlOutput::Borrowed(ValueRef::Real(*v)),
            Value::Text(v) => ToSqlOutput::Borrowed(ValueRef::Text(v.as_bytes())),
            Value::Boolean(v) => ToSqlOutput::Borrowed(ValueRef::Integer(*v as i64)),
        })
    }
}

/// Quote an identifier for SQL. Channel names such as `FSC-A` are not bare identifiers.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn check_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() || name.contains('\0') {
        return Err(StoreError::BadTableName(name.to_string()));
    }
    Ok(())
}

/// A TableStore backed by an SQLite database file (or memory)
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database at path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }
}

impl TableStore for SqliteStore {
    fn create_or_replace_table(&mut self, name: &str, table: &Table) -> Result<(), StoreError> {
        check_name(name)?;
        table.validate()?;
        let quoted = quote_identifier(name);
        let column_defs: Vec<String> = table
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_identifier(&c.name), c.kind.sql_name()))
            .collect();
        let column_names: Vec<String> = table
            .columns
            .iter()
            .map(|c| quote_identifier(&c.name))
            .collect();
        let placeholders: Vec<String> = (1..=table.columns.len()).map(|i| format!("?{i}")).collect();

        // Everything happens in one transaction so a failure leaves the old relation intact
        let tx = self.conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {quoted}"), [])?;
        tx.execute(
            &format!("CREATE TABLE {quoted} ({})", column_defs.join(", ")),
            [],
        )?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {quoted} ({}) VALUES ({})",
                column_names.join(", "),
                placeholders.join(", ")
            ))?;
            for row in table.rows.iter() {
                stmt.execute(params_from_iter(row.iter()))?;
            }
        }
        tx.commit()?;
        spdlog::info!("Wrote {} rows to table {}", table.n_rows(), name);
        Ok(())
    }

    fn query(&self, sql: &str) -> Result<Table, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let names: Vec<String> = stmt
            .column_names()
            .into_iter()
            .map(String::from)
            .collect();
        let n_columns = names.len();

        let mut result_rows: Vec<Vec<Value>> = Vec::new();
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(n_columns);
            for idx in 0..n_columns {
                values.push(match row.get_ref(idx)? {
                    ValueRef::Null => Value::Null,
                    ValueRef::Integer(v) => Value::Integer(v),
                    ValueRef::Real(v) => Value::Real(v),
                    ValueRef::Text(v) | ValueRef::Blob(v) => {
                        Value::Text(String::from_utf8_lossy(v).into_owned())
                    }
                });
            }
            result_rows.push(values);
        }

        // SQLite is dynamically typed; report each column as the type of its first value
        let columns = names
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let kind = result_rows
                    .iter()
                    .find_map(|row| match &row[idx] {
                        Value::Null => None,
                        Value::Integer(_) => Some(ColumnType::Integer),
                        Value::Real(_) => Some(ColumnType::Real),
                        Value::Text(_) => Some(ColumnType::Text),
                        Value::Boolean(_) => Some(ColumnType::Boolean),
                    })
                    .unwrap_or(ColumnType::Text);
                Column::new(name, kind)
            })
            .collect();

        Ok(Table {
            columns,
            rows: result_rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> Table {
        let mut table = Table::new(vec![
            Column::new("sample_id", ColumnType::Text),
            Column::new("FSC-A", ColumnType::Real),
            Column::new("id_live", ColumnType::Boolean),
        ]);
        table.rows.push(vec![
            Value::Text(String::from("a")),
            Value::Real(1.5),
            Value::Boolean(true),
        ]);
        table.rows.push(vec![
            Value::Text(String::from("b")),
            Value::Real(2.5),
            Value::Boolean(false),
        ]);
        table
    }

    #[test]
    fn test_round_trip() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .create_or_replace_table("events", &sample_table())
            .unwrap();
        let result = store
            .query("SELECT sample_id, \"FSC-A\", id_live FROM events ORDER BY sample_id")
            .unwrap();
        assert_eq!(result.n_rows(), 2);
        assert_eq!(result.columns[1].name, "FSC-A");
        assert_eq!(result.columns[1].kind, ColumnType::Real);
        assert_eq!(result.rows[0][0], Value::Text(String::from("a")));
        assert_eq!(result.rows[1][1], Value::Real(2.5));
        assert_eq!(result.rows[0][2], Value::Integer(1));
        assert_eq!(result.rows[1][2], Value::Integer(0));
    }

    #[test]
    fn test_replace_existing() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .create_or_replace_table("events", &sample_table())
            .unwrap();
        let mut smaller = sample_table();
        smaller.rows.truncate(1);
        store.create_or_replace_table("events", &smaller).unwrap();
        let result = store.query("SELECT COUNT(*) AS n FROM events").unwrap();
        assert_eq!(result.rows[0][0], Value::Integer(1));
        assert_eq!(result.columns[0].name, "n");
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(
            store.create_or_replace_table(" ", &sample_table()),
            Err(StoreError::BadTableName(_))
        ));
        let mut ragged = sample_table();
        ragged.rows.push(vec![Value::Null]);
        assert!(matches!(
            store.create_or_replace_table("events", &ragged),
            Err(StoreError::BadTable(_))
        ));
        assert!(matches!(
            store.query("SELECT * FROM missing_table"),
            Err(StoreError::SqliteError(_))
        ));
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("FSC-A"), "\"FSC-A\"");
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
