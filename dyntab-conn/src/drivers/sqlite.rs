//! # Sqlite driver
//!
//! One `rusqlite::Connection` behind a mutex, blocking calls run on the tokio
//! blocking pool.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use dyntab_error::Result;
use tokio::task::spawn_blocking;

use crate::{Driver, Executed, Row, SqlParamPairs, Value};

#[derive(Clone)]
pub struct SqliteConnProxy {
    conn: Arc<Mutex<rusqlite::Connection>>,
}

impl SqliteConnProxy {
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

#[async_trait::async_trait]
impl Driver for SqliteConnProxy {
    async fn execute_many(&self, pairs: SqlParamPairs) -> Result<Vec<Executed>> {
        let proxy = self.clone();
        let results = spawn_blocking(move || {
            let mut conn = proxy
                .conn
                .lock()
                .map_err(|e| dyntab_error::connection!("SqliteConnProxy lock error: {}", e))?;

            log::trace!("Start transaction");
            let tx = conn
                .transaction()
                .map_err(|e| dyntab_error::database!("Start transaction error: {}", e))?;

            let mut results = Vec::<Executed>::new();
            for (sql, params_list) in pairs {
                log::trace!("Prepare execute many `{}`", sql);
                let mut stmt = tx.prepare(&sql).map_err(|e| {
                    dyntab_error::database!("Prepare error: {}, sql: `{}`", e, sql)
                })?;

                for param in params_list {
                    log::trace!("Execute {:?}", param);

                    let rows_affected = stmt
                        .execute(&dyntab_param_to_rusqlite_param(&param)[..])
                        .map_err(|e| {
                            dyntab_error::database!("Execute error: {}, sql: `{}`", e, sql)
                        })?;

                    results.push(Executed {
                        rows_affected: rows_affected as u64,
                        last_insert_id: tx.last_insert_rowid(),
                    });
                }
            }

            // Dropping the transaction without commit rolls it back
            log::trace!("Commit transaction");
            tx.commit()
                .map_err(|e| dyntab_error::database!("Commit error: {}", e))?;

            Result::Ok(results)
        })
        .await
        .map_err(|e| dyntab_error::runtime!("Tokio join error: {}", e))??;

        Ok(results)
    }

    async fn query_many(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>> {
        let sql_string = sql.to_string();
        let proxy = self.clone();
        let rows = spawn_blocking(move || {
            let conn = proxy
                .conn
                .lock()
                .map_err(|e| dyntab_error::connection!("SqliteConnProxy lock error: {}", e))?;

            log::trace!("Prepare query many `{}`", sql_string);
            let mut stmt = conn.prepare(&sql_string).map_err(|e| {
                dyntab_error::database!("Prepare query many error: {}, sql: `{}`", e, sql_string)
            })?;
            let names = stmt
                .column_names()
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>();

            log::trace!("Query many {:?}", params);
            let mut sql_rows = stmt
                .query(&dyntab_param_to_rusqlite_param(&params)[..])
                .map_err(|e| dyntab_error::database!("Query error: {}", e))?;
            let mut rows = Vec::<Row>::new();
            while let Some(row) = sql_rows
                .next()
                .map_err(|e| dyntab_error::database!("Fetch row error: {}", e))?
            {
                let row = rusqlite_row_to_dyntab_row(&names, row)?;
                log::trace!("Append row: {:?}", row);
                rows.push(row);
            }

            Result::Ok(rows)
        })
        .await
        .map_err(|e| dyntab_error::runtime!("Tokio join error: {}", e))??;

        Ok(rows)
    }
}

fn dyntab_param_to_rusqlite_param(params: &[Value]) -> Vec<&'_ dyn rusqlite::ToSql> {
    params.iter().map(|v| v as &dyn rusqlite::ToSql).collect()
}

fn rusqlite_row_to_dyntab_row(names: &[String], src: &rusqlite::Row<'_>) -> Result<Row> {
    use rusqlite::types::ValueRef;

    let mut values = HashMap::new();
    for (i, column_name) in names.iter().enumerate() {
        let v = src
            .get_ref(i)
            .map_err(|e| dyntab_error::database!("Get column `{}` error: {}", column_name, e))?;
        let value = match v {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(v) => Value::I64(v),
            ValueRef::Real(v) => Value::F64(v),
            ValueRef::Text(v) => Value::Str(String::from_utf8_lossy(v).into_owned()),
            ValueRef::Blob(v) => Value::Bytes(v.to_vec()),
        };
        values.insert(column_name.clone(), value);
    }

    Ok(Row {
        columns: names.to_vec(),
        values,
    })
}

impl rusqlite::ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        match &self {
            Value::Null => <Option<u8> as rusqlite::ToSql>::to_sql(&None),
            Value::Bool(v) => <bool as rusqlite::ToSql>::to_sql(v),
            Value::I64(v) => <i64 as rusqlite::ToSql>::to_sql(v),
            Value::F64(v) => <f64 as rusqlite::ToSql>::to_sql(v),
            Value::Str(v) => <String as rusqlite::ToSql>::to_sql(v),
            Value::Bytes(v) => <Vec<u8> as rusqlite::ToSql>::to_sql(v),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{Connection, Value};

    #[tokio::test]
    async fn test_execute_and_query() {
        let conn = Connection::connect("sqlite://memory").await.unwrap();
        conn.execute_one(
            "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, flag INTEGER)",
            vec![],
        )
        .await
        .unwrap();

        let res = conn
            .execute_many(vec![(
                "INSERT INTO t (name, flag) VALUES (?, ?)".into(),
                vec![
                    vec![Value::Str("a".into()), Value::Bool(true)],
                    vec![Value::Str("b".into()), Value::Null],
                ],
            )])
            .await
            .unwrap();
        assert_eq!(res.len(), 2);
        assert_eq!(res[0].last_insert_id, 1);
        assert_eq!(res[1].last_insert_id, 2);

        let rows = conn
            .query_many("SELECT id, name, flag FROM t ORDER BY id", vec![])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].value("flag"), Some(&Value::I64(1)));
        assert_eq!(rows[1].value("flag"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_execute_many_rolls_back() {
        let conn = Connection::connect("sqlite://memory").await.unwrap();
        conn.execute_one("CREATE TABLE t (name TEXT UNIQUE)", vec![])
            .await
            .unwrap();

        let res = conn
            .execute_many(vec![(
                "INSERT INTO t (name) VALUES (?)".into(),
                vec![vec![Value::Str("a".into())], vec![Value::Str("a".into())]],
            )])
            .await;
        assert!(res.is_err());

        let rows = conn.query_many("SELECT name FROM t", vec![]).await.unwrap();
        assert!(rows.is_empty());
    }
}
