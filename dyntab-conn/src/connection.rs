use std::sync::Arc;

use crate::{Driver, Executed, Result, Row, SqlParamPairs, Value};

#[derive(Clone)]
pub struct Connection {
    driver: Arc<dyn Driver>,
}

impl Connection {
    /// # Open connect
    ///
    /// Sqlite example:
    ///     - `connect("sqlite://memory")`
    ///     - `connect("sqlite:///tmp/db.sqlite")`
    pub async fn connect(url: &str) -> Result<Self> {
        #[cfg(feature = "sqlite")]
        if url.starts_with("sqlite://") {
            return Self::connect_sqlite(url);
        }

        Err(dyntab_error::connection!("Unsupport url `{}`", url))
    }

    /// Wrap a caller supplied driver
    pub fn from_driver(driver: Arc<dyn Driver>) -> Self {
        Self { driver }
    }

    pub async fn execute_many(&self, pairs: SqlParamPairs) -> Result<Vec<Executed>> {
        self.driver.execute_many(pairs).await
    }

    pub async fn execute_one(&self, sql: &str, params: Vec<Value>) -> Result<Executed> {
        let mut list = self
            .driver
            .execute_many(vec![(sql.to_string(), vec![params])])
            .await?;

        Ok(list.pop().unwrap_or_default())
    }

    pub async fn query_many(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>> {
        self.driver.query_many(sql, params).await
    }

    pub async fn query_many_map<T, F>(
        &self,
        sql: &str,
        params: Vec<Value>,
        map: F,
    ) -> Result<Vec<T>>
    where
        F: Fn(Row) -> Result<T>,
    {
        let rows = self.driver.query_many(sql, params).await?;
        let mut res_list = Vec::<T>::new();

        for row in rows {
            res_list.push(map(row)?);
        }

        Ok(res_list)
    }

    #[cfg(feature = "sqlite")]
    fn connect_sqlite(url: &str) -> Result<Self> {
        let path = &url[9..];
        let conn = if path == "memory" {
            rusqlite::Connection::open_in_memory()
                .map_err(|e| dyntab_error::connection!("Sqlite open_in_memory error: {}", e))?
        } else {
            rusqlite::Connection::open(path)
                .map_err(|e| dyntab_error::connection!("Sqlite open `{}` error: {}", path, e))?
        };
        let driver = crate::drivers::sqlite::SqliteConnProxy::new(conn);

        Ok(Self {
            driver: Arc::new(driver),
        })
    }
}
