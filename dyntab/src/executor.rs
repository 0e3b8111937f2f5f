use crate::{
    conn::Connection,
    error::{Error, Result},
    query::QueryBuilder,
};

/// Runs raw DDL statements against the physical database
#[async_trait::async_trait]
pub trait DdlExecutor: Send + Sync {
    async fn create_table(&self, sql: &str) -> Result<()>;

    async fn alter_table(&self, sql: &str) -> Result<()>;

    /// Run alter statements in order, stopping at the first failure
    async fn alter_table_batch(&self, sqls: &[String]) -> Result<()> {
        for sql in sqls {
            self.alter_table(sql).await?;
        }
        Ok(())
    }

    async fn create_index(&self, sql: &str) -> Result<()>;

    async fn drop_table(&self, name: &str) -> Result<()>;
}

/// [`DdlExecutor`] over a [`Connection`]
#[derive(Clone)]
pub struct ConnDdlExecutor {
    conn: Connection,
}

impl ConnDdlExecutor {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    async fn run(&self, what: &str, sql: &str) -> Result<()> {
        log::debug!("Execute ddl: {}", sql);

        self.conn
            .execute_one(sql, vec![])
            .await
            .map_err(|e| wrap(what, e))?;

        Ok(())
    }
}

fn wrap(what: &str, e: Error) -> Error {
    crate::error::execution!("{} failed: {}", what, e.message())
}

#[async_trait::async_trait]
impl DdlExecutor for ConnDdlExecutor {
    async fn create_table(&self, sql: &str) -> Result<()> {
        self.run("create table", sql).await
    }

    async fn alter_table(&self, sql: &str) -> Result<()> {
        self.run("alter table", sql).await
    }

    /// The whole batch commits or rolls back together
    async fn alter_table_batch(&self, sqls: &[String]) -> Result<()> {
        if sqls.is_empty() {
            return Ok(());
        }

        for sql in sqls {
            log::debug!("Execute ddl: {}", sql);
        }

        let pairs = sqls.iter().map(|sql| (sql.clone(), vec![vec![]])).collect();
        self.conn
            .execute_many(pairs)
            .await
            .map_err(|e| wrap("alter table", e))?;

        Ok(())
    }

    async fn create_index(&self, sql: &str) -> Result<()> {
        self.run("create index", sql).await
    }

    async fn drop_table(&self, name: &str) -> Result<()> {
        let sql = QueryBuilder::drop_table(name).if_exists().build();
        self.run("drop table", &sql).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    async fn executor() -> (Connection, ConnDdlExecutor) {
        let conn = Connection::connect("sqlite://memory").await.unwrap();
        (conn.clone(), ConnDdlExecutor::new(conn))
    }

    #[tokio::test]
    async fn test_create_and_drop() {
        let (conn, ex) = executor().await;

        ex.create_table("CREATE TABLE custom_a (id INTEGER PRIMARY KEY)")
            .await
            .unwrap();

        let err = ex
            .create_table("CREATE TABLE custom_a (id INTEGER PRIMARY KEY)")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Execution(_)));
        assert!(err.is_duplicate());

        ex.drop_table("custom_a").await.unwrap();
        ex.drop_table("custom_a").await.unwrap();

        let rows = conn
            .query_many("SELECT name FROM sqlite_master WHERE name = 'custom_a'", vec![])
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_alter_batch_rolls_back() {
        let (conn, ex) = executor().await;
        ex.create_table("CREATE TABLE custom_b (id INTEGER PRIMARY KEY)")
            .await
            .unwrap();

        let res = ex
            .alter_table_batch(&[
                "ALTER TABLE custom_b ADD COLUMN note TEXT".into(),
                "ALTER TABLE custom_b ADD COLUMN note TEXT".into(),
            ])
            .await;
        assert!(matches!(res, Err(Error::Execution(_))));

        let cols = conn
            .query_many_map("SELECT name FROM pragma_table_info('custom_b')", vec![], |r| {
                r.get::<String>("name")
            })
            .await
            .unwrap();
        assert_eq!(cols, vec!["id".to_string()]);
    }
}
