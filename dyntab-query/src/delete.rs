use dyntab_error::Result;

use crate::{Dialect, Where};

#[derive(Debug, Default)]
pub struct DeleteBuilder {
    table: String,
    where_cond: Option<Where>,
}

impl DeleteBuilder {
    pub fn new<S>(table: S) -> Self
    where
        S: ToString,
    {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    /// Set where condition
    ///
    /// # Examples
    ///
    /// ```
    /// use dyntab_query::{QueryBuilder, Sqlite, and, eq, is_null};
    ///
    /// let sql = QueryBuilder::delete("ta")
    ///     .where_cond(and!(eq!("a", 1), is_null!("b")))
    ///     .build(&Sqlite)
    ///     .unwrap();
    ///
    /// assert_eq!(&sql, "DELETE FROM ta WHERE ((a = 1) AND (b IS NULL))");
    /// ```
    pub fn where_cond(&mut self, cond: Where) -> &mut Self {
        self.where_cond = Some(cond);
        self
    }

    /// Build sql
    pub fn build(&self, dialect: &dyn Dialect) -> Result<String> {
        let mut parts = Vec::<String>::new();

        // Build prefix
        parts.push("DELETE".into());

        // Build table
        parts.push("FROM".into());
        parts.push(self.table.clone());

        // Build where
        if let Some(whe) = &self.where_cond {
            parts.push("WHERE".into());
            parts.push(whe.to_string());
        }

        Ok(dialect.bind_placeholders(&parts.join(" ")))
    }
}
