use dyntab_error::Result;

use crate::{Dialect, Filter, QueryValue};

#[derive(Debug, Default)]
pub struct UpdateBuilder {
    table: String,
    kvs: Vec<(String, String)>,
    filter: Filter,
}

impl UpdateBuilder {
    pub fn new<S>(table: S) -> Self
    where
        S: ToString,
    {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    /// Append kv pair
    ///
    /// # Examples
    ///
    /// ```
    /// use dyntab_query::{QueryBuilder, Sqlite, sql_str};
    ///
    /// let sql = QueryBuilder::update("ta")
    ///     .set("a", 1.into())
    ///     .set("b", sql_str("abc"))
    ///     .build(&Sqlite)
    ///     .unwrap();
    ///
    /// assert_eq!(&sql, "UPDATE ta SET a = 1, b = 'abc'");
    /// ```
    pub fn set<S>(&mut self, col: S, val: QueryValue) -> &mut Self
    where
        S: ToString,
    {
        self.kvs.push((col.to_string(), val.to_string()));
        self
    }

    /// Append kv pair list
    ///
    /// # Examples
    ///
    /// ```
    /// use dyntab_query::{QueryBuilder, Postgres, eq, param};
    ///
    /// let sql = QueryBuilder::update("ta")
    ///     .sets([("a", param()), ("b", param())])
    ///     .where_cond(eq!("id", param()))
    ///     .build(&Postgres)
    ///     .unwrap();
    ///
    /// assert_eq!(&sql, "UPDATE ta SET a = $1, b = $2 WHERE (id = $3)");
    /// ```
    pub fn sets<T, S>(&mut self, kvs: T) -> &mut Self
    where
        T: IntoIterator<Item = (S, QueryValue)>,
        S: ToString,
    {
        self.kvs
            .extend(kvs.into_iter().map(|(k, v)| (k.to_string(), v.to_string())));
        self
    }

    /// Build sql
    pub fn build(&self, dialect: &dyn Dialect) -> Result<String> {
        // Validate builder
        self.validate()?;

        let mut parts = Vec::<String>::new();

        // Build prefix
        parts.push("UPDATE".into());
        parts.push(self.table.clone());

        // Build kvs
        parts.push("SET".into());
        parts.push(
            self.kvs
                .iter()
                .map(|(k, v)| format!("{} = {}", k, v))
                .collect::<Vec<_>>()
                .join(", "),
        );

        // Build filter
        let filter = self.filter.build(dialect);
        if !filter.is_empty() {
            parts.push(filter);
        }

        Ok(dialect.bind_placeholders(&parts.join(" ")))
    }

    /// Validate builder
    fn validate(&self) -> Result<()> {
        if self.kvs.is_empty() {
            return Err(dyntab_error::query_builder!("Update empty columns"));
        }

        Ok(())
    }
}

lazy_impl_filer_for_struct! { UpdateBuilder }
