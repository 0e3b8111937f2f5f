use dyntab_error::Result;

use crate::{Dialect, Filter};

#[derive(Debug, Default)]
pub struct SelectBuilder {
    table: String,
    columns: Vec<String>,
    filter: Filter,
}

impl SelectBuilder {
    pub fn new<S>(table: S) -> Self
    where
        S: ToString,
    {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    /// Append column
    ///
    /// # Examples
    ///
    /// ```
    /// use dyntab_query::{QueryBuilder, Sqlite};
    ///
    /// let a = QueryBuilder::select("ta")
    ///     .column("a")
    ///     .column("b")
    ///     .build(&Sqlite)
    ///     .unwrap();
    ///
    /// assert_eq!(&a, "SELECT a, b FROM ta");
    /// ```
    pub fn column<S>(&mut self, col: S) -> &mut Self
    where
        S: ToString,
    {
        self.columns.push(col.to_string());
        self
    }

    /// Set columns
    ///
    /// # Examples
    ///
    /// ```
    /// use dyntab_query::{QueryBuilder, Postgres, eq, param};
    ///
    /// let a = QueryBuilder::select("ta")
    ///     .columns(["a", "b"])
    ///     .where_cond(eq!("a", param()))
    ///     .build(&Postgres)
    ///     .unwrap();
    ///
    /// assert_eq!(&a, "SELECT a, b FROM ta WHERE (a = $1)");
    /// ```
    pub fn columns<T, S>(&mut self, cols: T) -> &mut Self
    where
        T: IntoIterator<Item = S>,
        S: ToString,
    {
        self.columns = cols.into_iter().map(|s| s.to_string()).collect();
        self
    }

    /// Build sql
    pub fn build(&self, dialect: &dyn Dialect) -> Result<String> {
        // Validate builder
        self.validate()?;

        let mut parts = Vec::<String>::new();

        // Build prefix
        parts.push("SELECT".into());

        // Build columns
        parts.push(self.columns.join(", "));

        // Build table
        parts.push("FROM".into());
        parts.push(self.table.clone());

        // Build filter
        let filter = self.filter.build(dialect);
        if !filter.is_empty() {
            parts.push(filter);
        }

        Ok(dialect.bind_placeholders(&parts.join(" ")))
    }

    /// Validate builder
    fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(dyntab_error::query_builder!("Select empty columns"));
        }

        Ok(())
    }
}

lazy_impl_filer_for_struct! { SelectBuilder }
