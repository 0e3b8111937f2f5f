//! # Filter
//!
//! Filter contains sql `where, order_by, limit`,
//! Use for `select, delete, update`
use crate::{Dialect, Where};

#[derive(Debug, Default)]
pub struct Filter {
    where_cond: Option<Where>,
    order_bys: Vec<(String, bool)>, // (column, is_asc)
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Filter {
    /// Set where condition
    ///
    /// # Examples
    ///
    /// ```
    /// use dyntab_query::{QueryBuilder, Sqlite, and, eq, is_null};
    ///
    /// let sql = QueryBuilder::select("ta")
    ///     .column("a")
    ///     .where_cond(and!(eq!("a", 1), is_null!("b")))
    ///     .build(&Sqlite)
    ///     .unwrap();
    ///
    /// assert_eq!(&sql, "SELECT a FROM ta WHERE ((a = 1) AND (b IS NULL))");
    /// ```
    pub fn where_cond(&mut self, cond: Where) -> &mut Self {
        self.where_cond = Some(cond);
        self
    }

    /// Append order by
    ///
    /// # Examples
    ///
    /// ```
    /// use dyntab_query::{QueryBuilder, Sqlite, and, eq, is_null};
    ///
    /// let sql = QueryBuilder::select("ta")
    ///     .column("a")
    ///     .where_cond(and!(eq!("a", 1), is_null!("b")))
    ///     .order_by("a", true)
    ///     .order_by("b", false)
    ///     .build(&Sqlite)
    ///     .unwrap();
    ///
    /// assert_eq!(&sql, "SELECT a FROM ta WHERE ((a = 1) AND (b IS NULL)) ORDER BY a ASC, b DESC");
    /// ```
    pub fn order_by<S>(&mut self, col: S, is_asc: bool) -> &mut Self
    where
        S: ToString,
    {
        self.order_bys.push((col.to_string(), is_asc));
        self
    }

    /// Set limit and offset, either may be absent
    ///
    /// # Examples
    ///
    /// ```
    /// use dyntab_query::{QueryBuilder, Postgres, Sqlite};
    ///
    /// let mut builder = QueryBuilder::select("ta");
    /// builder.column("a").order_by("a", true).limit(None, Some(20));
    ///
    /// assert_eq!(
    ///     &builder.build(&Sqlite).unwrap(),
    ///     "SELECT a FROM ta ORDER BY a ASC LIMIT -1 OFFSET 20"
    /// );
    /// assert_eq!(
    ///     &builder.build(&Postgres).unwrap(),
    ///     "SELECT a FROM ta ORDER BY a ASC OFFSET 20"
    /// );
    /// ```
    pub fn limit(&mut self, limit: Option<u64>, offset: Option<u64>) -> &mut Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    pub fn build(&self, dialect: &dyn Dialect) -> String {
        let mut parts = Vec::<String>::new();

        // Build where
        if let Some(whe) = &self.where_cond {
            parts.push("WHERE".into());
            parts.push(whe.to_string());
        }

        // Build order by
        if !self.order_bys.is_empty() {
            parts.push("ORDER BY".into());
            parts.push(
                self.order_bys
                    .iter()
                    .map(|(name, is_asc)| format!("{} {}", name, if *is_asc { "ASC" } else { "DESC" }))
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        }

        // Build limit
        if let Some(clause) = dialect.limit_clause(self.limit, self.offset) {
            parts.push(clause);
        }

        parts.join(" ")
    }
}

#[macro_export]
macro_rules! lazy_impl_filer_for_struct {
    ($struct:ident) => {
        impl $struct {
            pub fn where_cond(&mut self, cond: $crate::Where) -> &mut Self {
                self.filter.where_cond(cond);
                self
            }

            pub fn order_by<S>(&mut self, col: S, is_asc: bool) -> &mut Self
            where
                S: ToString,
            {
                self.filter.order_by(col, is_asc);
                self
            }

            pub fn limit(&mut self, limit: Option<u64>, offset: Option<u64>) -> &mut Self {
                self.filter.limit(limit, offset);
                self
            }
        }
    };
}
