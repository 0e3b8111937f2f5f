//! # DDL builders
//!
//! Render [`TableInfo`] and friends into dialect specific statements. Names are
//! emitted verbatim, callers validate identifiers first.

use dyntab_error::Result;

use crate::{ColumnInfo, Dialect, IndexInfo, TableInfo};

/// Render one column definition
///
/// `<name> <type> [PRIMARY KEY [AUTOINCREMENT]] [NOT NULL] [UNIQUE] [DEFAULT <literal>] [REFERENCES ...]`
pub fn column_def(dialect: &dyn Dialect, col: &ColumnInfo) -> Result<String> {
    let auto_incr = col.is_primary_key && col.is_auto_increment;

    let mut parts = vec![col.name.clone()];
    parts.push(if auto_incr {
        dialect.auto_increment_type(&col.ty)
    } else {
        dialect.column_type(&col.ty)
    });

    if col.is_primary_key {
        parts.push(dialect.primary_key_clause(auto_incr).into());
    } else {
        if col.is_not_null {
            parts.push("NOT NULL".into());
        }
        if col.is_unique {
            parts.push("UNIQUE".into());
        }
    }

    if let Some(def) = &col.default {
        if !auto_incr {
            parts.push(format!("DEFAULT {}", dialect.default_literal(&col.ty, def)?));
        }
    }

    if let Some(fk) = &col.references {
        parts.push(format!("REFERENCES {}({})", fk.table, fk.column));
        if let Some(action) = &fk.on_delete {
            parts.push(format!("ON DELETE {}", action));
        }
        if let Some(action) = &fk.on_update {
            parts.push(format!("ON UPDATE {}", action));
        }
    }

    Ok(parts.join(" "))
}

#[derive(Debug)]
pub struct CreateTableBuilder<'a> {
    info: &'a TableInfo,
    if_not_exists: bool,
}

impl<'a> CreateTableBuilder<'a> {
    pub fn new(info: &'a TableInfo) -> Self {
        Self {
            info,
            if_not_exists: false,
        }
    }

    pub fn if_not_exists(&mut self) -> &mut Self {
        self.if_not_exists = true;
        self
    }

    /// Build sql
    ///
    /// # Examples
    ///
    /// ```
    /// use dyntab_query::{ColumnInfo, ColumnType, QueryBuilder, Sqlite, TableInfo};
    ///
    /// let info = TableInfo {
    ///     name: "ta".into(),
    ///     columns: vec![
    ///         ColumnInfo::synthetic_id(),
    ///         ColumnInfo::new("name", ColumnType::Str(Some(20))).not_null().default_value("NONAME"),
    ///     ],
    ///     indexes: vec![],
    /// };
    ///
    /// let sql = QueryBuilder::create_table(&info).build(&Sqlite).unwrap();
    ///
    /// assert_eq!(
    ///     &sql,
    ///     "CREATE TABLE ta (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL DEFAULT 'NONAME')"
    /// );
    /// ```
    pub fn build(&self, dialect: &dyn Dialect) -> Result<String> {
        if self.info.columns.is_empty() {
            return Err(dyntab_error::query_builder!(
                "Create table `{}` without columns",
                self.info.name
            ));
        }

        let cols = self
            .info
            .columns
            .iter()
            .map(|col| column_def(dialect, col))
            .collect::<Result<Vec<_>>>()?;

        Ok(format!(
            "CREATE TABLE {if_not_exists}{table_name} ({cols})",
            if_not_exists = if self.if_not_exists {
                "IF NOT EXISTS "
            } else {
                ""
            },
            table_name = self.info.name,
            cols = cols.join(", ")
        ))
    }

    /// Build the table's secondary index statements
    pub fn build_indexes(&self, dialect: &dyn Dialect) -> Result<Vec<String>> {
        self.info
            .indexes
            .iter()
            .map(|idx| CreateIndexBuilder::new(&self.info.name, idx).build(dialect))
            .collect()
    }
}

#[derive(Debug)]
pub struct CreateIndexBuilder<'a> {
    table: &'a str,
    index: &'a IndexInfo,
    if_not_exists: bool,
}

impl<'a> CreateIndexBuilder<'a> {
    pub fn new(table: &'a str, index: &'a IndexInfo) -> Self {
        Self {
            table,
            index,
            if_not_exists: false,
        }
    }

    pub fn if_not_exists(&mut self) -> &mut Self {
        self.if_not_exists = true;
        self
    }

    /// Build sql
    ///
    /// # Examples
    ///
    /// ```
    /// use dyntab_query::{IndexInfo, QueryBuilder, Postgres};
    ///
    /// let idx = IndexInfo {
    ///     name: "ta_email_address".into(),
    ///     columns: vec!["email".into(), "address".into()],
    ///     unique: true,
    /// };
    ///
    /// let sql = QueryBuilder::create_index("ta", &idx).build(&Postgres).unwrap();
    ///
    /// assert_eq!(&sql, "CREATE UNIQUE INDEX ta_email_address ON ta (email, address)");
    /// ```
    pub fn build(&self, _dialect: &dyn Dialect) -> Result<String> {
        if self.index.columns.is_empty() {
            return Err(dyntab_error::query_builder!(
                "Index `{}` without columns",
                self.index.name
            ));
        }

        Ok(format!(
            "CREATE {unique}INDEX {if_not_exists}{index_name} ON {table_name} ({cols})",
            unique = if self.index.unique { "UNIQUE " } else { "" },
            if_not_exists = if self.if_not_exists {
                "IF NOT EXISTS "
            } else {
                ""
            },
            index_name = self.index.name,
            table_name = self.table,
            cols = self.index.columns.join(", ")
        ))
    }
}

#[derive(Debug)]
enum AlterAction {
    AddColumn(ColumnInfo),
    DropColumn(String),
    RenameTo(String),
}

/// One `ALTER TABLE` statement per action, both engines accept that form
#[derive(Debug, Default)]
pub struct AlterTableBuilder {
    table: String,
    actions: Vec<AlterAction>,
}

impl AlterTableBuilder {
    pub fn new<S>(table: S) -> Self
    where
        S: ToString,
    {
        Self {
            table: table.to_string(),
            actions: vec![],
        }
    }

    pub fn add_column(&mut self, col: ColumnInfo) -> &mut Self {
        self.actions.push(AlterAction::AddColumn(col));
        self
    }

    pub fn drop_column<S>(&mut self, name: S) -> &mut Self
    where
        S: ToString,
    {
        self.actions.push(AlterAction::DropColumn(name.to_string()));
        self
    }

    pub fn rename_to<S>(&mut self, name: S) -> &mut Self
    where
        S: ToString,
    {
        self.actions.push(AlterAction::RenameTo(name.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Build sql list
    ///
    /// # Examples
    ///
    /// ```
    /// use dyntab_query::{ColumnInfo, ColumnType, QueryBuilder, Sqlite};
    ///
    /// let sqls = QueryBuilder::alter_table("ta")
    ///     .add_column(ColumnInfo::new("age", ColumnType::Int))
    ///     .drop_column("nickname")
    ///     .build(&Sqlite)
    ///     .unwrap();
    ///
    /// assert_eq!(
    ///     sqls,
    ///     vec![
    ///         "ALTER TABLE ta ADD COLUMN age INTEGER".to_string(),
    ///         "ALTER TABLE ta DROP COLUMN nickname".to_string(),
    ///     ]
    /// );
    /// ```
    pub fn build(&self, dialect: &dyn Dialect) -> Result<Vec<String>> {
        self.actions
            .iter()
            .map(|action| match action {
                AlterAction::AddColumn(col) => Ok(format!(
                    "ALTER TABLE {} ADD COLUMN {}",
                    self.table,
                    column_def(dialect, col)?
                )),
                AlterAction::DropColumn(name) => {
                    Ok(format!("ALTER TABLE {} DROP COLUMN {}", self.table, name))
                }
                AlterAction::RenameTo(name) => {
                    Ok(format!("ALTER TABLE {} RENAME TO {}", self.table, name))
                }
            })
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct DropTableBuilder {
    table: String,
    if_exists: bool,
}

impl DropTableBuilder {
    pub fn new<S>(table: S) -> Self
    where
        S: ToString,
    {
        Self {
            table: table.to_string(),
            if_exists: false,
        }
    }

    pub fn if_exists(&mut self) -> &mut Self {
        self.if_exists = true;
        self
    }

    pub fn build(&self) -> String {
        format!(
            "DROP TABLE {}{}",
            if self.if_exists { "IF EXISTS " } else { "" },
            self.table
        )
    }
}

#[derive(Debug, Default)]
pub struct DropIndexBuilder {
    index: String,
    if_exists: bool,
}

impl DropIndexBuilder {
    pub fn new<S>(index: S) -> Self
    where
        S: ToString,
    {
        Self {
            index: index.to_string(),
            if_exists: false,
        }
    }

    pub fn if_exists(&mut self) -> &mut Self {
        self.if_exists = true;
        self
    }

    /// Build sql
    ///
    /// # Examples
    ///
    /// ```
    /// use dyntab_query::QueryBuilder;
    ///
    /// let sql = QueryBuilder::drop_index("idx_ta_name").if_exists().build();
    ///
    /// assert_eq!(&sql, "DROP INDEX IF EXISTS idx_ta_name");
    /// ```
    pub fn build(&self) -> String {
        format!(
            "DROP INDEX {}{}",
            if self.if_exists { "IF EXISTS " } else { "" },
            self.index
        )
    }
}

#[cfg(test)]
mod test {
    use crate::*;

    fn invoices() -> TableInfo {
        TableInfo {
            name: "custom_invoices".into(),
            columns: vec![
                ColumnInfo::synthetic_id(),
                ColumnInfo::new("amount", ColumnType::Float).not_null(),
                ColumnInfo::new("status", ColumnType::Str(Some(16)))
                    .not_null()
                    .default_value("draft"),
                ColumnInfo::new("paid", ColumnType::Bool).default_value("false"),
                ColumnInfo {
                    references: Some(ForeignKeyInfo {
                        table: "custom_customers".into(),
                        column: "id".into(),
                        on_delete: Some("CASCADE".into()),
                        on_update: None,
                    }),
                    ..ColumnInfo::new("customer_id", ColumnType::BigInt)
                },
                ColumnInfo::new("created_at", ColumnType::Time)
                    .not_null()
                    .default_value("CURRENT_TIMESTAMP"),
            ],
            indexes: vec![IndexInfo {
                name: "idx_custom_invoices_status".into(),
                columns: vec!["status".into()],
                unique: false,
            }],
        }
    }

    #[test]
    fn test_create_table_sqlite() {
        let info = invoices();
        assert_eq!(
            QueryBuilder::create_table(&info).build(&Sqlite).unwrap(),
            "CREATE TABLE custom_invoices (\
             id INTEGER PRIMARY KEY AUTOINCREMENT, \
             amount REAL NOT NULL, \
             status TEXT NOT NULL DEFAULT 'draft', \
             paid INTEGER DEFAULT 0, \
             customer_id INTEGER REFERENCES custom_customers(id) ON DELETE CASCADE, \
             created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP)"
        );
    }

    #[test]
    fn test_create_table_postgres() {
        let info = invoices();
        assert_eq!(
            QueryBuilder::create_table(&info)
                .if_not_exists()
                .build(&Postgres)
                .unwrap(),
            "CREATE TABLE IF NOT EXISTS custom_invoices (\
             id BIGSERIAL PRIMARY KEY, \
             amount DOUBLE PRECISION NOT NULL, \
             status VARCHAR(16) NOT NULL DEFAULT 'draft', \
             paid BOOLEAN DEFAULT FALSE, \
             customer_id BIGINT REFERENCES custom_customers(id) ON DELETE CASCADE, \
             created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP)"
        );
        assert_eq!(
            QueryBuilder::create_table(&info)
                .build_indexes(&Postgres)
                .unwrap(),
            vec!["CREATE INDEX idx_custom_invoices_status ON custom_invoices (status)".to_string()]
        );
    }

    #[test]
    fn test_explicit_primary_key() {
        let col = ColumnInfo::new("code", ColumnType::Uuid).primary_key(false);
        assert_eq!(column_def(&Sqlite, &col).unwrap(), "code TEXT PRIMARY KEY");
        assert_eq!(column_def(&Postgres, &col).unwrap(), "code UUID PRIMARY KEY");

        let col = ColumnInfo::new("no", ColumnType::Int).primary_key(true);
        assert_eq!(column_def(&Postgres, &col).unwrap(), "no SERIAL PRIMARY KEY");
    }

    #[test]
    fn test_bad_default() {
        let col = ColumnInfo::new("n", ColumnType::Int).default_value("abc");
        assert!(column_def(&Sqlite, &col).is_err());
    }

    #[test]
    fn test_rename_table() {
        assert_eq!(
            QueryBuilder::alter_table("custom_a__rebuild")
                .rename_to("custom_a")
                .build(&Sqlite)
                .unwrap(),
            vec!["ALTER TABLE custom_a__rebuild RENAME TO custom_a".to_string()]
        );
    }

    #[test]
    fn test_drop_table() {
        assert_eq!(
            QueryBuilder::drop_table("custom_a").if_exists().build(),
            "DROP TABLE IF EXISTS custom_a"
        );
    }
}
