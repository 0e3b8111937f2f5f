//! # Definition store
//!
//! Persistence of table definitions and their migration history. The
//! default implementation keeps both in two metadata tables of the same
//! database the custom tables live in.

use serde::{Deserialize, Serialize};

use crate::{
    conn::{Connection, Row, ToValue, Value},
    error::Result,
    query::{
        eq, param, ColumnInfo, ColumnType, Dialect, IndexInfo, QueryBuilder, TableInfo,
    },
    value::{format_time, parse_time},
    FieldDefinition, IndexDefinition, Migration, MigrationStatus, TableDefinition,
    TableOptions,
};

pub const DEFINITIONS_TABLE: &str = "_custom_table_definitions";
pub const MIGRATIONS_TABLE: &str = "_custom_table_migrations";

#[async_trait::async_trait]
pub trait DefinitionStore: Send + Sync {
    /// Persist a new definition, returns the assigned id
    async fn create_definition(&self, def: &TableDefinition) -> Result<i64>;

    /// Lookup by physical name, any status
    async fn get_definition_by_name(&self, name: &str) -> Result<Option<TableDefinition>>;

    /// Active definitions ordered by name
    async fn list_active_definitions(&self) -> Result<Vec<TableDefinition>>;

    async fn update_definition(&self, def: &TableDefinition) -> Result<()>;

    async fn delete_definition(&self, id: i64) -> Result<()>;

    async fn create_migration(&self, migration: &Migration) -> Result<i64>;

    async fn update_migration_status(
        &self,
        id: i64,
        status: MigrationStatus,
        error_message: Option<&str>,
    ) -> Result<()>;

    /// One past the highest recorded version, 1 for a fresh table
    async fn get_next_version(&self, table_id: i64) -> Result<i64>;

    /// Ordered by version
    async fn list_migrations_by_table_id(&self, table_id: i64) -> Result<Vec<Migration>>;

    /// Physical column names in table order
    async fn get_table_columns(&self, table: &str) -> Result<Vec<String>>;

    async fn table_exists(&self, table: &str) -> Result<bool>;
}

/// The part of a definition stored as one json document
#[derive(Debug, Serialize, Deserialize)]
struct StoredSchema {
    fields: Vec<FieldDefinition>,
    #[serde(default)]
    indexes: Vec<IndexDefinition>,
    #[serde(default)]
    options: TableOptions,
}

const DEFINITION_COLUMNS: [&str; 9] = [
    "id",
    "name",
    "display_name",
    "description",
    "schema",
    "status",
    "created_by",
    "created_at",
    "updated_at",
];

const MIGRATION_COLUMNS: [&str; 10] = [
    "id",
    "table_id",
    "version",
    "migration_type",
    "old_schema",
    "new_schema",
    "executed_by",
    "executed_at",
    "status",
    "error_message",
];

#[derive(Clone)]
pub struct SqlDefinitionStore {
    conn: Connection,
    dialect: &'static dyn Dialect,
    definitions_table: String,
    migrations_table: String,
}

impl SqlDefinitionStore {
    pub fn new(conn: Connection, dialect: &'static dyn Dialect) -> Self {
        Self {
            conn,
            dialect,
            definitions_table: DEFINITIONS_TABLE.into(),
            migrations_table: MIGRATIONS_TABLE.into(),
        }
    }

    pub fn with_tables<S: ToString>(mut self, definitions: S, migrations: S) -> Self {
        self.definitions_table = definitions.to_string();
        self.migrations_table = migrations.to_string();
        self
    }

    fn definitions_info(&self) -> TableInfo {
        TableInfo {
            name: self.definitions_table.clone(),
            columns: vec![
                ColumnInfo::synthetic_id(),
                ColumnInfo::new("name", ColumnType::Str(Some(64)))
                    .not_null()
                    .unique(),
                ColumnInfo::new("display_name", ColumnType::Str(Some(255))).not_null(),
                ColumnInfo::new("description", ColumnType::Text),
                ColumnInfo::new("schema", ColumnType::Text).not_null(),
                ColumnInfo::new("status", ColumnType::Str(Some(16))).not_null(),
                ColumnInfo::new("created_by", ColumnType::Str(Some(255))),
                ColumnInfo::new("created_at", ColumnType::Str(Some(40))).not_null(),
                ColumnInfo::new("updated_at", ColumnType::Str(Some(40))).not_null(),
            ],
            indexes: vec![IndexInfo {
                name: format!("idx_{}_status", self.definitions_table),
                columns: vec!["status".into()],
                unique: false,
            }],
        }
    }

    fn migrations_info(&self) -> TableInfo {
        TableInfo {
            name: self.migrations_table.clone(),
            columns: vec![
                ColumnInfo::synthetic_id(),
                ColumnInfo::new("table_id", ColumnType::BigInt).not_null(),
                ColumnInfo::new("version", ColumnType::BigInt).not_null(),
                ColumnInfo::new("migration_type", ColumnType::Str(Some(16))).not_null(),
                ColumnInfo::new("old_schema", ColumnType::Text),
                ColumnInfo::new("new_schema", ColumnType::Text),
                ColumnInfo::new("executed_by", ColumnType::Str(Some(255))),
                ColumnInfo::new("executed_at", ColumnType::Str(Some(40))).not_null(),
                ColumnInfo::new("status", ColumnType::Str(Some(16))).not_null(),
                ColumnInfo::new("error_message", ColumnType::Text),
            ],
            indexes: vec![IndexInfo {
                name: format!("idx_{}_table_version", self.migrations_table),
                columns: vec!["table_id".into(), "version".into()],
                unique: true,
            }],
        }
    }

    /// Create the metadata tables when missing
    pub async fn init(&self) -> Result<()> {
        let mut pairs = vec![];

        for info in [self.definitions_info(), self.migrations_info()] {
            let mut builder = QueryBuilder::create_table(&info);
            builder.if_not_exists();
            pairs.push((builder.build(self.dialect)?, vec![vec![]]));

            for idx in &info.indexes {
                let sql = QueryBuilder::create_index(&info.name, idx)
                    .if_not_exists()
                    .build(self.dialect)?;
                pairs.push((sql, vec![vec![]]));
            }
        }

        self.conn.execute_many(pairs).await?;

        Ok(())
    }

    fn definition_from_row(row: Row) -> Result<TableDefinition> {
        let schema: String = row.get("schema")?;
        let schema: StoredSchema = serde_json::from_str(&schema)
            .map_err(|e| crate::error::serialization!("Decode stored schema error: {}", e))?;
        let status: String = row.get("status")?;

        Ok(TableDefinition {
            id: row.get("id")?,
            name: row.get("name")?,
            display_name: row.get("display_name")?,
            description: row.get::<Option<String>>("description")?.unwrap_or_default(),
            fields: schema.fields,
            indexes: schema.indexes,
            options: schema.options,
            status: status.parse()?,
            created_by: row.get::<Option<String>>("created_by")?.unwrap_or_default(),
            created_at: time_column(&row, "created_at")?,
            updated_at: time_column(&row, "updated_at")?,
        })
    }

    fn migration_from_row(row: Row) -> Result<Migration> {
        let migration_type: String = row.get("migration_type")?;
        let status: String = row.get("status")?;

        Ok(Migration {
            id: row.get("id")?,
            table_id: row.get("table_id")?,
            version: row.get("version")?,
            migration_type: migration_type.parse()?,
            old_schema: row.get("old_schema")?,
            new_schema: row.get("new_schema")?,
            executed_by: row.get::<Option<String>>("executed_by")?.unwrap_or_default(),
            executed_at: time_column(&row, "executed_at")?,
            status: status.parse()?,
            error_message: row.get("error_message")?,
        })
    }

    fn schema_json(def: &TableDefinition) -> Result<String> {
        let schema = StoredSchema {
            fields: def.fields.clone(),
            indexes: def.indexes.clone(),
            options: def.options,
        };

        serde_json::to_string(&schema)
            .map_err(|e| crate::error::serialization!("Encode stored schema error: {}", e))
    }

    async fn select_definitions(
        &self,
        where_cond: crate::query::Where,
        params: Vec<Value>,
    ) -> Result<Vec<TableDefinition>> {
        let sql = QueryBuilder::select(&self.definitions_table)
            .columns(DEFINITION_COLUMNS)
            .where_cond(where_cond)
            .order_by("name", true)
            .build(self.dialect)?;

        self.conn
            .query_many_map(&sql, params, Self::definition_from_row)
            .await
    }
}

fn time_column(row: &Row, name: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    let s: String = row.get(name)?;
    parse_time(&s).ok_or_else(|| {
        crate::error::from_value!("Invalid timestamp `{}` in column `{}`", s, name)
    })
}

/// Unique violations on metadata rows surface as conflicts
fn map_duplicate(e: crate::error::Error, what: &str) -> crate::error::Error {
    if e.is_duplicate() {
        crate::error::conflict!("{} already exists", what)
    } else {
        e
    }
}

#[async_trait::async_trait]
impl DefinitionStore for SqlDefinitionStore {
    async fn create_definition(&self, def: &TableDefinition) -> Result<i64> {
        let cols = &DEFINITION_COLUMNS[1..];
        let sql = QueryBuilder::insert(&self.definitions_table)
            .columns(cols)
            .values(cols.iter().map(|_| param()))
            .build(self.dialect)?;

        let params = vec![
            def.name.to_value(),
            def.display_name.to_value(),
            def.description.to_value(),
            Self::schema_json(def)?.to_value(),
            def.status.as_str().to_value(),
            def.created_by.to_value(),
            format_time(&def.created_at).to_value(),
            format_time(&def.updated_at).to_value(),
        ];

        let executed = self
            .conn
            .execute_one(&sql, params)
            .await
            .map_err(|e| map_duplicate(e, &format!("table '{}'", def.name)))?;

        Ok(executed.last_insert_id)
    }

    async fn get_definition_by_name(&self, name: &str) -> Result<Option<TableDefinition>> {
        let mut list = self
            .select_definitions(eq!("name", param()), vec![name.to_string().to_value()])
            .await?;

        Ok(list.pop())
    }

    async fn list_active_definitions(&self) -> Result<Vec<TableDefinition>> {
        self.select_definitions(
            eq!("status", param()),
            vec!["active".to_value()],
        )
        .await
    }

    async fn update_definition(&self, def: &TableDefinition) -> Result<()> {
        let sql = QueryBuilder::update(&self.definitions_table)
            .sets([
                ("display_name", param()),
                ("description", param()),
                ("schema", param()),
                ("status", param()),
                ("updated_at", param()),
            ])
            .where_cond(eq!("id", param()))
            .build(self.dialect)?;

        let params = vec![
            def.display_name.to_value(),
            def.description.to_value(),
            Self::schema_json(def)?.to_value(),
            def.status.as_str().to_value(),
            format_time(&def.updated_at).to_value(),
            def.id.to_value(),
        ];

        let executed = self.conn.execute_one(&sql, params).await?;
        if executed.rows_affected == 0 {
            return Err(crate::error::not_found!(
                "table definition {} not found",
                def.id
            ));
        }

        Ok(())
    }

    async fn delete_definition(&self, id: i64) -> Result<()> {
        let sql = QueryBuilder::delete(&self.definitions_table)
            .where_cond(eq!("id", param()))
            .build(self.dialect)?;

        self.conn.execute_one(&sql, vec![id.to_value()]).await?;

        Ok(())
    }

    async fn create_migration(&self, migration: &Migration) -> Result<i64> {
        let cols = &MIGRATION_COLUMNS[1..];
        let sql = QueryBuilder::insert(&self.migrations_table)
            .columns(cols)
            .values(cols.iter().map(|_| param()))
            .build(self.dialect)?;

        let params = vec![
            migration.table_id.to_value(),
            migration.version.to_value(),
            migration.migration_type.as_str().to_value(),
            migration.old_schema.to_value(),
            migration.new_schema.to_value(),
            migration.executed_by.to_value(),
            format_time(&migration.executed_at).to_value(),
            migration.status.as_str().to_value(),
            migration.error_message.to_value(),
        ];

        let executed = self.conn.execute_one(&sql, params).await.map_err(|e| {
            map_duplicate(
                e,
                &format!(
                    "migration version {} of table {}",
                    migration.version, migration.table_id
                ),
            )
        })?;

        Ok(executed.last_insert_id)
    }

    async fn update_migration_status(
        &self,
        id: i64,
        status: MigrationStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let sql = QueryBuilder::update(&self.migrations_table)
            .sets([("status", param()), ("error_message", param())])
            .where_cond(eq!("id", param()))
            .build(self.dialect)?;

        let params = vec![
            status.as_str().to_value(),
            error_message.map(|s| s.to_string()).to_value(),
            id.to_value(),
        ];

        let executed = self.conn.execute_one(&sql, params).await?;
        if executed.rows_affected == 0 {
            return Err(crate::error::not_found!("migration {} not found", id));
        }

        Ok(())
    }

    async fn get_next_version(&self, table_id: i64) -> Result<i64> {
        let sql = QueryBuilder::select(&self.migrations_table)
            .column("MAX(version) AS version")
            .where_cond(eq!("table_id", param()))
            .build(self.dialect)?;

        let versions = self
            .conn
            .query_many_map(&sql, vec![table_id.to_value()], |row| {
                row.get::<Option<i64>>("version")
            })
            .await?;

        Ok(versions.into_iter().flatten().max().unwrap_or(0) + 1)
    }

    async fn list_migrations_by_table_id(&self, table_id: i64) -> Result<Vec<Migration>> {
        let sql = QueryBuilder::select(&self.migrations_table)
            .columns(MIGRATION_COLUMNS)
            .where_cond(eq!("table_id", param()))
            .order_by("version", true)
            .build(self.dialect)?;

        self.conn
            .query_many_map(&sql, vec![table_id.to_value()], Self::migration_from_row)
            .await
    }

    async fn get_table_columns(&self, table: &str) -> Result<Vec<String>> {
        let sql = self.dialect.bind_placeholders(self.dialect.table_columns_query());

        self.conn
            .query_many_map(&sql, vec![table.to_string().to_value()], |row| {
                row.get::<String>("name")
            })
            .await
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        let sql = self.dialect.bind_placeholders(self.dialect.table_exists_query());
        let rows = self
            .conn
            .query_many(&sql, vec![table.to_string().to_value()])
            .await?;

        Ok(!rows.is_empty())
    }
}
