//! # Custom tables service
//!
//! Lifecycle of user defined tables. Every operation validates first, then
//! touches the definition store and the physical database in a fixed order,
//! and finally appends one migration record.

use std::{collections::HashSet, sync::Arc};

use chrono::Utc;

use crate::{
    config::ServiceConfig,
    conn::Connection,
    error::{Error, Result},
    executor::{ConnDdlExecutor, DdlExecutor},
    policy::NamingPolicy,
    query::{Dialect, DialectKind, QueryBuilder, TableInfo},
    repository::DynamicRepository,
    saga::{Compensation, Saga},
    schema::{self, DELETED_AT, PROTECTED_COLUMNS},
    store::{DefinitionStore, SqlDefinitionStore},
    AlterTableRequest, CreateTableRequest, FieldDefinition, FieldType, Migration,
    MigrationStatus, MigrationType, TableDefinition, TableStatus,
};

#[derive(Clone)]
pub struct CustomTablesService {
    conn: Connection,
    dialect: &'static dyn Dialect,
    policy: NamingPolicy,
    store: Arc<dyn DefinitionStore>,
    executor: Arc<dyn DdlExecutor>,
}

impl CustomTablesService {
    pub fn new(
        conn: Connection,
        dialect: &'static dyn Dialect,
        policy: NamingPolicy,
        store: Arc<dyn DefinitionStore>,
        executor: Arc<dyn DdlExecutor>,
    ) -> Self {
        Self {
            conn,
            dialect,
            policy,
            store,
            executor,
        }
    }

    /// Open the database, create the metadata tables and wire the defaults
    pub async fn connect(config: ServiceConfig) -> Result<Self> {
        let kind = config.dialect_kind()?;
        let policy = config.naming_policy()?;
        let conn = Connection::connect(&config.database_url).await?;
        let dialect = kind.dialect();

        let store = SqlDefinitionStore::new(conn.clone(), dialect)
            .with_tables(&config.definitions_table, &config.migrations_table);
        store.init().await?;

        log::info!(
            "Custom tables service ready, dialect: {}, prefix: `{}`",
            kind,
            policy.prefix()
        );

        Ok(Self::new(
            conn.clone(),
            dialect,
            policy,
            Arc::new(store),
            Arc::new(ConnDdlExecutor::new(conn)),
        ))
    }

    pub fn policy(&self) -> &NamingPolicy {
        &self.policy
    }

    pub fn dialect(&self) -> &'static dyn Dialect {
        self.dialect
    }

    /// Name rules plus a collision check against definitions and the catalog
    pub async fn validate_table_name(&self, name: &str) -> Result<()> {
        self.policy.check_table_name(name)?;

        let physical = self.policy.physical_name(name);
        if self.store.get_definition_by_name(&physical).await?.is_some()
            || self.store.table_exists(&physical).await?
        {
            return Err(crate::error::conflict!("table '{}' already exists", physical));
        }

        Ok(())
    }

    pub fn validate_field_type(&self, ty: &str) -> Result<FieldType> {
        ty.parse()
    }

    pub async fn create_table(&self, req: CreateTableRequest) -> Result<TableDefinition> {
        self.validate_table_name(&req.display_name).await?;
        schema::validate_definition(
            &self.policy,
            self.dialect,
            &req.fields,
            &req.indexes,
            &req.options,
        )?;

        let now = Utc::now();
        let mut def = TableDefinition {
            id: 0,
            name: self.policy.physical_name(&req.display_name),
            display_name: req.display_name,
            description: req.description,
            fields: req.fields,
            indexes: req.indexes,
            options: req.options,
            status: TableStatus::Active,
            created_by: req.created_by,
            created_at: now,
            updated_at: now,
        };

        let info = schema::table_info(&def);
        let builder = QueryBuilder::create_table(&info);
        let create_sql = builder.build(self.dialect)?;
        let index_sqls = builder.build_indexes(self.dialect)?;

        def.id = self
            .store
            .create_definition(&def)
            .await
            .map_err(|e| already_exists(e, &def.name))?;

        let mut saga = Saga::new(format!("create {}", def.name));
        saga.push(Compensation::DeleteDefinition {
            id: def.id,
            name: def.name.clone(),
        });

        if let Err(e) = self.executor.create_table(&create_sql).await {
            saga.unwind(self.store.as_ref(), self.executor.as_ref()).await;
            return Err(already_exists(e, &def.name));
        }
        saga.push(Compensation::DropTable {
            name: def.name.clone(),
        });

        for sql in &index_sqls {
            if let Err(e) = self.executor.create_index(sql).await {
                log::warn!("Create index on `{}` failed, table kept: {}", def.name, e);
                saga.commit();
                return Err(e);
            }
        }

        if let Err(e) = self
            .record_migration(
                &def,
                MigrationType::Create,
                None,
                Some(&def),
                &def.created_by,
                MigrationStatus::Completed,
            )
            .await
        {
            saga.unwind(self.store.as_ref(), self.executor.as_ref()).await;
            return Err(e);
        }
        saga.commit();

        log::info!("Created custom table `{}` (id: {})", def.name, def.id);

        Ok(def)
    }

    pub async fn alter_table(
        &self,
        name: &str,
        req: AlterTableRequest,
        executed_by: &str,
    ) -> Result<TableDefinition> {
        let current = self.find_definition(name).await?;
        if !current.is_active() {
            return Err(crate::error::state!(
                "table '{}' is archived and cannot be altered",
                current.name
            ));
        }

        let options = req.options.unwrap_or(current.options);
        schema::validate_definition(
            &self.policy,
            self.dialect,
            &req.fields,
            &req.indexes,
            &options,
        )?;

        if schema::primary_key_name(&req.fields) != schema::primary_key_name(&current.fields) {
            return Err(crate::error::validation!(
                "primary key of table '{}' cannot be changed",
                current.name
            ));
        }

        for f in &req.fields {
            if current.field(&f.name).is_none() && !f.nullable && f.default_value.is_none() {
                return Err(crate::error::validation!(
                    "field '{}' must be nullable or have a default to be added",
                    f.name
                ));
            }
        }

        let physical: HashSet<String> = self
            .store
            .get_table_columns(&current.name)
            .await?
            .into_iter()
            .collect();

        let mut updated = current.clone();
        updated.fields = req.fields;
        updated.indexes = req.indexes;
        updated.options = options;
        if let Some(description) = req.description {
            updated.description = description;
        }
        updated.updated_at = Utc::now();

        let rebuild = self.dialect.kind() == DialectKind::Sqlite
            && current.fields.iter().any(|f| {
                updated.field(&f.name).is_none()
                    && (f.is_unique || f.foreign_key.is_some())
                    && physical.contains(&f.name)
            });

        let (batch, created) = if rebuild {
            (self.rebuild_statements(&updated, &physical)?, vec![])
        } else {
            self.alter_statements(&current, &updated, &physical)?
        };

        self.executor.alter_table_batch(&batch).await?;
        for sql in &created {
            self.executor.create_index(sql).await?;
        }

        self.store.update_definition(&updated).await?;
        self.record_migration(
            &updated,
            MigrationType::Alter,
            Some(&current),
            Some(&updated),
            executed_by,
            MigrationStatus::Completed,
        )
        .await?;

        log::info!(
            "Altered custom table `{}` with {} statements",
            updated.name,
            batch.len()
        );

        Ok(updated)
    }

    /// Archive, or with `permanent` drop the physical table and forget it
    pub async fn drop_table(&self, name: &str, permanent: bool, executed_by: &str) -> Result<()> {
        let def = self.find_definition(name).await?;
        if !permanent && !def.is_active() {
            return Err(crate::error::state!("table '{}' is already archived", def.name));
        }

        let archived = TableDefinition {
            status: TableStatus::Archived,
            updated_at: Utc::now(),
            ..def.clone()
        };

        let migration_id = self
            .record_migration(
                &def,
                MigrationType::Drop,
                Some(&def),
                if permanent { None } else { Some(&archived) },
                executed_by,
                MigrationStatus::Pending,
            )
            .await?;

        let outcome = if permanent {
            self.purge(&def).await
        } else {
            self.store.update_definition(&archived).await
        };

        match &outcome {
            Ok(()) => {
                self.store
                    .update_migration_status(migration_id, MigrationStatus::Completed, None)
                    .await?;
                log::info!(
                    "Dropped custom table `{}` ({})",
                    def.name,
                    if permanent { "permanent" } else { "archived" }
                );
            }
            Err(e) => {
                if let Err(mark) = self
                    .store
                    .update_migration_status(migration_id, MigrationStatus::Failed, Some(e.message()))
                    .await
                {
                    log::warn!(
                        "Mark drop migration {} of `{}` failed: {}",
                        migration_id,
                        def.name,
                        mark
                    );
                }
            }
        }

        outcome
    }

    /// Active definition by prefixed, unprefixed or display name
    pub async fn get_table(&self, name: &str) -> Result<TableDefinition> {
        let def = self.find_definition(name).await?;
        if !def.is_active() {
            return Err(crate::error::not_found!("table '{}' not found", def.name));
        }
        Ok(def)
    }

    pub async fn list_tables(&self) -> Result<Vec<TableDefinition>> {
        self.store.list_active_definitions().await
    }

    pub async fn get_table_schema(&self, name: &str) -> Result<Vec<FieldDefinition>> {
        Ok(self.get_table(name).await?.fields)
    }

    /// History of a table in any status
    pub async fn get_migration_history(&self, name: &str) -> Result<Vec<Migration>> {
        let def = self.find_definition(name).await?;
        self.store.list_migrations_by_table_id(def.id).await
    }

    pub async fn get_repository(&self, name: &str) -> Result<DynamicRepository> {
        let def = self.find_definition(name).await?;
        if !def.is_active() {
            return Err(crate::error::state!("table '{}' is archived", def.name));
        }

        Ok(DynamicRepository::new(self.conn.clone(), self.dialect, def))
    }

    /// In place `ALTER TABLE` statements plus the indexes to create afterwards
    fn alter_statements(
        &self,
        current: &TableDefinition,
        updated: &TableDefinition,
        physical: &HashSet<String>,
    ) -> Result<(Vec<String>, Vec<String>)> {
        let table = current.name.as_str();
        let mut alter = QueryBuilder::alter_table(table);

        for f in &updated.fields {
            if current.field(&f.name).is_some() {
                continue;
            }
            if physical.contains(&f.name) {
                log::warn!("Skip adding column `{}` to `{}`: already present", f.name, table);
                continue;
            }
            alter.add_column(schema::field_column(f));
        }

        for f in &current.fields {
            if updated.field(&f.name).is_some() || PROTECTED_COLUMNS.iter().any(|p| *p == f.name) {
                continue;
            }
            if !physical.contains(&f.name) {
                log::warn!("Skip dropping column `{}` from `{}`: not present", f.name, table);
                continue;
            }
            alter.drop_column(&f.name);
        }

        if updated.options.timestamps && !current.options.timestamps {
            for col in schema::timestamp_columns(false) {
                if physical.contains(&col.name) {
                    log::warn!("Skip adding column `{}` to `{}`: already present", col.name, table);
                    continue;
                }
                alter.add_column(col);
            }
        }

        if updated.options.soft_delete && !current.options.soft_delete {
            if physical.contains(DELETED_AT) {
                log::warn!("Skip adding column `{}` to `{}`: already present", DELETED_AT, table);
            } else {
                alter.add_column(schema::deleted_at_column());
            }
        }

        let old_indexes =
            schema::index_infos(table, &current.fields, &current.indexes, &current.options);
        let new_indexes =
            schema::index_infos(table, &updated.fields, &updated.indexes, &updated.options);

        // Changed indexes are dropped and created again. Drops go first, an
        // indexed column cannot be dropped.
        let mut batch: Vec<String> = old_indexes
            .iter()
            .filter(|old| !new_indexes.contains(old))
            .map(|old| QueryBuilder::drop_index(&old.name).if_exists().build())
            .collect();
        batch.extend(alter.build(self.dialect)?);

        let created = new_indexes
            .iter()
            .filter(|idx| !old_indexes.contains(idx))
            .map(|idx| QueryBuilder::create_index(table, idx).build(self.dialect))
            .collect::<Result<Vec<_>>>()?;

        Ok((batch, created))
    }

    /// SQLite refuses to drop UNIQUE or REFERENCES columns in place. Copy the
    /// surviving columns into a fresh table and swap it in.
    fn rebuild_statements(
        &self,
        def: &TableDefinition,
        physical: &HashSet<String>,
    ) -> Result<Vec<String>> {
        let info = schema::table_info(def);
        let mut staging = TableInfo {
            name: format!("{}__rebuild", def.name),
            indexes: vec![],
            ..info.clone()
        };

        // protected columns survive option changes, as with an in place alter
        let mut leftovers = schema::timestamp_columns(false);
        leftovers.push(schema::deleted_at_column());
        for col in leftovers {
            if physical.contains(&col.name) && !staging.columns.iter().any(|c| c.name == col.name) {
                staging.columns.push(col);
            }
        }

        let kept: Vec<&str> = staging
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|c| physical.contains(*c))
            .collect();

        let mut batch = vec![QueryBuilder::create_table(&staging).build(self.dialect)?];
        batch.push(format!(
            "INSERT INTO {} ({cols}) SELECT {cols} FROM {}",
            staging.name,
            def.name,
            cols = kept.join(", ")
        ));
        batch.push(QueryBuilder::drop_table(&def.name).build());
        batch.extend(
            QueryBuilder::alter_table(&staging.name)
                .rename_to(&def.name)
                .build(self.dialect)?,
        );
        batch.extend(QueryBuilder::create_table(&info).build_indexes(self.dialect)?);

        log::debug!("Rebuild `{}` keeping columns: {}", def.name, kept.join(", "));

        Ok(batch)
    }

    async fn find_definition(&self, name: &str) -> Result<TableDefinition> {
        let physical = self.policy.resolve(name);
        self.store
            .get_definition_by_name(&physical)
            .await?
            .ok_or_else(|| crate::error::not_found!("table '{}' not found", physical))
    }

    async fn purge(&self, def: &TableDefinition) -> Result<()> {
        self.executor.drop_table(&def.name).await?;
        self.store.delete_definition(def.id).await
    }

    async fn record_migration(
        &self,
        def: &TableDefinition,
        migration_type: MigrationType,
        old: Option<&TableDefinition>,
        new: Option<&TableDefinition>,
        executed_by: &str,
        status: MigrationStatus,
    ) -> Result<i64> {
        let version = self.store.get_next_version(def.id).await?;
        let migration = Migration::new(def.id, version, migration_type)
            .schemas(
                old.map(TableDefinition::snapshot).transpose()?,
                new.map(TableDefinition::snapshot).transpose()?,
            )
            .executed_by(executed_by)
            .status(status);

        self.store.create_migration(&migration).await
    }
}

/// A late duplicate from the store or the engine wins over the early check
fn already_exists(e: Error, table: &str) -> Error {
    if e.is_duplicate() {
        crate::error::conflict!("table '{}' already exists", table)
    } else {
        e
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        config::DEFAULT_DATABASE_URL, conn::Connection, error::Error, record, FieldType,
        FieldValue, IndexDefinition, Record, TableOptions,
    };

    async fn service() -> CustomTablesService {
        CustomTablesService::connect(ServiceConfig::default())
            .await
            .unwrap()
    }

    fn request(name: &str) -> CreateTableRequest {
        CreateTableRequest {
            display_name: name.into(),
            fields: vec![
                FieldDefinition::new("title", FieldType::String),
                FieldDefinition::new("score", FieldType::Int).nullable().indexed(),
            ],
            created_by: "tester".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let svc = service().await;

        let def = svc.create_table(request("Reading List")).await.unwrap();
        assert_eq!(def.name, "custom_reading_list");

        for key in ["custom_reading_list", "reading_list", "Reading List"] {
            assert_eq!(svc.get_table(key).await.unwrap().id, def.id);
        }

        assert!(matches!(
            svc.create_table(request("reading list")).await,
            Err(Error::Conflict(_))
        ));
        assert_eq!(svc.list_tables().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_create_refuses_foreign_table() {
        let svc = service().await;

        // physical table without a definition
        svc.conn
            .execute_one("CREATE TABLE custom_ghost (x INTEGER)", vec![])
            .await
            .unwrap();

        assert!(matches!(
            svc.create_table(request("ghost")).await,
            Err(Error::Conflict(_))
        ));
        assert!(svc
            .store
            .get_definition_by_name("custom_ghost")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_drop_archive_then_purge() {
        let svc = service().await;
        svc.create_table(request("notes")).await.unwrap();

        svc.drop_table("notes", false, "tester").await.unwrap();
        assert!(matches!(svc.get_table("notes").await, Err(Error::NotFound(_))));
        assert!(matches!(
            svc.get_repository("notes").await,
            Err(Error::State(_))
        ));
        assert!(matches!(
            svc.drop_table("notes", false, "tester").await,
            Err(Error::State(_))
        ));
        assert!(svc.store.table_exists("custom_notes").await.unwrap());

        let history = svc.get_migration_history("notes").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].migration_type, MigrationType::Drop);
        assert_eq!(history[1].status, MigrationStatus::Completed);

        svc.drop_table("notes", true, "tester").await.unwrap();
        assert!(!svc.store.table_exists("custom_notes").await.unwrap());
        assert!(matches!(
            svc.get_migration_history("notes").await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_alter_drops_indexed_column() {
        let svc = service().await;
        svc.create_table(request("scores")).await.unwrap();

        let updated = svc
            .alter_table(
                "scores",
                AlterTableRequest {
                    description: Some("no more scores".into()),
                    fields: vec![
                        FieldDefinition::new("title", FieldType::String),
                        FieldDefinition::new("rank", FieldType::Int).nullable(),
                    ],
                    indexes: vec![IndexDefinition {
                        name: "by_rank".into(),
                        columns: vec!["rank".into()],
                        unique: false,
                    }],
                    options: Some(TableOptions {
                        timestamps: true,
                        soft_delete: false,
                    }),
                },
                "tester",
            )
            .await
            .unwrap();
        assert_eq!(updated.description, "no more scores");

        let cols = svc.store.get_table_columns("custom_scores").await.unwrap();
        assert_eq!(
            cols,
            vec!["id", "title", "rank", "created_at", "updated_at"]
        );

        let history = svc.get_migration_history("scores").await.unwrap();
        let versions: Vec<_> = history.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1, 2]);
        assert_eq!(history[1].migration_type, MigrationType::Alter);
    }

    #[tokio::test]
    async fn test_alter_rejects_primary_key_change() {
        let svc = service().await;
        svc.create_table(request("keys")).await.unwrap();

        let res = svc
            .alter_table(
                "keys",
                AlterTableRequest {
                    fields: vec![FieldDefinition::new("code", FieldType::Uuid).primary_key(false)],
                    ..Default::default()
                },
                "tester",
            )
            .await;
        assert!(matches!(res, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_alter_rebuilds_for_unique_column() {
        let svc = service().await;
        svc.create_table(CreateTableRequest {
            display_name: "people".into(),
            fields: vec![
                FieldDefinition::new("name", FieldType::String),
                FieldDefinition::new("email", FieldType::String).nullable().unique(),
            ],
            indexes: vec![IndexDefinition {
                name: "by_name".into(),
                columns: vec!["name".into()],
                unique: true,
            }],
            created_by: "tester".into(),
            ..Default::default()
        })
        .await
        .unwrap();

        let repo = svc.get_repository("people").await.unwrap();
        repo.create(record! { "name" => "ann", "email" => "ann@example.com" })
            .await
            .unwrap();
        repo.create(record! { "name" => "bob" }).await.unwrap();

        svc.alter_table(
            "people",
            AlterTableRequest {
                fields: vec![FieldDefinition::new("name", FieldType::String)],
                indexes: vec![IndexDefinition {
                    name: "by_name".into(),
                    columns: vec!["name".into()],
                    unique: true,
                }],
                ..Default::default()
            },
            "tester",
        )
        .await
        .unwrap();

        let cols = svc.store.get_table_columns("custom_people").await.unwrap();
        assert_eq!(cols, vec!["id", "name"]);
        assert!(!svc.store.table_exists("custom_people__rebuild").await.unwrap());

        let repo = svc.get_repository("people").await.unwrap();
        assert_eq!(repo.count(Record::new()).await.unwrap(), 2);
        assert_eq!(
            repo.find_by_id(2).await.unwrap()["name"],
            FieldValue::from("bob")
        );

        // the unique index came back with the new table
        assert!(repo.create(record! { "name" => "ann" }).await.is_err());
        repo.create(record! { "name" => "cid" }).await.unwrap();

        let history = svc.get_migration_history("people").await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].status, MigrationStatus::Completed);
    }

    #[tokio::test]
    async fn test_alter_recreates_changed_index() {
        let svc = service().await;
        let by_title = |unique| IndexDefinition {
            name: "by_title".into(),
            columns: vec!["title".into()],
            unique,
        };

        svc.create_table(CreateTableRequest {
            indexes: vec![by_title(false)],
            ..request("books")
        })
        .await
        .unwrap();

        let repo = svc.get_repository("books").await.unwrap();
        repo.create(record! { "title" => "dune" }).await.unwrap();

        let updated = svc
            .alter_table(
                "books",
                AlterTableRequest {
                    fields: request("books").fields,
                    indexes: vec![by_title(true)],
                    ..Default::default()
                },
                "tester",
            )
            .await
            .unwrap();
        assert!(updated.indexes[0].unique);

        let repo = svc.get_repository("books").await.unwrap();
        assert!(repo.create(record! { "title" => "dune" }).await.is_err());
        repo.create(record! { "title" => "emma" }).await.unwrap();
    }

    #[tokio::test]
    async fn test_alter_rejects_required_field_without_default() {
        let svc = service().await;
        let def = svc.create_table(request("tickets")).await.unwrap();

        let mut fields = def.fields.clone();
        fields.push(FieldDefinition::new("code", FieldType::String));

        match svc
            .alter_table(
                "tickets",
                AlterTableRequest {
                    fields: fields.clone(),
                    ..Default::default()
                },
                "tester",
            )
            .await
        {
            Err(Error::Validation(m)) => {
                assert_eq!(m, "field 'code' must be nullable or have a default to be added")
            }
            other => panic!("expect validation error, got {:?}", other),
        }
        assert_eq!(svc.get_table("tickets").await.unwrap().fields, def.fields);
        assert_eq!(svc.get_migration_history("tickets").await.unwrap().len(), 1);

        // a default makes the same column addable
        fields.pop();
        fields.push(FieldDefinition::new("code", FieldType::String).default_value("none"));
        svc.alter_table(
            "tickets",
            AlterTableRequest {
                fields,
                ..Default::default()
            },
            "tester",
        )
        .await
        .unwrap();
    }

    /// Delegates to the real executor, except for one failing operation
    struct Faulty {
        inner: ConnDdlExecutor,
        fail: &'static str,
    }

    impl Faulty {
        fn check(&self, op: &str) -> Result<()> {
            if self.fail == op {
                return Err(crate::error::execution!("{} failed: disk full", op));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl DdlExecutor for Faulty {
        async fn create_table(&self, sql: &str) -> Result<()> {
            self.check("create_table")?;
            self.inner.create_table(sql).await
        }

        async fn alter_table(&self, sql: &str) -> Result<()> {
            self.check("alter_table")?;
            self.inner.alter_table(sql).await
        }

        async fn create_index(&self, sql: &str) -> Result<()> {
            self.check("create_index")?;
            self.inner.create_index(sql).await
        }

        async fn drop_table(&self, name: &str) -> Result<()> {
            self.check("drop_table")?;
            self.inner.drop_table(name).await
        }
    }

    async fn faulty_service(fail: &'static str) -> CustomTablesService {
        let conn = Connection::connect(DEFAULT_DATABASE_URL).await.unwrap();
        let store = SqlDefinitionStore::new(conn.clone(), &crate::query::Sqlite);
        store.init().await.unwrap();

        let executor = Faulty {
            inner: ConnDdlExecutor::new(conn.clone()),
            fail,
        };

        CustomTablesService::new(
            conn,
            &crate::query::Sqlite,
            NamingPolicy::default(),
            Arc::new(store),
            Arc::new(executor),
        )
    }

    #[tokio::test]
    async fn test_create_failure_removes_definition() {
        let svc = faulty_service("create_table").await;

        assert!(matches!(
            svc.create_table(request("orders")).await,
            Err(Error::Execution(_))
        ));
        assert!(svc
            .store
            .get_definition_by_name("custom_orders")
            .await
            .unwrap()
            .is_none());
        assert!(!svc.store.table_exists("custom_orders").await.unwrap());

        // the name is free again
        svc.validate_table_name("orders").await.unwrap();
    }

    #[tokio::test]
    async fn test_index_failure_keeps_table() {
        let svc = faulty_service("create_index").await;

        assert!(matches!(
            svc.create_table(request("orders")).await,
            Err(Error::Execution(_))
        ));

        let def = svc
            .store
            .get_definition_by_name("custom_orders")
            .await
            .unwrap()
            .unwrap();
        assert!(def.is_active());
        assert!(svc.store.table_exists("custom_orders").await.unwrap());
        assert!(svc.get_migration_history("orders").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drop_failure_marks_migration() {
        let svc = faulty_service("drop_table").await;
        svc.create_table(request("orders")).await.unwrap();

        match svc.drop_table("orders", true, "tester").await {
            Err(Error::Execution(m)) => assert_eq!(m, "drop_table failed: disk full"),
            other => panic!("expect execution error, got {:?}", other),
        }

        let history = svc.get_migration_history("orders").await.unwrap();
        assert_eq!(history.len(), 2);
        let failed = &history[1];
        assert_eq!(failed.migration_type, MigrationType::Drop);
        assert_eq!(failed.status, MigrationStatus::Failed);
        assert_eq!(
            failed.error_message.as_deref(),
            Some("drop_table failed: disk full")
        );

        assert!(svc.get_table("orders").await.unwrap().is_active());
        assert!(svc.store.table_exists("custom_orders").await.unwrap());
    }
}
