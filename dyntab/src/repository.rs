//! # Dynamic repository
//!
//! CRUD over one custom table, driven by its runtime definition. Every write
//! is checked by the field validator before any SQL is built, values are
//! always bound as parameters.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    conn::{Connection, Row, SqlParamPairs, ToValue, Value},
    error::Result,
    query::{and, eq, is_null, param, Dialect, QueryBuilder, Where},
    schema::{
        explicit_primary_key, implicit_columns, primary_key_name, CREATED_AT, DELETED_AT,
        ID_COLUMN, UPDATED_AT,
    },
    validator::validate_field_value,
    FieldDefinition, FieldType, FieldValue, Record, TableDefinition,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Create,
    Update,
}

#[derive(Clone)]
pub struct DynamicRepository {
    conn: Connection,
    dialect: &'static dyn Dialect,
    definition: Arc<TableDefinition>,
}

impl DynamicRepository {
    pub fn new(conn: Connection, dialect: &'static dyn Dialect, definition: TableDefinition) -> Self {
        Self {
            conn,
            dialect,
            definition: Arc::new(definition),
        }
    }

    pub fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    pub fn table_name(&self) -> &str {
        &self.definition.name
    }

    pub fn primary_key(&self) -> &str {
        primary_key_name(&self.definition.fields)
    }

    fn soft_delete(&self) -> bool {
        self.definition.options.soft_delete
    }

    /// Generated keys come back from the driver
    fn has_generated_key(&self) -> bool {
        explicit_primary_key(&self.definition.fields)
            .map(|f| f.auto_increment)
            .unwrap_or(true)
    }

    fn is_known_column(&self, name: &str) -> bool {
        self.definition.field(name).is_some()
            || implicit_columns(&self.definition.fields, &self.definition.options)
                .iter()
                .any(|c| *c == name)
    }

    /// Declared type used to decode a column, `None` for foreign columns
    fn column_type(&self, name: &str) -> Option<FieldType> {
        if let Some(f) = self.definition.field(name) {
            return Some(f.field_type);
        }

        match name {
            ID_COLUMN => Some(FieldType::BigInt),
            CREATED_AT | UPDATED_AT | DELETED_AT => Some(FieldType::Time),
            _ => None,
        }
    }

    fn check_write(&self, data: Record, mode: WriteMode) -> Result<Record> {
        let implicit = implicit_columns(&self.definition.fields, &self.definition.options);
        let mut out = Record::new();

        for (key, value) in data {
            if let Some(field) = self.definition.field(&key) {
                if mode == WriteMode::Update && field.is_primary_key {
                    continue;
                }
                validate_field_value(field, &value)?;

                // NOT NULL columns with a default take it on insert, never a bound null
                if value.is_null() && !field.nullable {
                    if mode == WriteMode::Create {
                        continue;
                    }
                    return Err(crate::error::validation!(
                        "field '{}' cannot be set to null",
                        field.name
                    ));
                }
            } else if implicit.iter().any(|c| *c == key) {
                if mode == WriteMode::Update && (key == ID_COLUMN || key == CREATED_AT) {
                    continue;
                }
                let field = if key == ID_COLUMN {
                    FieldDefinition::new(ID_COLUMN, FieldType::BigInt)
                } else {
                    FieldDefinition::new(&key, FieldType::Time).nullable()
                };
                validate_field_value(&field, &value)?;
            } else {
                return Err(crate::error::validation!(
                    "unknown field '{}' for table '{}'",
                    key,
                    self.table_name()
                ));
            }

            out.insert(key, value);
        }

        if mode == WriteMode::Create {
            let generated = self.has_generated_key();
            for f in &self.definition.fields {
                let optional = f.nullable
                    || f.default_value.is_some()
                    || (f.is_primary_key && generated);
                if !optional && !out.contains_key(&f.name) {
                    return Err(crate::error::validation!("field '{}' is required", f.name));
                }
            }
        }

        Ok(out)
    }

    fn stamp(&self, record: &mut Record, mode: WriteMode) {
        if !self.definition.options.timestamps {
            return;
        }

        let now = FieldValue::Time(Utc::now());
        if mode == WriteMode::Create {
            record.insert(CREATED_AT.into(), now.clone());
        }
        record.insert(UPDATED_AT.into(), now);
    }

    fn fill_key(&self, record: &mut Record, last_insert_id: i64) {
        let pk = self.primary_key();
        if self.has_generated_key() && !record.contains_key(pk) {
            record.insert(pk.to_string(), FieldValue::Int(last_insert_id));
        }
    }

    fn insert_sql(&self, record: &Record) -> Result<String> {
        QueryBuilder::insert(self.table_name())
            .columns(record.keys())
            .values(record.keys().map(|_| param()))
            .build(self.dialect)
    }

    /// Equality per condition, `IS NULL` for null values, live rows only
    fn predicate(&self, conditions: &Record) -> Result<(Option<Where>, Vec<Value>)> {
        let mut conds = vec![];
        let mut params = vec![];

        for (key, value) in conditions {
            if !self.is_known_column(key) {
                return Err(crate::error::validation!(
                    "unknown column '{}' for table '{}'",
                    key,
                    self.table_name()
                ));
            }

            if value.is_null() {
                conds.push(is_null!(key.as_str()));
            } else {
                conds.push(eq!(key.as_str(), param()));
                params.push(value.to_value());
            }
        }

        if self.soft_delete() {
            conds.push(is_null!(DELETED_AT));
        }

        Ok((Where::all(conds), params))
    }

    /// Match one row by primary key, skipping soft deleted rows
    fn key_predicate(&self) -> Where {
        if self.soft_delete() {
            and!(eq!(self.primary_key(), param()), is_null!(DELETED_AT))
        } else {
            eq!(self.primary_key(), param())
        }
    }

    fn decode_row(&self, row: Row) -> Result<Record> {
        row.into_pairs()
            .into_iter()
            .map(|(name, value)| {
                let v = FieldValue::decode(self.column_type(&name), value)?;
                Ok((name, v))
            })
            .collect()
    }

    /// Insert one row, returns it with the generated key and timestamps
    pub async fn create(&self, data: Record) -> Result<Record> {
        let mut record = self.check_write(data, WriteMode::Create)?;
        self.stamp(&mut record, WriteMode::Create);

        let sql = self.insert_sql(&record)?;
        let params = record.values().map(|v| v.to_value()).collect();
        let executed = self.conn.execute_one(&sql, params).await?;

        self.fill_key(&mut record, executed.last_insert_id);

        Ok(record)
    }

    pub async fn find_by_id<V: Into<FieldValue>>(&self, id: V) -> Result<Record> {
        let id = id.into();
        let mut conditions = Record::new();
        conditions.insert(self.primary_key().to_string(), id.clone());

        self.find(conditions, Some(1), None)
            .await?
            .pop()
            .ok_or_else(|| {
                crate::error::not_found!(
                    "record '{}' not found in table '{}'",
                    id,
                    self.table_name()
                )
            })
    }

    /// Rows matching every condition, ordered by primary key
    pub async fn find(
        &self,
        conditions: Record,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<Record>> {
        let (where_cond, params) = self.predicate(&conditions)?;

        let mut builder = QueryBuilder::select(self.table_name());
        builder
            .column("*")
            .order_by(self.primary_key(), true)
            .limit(limit, offset);
        if let Some(cond) = where_cond {
            builder.where_cond(cond);
        }
        let sql = builder.build(self.dialect)?;

        self.conn
            .query_many_map(&sql, params, |row| self.decode_row(row))
            .await
    }

    /// Apply a partial update, returns the row as stored afterwards
    pub async fn update<V: Into<FieldValue>>(&self, id: V, updates: Record) -> Result<Record> {
        let id = id.into();
        let mut record = self.check_write(updates, WriteMode::Update)?;
        self.stamp(&mut record, WriteMode::Update);

        if record.is_empty() {
            return Err(crate::error::validation!("no updatable fields supplied"));
        }

        let sql = QueryBuilder::update(self.table_name())
            .sets(record.keys().map(|k| (k, param())))
            .where_cond(self.key_predicate())
            .build(self.dialect)?;

        let mut params: Vec<Value> = record.values().map(|v| v.to_value()).collect();
        params.push(id.to_value());

        let executed = self.conn.execute_one(&sql, params).await?;
        if executed.rows_affected == 0 {
            return Err(crate::error::not_found!(
                "record '{}' not found in table '{}'",
                id,
                self.table_name()
            ));
        }

        self.find_by_id(id).await
    }

    /// Soft delete sets `deleted_at`, otherwise the row is removed
    pub async fn delete<V: Into<FieldValue>>(&self, id: V) -> Result<()> {
        let id = id.into();

        let (sql, params) = if self.soft_delete() {
            let sql = QueryBuilder::update(self.table_name())
                .set(DELETED_AT, param())
                .where_cond(self.key_predicate())
                .build(self.dialect)?;
            (sql, vec![FieldValue::Time(Utc::now()).to_value(), id.to_value()])
        } else {
            let sql = QueryBuilder::delete(self.table_name())
                .where_cond(self.key_predicate())
                .build(self.dialect)?;
            (sql, vec![id.to_value()])
        };

        let executed = self.conn.execute_one(&sql, params).await?;
        if executed.rows_affected == 0 {
            return Err(crate::error::not_found!(
                "record '{}' not found in table '{}'",
                id,
                self.table_name()
            ));
        }

        Ok(())
    }

    pub async fn count(&self, conditions: Record) -> Result<u64> {
        let (where_cond, params) = self.predicate(&conditions)?;

        let mut builder = QueryBuilder::select(self.table_name());
        builder.column("COUNT(*) AS total");
        if let Some(cond) = where_cond {
            builder.where_cond(cond);
        }
        let sql = builder.build(self.dialect)?;

        let totals = self
            .conn
            .query_many_map(&sql, params, |row| row.get::<i64>("total"))
            .await?;

        Ok(totals.into_iter().next().unwrap_or(0).max(0) as u64)
    }

    /// Validate every record, then insert all of them in one transaction
    pub async fn bulk_insert(&self, records: Vec<Record>) -> Result<Vec<Record>> {
        if records.is_empty() {
            return Ok(vec![]);
        }

        let mut checked = Vec::with_capacity(records.len());
        for (i, data) in records.into_iter().enumerate() {
            let mut record = self
                .check_write(data, WriteMode::Create)
                .map_err(|e| crate::error::validation!("record {}: {}", i, e.message()))?;
            self.stamp(&mut record, WriteMode::Create);
            checked.push(record);
        }

        // Neighbours with the same column set share one statement
        let mut pairs: SqlParamPairs = vec![];
        for record in &checked {
            let sql = self.insert_sql(record)?;
            let params = record.values().map(|v| v.to_value()).collect();

            match pairs.last_mut() {
                Some((last, list)) if *last == sql => list.push(params),
                _ => pairs.push((sql, vec![params])),
            }
        }

        let executed = self.conn.execute_many(pairs).await?;
        for (record, ex) in checked.iter_mut().zip(executed) {
            self.fill_key(record, ex.last_insert_id);
        }

        log::debug!(
            "Bulk inserted {} rows into `{}`",
            checked.len(),
            self.table_name()
        );

        Ok(checked)
    }

    /// Read only escape hatch
    ///
    /// The statement must start with `SELECT` and mention this table. That is
    /// a substring check, not a parser, so it is no security boundary on its
    /// own.
    pub async fn execute_raw_query(&self, query: &str, args: Vec<FieldValue>) -> Result<Vec<Record>> {
        let query = query.trim();

        if !query.to_uppercase().starts_with("SELECT") {
            return Err(crate::error::validation!("only SELECT queries are allowed"));
        }

        if !query.to_lowercase().contains(self.table_name()) {
            return Err(crate::error::validation!(
                "query must reference table '{}'",
                self.table_name()
            ));
        }

        log::debug!("Raw query on `{}`: {}", self.table_name(), query);

        let sql = self.dialect.bind_placeholders(query);
        let params = args.iter().map(|v| v.to_value()).collect();

        self.conn
            .query_many_map(&sql, params, |row| self.decode_row(row))
            .await
    }
}
