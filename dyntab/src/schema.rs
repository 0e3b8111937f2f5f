//! # Schema
//!
//! Maps a table definition onto the physical [`TableInfo`] the DDL builders
//! consume, and checks a definition before anything is written.

use std::collections::HashSet;

use crate::{
    error::Result,
    policy::NamingPolicy,
    query::{ColumnInfo, ColumnType, Dialect, IndexInfo, TableInfo},
    FieldDefinition, FieldType, IndexDefinition, TableDefinition, TableOptions,
};

pub const ID_COLUMN: &str = "id";
pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";
pub const DELETED_AT: &str = "deleted_at";

/// Columns an alter never drops
pub const PROTECTED_COLUMNS: &[&str] = &[ID_COLUMN, CREATED_AT, UPDATED_AT, DELETED_AT];

const FK_ACTIONS: &[&str] = &["CASCADE", "SET NULL", "SET DEFAULT", "RESTRICT", "NO ACTION"];

pub fn explicit_primary_key(fields: &[FieldDefinition]) -> Option<&FieldDefinition> {
    fields.iter().find(|f| f.is_primary_key)
}

/// Name of the primary key column, synthetic `id` when none is declared
pub fn primary_key_name(fields: &[FieldDefinition]) -> &str {
    explicit_primary_key(fields)
        .map(|f| f.name.as_str())
        .unwrap_or(ID_COLUMN)
}

/// Columns a table has besides its declared fields
pub fn implicit_columns(fields: &[FieldDefinition], options: &TableOptions) -> Vec<&'static str> {
    let mut cols = vec![];
    if explicit_primary_key(fields).is_none() {
        cols.push(ID_COLUMN);
    }
    if options.timestamps {
        cols.push(CREATED_AT);
        cols.push(UPDATED_AT);
    }
    if options.soft_delete {
        cols.push(DELETED_AT);
    }
    cols
}

pub fn field_column(field: &FieldDefinition) -> ColumnInfo {
    ColumnInfo {
        name: field.name.clone(),
        ty: field.field_type.column_type(&field.validation),
        is_primary_key: field.is_primary_key,
        is_not_null: !field.nullable,
        is_auto_increment: field.auto_increment,
        default: field.default_value.clone(),
        is_unique: field.is_unique,
        references: field.foreign_key.as_ref().map(Into::into),
    }
}

/// Timestamp columns, defaulted at creation and nullable when added later
pub fn timestamp_columns(on_create: bool) -> Vec<ColumnInfo> {
    [CREATED_AT, UPDATED_AT]
        .iter()
        .map(|name| {
            let col = ColumnInfo::new(name, ColumnType::Time);
            if on_create {
                col.not_null().default_value("CURRENT_TIMESTAMP")
            } else {
                col
            }
        })
        .collect()
}

pub fn deleted_at_column() -> ColumnInfo {
    ColumnInfo::new(DELETED_AT, ColumnType::Time)
}

pub fn index_name(table: &str, name: &str) -> String {
    format!("idx_{}_{}", table, name)
}

/// Secondary indexes: flagged fields, `deleted_at`, then custom ones
pub fn index_infos(
    table: &str,
    fields: &[FieldDefinition],
    indexes: &[IndexDefinition],
    options: &TableOptions,
) -> Vec<IndexInfo> {
    let mut list: Vec<IndexInfo> = fields
        .iter()
        .filter(|f| f.is_indexed && !f.is_primary_key && !f.is_unique)
        .map(|f| IndexInfo {
            name: index_name(table, &f.name),
            columns: vec![f.name.clone()],
            unique: false,
        })
        .collect();

    if options.soft_delete {
        list.push(IndexInfo {
            name: index_name(table, DELETED_AT),
            columns: vec![DELETED_AT.into()],
            unique: false,
        });
    }

    list.extend(indexes.iter().map(|idx| IndexInfo {
        name: index_name(table, &idx.name),
        columns: idx.columns.clone(),
        unique: idx.unique,
    }));

    list
}

pub fn table_info(def: &TableDefinition) -> TableInfo {
    let mut columns = vec![];

    if explicit_primary_key(&def.fields).is_none() {
        columns.push(ColumnInfo::synthetic_id());
    }
    columns.extend(def.fields.iter().map(field_column));
    if def.options.timestamps {
        columns.extend(timestamp_columns(true));
    }
    if def.options.soft_delete {
        columns.push(deleted_at_column());
    }

    TableInfo {
        name: def.name.clone(),
        columns,
        indexes: index_infos(&def.name, &def.fields, &def.indexes, &def.options),
    }
}

/// Structural checks of a definition
pub fn validate_definition(
    policy: &NamingPolicy,
    dialect: &dyn Dialect,
    fields: &[FieldDefinition],
    indexes: &[IndexDefinition],
    options: &TableOptions,
) -> Result<()> {
    if fields.is_empty() {
        return Err(crate::error::validation!("table must have at least one field"));
    }

    let mut names = HashSet::new();
    let mut primary_keys = 0;

    for f in fields {
        policy.check_identifier("field", &f.name)?;

        if !names.insert(f.name.as_str()) {
            return Err(crate::error::validation!("duplicate field name '{}'", f.name));
        }

        if f.is_primary_key {
            primary_keys += 1;
        }

        if f.auto_increment
            && !(f.is_primary_key && matches!(f.field_type, FieldType::Int | FieldType::BigInt))
        {
            return Err(crate::error::validation!(
                "field '{}': auto increment requires an integer primary key",
                f.name
            ));
        }

        if f.name == ID_COLUMN && !f.is_primary_key {
            return Err(crate::error::validation!(
                "field 'id' is reserved for the primary key"
            ));
        }

        if options.timestamps && (f.name == CREATED_AT || f.name == UPDATED_AT) {
            return Err(crate::error::validation!(
                "field '{}' is managed by the timestamps option",
                f.name
            ));
        }

        if options.soft_delete && f.name == DELETED_AT {
            return Err(crate::error::validation!(
                "field '{}' is managed by the soft delete option",
                f.name
            ));
        }

        if let Some(fk) = &f.foreign_key {
            policy.check_identifier("foreign key table", &fk.table)?;
            policy.check_identifier("foreign key column", &fk.column)?;
            for action in [&fk.on_delete, &fk.on_update].into_iter().flatten() {
                if !FK_ACTIONS.contains(&action.to_uppercase().as_str()) {
                    return Err(crate::error::validation!(
                        "field '{}': invalid foreign key action '{}'",
                        f.name,
                        action
                    ));
                }
            }
        }

        if let Some(raw) = &f.default_value {
            let ty = f.field_type.column_type(&f.validation);
            dialect.default_literal(&ty, raw).map_err(|_| {
                crate::error::validation!(
                    "field '{}': invalid default value '{}' for type {}",
                    f.name,
                    raw,
                    f.field_type
                )
            })?;
        }
    }

    if primary_keys > 1 {
        return Err(crate::error::validation!(
            "table can have at most one primary key"
        ));
    }

    let implicit = implicit_columns(fields, options);
    let mut index_names: HashSet<String> = fields
        .iter()
        .filter(|f| f.is_indexed)
        .map(|f| f.name.clone())
        .collect();
    if options.soft_delete {
        index_names.insert(DELETED_AT.into());
    }

    for idx in indexes {
        policy.check_identifier("index", &idx.name)?;

        if !index_names.insert(idx.name.clone()) {
            return Err(crate::error::validation!("duplicate index name '{}'", idx.name));
        }

        if idx.columns.is_empty() {
            return Err(crate::error::validation!(
                "index '{}' must have at least one column",
                idx.name
            ));
        }

        for col in &idx.columns {
            if !names.contains(col.as_str()) && !implicit.iter().any(|c| *c == col.as_str()) {
                return Err(crate::error::validation!(
                    "index '{}' references unknown column '{}'",
                    idx.name,
                    col
                ));
            }
        }
    }

    Ok(())
}
