use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    query::{ColumnType, ForeignKeyInfo},
};

/// Declared type of a custom field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[serde(alias = "varchar")]
    String,
    Text,
    #[serde(alias = "integer")]
    Int,
    BigInt,
    #[serde(alias = "double")]
    Float,
    Decimal,
    #[serde(alias = "boolean")]
    Bool,
    #[serde(alias = "datetime", alias = "timestamp")]
    Time,
    Date,
    Json,
    Uuid,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Text => "text",
            Self::Int => "int",
            Self::BigInt => "bigint",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::Bool => "bool",
            Self::Time => "time",
            Self::Date => "date",
            Self::Json => "json",
            Self::Uuid => "uuid",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Int | Self::BigInt | Self::Float | Self::Decimal)
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::Text)
    }

    pub fn column_type(&self, validation: &FieldValidation) -> ColumnType {
        match self {
            Self::String => ColumnType::Str(validation.max_length),
            Self::Text => ColumnType::Text,
            Self::Int => ColumnType::Int,
            Self::BigInt => ColumnType::BigInt,
            Self::Float => ColumnType::Float,
            Self::Decimal => ColumnType::Decimal,
            Self::Bool => ColumnType::Bool,
            Self::Time => ColumnType::Time,
            Self::Date => ColumnType::Date,
            Self::Json => ColumnType::Json,
            Self::Uuid => ColumnType::Uuid,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "string" | "varchar" => Ok(Self::String),
            "text" => Ok(Self::Text),
            "int" | "integer" => Ok(Self::Int),
            "bigint" => Ok(Self::BigInt),
            "float" | "double" => Ok(Self::Float),
            "decimal" => Ok(Self::Decimal),
            "bool" | "boolean" => Ok(Self::Bool),
            "time" | "datetime" | "timestamp" => Ok(Self::Time),
            "date" => Ok(Self::Date),
            "json" => Ok(Self::Json),
            "uuid" => Ok(Self::Uuid),
            "" => Err(crate::error::validation!("field type cannot be empty")),
            other => Err(crate::error::validation!(
                "unsupported field type '{}'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
}

impl From<&ForeignKey> for ForeignKeyInfo {
    fn from(fk: &ForeignKey) -> Self {
        Self {
            table: fk.table.clone(),
            column: fk.column.clone(),
            on_delete: fk.on_delete.as_ref().map(|a| a.to_uppercase()),
            on_update: fk.on_update.as_ref().map(|a| a.to_uppercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_indexed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKey>,
    #[serde(default)]
    pub validation: FieldValidation,
}

impl FieldDefinition {
    /// A non-null field without constraints
    pub fn new<S: ToString>(name: S, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            nullable: false,
            is_primary_key: false,
            auto_increment: false,
            is_unique: false,
            is_indexed: false,
            default_value: None,
            foreign_key: None,
            validation: FieldValidation::default(),
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self, auto_increment: bool) -> Self {
        self.is_primary_key = true;
        self.auto_increment = auto_increment;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.is_indexed = true;
        self
    }

    pub fn default_value<S: ToString>(mut self, raw: S) -> Self {
        self.default_value = Some(raw.to_string());
        self
    }

    pub fn references<S: ToString>(mut self, table: S, column: S) -> Self {
        self.foreign_key = Some(ForeignKey {
            table: table.to_string(),
            column: column.to_string(),
            on_delete: None,
            on_update: None,
        });
        self
    }

    pub fn min_length(mut self, n: usize) -> Self {
        self.validation.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: usize) -> Self {
        self.validation.max_length = Some(n);
        self
    }

    pub fn min_value(mut self, v: f64) -> Self {
        self.validation.min_value = Some(v);
        self
    }

    pub fn max_value(mut self, v: f64) -> Self {
        self.validation.max_value = Some(v);
        self
    }

    pub fn enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.validation.enum_values = values.into_iter().map(|s| s.to_string()).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDefinition {
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableOptions {
    #[serde(default)]
    pub timestamps: bool,
    #[serde(default)]
    pub soft_delete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableStatus {
    Active,
    Archived,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Archived => "archived",
        }
    }
}

impl FromStr for TableStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            _ => Err(crate::error::from_value!("Unknown table status `{}`", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub fields: Vec<FieldDefinition>,
    pub indexes: Vec<IndexDefinition>,
    pub options: TableOptions,
    pub status: TableStatus,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TableDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn is_active(&self) -> bool {
        self.status == TableStatus::Active
    }

    /// Serialized snapshot stored in migration records
    pub fn snapshot(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| crate::error::serialization!("Serialize definition error: {}", e))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateTableRequest {
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
    #[serde(default)]
    pub options: TableOptions,
    #[serde(default)]
    pub created_by: String,
}

/// Desired shape of an existing table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlterTableRequest {
    #[serde(default)]
    pub description: Option<String>,
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub indexes: Vec<IndexDefinition>,
    #[serde(default)]
    pub options: Option<TableOptions>,
}
