/// Physical description of a table, the input of the DDL builders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub ty: ColumnType,
    pub is_primary_key: bool,             // Default is false
    pub is_not_null: bool,                // Default is false
    pub is_auto_increment: bool,          // Default is false
    pub default: Option<String>,          // Raw default text, formatted by the dialect
    pub is_unique: bool,                  // Default is false
    pub references: Option<ForeignKeyInfo>,
}

impl ColumnInfo {
    pub fn new<S: ToString>(name: S, ty: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            is_primary_key: false,
            is_not_null: false,
            is_auto_increment: false,
            default: None,
            is_unique: false,
            references: None,
        }
    }

    /// `id` column injected into tables without an explicit primary key
    pub fn synthetic_id() -> Self {
        Self {
            is_primary_key: true,
            is_auto_increment: true,
            ..Self::new("id", ColumnType::BigInt)
        }
    }

    pub fn primary_key(mut self, auto_increment: bool) -> Self {
        self.is_primary_key = true;
        self.is_auto_increment = auto_increment;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.is_not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn default_value<S: ToString>(mut self, raw: S) -> Self {
        self.default = Some(raw.to_string());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Bool,
    Int,
    BigInt,
    Float,
    Decimal,
    Str(Option<usize>), // String with optional max length
    Text,
    Time,
    Date,
    Json,
    Uuid,
}

impl ColumnType {
    pub fn is_integer(&self) -> bool {
        matches!(self, Self::Int | Self::BigInt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyInfo {
    pub table: String,
    pub column: String,
    pub on_delete: Option<String>,
    pub on_update: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexInfo {
    pub name: String,
    pub columns: Vec<String>,
    pub unique: bool,
}
