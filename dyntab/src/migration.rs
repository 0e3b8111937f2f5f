use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationType {
    Create,
    Alter,
    Drop,
}

impl MigrationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Alter => "alter",
            Self::Drop => "drop",
        }
    }
}

impl FromStr for MigrationType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "create" => Ok(Self::Create),
            "alter" => Ok(Self::Alter),
            "drop" => Ok(Self::Drop),
            _ => Err(crate::error::from_value!("Unknown migration type `{}`", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    Pending,
    Completed,
    Failed,
}

impl MigrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for MigrationStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(crate::error::from_value!("Unknown migration status `{}`", s)),
        }
    }
}

/// One entry of a table's append-only schema history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    pub id: i64,
    pub table_id: i64,
    pub version: i64,
    pub migration_type: MigrationType,
    pub old_schema: Option<String>,
    pub new_schema: Option<String>,
    pub executed_by: String,
    pub executed_at: DateTime<Utc>,
    pub status: MigrationStatus,
    pub error_message: Option<String>,
}

impl Migration {
    /// Unsaved record, `id` is assigned by the store
    pub fn new(table_id: i64, version: i64, migration_type: MigrationType) -> Self {
        Self {
            id: 0,
            table_id,
            version,
            migration_type,
            old_schema: None,
            new_schema: None,
            executed_by: String::new(),
            executed_at: Utc::now(),
            status: MigrationStatus::Pending,
            error_message: None,
        }
    }

    pub fn schemas(mut self, old: Option<String>, new: Option<String>) -> Self {
        self.old_schema = old;
        self.new_schema = new;
        self
    }

    pub fn executed_by<S: ToString>(mut self, who: S) -> Self {
        self.executed_by = who.to_string();
        self
    }

    pub fn status(mut self, status: MigrationStatus) -> Self {
        self.status = status;
        self
    }
}
