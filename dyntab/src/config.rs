use std::env;

use serde::Deserialize;

use crate::{
    error::Result,
    policy::{NamingPolicy, DEFAULT_PREFIX, MAX_NAME_LEN, MIN_NAME_LEN},
    query::DialectKind,
    store::{DEFINITIONS_TABLE, MIGRATIONS_TABLE},
};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://memory";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub database_url: String,
    /// Overrides the dialect implied by `database_url`
    pub dialect: Option<String>,
    pub table_prefix: String,
    pub min_name_len: usize,
    pub max_name_len: usize,
    /// Merged into the built-in reserved names
    pub reserved_names: Vec<String>,
    pub definitions_table: String,
    pub migrations_table: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.into(),
            dialect: None,
            table_prefix: DEFAULT_PREFIX.into(),
            min_name_len: MIN_NAME_LEN,
            max_name_len: MAX_NAME_LEN,
            reserved_names: vec![],
            definitions_table: DEFINITIONS_TABLE.into(),
            migrations_table: MIGRATIONS_TABLE.into(),
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by `DYNTAB_*` environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            database_url: env::var("DYNTAB_DATABASE_URL").unwrap_or(default.database_url),
            dialect: env::var("DYNTAB_DIALECT").ok().filter(|s| !s.is_empty()),
            table_prefix: env::var("DYNTAB_TABLE_PREFIX").unwrap_or(default.table_prefix),
            ..default
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| crate::error::config!("Parse service config error: {}", e))
    }

    pub fn database_url<S: ToString>(mut self, url: S) -> Self {
        self.database_url = url.to_string();
        self
    }

    pub fn dialect<S: ToString>(mut self, dialect: S) -> Self {
        self.dialect = Some(dialect.to_string());
        self
    }

    pub fn table_prefix<S: ToString>(mut self, prefix: S) -> Self {
        self.table_prefix = prefix.to_string();
        self
    }

    pub fn reserved_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: ToString,
    {
        self.reserved_names = names.into_iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn dialect_kind(&self) -> Result<DialectKind> {
        match &self.dialect {
            Some(name) => name.parse(),
            None => DialectKind::from_url(&self.database_url),
        }
    }

    pub fn naming_policy(&self) -> Result<NamingPolicy> {
        if self.table_prefix.is_empty() {
            return Err(crate::error::config!("table_prefix cannot be empty"));
        }

        if self.min_name_len == 0 || self.min_name_len > self.max_name_len {
            return Err(crate::error::config!(
                "Invalid name length range {}..={}",
                self.min_name_len,
                self.max_name_len
            ));
        }

        if self.definitions_table.starts_with(&self.table_prefix)
            || self.migrations_table.starts_with(&self.table_prefix)
        {
            return Err(crate::error::config!(
                "Metadata tables must not use the custom table prefix `{}`",
                self.table_prefix
            ));
        }

        Ok(NamingPolicy::default()
            .with_prefix(&self.table_prefix)
            .with_length(self.min_name_len, self.max_name_len)
            .with_reserved(&self.reserved_names))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_from_json() {
        let c = ServiceConfig::from_json(
            r#"{ "database_url": "postgres://localhost/app", "reserved_names": ["billing"] }"#,
        )
        .unwrap();

        assert_eq!(c.table_prefix, "custom_");
        assert_eq!(c.dialect_kind().unwrap(), DialectKind::Postgres);

        let policy = c.naming_policy().unwrap();
        assert!(policy.check_table_name("billing").is_err());

        assert!(ServiceConfig::from_json("{ \"min_name_len\": \"x\" }").is_err());
    }

    #[test]
    fn test_dialect_override() {
        let c = ServiceConfig::default().dialect("postgres");
        assert_eq!(c.dialect_kind().unwrap(), DialectKind::Postgres);
        assert_eq!(
            ServiceConfig::default().dialect_kind().unwrap(),
            DialectKind::Sqlite
        );
        assert!(ServiceConfig::default().dialect("oracle").dialect_kind().is_err());
    }

    #[test]
    fn test_bad_policy() {
        let c = ServiceConfig::default().table_prefix("_custom_");
        assert!(c.naming_policy().is_err());

        let c = ServiceConfig {
            min_name_len: 10,
            max_name_len: 5,
            ..Default::default()
        };
        assert!(c.naming_policy().is_err());
    }
}
