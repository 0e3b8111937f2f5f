//! # Naming policy
//!
//! Every user visible table name maps to a physical name `<prefix><name>`.
//! Field and index names share the identifier grammar but must also avoid
//! SQL keywords.

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;

pub const DEFAULT_PREFIX: &str = "custom_";
pub const MIN_NAME_LEN: usize = 3;
pub const MAX_NAME_LEN: usize = 50;
pub const MAX_IDENTIFIER_LEN: usize = 63;

static RE_IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").unwrap());

const RESERVED_NAMES: &[&str] = &[
    "user", "users", "admin", "admins", "auth", "session", "sessions", "setting", "settings",
    "log", "logs", "storage", "bucket", "buckets", "object", "objects", "extension",
    "extensions", "migration", "migrations", "system", "schema", "table", "tables", "select",
    "insert", "update", "delete", "drop", "create", "alter", "index", "from", "where", "join",
    "order", "group",
];

const SQL_KEYWORDS: &[&str] = &[
    "select", "insert", "update", "delete", "drop", "create", "alter", "table", "index",
    "from", "where", "join", "order", "group", "by", "and", "or", "not", "null", "primary",
    "key", "references", "default", "unique", "check", "constraint", "limit", "offset",
    "union", "all", "as", "on", "in", "is", "like", "between", "case", "when", "then", "else",
    "end", "distinct", "having", "values", "set", "into", "exists", "foreign", "transaction",
    "commit", "rollback",
];

#[derive(Debug, Clone)]
pub struct NamingPolicy {
    prefix: String,
    min_len: usize,
    max_len: usize,
    reserved: BTreeSet<String>,
    keywords: BTreeSet<String>,
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.into(),
            min_len: MIN_NAME_LEN,
            max_len: MAX_NAME_LEN,
            reserved: RESERVED_NAMES.iter().map(|s| s.to_string()).collect(),
            keywords: SQL_KEYWORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl NamingPolicy {
    pub fn with_prefix<S: ToString>(mut self, prefix: S) -> Self {
        self.prefix = prefix.to_string();
        self
    }

    pub fn with_length(mut self, min: usize, max: usize) -> Self {
        self.min_len = min;
        self.max_len = max;
        self
    }

    /// Extra reserved names on top of the defaults
    pub fn with_reserved<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.reserved
            .extend(names.into_iter().map(|s| s.as_ref().to_lowercase()));
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Trim, lowercase, whitespace and `-` to `_`
    pub fn normalize(&self, name: &str) -> String {
        name.trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
            .collect()
    }

    pub fn physical_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, self.normalize(name))
    }

    /// Physical name for a lookup key that may already carry the prefix
    pub fn resolve(&self, name: &str) -> String {
        let normalized = self.normalize(name);
        if normalized.starts_with(&self.prefix) {
            normalized
        } else {
            format!("{}{}", self.prefix, normalized)
        }
    }

    /// Syntax rules for a user table name, the store collision check is separate
    pub fn check_table_name(&self, name: &str) -> Result<()> {
        let name = self.normalize(name);

        if name.is_empty() {
            return Err(crate::error::validation!("table name cannot be empty"));
        }

        let len = name.chars().count();
        if len < self.min_len || len > self.max_len {
            return Err(crate::error::validation!(
                "table name must be between {} and {} characters",
                self.min_len,
                self.max_len
            ));
        }

        if !RE_IDENTIFIER.is_match(&name) {
            return Err(crate::error::validation!(
                "table name must start with a lowercase letter and contain only lowercase letters, digits and underscores"
            ));
        }

        if self.reserved.contains(&name) {
            return Err(crate::error::validation!("table name '{}' is reserved", name));
        }

        // `resolve` reads a prefixed name as already physical
        if name.starts_with(&self.prefix) {
            return Err(crate::error::validation!(
                "table name must not start with the prefix '{}'",
                self.prefix
            ));
        }

        Ok(())
    }

    /// Field and index names
    pub fn check_identifier(&self, kind: &str, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(crate::error::validation!("{} name cannot be empty", kind));
        }

        if name.len() > MAX_IDENTIFIER_LEN {
            return Err(crate::error::validation!(
                "{} name '{}' exceeds {} characters",
                kind,
                name,
                MAX_IDENTIFIER_LEN
            ));
        }

        if !RE_IDENTIFIER.is_match(name) {
            return Err(crate::error::validation!(
                "{} name '{}' must start with a lowercase letter and contain only lowercase letters, digits and underscores",
                kind,
                name
            ));
        }

        if self.keywords.contains(name) {
            return Err(crate::error::validation!(
                "{} name '{}' is a reserved SQL keyword",
                kind,
                name
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_normalize() {
        let p = NamingPolicy::default();
        assert_eq!(p.normalize("  My Orders-2024 "), "my_orders_2024");
        assert_eq!(p.physical_name("Invoices"), "custom_invoices");
        assert_eq!(p.resolve("custom_invoices"), "custom_invoices");
        assert_eq!(p.resolve("invoices"), "custom_invoices");
    }

    #[test]
    fn test_table_name_rules() {
        let p = NamingPolicy::default();

        assert!(p.check_table_name("invoices").is_ok());
        assert!(p.check_table_name("Line Items").is_ok());

        let cases = [
            ("", "table name cannot be empty"),
            ("ab", "table name must be between 3 and 50 characters"),
            (
                "1abc",
                "table name must start with a lowercase letter and contain only lowercase letters, digits and underscores",
            ),
            ("users", "table name 'users' is reserved"),
            (
                "custom_foo",
                "table name must not start with the prefix 'custom_'",
            ),
        ];

        for (name, msg) in cases {
            match p.check_table_name(name) {
                Err(Error::Validation(m)) => assert_eq!(m, msg),
                other => panic!("unexpected result for `{}`: {:?}", name, other),
            }
        }

        assert!(p.check_table_name(&"a".repeat(51)).is_err());
        assert!(p.check_table_name("order$").is_err());
    }

    #[test]
    fn test_custom_policy() {
        let p = NamingPolicy::default()
            .with_prefix("tenant1_")
            .with_length(2, 10)
            .with_reserved(["Billing"]);

        assert_eq!(p.physical_name("ab"), "tenant1_ab");
        assert!(p.check_table_name("ab").is_ok());
        assert!(p.check_table_name("billing").is_err());
    }

    #[test]
    fn test_identifier() {
        let p = NamingPolicy::default();
        assert!(p.check_identifier("field", "customer_id").is_ok());
        assert!(p.check_identifier("field", "select").is_err());
        assert!(p.check_identifier("field", "Amount").is_err());
        assert!(p.check_identifier("index", "").is_err());
    }
}
