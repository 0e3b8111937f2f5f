pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Domain errors, safe to surface to API callers
    #[error("Validation: `{0}`")]
    Validation(String),
    #[error("NotFound: `{0}`")]
    NotFound(String),
    #[error("Conflict: `{0}`")]
    Conflict(String),
    #[error("Execution: `{0}`")]
    Execution(String),
    #[error("State: `{0}`")]
    State(String),

    // Plumbing errors
    #[error("Connection: `{0}`")]
    Connection(String),
    #[error("Database: `{0}`")]
    Database(String),
    #[error("Runtime: `{0}`")]
    Runtime(String),
    #[error("FromValue: `{0}`")]
    FromValue(String),
    #[error("OutOfRange: `{0}`")]
    OutOfRange(String),
    #[error("QueryBuilder: `{0}`")]
    QueryBuilder(String),
    #[error("Config: `{0}`")]
    Config(String),
    #[error("Serialization: `{0}`")]
    Serialization(String),
}

impl Error {
    /// Message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Execution(m)
            | Self::State(m)
            | Self::Connection(m)
            | Self::Database(m)
            | Self::Runtime(m)
            | Self::FromValue(m)
            | Self::OutOfRange(m)
            | Self::QueryBuilder(m)
            | Self::Config(m)
            | Self::Serialization(m) => m,
        }
    }

    /// Driver reported a uniqueness or existence collision
    pub fn is_duplicate(&self) -> bool {
        match self {
            Self::Conflict(_) => true,
            Self::Database(m) | Self::Execution(m) => {
                let m = m.to_lowercase();
                m.contains("already exists") || m.contains("unique constraint")
            }
            _ => false,
        }
    }
}

#[macro_export]
macro_rules! validation {
    ($($arg:tt)*) => { $crate::Error::Validation(format!($($arg)*)) };
}

#[macro_export]
macro_rules! not_found {
    ($($arg:tt)*) => { $crate::Error::NotFound(format!($($arg)*)) };
}

#[macro_export]
macro_rules! conflict {
    ($($arg:tt)*) => { $crate::Error::Conflict(format!($($arg)*)) };
}

#[macro_export]
macro_rules! execution {
    ($($arg:tt)*) => { $crate::Error::Execution(format!($($arg)*)) };
}

#[macro_export]
macro_rules! state {
    ($($arg:tt)*) => { $crate::Error::State(format!($($arg)*)) };
}

#[macro_export]
macro_rules! connection {
    ($($arg:tt)*) => { $crate::Error::Connection(format!($($arg)*)) };
}

#[macro_export]
macro_rules! database {
    ($($arg:tt)*) => { $crate::Error::Database(format!($($arg)*)) };
}

#[macro_export]
macro_rules! runtime {
    ($($arg:tt)*) => { $crate::Error::Runtime(format!($($arg)*)) };
}

#[macro_export]
macro_rules! from_value {
    ($($arg:tt)*) => { $crate::Error::FromValue(format!($($arg)*)) };
}

#[macro_export]
macro_rules! out_of_range {
    ($($arg:tt)*) => { $crate::Error::OutOfRange(format!($($arg)*)) };
}

#[macro_export]
macro_rules! query_builder {
    ($($arg:tt)*) => { $crate::Error::QueryBuilder(format!($($arg)*)) };
}

#[macro_export]
macro_rules! config {
    ($($arg:tt)*) => { $crate::Error::Config(format!($($arg)*)) };
}

#[macro_export]
macro_rules! serialization {
    ($($arg:tt)*) => { $crate::Error::Serialization(format!($($arg)*)) };
}

#[cfg(test)]
mod test {
    use crate::Error;

    #[test]
    fn test_duplicate_detection() {
        assert!(crate::conflict!("table exists").is_duplicate());
        assert!(crate::database!("UNIQUE constraint failed: t.name").is_duplicate());
        assert!(crate::execution!("table custom_a already exists").is_duplicate());
        assert!(!crate::validation!("bad name").is_duplicate());
    }

    #[test]
    fn test_message() {
        let e = crate::not_found!("table `{}` not found", "custom_a");
        assert_eq!(e.message(), "table `custom_a` not found");
        assert!(matches!(e, Error::NotFound(_)));
    }
}
