mod connection;
mod drivers;
mod value;

use std::collections::HashMap;

pub use connection::Connection;
pub use value::{FromValue, ToValue, Value};

pub mod driver {
    #[cfg(feature = "sqlite")]
    pub use rusqlite;
}

use dyntab_error::Result;

/// A list of `(sql, params_list)`; every params entry executes the sql once
pub type SqlParamPairs = Vec<(String, Vec<Vec<Value>>)>;

#[async_trait::async_trait]
pub trait Driver: Sync + Send {
    /// Execute every pair inside one transaction, one `Executed` per execution
    async fn execute_many(&self, pairs: SqlParamPairs) -> Result<Vec<Executed>>;
    async fn query_many(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Executed {
    pub rows_affected: u64,
    pub last_insert_id: i64,
}

#[derive(Debug, Default)]
pub struct Row {
    pub(crate) columns: Vec<String>,
    pub(crate) values: HashMap<String, Value>,
}

impl Row {
    pub fn new(pairs: Vec<(String, Value)>) -> Self {
        let mut row = Self::default();
        for (name, value) in pairs {
            row.columns.push(name.clone());
            row.values.insert(name, value);
        }
        row
    }

    pub fn get<T: FromValue<Output = T>>(&self, index: &str) -> Result<T> {
        if let Some(v) = self.values.get(index) {
            Ok(T::from_value(v)?)
        } else {
            Err(dyntab_error::out_of_range!(
                "Column `{}` not in row, values length: {}",
                index,
                self.values.len()
            ))
        }
    }

    pub fn value(&self, index: &str) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Consume row into `(column, value)` pairs in select order
    pub fn into_pairs(mut self) -> Vec<(String, Value)> {
        self.columns
            .into_iter()
            .map(|name| {
                let value = self.values.remove(&name).unwrap_or(Value::Null);
                (name, value)
            })
            .collect()
    }
}
