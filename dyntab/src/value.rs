use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    conn::{ToValue, Value},
    error::Result,
    FieldType,
};

/// A row keyed by column name
pub type Record = BTreeMap<String, FieldValue>;

/// Untyped value flowing in and out of a dynamic table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Time(DateTime<Utc>),
    String(String),
    Json(serde_json::Value),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Time(_) => "time",
            Self::String(_) => "string",
            Self::Json(_) => "json",
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Decode a driver value using the declared column type
    pub fn decode(ty: Option<FieldType>, value: Value) -> Result<Self> {
        let v = match (ty, value) {
            (_, Value::Null) => Self::Null,
            (Some(FieldType::Bool), Value::I64(n)) => Self::Bool(n != 0),
            (Some(FieldType::Float | FieldType::Decimal), Value::I64(n)) => Self::Float(n as f64),
            (Some(FieldType::Time), Value::Str(s)) => match parse_time(&s) {
                Some(t) => Self::Time(t),
                None => Self::String(s),
            },
            (Some(FieldType::Json), Value::Str(s)) => serde_json::from_str(&s)
                .map(Self::Json)
                .map_err(|e| crate::error::serialization!("Decode json column error: {}", e))?,
            (_, Value::Bool(b)) => Self::Bool(b),
            (_, Value::I64(n)) => Self::Int(n),
            (_, Value::F64(n)) => Self::Float(n),
            (_, Value::Str(s)) => Self::String(s),
            (_, Value::Bytes(b)) => Self::String(String::from_utf8_lossy(&b).into_owned()),
        };

        Ok(v)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Time(v) => write!(f, "{}", format_time(v)),
            Self::String(v) => write!(f, "{}", v),
            Self::Json(v) => write!(f, "{}", v),
        }
    }
}

impl ToValue for FieldValue {
    fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(v) => Value::Bool(*v),
            Self::Int(v) => Value::I64(*v),
            Self::Float(v) => Value::F64(*v),
            Self::Time(v) => Value::Str(format_time(v)),
            Self::String(v) => Value::Str(v.clone()),
            Self::Json(v) => Value::Str(v.to_string()),
        }
    }
}

/// Timestamps are stored as RFC 3339 text with microseconds
pub fn format_time(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Accepts RFC 3339 as well as the engine's `CURRENT_TIMESTAMP` format
pub fn parse_time(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(s) {
        return Some(t.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .map(|t| DateTime::<Utc>::from_naive_utc_and_offset(t, Utc))
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Time(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Scalars map to their own variant, arrays and objects stay json
impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as J;

        match v {
            J::Null => Self::Null,
            J::Bool(b) => Self::Bool(b),
            J::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            J::String(s) => Self::String(s),
            other => Self::Json(other),
        }
    }
}

/// Build a record from a json object
pub fn record_from_json(v: serde_json::Value) -> Result<Record> {
    match v {
        serde_json::Value::Object(map) => Ok(map.into_iter().map(|(k, v)| (k, v.into())).collect()),
        other => Err(crate::error::validation!(
            "record must be a json object, got {}",
            other
        )),
    }
}

/// Build a [`Record`] from `key => value` pairs
///
/// # Examples
///
/// ```
/// use dyntab::{record, FieldValue};
///
/// let r = record! { "amount" => 10.5, "status" => "draft" };
/// assert_eq!(r["status"], FieldValue::String("draft".into()));
/// ```
#[macro_export]
macro_rules! record {
    () => { $crate::Record::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut r = $crate::Record::new();
        $(
            r.insert($key.to_string(), $crate::FieldValue::from($value));
        )+
        r
    }};
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_decode() {
        assert_eq!(
            FieldValue::decode(Some(FieldType::Bool), Value::I64(1)).unwrap(),
            FieldValue::Bool(true)
        );
        assert_eq!(
            FieldValue::decode(Some(FieldType::Float), Value::I64(3)).unwrap(),
            FieldValue::Float(3.0)
        );
        assert_eq!(
            FieldValue::decode(Some(FieldType::Json), Value::Str("[1,2]".into())).unwrap(),
            FieldValue::Json(serde_json::json!([1, 2]))
        );
        assert_eq!(
            FieldValue::decode(None, Value::Bytes(b"ab".to_vec())).unwrap(),
            FieldValue::String("ab".into())
        );
        assert!(FieldValue::decode(Some(FieldType::Json), Value::Str("{".into())).is_err());
    }

    #[test]
    fn test_time_text() {
        let t = parse_time("2024-03-01T10:20:30.123456Z").unwrap();
        assert_eq!(format_time(&t), "2024-03-01T10:20:30.123456Z");
        assert_eq!(
            FieldValue::decode(Some(FieldType::Time), FieldValue::Time(t).to_value()).unwrap(),
            FieldValue::Time(t)
        );
        assert!(parse_time("2024-03-01 10:20:30").is_some());
        assert!(parse_time("yesterday").is_none());
    }

    #[test]
    fn test_from_json() {
        let r = record_from_json(serde_json::json!({
            "a": 1,
            "b": 1.5,
            "c": null,
            "d": { "k": true },
        }))
        .unwrap();

        assert_eq!(r["a"], FieldValue::Int(1));
        assert_eq!(r["b"], FieldValue::Float(1.5));
        assert!(r["c"].is_null());
        assert_eq!(r["d"].kind(), "json");
        assert!(record_from_json(serde_json::json!([1])).is_err());
    }
}
