use dyntab_error::Result;

macro_rules! impl_to_value_base {
    ($ty:ty, $enum_field:ident) => {
        impl ToValue for $ty {
            fn to_value(&self) -> Value {
                Value::$enum_field(self.clone())
            }
        }
    };
}

macro_rules! impl_to_value_integer {
    ($($ty:ty),+) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    Value::I64(*self as i64)
                }
            }
        )+
    };
}

macro_rules! impl_from_value_integer {
    ($($ty:ty),+) => {
        $(
            impl FromValue for $ty {
                type Output = $ty;

                fn from_value(v: &Value) -> Result<Self::Output> {
                    match v {
                        Value::I64(v) => <$ty>::try_from(*v).map_err(|_| {
                            dyntab_error::from_value!(
                                "Integer {} out of range for {}",
                                v,
                                stringify!($ty)
                            )
                        }),
                        _ => Err(dyntab_error::from_value!(
                            "Invalid value: {:?}, output type: {}",
                            v,
                            stringify!($ty)
                        )),
                    }
                }
            }
        )+
    };
}

/// Wire level value, the types every driver can bind and return
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    Str(String),
    Bytes(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

pub trait ToValue {
    fn to_value(&self) -> Value;
}

pub trait FromValue {
    type Output;

    fn from_value(v: &Value) -> Result<Self::Output>;
}

impl_to_value_base! {bool, Bool}
impl_to_value_base! {f64, F64}
impl_to_value_base! {String, Str}
impl_to_value_base! {Vec<u8>, Bytes}
impl_to_value_integer! {i32, i64, u32}

impl ToValue for &str {
    fn to_value(&self) -> Value {
        Value::Str(self.to_string())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl_from_value_integer! {i32, i64, u32, u64}

impl FromValue for f64 {
    type Output = f64;

    fn from_value(v: &Value) -> Result<Self::Output> {
        match v {
            Value::F64(v) => Ok(*v),
            Value::I64(v) => Ok(*v as f64),
            _ => Err(dyntab_error::from_value!(
                "Invalid value: {:?}, output type: f64",
                v
            )),
        }
    }
}

impl FromValue for bool {
    type Output = bool;

    fn from_value(v: &Value) -> Result<Self::Output> {
        match v {
            Value::Bool(v) => Ok(*v),
            Value::I64(v) => Ok(*v != 0),
            _ => Err(dyntab_error::from_value!(
                "Invalid value: {:?}, output type: bool",
                v
            )),
        }
    }
}

impl FromValue for String {
    type Output = String;

    fn from_value(v: &Value) -> Result<Self::Output> {
        match v {
            Value::Str(v) => Ok(v.clone()),
            Value::Bytes(v) => Ok(String::from_utf8_lossy(v).into_owned()),
            _ => Err(dyntab_error::from_value!(
                "Invalid value: {:?}, output type: String",
                v
            )),
        }
    }
}

impl<T: FromValue<Output = T>> FromValue for Option<T> {
    type Output = Option<T>;

    fn from_value(v: &Value) -> Result<Self::Output> {
        match v {
            Value::Null => Ok(None),
            v => Ok(Some(T::from_value(v)?)),
        }
    }
}
