//! # Field validator
//!
//! Checks a runtime value against a field's declared type and constraints.
//! Values are never coerced. Float and decimal fields also take ints.

use crate::{
    error::Result,
    value::{parse_date, parse_time},
    FieldDefinition, FieldType, FieldValue,
};

pub fn validate_field_value(field: &FieldDefinition, value: &FieldValue) -> Result<()> {
    if value.is_null() {
        if field.nullable || field.default_value.is_some() {
            return Ok(());
        }
        return Err(crate::error::validation!("field '{}' cannot be null", field.name));
    }

    check_kind(field, value)?;
    check_range(field, value)?;
    check_length(field, value)?;
    check_enum(field, value)?;

    Ok(())
}

fn check_kind(field: &FieldDefinition, value: &FieldValue) -> Result<()> {
    let ok = match (field.field_type, value) {
        (FieldType::String | FieldType::Text, FieldValue::String(_)) => true,
        (FieldType::Int | FieldType::BigInt, FieldValue::Int(_)) => true,
        (FieldType::Float | FieldType::Decimal, FieldValue::Float(_) | FieldValue::Int(_)) => true,
        (FieldType::Bool, FieldValue::Bool(_)) => true,
        (FieldType::Time, FieldValue::Time(_)) => true,
        (FieldType::Time, FieldValue::String(s)) => parse_time(s).is_some(),
        (FieldType::Date, FieldValue::Time(_)) => true,
        (FieldType::Date, FieldValue::String(s)) => parse_date(s).is_some(),
        (FieldType::Json, _) => true,
        (FieldType::Uuid, FieldValue::String(s)) => {
            s.chars().count() == 36 && uuid::Uuid::parse_str(s).is_ok()
        }
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(crate::error::validation!(
            "field '{}' expects {}, got {}",
            field.name,
            field.field_type,
            value.kind()
        ))
    }
}

fn check_range(field: &FieldDefinition, value: &FieldValue) -> Result<()> {
    if !field.field_type.is_numeric() {
        return Ok(());
    }

    let n = match value.as_f64() {
        Some(n) => n,
        None => return Ok(()),
    };

    if let Some(min) = field.validation.min_value {
        if n < min {
            return Err(crate::error::validation!(
                "field '{}' must be at least {}",
                field.name,
                min
            ));
        }
    }

    if let Some(max) = field.validation.max_value {
        if n > max {
            return Err(crate::error::validation!(
                "field '{}' must be at most {}",
                field.name,
                max
            ));
        }
    }

    Ok(())
}

fn check_length(field: &FieldDefinition, value: &FieldValue) -> Result<()> {
    if !field.field_type.is_textual() {
        return Ok(());
    }

    let len = match value.as_str() {
        Some(s) => s.chars().count(),
        None => return Ok(()),
    };

    if let Some(min) = field.validation.min_length {
        if len < min {
            return Err(crate::error::validation!(
                "field '{}' must be at least {} characters",
                field.name,
                min
            ));
        }
    }

    if let Some(max) = field.validation.max_length {
        if len > max {
            return Err(crate::error::validation!(
                "field '{}' must be at most {} characters",
                field.name,
                max
            ));
        }
    }

    Ok(())
}

fn check_enum(field: &FieldDefinition, value: &FieldValue) -> Result<()> {
    let allowed = &field.validation.enum_values;
    if allowed.is_empty() {
        return Ok(());
    }

    let s = value.to_string();
    if allowed.iter().any(|v| *v == s) {
        Ok(())
    } else {
        Err(crate::error::validation!(
            "field '{}' must be one of [{}]",
            field.name,
            allowed.join(", ")
        ))
    }
}
