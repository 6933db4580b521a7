//! JSON import and export.
//!
//! Objects map to KVCs and arrays to lists. Numbers come back as the
//! narrowest of Integer, Long and Float that holds them. Error values export
//! as `{"error-type": ..., "message": ...}` objects.

use serde_json::{Map, Number as JsonNumber, Value as Json};

use crate::error::{Error, EvalError, Result};
use crate::kvc::Kvc;
use crate::value::Value;

pub fn to_json(value: &Value) -> Result<Json> {
    Ok(match value {
        Value::Null => Json::Null,

        Value::Boolean(b) => Json::Bool(*b),

        Value::Integer(i) => Json::from(*i),

        Value::Long(l) => Json::from(*l),

        Value::Float(f) => JsonNumber::from_f64(*f)
            .map(Json::Number)
            .ok_or_else(|| EvalError::type_mismatch(format!("{} has no JSON form", f)))?,

        Value::String(s) => Json::String(s.clone()),

        Value::List(items) => Json::Array(items.iter().map(to_json).collect::<Result<_>>()?),

        Value::Kvc(kvc) => {
            let mut object = Map::new();
            for (key, item) in kvc.entries()? {
                object.insert(key, to_json(&item)?);
            }
            Json::Object(object)
        }

        Value::Error(e) => {
            let mut object = Map::new();
            object.insert("error-type".into(), Json::String(e.error_type.clone()));
            object.insert("message".into(), Json::String(e.message.clone()));
            Json::Object(object)
        }

        Value::Function(f) => {
            return Err(EvalError::type_mismatch(format!(
                "function '{}' has no JSON form",
                f.name()
            )))
        }
    })
}

pub fn from_json(json: &Json) -> Value {
    match json {
        Json::Null => Value::Null,

        Json::Bool(b) => Value::Boolean(*b),

        Json::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(l), _) => match i32::try_from(l) {
                Ok(i) => Value::Integer(i),
                Err(_) => Value::Long(l),
            },
            (None, Some(f)) => Value::Float(f),
            (None, None) => Value::Null,
        },

        Json::String(s) => Value::String(s.clone()),

        Json::Array(items) => Value::list(items.iter().map(from_json).collect()),

        Json::Object(object) => Value::Kvc(Kvc::from_values(
            object
                .iter()
                .map(|(key, item)| (key.clone(), from_json(item)))
                .collect(),
        )),
    }
}

/// Parse JSON text into a value.
pub fn parse_json(text: &str) -> std::result::Result<Value, Error> {
    let json: Json = serde_json::from_str(text)?;
    Ok(from_json(&json))
}

/// Serialize a value as pretty-printed JSON text.
pub fn to_json_string(value: &Value) -> std::result::Result<String, Error> {
    let json = to_json(value)?;
    Ok(serde_json::to_string_pretty(&json)?)
}
