//! Named variable table that source variants are populated from.
//!
//! Names are unique; `add_variable` overwrites. Lookups either require the
//! name (`evaluate`) or fall back to a caller default (`evaluate_or`).

use super::geometry::Vec3;
use crate::domain::SourceError;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Double(f64),
    Int(i64),
    Size(usize),
    Text(String),
    Vector(Vec3),
}

impl Value {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Double(_) => "double",
            Self::Int(_) => "int",
            Self::Size(_) => "size_t",
            Self::Text(_) => "string",
            Self::Vector(_) => "Vec3",
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Double(value) => write!(f, "{}", value),
            Self::Int(value) => write!(f, "{}", value),
            Self::Size(value) => write!(f, "{}", value),
            Self::Text(value) => f.write_str(value),
            Self::Vector(value) => write!(f, "{}", value),
        }
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Double(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Size(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Vec3> for Value {
    fn from(value: Vec3) -> Self {
        Self::Vector(value)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValueError {
    #[error("required variable '{name}' is not defined")]
    Missing { name: String },
    #[error("variable '{name}' holds {found} '{value}' which cannot be read as {expected}")]
    Conversion {
        name: String,
        found: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("variable table JSON is invalid: {0}")]
    Json(String),
}

impl From<ValueError> for SourceError {
    fn from(error: ValueError) -> Self {
        let placeholder = match &error {
            ValueError::Missing { .. } => "CONFIG.MISSING_VARIABLE",
            ValueError::Conversion { .. } => "CONFIG.VARIABLE_TYPE",
            ValueError::Json(_) => "CONFIG.VARIABLE_TABLE",
        };
        SourceError::configuration(placeholder, error.to_string())
    }
}

/// Typed read of one table value.
pub trait FromValue: Sized {
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "double";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Double(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Size(v) => Some(*v as f64),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            Value::Size(v) => i64::try_from(*v).ok(),
            Value::Double(v) if v.fract() == 0.0 && v.is_finite() => Some(*v as i64),
            _ => None,
        }
    }
}

impl FromValue for i32 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        i64::from_value(value).and_then(|v| i32::try_from(v).ok())
    }
}

impl FromValue for usize {
    const EXPECTED: &'static str = "size_t";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Size(v) => Some(*v),
            Value::Int(v) => usize::try_from(*v).ok(),
            Value::Double(v) if v.fract() == 0.0 && *v >= 0.0 && v.is_finite() => {
                Some(*v as usize)
            }
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Text(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for Vec3 {
    const EXPECTED: &'static str = "Vec3";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Vector(v) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueTable {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.index.get(&name) {
            Some(&slot) => self.entries[slot].1 = value,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, value));
            }
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&slot| &self.entries[slot].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn evaluate<T: FromValue>(&self, name: &str) -> Result<T, ValueError> {
        let value = self.get(name).ok_or_else(|| ValueError::Missing {
            name: name.to_string(),
        })?;
        convert(name, value)
    }

    pub fn evaluate_or<T: FromValue>(&self, name: &str, default: T) -> Result<T, ValueError> {
        match self.get(name) {
            Some(value) => convert(name, value),
            None => Ok(default),
        }
    }

    /// Flat JSON object: numbers, strings and three-element number arrays.
    pub fn from_json_str(source: &str) -> Result<Self, ValueError> {
        let parsed: serde_json::Value =
            serde_json::from_str(source).map_err(|error| ValueError::Json(error.to_string()))?;
        let object = parsed
            .as_object()
            .ok_or_else(|| ValueError::Json("top level must be an object".to_string()))?;

        let mut table = Self::new();
        for (name, raw) in object {
            table.add_variable(name.clone(), json_value(name, raw)?);
        }
        Ok(table)
    }
}

fn convert<T: FromValue>(name: &str, value: &Value) -> Result<T, ValueError> {
    T::from_value(value).ok_or_else(|| ValueError::Conversion {
        name: name.to_string(),
        found: value.type_name(),
        value: value.to_string(),
        expected: T::EXPECTED,
    })
}

fn json_value(name: &str, raw: &serde_json::Value) -> Result<Value, ValueError> {
    let unsupported = || ValueError::Json(format!("variable '{}' has unsupported value {}", name, raw));
    match raw {
        serde_json::Value::Number(number) => {
            if let Some(value) = number.as_i64() {
                Ok(Value::Int(value))
            } else {
                number.as_f64().map(Value::Double).ok_or_else(unsupported)
            }
        }
        serde_json::Value::String(text) => Ok(Value::Text(text.clone())),
        serde_json::Value::Array(items) if items.len() == 3 => {
            let mut components = [0.0; 3];
            for (slot, item) in components.iter_mut().zip(items) {
                *slot = item.as_f64().ok_or_else(unsupported)?;
            }
            Ok(Value::Vector(Vec3::from(components)))
        }
        _ => Err(unsupported()),
    }
}

#[cfg(test)]
mod tests {
    use super::{Value, ValueError, ValueTable};
    use crate::common::geometry::Vec3;

    #[test]
    fn evaluate_requires_presence_and_evaluate_or_defaults() {
        let mut table = ValueTable::new();
        table.add_variable("beamXWidth", 5.887);

        assert_eq!(table.evaluate::<f64>("beamXWidth"), Ok(5.887));
        assert_eq!(table.evaluate_or::<f64>("beamZWidth", 1.0), Ok(1.0));
        assert!(matches!(
            table.evaluate::<f64>("beamZWidth"),
            Err(ValueError::Missing { .. })
        ));
    }

    #[test]
    fn numeric_values_convert_between_int_and_double() {
        let mut table = ValueTable::new();
        table.add_variable("count", 4_i64);
        table.add_variable("whole", 3.0);
        table.add_variable("half", 2.5);
        table.add_variable("negative", -1_i64);

        assert_eq!(table.evaluate::<f64>("count"), Ok(4.0));
        assert_eq!(table.evaluate::<usize>("whole"), Ok(3));
        assert!(table.evaluate::<i64>("half").is_err());
        assert!(table.evaluate::<usize>("negative").is_err());
        assert!(table.evaluate::<String>("count").is_err());
    }

    #[test]
    fn add_variable_overwrites_without_reordering() {
        let mut table = ValueTable::new();
        table.add_variable("a", 1.0);
        table.add_variable("b", "proton");
        table.add_variable("a", 2.0);

        assert_eq!(table.len(), 2);
        assert_eq!(table.names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(table.get("a"), Some(&Value::Double(2.0)));
    }

    #[test]
    fn json_tables_load_numbers_strings_and_vectors() {
        let table = ValueTable::from_json_str(
            r#"{ "srcNE": 2, "srcEnergy0": 1.5, "srcParticleType": "neutron", "srcAxis": [0, 1, 0] }"#,
        )
        .expect("table should parse");

        assert_eq!(table.evaluate::<usize>("srcNE"), Ok(2));
        assert_eq!(table.evaluate::<f64>("srcEnergy0"), Ok(1.5));
        assert_eq!(
            table.evaluate::<String>("srcParticleType").as_deref(),
            Ok("neutron")
        );
        assert_eq!(table.evaluate::<Vec3>("srcAxis"), Ok(Vec3::Y));
    }

    #[test]
    fn json_rejects_nested_objects() {
        let error = ValueTable::from_json_str(r#"{ "bad": { "x": 1 } }"#).expect_err("nested");
        assert!(matches!(error, ValueError::Json(_)));
    }
}
