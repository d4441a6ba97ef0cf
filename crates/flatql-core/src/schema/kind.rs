use chrono::{DateTime, NaiveDate, NaiveDateTime};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::Value;

///
/// JsonKind
///
/// Closed set of kind tags assigned once while walking a sampled document.
/// `Variant` never comes from a single observation; it is the result of
/// merging two conflicting concrete kinds.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum JsonKind {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Temporal,
    Array,
    Object,
    Variant,
}

impl JsonKind {
    /// Classify one JSON node.
    #[must_use]
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Boolean,
            Value::Number(n) if n.is_f64() => Self::Float,
            Value::Number(_) => Self::Integer,
            Value::String(s) if looks_temporal(s) => Self::Temporal,
            Value::String(_) => Self::String,
            Value::Array(_) => Self::Array,
            Value::Object(_) => Self::Object,
        }
    }

    /// Merge two observations of the same path.
    ///
    /// Null yields to the other side and mixed integers and floats stay
    /// numeric as `Float`. Any other disagreement widens to `Variant`.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Null, other) => other,
            (this, Self::Null) => this,
            (a, b) if a.same(b) => a,
            (Self::Integer | Self::Float, Self::Integer | Self::Float) => Self::Float,
            _ => Self::Variant,
        }
    }

    #[must_use]
    pub const fn category(self) -> TypeCategory {
        match self {
            Self::Integer | Self::Float => TypeCategory::Numeric,
            Self::String => TypeCategory::String,
            Self::Temporal => TypeCategory::DateTime,
            Self::Boolean => TypeCategory::Boolean,
            Self::Array => TypeCategory::Array,
            Self::Object => TypeCategory::Object,
            Self::Null | Self::Variant => TypeCategory::Variant,
        }
    }

    /// Warehouse type name used when describing a schema.
    #[must_use]
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Boolean => "BOOLEAN",
            Self::Integer | Self::Float => "NUMBER",
            Self::String => "VARCHAR",
            Self::Temporal => "TIMESTAMP",
            Self::Array => "ARRAY",
            Self::Object => "OBJECT",
            Self::Null | Self::Variant => "VARIANT",
        }
    }

    // const-context equality; derived PartialEq is not const.
    const fn same(self, other: Self) -> bool {
        self as u8 == other as u8
    }
}

// ISO dates and RFC 3339 / space-separated timestamps.
fn looks_temporal(s: &str) -> bool {
    let s = s.trim();
    if s.len() < 10 || !s.as_bytes()[0].is_ascii_digit() {
        return false;
    }

    DateTime::parse_from_rfc3339(s).is_ok()
        || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").is_ok()
        || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").is_ok()
}

///
/// TypeCategory
///
/// Coarse family used for operator legality and literal rendering.
/// Derived from an inferred `JsonKind` or from an explicit cast target.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum TypeCategory {
    Numeric,
    String,
    DateTime,
    Boolean,
    Variant,
    Array,
    Object,
}
