//! Module: condition
//! Responsibility: the condition mini-language and its parsed records.
//! Does not own: schema lookup or operator/type legality (see `compile`).
//!
//! ```text
//! conditions := expr (',' expr)*
//! expr       := name ['[' sub (',' sub)* ']']
//! sub        := 'CAST:' type
//!             | operator ':' value ['|' value]... [':' logic]
//!             | 'IS NULL' | 'IS NOT NULL'
//! ```

mod parse;


pub use parse::{ParseError, parse_conditions};

use derive_more::Display;

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum CompareOp {
    #[display("=")]
    Eq,
    #[display("!=")]
    Ne,
    #[display("<")]
    Lt,
    #[display("<=")]
    Lte,
    #[display(">")]
    Gt,
    #[display(">=")]
    Gte,
    #[display("LIKE")]
    Like,
    #[display("NOT LIKE")]
    NotLike,
    #[display("ILIKE")]
    ILike,
    #[display("CONTAINS")]
    Contains,
    #[display("NOT CONTAINS")]
    NotContains,
    #[display("IN")]
    In,
    #[display("NOT IN")]
    NotIn,
    #[display("BETWEEN")]
    Between,
    #[display("IS")]
    Is,
    #[display("IS NOT")]
    IsNot,
    #[display("IS NULL")]
    IsNull,
    #[default]
    #[display("IS NOT NULL")]
    IsNotNull,
}

impl CompareOp {
    /// Recognize an operator keyword, case- and spacing-insensitively.
    #[must_use]
    pub fn from_keyword(text: &str) -> Option<Self> {
        let normalized = text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();

        let op = match normalized.as_str() {
            "=" | "==" => Self::Eq,
            "!=" | "<>" => Self::Ne,
            "<" => Self::Lt,
            "<=" => Self::Lte,
            ">" => Self::Gt,
            ">=" => Self::Gte,
            "LIKE" => Self::Like,
            "NOT LIKE" => Self::NotLike,
            "ILIKE" => Self::ILike,
            "CONTAINS" => Self::Contains,
            "NOT CONTAINS" => Self::NotContains,
            "IN" => Self::In,
            "NOT IN" => Self::NotIn,
            "BETWEEN" => Self::Between,
            "IS" => Self::Is,
            "IS NOT" => Self::IsNot,
            "IS NULL" => Self::IsNull,
            "IS NOT NULL" => Self::IsNotNull,
            _ => return None,
        };

        Some(op)
    }

    /// Operators whose value is a `|`-separated list.
    #[must_use]
    pub const fn is_multi_value(self) -> bool {
        matches!(self, Self::In | Self::NotIn | Self::Between)
    }

    /// Null checks; they take no value and are legal on every type.
    #[must_use]
    pub const fn is_null_check(self) -> bool {
        matches!(self, Self::IsNull | Self::IsNotNull)
    }

    #[must_use]
    pub const fn is_pattern_match(self) -> bool {
        matches!(self, Self::Like | Self::NotLike | Self::ILike)
    }
}

///
/// LogicOp
/// How a field's clause joins the clause before it.
///

#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, PartialEq)]
pub enum LogicOp {
    #[default]
    #[display("AND")]
    And,
    #[display("OR")]
    Or,
}

impl LogicOp {
    #[must_use]
    pub fn from_keyword(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "AND" => Some(Self::And),
            "OR" => Some(Self::Or),
            _ => None,
        }
    }
}

///
/// ConditionValue
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum ConditionValue {
    #[default]
    None,
    Single(String),
    List(Vec<String>),
}

///
/// Condition
///
/// One parsed field expression. A bare field name yields the default:
/// `IS NOT NULL`, no value, no cast, joined with `AND`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: CompareOp,
    pub value: ConditionValue,
    pub cast: Option<String>,
    pub logic: LogicOp,
}

impl Condition {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: CompareOp::default(),
            value: ConditionValue::None,
            cast: None,
            logic: LogicOp::default(),
        }
    }

    /// Output alias for this field: dots become underscores and anything
    /// outside `[A-Za-z0-9_]` is dropped.
    #[must_use]
    pub fn alias(&self) -> String {
        let alias: String = self
            .field
            .chars()
            .filter_map(|c| match c {
                '.' => Some('_'),
                c if c.is_ascii_alphanumeric() || c == '_' => Some(c),
                _ => None,
            })
            .collect();

        if alias.is_empty() {
            "field".to_string()
        } else {
            alias
        }
    }
}
