//! Module: compile::rules
//! Responsibility: cast allow-list and operator legality per type category.
//! Does not own: clause rendering or value validation.

use crate::{condition::CompareOp, schema::TypeCategory};
use derive_more::Display;

///
/// CastType
///
/// Closed allow-list of cast targets. Anything else is rejected before it
/// reaches generated text.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum CastType {
    #[display("NUMBER")]
    Number,
    #[display("INTEGER")]
    Integer,
    #[display("INT")]
    Int,
    #[display("FLOAT")]
    Float,
    #[display("DOUBLE")]
    Double,
    #[display("DECIMAL")]
    Decimal,
    #[display("VARCHAR")]
    Varchar,
    #[display("STRING")]
    String,
    #[display("TEXT")]
    Text,
    #[display("CHAR")]
    Char,
    #[display("BOOLEAN")]
    Boolean,
    #[display("DATE")]
    Date,
    #[display("TIMESTAMP")]
    Timestamp,
    #[display("TIME")]
    Time,
    #[display("VARIANT")]
    Variant,
    #[display("ARRAY")]
    Array,
    #[display("OBJECT")]
    Object,
    #[display("BINARY")]
    Binary,
}

impl CastType {
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let cast = match text.trim().to_ascii_uppercase().as_str() {
            "NUMBER" => Self::Number,
            "INTEGER" => Self::Integer,
            "INT" => Self::Int,
            "FLOAT" => Self::Float,
            "DOUBLE" => Self::Double,
            "DECIMAL" => Self::Decimal,
            "VARCHAR" => Self::Varchar,
            "STRING" => Self::String,
            "TEXT" => Self::Text,
            "CHAR" => Self::Char,
            "BOOLEAN" => Self::Boolean,
            "DATE" => Self::Date,
            "TIMESTAMP" => Self::Timestamp,
            "TIME" => Self::Time,
            "VARIANT" => Self::Variant,
            "ARRAY" => Self::Array,
            "OBJECT" => Self::Object,
            "BINARY" => Self::Binary,
            _ => return None,
        };

        Some(cast)
    }

    /// Category that governs operators and literals once this cast applies.
    #[must_use]
    pub const fn category(self) -> TypeCategory {
        match self {
            Self::Number | Self::Integer | Self::Int | Self::Float | Self::Double | Self::Decimal => {
                TypeCategory::Numeric
            }
            Self::Varchar | Self::String | Self::Text | Self::Char => TypeCategory::String,
            Self::Boolean => TypeCategory::Boolean,
            Self::Date | Self::Timestamp | Self::Time => TypeCategory::DateTime,
            Self::Array => TypeCategory::Array,
            Self::Object => TypeCategory::Object,
            Self::Variant | Self::Binary => TypeCategory::Variant,
        }
    }
}

///
/// OperatorRule
///

#[derive(Clone, Copy, Debug)]
struct OperatorRule {
    category: TypeCategory,
    ops: &'static [CompareOp],
}

const OPERATOR_TABLE: &[OperatorRule] = &[
    OperatorRule {
        category: TypeCategory::Numeric,
        ops: &[
            CompareOp::Lt,
            CompareOp::Gt,
            CompareOp::Lte,
            CompareOp::Gte,
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::In,
            CompareOp::NotIn,
            CompareOp::Between,
        ],
    },
    OperatorRule {
        category: TypeCategory::String,
        ops: &[
            CompareOp::Like,
            CompareOp::NotLike,
            CompareOp::ILike,
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::In,
            CompareOp::NotIn,
            CompareOp::Contains,
            CompareOp::NotContains,
        ],
    },
    OperatorRule {
        category: TypeCategory::DateTime,
        ops: &[
            CompareOp::Lt,
            CompareOp::Gt,
            CompareOp::Lte,
            CompareOp::Gte,
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Between,
        ],
    },
    OperatorRule {
        category: TypeCategory::Boolean,
        ops: &[CompareOp::Eq, CompareOp::Ne, CompareOp::Is, CompareOp::IsNot],
    },
    OperatorRule {
        category: TypeCategory::Variant,
        ops: &[
            CompareOp::Lt,
            CompareOp::Gt,
            CompareOp::Lte,
            CompareOp::Gte,
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Is,
            CompareOp::IsNot,
            CompareOp::Like,
            CompareOp::NotLike,
            CompareOp::Contains,
            CompareOp::NotContains,
            CompareOp::In,
            CompareOp::NotIn,
            CompareOp::Between,
        ],
    },
    OperatorRule {
        category: TypeCategory::Array,
        ops: &[
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Contains,
            CompareOp::NotContains,
        ],
    },
    OperatorRule {
        category: TypeCategory::Object,
        ops: &[
            CompareOp::Eq,
            CompareOp::Ne,
            CompareOp::Is,
            CompareOp::IsNot,
            CompareOp::Contains,
            CompareOp::NotContains,
        ],
    },
];

/// Whether `op` may be applied to a value of `category`.
///
/// Null checks are legal everywhere.
#[must_use]
pub fn operator_allowed(category: TypeCategory, op: CompareOp) -> bool {
    if op.is_null_check() {
        return true;
    }

    OPERATOR_TABLE
        .iter()
        .find(|rule| rule.category == category)
        .is_some_and(|rule| rule.ops.contains(&op))
}
