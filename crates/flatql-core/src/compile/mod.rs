//! Module: compile
//! Responsibility: emit the final query text from resolved conditions and a
//! flatten plan, enforcing cast and operator rules.
//! Does not own: field resolution or flatten ordering.
//! Boundary: all literal text goes through `sanitize`.

mod rules;


pub use rules::{CastType, operator_allowed};

use crate::{
    condition::{CompareOp, Condition, ConditionValue},
    flatten::FlattenPlan,
    obs::sink::{MetricsEvent, record},
    resolve::{ResolvedField, ResolvedPath},
    sanitize::{
        SanitizeError, cast_value, cast_values, escape_literal, is_bare_identifier, quote_identifier,
        quote_literal,
    },
    schema::{TypeCategory, path},
};
use thiserror::Error as ThisError;

///
/// CompileError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CompileError {
    #[error("Invalid operator '{op}' for field type '{category}'")]
    InvalidOperator { op: CompareOp, category: TypeCategory },

    #[error("Invalid cast type: {cast}")]
    InvalidCastType { cast: String },

    #[error(transparent)]
    InvalidValue(#[from] SanitizeError),

    #[error("operator '{op}' on field '{field}' received a value of the wrong shape")]
    MalformedValue { field: String, op: CompareOp },

    #[error("array path '{path}' has no lateral expansion")]
    UnplannedArray { path: String },

    #[error("no field conditions provided")]
    NoConditions,

    #[error("column '{column}' is not a plain identifier")]
    InvalidColumn { column: String },
}

///
/// CompiledField
/// Select entries and the grouped filter clause for one condition.
///

struct CompiledField {
    select: Vec<String>,
    clause: Option<String>,
}

/// Compile one query.
///
/// `fields` pairs every parsed condition with its resolution, in input order.
/// `plan` must cover every array any candidate sits under.
pub fn compile(
    source: &str,
    column: &str,
    fields: &[(Condition, ResolvedField)],
    plan: &FlattenPlan,
) -> Result<String, CompileError> {
    if fields.is_empty() {
        return Err(CompileError::NoConditions);
    }

    if !is_bare_identifier(column) {
        return Err(CompileError::InvalidColumn {
            column: column.to_string(),
        });
    }

    let mut select: Vec<String> = Vec::new();
    let mut filters: Vec<String> = Vec::new();
    let mut ambiguous = 0u64;

    for (condition, resolved) in fields {
        if resolved.is_ambiguous() {
            ambiguous += 1;
        }

        let compiled = compile_field(column, condition, resolved, plan)?;
        for entry in compiled.select {
            if !select.contains(&entry) {
                select.push(entry);
            }
        }

        // The first clause is unconditioned; later ones carry their own connective.
        if let Some(clause) = compiled.clause {
            if filters.is_empty() {
                filters.push(clause);
            } else {
                filters.push(format!("{} {clause}", condition.logic));
            }
        }
    }

    let mut sql = format!("SELECT {}\nFROM {}", select.join(", "), quote_identifier(source));
    for entry in plan.iter() {
        sql.push('\n');
        sql.push_str(&entry.render(column));
    }
    if !filters.is_empty() {
        sql.push_str("\nWHERE ");
        sql.push_str(&filters.join(" "));
    }
    sql.push(';');

    tracing::debug!(
        fields = fields.len(),
        flattens = plan.len(),
        ambiguous,
        "compiled query"
    );
    record(MetricsEvent::Compiled {
        flattens: plan.len() as u64,
        ambiguous_fields: ambiguous,
    });

    Ok(sql)
}

fn compile_field(
    column: &str,
    condition: &Condition,
    resolved: &ResolvedField,
    plan: &FlattenPlan,
) -> Result<CompiledField, CompileError> {
    let cast = condition
        .cast
        .as_deref()
        .map(|cast| {
            CastType::parse(cast).ok_or_else(|| CompileError::InvalidCastType {
                cast: cast.to_string(),
            })
        })
        .transpose()?;

    let base_alias = condition.alias();
    let mut select = Vec::with_capacity(resolved.candidates.len());
    let mut clauses = Vec::with_capacity(resolved.candidates.len());

    for (index, candidate) in resolved.candidates.iter().enumerate() {
        let access = value_access(column, candidate, plan)?;
        let (expr, category) = match cast {
            Some(cast) => (format!("CAST({access} AS {cast})"), cast.category()),
            None => (access.clone(), candidate.kind.category()),
        };

        let alias = if resolved.is_ambiguous() {
            format!("{base_alias}_{}", index + 1)
        } else {
            base_alias.clone()
        };
        select.push(format!("{expr} as {alias}"));
        clauses.push(filter_clause(&expr, &access, condition, category)?);
    }

    let clause = match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => Some(format!("({})", clauses.join(" OR "))),
    };

    Ok(CompiledField { select, clause })
}

// `<column>:<path>` at the root, otherwise element access on the deepest
// enclosing array's alias.
fn value_access(
    column: &str,
    candidate: &ResolvedPath,
    plan: &FlattenPlan,
) -> Result<String, CompileError> {
    let Some(deepest) = candidate.array_hierarchy.last() else {
        return Ok(format!("{column}:{}", escape_literal(&candidate.path)));
    };

    let alias = plan
        .alias_of(deepest)
        .ok_or_else(|| CompileError::UnplannedArray {
            path: deepest.clone(),
        })?;

    Ok(match path::relative_to(&candidate.path, deepest) {
        Some(suffix) => format!("{alias}.value:{}", escape_literal(suffix)),
        None => format!("{alias}.value"),
    })
}

fn filter_clause(
    expr: &str,
    access: &str,
    condition: &Condition,
    category: TypeCategory,
) -> Result<String, CompileError> {
    let op = condition.op;
    if op.is_null_check() {
        return Ok(format!("{expr} {op}"));
    }
    if !operator_allowed(category, op) {
        return Err(CompileError::InvalidOperator { op, category });
    }

    let clause = match op {
        CompareOp::Between => {
            let [low, high] = pair(condition)?;
            format!(
                "{expr} BETWEEN {} AND {}",
                cast_value(low, category)?,
                cast_value(high, category)?
            )
        }

        CompareOp::In | CompareOp::NotIn => {
            format!("{expr} {op} {}", cast_values(list(condition)?, category)?)
        }

        // Pattern matching always runs against the text rendering.
        CompareOp::Like | CompareOp::NotLike | CompareOp::ILike => {
            let value = single(condition)?;
            format!(
                "CAST({access} AS STRING) {op} {}",
                cast_value(value, category)?
            )
        }

        CompareOp::Contains => {
            format!("CONTAINS({expr}, {})", quote_literal(single(condition)?))
        }
        CompareOp::NotContains => format!(
            "NOT CONTAINS({expr}, {})",
            quote_literal(single(condition)?)
        ),

        CompareOp::Is | CompareOp::IsNot => {
            let value = single(condition)?;
            if value.eq_ignore_ascii_case("NULL") {
                format!("{expr} {op} NULL")
            } else {
                format!("{expr} {op} {}", cast_value(value, category)?)
            }
        }

        _ => format!("{expr} {op} {}", cast_value(single(condition)?, category)?),
    };

    Ok(clause)
}

fn malformed(condition: &Condition) -> CompileError {
    CompileError::MalformedValue {
        field: condition.field.clone(),
        op: condition.op,
    }
}

fn single(condition: &Condition) -> Result<&str, CompileError> {
    match &condition.value {
        ConditionValue::Single(value) => Ok(value),
        _ => Err(malformed(condition)),
    }
}

fn list(condition: &Condition) -> Result<&[String], CompileError> {
    match &condition.value {
        ConditionValue::List(values) if !values.is_empty() => Ok(values),
        _ => Err(malformed(condition)),
    }
}

fn pair(condition: &Condition) -> Result<[&str; 2], CompileError> {
    match list(condition)? {
        [low, high] => Ok([low.as_str(), high.as_str()]),
        _ => Err(malformed(condition)),
    }
}
