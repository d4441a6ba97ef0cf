use crate::condition::{CompareOp, Condition, ConditionValue, LogicOp};
use thiserror::Error as ThisError;

const CAST_KEYWORD: &str = "CAST";
const PART_SEPARATOR: char = ':';
const VALUE_SEPARATOR: char = '|';

///
/// ParseError
///
/// Any one malformed expression aborts the whole parse.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ParseError {
    #[error("unbalanced '{delimiter}' in '{expr}'")]
    Unbalanced { expr: String, delimiter: char },

    #[error("unexpected text after ']' in '{expr}'")]
    TrailingText { expr: String },

    #[error("missing field name in '{expr}'")]
    MissingField { expr: String },

    #[error("empty sub-condition for field '{field}'")]
    EmptySubCondition { field: String },

    #[error("unknown operator '{op}' for field '{field}'")]
    UnknownOperator { field: String, op: String },

    #[error("operator '{op}' for field '{field}' requires a value")]
    MissingValue { field: String, op: CompareOp },

    #[error("operator '{op}' for field '{field}' takes no value")]
    UnexpectedValue { field: String, op: CompareOp },

    #[error("empty value in list for operator '{op}' on field '{field}'")]
    EmptyListValue { field: String, op: CompareOp },

    #[error("BETWEEN operator requires exactly 2 values, got {found}")]
    BetweenArity { field: String, found: usize },

    #[error("field '{field}' has more than one operator")]
    DuplicateOperator { field: String },

    #[error("field '{field}' has more than one CAST")]
    DuplicateCast { field: String },

    #[error("malformed CAST '{sub}' for field '{field}'")]
    MalformedCast { field: String, sub: String },
}

/// Parse a full condition expression. Blank input yields no conditions.
pub fn parse_conditions(input: &str) -> Result<Vec<Condition>, ParseError> {
    split_top_level(input, input)?
        .into_iter()
        .filter(|expr| !expr.is_empty())
        .map(parse_expr)
        .collect()
}

// Split on commas that are not nested inside brackets or parentheses.
fn split_top_level<'a>(text: &'a str, expr: &str) -> Result<Vec<&'a str>, ParseError> {
    let mut parts = Vec::new();
    let mut brackets = 0i32;
    let mut parens = 0i32;
    let mut start = 0;

    for (i, ch) in text.char_indices() {
        match ch {
            '[' => brackets += 1,
            ']' => brackets -= 1,
            '(' => parens += 1,
            ')' => parens -= 1,
            ',' if brackets == 0 && parens == 0 => {
                parts.push(text[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }

        if brackets < 0 {
            return Err(unbalanced(expr, ']'));
        }
        if parens < 0 {
            return Err(unbalanced(expr, ')'));
        }
    }

    if brackets != 0 {
        return Err(unbalanced(expr, '['));
    }
    if parens != 0 {
        return Err(unbalanced(expr, '('));
    }
    parts.push(text[start..].trim());

    Ok(parts)
}

fn unbalanced(expr: &str, delimiter: char) -> ParseError {
    ParseError::Unbalanced {
        expr: expr.to_string(),
        delimiter,
    }
}

fn parse_expr(expr: &str) -> Result<Condition, ParseError> {
    let Some(open) = expr.find('[') else {
        if expr.contains(']') {
            return Err(unbalanced(expr, ']'));
        }
        return Ok(Condition::new(expr));
    };

    let field = expr[..open].trim();
    if field.is_empty() {
        return Err(ParseError::MissingField {
            expr: expr.to_string(),
        });
    }

    let close = matching_bracket(expr, open).ok_or_else(|| unbalanced(expr, '['))?;
    if !expr[close + 1..].trim().is_empty() {
        return Err(ParseError::TrailingText {
            expr: expr.to_string(),
        });
    }

    let mut condition = Condition::new(field);
    let body = &expr[open + 1..close];
    if body.trim().is_empty() {
        return Ok(condition);
    }

    let mut seen_op = false;
    for sub in split_top_level(body, expr)? {
        if sub.is_empty() {
            return Err(ParseError::EmptySubCondition {
                field: field.to_string(),
            });
        }
        apply_sub(&mut condition, sub, &mut seen_op)?;
    }

    Ok(condition)
}

fn matching_bracket(expr: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, ch) in expr[open..].char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }

    None
}

fn apply_sub(condition: &mut Condition, sub: &str, seen_op: &mut bool) -> Result<(), ParseError> {
    let field = condition.field.clone();
    let (head, rest) = match sub.split_once(PART_SEPARATOR) {
        Some((head, rest)) => (head.trim(), Some(rest.trim())),
        None => (sub.trim(), None),
    };

    if head.eq_ignore_ascii_case(CAST_KEYWORD) {
        let target = rest.unwrap_or_default();
        if target.is_empty() || target.contains(PART_SEPARATOR) {
            return Err(ParseError::MalformedCast {
                field,
                sub: sub.to_string(),
            });
        }
        if condition.cast.is_some() {
            return Err(ParseError::DuplicateCast { field });
        }
        condition.cast = Some(target.to_ascii_uppercase());
        return Ok(());
    }

    let op = CompareOp::from_keyword(head).ok_or_else(|| ParseError::UnknownOperator {
        field: field.clone(),
        op: head.to_string(),
    })?;
    if std::mem::replace(seen_op, true) {
        return Err(ParseError::DuplicateOperator { field });
    }
    condition.op = op;

    let (value, logic) = split_logic(op, rest);
    if let Some(logic) = logic {
        condition.logic = logic;
    }

    condition.value = parse_value(&field, op, value)?;

    Ok(())
}

// A trailing `:AND` / `:OR` is the logic operator; any other colon belongs to
// the value, so timestamps like `10:30:00` survive intact. For value-taking
// operators the first segment is always the value, even when it reads `OR`.
fn split_logic(op: CompareOp, rest: Option<&str>) -> (Option<&str>, Option<LogicOp>) {
    let Some(rest) = rest else {
        return (None, None);
    };

    // `IS NULL:OR` carries a logic operator and no value.
    if op.is_null_check()
        && let Some(logic) = LogicOp::from_keyword(rest)
    {
        return (None, Some(logic));
    }

    if let Some((value, tail)) = rest.rsplit_once(PART_SEPARATOR)
        && let Some(logic) = LogicOp::from_keyword(tail)
    {
        return (Some(value.trim()), Some(logic));
    }

    (Some(rest), None)
}

fn parse_value(
    field: &str,
    op: CompareOp,
    value: Option<&str>,
) -> Result<ConditionValue, ParseError> {
    let value = value.filter(|v| !v.is_empty());

    if op.is_null_check() {
        return match value {
            None => Ok(ConditionValue::None),
            Some(_) => Err(ParseError::UnexpectedValue {
                field: field.to_string(),
                op,
            }),
        };
    }

    let Some(value) = value else {
        return Err(ParseError::MissingValue {
            field: field.to_string(),
            op,
        });
    };

    if !op.is_multi_value() {
        return Ok(ConditionValue::Single(value.to_string()));
    }

    let values: Vec<String> = value
        .split(VALUE_SEPARATOR)
        .map(|v| v.trim().to_string())
        .collect();

    if op == CompareOp::Between && values.len() != 2 {
        return Err(ParseError::BetweenArity {
            field: field.to_string(),
            found: values.len(),
        });
    }
    if values.iter().any(String::is_empty) {
        return Err(ParseError::EmptyListValue {
            field: field.to_string(),
            op,
        });
    }

    Ok(ConditionValue::List(values))
}
