//! Module: sanitize
//! Responsibility: make user-supplied text safe to embed in generated query text.
//! Does not own: deciding which category a value belongs to.
//! Boundary: every stage that emits literal text calls through here.

use crate::schema::TypeCategory;
use thiserror::Error as ThisError;

///
/// SanitizeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SanitizeError {
    #[error("Invalid numeric value: {value}")]
    InvalidNumeric { value: String },

    #[error("Invalid boolean value: {value}")]
    InvalidBoolean { value: String },
}

/// Double embedded quotes and drop control characters and statement terminators.
#[must_use]
pub fn escape_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\'' => out.push_str("''"),
            '"' => out.push_str("\"\""),
            ';' => {}
            c if (c as u32) < 0x20 => {}
            c => out.push(c),
        }
    }

    out
}

/// Quote an identifier such as the source name.
#[must_use]
pub fn quote_identifier(text: &str) -> String {
    format!("\"{}\"", escape_literal(text))
}

/// True for an unquoted identifier: `[A-Za-z_][A-Za-z0-9_$]*`.
#[must_use]
pub fn is_bare_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_')
        && chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '$')
}

/// Render a string literal.
#[must_use]
pub fn quote_literal(text: &str) -> String {
    format!("'{}'", escape_literal(text))
}

/// Render one raw value as a literal of `category`.
///
/// Numeric and boolean input is validated, never coerced.
pub fn cast_value(value: &str, category: TypeCategory) -> Result<String, SanitizeError> {
    match category {
        TypeCategory::Numeric => {
            let trimmed = value.trim();
            match trimmed.parse::<f64>() {
                Ok(n) if n.is_finite() => Ok(trimmed.to_string()),
                _ => Err(SanitizeError::InvalidNumeric {
                    value: value.to_string(),
                }),
            }
        }

        TypeCategory::Boolean => {
            let lowered = value.trim().to_ascii_lowercase();
            match lowered.as_str() {
                "true" | "false" => Ok(lowered),
                _ => Err(SanitizeError::InvalidBoolean {
                    value: value.to_string(),
                }),
            }
        }

        TypeCategory::DateTime => Ok(format!("TO_TIMESTAMP({})", quote_literal(value))),

        TypeCategory::String | TypeCategory::Variant | TypeCategory::Array | TypeCategory::Object => {
            Ok(quote_literal(value))
        }
    }
}

/// Render a value list as a parenthesized literal list, casting each element.
pub fn cast_values(values: &[String], category: TypeCategory) -> Result<String, SanitizeError> {
    let rendered = values
        .iter()
        .map(|value| cast_value(value, category))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(format!("({})", rendered.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn escape_doubles_quotes_and_strips_terminators() {
        assert_eq!(escape_literal("O'Brien"), "O''Brien");
        assert_eq!(escape_literal(r#"say "hi""#), r#"say ""hi"""#);
        assert_eq!(escape_literal("a;DROP TABLE t;\n--"), "aDROP TABLE t--");
        assert_eq!(escape_literal("tab\there"), "tabhere");
    }

    #[test]
    fn bare_identifiers_reject_query_syntax() {
        for ok in ["DOC", "_raw", "payload_v2", "col$1"] {
            assert!(is_bare_identifier(ok), "{ok}");
        }
        for bad in ["", "1doc", "DOC --", "DOC:name", "a b", "DOC;", "\"DOC\"", "dóc"] {
            assert!(!is_bare_identifier(bad), "{bad}");
        }
    }

    #[test]
    fn numeric_values_are_validated_not_coerced() {
        assert_eq!(cast_value(" 42 ", TypeCategory::Numeric).unwrap(), "42");
        assert_eq!(cast_value("-1.5e3", TypeCategory::Numeric).unwrap(), "-1.5e3");

        for bad in ["abc", "NaN", "inf", "1 OR 1=1", ""] {
            assert_eq!(
                cast_value(bad, TypeCategory::Numeric),
                Err(SanitizeError::InvalidNumeric {
                    value: bad.to_string()
                }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn boolean_values_lower_case_and_reject_other_text() {
        assert_eq!(cast_value("TRUE", TypeCategory::Boolean).unwrap(), "true");
        assert_eq!(cast_value("False", TypeCategory::Boolean).unwrap(), "false");
        assert!(matches!(
            cast_value("true OR 1=1", TypeCategory::Boolean),
            Err(SanitizeError::InvalidBoolean { .. })
        ));
    }

    #[test]
    fn temporal_values_wrap_in_timestamp_constructor() {
        assert_eq!(
            cast_value("2024-01-31", TypeCategory::DateTime).unwrap(),
            "TO_TIMESTAMP('2024-01-31')"
        );
    }

    #[test]
    fn list_values_cast_per_element() {
        let values = vec!["10".to_string(), "30".to_string()];
        assert_eq!(
            cast_values(&values, TypeCategory::Numeric).unwrap(),
            "(10, 30)"
        );

        let names = vec!["O'Brien".to_string(), "Smith".to_string()];
        assert_eq!(
            cast_values(&names, TypeCategory::String).unwrap(),
            "('O''Brien', 'Smith')"
        );

        let mixed = vec!["1".to_string(), "x".to_string()];
        assert!(cast_values(&mixed, TypeCategory::Numeric).is_err());
    }

    #[test]
    fn identifiers_are_double_quoted() {
        assert_eq!(quote_identifier("ORDERS"), "\"ORDERS\"");
        assert_eq!(quote_identifier("a\"b;"), "\"a\"\"b\"");
    }

    // Every quote in the literal body comes in a doubled pair.
    fn quotes_are_paired(body: &str, quote: char) -> bool {
        let mut run = 0usize;
        for ch in body.chars() {
            if ch == quote {
                run += 1;
            } else {
                if run % 2 != 0 {
                    return false;
                }
                run = 0;
            }
        }
        run % 2 == 0
    }

    proptest! {
        #[test]
        fn escaped_text_never_carries_terminators_or_lone_quotes(input in any::<String>()) {
            let escaped = escape_literal(&input);

            prop_assert!(!escaped.contains(';'));
            prop_assert!(escaped.chars().all(|c| c as u32 >= 0x20));
            prop_assert!(quotes_are_paired(&escaped, '\''));
            prop_assert!(quotes_are_paired(&escaped, '"'));
        }

        #[test]
        fn string_literals_are_always_closed(input in any::<String>()) {
            let literal = cast_value(&input, TypeCategory::String).unwrap();

            prop_assert!(literal.starts_with('\'') && literal.ends_with('\''));
            prop_assert!(quotes_are_paired(&literal[1..literal.len() - 1], '\''));
        }
    }
}
