//! Helpers shared by the employer and worker repositories.
//!
//! Both tables have the same contact columns and the same search rules: text
//! matches are substring `LIKE`s with `%`/`_` escaped, and phone numbers are
//! compared with separators stripped from both sides.

use crate::errors::{Error, Result};
use sea_orm::sea_query::{Expr, LikeExpr, SimpleExpr};
use sea_orm::{ColumnTrait, Condition};
use serde::{Deserialize, Serialize};

/// Maximum number of rows returned by a filtered person search
pub const SEARCH_RESULT_LIMIT: u64 = 50;

/// Escape character for `LIKE` patterns
const LIKE_ESCAPE: char = '|';

/// Characters ignored when comparing phone numbers
const TEL_SEPARATORS: [char; 5] = ['-', ' ', '.', '(', ')'];

/// `tel` column with every separator removed, for `LIKE` comparison.
const STRIPPED_TEL_SQL: &str =
    "REPLACE(REPLACE(REPLACE(REPLACE(REPLACE(tel, '-', ''), ' ', ''), '.', ''), '(', ''), ')', '')";

/// Result of the external postcode lookup.
///
/// `zonecode`, `address` and `building_name` land in the `addr_postcode`,
/// `addr_street` and `addr_extra` columns respectively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    /// Postal code
    pub zonecode: String,
    /// Street address
    pub address: String,
    /// Building name, often empty
    pub building_name: String,
}

/// Optional filters for the person search screens. Provided fields are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonFilter {
    /// Substring of the name
    pub name: Option<String>,
    /// Digits of the phone number; separators are ignored
    pub tel: Option<String>,
    /// Substring of the `type` column
    pub kind: Option<String>,
    /// Substring of the nationality (workers only)
    pub nationality: Option<String>,
}

/// Trims a required text field and rejects it when blank.
pub(crate) fn require_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Escapes `LIKE` wildcards so the term matches literally.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, LIKE_ESCAPE | '%' | '_') {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn contains_pattern(term: &str) -> LikeExpr {
    LikeExpr::new(format!("%{}%", escape_like(term))).escape(LIKE_ESCAPE)
}

/// `column LIKE '%term%'`. `SQLite`'s `LIKE` ignores case for ASCII letters only.
pub(crate) fn contains<C: ColumnTrait>(column: C, term: &str) -> SimpleExpr {
    Expr::col(column).like(contains_pattern(term))
}

/// Removes separators from a phone number.
pub(crate) fn strip_tel(tel: &str) -> String {
    tel.chars()
        .filter(|c| !TEL_SEPARATORS.contains(c))
        .collect()
}

/// Phone substring match ignoring separators; `None` when the term has no digits left.
pub(crate) fn tel_contains(term: &str) -> Option<SimpleExpr> {
    let digits = strip_tel(term);
    if digits.is_empty() {
        return None;
    }
    Some(Expr::cust_with_values(
        format!("{STRIPPED_TEL_SQL} LIKE ? ESCAPE '{LIKE_ESCAPE}'"),
        [format!("%{}%", escape_like(&digits))],
    ))
}

/// Non-blank filter value, trimmed.
pub(crate) fn filter_term(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

/// `name OR type OR note` substring condition used by the quick search.
pub(crate) fn any_text_matches<C: ColumnTrait>(columns: [C; 3], term: &str) -> Condition {
    let mut condition = Condition::any();
    for column in columns {
        condition = condition.add(contains(column, term));
    }
    condition
}
