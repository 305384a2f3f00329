//! Best-effort SQL classification for labelling datastore spans.
//!
//! Extracts an operation verb and, where the statement manipulates a named
//! table, the primary table name. The matching is deliberately loose: span
//! labels only need to be good enough for dashboards, so an unrecognized
//! verb yields an empty operation rather than an error.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::params::{flatten, BindValue, ParamValue};

// A table reference is either a bare token or the same token wrapped in
// one level of [...] / (...) / {...}.
const BASIC_TABLE: &str = r"[^)(\]\[\}\{\s,;]+";

fn table_pattern() -> String {
    let enclosed = [r"[\[\(\{]", r"\s*", BASIC_TABLE, r"\s*", r"[\]\)\}]"].concat();
    [r"(\s+", BASIC_TABLE, r"|\s*", enclosed.as_str(), r")"].concat()
}

// Table-extraction patterns, compiled once. All are case-insensitive with
// `.` matching newlines so a statement is treated as one blob.
static FROM_TABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    let tp = table_pattern();
    Regex::new(&[r"(?is)^.*?\sfrom", tp.as_str()].concat()).unwrap()
});

static INSERT_TABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    // `into?` also accepts the bare `in` form; kept as-is so labels line up
    // with what drivers emitting abbreviated INSERT syntax produce.
    let tp = table_pattern();
    Regex::new(&[r"(?is)^.*?\sinto?", tp.as_str()].concat()).unwrap()
});

static UPDATE_TABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    let tp = table_pattern();
    Regex::new(
        &[
            r"(?is)^update(?:\s+(?:low_priority|ignore|or|rollback|abort|replace|fail|only))*",
            tp.as_str(),
        ]
        .concat(),
    )
    .unwrap()
});

static FIRST_WORD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+").unwrap());

static BLOCK_COMMENT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)/\*.*?\*/").unwrap());

static LINE_COMMENT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)(?:--|#).*?$").unwrap());

static LEADING_JUNK_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\s;]*").unwrap());

static QUOTING_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\s`"'\(\)\{\}\[\]]*"#).unwrap());

/// Returns the table-extraction regex for a recognized verb, or `None` for
/// verbs that carry no table reference.
fn table_regex(operation: &str) -> Option<&'static Regex> {
    match operation {
        "select" | "delete" => Some(&FROM_TABLE_REGEX),
        "insert" => Some(&INSERT_TABLE_REGEX),
        "update" => Some(&UPDATE_TABLE_REGEX),
        _ => None,
    }
}

fn is_recognized_verb(operation: &str) -> bool {
    matches!(
        operation,
        "select"
            | "insert"
            | "update"
            | "delete"
            | "call"
            | "create"
            | "drop"
            | "show"
            | "set"
            | "exec"
            | "execute"
            | "alter"
            | "commit"
            | "rollback"
    )
}

/// Normalize a captured table token.
///
/// Strips quoting, bracketing and whitespace characters wherever they
/// appear, then drops a leading schema qualifier (`db.table` becomes
/// `table`). Idempotent over its own output.
pub fn clean_table_name(raw: &str) -> String {
    let s = QUOTING_REGEX.replace_all(raw, "");
    match s.find('.') {
        Some(idx) if idx > 0 => s[idx + 1..].to_string(),
        _ => s.into_owned(),
    }
}

/// Classify a raw SQL statement into `(operation, collection)`.
///
/// Comments and leading whitespace/semicolons are ignored. An unrecognized
/// leading verb yields two empty strings; a recognized verb without a
/// matchable table yields an empty collection.
pub fn classify_statement(sql: &str) -> (String, String) {
    let s = BLOCK_COMMENT_REGEX.replace_all(sql, "");
    let s = LINE_COMMENT_REGEX.replace_all(&s, "");
    let s = LEADING_JUNK_REGEX.replace(&s, "");

    let operation = match FIRST_WORD_REGEX.find(&s) {
        Some(m) => m.as_str().to_lowercase(),
        None => return (String::new(), String::new()),
    };
    if !is_recognized_verb(&operation) {
        return (String::new(), String::new());
    }

    let collection = table_regex(&operation)
        .and_then(|re| re.captures(&s))
        .and_then(|caps| caps.get(1))
        .map(|m| clean_table_name(m.as_str()))
        .unwrap_or_default();

    (operation, collection)
}

/// The label triple attached to one datastore span.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Lowercased verb, or empty when the verb was not recognized.
    pub operation: String,
    /// Best-effort table name, or empty when none applies.
    pub collection: String,
    /// Bound parameters flattened to `?_N` keys.
    pub parameters: HashMap<String, ParamValue>,
}

impl Classification {
    /// Classify a statement together with its bound parameters.
    ///
    /// Never fails; malformed input produces an all-empty result.
    pub fn classify(sql: &str, params: &[BindValue]) -> Self {
        let (operation, collection) = classify_statement(sql);
        Self {
            operation,
            collection,
            parameters: flatten(params),
        }
    }

    /// Span name in the form `"{operation} {collection}"`, omitting the
    /// collection when there is none.
    pub fn span_name(&self) -> String {
        if self.collection.is_empty() {
            self.operation.clone()
        } else {
            format!("{} {}", self.operation, self.collection)
        }
    }
}
