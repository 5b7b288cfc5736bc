//! The single string-match primitive shared by every builtin matcher.

use crate::constraint::StringMatcher;

/// Compares a constraint against a payload field.
///
/// Returns `false` when either side is absent. A literal compares for exact
/// equality; a pattern performs an unanchored search.
pub fn matches(constraint: Option<&StringMatcher>, input: Option<&str>) -> bool {
    match (constraint, input) {
        (Some(matcher), Some(input)) => matcher.is_match(input),
        _ => false,
    }
}
