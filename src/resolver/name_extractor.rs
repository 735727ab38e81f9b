//! Extraction of `:name:` template references from query text.
//!
//! References are found with a single left-to-right scan: a colon opens a
//! name and the next colon closes it. Two characters abort an open name
//! instead of extending it, so `:` used as ordinary punctuation does not
//! swallow the rest of a query:
//! - a newline anywhere inside the name
//! - a space directly after the opening colon
//!
//! A name still open when the text ends is an error, never silently dropped.

use crate::core::{Result, TempVarError};
use crate::models::Template;

/// Extract the distinct `:name:` tokens of `text`, in order of first appearance.
///
/// # Errors
///
/// Returns [`TempVarError::MalformedReference`] when a reference is opened
/// but never closed.
///
/// ```
/// use tempvar_engine::resolver::extract_names;
///
/// let names = extract_names("SELECT :field: FROM :db: WHERE x = :field:").unwrap();
/// assert_eq!(names, vec![":field:", ":db:"]);
///
/// assert!(extract_names("foo :bar baz").is_err());
/// ```
pub fn extract_names(text: &str) -> Result<Vec<String>> {
    let mut names: Vec<String> = Vec::new();
    let mut in_name = false;
    let mut name = String::new();

    for c in text.chars() {
        if !in_name {
            if c == ':' {
                in_name = true;
                name.clear();
                name.push(':');
            }
            continue;
        }

        if c == ':' {
            name.push(':');
            if !names.contains(&name) {
                names.push(name.clone());
            }
            in_name = false;
        } else if c == '\n' || (c == ' ' && name.len() == 1) {
            in_name = false;
        } else {
            name.push(c);
        }
    }

    if in_name {
        return Err(TempVarError::MalformedReference {
            fragment: name,
        });
    }

    Ok(names)
}

/// Names of the templates `template` depends on.
///
/// Query-backed templates are scanned through their query text, falling back
/// to a stored Flux script. Templates without either are scanned through every stored value, since a literal
/// value may itself embed references (e.g. a map value `AND host = ':host:'`);
/// the results are unioned in order of first appearance.
///
/// # Errors
///
/// Returns [`TempVarError::MalformedReference`] for an unterminated reference.
pub fn dependency_names(template: &Template) -> Result<Vec<String>> {
    if let Some(query) = template.query_text() {
        return extract_names(query);
    }
    if let Some(script) = template.flux_text() {
        return extract_names(script);
    }

    let mut names: Vec<String> = Vec::new();
    for value in &template.values {
        for name in extract_names(&value.value)? {
            if !names.contains(&name) {
                names.push(name);
            }
        }
    }

    Ok(names)
}
