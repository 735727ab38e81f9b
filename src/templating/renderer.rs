//! Substitution of template values into query text.

use crate::constants::{REGEX_COMPARATORS, REGEX_DELIMITER};
use crate::core::{Result, TempVarError};
use crate::models::{Template, TemplateValueType};
use crate::resolver::TemplateGraph;

/// Replace every occurrence of `template`'s token in `query` with its active value.
///
/// The query is returned unchanged when the template has no values, no
/// active value, or its token does not occur. Quoting follows the value kind:
///
/// | Value kind | Inside `=~ /.../` | Elsewhere |
/// |---|---|---|
/// | tag key, field key, measurement, database | bare | `"value"` |
/// | tag value, timestamp | bare | `'value'` |
/// | csv, map, constant, meta query | verbatim | verbatim |
///
/// # Errors
///
/// Returns [`TempVarError::UnmatchedRegexDelimiter`] when a regex comparator
/// is not followed by a complete `/.../` literal.
pub fn render_template(query: &str, template: &Template) -> Result<String> {
    let temp_var = template.temp_var.as_str();
    if template.values.is_empty() || !query.contains(temp_var) {
        return Ok(query.to_string());
    }

    let Some(active) = template.active_value() else {
        return Ok(query.to_string());
    };
    let value = active.value.as_str();

    let (query, replacement) = match active.value_type {
        TemplateValueType::TagKey
        | TemplateValueType::FieldKey
        | TemplateValueType::Measurement
        | TemplateValueType::Database => {
            (replace_all_regex(query, temp_var, value)?, format!("\"{value}\""))
        }
        TemplateValueType::TagValue | TemplateValueType::TimeStamp => {
            (replace_all_regex(query, temp_var, value)?, format!("'{value}'"))
        }
        TemplateValueType::Constant
        | TemplateValueType::Map
        | TemplateValueType::Csv
        | TemplateValueType::MetaQuery => (query.to_string(), value.to_string()),
    };

    Ok(query.replace(temp_var, &replacement))
}

/// Render `query` against every template in `templates`.
///
/// Templates are applied dependents first, so a token introduced by a
/// substituted value (a map value such as `AND host = ':host:'`) is itself
/// substituted by the template it names. Tokens matching no template are
/// left as they are.
///
/// # Errors
///
/// - [`TempVarError::MalformedReference`] when a template value contains an
///   unterminated reference
/// - [`TempVarError::UnmatchedRegexDelimiter`], see [`render_template`]
pub fn template_replace(query: &str, templates: &[Template]) -> Result<String> {
    if templates.is_empty() {
        return Ok(query.to_string());
    }

    let graph = TemplateGraph::build(templates)?;
    let mut rendered = query.to_string();

    for template in graph.sorted_templates().into_iter().rev() {
        rendered = render_template(&rendered, template)?;
    }

    Ok(rendered)
}

/// Replace `temp_var` with the bare `value` inside every regex literal of `query`.
///
/// A regex literal starts at the first `/` after `=~` or `!~` and ends at the
/// next `/`. Escaped slashes are not recognized, and neither is a comparator
/// that appears inside a string constant; either can misplace the literal
/// boundaries.
///
/// # Errors
///
/// Returns [`TempVarError::UnmatchedRegexDelimiter`] when either delimiter of
/// a literal is missing.
pub fn replace_all_regex(query: &str, temp_var: &str, value: &str) -> Result<String> {
    let bytes = query.as_bytes();
    let mut rendered = String::with_capacity(query.len());
    let mut copied = 0;
    let mut i = 0;

    while i + 1 < bytes.len() {
        let is_comparator = REGEX_COMPARATORS.iter().any(|c| c.as_bytes() == &bytes[i..i + 2]);
        if !is_comparator {
            i += 1;
            continue;
        }

        let start = find_next(query, REGEX_DELIMITER, i)?;
        let end = find_next(query, REGEX_DELIMITER, start + 1)?;

        rendered.push_str(&query[copied..=start]);
        rendered.push_str(&query[start + 1..end].replace(temp_var, value));
        copied = end;
        i = end + 1;
    }

    rendered.push_str(&query[copied..]);
    Ok(rendered)
}

fn find_next(text: &str, token: char, from: usize) -> Result<usize> {
    text[from..].find(token).map(|offset| from + offset).ok_or_else(|| {
        TempVarError::UnmatchedRegexDelimiter {
            tail: text[from..].to_string(),
        }
    })
}
