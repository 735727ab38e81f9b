//! Built-in tokens that are not backed by user templates.

use crate::constants::{
    DESIRED_POINTS_PER_GRAPH, TEMP_VAR_DATABASE, TEMP_VAR_INTERVAL, TEMP_VAR_MEASUREMENT,
    TEMP_VAR_TAG_KEY,
};
use crate::models::{Template, TemplateType};

/// The query text of `template` with its editor slots filled in.
///
/// The first `:database:`, `:measurement:` and `:tagKey:` of the text is
/// replaced with the double-quoted `db`, `measurement` and `tag_key` stored
/// in the template's query definition, when set. Custom meta queries are
/// returned verbatim. A template without a query yields an empty string.
pub fn internal_replace(template: &Template) -> String {
    let Some(query) = &template.query else {
        return String::new();
    };

    if template.template_type == TemplateType::MetaQuery {
        return query.influxql.clone();
    }

    let slots = [
        (TEMP_VAR_DATABASE, &query.db),
        (TEMP_VAR_MEASUREMENT, &query.measurement),
        (TEMP_VAR_TAG_KEY, &query.tag_key),
    ];

    slots.iter().fold(query.influxql.clone(), |text, (token, field)| match field {
        Some(value) => text.replacen(token, &format!("\"{value}\""), 1),
        None => text,
    })
}

/// Group-by interval in milliseconds for a time range of `duration_ms`.
pub fn compute_interval(duration_ms: u64) -> u64 {
    (duration_ms as f64 / DESIRED_POINTS_PER_GRAPH as f64).round() as u64
}

/// Replace every `:interval:` in `query` with the interval for `duration_ms`.
///
/// ```
/// use tempvar_engine::templating::replace_interval;
///
/// assert_eq!(
///     replace_interval("GROUP BY time(:interval:)", 86_399_999),
///     "GROUP BY time(240000ms)"
/// );
/// ```
pub fn replace_interval(query: &str, duration_ms: u64) -> String {
    if !query.contains(TEMP_VAR_INTERVAL) {
        return query.to_string();
    }
    query.replace(TEMP_VAR_INTERVAL, &format!("{}ms", compute_interval(duration_ms)))
}
