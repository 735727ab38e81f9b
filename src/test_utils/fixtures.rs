//! Template fixtures shared by unit and integration tests.

use crate::models::{Template, TemplateQuery, TemplateType, TemplateValue, TemplateValueType};

/// A CSV template; the first value is selected.
pub fn csv(id: &str, name: &str, values: &[&str]) -> Template {
    let values = values
        .iter()
        .enumerate()
        .map(|(i, v)| TemplateValue::new(*v, TemplateValueType::Csv).selected(i == 0))
        .collect();
    Template::new(id, name, TemplateType::Csv).with_values(values)
}

/// A map template from `(key, value)` pairs; the first entry is selected.
pub fn map(id: &str, name: &str, entries: &[(&str, &str)]) -> Template {
    let values = entries
        .iter()
        .enumerate()
        .map(|(i, (k, v))| TemplateValue::map_entry(*k, *v).selected(i == 0))
        .collect();
    Template::new(id, name, TemplateType::Map).with_values(values)
}

/// A query-backed template without values.
pub fn query(id: &str, name: &str, template_type: TemplateType, influxql: &str) -> Template {
    Template::new(id, name, template_type).with_query(TemplateQuery::new(influxql))
}

/// The built-in `:dashboardTime:` constant.
pub fn dashboard_time(lower: &str) -> Template {
    Template::new("dashtime", "dashboardTime", TemplateType::Constant)
        .with_values(vec![TemplateValue::new(lower, TemplateValueType::Constant).selected(true)])
}

/// Database → measurement → host chain of query templates.
///
/// Responses for the rendered queries are available from
/// [`telegraf_runner`].
pub fn telegraf_chain() -> Vec<Template> {
    vec![
        query(
            "3",
            "host",
            TemplateType::TagValues,
            "SHOW TAG VALUES ON :db: FROM :meas: WITH KEY = \"host\"",
        ),
        query("2", "meas", TemplateType::Measurements, "SHOW MEASUREMENTS ON :db:"),
        query("1", "db", TemplateType::Databases, "SHOW DATABASES"),
    ]
}

/// Runner answering the queries of [`telegraf_chain`] once rendered with the
/// first value of each dependency.
pub fn telegraf_runner() -> super::CountingRunner {
    super::CountingRunner::new()
        .with_values("SHOW DATABASES", &["telegraf", "_internal"])
        .with_values("SHOW MEASUREMENTS ON \"telegraf\"", &["cpu", "mem"])
        .with_values(
            "SHOW TAG VALUES ON \"telegraf\" FROM \"cpu\" WITH KEY = \"host\"",
            &["srv-1", "srv-2"],
        )
}
