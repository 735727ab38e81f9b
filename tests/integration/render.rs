//! Rendering stored queries against hydrated dashboards

use pretty_assertions::assert_eq;

use tempvar_engine::cache::CachingQueryFetcher;
use tempvar_engine::models::{Template, TemplateQuery, TemplateType, TemplateValue, TemplateValueType};
use tempvar_engine::resolver::{HydrateOptions, hydrate_templates};
use tempvar_engine::templating::{internal_replace, render_query, template_replace};
use tempvar_engine::test_utils::fixtures;

#[tokio::test]
async fn test_hydrate_then_render_nested_map() {
    let mut templates = fixtures::telegraf_chain();
    templates.push(fixtures::map(
        "4",
        "filter",
        &[("one host", "AND host = :host:"), ("all hosts", "")],
    ));

    let fetcher = CachingQueryFetcher::new(fixtures::telegraf_runner());
    let options = HydrateOptions::new()
        .with_endpoint("http://localhost:8086/query")
        .with_selection("host", "srv-2");

    let hydrated = hydrate_templates(&templates, &fetcher, &options)
        .await
        .unwrap()
        .into_templates()
        .unwrap();

    let query = "SELECT mean(usage_idle) FROM :db:..:meas: WHERE time > now() - 1h :filter: \
                 GROUP BY time(:interval:)";
    let rendered = render_query(query, &hydrated, Some(3_600_000)).unwrap();

    assert_eq!(
        rendered,
        "SELECT mean(usage_idle) FROM \"telegraf\"..\"cpu\" WHERE time > now() - 1h \
         AND host = 'srv-2' GROUP BY time(10000ms)"
    );
}

#[test]
fn test_regex_and_quoted_positions_in_one_query() {
    let host = fixtures::query("1", "host", TemplateType::TagValues, "SHOW TAG VALUES WITH KEY = \"host\"")
        .with_values(vec![TemplateValue::new("srv-1", TemplateValueType::TagValue).selected(true)]);
    let templates = vec![host, fixtures::dashboard_time("now() - 15m")];

    let rendered = template_replace(
        "SELECT * FROM cpu WHERE host =~ /^:host:$/ OR host = :host: AND time > :dashboardTime:",
        &templates,
    )
    .unwrap();

    assert_eq!(
        rendered,
        "SELECT * FROM cpu WHERE host =~ /^srv-1$/ OR host = 'srv-1' AND time > now() - 15m"
    );
}

#[test]
fn test_editor_slots_use_stored_query_fields() {
    let template = Template::new("1", "field", TemplateType::FieldKeys).with_query(TemplateQuery {
        db: Some("telegraf".to_string()),
        measurement: Some("cpu".to_string()),
        ..TemplateQuery::new("SHOW FIELD KEYS ON :database: FROM :measurement:")
    });

    assert_eq!(
        internal_replace(&template),
        "SHOW FIELD KEYS ON \"telegraf\" FROM \"cpu\""
    );
}
