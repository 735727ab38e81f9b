//! Hydration passes over whole dashboards

use std::time::Duration;

use tempvar_engine::cache::CachingQueryFetcher;
use tempvar_engine::core::TempVarError;
use tempvar_engine::models::{Template, TemplateType};
use tempvar_engine::resolver::{HydrateOptions, hydrate_templates};
use tempvar_engine::test_utils::{CountingRunner, fixtures};

const ENDPOINT: &str = "http://localhost:8086/query";

fn active(template: &Template) -> &str {
    template.active_value().map_or("", |v| v.value.as_str())
}

#[tokio::test]
async fn test_chain_hydrates_dependencies_first() {
    let fetcher = CachingQueryFetcher::new(fixtures::telegraf_runner());
    let options = HydrateOptions::new().with_endpoint(ENDPOINT);

    let hydrated = hydrate_templates(&fixtures::telegraf_chain(), &fetcher, &options)
        .await
        .unwrap()
        .into_templates()
        .unwrap();

    // results stay in input order
    assert_eq!(hydrated[0].temp_var, ":host:");
    assert_eq!(active(&hydrated[0]), "srv-1");
    assert_eq!(active(&hydrated[1]), "cpu");
    assert_eq!(active(&hydrated[2]), "telegraf");

    assert_eq!(
        fetcher.runner().queries(),
        vec![
            "SHOW DATABASES".to_string(),
            "SHOW MEASUREMENTS ON \"telegraf\"".to_string(),
            "SHOW TAG VALUES ON \"telegraf\" FROM \"cpu\" WITH KEY = \"host\"".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_selection_changes_downstream_queries() {
    let runner = fixtures::telegraf_runner()
        .with_values("SHOW MEASUREMENTS ON \"_internal\"", &["runtime"])
        .with_values(
            "SHOW TAG VALUES ON \"_internal\" FROM \"runtime\" WITH KEY = \"host\"",
            &["influx-0"],
        );
    let fetcher = CachingQueryFetcher::new(runner);
    let options = HydrateOptions::new().with_endpoint(ENDPOINT).with_selection("db", "_internal");

    let hydrated = hydrate_templates(&fixtures::telegraf_chain(), &fetcher, &options)
        .await
        .unwrap()
        .into_templates()
        .unwrap();

    assert_eq!(active(&hydrated[2]), "_internal");
    // the stored selection still points at the first database
    assert_eq!(hydrated[2].selected_value().unwrap().value, "telegraf");
    assert_eq!(active(&hydrated[1]), "runtime");
    assert_eq!(active(&hydrated[0]), "influx-0");
}

#[tokio::test]
async fn test_failure_is_scoped_to_dependents() {
    let runner = CountingRunner::new()
        .with_failure("SHOW DATABASES", "connection refused")
        .with_values("SHOW TAG VALUES WITH KEY = \"region\"", &["north", "south"]);
    let fetcher = CachingQueryFetcher::new(runner);

    let mut templates = fixtures::telegraf_chain();
    templates.push(fixtures::query(
        "4",
        "region",
        TemplateType::TagValues,
        "SHOW TAG VALUES WITH KEY = \"region\"",
    ));
    templates.push(fixtures::csv("5", "env", &["prod", "dev"]));

    let outcome = hydrate_templates(&templates, &fetcher, &HydrateOptions::new().with_endpoint(ENDPOINT))
        .await
        .unwrap();

    assert!(!outcome.is_complete());
    assert_eq!(outcome.errors().count(), 3);

    let results = outcome.results();
    assert!(matches!(&results[2], Err(TempVarError::FetchFailed { temp_var, .. }) if temp_var == ":db:"));
    assert_eq!(
        results[1],
        Err(TempVarError::DependencyFailed {
            temp_var: ":meas:".to_string(),
            dependency: ":db:".to_string(),
        })
    );
    assert_eq!(
        results[0],
        Err(TempVarError::DependencyFailed {
            temp_var: ":host:".to_string(),
            dependency: ":db:".to_string(),
        })
    );
    assert_eq!(active(results[3].as_ref().unwrap()), "north");
    assert_eq!(active(results[4].as_ref().unwrap()), "prod");

    // dependents of the failure never reached the runner
    assert_eq!(fetcher.runner().calls(), 2);
}

#[tokio::test]
async fn test_cycle_fails_before_any_query() {
    let fetcher = CachingQueryFetcher::new(fixtures::telegraf_runner());
    let templates = vec![
        fixtures::query("1", "a", TemplateType::MetaQuery, "SHOW TAG VALUES WITH KEY = :b:"),
        fixtures::query("2", "b", TemplateType::MetaQuery, "SHOW TAG KEYS FROM :a:"),
        fixtures::query("3", "db", TemplateType::Databases, "SHOW DATABASES"),
    ];

    let err = hydrate_templates(&templates, &fetcher, &HydrateOptions::new().with_endpoint(ENDPOINT))
        .await
        .unwrap_err();

    assert!(matches!(err, TempVarError::CyclicDependency { .. }));
    assert_eq!(fetcher.runner().calls(), 0);
}

#[tokio::test]
async fn test_shared_queries_run_once_across_dashboards() {
    let runner = fixtures::telegraf_runner().with_delay(Duration::from_millis(20));
    let fetcher = CachingQueryFetcher::new(runner);
    let options = HydrateOptions::new().with_endpoint(ENDPOINT);

    // two templates issuing the same query in one pass
    let mut templates = fixtures::telegraf_chain();
    templates.push(fixtures::query("4", "db2", TemplateType::Databases, "SHOW DATABASES"));

    hydrate_templates(&templates, &fetcher, &options).await.unwrap().into_templates().unwrap();
    assert_eq!(fetcher.runner().calls(), 3);

    // a second dashboard on the same endpoint is served from the cache
    hydrate_templates(&fixtures::telegraf_chain(), &fetcher, &options)
        .await
        .unwrap()
        .into_templates()
        .unwrap();
    assert_eq!(fetcher.runner().calls(), 3);

    let stats = fetcher.stats();
    assert_eq!(stats.misses, 3);
    assert_eq!(stats.hits, 4);
}

#[tokio::test]
async fn test_switching_endpoint_invalidates_cache() {
    let fetcher = CachingQueryFetcher::new(fixtures::telegraf_runner());

    let first = HydrateOptions::new().with_endpoint(ENDPOINT);
    hydrate_templates(&fixtures::telegraf_chain(), &fetcher, &first).await.unwrap();
    assert_eq!(fetcher.len(), 3);

    let second = HydrateOptions::new().with_endpoint("http://other:8086/query");
    hydrate_templates(&fixtures::telegraf_chain(), &fetcher, &second).await.unwrap();

    assert_eq!(fetcher.bound_endpoint().as_deref(), Some("http://other:8086/query"));
    assert_eq!(fetcher.len(), 3);
    assert_eq!(fetcher.runner().calls(), 6);
    assert!(fetcher.runner().requests().iter().any(|(endpoint, _)| endpoint == "http://other:8086/query"));
}

#[tokio::test]
async fn test_per_source_endpoints() {
    let fetcher = CachingQueryFetcher::new(fixtures::telegraf_runner());
    let templates = vec![
        fixtures::query("1", "db", TemplateType::Databases, "SHOW DATABASES").with_source("7"),
        fixtures::csv("2", "env", &["prod"]),
    ];
    let options = HydrateOptions::new().with_source("7", "http://source-7:8086/query");

    let outcome = hydrate_templates(&templates, &fetcher, &options).await.unwrap();

    assert!(outcome.is_complete());
    assert_eq!(
        fetcher.runner().requests(),
        vec![("http://source-7:8086/query".to_string(), "SHOW DATABASES".to_string())]
    );
}
