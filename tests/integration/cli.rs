//! End-to-end tests of the `tempvar` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

use crate::common::{DASHBOARD_TEMPLATES, TestProject};

const LITERAL_TEMPLATES: &str = r#"{
  "id": 12,
  "name": "literal only",
  "templates": [
    {
      "id": "1",
      "tempVar": ":region:",
      "type": "csv",
      "label": "",
      "values": [
        {"value": "north", "type": "csv", "selected": true, "localSelected": false},
        {"value": "south", "type": "csv", "selected": false, "localSelected": false}
      ]
    },
    {
      "id": "2",
      "tempVar": ":search:",
      "type": "text",
      "label": "",
      "values": []
    }
  ]
}"#;

const CYCLIC_TEMPLATES: &str = r#"[
  {"id": "1", "tempVar": ":a:", "type": "map", "label": "",
   "values": [{"key": "k", "value": ":b:", "type": "map", "selected": true, "localSelected": false}]},
  {"id": "2", "tempVar": ":b:", "type": "map", "label": "",
   "values": [{"key": "k", "value": ":a:", "type": "map", "selected": true, "localSelected": false}]}
]"#;

const FLUX_TEMPLATES: &str = r#"[
  {"id": "1", "tempVar": ":bucket:", "type": "influxql", "label": "",
   "query": {"flux": "buckets()"},
   "values": [{"value": "old", "type": "influxql", "selected": true, "localSelected": false}]},
  {"id": "2", "tempVar": ":my var:", "type": "csv", "label": "",
   "values": [
     {"value": "a", "type": "csv", "selected": true, "localSelected": false},
     {"value": "b", "type": "csv", "selected": false, "localSelected": false}
   ]}
]"#;

fn tempvar(project: &TestProject) -> Command {
    let mut cmd = Command::cargo_bin("tempvar").unwrap();
    cmd.current_dir(project.project_path())
        .env("HOME", project.home_path())
        .env("USERPROFILE", project.home_path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("TEMPVAR_CONFIG")
        .env_remove("TEMPVAR_ENDPOINT");
    cmd
}

#[test]
fn test_graph_tree() {
    let project = TestProject::new().unwrap();
    project.write_file("dashboard.json", DASHBOARD_TEMPLATES).unwrap();

    tempvar(&project)
        .args(["graph", "--templates", "dashboard.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(":filter: (map)"))
        .stdout(predicate::str::contains("│   └── :host: (tagValues)"))
        .stdout(predicate::str::contains("└── :region: (csv)"));
}

#[test]
fn test_graph_order_lists_dependencies_first() {
    let project = TestProject::new().unwrap();
    project.write_file("dashboard.json", DASHBOARD_TEMPLATES).unwrap();

    let output = project.run_tempvar(&["graph", "-t", "dashboard.json", "--order"]).unwrap();
    output.assert_success();

    let lines: Vec<&str> = output.stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    let host = lines.iter().position(|l| l.contains(":host:")).unwrap();
    let filter = lines.iter().position(|l| l.contains(":filter:")).unwrap();
    assert!(host < filter, "dependency listed after dependent:\n{}", output.stdout);
}

#[test]
fn test_render_with_stored_selection_and_interval() {
    let project = TestProject::new().unwrap();
    project.write_file("dashboard.json", DASHBOARD_TEMPLATES).unwrap();

    tempvar(&project)
        .args([
            "render",
            "-t",
            "dashboard.json",
            "-Q",
            "SELECT mean(usage_idle) FROM cpu WHERE region = ':region:' :filter: GROUP BY time(:interval:)",
            "--interval-ms",
            "3600000",
        ])
        .assert()
        .success()
        .stdout(
            "SELECT mean(usage_idle) FROM cpu WHERE region = 'north' AND host = 'srv-1' \
             GROUP BY time(10000ms)\n",
        );
}

#[test]
fn test_render_with_local_selections() {
    let project = TestProject::new().unwrap();
    project.write_file("dashboard.json", DASHBOARD_TEMPLATES).unwrap();

    project
        .run_tempvar(&[
            "render",
            "-t",
            "dashboard.json",
            "-Q",
            "SELECT * FROM cpu WHERE host =~ /:host:/ AND region = ':region:'",
            "--select",
            "host=srv-2",
            "-s",
            ":region:=south",
        ])
        .unwrap()
        .assert_success()
        .assert_stdout_contains("host =~ /srv-2/ AND region = 'south'");
}

#[test]
fn test_render_unmatched_regex_delimiter() {
    let project = TestProject::new().unwrap();
    project.write_file("dashboard.json", DASHBOARD_TEMPLATES).unwrap();

    tempvar(&project)
        .args(["render", "-t", "dashboard.json", "-Q", "SELECT * FROM cpu WHERE host =~ /:host:"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("expected token '/'"));
}

#[test]
fn test_hydrate_literal_templates_as_json() {
    let project = TestProject::new().unwrap();
    project.write_file("literal.json", LITERAL_TEMPLATES).unwrap();

    let output = project
        .run_tempvar(&["hydrate", "-t", "literal.json", "--select", "region=south", "--format", "json"])
        .unwrap();
    output.assert_success();

    let hydrated: Value = serde_json::from_str(&output.stdout).unwrap();
    let templates = hydrated.as_array().unwrap();
    assert_eq!(templates.len(), 2);

    let region = &templates[0]["values"];
    assert_eq!(region[0]["selected"], Value::Bool(true));
    assert_eq!(region[1]["localSelected"], Value::Bool(true));

    // empty text templates gain an empty value
    assert_eq!(templates[1]["values"][0]["value"], Value::String(String::new()));
}

#[test]
fn test_hydrate_writes_output_file() {
    let project = TestProject::new().unwrap();
    project.write_file("literal.json", LITERAL_TEMPLATES).unwrap();

    tempvar(&project)
        .args(["hydrate", "-t", "literal.json", "-f", "json", "-o", "hydrated.json"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written = std::fs::read_to_string(project.project_path().join("hydrated.json")).unwrap();
    assert!(written.contains("\"tempVar\": \":region:\""));
}

#[test]
fn test_hydrate_without_endpoint_fails() {
    let project = TestProject::new().unwrap();
    project.write_file("dashboard.json", DASHBOARD_TEMPLATES).unwrap();

    let output = project.run_tempvar(&["hydrate", "-t", "dashboard.json"]).unwrap();
    output
        .assert_failure()
        .assert_stdout_contains("✓ :region: = north (2 values)")
        .assert_stderr_contains("no data source endpoint available for template \":host:\"")
        .assert_stderr_contains("\":filter:\" depends on \":host:\"")
        .assert_stderr_contains("2 of 3 templates failed to hydrate");
    assert_eq!(output.code, Some(1));
}

#[test]
fn test_hydrate_with_unreachable_configured_endpoint() {
    let project = TestProject::new().unwrap();
    project.write_file("dashboard.json", DASHBOARD_TEMPLATES).unwrap();
    project
        .write_home_config("endpoint = \"http://127.0.0.1:9/query\"\nrequest_timeout_secs = 2\n")
        .unwrap();

    project
        .run_tempvar(&["hydrate", "-t", "dashboard.json"])
        .unwrap()
        .assert_failure()
        .assert_stderr_contains("failed to fetch values for template \":host:\" from http://127.0.0.1:9/query");
}

#[test]
fn test_invalid_config_is_reported() {
    let project = TestProject::new().unwrap();
    project.write_file("dashboard.json", DASHBOARD_TEMPLATES).unwrap();
    let config = project.write_file("broken.toml", "endpoint = [").unwrap();

    tempvar(&project)
        .args(["--config", config.to_str().unwrap(), "graph", "-t", "dashboard.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config"));
}

#[test]
fn test_malformed_templates_file() {
    let project = TestProject::new().unwrap();
    project.write_file("broken.json", "{\"templates\": [1, 2").unwrap();

    tempvar(&project)
        .args(["graph", "-t", "broken.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse templates from"))
        .stderr(predicate::str::contains("suggestion"));
}

#[test]
fn test_missing_templates_file() {
    let project = TestProject::new().unwrap();

    tempvar(&project)
        .args(["render", "-t", "absent.json", "-Q", "SELECT 1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read templates from"));
}

#[test]
fn test_cyclic_templates_are_rejected() {
    let project = TestProject::new().unwrap();
    project.write_file("cycle.json", CYCLIC_TEMPLATES).unwrap();

    for args in [
        vec!["graph", "-t", "cycle.json"],
        vec!["hydrate", "-t", "cycle.json"],
    ] {
        tempvar(&project)
            .args(&args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("cyclic dependency"));
    }
}

#[test]
fn test_hydrate_flux_template_keeps_stored_values() {
    let project = TestProject::new().unwrap();
    project.write_file("flux.json", FLUX_TEMPLATES).unwrap();

    let output = project
        .run_tempvar(&["hydrate", "-t", "flux.json", "-f", "json", "--select", ":my var:=b"])
        .unwrap();
    output
        .assert_failure()
        .assert_stderr_contains("template \":bucket:\" uses a flux query")
        .assert_stderr_contains("1 of 2 templates failed to hydrate");

    let hydrated: Value = serde_json::from_str(&output.stdout).unwrap();
    assert_eq!(hydrated[0]["values"][0]["value"], Value::String("old".to_string()));
    assert_eq!(hydrated[0]["query"]["flux"], Value::String("buckets()".to_string()));
    assert_eq!(hydrated[1]["values"][1]["localSelected"], Value::Bool(true));
}
