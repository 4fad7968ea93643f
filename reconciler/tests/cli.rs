use std::path::Path;
use std::process::{Command, Output};

use serde_json::{Value, json};

const BASE_CONFIGURATION: &str = r#"
reconciler:
  master_region: us-east-1
  propagation_delay_ms: 0
  table_status_wait:
    max_attempts: 3
    initial_delay_ms: 1
    backoff_multiplier: 1.5
    max_delay_ms: 5
  tags_visible_wait:
    max_attempts: 3
    initial_delay_ms: 1
    backoff_multiplier: 1.5
    max_delay_ms: 5
store: memory
"#;

const DEV_CONFIGURATION: &str = "reconciler:\n  propagation_delay_ms: 0\n";

/// Runs the binary with a memory store configuration and the given event.
fn run_reconciler(dir: &Path, event: &Value) -> Output {
    let configuration_dir = dir.join("configuration");
    std::fs::create_dir_all(&configuration_dir).unwrap();
    std::fs::write(configuration_dir.join("base.yaml"), BASE_CONFIGURATION).unwrap();
    std::fs::write(configuration_dir.join("dev.yaml"), DEV_CONFIGURATION).unwrap();

    let event_path = dir.join("event.json");
    std::fs::write(&event_path, serde_json::to_vec(event).unwrap()).unwrap();

    Command::new(env!("CARGO_BIN_EXE_reconciler"))
        .arg("--event")
        .arg(&event_path)
        .env("APP_ENVIRONMENT", "dev")
        .env("RECONCILER_CONFIGURATION_DIR", &configuration_dir)
        .env("RUST_LOG", "info")
        .output()
        .unwrap()
}

/// Stdout must parse as exactly one response document.
fn parse_response(output: &Output) -> Value {
    let stdout = String::from_utf8(output.stdout.clone()).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 1, "stdout holds more than the response: {stdout}");

    serde_json::from_str(lines[0]).unwrap()
}

#[test]
fn failed_event_prints_only_the_response_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let event = json!({
        "RequestType": "Create",
        "ResourceType": "Custom::DynamoDBGlobalTable",
        "LogicalResourceId": "OrdersGlobalTable",
        "ResourceProperties": {
            "GlobalTableName": "orders",
            "DeploymentRegions": [{ "region": "us-east-1" }, { "region": "eu-west-1" }],
            "LastStackUpdate": "1"
        }
    });

    let output = run_reconciler(dir.path(), &event);

    assert!(!output.status.success());
    let response = parse_response(&output);
    assert_eq!(response["Status"], "FAILED");
    assert_eq!(response["PhysicalResourceId"], "OrdersGlobalTable");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tracing initialized"));
}

#[test]
fn successful_event_prints_only_the_response_on_stdout() {
    let dir = tempfile::tempdir().unwrap();
    let event = json!({
        "RequestType": "Delete",
        "ResourceType": "Custom::SimpleDynamoDBGlobalTable",
        "LogicalResourceId": "OrdersGlobalTable",
        "PhysicalResourceId": "orders",
        "ResourceProperties": {
            "GlobalTableName": "orders",
            "Regions": [{ "region": "us-east-1" }, { "region": "eu-west-1" }]
        }
    });

    let output = run_reconciler(dir.path(), &event);

    assert!(output.status.success());
    let response = parse_response(&output);
    assert_eq!(response["Status"], "SUCCESS");
    assert_eq!(response["PhysicalResourceId"], "orders");
}
