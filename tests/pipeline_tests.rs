//! Provision, publish and load end to end, with configuration from TOML

mod common;

use std::fs;

use common::{FakePublisher, FakeWarehouse};
use oecd_loader::config::LoaderConfig;
use oecd_loader::load::{LoadPlan, Orchestrator};
use oecd_loader::provision::SchemaProvisioner;
use oecd_loader::staging::{PublishRequest, publish_directory};
use oecd_loader::status::RunStatus;
use oecd_loader::validation::PlanValidationError;
use tempfile::TempDir;

const CONFIG: &str = r#"
[warehouse]
host = "example.redshift.amazonaws.com"
user = "loader"

[storage]
bucket = "oecd-countries-data"
prefix = "csv"

[load]
iam_role = "arn:aws:iam::123456789012:role/copy"

[[load.tables]]
name = "countries"
file = "countries.csv"

[[load.tables]]
name = "economies"
file = "economies.csv"
references = ["countries"]
"#;

#[tokio::test]
async fn test_foreign_key_failure_is_isolated_and_diagnosed() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("countries.csv"),
        "code,country_name\nAFG,Afghanistan\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("economies.csv"),
        "econ_id,code,year\n1,ZZZ,2010\n",
    )
    .unwrap();

    let mut config = LoaderConfig::parse(CONFIG).unwrap();
    config.storage.local_dir = dir.path().to_path_buf();

    let warehouse = FakeWarehouse::builder()
        .fail_table("economies")
        .load_error(
            "economies",
            serde_json::json!({
                "file_name": "s3://oecd-countries-data/csv/economies.csv",
                "line_number": 2,
                "column_name": "code",
                "raw_line": "1,ZZZ,2010",
                "reason": "Foreign key constraint violation",
                "error_code": 1216
            }),
        )
        .build();

    let provisioned = SchemaProvisioner::default().provision(&warehouse).await;
    assert_eq!(provisioned.status(), RunStatus::Succeeded);

    let publisher = FakePublisher::default();
    let request = PublishRequest {
        local_dir: config.storage.local_dir.clone(),
        bucket: config.storage.bucket.clone(),
        prefix: config.storage.prefix.clone(),
        extension: config.storage.extension.clone(),
    };
    let published = publish_directory(&request, &publisher).await.unwrap();
    assert_eq!(published.published(), 2);

    let plan =
        LoadPlan::from_config(&config.load, &config.storage, config.iam_role().unwrap()).unwrap();
    plan.validate().unwrap();
    // Publisher and loader agree on where each file lives
    for (descriptor, file) in plan.descriptors.iter().zip(&published.files) {
        assert_eq!(descriptor.source_uri, file.uri);
    }

    let report = Orchestrator::new(warehouse.clone(), plan).run().await;

    assert!(report.job("countries").unwrap().is_succeeded());
    let economies = report.job("economies").unwrap();
    assert!(economies.is_failed());
    let record = economies.diagnostic().unwrap().record().unwrap();
    assert_eq!(record.raw_line.as_deref(), Some("1,ZZZ,2010"));
    assert_eq!(report.status(), RunStatus::PartialFailure);
    assert_eq!(warehouse.state().loaded, vec!["countries"]);

    let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
    assert_eq!(json["jobs"][1]["state"], "failed");
    assert_eq!(json["jobs"][1]["diagnostic"]["kind"], "recovered");
    assert_eq!(json["jobs"][1]["diagnostic"]["record"]["line_number"], 2);
}

#[test]
fn test_misordered_mapping_is_rejected_before_loading() {
    let config = LoaderConfig::parse(
        r#"
[load]
iam_role = "role"

[[load.tables]]
name = "economies"
references = ["countries"]

[[load.tables]]
name = "countries"
"#,
    )
    .unwrap();

    let plan =
        LoadPlan::from_config(&config.load, &config.storage, config.iam_role().unwrap()).unwrap();

    assert_eq!(
        plan.validate(),
        Err(PlanValidationError::OrderViolation {
            table: "economies".to_string(),
            dependency: "countries".to_string(),
        })
    );
}

#[cfg(feature = "cli")]
#[tokio::test]
async fn test_unreadable_data_dir_stops_pipeline_with_report() {
    use oecd_loader::cli::commands::pipeline::run_pipeline;

    let dir = TempDir::new().unwrap();
    let mut config = LoaderConfig::parse(CONFIG).unwrap();
    config.storage.local_dir = dir.path().join("missing");

    let warehouse = FakeWarehouse::healthy();
    let publisher = FakePublisher::default();
    let request = PublishRequest {
        local_dir: config.storage.local_dir.clone(),
        bucket: config.storage.bucket.clone(),
        prefix: config.storage.prefix.clone(),
        extension: config.storage.extension.clone(),
    };
    let plan =
        LoadPlan::from_config(&config.load, &config.storage, config.iam_role().unwrap()).unwrap();
    let orchestrator = Orchestrator::new(warehouse.clone(), plan);

    let report = run_pipeline(&warehouse, &publisher, &request, &orchestrator).await;

    assert_eq!(report.status(), RunStatus::Aborted);
    assert_eq!(report.provision.status(), RunStatus::Succeeded);
    assert!(report.publish.is_none());
    assert!(report.load.is_none());
    assert!(report.fatal.as_deref().unwrap().contains("Cannot read directory"));

    let text = report.render_text();
    assert!(text.contains("== provision =="));
    assert!(text.contains("Pipeline aborted"));

    assert!(publisher.uploads.borrow().is_empty());
    let state = warehouse.state();
    assert!(!state.objects.is_empty());
    assert!(state.executed().iter().all(|sql| !sql.starts_with("COPY")));
}
