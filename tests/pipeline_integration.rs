//! Integration tests for the full analysis pipeline.
//!
//! These run the orchestrator against the Java projects under testdata/.

use std::path::PathBuf;

use ckscan::error::FailureKind;
use ckscan::{
    AnalysisConfig, AnalysisError, AnalysisOrchestrator, AnalysisReport, ResolvedType,
    RevisionId, SmellKind,
};
use pretty_assertions::assert_eq;

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn shop_config() -> AnalysisConfig {
    AnalysisConfig::load(testdata_path().join("shop").join("ckscan.yaml"))
        .expect("should load shop config")
}

fn run_shop() -> AnalysisReport {
    AnalysisOrchestrator::new(shop_config())
        .run_path(testdata_path().join("shop"), RevisionId::new("shop", "r1"))
        .expect("shop analysis should succeed")
}

#[test]
fn test_ab_scenario() {
    let report = AnalysisOrchestrator::default()
        .run_path(testdata_path().join("ab"), RevisionId::new("demo", "r1"))
        .unwrap();

    let a = &report.class("demo.A").unwrap().metrics;
    let b = &report.class("demo.B").unwrap().metrics;

    assert_eq!(a.dit, 1);
    assert_eq!(b.dit, 0);
    assert_eq!(b.noc, 1);
    assert_eq!(a.noc, 0);

    // `extends B` and the `B b` field collapse into one graph edge
    assert_eq!(a.out_degree, 1);
    assert_eq!(a.in_degree, 0);
    assert_eq!(a.dependencies_out, vec!["demo.B"]);
    assert_eq!(b.in_degree, 1);
    assert_eq!(b.out_degree, 0);
    assert_eq!(b.dependencies_in, vec!["demo.A"]);
    assert_eq!(a.cbo, 1);
    assert_eq!(b.cbo, 0);

    let targets: Vec<_> = report
        .class("demo.A")
        .unwrap()
        .dependencies
        .iter()
        .map(|e| e.target())
        .collect();
    assert_eq!(targets, vec!["demo.B", "java.util.List"]);
    assert_eq!(report.counts.edges_found, 2);
}

#[test]
fn test_shop_batch_counts() {
    let report = run_shop();

    // generated/ is excluded and src/test/ is skipped by default
    assert_eq!(report.counts.files_scanned, 7);
    assert_eq!(report.counts.classes_found, 5);
    // Order 3, OrderService 3, AuditService 2
    assert_eq!(report.counts.edges_found, 8);
    assert_eq!(
        report.classes.keys().cloned().collect::<Vec<_>>(),
        vec![
            "shop.model.Customer",
            "shop.model.Order",
            "shop.service.AuditService",
            "shop.service.BaseService",
            "shop.service.OrderService",
        ]
    );
    assert!(!report.incomplete);
    assert!(report.skipped.is_empty());
}

#[test]
fn test_shop_failures() {
    let report = run_shop();

    let failures: Vec<_> = report
        .failures
        .iter()
        .map(|f| (f.path.as_str(), f.kind))
        .collect();
    assert_eq!(
        failures,
        vec![
            ("src/main/java/shop/Broken.java", FailureKind::Parse),
            ("src/main/java/shop/service/Repository.java", FailureKind::Extraction),
        ]
    );
}

#[test]
fn test_shop_metrics() {
    let report = run_shop();

    let order = &report.class("shop.model.Order").unwrap().metrics;
    assert_eq!(order.wmc, 5);
    assert_eq!(order.cbo, 3);
    assert_eq!(order.rfc, 6);
    assert_eq!(order.method_count, 3);
    assert_eq!(order.attribute_count, 2);
    assert_eq!(order.dit, 0);

    let customer = &report.class("shop.model.Customer").unwrap().metrics;
    assert_eq!(customer.cbo, 0);
    assert_eq!(customer.lcom, 1.0);
    assert_eq!(
        customer.dependencies_in,
        vec!["shop.model.Order", "shop.service.OrderService"]
    );

    let base = &report.class("shop.service.BaseService").unwrap().metrics;
    assert_eq!(base.noc, 2);
    assert_eq!(
        base.dependencies_in,
        vec!["shop.service.AuditService", "shop.service.OrderService"]
    );

    let service = &report.class("shop.service.OrderService").unwrap().metrics;
    assert_eq!(service.dit, 1);
    assert_eq!(service.cbo, 1);
    assert_eq!(
        service.dependencies_out,
        vec!["shop.model.Customer", "shop.model.Order", "shop.service.BaseService"]
    );
}

#[test]
fn test_wildcard_import_resolves_through_batch() {
    let report = run_shop();
    let audit = report.class("shop.service.AuditService").unwrap();

    let order_edge = audit
        .dependencies
        .iter()
        .find(|e| e.to.candidates().contains(&"shop.model.Order"))
        .expect("AuditService should depend on Order");
    assert!(matches!(order_edge.to, ResolvedType::Ambiguous { .. }));

    assert_eq!(
        audit.metrics.dependencies_out,
        vec!["shop.model.Order", "shop.service.BaseService"]
    );
    assert!(report.ambiguities.is_empty());
}

#[test]
fn test_shop_smells() {
    let report = run_shop();

    let customer = report.class("shop.model.Customer").unwrap();
    let kinds: Vec<_> = customer.smells.iter().map(|s| s.kind).collect();
    assert_eq!(kinds, vec![SmellKind::DataClass]);
    assert_eq!(customer.smells[0].line, 3);

    let service = report.class("shop.service.OrderService").unwrap();
    let lpl: Vec<_> = service
        .smells
        .iter()
        .filter(|s| s.kind == SmellKind::LongParameterList)
        .collect();
    assert_eq!(lpl.len(), 1);
    assert_eq!(lpl[0].member.as_deref(), Some("register"));
    assert_eq!(lpl[0].line, 13);

    let envy = service
        .smells
        .iter()
        .find(|s| s.kind == SmellKind::FeatureEnvy)
        .expect("describe() should envy Customer and Order");
    assert_eq!(envy.member.as_deref(), Some("describe"));

    // Order has real behaviour in addItem()
    assert!(report.class("shop.model.Order").unwrap().smells.is_empty());
    assert_eq!(report.counts.smells_found, report.smells().count());
}

#[test]
fn test_test_sources_when_enabled() {
    let config = AnalysisConfig {
        include_test_files: Some(true),
        ..shop_config()
    };
    let report = AnalysisOrchestrator::new(config)
        .run_path(testdata_path().join("shop"), RevisionId::default())
        .unwrap();

    assert!(report.class("shop.service.OrderServiceTest").is_some());
    assert_eq!(report.counts.classes_found, 6);
}

#[test]
fn test_report_json() {
    let report = run_shop();
    let json = report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["revision"]["repository_id"], "shop");
    assert_eq!(value["counts"]["classes_found"], 5);
    assert_eq!(
        value["classes"]["shop.model.Customer"]["smells"][0]["kind"],
        "data_class"
    );
    assert_eq!(value["failures"][0]["kind"], "parse");
    assert_eq!(value["thresholds"]["long_parameter_list"], 5);
}

#[test]
fn test_empty_directory_is_empty_batch() {
    let temp = tempfile::TempDir::new().unwrap();
    let err = AnalysisOrchestrator::default()
        .run_path(temp.path(), RevisionId::default())
        .unwrap_err();
    assert!(matches!(err, AnalysisError::EmptyBatch { failures: 0 }));
}

#[test]
fn test_parallel_and_sequential_agree() {
    let sequential = AnalysisConfig {
        parallel: false,
        ..shop_config()
    };
    let a = AnalysisOrchestrator::new(sequential)
        .run_path(testdata_path().join("shop"), RevisionId::new("shop", "r1"))
        .unwrap();
    assert_eq!(a, run_shop());
}
