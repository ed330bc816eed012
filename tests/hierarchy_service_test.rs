//! Tests for HierarchyService

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use csvtree::application::services::HierarchyService;
use csvtree::application::ApplicationError;
use csvtree::config::Settings;
use csvtree::domain::{BuildWarning, DomainError, Node, ResourceUrl};
use csvtree::infrastructure::di::ServiceContainer;
use csvtree::infrastructure::{CsvRowSource, RealFileSystem};

const CSV: &str = "\
Parent,Child,Subchild,Resource_Name,Tooltip,URL
A,B,,R1,,https://x.org/p
A,B,,R2,,unknown
A,Orphan,,R3,,
,Lost,,R4,,
unknown,,Drift,R5,,
";

/// Helper to create a temp CSV file for testing
fn create_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, content).expect("write csv");
    path
}

fn service(settings: Settings) -> HierarchyService {
    HierarchyService::new(
        Arc::new(RealFileSystem),
        Arc::new(CsvRowSource),
        Arc::new(settings),
    )
}

#[test]
fn given_csv_when_building_then_reports_tree_and_findings() {
    let temp = TempDir::new().unwrap();
    let input = create_csv(&temp, "catalog.csv", CSV);

    let report = service(Settings::default()).build(&input).unwrap();

    let b = report.tree.find_path(&["A", "B"]).unwrap();
    assert_eq!(b.children[0].url, Some(ResourceUrl::Domain("x.org".into())));
    assert_eq!(b.children[1].url, Some(ResourceUrl::Unavailable));
    assert_eq!(report.rows, 5);
    assert_eq!(report.skipped_rows, vec![4, 5]);
    assert!(report.dangling.dangling_children.contains("Lost"));
    assert!(report.dangling.dangling_subchildren.contains("Drift"));
    assert!(!report.placeholder_leak);
    assert!(!report.is_clean());
    assert!(report
        .warnings()
        .contains(&BuildWarning::SkippedRow { row: 4 }));
}

#[test]
fn given_clean_csv_when_building_then_no_warnings() {
    let temp = TempDir::new().unwrap();
    let input = create_csv(&temp, "ok.csv", "parent,resource_name\nA,R1\n");

    let report = service(Settings::default()).build(&input).unwrap();

    assert!(report.is_clean());
    assert!(report.warnings().is_empty());
}

#[test]
fn given_resource_shadowing_category_when_building_then_warns() {
    let temp = TempDir::new().unwrap();
    let input = create_csv(
        &temp,
        "clash.csv",
        "parent,child,resource_name\nA,,B\nA,B,R\n",
    );

    let report = service(Settings::default()).build(&input).unwrap();

    assert!(!report.is_clean());
    assert_eq!(
        report.warnings(),
        vec![BuildWarning::NameCollision {
            path: "A".into(),
            name: "B".into()
        }]
    );
}

#[test]
fn given_row_without_resource_when_building_then_domain_error() {
    let temp = TempDir::new().unwrap();
    let input = create_csv(&temp, "bad.csv", "parent,resource_name\nA,R1\nB,\n");

    let err = service(Settings::default()).build(&input).unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::MissingResourceName { row: 2 })
    ));
}

#[test]
fn given_missing_input_when_building_then_operation_failed() {
    let temp = TempDir::new().unwrap();

    let err = service(Settings::default())
        .build(&temp.path().join("nope.csv"))
        .unwrap_err();

    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
    assert!(err.to_string().contains("nope.csv"));
}

#[test]
fn given_report_when_writing_artifacts_then_json_parses_back_and_html_embeds_it() {
    let temp = TempDir::new().unwrap();
    let input = create_csv(&temp, "catalog.csv", CSV);
    let svc = service(Settings::default());
    let report = svc.build(&input).unwrap();
    let json_path = temp.path().join("out/catalog_tree.json");
    let html_path = temp.path().join("out/catalog_tree.html");

    let artifacts = svc
        .write_artifacts(&report.tree, Some(&json_path), Some(&html_path))
        .unwrap();

    assert_eq!(artifacts.json.as_deref(), Some(json_path.as_path()));
    let json = std::fs::read_to_string(&json_path).unwrap();
    let parsed: Node = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, report.tree);
    assert!(json.contains("\n  \"children\": ["));
    let html = std::fs::read_to_string(&html_path).unwrap();
    assert!(html.contains("<title>Resource Tree</title>"));
    assert!(html.contains("\"name\": \"R1\""));
}

#[test]
fn given_no_output_dir_when_deriving_paths_then_next_to_input() {
    let svc = service(Settings::default());

    let path = svc.default_output_path(&PathBuf::from("/data/catalog.csv"), "html");

    assert_eq!(path, PathBuf::from("/data/catalog_tree.html"));
}

#[test]
fn given_output_dir_when_deriving_paths_then_inside_it() {
    let svc = service(Settings {
        output_dir: Some(PathBuf::from("/srv/trees")),
        ..Settings::default()
    });

    let path = svc.default_output_path(&PathBuf::from("/data/catalog.csv"), "json");

    assert_eq!(path, PathBuf::from("/srv/trees/catalog_tree.json"));
}

#[test]
fn given_rows_when_summarizing_then_counts_levels() {
    let temp = TempDir::new().unwrap();
    let input = create_csv(&temp, "catalog.csv", CSV);
    let svc = service(Settings::default());
    let rows = svc.load_rows(&input).unwrap();

    let summary = svc.summarize(&rows);

    assert_eq!(summary.parents, vec![("A".to_string(), 3)]);
    assert_eq!(summary.children[0], ("B".to_string(), 2));
    assert_eq!(summary.subchildren, vec![("Drift".to_string(), 1)]);
}

#[test]
fn given_container_when_created_then_service_uses_settings() {
    let settings = Settings {
        root_name: "Catalog".into(),
        ..Settings::default()
    };
    let temp = TempDir::new().unwrap();
    let input = create_csv(&temp, "one.csv", "parent,resource_name\nA,R1\n");

    let container = ServiceContainer::new(settings);
    let report = container.hierarchy.build(&input).unwrap();

    assert_eq!(report.tree.name, "Catalog");
    assert_eq!(container.settings.root_name, "Catalog");
}
