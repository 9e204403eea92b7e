//! Discovery, loading and aggregation over a real directory tree.

use std::fs;
use std::path::Path;

use areview_core::{
    AnalysisResult, FileDiscoverer, PipelineConfig, Report, SourceFile, ENTRY_DELIMITER,
    REPORT_HEADER,
};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

#[tokio::test]
async fn report_sections_follow_discovery_order() {
    let dir = tempfile::tempdir().unwrap();
    let src = "app/src/main/java";
    write(dir.path(), &format!("{src}/com/shop/Order.java"), "class Order {}");
    write(dir.path(), &format!("{src}/com/shop/Cart.java"), "class Cart {}");
    write(dir.path(), &format!("{src}/com/Main.java"), "class Main {}");
    write(dir.path(), &format!("{src}/com/shop/notes.txt"), "not java");

    let config = PipelineConfig {
        repo_root: dir.path().to_path_buf(),
        ..PipelineConfig::default()
    };
    let files = FileDiscoverer::from_config(&config).discover().unwrap();

    let mut results = Vec::new();
    for path in &files {
        let source = SourceFile::load(path).await.unwrap();
        results.push(AnalysisResult::succeeded(
            path,
            format!("## {}\n{}", source.display_name(), source.content),
        ));
    }
    let report = Report::aggregate(&results);

    let names: Vec<_> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["Main.java", "Cart.java", "Order.java"]);

    let expected = format!(
        "{REPORT_HEADER}## Main.java\nclass Main {{}}{ENTRY_DELIMITER}\
         ## Cart.java\nclass Cart {{}}{ENTRY_DELIMITER}\
         ## Order.java\nclass Order {{}}{ENTRY_DELIMITER}"
    );
    assert_eq!(report.as_str(), expected);
    assert_eq!(report.entries(), 3);
}

#[tokio::test]
async fn rewritten_report_replaces_previous_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("docs/Task-3C/smells_and_refactored.md");

    let long = Report::aggregate(&[
        AnalysisResult::succeeded(Path::new("A.java"), "a".repeat(500)),
        AnalysisResult::succeeded(Path::new("B.java"), "b".repeat(500)),
    ]);
    long.write_to(&path).await.unwrap();

    let empty = Report::aggregate(&[]);
    empty.write_to(&path).await.unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), REPORT_HEADER);
    assert_ne!(long.digest(), empty.digest());
}

#[tokio::test]
async fn invalid_utf8_is_loaded_lossily() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Legacy.java");
    fs::write(&path, b"class Legacy { String s = \"caf\xe9\"; }").unwrap();

    let source = SourceFile::load(&path).await.unwrap();
    assert!(source.content.contains('\u{FFFD}'));
    assert_eq!(source.size, 35);
}
