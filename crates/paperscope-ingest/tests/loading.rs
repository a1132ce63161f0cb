use std::path::{Path, PathBuf};
use std::time::Duration;

use paperscope_ingest::{
    DataSource, LoadError, LoadOptions, Origin, SampleOptions, load_first_available,
    load_or_sample, load_source,
};

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn quick_options(sample_fallback: bool) -> LoadOptions {
    LoadOptions {
        timeout: Duration::from_millis(500),
        sample_fallback,
        sample: SampleOptions {
            count: 12,
            seed: Some(1),
        },
    }
}

#[tokio::test]
async fn loads_wrapped_document_and_normalizes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        dir.path(),
        "papers.json",
        r#"{"papers": [
            {"paper_number": 2, "title": "Cavity Tuning", "figures": ["a", "b"], "pages": 7},
            {"paper_number": 1, "title": "Ion Sources", "institutions": ["KEK"], "figure_count": 4}
        ]}"#,
    );

    let papers = load_source(&DataSource::File(path), &LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(papers.len(), 2);
    assert_eq!(papers[0].figures, 2);
    assert_eq!(papers[0].page_count, 7);
    assert_eq!(papers[1].affiliations, vec!["KEK"]);
    assert_eq!(papers[1].figures, 4);
}

#[tokio::test]
async fn loads_bare_array() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "bare.json", r#"[{"title": "Only"}]"#);
    let papers = load_source(&DataSource::File(path), &LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(papers.len(), 1);
    assert_eq!(papers[0].title, "Only");
}

#[tokio::test]
async fn reports_each_failure_kind() {
    let dir = tempfile::tempdir().unwrap();
    let opts = LoadOptions::default();

    let missing = DataSource::File(dir.path().join("missing.json"));
    assert!(matches!(
        load_source(&missing, &opts).await,
        Err(LoadError::Io { .. })
    ));

    let garbage = DataSource::File(write(dir.path(), "bad.json", "{not json"));
    assert!(matches!(
        load_source(&garbage, &opts).await,
        Err(LoadError::Json(_))
    ));

    let wrong_shape = DataSource::File(write(dir.path(), "obj.json", r#"{"items": []}"#));
    assert!(matches!(
        load_source(&wrong_shape, &opts).await,
        Err(LoadError::MissingPapers)
    ));
}

#[tokio::test]
async fn first_available_skips_failures_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let second = write(dir.path(), "second.json", r#"{"papers": [{"title": "Second"}]}"#);
    let third = write(dir.path(), "third.json", r#"{"papers": [{"title": "Third"}]}"#);
    let sources = vec![
        DataSource::File(dir.path().join("first.json")),
        DataSource::File(second.clone()),
        DataSource::File(third),
    ];

    let (source, papers) = load_first_available(&sources, &LoadOptions::default())
        .await
        .unwrap();
    assert_eq!(source, DataSource::File(second));
    assert_eq!(papers[0].title, "Second");
}

#[tokio::test]
async fn first_available_returns_last_error() {
    let dir = tempfile::tempdir().unwrap();
    let sources = vec![
        DataSource::File(dir.path().join("missing.json")),
        DataSource::File(write(dir.path(), "bad.json", "[")),
    ];
    assert!(matches!(
        load_first_available(&sources, &LoadOptions::default()).await,
        Err(LoadError::Json(_))
    ));
    assert!(matches!(
        load_first_available(&[], &LoadOptions::default()).await,
        Err(LoadError::NoSources)
    ));
}

#[tokio::test]
async fn unreachable_url_is_a_load_failure() {
    let source = DataSource::Url("http://127.0.0.1:9/papers.json".to_string());
    assert!(matches!(
        load_source(&source, &quick_options(true)).await,
        Err(LoadError::Http(_))
    ));
}

#[tokio::test]
async fn falls_back_to_sample_data() {
    let dir = tempfile::tempdir().unwrap();
    let sources = vec![DataSource::File(dir.path().join("missing.json"))];

    let dataset = load_or_sample(&sources, &quick_options(true)).await;
    assert_eq!(dataset.origin, Origin::Sample);
    assert_eq!(dataset.papers.len(), 12);
}

#[tokio::test]
async fn empty_dataset_when_fallback_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let sources = vec![DataSource::File(dir.path().join("missing.json"))];

    let dataset = load_or_sample(&sources, &quick_options(false)).await;
    assert_eq!(dataset.origin, Origin::Empty);
    assert!(dataset.papers.is_empty());
}

#[tokio::test]
async fn successful_source_is_reported_as_origin() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(dir.path(), "papers.json", r#"{"papers": []}"#);
    let dataset = load_or_sample(&[DataSource::File(path.clone())], &quick_options(true)).await;
    assert_eq!(dataset.origin, Origin::Source(DataSource::File(path)));
    assert!(dataset.papers.is_empty());
}
