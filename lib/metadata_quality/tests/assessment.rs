use async_trait::async_trait;
use metadata_quality::{Dimension, Profile, QualityEngine, ShaclReport, ShaclViolation};
use rdf_graph::MetadataGraph;
use std::path::Path;
use std::sync::Arc;
use url_checker::cache::{CheckMethod, Clock, SystemClock, UrlCache};
use url_checker::probe::{ProbeOutcome, UrlProbe};
use url_checker::{UrlChecker, UrlCheckerConfig};
use vocabulary_index::VocabularyIndex;

const TWO_METRIC_PROFILE: &str = r#"{
    "id": "test_profile",
    "version": "1.0.0",
    "dimensions": {
        "findability": [
            {"id": "dct_title", "property": "dct:title", "weight": 30,
             "scope": "dataset", "check": "presence"}
        ],
        "interoperability": [
            {"id": "dct_format_vocabulary", "property": "dct:format", "weight": 20,
             "scope": "distribution", "check": "vocabulary", "vocabulary": "file_types"}
        ]
    }
}"#;

const CATALOG_TURTLE: &str = r#"
@prefix dcat: <http://www.w3.org/ns/dcat#> .
@prefix dct: <http://purl.org/dc/terms/> .
<http://example.org/ds1> a dcat:Dataset ;
    dct:title "Open Data" .
<http://example.org/dist1> a dcat:Distribution ;
    dct:format "CSV" .
"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_vocabularies(dir: &Path) {
    std::fs::write(
        dir.join("file_types.jsonl"),
        concat!(
            "{\"source\": \"docs/vocabularies/file_types.csv\", \"name\": \"file_types\", \"count\": 2}\n",
            "{\"uri\": \"http://publications.europa.eu/resource/authority/file-type/CSV\", \"label\": \"CSV\"}\n",
            "{\"uri\": \"http://publications.europa.eu/resource/authority/file-type/JSON\", \"label\": \"JSON\"}\n",
        ),
    )
    .unwrap();
}

fn engine_with(vocabulary_dir: &Path) -> QualityEngine {
    let vocabularies = Arc::new(VocabularyIndex::new(vocabulary_dir));
    let url_checker = Arc::new(UrlChecker::new(UrlCheckerConfig::default()).unwrap());
    QualityEngine::new(vocabularies, url_checker)
}

struct AlwaysUp;

#[async_trait]
impl UrlProbe for AlwaysUp {
    async fn probe(&self, _url: &str) -> ProbeOutcome {
        ProbeOutcome {
            accessible: true,
            status: Some(200),
            method: CheckMethod::Head,
        }
    }
}

fn engine_with_fake_network(vocabulary_dir: &Path) -> QualityEngine {
    let vocabularies = Arc::new(VocabularyIndex::new(vocabulary_dir));
    let config = UrlCheckerConfig::default();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let cache = Arc::new(UrlCache::new(config.cache_ttl, clock.clone()));
    let url_checker = Arc::new(UrlChecker::with_parts(
        config,
        Arc::new(AlwaysUp),
        cache,
        clock,
    ));
    QualityEngine::new(vocabularies, url_checker)
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

#[tokio::test]
async fn test_presence_and_vocabulary_scenario() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    write_vocabularies(dir.path());
    let engine = engine_with(dir.path());
    let profile = Profile::from_json(TWO_METRIC_PROFILE).unwrap();
    let graph = MetadataGraph::parse(CATALOG_TURTLE, None).unwrap();

    let result = engine.assess(&graph, &profile).await.unwrap();
    let title = result.metrics.iter().find(|m| m.id == "dct_title").unwrap();
    assert_close(title.score, 30.0);
    assert_eq!(title.total_entities, 1);
    assert_eq!(title.compliant_entities, 1);
    let format = result
        .metrics
        .iter()
        .find(|m| m.id == "dct_format_vocabulary")
        .unwrap();
    assert_close(format.score, 20.0);
    assert_close(result.total_score, 50.0);
    assert_close(result.max_score, 50.0);
    assert_close(result.percentage, 100.0);
}

#[rstest::rstest]
#[case("CSV", 20.0, 1)]
#[case("Excel", 0.0, 0)]
#[tokio::test]
async fn test_vocabulary_matching_drives_score(
    #[case] format_value: &str,
    #[case] expected_score: f64,
    #[case] expected_compliant: u64,
) {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    write_vocabularies(dir.path());
    let engine = engine_with(dir.path());
    let profile = Profile::from_json(TWO_METRIC_PROFILE).unwrap();
    let turtle = CATALOG_TURTLE.replace("CSV", format_value);
    let graph = MetadataGraph::parse(&turtle, None).unwrap();

    let result = engine.assess(&graph, &profile).await.unwrap();
    let format = result
        .metrics
        .iter()
        .find(|m| m.id == "dct_format_vocabulary")
        .unwrap();
    assert_close(format.score, expected_score);
    assert_eq!(format.compliant_entities, expected_compliant);
    assert_eq!(format.total_entities, 1);
    assert_close(result.total_score, 30.0 + expected_score);
}

#[tokio::test]
async fn test_missing_vocabulary_degrades_without_error() {
    init_logging();
    // No vocabulary files at all: the check scores zero, nothing fails.
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(dir.path());
    let profile = Profile::from_json(TWO_METRIC_PROFILE).unwrap();
    let graph = MetadataGraph::parse(CATALOG_TURTLE, None).unwrap();

    let result = engine.assess(&graph, &profile).await.unwrap();
    let format = result
        .metrics
        .iter()
        .find(|m| m.id == "dct_format_vocabulary")
        .unwrap();
    assert_close(format.score, 0.0);
    assert_close(result.total_score, 30.0);
}

#[tokio::test]
async fn test_empty_graph_yields_zero_result() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(dir.path());
    let profile = Profile::from_json(TWO_METRIC_PROFILE).unwrap();
    let graph = MetadataGraph::new(oxrdf::Graph::new());

    let result = engine.assess(&graph, &profile).await.unwrap();
    assert_close(result.total_score, 0.0);
    assert_close(result.max_score, 50.0);
    assert_close(result.percentage, 0.0);
    assert_eq!(result.metrics.len(), 2);
    assert!(result.metrics.iter().all(|m| !m.found));
    assert!(result.metrics.iter().all(|m| m.score == 0.0));
}

#[tokio::test]
async fn test_assessment_is_idempotent() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    write_vocabularies(dir.path());
    let engine = engine_with(dir.path());
    let profile = Profile::from_json(TWO_METRIC_PROFILE).unwrap();
    let graph = MetadataGraph::parse(CATALOG_TURTLE, None).unwrap();

    let first = engine.assess(&graph, &profile).await.unwrap();
    let second = engine.assess(&graph, &profile).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_multi_scope_counts_datasets_and_distributions() {
    init_logging();
    let profile_json = r#"{
        "id": "multi", "version": "1",
        "dimensions": {
            "contextuality": [
                {"id": "dct_title", "property": "dct:title", "weight": 30,
                 "scope": "multi", "check": "presence"}
            ]
        }
    }"#;
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(dir.path());
    let profile = Profile::from_json(profile_json).unwrap();
    // Only the dataset carries a title.
    let graph = MetadataGraph::parse(CATALOG_TURTLE, None).unwrap();

    let result = engine.assess(&graph, &profile).await.unwrap();
    let title = result.metrics.iter().find(|m| m.id == "dct_title").unwrap();
    assert_eq!(title.total_entities, 2);
    assert_eq!(title.compliant_entities, 1);
    assert_close(title.score, 15.0);
    assert_close(title.compliance_percentage, 50.0);
}

#[tokio::test]
async fn test_whitespace_literal_is_absent() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(dir.path());
    let profile = Profile::from_json(TWO_METRIC_PROFILE).unwrap();
    let turtle = CATALOG_TURTLE.replace("\"Open Data\"", "\"   \"");
    let graph = MetadataGraph::parse(&turtle, None).unwrap();

    let result = engine.assess(&graph, &profile).await.unwrap();
    let title = result.metrics.iter().find(|m| m.id == "dct_title").unwrap();
    assert_eq!(title.total_entities, 1);
    assert_eq!(title.compliant_entities, 0);
    assert_close(title.score, 0.0);
}

#[tokio::test]
async fn test_shacl_fold_in_is_binary() {
    init_logging();
    let profile_json = r#"{
        "id": "with_compliance", "version": "1",
        "dimensions": {
            "findability": [
                {"id": "dct_title", "property": "dct:title", "weight": 30,
                 "scope": "dataset", "check": "presence"}
            ],
            "interoperability": [
                {"id": "dcat_ap_compliance", "property": "dct:identifier", "weight": 30,
                 "scope": "catalog", "check": "external_compliance"}
            ]
        }
    }"#;
    let turtle = r#"
    @prefix dcat: <http://www.w3.org/ns/dcat#> .
    @prefix dct: <http://purl.org/dc/terms/> .
    <http://example.org/catalog> a dcat:Catalog .
    <http://example.org/ds1> a dcat:Dataset ;
        dct:title "Open Data" .
    "#;
    let dir = tempfile::tempdir().unwrap();
    let engine = engine_with(dir.path());
    let profile = Profile::from_json(profile_json).unwrap();
    let graph = MetadataGraph::parse(turtle, None).unwrap();

    let result = engine.assess(&graph, &profile).await.unwrap();
    let compliance = result
        .metrics
        .iter()
        .find(|m| m.id == "dcat_ap_compliance")
        .unwrap();
    assert_close(compliance.score, 0.0);
    assert_close(result.total_score, 30.0);

    // A conforming report awards the full weight.
    let conforming = ShaclReport {
        conforms: true,
        violations: vec![],
    };
    let folded = engine.fold_in_compliance(result, &conforming);
    let compliance = folded
        .metrics
        .iter()
        .find(|m| m.id == "dcat_ap_compliance")
        .unwrap();
    assert_close(compliance.score, 30.0);
    assert_close(folded.total_score, 60.0);
    let interoperability = folded
        .by_dimension
        .get(&Dimension::Interoperability)
        .unwrap();
    assert_close(interoperability.score, 30.0);

    // Folding a failing report over the nonzero placeholder zeroes it again
    // and recomputes every aggregate.
    let failing = ShaclReport {
        conforms: false,
        violations: vec![ShaclViolation {
            severity: Some("Violation".to_string()),
            focus_node: Some("http://example.org/ds1".to_string()),
            path: Some("http://purl.org/dc/terms/title".to_string()),
            message: Some("missing language tag".to_string()),
        }],
    };
    let refolded = engine.fold_in_compliance(folded, &failing);
    let compliance = refolded
        .metrics
        .iter()
        .find(|m| m.id == "dcat_ap_compliance")
        .unwrap();
    assert_close(compliance.score, 0.0);
    assert_close(refolded.total_score, 30.0);
    let interoperability = refolded
        .by_dimension
        .get(&Dimension::Interoperability)
        .unwrap();
    assert_close(interoperability.score, 0.0);
    let flat: f64 = refolded.metrics.iter().map(|m| m.score).sum();
    assert_close(flat, refolded.total_score);
}

#[tokio::test]
async fn test_bundled_profile_end_to_end() {
    init_logging();
    let turtle = r#"
    @prefix dcat: <http://www.w3.org/ns/dcat#> .
    @prefix dct: <http://purl.org/dc/terms/> .
    @prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#> .
    <http://example.org/catalog> a dcat:Catalog ;
        dcat:dataset <http://example.org/ds1> .
    <http://example.org/ds1> a dcat:Dataset ;
        dct:title "Calidad del aire"@es ;
        dct:description "Mediciones horarias"@es ;
        dcat:keyword "aire", "calidad" ;
        dcat:theme <http://publications.europa.eu/resource/authority/data-theme/ENVI> ;
        dcat:distribution <http://example.org/dist1> .
    <http://example.org/dist1> a dcat:Distribution ;
        dct:title "CSV"@es ;
        dct:description "Descarga CSV"@es ;
        dcat:accessURL <https://datos.example.org/air.csv> ;
        dcat:downloadURL <https://datos.example.org/air.csv> ;
        dct:format [ rdfs:label "CSV" ] .
    "#;
    let dir = tempfile::tempdir().unwrap();
    write_vocabularies(dir.path());
    let engine = engine_with_fake_network(dir.path());
    let profile = Profile::bundled(metadata_quality::DCAT_AP_ES).unwrap();
    let graph = MetadataGraph::parse(turtle, None).unwrap();

    let result = engine.assess(&graph, &profile).await.unwrap();
    assert_close(result.max_score, 455.0);

    // Both URL checks succeed and the download URL is present.
    let accessibility = result.by_dimension.get(&Dimension::Accessibility).unwrap();
    assert_close(accessibility.score, 100.0);
    assert_close(accessibility.percentage, 100.0);

    // Keyword and theme present, spatial and temporal missing.
    let findability = result.by_dimension.get(&Dimension::Findability).unwrap();
    assert_close(findability.score, 60.0);

    // The blank dct:format node matches `file_types` through rdfs:label.
    let format = result
        .metrics
        .iter()
        .find(|m| m.id == "dct_format_vocabulary")
        .unwrap();
    assert_close(format.score, 10.0);

    // Title and description are present on both entity classes.
    let title = result.metrics.iter().find(|m| m.id == "dct_title").unwrap();
    assert_eq!(title.total_entities, 2);
    assert_eq!(title.compliant_entities, 2);
    assert_close(title.score, 20.0);

    // External compliance stays zero until a SHACL report is folded in.
    assert_eq!(
        result.compliance_metric_id.as_deref(),
        Some("dcat_ap_es_compliance")
    );
    let report = to_report_roundtrip(&result);
    assert!(report["@graph"].as_array().unwrap().len() >= result.metrics.len());
}

fn to_report_roundtrip(result: &metadata_quality::QualityResult) -> serde_json::Value {
    metadata_quality::report::to_dqv_document(result, Some("http://example.org/catalog"))
}
