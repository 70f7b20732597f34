//! Integration tests for the map rebuild pipeline.
//!
//! These tests run the full pipeline against in-memory stores and mock
//! geocoders, writing artifacts into temporary directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use countmap::core::codes::CodeSource;
use countmap::core::lock::RunLock;
use countmap::geo::countries::CountryTable;
use countmap::geo::mock::MockGeocoder;
use countmap::geo::resolver::{CountryCodeResolver, GeoResolver};
use countmap::geo::LookupError;
use countmap::pipeline::{aggregate, retain_non_empty, Pipeline, PipelineStep};
use countmap::render::artifact::digest;
use countmap::render::{inject_metadata, Metadata};
use countmap::store::mock::MemoryStore;
use countmap::store::StoreError;
use tempfile::TempDir;

const EN_DASH: char = '\u{2013}';

fn geocoder() -> MockGeocoder {
    MockGeocoder::new()
        .with_point("FR", 46.6, 1.9)
        .with_point("TD", 15.4, 18.7)
        .with_point("DE", 51.1, 10.4)
}

fn pipeline(store: MemoryStore, geocoder: MockGeocoder, artifact: &Path) -> Pipeline {
    Pipeline::new(
        Arc::new(store),
        CountryCodeResolver::new(Arc::new(CountryTable::new())),
        GeoResolver::new(Arc::new(geocoder)),
        artifact,
    )
}

fn artifact_in(dir: &TempDir) -> PathBuf {
    dir.path().join("templates/map.html")
}

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn prefix_family_is_counted() {
        let store = MemoryStore::with_codes(["2501", "2501", "2501", "9999"]);
        let source = CodeSource::from_pairs([("250", "France")]);

        let quantities = aggregate(&store, &source).await.unwrap();
        assert_eq!(quantities.get("France"), Some(3));
    }

    #[tokio::test]
    async fn range_crossing_digit_counts_is_exact() {
        let store = MemoryStore::with_codes(["9", "10", "115", "8"]);
        let source = CodeSource::from_pairs([(format!("9{}11", EN_DASH), "Testland".to_string())]);

        let quantities = aggregate(&store, &source).await.unwrap();
        assert_eq!(quantities.get("Testland"), Some(2));
    }

    #[tokio::test]
    async fn zero_counts_are_dropped() {
        let store = MemoryStore::with_codes(["148", "148", "148", "148", "148"]);
        let source = CodeSource::from_pairs([("250", "France"), ("148", "Chad")]);

        let quantities = retain_non_empty(aggregate(&store, &source).await.unwrap());
        assert_eq!(quantities.countries(), vec!["Chad"]);
        assert_eq!(quantities.get("Chad"), Some(5));
    }

    #[tokio::test]
    async fn unresolvable_country_is_left_off_the_map() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::with_codes(["148", "999", "2501"]);
        let source =
            CodeSource::from_pairs([("148", "Chad"), ("999", "Atlantis"), ("250", "France")]);

        let report = pipeline(store, geocoder(), &artifact_in(&dir))
            .run(&source)
            .await
            .unwrap();

        assert_eq!(report.non_empty, 3);
        assert_eq!(report.codes_unknown, 1);
        assert_eq!(report.unknown_countries, vec!["Atlantis"]);
        assert_eq!(report.missing, 1);
        assert_eq!(report.markers, 2);

        let html = fs::read_to_string(artifact_in(&dir)).unwrap();
        assert!(html.contains("Chad"));
        assert!(html.contains("France"));
        assert!(!html.contains("Atlantis"));
    }
}

mod tolerance {
    use super::*;

    #[tokio::test]
    async fn geocoder_failures_never_fail_the_run() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::with_codes(["148", "2501", "276"]);
        let geocoder = geocoder()
            .fail_on("TD", LookupError::RateLimited)
            .fail_on("DE", LookupError::NetworkError("reset".into()));
        let source =
            CodeSource::from_pairs([("148", "Chad"), ("250", "France"), ("276", "Germany")]);

        let report = pipeline(store, geocoder, &artifact_in(&dir))
            .run(&source)
            .await
            .unwrap();

        assert_eq!(report.codes_resolved, 3);
        assert_eq!(report.located, 1);
        assert_eq!(report.missing_countries, vec!["Chad", "Germany"]);
        assert_eq!(report.markers, 1);
    }

    #[tokio::test]
    async fn every_lookup_failing_still_writes_an_empty_map() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::with_codes(["148"]);
        let source = CodeSource::from_pairs([("148", "Chad")]);

        let report = pipeline(store, MockGeocoder::new(), &artifact_in(&dir))
            .run(&source)
            .await
            .unwrap();

        assert_eq!(report.markers, 0);
        assert!(artifact_in(&dir).exists());
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn unavailable_store_fails_and_keeps_previous_map() {
        let dir = TempDir::new().unwrap();
        let artifact = artifact_in(&dir);
        fs::create_dir_all(artifact.parent().unwrap()).unwrap();
        fs::write(&artifact, "previous map").unwrap();

        let store = MemoryStore::with_codes(["148"])
            .fail_with(StoreError::Unavailable("connection refused".into()));
        let err = pipeline(store, geocoder(), &artifact)
            .run(&CodeSource::from_pairs([("148", "Chad")]))
            .await
            .unwrap_err();

        assert_eq!(err.step(), PipelineStep::Aggregate);
        assert!(err.is_store_unavailable());
        assert_eq!(fs::read_to_string(&artifact).unwrap(), "previous map");
    }

    #[tokio::test]
    async fn invalid_specification_fails_without_querying() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::with_codes(["148"]);
        let source = CodeSource::from_pairs([("148", "Chad"), ("abc", "Nowhere")]);

        let err = pipeline(store.clone(), geocoder(), &artifact_in(&dir))
            .run(&source)
            .await
            .unwrap_err();

        assert_eq!(err.step(), PipelineStep::Spec);
        assert!(store.queries().is_empty());
        assert!(!artifact_in(&dir).exists());
    }

    #[tokio::test]
    async fn concurrent_run_is_refused() {
        let dir = TempDir::new().unwrap();
        let artifact = artifact_in(&dir);
        let _held = RunLock::acquire(&artifact).unwrap();

        let err = pipeline(MemoryStore::new(), geocoder(), &artifact)
            .run(&CodeSource::default())
            .await
            .unwrap_err();

        assert_eq!(err.step(), PipelineStep::Lock);
    }

    #[tokio::test]
    async fn persistence_failure_is_fatal() {
        let dir = TempDir::new().unwrap();
        // A directory where the artifact should go cannot be replaced by a file.
        let artifact = dir.path().join("map.html");
        fs::create_dir(&artifact).unwrap();
        fs::write(artifact.join("keep"), "x").unwrap();

        let err = pipeline(MemoryStore::new(), geocoder(), &artifact)
            .run(&CodeSource::default())
            .await
            .unwrap_err();

        assert_eq!(err.step(), PipelineStep::Persist);
    }
}

mod artifact {
    use super::*;

    #[tokio::test]
    async fn reruns_fully_replace_and_are_deterministic() {
        let dir = TempDir::new().unwrap();
        let artifact = artifact_in(&dir);
        let store = MemoryStore::with_codes(["148", "2501"]);
        let source = CodeSource::from_pairs([("148", "Chad"), ("250", "France")]);
        let pipeline = pipeline(store.clone(), geocoder(), &artifact);

        let first = pipeline.run(&source).await.unwrap();
        let second = pipeline.run(&source).await.unwrap();
        assert_eq!(first.artifact_digest, second.artifact_digest);
        assert_ne!(first.run_id, second.run_id);

        store.push("2502");
        let third = pipeline.run(&source).await.unwrap();
        assert_ne!(third.artifact_digest, second.artifact_digest);
        let html = fs::read_to_string(&artifact).unwrap();
        assert_eq!(digest(&html), third.artifact_digest);
        assert!(html.contains(r"<b>Medicines:<\/b> 2<br>"));
    }

    #[tokio::test]
    async fn marker_order_follows_source_order() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::with_codes(["148", "2501", "276"]);
        let source =
            CodeSource::from_pairs([("276", "Germany"), ("148", "Chad"), ("250", "France")]);

        pipeline(store, geocoder(), &artifact_in(&dir))
            .run(&source)
            .await
            .unwrap();

        let html = fs::read_to_string(artifact_in(&dir)).unwrap();
        let germany = html.find("Germany").unwrap();
        let chad = html.find("Chad").unwrap();
        let france = html.find("France").unwrap();
        assert!(germany < chad && chad < france);
    }

    #[tokio::test]
    async fn metadata_injection_after_run_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = MemoryStore::with_codes(["148"]);
        let report = pipeline(store, geocoder(), &artifact_in(&dir))
            .with_metadata(Some(Metadata::default()))
            .run(&CodeSource::from_pairs([("148", "Chad")]))
            .await
            .unwrap();

        assert!(report.metadata_injected);
        let html = fs::read_to_string(artifact_in(&dir)).unwrap();
        assert_eq!(inject_metadata(&html, &Metadata::default()).unwrap(), html);
        assert_eq!(html.matches("<title>").count(), 1);
        assert_eq!(html.matches("MSB_Logo_transparent.png").count(), 1);
    }
}
