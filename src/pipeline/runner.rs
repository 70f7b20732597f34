//! pipeline::runner
//!
//! The [`Pipeline`] orchestrator.
//!
//! A pipeline owns its collaborators, injected at construction. Every run
//! recomputes everything from the code source; nothing is carried over
//! between runs except the artifact file itself, which is fully replaced.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use countmap::core::codes::CodeSource;
//! use countmap::geo::countries::CountryTable;
//! use countmap::geo::mock::MockGeocoder;
//! use countmap::geo::resolver::{CountryCodeResolver, GeoResolver};
//! use countmap::pipeline::Pipeline;
//! use countmap::store::mock::MemoryStore;
//!
//! # tokio_test::block_on(async {
//! let dir = tempfile::TempDir::new().unwrap();
//! let pipeline = Pipeline::new(
//!     Arc::new(MemoryStore::with_codes(["2501", "2502"])),
//!     CountryCodeResolver::new(Arc::new(CountryTable::new())),
//!     GeoResolver::new(Arc::new(MockGeocoder::new().with_point("FR", 46.6, 1.9))),
//!     dir.path().join("map.html"),
//! );
//!
//! let report = pipeline
//!     .run(&CodeSource::from_pairs([("250", "France")]))
//!     .await
//!     .unwrap();
//! assert_eq!(report.markers, 1);
//! # });
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::Instrument;
use uuid::Uuid;

use super::aggregate::{aggregate, retain_non_empty};
use super::{PipelineError, RunReport};
use crate::core::codes::CodeSource;
use crate::core::config::Config;
use crate::core::lock::RunLock;
use crate::core::types::{MapRecord, ResolvedCountry};
use crate::geo::countries::CountryTable;
use crate::geo::nominatim::NominatimGeocoder;
use crate::geo::resolver::{CountryCodeResolver, GeoResolver};
use crate::render::{inject_metadata_file, MapAssembler, MapOptions, Metadata};
use crate::store::{create_store, CountStore};

/// Sequences one map rebuild.
pub struct Pipeline {
    store: Arc<dyn CountStore>,
    codes: CountryCodeResolver,
    geo: GeoResolver,
    assembler: MapAssembler,
    artifact_path: PathBuf,
    metadata: Option<Metadata>,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn CountStore>,
        codes: CountryCodeResolver,
        geo: GeoResolver,
        artifact_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            store,
            codes,
            geo,
            assembler: MapAssembler::default(),
            artifact_path: artifact_path.into(),
            metadata: None,
        }
    }

    /// Build a pipeline from configuration with the real adapters.
    ///
    /// Metadata injection follows `map.inject_metadata`.
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let store = create_store(config).map_err(|e| PipelineError::Config(e.to_string()))?;

        let geocoder = NominatimGeocoder::new(config.geocoder_url(), config.geocoder_user_agent())
            .with_timeout(config.lookup_timeout())
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let codes = CountryCodeResolver::new(Arc::new(CountryTable::new()))
            .with_timeout(config.lookup_timeout());
        let geo = GeoResolver::new(Arc::new(geocoder))
            .with_timeout(config.lookup_timeout())
            .with_min_interval(config.geocoder_min_interval());

        let options = MapOptions::default().with_quantity_label(config.quantity_label());
        let metadata = config
            .inject_metadata()
            .then(|| Metadata::new(config.icon_href(), config.title()));

        Ok(Self::new(store, codes, geo, config.artifact_path())
            .with_map_options(options)
            .with_metadata(metadata))
    }

    pub fn with_map_options(mut self, options: MapOptions) -> Self {
        self.assembler = MapAssembler::new(options);
        self
    }

    /// Inject metadata after persisting; `None` skips the step.
    pub fn with_metadata(mut self, metadata: Option<Metadata>) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_artifact_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.artifact_path = path.into();
        self
    }

    pub fn artifact_path(&self) -> &Path {
        &self.artifact_path
    }

    /// Rebuild the map from `source`.
    ///
    /// # Errors
    ///
    /// Fails on an invalid specification, an unreachable store, a held run
    /// lock, or a persistence failure. On any failure before persisting, the
    /// previous artifact is left as it was.
    pub async fn run(&self, source: &CodeSource) -> Result<RunReport, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        let span = tracing::info_span!("run", run_id = %run_id, store = self.store.name());
        self.run_inner(run_id, source).instrument(span).await
    }

    async fn run_inner(
        &self,
        run_id: String,
        source: &CodeSource,
    ) -> Result<RunReport, PipelineError> {
        let started_at = Utc::now();
        let _lock = RunLock::acquire(&self.artifact_path)?;

        tracing::info!(entries = source.len(), "aggregating");
        let quantities = aggregate(self.store.as_ref(), source).await?;
        let aggregated = quantities.len();

        let quantities = retain_non_empty(quantities);
        let non_empty = quantities.len();
        tracing::info!(aggregated, non_empty, "filtered empty countries");

        let names = quantities.countries();
        let standard = self.codes.resolve(&names).await;
        let resolved: Vec<ResolvedCountry> = quantities
            .into_iter()
            .zip(standard)
            .map(|(row, code)| ResolvedCountry {
                country: row.country,
                quantity: row.quantity,
                code,
            })
            .collect();
        let unknown_countries: Vec<String> = resolved
            .iter()
            .filter(|r| !r.code.is_known())
            .map(|r| r.country.clone())
            .collect();
        tracing::info!(
            resolved = resolved.len() - unknown_countries.len(),
            unknown = unknown_countries.len(),
            "resolved country codes"
        );

        let codes: Vec<_> = resolved.iter().map(|r| r.code.clone()).collect();
        let points = self.geo.locate(&codes).await;
        let records: Vec<MapRecord> = resolved
            .into_iter()
            .zip(points)
            .map(|(r, location)| MapRecord {
                country: r.country,
                quantity: r.quantity,
                location,
            })
            .collect();
        let missing_countries: Vec<String> = records
            .iter()
            .filter(|r| r.location.is_missing())
            .map(|r| r.country.clone())
            .collect();
        tracing::info!(
            located = records.len() - missing_countries.len(),
            missing = missing_countries.len(),
            "located countries"
        );

        let document = self.assembler.assemble(&records);
        let mut artifact = document
            .save(&self.artifact_path)
            .map_err(PipelineError::Persist)?;
        tracing::info!(
            path = %artifact.path.display(),
            markers = document.markers().len(),
            "map persisted"
        );

        let metadata_injected = match &self.metadata {
            Some(metadata) => {
                artifact = inject_metadata_file(&self.artifact_path, metadata)
                    .map_err(PipelineError::Metadata)?;
                tracing::info!(title = %metadata.title, "metadata injected");
                true
            }
            None => false,
        };

        Ok(RunReport {
            run_id,
            started_at,
            aggregated,
            non_empty,
            codes_resolved: records.len() - unknown_countries.len(),
            codes_unknown: unknown_countries.len(),
            located: records.len() - missing_countries.len(),
            missing: missing_countries.len(),
            markers: document.markers().len(),
            unknown_countries,
            missing_countries,
            artifact_path: artifact.path,
            artifact_digest: artifact.digest,
            metadata_injected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ConfigFile, MapConfig};
    use crate::geo::mock::MockGeocoder;
    use crate::store::mock::MemoryStore;
    use tempfile::TempDir;

    fn pipeline(store: MemoryStore, geocoder: MockGeocoder, path: PathBuf) -> Pipeline {
        Pipeline::new(
            Arc::new(store),
            CountryCodeResolver::new(Arc::new(CountryTable::new())),
            GeoResolver::new(Arc::new(geocoder)),
            path,
        )
    }

    #[tokio::test]
    async fn run_reports_statistics() {
        let temp = TempDir::new().unwrap();
        let store = MemoryStore::with_codes(["2501", "2502", "148", "999"]);
        let geocoder = MockGeocoder::new()
            .with_point("FR", 46.6, 1.9)
            .with_point("TD", 15.4, 18.7);
        let source = CodeSource::from_pairs([
            ("250", "France"),
            ("148", "Chad"),
            ("999", "Atlantis"),
            ("276", "Germany"),
        ]);

        let report = pipeline(store, geocoder, temp.path().join("map.html"))
            .run(&source)
            .await
            .unwrap();

        assert_eq!(report.aggregated, 4);
        assert_eq!(report.non_empty, 3);
        assert_eq!(report.codes_resolved, 2);
        assert_eq!(report.codes_unknown, 1);
        assert_eq!(report.unknown_countries, vec!["Atlantis"]);
        assert_eq!(report.missing_countries, vec!["Atlantis"]);
        assert_eq!(report.markers, 2);
        assert!(!report.metadata_injected);
    }

    #[tokio::test]
    async fn metadata_step_runs_when_configured() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("map.html");
        let report = pipeline(MemoryStore::new(), MockGeocoder::new(), path.clone())
            .with_metadata(Some(Metadata::default()))
            .run(&CodeSource::default())
            .await
            .unwrap();

        assert!(report.metadata_injected);
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("<title>MSB Map</title>"));
        assert_eq!(report.artifact_digest, crate::render::artifact::digest(&html));
    }

    #[tokio::test]
    async fn held_lock_fails_fast() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("map.html");
        let _held = RunLock::acquire(&path).unwrap();

        let err = pipeline(MemoryStore::new(), MockGeocoder::new(), path.clone())
            .run(&CodeSource::default())
            .await
            .unwrap_err();

        assert_eq!(err.step(), super::super::PipelineStep::Lock);
        assert!(!path.exists());
    }

    #[test]
    fn from_config_uses_map_settings() {
        let config = Config::from_file(ConfigFile {
            artifact_path: Some("out/map.html".into()),
            map: Some(MapConfig {
                inject_metadata: Some(true),
                title: Some("Counts".into()),
                ..Default::default()
            }),
            ..Default::default()
        })
        .unwrap();

        let pipeline = Pipeline::from_config(&config).unwrap();
        assert_eq!(pipeline.artifact_path(), Path::new("out/map.html"));
        assert_eq!(
            pipeline.metadata.as_ref().map(|m| m.title.as_str()),
            Some("Counts")
        );
    }
}
