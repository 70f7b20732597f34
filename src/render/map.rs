//! render::map
//!
//! Assembles located records into a marker-clustered world map document.
//!
//! # Rendering
//!
//! The document is a self-contained HTML page that loads Leaflet and the
//! markercluster plugin from a CDN. Marker data is embedded as a JSON array,
//! so the output depends only on the input records and options: the same
//! records always render to the same bytes.
//!
//! Records whose location is [`GeoPoint::Missing`] produce no marker.

use std::path::Path;

use serde::Serialize;
use serde_json::json;

use super::artifact::{persist, ArtifactInfo};
use super::{escape_html, RenderError};
use crate::core::types::{GeoPoint, MapRecord};

pub const DEFAULT_QUANTITY_LABEL: &str = "Medicines";
pub const DEFAULT_TILES_URL: &str =
    "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png";
pub const DEFAULT_ATTRIBUTION: &str = "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>";

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta http-equiv="content-type" content="text/html; charset=UTF-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0, maximum-scale=1.0, user-scalable=no" />
    <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
    <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.css" />
    <link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.Default.css" />
    <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
    <script src="https://unpkg.com/leaflet.markercluster@1.5.3/dist/leaflet.markercluster.js"></script>
    <style>
        html, body { width: 100%; height: 100%; margin: 0; padding: 0; }
        #map { position: absolute; top: 0; bottom: 0; right: 0; left: 0; }
    </style>
</head>
<body>
    <div id="map"></div>
    <script>
        var map = L.map("map", { center: [0, 0], zoom: 2, worldCopyJump: true });
        L.tileLayer(@@TILES@@, { attribution: @@ATTRIBUTION@@, subdomains: "abcd", maxZoom: 20 }).addTo(map);
        var cluster = L.markerClusterGroup().addTo(map);
        var markers = @@MARKERS@@;
        markers.forEach(function (m) {
            L.circleMarker([m.lat, m.lon], { radius: @@RADIUS@@, fill: true, fillOpacity: 0.7 })
                .bindPopup(L.popup({ maxWidth: @@POPUP_WIDTH@@ }).setContent(m.popup))
                .addTo(cluster);
        });
    </script>
</body>
</html>
"#;

/// Presentation options for the map document.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOptions {
    /// Label of the quantity line in each popup
    pub quantity_label: String,
    pub tiles_url: String,
    pub attribution: String,
    /// Circle marker radius in pixels
    pub radius: u32,
    /// Popup maximum width in pixels
    pub popup_max_width: u32,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            quantity_label: DEFAULT_QUANTITY_LABEL.to_string(),
            tiles_url: DEFAULT_TILES_URL.to_string(),
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            radius: 5,
            popup_max_width: 300,
        }
    }
}

impl MapOptions {
    pub fn with_quantity_label(mut self, label: impl Into<String>) -> Self {
        self.quantity_label = label.into();
        self
    }
}

/// One circle marker on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub country: String,
    pub quantity: u64,
    pub latitude: f64,
    pub longitude: f64,
    /// Popup HTML
    pub popup: String,
}

/// Builds a [`MapDocument`] from records.
#[derive(Debug, Clone, Default)]
pub struct MapAssembler {
    options: MapOptions,
}

impl MapAssembler {
    pub fn new(options: MapOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    fn popup(&self, country: &str, quantity: u64) -> String {
        format!(
            "<b>Country:</b> {}<br><b>{}:</b> {}<br>",
            escape_html(country),
            escape_html(&self.options.quantity_label),
            quantity
        )
    }

    /// One marker per located record, in input order.
    pub fn assemble(&self, records: &[MapRecord]) -> MapDocument {
        let markers = records
            .iter()
            .filter_map(|record| {
                let coords = match record.location {
                    GeoPoint::Located(c) if c.latitude.is_finite() && c.longitude.is_finite() => c,
                    _ => {
                        tracing::debug!(country = %record.country, "no marker for unlocated record");
                        return None;
                    }
                };
                Some(Marker {
                    country: record.country.clone(),
                    quantity: record.quantity,
                    latitude: coords.latitude,
                    longitude: coords.longitude,
                    popup: self.popup(&record.country, record.quantity),
                })
            })
            .collect();

        MapDocument {
            markers,
            options: self.options.clone(),
        }
    }
}

/// An assembled map, ready to render.
#[derive(Debug, Clone, PartialEq)]
pub struct MapDocument {
    markers: Vec<Marker>,
    options: MapOptions,
}

impl MapDocument {
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Render the full HTML document.
    pub fn render(&self) -> String {
        let data: Vec<serde_json::Value> = self
            .markers
            .iter()
            .map(|m| json!({ "lat": m.latitude, "lon": m.longitude, "popup": m.popup }))
            .collect();

        // Marker data goes last so user text is never scanned for placeholders.
        TEMPLATE
            .replace("@@TILES@@", &script_literal(&json!(self.options.tiles_url)))
            .replace(
                "@@ATTRIBUTION@@",
                &script_literal(&json!(self.options.attribution)),
            )
            .replace("@@RADIUS@@", &self.options.radius.to_string())
            .replace("@@POPUP_WIDTH@@", &self.options.popup_max_width.to_string())
            .replace("@@MARKERS@@", &script_literal(&serde_json::Value::from(data)))
    }

    /// Render and atomically persist to `path`.
    pub fn save(&self, path: &Path) -> Result<ArtifactInfo, RenderError> {
        persist(path, &self.render())
    }
}

/// JSON text safe to embed inside a `<script>` element.
fn script_literal(value: &serde_json::Value) -> String {
    value.to_string().replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Coordinates;

    fn record(country: &str, quantity: u64, location: GeoPoint) -> MapRecord {
        MapRecord {
            country: country.to_string(),
            quantity,
            location,
        }
    }

    fn located(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::Located(Coordinates::new(lat, lon))
    }

    #[test]
    fn missing_locations_are_skipped() {
        let doc = MapAssembler::default().assemble(&[
            record("Chad", 30, located(15.4, 18.7)),
            record("Unknown", 1, GeoPoint::Missing),
            record("France", 5, located(46.6, 1.9)),
        ]);

        let countries: Vec<_> = doc.markers().iter().map(|m| m.country.as_str()).collect();
        assert_eq!(countries, vec!["Chad", "France"]);
    }

    #[test]
    fn non_finite_coordinates_are_skipped() {
        let doc = MapAssembler::default().assemble(&[record("X", 1, located(f64::NAN, 0.0))]);
        assert!(doc.markers().is_empty());
    }

    #[test]
    fn popup_format() {
        let doc = MapAssembler::default().assemble(&[record("Chad", 30, located(15.4, 18.7))]);
        assert_eq!(
            doc.markers()[0].popup,
            "<b>Country:</b> Chad<br><b>Medicines:</b> 30<br>"
        );
    }

    #[test]
    fn popup_label_is_configurable_and_escaped() {
        let assembler = MapAssembler::new(MapOptions::default().with_quantity_label("Doses"));
        let doc = assembler.assemble(&[record("<Côte & co>", 2, located(7.5, -5.5))]);
        assert_eq!(
            doc.markers()[0].popup,
            "<b>Country:</b> &lt;Côte &amp; co&gt;<br><b>Doses:</b> 2<br>"
        );
    }

    #[test]
    fn render_is_deterministic() {
        let records = [
            record("Chad", 30, located(15.4, 18.7)),
            record("France", 5, located(46.6, 1.9)),
        ];
        let a = MapAssembler::default().assemble(&records).render();
        let b = MapAssembler::default().assemble(&records).render();
        assert_eq!(a, b);
    }

    #[test]
    fn render_embeds_markers_and_libraries() {
        let html = MapAssembler::default()
            .assemble(&[record("Chad", 30, located(15.4, 18.7))])
            .render();

        assert!(html.contains("<head>"));
        assert!(html.contains("leaflet.markercluster.js"));
        assert!(html.contains("basemaps.cartocdn.com/light_all"));
        assert!(html.contains("radius: 5"));
        assert!(html.contains("maxWidth: 300"));
        assert!(html.contains(r#""lat":15.4"#));
        assert!(html.contains(r#""lon":18.7"#));
        assert!(!html.contains("@@"));
    }

    #[test]
    fn render_escapes_script_terminators() {
        let html = MapAssembler::default()
            .assemble(&[record("Chad", 1, located(1.0, 1.0))])
            .render();
        let script_body = html.split("var markers = ").nth(1).unwrap();
        let literal = script_body.split(';').next().unwrap();
        assert!(!literal.contains("</"));
        assert!(literal.contains(r"<\/b>"));
    }

    #[test]
    fn empty_map_still_renders() {
        let doc = MapAssembler::default().assemble(&[]);
        assert!(doc.markers().is_empty());
        assert!(doc.render().contains("var markers = [];"));
    }

    #[test]
    fn save_writes_rendered_document() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("map.html");
        let doc = MapAssembler::default().assemble(&[record("Chad", 30, located(15.4, 18.7))]);

        let info = doc.save(&path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), doc.render());
        assert_eq!(info.digest, crate::render::artifact::digest(&doc.render()));
    }
}
