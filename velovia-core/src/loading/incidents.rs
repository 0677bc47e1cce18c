//! Incident ingestion from CSV and GeoJSON sources.
//!
//! Rows are validated individually; a malformed row is skipped and
//! counted instead of failing the whole file. Only a file that cannot
//! be opened or parsed at all is an error.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{NaiveDate, NaiveDateTime};
use geo::Point;
use log::{info, warn};
use serde::Deserialize;

use crate::Error;
use crate::model::{IncidentCategory, IncidentRecord, validate_coordinate};

/// Parsed incidents plus the number of rows dropped on the way
#[derive(Debug, Default)]
pub struct IncidentBatch {
    pub records: Vec<IncidentRecord>,
    pub skipped: usize,
}

impl IncidentBatch {
    fn absorb(&mut self, other: IncidentBatch) {
        self.records.extend(other.records);
        self.skipped += other.skipped;
    }
}

/// Raw CSV row, deserialized leniently so header variations across
/// published incident datasets still bind
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawIncident {
    #[serde(alias = "lat")]
    latitude: String,
    #[serde(alias = "lon", alias = "lng")]
    longitude: String,
    #[serde(alias = "offense", alias = "crime_type")]
    category: String,
    severity: String,
    #[serde(alias = "date", alias = "datetime")]
    occurred_at: String,
}

/// Load and merge every configured incident file, dispatching on the
/// file extension.
///
/// # Errors
///
/// Fails on unreadable files, unparseable documents, or an extension
/// that is neither CSV nor GeoJSON.
pub fn load_incidents(paths: &[PathBuf]) -> Result<IncidentBatch, Error> {
    let mut batch = IncidentBatch::default();

    for path in paths {
        let loaded = load_incident_file(path)?;
        info!(
            "loaded {} incidents from {} ({} rows skipped)",
            loaded.records.len(),
            path.display(),
            loaded.skipped
        );
        batch.absorb(loaded);
    }

    if batch.skipped > 0 {
        warn!(
            "skipped {} incident rows with missing or invalid fields",
            batch.skipped
        );
    }

    Ok(batch)
}

fn load_incident_file(path: &Path) -> Result<IncidentBatch, Error> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => incidents_from_csv(File::open(path)?),
        "geojson" | "json" => {
            let mut text = String::new();
            File::open(path)?.read_to_string(&mut text)?;
            incidents_from_geojson(&text)
        }
        other => Err(Error::InvalidData(format!(
            "unsupported incident file extension '{other}': {}",
            path.display()
        ))),
    }
}

/// # Errors
///
/// Fails only on a structurally broken CSV stream; bad rows are
/// skipped and counted.
pub fn incidents_from_csv<R: Read>(reader: R) -> Result<IncidentBatch, Error> {
    let mut batch = IncidentBatch::default();

    for row in csv::Reader::from_reader(reader).deserialize::<RawIncident>() {
        match row {
            Ok(raw) => match parse_row(&raw) {
                Some(record) => batch.records.push(record),
                None => batch.skipped += 1,
            },
            Err(_) => batch.skipped += 1,
        }
    }

    Ok(batch)
}

/// # Errors
///
/// Fails when the document is not a GeoJSON feature collection;
/// non-point features and unparseable properties are skipped.
pub fn incidents_from_geojson(text: &str) -> Result<IncidentBatch, Error> {
    let document: geojson::GeoJson = text
        .parse()
        .map_err(|e| Error::InvalidData(format!("incident GeoJSON: {e}")))?;

    let geojson::GeoJson::FeatureCollection(collection) = document else {
        return Err(Error::InvalidData(
            "incident GeoJSON must be a FeatureCollection".to_string(),
        ));
    };

    let mut batch = IncidentBatch::default();
    for feature in collection.features {
        match parse_feature(&feature) {
            Some(record) => batch.records.push(record),
            None => batch.skipped += 1,
        }
    }

    Ok(batch)
}

fn parse_row(raw: &RawIncident) -> Option<IncidentRecord> {
    let latitude: f64 = raw.latitude.trim().parse().ok()?;
    let longitude: f64 = raw.longitude.trim().parse().ok()?;
    let location = Point::new(longitude, latitude);
    validate_coordinate(&location).ok()?;

    let category = IncidentCategory::from_label(&raw.category);
    let occurred_at = parse_timestamp(&raw.occurred_at);

    let mut record = IncidentRecord::new(location, category, occurred_at);
    if let Ok(severity) = raw.severity.trim().parse::<f64>() {
        if severity.is_finite() && severity > 0.0 {
            record.severity = severity;
        }
    }
    Some(record)
}

fn parse_feature(feature: &geojson::Feature) -> Option<IncidentRecord> {
    let geometry = feature.geometry.as_ref()?;
    let geojson::Value::Point(position) = &geometry.value else {
        return None;
    };
    if position.len() < 2 {
        return None;
    }
    let location = Point::new(position[0], position[1]);
    validate_coordinate(&location).ok()?;

    let property = |key: &str| {
        feature
            .properties
            .as_ref()
            .and_then(|map| map.get(key))
            .cloned()
    };

    let category = property("category")
        .or_else(|| property("offense"))
        .and_then(|value| value.as_str().map(IncidentCategory::from_label))
        .unwrap_or(IncidentCategory::Other);

    let occurred_at = property("occurred_at")
        .or_else(|| property("date"))
        .and_then(|value| value.as_str().map(str::to_string))
        .and_then(|text| parse_timestamp(&text));

    let mut record = IncidentRecord::new(location, category, occurred_at);
    if let Some(severity) = property("severity").and_then(|value| value.as_f64()) {
        if severity.is_finite() && severity > 0.0 {
            record.severity = severity;
        }
    }
    Some(record)
}

/// Timestamps appear in several exports of the same upstream data, so
/// a few formats are tried in order
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%m/%d/%Y %H:%M",
        "%m/%d/%Y %I:%M:%S %p",
    ];
    for format in FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(text, format) {
            return Some(parsed);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_bind_with_aliased_headers() {
        let data = "\
lat,lon,offense,date
40.42,-86.91,Aggravated Assault,2024-03-01 22:15:00
40.43,-86.90,Theft from vehicle,2024-03-02
";
        let batch = incidents_from_csv(data.as_bytes()).unwrap();

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.skipped, 0);
        assert_eq!(batch.records[0].category, IncidentCategory::Assault);
        assert_eq!(batch.records[1].category, IncidentCategory::VehicleCrime);
        assert!(batch.records[0].occurred_at.is_some());
        assert_eq!(
            batch.records[0].severity,
            IncidentCategory::Assault.default_severity()
        );
    }

    #[test]
    fn invalid_rows_are_skipped_and_counted() {
        let data = "\
latitude,longitude,category,severity,occurred_at
40.42,-86.91,robbery,0.8,2024-01-05 01:00:00
not-a-number,-86.91,robbery,,
95.0,-86.91,robbery,,
40.44,-86.89,robbery,,not-a-date
";
        let batch = incidents_from_csv(data.as_bytes()).unwrap();

        // bad latitude and out-of-range latitude are dropped, the
        // unparseable date merely loses its timestamp
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.skipped, 2);
        assert_eq!(batch.records[0].severity, 0.8);
        assert!(batch.records[1].occurred_at.is_none());
    }

    #[test]
    fn geojson_points_become_incidents() {
        let data = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [-86.91, 40.42]},
                    "properties": {"category": "burglary", "severity": 0.7, "date": "2024-02-10"}
                },
                {
                    "type": "Feature",
                    "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]},
                    "properties": {}
                }
            ]
        }"#;
        let batch = incidents_from_geojson(data).unwrap();

        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.records[0].category, IncidentCategory::Burglary);
        assert_eq!(batch.records[0].severity, 0.7);
    }

    #[test]
    fn non_collection_document_is_rejected() {
        let result = incidents_from_geojson(r#"{"type": "Point", "coordinates": [0, 0]}"#);
        assert!(matches!(result, Err(Error::InvalidData(_))));
    }

    #[test]
    fn timestamps_parse_across_formats() {
        for text in [
            "2024-03-01T22:15:00",
            "2024-03-01 22:15:00",
            "03/01/2024 22:15",
            "03/01/2024 10:15:00 PM",
        ] {
            let parsed = parse_timestamp(text).unwrap();
            assert_eq!(parsed.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        }
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("soon").is_none());
    }
}
