//! Verification of a repaired document and the end-to-end repair run
//!
//! Verification re-reads the written output from disk rather than trusting
//! the in-memory tree, so it also proves that the serialized form parses.
//! It never mutates the document.

use crate::documents::{Document, Element};
use crate::error::Result;
use crate::loaders::Loader;
use crate::normalize::{normalize_document, NormalizeOptions, NormalizeStats};
use crate::numeric::is_float;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// A station whose coordinates verified as numeric
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StationExample {
    /// Code of the enclosing network
    pub network: String,
    /// Station code
    pub station: String,
    /// Latitude attribute
    pub latitude: String,
    /// Longitude attribute
    pub longitude: String,
    /// Elevation attribute
    pub elevation: String,
}

/// Outcome of checking a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VerifyReport {
    /// Stations checked
    pub stations_checked: usize,
    /// Stations whose coordinate attributes are not all numeric
    pub invalid_stations: usize,
    /// First station that passed
    pub example: Option<StationExample>,
}

impl VerifyReport {
    /// True if every station passed
    pub fn is_clean(&self) -> bool {
        self.invalid_stations == 0
    }
}

/// Check every `network` > `station` in `doc`, reading attributes only
pub fn verify_document(doc: &Document) -> VerifyReport {
    let mut report = VerifyReport::default();
    scan(&doc.root, &mut report);
    report
}

fn scan(element: &Element, report: &mut VerifyReport) {
    if element.is_named("network") {
        let network_code = element.get_attribute("code").unwrap_or("");
        for station in element.find_children("station") {
            check_station(network_code, station, report);
        }
    }
    for child in &element.children {
        scan(child, report);
    }
}

fn check_station(network_code: &str, station: &Element, report: &mut VerifyReport) {
    report.stations_checked += 1;

    let attr = |name: &str| station.get_attribute(name).unwrap_or("").trim().to_string();
    let (latitude, longitude, elevation) = (attr("latitude"), attr("longitude"), attr("elevation"));

    if !(is_float(&latitude) && is_float(&longitude) && is_float(&elevation)) {
        report.invalid_stations += 1;
        tracing::warn!(
            network = network_code,
            station = station.get_attribute("code").unwrap_or(""),
            "station still lacks numeric coordinates"
        );
    } else if report.example.is_none() {
        report.example = Some(StationExample {
            network: network_code.to_string(),
            station: station.get_attribute("code").unwrap_or("").to_string(),
            latitude,
            longitude,
            elevation,
        });
    }
}

/// Re-load `path` and verify it
pub fn verify_file(loader: &Loader, path: &Path) -> Result<VerifyReport> {
    let doc = loader.load(path)?;
    Ok(verify_document(&doc))
}

/// Summary of a complete repair run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Stations visited
    pub stations_total: usize,
    /// Stations whose attributes were changed
    pub stations_fixed: usize,
    /// Streams visited
    pub streams_touched: usize,
    /// First station that verified cleanly
    pub example: Option<StationExample>,
    /// Stations that still failed verification
    pub invalid_stations: usize,
}

impl RepairReport {
    fn new(stats: NormalizeStats, verified: VerifyReport) -> Self {
        Self {
            stations_total: stats.stations_total,
            stations_fixed: stats.stations_fixed,
            streams_touched: stats.streams_touched,
            example: verified.example,
            invalid_stations: verified.invalid_stations,
        }
    }
}

impl fmt::Display for RepairReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stations found: {}, stations fixed: {}, streams touched: {}",
            self.stations_total, self.stations_fixed, self.streams_touched
        )?;

        if let Some(ex) = &self.example {
            write!(
                f,
                "\nExample station OK: Network={} Station={} lat={} lon={} elev={}",
                ex.network, ex.station, ex.latitude, ex.longitude, ex.elevation
            )?;
        }

        if self.invalid_stations > 0 {
            write!(
                f,
                "\nWARNING: {} station(s) still missing numeric attrs.",
                self.invalid_stations
            )?;
        }

        Ok(())
    }
}

/// Load `input`, normalize it, write `output`, then verify the written file.
///
/// The output is left in place even if verification finds invalid stations.
pub fn repair(
    loader: &Loader,
    input: &Path,
    output: &Path,
    options: NormalizeOptions,
) -> Result<RepairReport> {
    let mut doc = loader.load(input)?;
    let stats = normalize_document(&mut doc, options);
    loader.save(output, &doc)?;
    drop(doc);

    let verified = verify_file(loader, output)?;
    if !verified.is_clean() {
        tracing::warn!(
            invalid = verified.invalid_stations,
            "stations remain invalid after repair"
        );
    }

    Ok(RepairReport::new(stats, verified))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_verify_counts_invalid_stations() {
        let doc = Document::from_string(
            r#"<inventory><network code="GE"><station code="A" latitude="x" longitude="1" elevation="2"/><station code="B" latitude="1" longitude="2" elevation="3"/><station code="C"/></network></inventory>"#,
        )
        .unwrap();
        let report = verify_document(&doc);

        assert_eq!(report.stations_checked, 3);
        assert_eq!(report.invalid_stations, 2);
        assert_eq!(
            report.example,
            Some(StationExample {
                network: "GE".to_string(),
                station: "B".to_string(),
                latitude: "1".to_string(),
                longitude: "2".to_string(),
                elevation: "3".to_string(),
            })
        );
    }

    #[test]
    fn test_verify_ignores_child_values() {
        let doc = Document::from_string(
            r#"<network code="GE"><station code="A"><latitude>1</latitude><longitude>2</longitude><elevation>3</elevation></station></network>"#,
        )
        .unwrap();
        let report = verify_document(&doc);

        assert_eq!(report.invalid_stations, 1);
        assert!(report.example.is_none());
    }

    #[test]
    fn test_report_display_full() {
        let report = RepairReport {
            stations_total: 2,
            stations_fixed: 1,
            streams_touched: 6,
            example: Some(StationExample {
                network: "GE".to_string(),
                station: "APE".to_string(),
                latitude: "37.07".to_string(),
                longitude: "25.53".to_string(),
                elevation: "620.0".to_string(),
            }),
            invalid_stations: 1,
        };

        assert_eq!(
            report.to_string(),
            "Stations found: 2, stations fixed: 1, streams touched: 6\n\
             Example station OK: Network=GE Station=APE lat=37.07 lon=25.53 elev=620.0\n\
             WARNING: 1 station(s) still missing numeric attrs."
        );
    }

    #[test]
    fn test_report_display_minimal() {
        let report = RepairReport::default();
        assert_eq!(
            report.to_string(),
            "Stations found: 0, stations fixed: 0, streams touched: 0"
        );
    }

    #[test]
    fn test_report_serializes_to_json() {
        let report = RepairReport {
            stations_total: 1,
            ..RepairReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["stations_total"], 1);
        assert_eq!(json["invalid_stations"], 0);
        assert!(json["example"].is_null());
    }
}
