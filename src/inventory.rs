//! Read-only typed view of a repaired inventory
//!
//! This is the consumer side of the repair: it expects numeric station
//! coordinates and reports an error when it meets one that is not, which is
//! the condition the normalization pass removes. The document is read with
//! `roxmltree` since nothing here mutates it.

use crate::error::{Error, ParseError, Result};
use crate::loaders::Loader;
use crate::namespaces::local_name;
use crate::numeric::parse_float;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use roxmltree::Node;
use std::fmt;
use std::path::Path;

/// All networks in a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Inventory {
    /// Networks in document order
    pub networks: Vec<Network>,
}

/// A seismic network
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    /// Network code
    pub code: String,
    /// Stations of this network
    pub stations: Vec<Station>,
}

/// A recording site
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    /// Station code
    pub code: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
    /// Elevation in meters
    pub elevation: f64,
    /// Start of the station epoch
    pub start_date: Option<DateTime<Utc>>,
    /// End of the station epoch
    pub end_date: Option<DateTime<Utc>>,
    /// Streams of all sensor locations
    pub channels: Vec<Channel>,
}

/// A data stream
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// Stream code
    pub code: String,
    /// Code of the sensor location holding the stream
    pub location_code: String,
    /// Samples per second
    pub sample_rate: Option<f64>,
    /// Start of the stream epoch
    pub start_date: Option<DateTime<Utc>>,
    /// End of the stream epoch
    pub end_date: Option<DateTime<Utc>>,
}

/// Read an inventory file (plain or `.gz`) with default limits
pub fn read_inventory(path: impl AsRef<Path>) -> Result<Inventory> {
    read_inventory_with(&Loader::new(), path.as_ref())
}

/// Read an inventory file through `loader`
pub fn read_inventory_with(loader: &Loader, path: &Path) -> Result<Inventory> {
    let bytes = loader.load_bytes(path)?;
    parse_inventory(&bytes)
}

/// Parse an inventory from decompressed document bytes
pub fn parse_inventory(xml: &[u8]) -> Result<Inventory> {
    let text = std::str::from_utf8(xml)
        .map_err(|e| ParseError::new(format!("document is not UTF-8: {}", e)))?;
    let doc = roxmltree::Document::parse(text.trim_start_matches('\u{feff}'))
        .map_err(|e| ParseError::new(e.to_string()))?;

    let networks = doc
        .descendants()
        .filter(|n| is_role(n, "network"))
        .map(read_network)
        .collect::<Result<Vec<_>>>()?;

    Ok(Inventory { networks })
}

fn is_role(node: &Node<'_, '_>, role: &str) -> bool {
    node.is_element() && local_name(node.tag_name().name()) == role
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    role: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| is_role(n, role))
}

/// Attribute value, falling back to a same-named child's text
fn value<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    let lower = name.to_lowercase();
    node.attribute(name)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| {
            node.children()
                .find(|n| n.is_element() && local_name(n.tag_name().name()) == lower)
                .and_then(|n| n.text())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
}

fn read_network(node: Node<'_, '_>) -> Result<Network> {
    let code = value(node, "code").unwrap_or("").to_string();
    let stations = children(node, "station")
        .map(|sta| read_station(&code, sta))
        .collect::<Result<Vec<_>>>()?;
    Ok(Network { code, stations })
}

fn read_station(network: &str, node: Node<'_, '_>) -> Result<Station> {
    let code = value(node, "code").unwrap_or("").to_string();

    let coordinate = |field: &str| -> Result<f64> {
        let raw = value(node, field).unwrap_or("");
        parse_float(raw).ok_or_else(|| {
            Error::Value(format!(
                "station {}.{}: {} {:?} is not numeric",
                network, code, field, raw
            ))
        })
    };
    let latitude = coordinate("latitude")?;
    let longitude = coordinate("longitude")?;
    let elevation = coordinate("elevation")?;

    let mut channels = Vec::new();
    for location in children(node, "sensorlocation") {
        let location_code = value(location, "code").unwrap_or("");
        for stream in children(location, "stream") {
            channels.push(read_channel(location_code, stream));
        }
    }

    Ok(Station {
        latitude,
        longitude,
        elevation,
        start_date: value(node, "start").and_then(parse_time),
        end_date: value(node, "end").and_then(parse_time),
        channels,
        code,
    })
}

fn read_channel(location_code: &str, node: Node<'_, '_>) -> Channel {
    Channel {
        code: value(node, "code").unwrap_or("").to_string(),
        location_code: location_code.to_string(),
        sample_rate: sample_rate(node),
        start_date: value(node, "start").and_then(parse_time),
        end_date: value(node, "end").and_then(parse_time),
    }
}

fn sample_rate(node: Node<'_, '_>) -> Option<f64> {
    if let Some(rate) = value(node, "sampleRate").and_then(parse_float) {
        return Some(rate);
    }
    let numerator = value(node, "sampleRateNumerator").and_then(parse_float)?;
    let denominator = value(node, "sampleRateDenominator")
        .and_then(parse_float)
        .filter(|d| *d != 0.0)?;
    Some(numerator / denominator)
}

/// Parse an epoch boundary. Zone-less timestamps are taken as UTC.
pub fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = text.trim_end_matches('Z');
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(naive, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(naive, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .map(|dt| dt.and_utc())
}

struct Epoch(Option<DateTime<Utc>>);

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.6fZ")),
            None => write!(f, "None"),
        }
    }
}

impl fmt::Display for Inventory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for net in &self.networks {
            writeln!(f, "Network: {}", net.code)?;
            for sta in &net.stations {
                writeln!(
                    f,
                    "  Station: {} (Lat={:?}, Lon={:?}, Elev={:?}) Start={}, End={}",
                    sta.code,
                    sta.latitude,
                    sta.longitude,
                    sta.elevation,
                    Epoch(sta.start_date),
                    Epoch(sta.end_date)
                )?;
                for ch in &sta.channels {
                    let rate = ch
                        .sample_rate
                        .map(|r| format!("{:?}", r))
                        .unwrap_or_else(|| "None".to_string());
                    writeln!(
                        f,
                        "    Channel: {}, Loc: {}, SR={} Hz, Start={}, End={}",
                        ch.code,
                        ch.location_code,
                        rate,
                        Epoch(ch.start_date),
                        Epoch(ch.end_date)
                    )?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
