//! Normalization of station and stream values
//!
//! The engine walks every `network` element in the document (at any depth),
//! then its direct `station` children and, when channel fixing is enabled,
//! their `sensorLocation` and `stream` descendants. Each value it touches is
//! forced to a numeric literal; anything unparseable is replaced by a default
//! instead of failing the run.

use crate::documents::{Document, Element};
use crate::numeric::{coerce_or_default, format_rate, is_float, parse_float, DEFAULT_NUMERIC};
use serde::Serialize;

/// Station fields that must be numeric attributes
pub const STATION_FIELDS: [&str; 3] = ["latitude", "longitude", "elevation"];

/// Stream orientation fields
pub const ORIENTATION_FIELDS: [&str; 2] = ["azimuth", "dip"];

const FALLBACK_RATE: f64 = 1.0;

/// Options for a normalization pass
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    /// Also normalize sensor locations and streams
    pub fix_channels: bool,
}

impl NormalizeOptions {
    /// Enable or disable stream normalization
    pub fn with_fix_channels(mut self, fix_channels: bool) -> Self {
        self.fix_channels = fix_channels;
        self
    }
}

/// Counters gathered during a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    /// Stations visited
    pub stations_total: usize,
    /// Stations whose attributes were changed
    pub stations_fixed: usize,
    /// Streams visited (zero unless channel fixing is enabled)
    pub streams_touched: usize,
}

/// Normalize `doc` in place
pub fn normalize_document(doc: &mut Document, options: NormalizeOptions) -> NormalizeStats {
    let mut stats = NormalizeStats::default();
    walk(&mut doc.root, options, &mut stats);
    tracing::info!(
        stations = stats.stations_total,
        fixed = stats.stations_fixed,
        streams = stats.streams_touched,
        "normalized document"
    );
    stats
}

fn walk(element: &mut Element, options: NormalizeOptions, stats: &mut NormalizeStats) {
    if element.is_named("network") {
        normalize_network(element, options, stats);
    }
    for child in element.children.iter_mut() {
        walk(child, options, stats);
    }
}

fn normalize_network(network: &mut Element, options: NormalizeOptions, stats: &mut NormalizeStats) {
    promote_code(network);

    for station in network.find_children_mut("station") {
        stats.stations_total += 1;
        if fix_station(station) {
            stats.stations_fixed += 1;
        }

        if !options.fix_channels {
            continue;
        }
        for location in station.find_children_mut("sensorLocation") {
            promote_code(location);
            for stream in location.find_children_mut("stream") {
                fix_stream(stream);
                stats.streams_touched += 1;
            }
        }
    }
}

/// Value of `name` from the attribute, falling back to the child's text.
///
/// Only a missing or empty attribute falls back; a whitespace-only one is
/// kept and coerces to the default.
fn raw_value<'a>(element: &'a Element, name: &str) -> &'a str {
    match element.get_attribute(name) {
        Some(value) if !value.is_empty() => value.trim(),
        _ => element.child_text(name),
    }
}

/// Force numeric latitude/longitude/elevation attributes on a station.
///
/// Each value is also mirrored into a same-named child element. Returns true
/// if any attribute (including a promoted `code`) changed; rewriting the
/// child alone does not count.
pub fn fix_station(station: &mut Element) -> bool {
    let mut changed = false;

    for field in STATION_FIELDS {
        let value = coerce_or_default(raw_value(station, field), DEFAULT_NUMERIC);

        if station.get_attribute(field) != Some(value.as_str()) {
            tracing::debug!(
                station = station.get_attribute("code").unwrap_or(""),
                field,
                old = station.get_attribute(field),
                new = %value,
                "station attribute set"
            );
            station.set_attribute(field, value.clone());
            changed = true;
        }
        station.ensure_child(field).set_text(value);
    }

    if promote_code(station) {
        changed = true;
    }

    changed
}

/// Normalize orientation and sample rate of a stream
pub fn fix_stream(stream: &mut Element) {
    for field in ORIENTATION_FIELDS {
        let child = stream.ensure_child(field);
        if !is_float(child.trimmed_text()) {
            child.set_text(DEFAULT_NUMERIC);
        }
    }

    let has_rate = stream
        .find_child("sampleRate")
        .map(|sr| is_float(sr.trimmed_text()))
        .unwrap_or(false);
    if !has_rate {
        let rate = derive_sample_rate(
            stream.child_text("sampleRateNumerator"),
            stream.child_text("sampleRateDenominator"),
        );
        tracing::debug!(
            stream = stream.get_attribute("code").unwrap_or(""),
            rate,
            "derived sample rate"
        );
        stream.ensure_child("sampleRate").set_text(format_rate(rate));
    }

    promote_code(stream);
}

/// Sample rate from numerator and denominator text.
///
/// A missing or non-numeric numerator counts as 1.0; a missing, non-numeric
/// or zero denominator counts as 1.0. A non-finite quotient falls back to 1.0.
pub fn derive_sample_rate(numerator: &str, denominator: &str) -> f64 {
    let num = parse_float(numerator).unwrap_or(FALLBACK_RATE);
    let den = parse_float(denominator)
        .filter(|d| *d != 0.0)
        .unwrap_or(FALLBACK_RATE);

    let rate = num / den;
    if rate.is_finite() {
        rate
    } else {
        FALLBACK_RATE
    }
}

/// Copy a `code` child's text into an absent or empty `code` attribute.
///
/// Returns true if the attribute was set.
pub fn promote_code(element: &mut Element) -> bool {
    if element.get_attribute("code").is_some_and(|c| !c.is_empty()) {
        return false;
    }

    let code = element.child_text("code");
    if code.is_empty() {
        return false;
    }

    let code = code.to_string();
    tracing::debug!(element = element.local_name(), code = %code, "promoted code");
    element.set_attribute("code", code);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(xml: &str) -> Document {
        Document::from_string(xml).unwrap()
    }

    fn first_station(doc: &Document) -> &Element {
        doc.root.find_child("network").unwrap().find_child("station").unwrap()
    }

    fn first_stream(doc: &Document) -> &Element {
        first_station(doc)
            .find_child("sensorLocation")
            .unwrap()
            .find_child("stream")
            .unwrap()
    }

    #[test]
    fn test_non_numeric_attribute_becomes_default() {
        let mut doc = parse(
            r#"<inventory><network code="GE"><station code="APE" latitude="N/A" longitude="25.53" elevation="620"/></network></inventory>"#,
        );
        let stats = normalize_document(&mut doc, NormalizeOptions::default());

        let station = first_station(&doc);
        assert_eq!(station.get_attribute("latitude"), Some("0.0"));
        assert_eq!(station.get_attribute("longitude"), Some("25.53"));
        assert_eq!(station.get_attribute("elevation"), Some("620"));
        assert_eq!(stats.stations_total, 1);
        assert_eq!(stats.stations_fixed, 1);
    }

    #[test]
    fn test_child_values_become_attributes() {
        let mut doc = parse(
            r#"<inventory><network><station><code>APE</code><latitude>37.07</latitude><longitude> 25.53 </longitude><elevation>high</elevation></station></network></inventory>"#,
        );
        normalize_document(&mut doc, NormalizeOptions::default());

        let station = first_station(&doc);
        assert_eq!(station.get_attribute("code"), Some("APE"));
        assert_eq!(station.get_attribute("latitude"), Some("37.07"));
        assert_eq!(station.get_attribute("longitude"), Some("25.53"));
        assert_eq!(station.get_attribute("elevation"), Some("0.0"));
    }

    #[test]
    fn test_attribute_and_child_are_mirrored() {
        let mut doc = parse(
            r#"<network><station latitude="12.5"><latitude>99</latitude></station></network>"#,
        );
        normalize_document(&mut doc, NormalizeOptions::default());

        let station = doc.root.find_child("station").unwrap();
        for field in STATION_FIELDS {
            assert_eq!(
                station.get_attribute(field),
                Some(station.child_text(field)),
                "{field} should be mirrored"
            );
        }
        assert_eq!(station.child_text("latitude"), "12.5");
    }

    #[test]
    fn test_empty_attribute_falls_back_to_child() {
        let mut station = parse(r#"<station latitude=""><latitude>-33.9</latitude></station>"#).root;
        fix_station(&mut station);
        assert_eq!(station.get_attribute("latitude"), Some("-33.9"));
    }

    #[test]
    fn test_whitespace_attribute_is_kept_over_child() {
        let mut station = parse(r#"<station latitude="  "><latitude>-33.9</latitude></station>"#).root;
        assert!(fix_station(&mut station));
        assert_eq!(station.get_attribute("latitude"), Some("0.0"));
        assert_eq!(station.child_text("latitude"), "0.0");
    }

    #[test]
    fn test_clean_station_is_not_counted_as_fixed() {
        let mut doc = parse(
            r#"<network code="GE"><station code="APE" latitude="1.0" longitude="2.0" elevation="3.0"/></network>"#,
        );
        let stats = normalize_document(&mut doc, NormalizeOptions::default());

        assert_eq!(stats.stations_total, 1);
        assert_eq!(stats.stations_fixed, 0);
        // The mirror children are still written.
        assert_eq!(first_station_of_root(&doc).child_text("elevation"), "3.0");
    }

    fn first_station_of_root(doc: &Document) -> &Element {
        doc.root.find_child("station").unwrap()
    }

    #[test]
    fn test_network_code_promotion() {
        let mut doc = parse(r#"<inventory><network><code>XX</code></network></inventory>"#);
        normalize_document(&mut doc, NormalizeOptions::default());

        let network = doc.root.find_child("network").unwrap();
        assert_eq!(network.get_attribute("code"), Some("XX"));
    }

    #[test]
    fn test_existing_code_is_kept() {
        let mut element = parse(r#"<network code="GE"><code>XX</code></network>"#).root;
        assert!(!promote_code(&mut element));
        assert_eq!(element.get_attribute("code"), Some("GE"));
    }

    #[test]
    fn test_empty_code_child_is_ignored() {
        let mut element = parse(r#"<network code=""><code>  </code></network>"#).root;
        assert!(!promote_code(&mut element));
        assert_eq!(element.get_attribute("code"), Some(""));
    }

    #[test]
    fn test_station_code_promotion_counts_as_change() {
        let mut station = parse(
            r#"<station latitude="1" longitude="2" elevation="3"><code>APE</code></station>"#,
        )
        .root;
        assert!(fix_station(&mut station));
        assert_eq!(station.get_attribute("code"), Some("APE"));
    }

    #[test]
    fn test_namespace_and_case_independence() {
        let plain = r#"<inventory><network code="GE"><station code="APE" latitude="bad"/></network></inventory>"#;
        let namespaced = r#"<inventory xmlns="http://example/ns"><NETWORK code="GE"><STATION code="APE" latitude="bad"/></NETWORK></inventory>"#;

        let mut a = parse(plain);
        let mut b = parse(namespaced);
        let stats_a = normalize_document(&mut a, NormalizeOptions::default());
        let stats_b = normalize_document(&mut b, NormalizeOptions::default());
        assert_eq!(stats_a, stats_b);

        let sta_a = a.root.find_child("network").unwrap().find_child("station").unwrap();
        let sta_b = b.root.find_child("network").unwrap().find_child("station").unwrap();
        assert_eq!(sta_a.attributes, sta_b.attributes);
        assert_eq!(
            sta_b.find_child("latitude").unwrap().namespace(),
            Some("http://example/ns")
        );
    }

    #[test]
    fn test_networks_found_at_any_depth() {
        let mut doc = parse(
            r#"<seiscomp><Inventory><group><network><station/></network></group><network><station/><station/></network></Inventory></seiscomp>"#,
        );
        let stats = normalize_document(&mut doc, NormalizeOptions::default());
        assert_eq!(stats.stations_total, 3);
        assert_eq!(stats.stations_fixed, 3);
    }

    #[test]
    fn test_stations_outside_networks_are_ignored() {
        let mut doc = parse(r#"<inventory><station latitude="bad"/></inventory>"#);
        let stats = normalize_document(&mut doc, NormalizeOptions::default());

        assert_eq!(stats.stations_total, 0);
        assert_eq!(
            doc.root.find_child("station").unwrap().get_attribute("latitude"),
            Some("bad")
        );
    }

    #[test]
    fn test_streams_untouched_without_fix_channels() {
        let xml = r#"<network><station latitude="1" longitude="2" elevation="3"><sensorLocation><stream><azimuth>x</azimuth></stream></sensorLocation></station></network>"#;
        let mut doc = parse(xml);
        let stats = normalize_document(&mut doc, NormalizeOptions::default());

        assert_eq!(stats.streams_touched, 0);
        let stream = doc
            .root
            .find_child("station")
            .unwrap()
            .find_child("sensorLocation")
            .unwrap()
            .find_child("stream")
            .unwrap();
        assert_eq!(stream.child_text("azimuth"), "x");
        assert!(stream.find_child("sampleRate").is_none());
    }

    #[test]
    fn test_stream_normalization() {
        let xml = r#"<inventory><network><station><sensorLocation><code>00</code><stream><code>BHZ</code><azimuth>unknown</azimuth><sampleRateNumerator>100</sampleRateNumerator><sampleRateDenominator>1</sampleRateDenominator></stream></sensorLocation></station></network></inventory>"#;
        let mut doc = parse(xml);
        let stats = normalize_document(&mut doc, NormalizeOptions::default().with_fix_channels(true));
        assert_eq!(stats.streams_touched, 1);

        let location = first_station(&doc).find_child("sensorLocation").unwrap();
        assert_eq!(location.get_attribute("code"), Some("00"));

        let stream = first_stream(&doc);
        assert_eq!(stream.get_attribute("code"), Some("BHZ"));
        assert_eq!(stream.child_text("azimuth"), "0.0");
        assert_eq!(stream.child_text("dip"), "0.0");
        assert_eq!(stream.child_text("sampleRate"), "100.000000");
        assert_eq!(stream.children.last().unwrap().local_name(), "sampleRate");
    }

    #[test]
    fn test_existing_sample_rate_is_kept() {
        let mut stream = parse(
            r#"<stream><azimuth>90</azimuth><dip>-90</dip><sampleRate>20</sampleRate><sampleRateNumerator>40</sampleRateNumerator></stream>"#,
        )
        .root;
        fix_stream(&mut stream);

        assert_eq!(stream.child_text("sampleRate"), "20");
        assert_eq!(stream.child_text("azimuth"), "90");
        assert_eq!(stream.child_text("dip"), "-90");
    }

    #[test]
    fn test_non_numeric_sample_rate_is_replaced_in_place() {
        let mut stream = parse(
            r#"<stream><sampleRate>fast</sampleRate><dip>0</dip><sampleRateNumerator>40</sampleRateNumerator><sampleRateDenominator>2</sampleRateDenominator></stream>"#,
        )
        .root;
        fix_stream(&mut stream);

        assert_eq!(stream.children[0].local_name(), "sampleRate");
        assert_eq!(stream.child_text("sampleRate"), "20.000000");
        assert_eq!(stream.find_children("sampleRate").count(), 1);
    }

    #[test]
    fn test_zero_denominator_is_guarded() {
        let mut stream = parse(
            r#"<stream><sampleRateNumerator>50</sampleRateNumerator><sampleRateDenominator>0</sampleRateDenominator></stream>"#,
        )
        .root;
        fix_stream(&mut stream);
        assert_eq!(stream.child_text("sampleRate"), "50.000000");
    }

    #[test]
    fn test_derive_sample_rate_defaults() {
        assert_eq!(derive_sample_rate("100", "1"), 100.0);
        assert_eq!(derive_sample_rate("", ""), 1.0);
        assert_eq!(derive_sample_rate("abc", "4"), 0.25);
        assert_eq!(derive_sample_rate("10", "0.0"), 10.0);
        assert_eq!(derive_sample_rate("1e308", "1e-308"), 1.0);
    }
}
