//! County polygon sources.
//!
//! Both strategies produce the same [`CountySet`]: a 5-character FIPS id,
//! optional county name and state FIPS, and a `MultiPolygon` per county, in
//! the order the features appear in the source document.

use std::{
    fs,
    path::{Path, PathBuf},
};

use geo::{Coord, LineString, MultiPolygon, Polygon};
use serde_json::{Map, Value};
use tracing::{info, warn};
use txcap_core::{County, CountyFips, CountySet, Crs, TxcapError, TxcapResult};

/// GeoJSON county boundaries keyed by 5-digit FIPS feature ids. A single
/// vintage; it has no `{year}` placeholder.
pub const DEFAULT_COUNTIES_URL: &str =
    "https://raw.githubusercontent.com/plotly/datasets/master/geojson-counties-fips.json";

/// Provider of the county polygon layer.
pub trait CountySource {
    fn load(&self) -> TxcapResult<CountySet>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

/// A GeoJSON FeatureCollection on disk.
#[derive(Debug, Clone)]
pub struct GeoJsonFile {
    pub path: PathBuf,
}

impl GeoJsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CountySource for GeoJsonFile {
    fn load(&self) -> TxcapResult<CountySet> {
        let text = fs::read_to_string(&self.path)?;
        parse_geojson(&text)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// County boundaries downloaded for a given year.
///
/// `url_template` may contain a `{year}` placeholder. When `cache` names an
/// existing file it is read instead of downloading; otherwise the download is
/// written there for later runs.
#[derive(Debug, Clone)]
pub struct RemoteCounties {
    pub year: u16,
    pub url_template: String,
    pub cache: Option<PathBuf>,
}

impl RemoteCounties {
    pub fn new(year: u16) -> Self {
        Self {
            year,
            url_template: DEFAULT_COUNTIES_URL.to_string(),
            cache: None,
        }
    }

    pub fn with_url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = template.into();
        self
    }

    pub fn with_cache(mut self, cache: impl Into<PathBuf>) -> Self {
        self.cache = Some(cache.into());
        self
    }

    pub fn url(&self) -> String {
        self.url_template.replace("{year}", &self.year.to_string())
    }

    /// Whether the year selects the boundaries at all.
    pub fn uses_year(&self) -> bool {
        self.url_template.contains("{year}")
    }
}

impl CountySource for RemoteCounties {
    fn load(&self) -> TxcapResult<CountySet> {
        if let Some(cache) = self.cache.as_deref().filter(|p| p.is_file()) {
            info!(cache = %cache.display(), "reading cached county boundaries");
            return parse_geojson(&fs::read_to_string(cache)?);
        }
        let url = self.url();
        if self.uses_year() {
            info!(%url, year = self.year, "downloading county boundaries");
        } else {
            warn!(
                %url,
                year = self.year,
                "county URL has no {{year}} placeholder; the year is not applied"
            );
        }
        let text = fetch_text(&url)?;
        let counties = parse_geojson(&text)?;
        if let Some(cache) = &self.cache {
            write_cache(cache, &text)?;
            info!(cache = %cache.display(), "cached county boundaries");
        }
        Ok(counties)
    }

    fn describe(&self) -> String {
        if self.uses_year() {
            format!("{} (year {})", self.url(), self.year)
        } else {
            self.url()
        }
    }
}

fn write_cache(path: &Path, text: &str) -> TxcapResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, text)?;
    Ok(())
}

#[cfg(feature = "fetch")]
fn fetch_text(url: &str) -> TxcapResult<String> {
    use std::io::Read;

    let response = ureq::get(url)
        .call()
        .map_err(|err| TxcapError::Fetch(format!("{url}: {err}")))?;
    // Boundary files exceed the size limit of `into_string`.
    let mut bytes = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut bytes)
        .map_err(|err| TxcapError::Fetch(format!("{url}: {err}")))?;
    String::from_utf8(bytes).map_err(|err| TxcapError::Fetch(format!("{url}: {err}")))
}

#[cfg(not(feature = "fetch"))]
fn fetch_text(_url: &str) -> TxcapResult<String> {
    Err(TxcapError::CapabilityUnavailable(
        "remote county download is disabled; rebuild with the 'fetch' feature or pass a counties file"
            .into(),
    ))
}

/// Parse a GeoJSON FeatureCollection of county polygons.
pub fn parse_geojson(text: &str) -> TxcapResult<CountySet> {
    let doc: Value = serde_json::from_str(text)?;
    let crs = match doc.get("crs") {
        Some(crs) => parse_crs_member(crs)?,
        None => Crs::default(),
    };
    let features = doc
        .get("features")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            TxcapError::Parse("county layer is not a GeoJSON FeatureCollection".into())
        })?;

    let mut counties = Vec::with_capacity(features.len());
    let mut without_geometry = 0usize;
    for (idx, feature) in features.iter().enumerate() {
        let empty = Map::new();
        let props = feature
            .get("properties")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let fips = feature_fips(feature, props).ok_or_else(|| {
            TxcapError::MissingIdentifier(format!(
                "county feature {idx} has no GEOID, id, or STATEFP+COUNTYFP"
            ))
        })?;
        let Some(geometry) = feature.get("geometry").and_then(parse_geometry) else {
            without_geometry += 1;
            continue;
        };
        let state_fips = property_text(props, &["statefp", "state"])
            .map(|s| format!("{:0>2}", s))
            .or_else(|| fips.state_part().map(str::to_string));
        counties.push(County {
            fips,
            name: property_text(props, &["name"]),
            state_fips,
            geometry,
        });
    }
    if without_geometry > 0 {
        warn!(
            without_geometry,
            "county features without polygon geometry were skipped"
        );
    }
    info!(counties = counties.len(), %crs, "county layer parsed");
    Ok(CountySet::new(counties, crs))
}

fn parse_crs_member(crs: &Value) -> TxcapResult<Crs> {
    let props = crs.get("properties");
    if let Some(name) = props.and_then(|p| p.get("name")).and_then(Value::as_str) {
        return Crs::parse(name);
    }
    if let Some(code) = props.and_then(|p| p.get("code")).and_then(Value::as_u64) {
        return Ok(Crs::Epsg(code as u32));
    }
    Err(TxcapError::UnsupportedCrs(crs.to_string()))
}

fn feature_fips(feature: &Value, props: &Map<String, Value>) -> Option<CountyFips> {
    if let Some(geoid) = property_text(props, &["geoid"]) {
        return CountyFips::parse(&geoid);
    }
    if let Some(id) = feature.get("id").and_then(value_text) {
        return CountyFips::parse(&id);
    }
    for (state_key, county_key) in [("statefp", "countyfp"), ("state", "county")] {
        if let (Some(state), Some(county)) = (
            property_text(props, &[state_key]),
            property_text(props, &[county_key]),
        ) {
            return CountyFips::from_parts(&state, &county);
        }
    }
    None
}

/// First non-empty property among `keys`, compared case-insensitively.
fn property_text(props: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        props
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .and_then(|(_, value)| value_text(value))
    })
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(i.to_string()),
            None => n.as_f64().map(|f| {
                if f.fract() == 0.0 {
                    format!("{}", f as i64)
                } else {
                    f.to_string()
                }
            }),
        },
        _ => None,
    }
}

fn parse_geometry(geometry: &Value) -> Option<MultiPolygon<f64>> {
    let coords = geometry.get("coordinates")?;
    match geometry.get("type")?.as_str()? {
        "Polygon" => parse_polygon(coords).map(|p| MultiPolygon::new(vec![p])),
        "MultiPolygon" => {
            let polygons: Option<Vec<Polygon<f64>>> =
                coords.as_array()?.iter().map(parse_polygon).collect();
            polygons.map(MultiPolygon::new)
        }
        _ => None,
    }
}

fn parse_polygon(rings: &Value) -> Option<Polygon<f64>> {
    let mut rings = rings.as_array()?.iter().map(parse_ring);
    let exterior = rings.next()??;
    let interiors: Option<Vec<LineString<f64>>> = rings.collect();
    Some(Polygon::new(exterior, interiors?))
}

fn parse_ring(ring: &Value) -> Option<LineString<f64>> {
    let coords: Option<Vec<Coord<f64>>> = ring
        .as_array()?
        .iter()
        .map(|pos| {
            let pos = pos.as_array()?;
            Some(Coord {
                x: pos.first()?.as_f64()?,
                y: pos.get(1)?.as_f64()?,
            })
        })
        .collect();
    Some(LineString::new(coords?))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "[[[0.0,0.0],[1.0,0.0],[1.0,1.0],[0.0,1.0],[0.0,0.0]]]";

    fn feature(id: &str, props: &str) -> String {
        format!(
            r#"{{"type":"Feature",{id}"properties":{{{props}}},"geometry":{{"type":"Polygon","coordinates":{SQUARE}}}}}"#
        )
    }

    fn collection(features: &[String], crs: Option<&str>) -> String {
        let crs = crs
            .map(|name| format!(r#""crs":{{"type":"name","properties":{{"name":"{name}"}}}},"#))
            .unwrap_or_default();
        format!(
            r#"{{"type":"FeatureCollection",{crs}"features":[{}]}}"#,
            features.join(",")
        )
    }

    #[test]
    fn geoid_property_wins() {
        let text = collection(
            &[feature(r#""id":"99999","#, r#""GEOID":"08031","NAME":"Denver","STATEFP":"08""#)],
            None,
        );
        let set = parse_geojson(&text).unwrap();
        let county = &set.counties[0];
        assert_eq!(county.fips.as_str(), "08031");
        assert_eq!(county.name.as_deref(), Some("Denver"));
        assert_eq!(county.state_fips.as_deref(), Some("08"));
        assert_eq!(set.crs, Crs::Epsg(4269));
    }

    #[test]
    fn feature_id_and_numeric_parts() {
        let text = collection(
            &[
                feature(r#""id":"01001","#, r#""NAME":"Autauga","STATE":"01","COUNTY":"001""#),
                feature("", r#""statefp":8,"countyfp":59"#),
            ],
            Some("urn:ogc:def:crs:OGC:1.3:CRS84"),
        );
        let set = parse_geojson(&text).unwrap();
        assert_eq!(set.counties[0].fips.as_str(), "01001");
        assert_eq!(set.counties[1].fips.as_str(), "08059");
        assert_eq!(set.counties[1].state_fips.as_deref(), Some("08"));
        assert_eq!(set.crs, Crs::Crs84);
    }

    #[test]
    fn missing_identifier_is_fatal() {
        let text = collection(&[feature("", r#""NAME":"Nowhere""#)], None);
        assert!(matches!(
            parse_geojson(&text),
            Err(TxcapError::MissingIdentifier(_))
        ));
    }

    #[test]
    fn multipolygon_with_hole() {
        let text = r#"{"type":"FeatureCollection","features":[{"type":"Feature","id":"08013",
            "properties":{},
            "geometry":{"type":"MultiPolygon","coordinates":[
                [[[0,0],[4,0],[4,4],[0,4],[0,0]],[[1,1],[2,1],[2,2],[1,2],[1,1]]],
                [[[10,10],[11,10],[11,11],[10,11],[10,10]]]
            ]}}]}"#;
        let set = parse_geojson(text).unwrap();
        let geometry = &set.counties[0].geometry;
        assert_eq!(geometry.0.len(), 2);
        assert_eq!(geometry.0[0].interiors().len(), 1);
    }

    #[test]
    fn remote_url_substitutes_year() {
        let remote = RemoteCounties::new(2020)
            .with_url_template("https://example.test/counties_{year}.geojson");
        assert_eq!(remote.url(), "https://example.test/counties_2020.geojson");
        assert!(remote.describe().contains("year 2020"));
        let older = RemoteCounties::new(2010).with_url_template(remote.url_template.clone());
        assert_ne!(older.url(), remote.url());
    }

    #[test]
    fn fixed_url_does_not_claim_a_year() {
        let remote = RemoteCounties::new(2010);
        assert!(!remote.uses_year());
        assert_eq!(remote.url(), DEFAULT_COUNTIES_URL);
        assert!(!remote.describe().contains("2010"));
    }

    #[test]
    fn cached_boundaries_bypass_download() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("counties.geojson");
        fs::write(
            &cache,
            collection(&[feature(r#""id":"08031","#, "")], None),
        )
        .unwrap();
        let remote = RemoteCounties::new(2023)
            .with_url_template("http://127.0.0.1:9/unreachable/{year}")
            .with_cache(&cache);
        let set = remote.load().unwrap();
        assert_eq!(set.len(), 1);
    }
}
