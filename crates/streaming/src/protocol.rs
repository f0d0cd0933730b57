//! Wire format of the upstream earthquake feed.
//!
//! The feed is a GeoJSON `FeatureCollection` of point features. Only the
//! fields the viewer uses are decoded; everything else is ignored. Values are
//! trusted as-is: there is no schema validation beyond JSON decoding.

use foundation::ids::EventId;
use foundation::time::Time;
use scene::event::{Event, EventCollection};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollectionJson {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<FeatureJson>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureJson {
    pub id: String,
    #[serde(default)]
    pub properties: PropertiesJson,
    #[serde(default)]
    pub geometry: Option<GeometryJson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PropertiesJson {
    pub mag: Option<f64>,
    pub place: Option<String>,
    /// Epoch milliseconds.
    pub time: Option<i64>,
    pub url: Option<String>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeometryJson {
    #[serde(rename = "type", default)]
    pub kind: String,
    /// `[longitude, latitude, depth_km]`.
    #[serde(default)]
    pub coordinates: Vec<f64>,
}

impl From<FeatureJson> for Event {
    fn from(f: FeatureJson) -> Self {
        let coords = f.geometry.map(|g| g.coordinates).unwrap_or_default();
        let coord = |i: usize| coords.get(i).copied().unwrap_or(0.0);
        Event {
            id: EventId::new(f.id),
            magnitude: f.properties.mag,
            place: f.properties.place,
            title: f.properties.title,
            occurred_at: f.properties.time.map(Time::from_millis),
            longitude: coord(0),
            latitude: coord(1),
            depth_km: coord(2),
            detail_url: f.properties.url,
        }
    }
}

impl From<FeatureCollectionJson> for EventCollection {
    fn from(c: FeatureCollectionJson) -> Self {
        EventCollection::new(c.features.into_iter().map(Event::from).collect())
    }
}

pub fn decode_collection(bytes: &[u8]) -> Result<EventCollection, serde_json::Error> {
    let raw: FeatureCollectionJson = serde_json::from_slice(bytes)?;
    Ok(raw.into())
}
