use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Persisted form of a layer: a type tag, the layer id, its options and one record per geometry.
///
/// Geometry records are kept as raw JSON so that a reader can skip the ones it does not
/// understand instead of rejecting the whole layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerProfile {
    #[serde(rename = "type")]
    pub layer_type: String,
    pub id: String,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub geometries: Vec<Value>,
}

/// One geometry in a layer profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryProfile {
    pub feature: FeatureProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureProfile {
    #[serde(rename = "type")]
    pub kind: String,
    pub geometry: GeometryJson,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<Value>,
}

/// GeoJSON geometry object. Coordinates are `[x, y]` (longitude, latitude).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum GeometryJson {
    Point([f64; 2]),
    MultiPoint(Vec<[f64; 2]>),
    LineString(Vec<[f64; 2]>),
    Polygon(Vec<Vec<[f64; 2]>>),
}

#[derive(Debug)]
pub enum ProfileError {
    Parse(serde_json::Error),
    Serialize(serde_json::Error),
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileError::Parse(err) => write!(f, "layer profile parse error: {err}"),
            ProfileError::Serialize(err) => write!(f, "layer profile serialize error: {err}"),
        }
    }
}

impl std::error::Error for ProfileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProfileError::Parse(err) | ProfileError::Serialize(err) => Some(err),
        }
    }
}

impl LayerProfile {
    pub fn new(layer_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            layer_type: layer_type.into(),
            id: id.into(),
            options: Map::new(),
            geometries: Vec::new(),
        }
    }

    pub fn from_json_str(payload: &str) -> Result<Self, ProfileError> {
        serde_json::from_str(payload).map_err(ProfileError::Parse)
    }

    pub fn to_json_string(&self) -> Result<String, ProfileError> {
        serde_json::to_string(self).map_err(ProfileError::Serialize)
    }

    pub fn push_geometry(&mut self, geometry: &GeometryProfile) -> Result<(), ProfileError> {
        let value = serde_json::to_value(geometry).map_err(ProfileError::Serialize)?;
        self.geometries.push(value);
        Ok(())
    }

    /// Decodes each geometry record, dropping the ones that are not valid geometry JSON.
    /// Each kept record is paired with its position in `geometries`.
    pub fn decoded_geometries(&self) -> Vec<(usize, GeometryProfile)> {
        self.geometries
            .iter()
            .enumerate()
            .filter_map(|(index, value)| Some((index, GeometryProfile::from_value(value)?)))
            .collect()
    }
}

impl GeometryProfile {
    pub fn new(geometry: GeometryJson) -> Self {
        Self {
            feature: FeatureProfile {
                kind: "Feature".to_string(),
                geometry,
                id: None,
                properties: None,
            },
            options: None,
            symbol: None,
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}
