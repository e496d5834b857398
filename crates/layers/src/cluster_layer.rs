use foundation::math::Vec2;
use formats::{GeometryJson, GeometryProfile, LayerProfile};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cluster::GridReuse;
use crate::error::LayerError;
use crate::layer::{Layer, LayerId};
use crate::markers::{Geometry, Marker, MarkerCollection, MarkerId};
use crate::render::ClusterCanvasRenderer;

/// Type tag of cluster layers in persisted profiles.
pub const CLUSTER_LAYER_TYPE: &str = "ClusterLayer";

/// Name the canvas renderer is registered under.
pub const CANVAS_RENDERER: &str = "canvas";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterLayerOptions {
    /// Pixels a cluster claims around its center; cells are twice this wide.
    pub max_cluster_radius: f64,
    pub geometry_events: bool,
    pub grid_reuse: GridReuse,
    /// Options this layer does not interpret, kept for round trips.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for ClusterLayerOptions {
    fn default() -> Self {
        Self {
            max_cluster_radius: 80.0,
            geometry_events: false,
            grid_reuse: GridReuse::default(),
            extra: Map::new(),
        }
    }
}

/// A layer of point markers drawn as grid clusters.
#[derive(Debug, Clone)]
pub struct ClusterLayer {
    id: LayerId,
    options: ClusterLayerOptions,
    markers: MarkerCollection,
}

impl ClusterLayer {
    pub fn new(id: impl Into<String>, options: ClusterLayerOptions) -> Self {
        Self {
            id: LayerId(id.into()),
            options,
            markers: MarkerCollection::new(),
        }
    }

    pub fn options(&self) -> &ClusterLayerOptions {
        &self.options
    }

    pub fn markers(&self) -> &MarkerCollection {
        &self.markers
    }

    pub fn marker(&self, id: MarkerId) -> Option<&Marker> {
        self.markers.get(id)
    }

    pub fn count(&self) -> usize {
        self.markers.len()
    }

    pub fn add_marker(&mut self, marker: Marker) -> MarkerId {
        self.markers.insert(marker)
    }

    /// Adds a batch of geometries. Every element is checked before any is inserted, so a
    /// rejected batch leaves the layer untouched.
    pub fn add_geometries(
        &mut self,
        geometries: impl IntoIterator<Item = Geometry>,
    ) -> Result<Vec<MarkerId>, LayerError> {
        let geometries: Vec<Geometry> = geometries.into_iter().collect();
        let rejected = geometries.iter().enumerate().find(|(_, g)| !g.is_point());
        if let Some((index, geometry)) = rejected {
            let kind = geometry.kind();
            warn!(layer = %self.id, index, %kind, "rejected non-point geometry");
            return Err(LayerError::InvalidGeometryType { index, kind });
        }

        let ids = geometries
            .into_iter()
            .filter_map(Geometry::into_marker)
            .map(|marker| self.markers.insert(marker))
            .collect();
        Ok(ids)
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> Result<MarkerId, LayerError> {
        match geometry {
            Geometry::Marker(marker) => Ok(self.markers.insert(marker)),
            other => {
                let kind = other.kind();
                warn!(layer = %self.id, %kind, "rejected non-point geometry");
                Err(LayerError::InvalidGeometryType { index: 0, kind })
            }
        }
    }

    pub fn remove_marker(&mut self, id: MarkerId) -> Option<Marker> {
        self.markers.remove(id)
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    pub fn create_renderer(&self, name: &str) -> Result<ClusterCanvasRenderer, LayerError> {
        if name != CANVAS_RENDERER {
            return Err(LayerError::UnknownRenderer(name.to_string()));
        }
        Ok(ClusterCanvasRenderer::new(&self.options))
    }

    pub fn to_profile(&self) -> Result<LayerProfile, LayerError> {
        let mut profile = LayerProfile::new(CLUSTER_LAYER_TYPE, self.id.as_str());
        profile.options = match serde_json::to_value(&self.options) {
            Ok(Value::Object(map)) => map,
            Ok(_) => Map::new(),
            Err(err) => return Err(LayerError::InvalidOptions(err)),
        };
        for (_, marker) in self.markers.iter() {
            profile.push_geometry(&marker_profile(marker))?;
        }
        Ok(profile)
    }

    /// Rebuilds a layer from its profile. Geometry records that cannot be decoded are skipped;
    /// decodable non-point geometries are an error carrying the record's position in the profile.
    pub fn from_profile(profile: &LayerProfile) -> Result<Self, LayerError> {
        if profile.layer_type != CLUSTER_LAYER_TYPE {
            return Err(LayerError::UnexpectedLayerType {
                expected: CLUSTER_LAYER_TYPE,
                found: profile.layer_type.clone(),
            });
        }
        let options: ClusterLayerOptions =
            serde_json::from_value(Value::Object(profile.options.clone()))
                .map_err(LayerError::InvalidOptions)?;

        let decoded = profile.decoded_geometries();
        if decoded.len() < profile.geometries.len() {
            debug!(
                layer = %profile.id,
                skipped = profile.geometries.len() - decoded.len(),
                "skipped undecodable geometry records"
            );
        }

        let geometries: Vec<(usize, Geometry)> = decoded
            .iter()
            .map(|(index, record)| (*index, geometry_from_profile(record)))
            .collect();
        if let Some((index, geometry)) = geometries.iter().find(|(_, g)| !g.is_point()) {
            let (index, kind) = (*index, geometry.kind());
            warn!(layer = %profile.id, index, %kind, "rejected non-point geometry record");
            return Err(LayerError::InvalidGeometryType { index, kind });
        }

        let mut layer = ClusterLayer::new(profile.id.clone(), options);
        layer.add_geometries(geometries.into_iter().map(|(_, geometry)| geometry))?;
        Ok(layer)
    }

    pub fn to_json(&self) -> Result<String, LayerError> {
        Ok(self.to_profile()?.to_json_string()?)
    }

    pub fn from_json(payload: &str) -> Result<Self, LayerError> {
        Self::from_profile(&LayerProfile::from_json_str(payload)?)
    }
}

impl Layer for ClusterLayer {
    fn id(&self) -> &LayerId {
        &self.id
    }

    fn layer_type(&self) -> &'static str {
        CLUSTER_LAYER_TYPE
    }
}

fn marker_profile(marker: &Marker) -> GeometryProfile {
    let mut profile = GeometryProfile::new(GeometryJson::Point([
        marker.coordinates.x,
        marker.coordinates.y,
    ]));
    profile.feature.properties = marker.properties.clone();
    profile
}

fn geometry_from_profile(profile: &GeometryProfile) -> Geometry {
    let to_vec = |c: &[f64; 2]| Vec2::new(c[0], c[1]);
    match &profile.feature.geometry {
        GeometryJson::Point(c) => {
            let mut marker = Marker::new(to_vec(c));
            marker.properties = profile.feature.properties.clone();
            Geometry::Marker(marker)
        }
        GeometryJson::MultiPoint(cs) => Geometry::MultiPoint(cs.iter().map(to_vec).collect()),
        GeometryJson::LineString(cs) => Geometry::LineString(cs.iter().map(to_vec).collect()),
        GeometryJson::Polygon(rings) => Geometry::Polygon(
            rings
                .iter()
                .map(|ring| ring.iter().map(to_vec).collect())
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{CANVAS_RENDERER, CLUSTER_LAYER_TYPE, ClusterLayer, ClusterLayerOptions};
    use crate::cluster::GridReuse;
    use crate::error::LayerError;
    use crate::layer::Layer;
    use crate::markers::{Geometry, GeometryKind, Marker};
    use foundation::math::Vec2;
    use formats::LayerProfile;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn marker(x: f64, y: f64) -> Geometry {
        Geometry::Marker(Marker::new(Vec2::new(x, y)))
    }

    #[test]
    fn default_options() {
        let options = ClusterLayerOptions::default();
        assert_eq!(options.max_cluster_radius, 80.0);
        assert!(!options.geometry_events);
        assert_eq!(options.grid_reuse, GridReuse::CellSize);
    }

    #[test]
    fn accepts_batches_of_markers() {
        let mut layer = ClusterLayer::new("poi", ClusterLayerOptions::default());
        let ids = layer
            .add_geometries(vec![marker(1.0, 2.0), marker(3.0, 4.0)])
            .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(layer.count(), 2);
        assert_eq!(
            layer.marker(ids[1]).map(|m| m.coordinates),
            Some(Vec2::new(3.0, 4.0))
        );
    }

    #[test]
    fn rejects_batch_containing_non_points() {
        let mut layer = ClusterLayer::new("poi", ClusterLayerOptions::default());
        let err = layer
            .add_geometries(vec![
                marker(1.0, 2.0),
                Geometry::LineString(vec![Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0)]),
            ])
            .unwrap_err();
        assert!(matches!(
            err,
            LayerError::InvalidGeometryType {
                index: 1,
                kind: GeometryKind::LineString
            }
        ));
        assert_eq!(layer.count(), 0);
        assert!(err.to_string().starts_with("only a point (Marker)"));
    }

    #[test]
    fn single_geometry_check() {
        let mut layer = ClusterLayer::new("poi", ClusterLayerOptions::default());
        assert!(layer.add_geometry(marker(0.0, 0.0)).is_ok());
        assert!(layer.add_geometry(Geometry::Polygon(Vec::new())).is_err());
        assert_eq!(layer.count(), 1);
    }

    #[test]
    fn empty_batch_is_fine() {
        let mut layer = ClusterLayer::new("poi", ClusterLayerOptions::default());
        assert!(layer.add_geometries(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn profile_round_trip() {
        let mut options = ClusterLayerOptions {
            max_cluster_radius: 60.0,
            ..ClusterLayerOptions::default()
        };
        options.extra.insert("opacity".into(), json!(0.5));
        let mut layer = ClusterLayer::new("poi", options.clone());
        layer.add_marker(Marker::new(Vec2::new(1.0, 2.0)).with_properties(json!({ "name": "a" })));
        layer.add_marker(Marker::new(Vec2::new(-3.0, 4.5)));

        let profile = layer.to_profile().unwrap();
        assert_eq!(profile.layer_type, CLUSTER_LAYER_TYPE);
        assert_eq!(profile.options["maxClusterRadius"], json!(60.0));
        assert_eq!(profile.options["opacity"], json!(0.5));
        assert_eq!(profile.geometries.len(), 2);

        let back = ClusterLayer::from_json(&layer.to_json().unwrap()).unwrap();
        assert_eq!(back.id().as_str(), "poi");
        assert_eq!(back.options(), &options);
        let markers: Vec<Marker> = back.markers().iter().map(|(_, m)| m.clone()).collect();
        let original: Vec<Marker> = layer.markers().iter().map(|(_, m)| m.clone()).collect();
        assert_eq!(markers, original);
    }

    #[test]
    fn from_profile_rejects_other_layer_types() {
        let profile = LayerProfile::new("VectorLayer", "v");
        assert!(matches!(
            ClusterLayer::from_profile(&profile),
            Err(LayerError::UnexpectedLayerType { .. })
        ));
    }

    #[test]
    fn from_profile_skips_undecodable_and_rejects_lines() {
        let mut profile = LayerProfile::new(CLUSTER_LAYER_TYPE, "c");
        profile.geometries.push(json!({ "bogus": 1 }));
        profile.geometries.push(json!({
            "feature": { "type": "Feature", "geometry": { "type": "Point", "coordinates": [1.0, 1.0] } }
        }));
        let layer = ClusterLayer::from_profile(&profile).unwrap();
        assert_eq!(layer.count(), 1);
        assert_eq!(layer.options(), &ClusterLayerOptions::default());

        profile.geometries.push(json!({
            "feature": { "type": "Feature", "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 1.0]] } }
        }));
        assert!(matches!(
            ClusterLayer::from_profile(&profile),
            Err(LayerError::InvalidGeometryType {
                index: 2,
                kind: GeometryKind::LineString
            })
        ));
    }

    #[test]
    fn invalid_options_are_reported() {
        let mut profile = LayerProfile::new(CLUSTER_LAYER_TYPE, "c");
        profile
            .options
            .insert("maxClusterRadius".into(), json!("wide"));
        assert!(matches!(
            ClusterLayer::from_profile(&profile),
            Err(LayerError::InvalidOptions(_))
        ));
    }

    #[test]
    fn only_canvas_renderer_is_registered() {
        let layer = ClusterLayer::new("poi", ClusterLayerOptions::default());
        assert!(layer.create_renderer(CANVAS_RENDERER).is_ok());
        assert!(matches!(
            layer.create_renderer("webgl"),
            Err(LayerError::UnknownRenderer(_))
        ));
    }
}
