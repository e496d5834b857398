use std::rc::Rc;

use foundation::Aabb2;
use foundation::math::{Projection, Vec2};
use tracing::trace;

use crate::cluster::{CellKey, Grid, ZoomGridCache, ZoomScale};
use crate::cluster_layer::{ClusterLayer, ClusterLayerOptions};
use crate::markers::MarkerId;
use crate::symbology::{ClusterSymbol, RadialGradient, TextSymbol};

/// What the renderer needs from the host map.
pub trait MapView: ZoomScale + Projection {
    fn zoom(&self) -> i32;
    /// Container size in pixels, `[width, height]`.
    fn size_px(&self) -> [f64; 2];
    fn prj_to_container_point(&self, projected: Vec2) -> Vec2;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterLabel {
    pub text: String,
    /// Top-left of the text box in container pixels.
    pub anchor_px: Vec2,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateMarker {
    pub key: CellKey,
    pub count: usize,
    pub center_px: Vec2,
    pub radius_px: f64,
    /// Box the fill gradient is stretched over.
    pub extent_px: Aabb2,
    pub fill: RadialGradient,
    pub fill_opacity: f64,
    pub line_opacity: f64,
    pub label: ClusterLabel,
}

/// Draw list for one frame.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClusterFrame {
    /// Clusters of a single marker: the marker itself is drawn, not an aggregate.
    pub singles: Vec<MarkerId>,
    pub aggregates: Vec<AggregateMarker>,
    /// Aggregates skipped because they fall outside the container.
    pub culled: usize,
}

/// Canvas renderer of a [`ClusterLayer`].
///
/// Holds the per-zoom grid cache; the grid for the current zoom is refreshed on zoom end and
/// whenever the layer's markers changed since the last draw.
#[derive(Debug)]
pub struct ClusterCanvasRenderer {
    cache: ZoomGridCache,
    symbol: ClusterSymbol,
    text: TextSymbol,
    grid: Option<Rc<Grid>>,
    visible: bool,
    z_index: i32,
}

impl ClusterCanvasRenderer {
    pub fn new(options: &ClusterLayerOptions) -> Self {
        Self {
            cache: ZoomGridCache::new(options.max_cluster_radius, options.grid_reuse),
            symbol: ClusterSymbol::default(),
            text: TextSymbol::default(),
            grid: None,
            visible: true,
            z_index: 0,
        }
    }

    pub fn with_symbols(mut self, symbol: ClusterSymbol, text: TextSymbol) -> Self {
        self.symbol = symbol;
        self.text = text;
        self
    }

    pub fn cache(&self) -> &ZoomGridCache {
        &self.cache
    }

    pub fn current_grid(&self) -> Option<&Rc<Grid>> {
        self.grid.as_ref()
    }

    pub fn on_zoom_end<M: MapView>(&mut self, layer: &ClusterLayer, map: &M) {
        self.compute_grid(layer, map);
    }

    fn compute_grid<M: MapView>(&mut self, layer: &ClusterLayer, map: &M) -> Rc<Grid> {
        let options = layer.options();
        self.cache.set_max_cluster_radius(options.max_cluster_radius);
        self.cache.set_reuse(options.grid_reuse);
        let grid = self.cache.grid(map.zoom(), layer.markers(), map, map);
        self.grid = Some(Rc::clone(&grid));
        grid
    }

    pub fn draw<M: MapView>(&mut self, layer: &ClusterLayer, map: &M) -> ClusterFrame {
        let mut frame = ClusterFrame::default();
        if !self.visible {
            return frame;
        }

        let grid = self.compute_grid(layer, map);
        let [width, height] = map.size_px();
        let viewport = Aabb2::new([0.0, 0.0], [width, height]);

        for (key, cluster) in grid.iter() {
            if cluster.is_single() {
                frame.singles.push(cluster.representative.marker);
                continue;
            }

            let radius = *self.symbol.width.evaluate(cluster.count);
            let center = map.prj_to_container_point(cluster.center).round();
            let extent = Aabb2::around(center, radius);
            if !viewport.intersects(&extent) {
                frame.culled += 1;
                continue;
            }

            let text = cluster.count.to_string();
            let half = self.text.estimate_size(&text).scale(0.5);
            frame.aggregates.push(AggregateMarker {
                key: *key,
                count: cluster.count,
                center_px: center,
                radius_px: radius,
                extent_px: extent,
                fill: self.symbol.fill.evaluate(cluster.count).clone(),
                fill_opacity: self.symbol.fill_opacity,
                line_opacity: self.symbol.line_opacity,
                label: ClusterLabel {
                    anchor_px: (center - half).round(),
                    text,
                    color: self.text.color.clone(),
                },
            });
        }

        trace!(
            singles = frame.singles.len(),
            aggregates = frame.aggregates.len(),
            culled = frame.culled,
            "cluster frame"
        );
        frame
    }

    pub fn show(&mut self) {
        self.visible = true;
    }

    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_z_index(&mut self, z_index: i32) {
        self.z_index = z_index;
    }

    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    /// Releases the grid cache and marker snapshot.
    pub fn destroy(&mut self) {
        self.cache.clear();
        self.grid = None;
    }
}
