use foundation::math::Vec2;

/// Step function keyed by cluster size.
///
/// A count takes the value of the last stop whose threshold is `<= count`; counts below the
/// first threshold take the first stop. Always holds at least one stop.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalStops<T> {
    stops: Vec<(usize, T)>,
}

impl<T> IntervalStops<T> {
    /// Returns `None` when `stops` is empty.
    pub fn new(mut stops: Vec<(usize, T)>) -> Option<Self> {
        if stops.is_empty() {
            return None;
        }
        stops.sort_by_key(|(threshold, _)| *threshold);
        Some(Self { stops })
    }

    pub fn evaluate(&self, count: usize) -> &T {
        let mut picked = &self.stops[0].1;
        for (threshold, value) in &self.stops {
            if *threshold > count {
                break;
            }
            picked = value;
        }
        picked
    }

    pub fn stops(&self) -> &[(usize, T)] {
        &self.stops
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: [u8; 3],
    pub alpha: f32,
}

impl ColorStop {
    pub fn css(&self) -> String {
        let [r, g, b] = self.color;
        format!("rgba({r},{g},{b},{})", self.alpha)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub color_stops: Vec<ColorStop>,
}

impl RadialGradient {
    /// Transparent core fading to the solid color halfway out.
    pub fn halo(color: [u8; 3]) -> Self {
        Self {
            color_stops: vec![
                ColorStop {
                    offset: 0.0,
                    color,
                    alpha: 0.0,
                },
                ColorStop {
                    offset: 0.5,
                    color,
                    alpha: 1.0,
                },
                ColorStop {
                    offset: 1.0,
                    color,
                    alpha: 1.0,
                },
            ],
        }
    }
}

/// Style of aggregated cluster markers.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSymbol {
    pub fill: IntervalStops<RadialGradient>,
    /// Marker radius in pixels, also used for viewport culling.
    pub width: IntervalStops<f64>,
    pub height: f64,
    pub fill_opacity: f64,
    pub line_opacity: f64,
}

impl Default for ClusterSymbol {
    fn default() -> Self {
        Self {
            fill: IntervalStops {
                stops: vec![
                    (0, RadialGradient::halo([181, 226, 140])),
                    (9, RadialGradient::halo([241, 211, 87])),
                    (99, RadialGradient::halo([253, 156, 115])),
                ],
            },
            width: IntervalStops {
                stops: vec![(0, 20.0), (9, 30.0), (99, 40.0)],
            },
            height: 40.0,
            fill_opacity: 1.0,
            line_opacity: 0.0,
        }
    }
}

/// Style of the count label drawn on top of a cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSymbol {
    pub face_name: String,
    pub size_px: f64,
    pub color: String,
}

impl Default for TextSymbol {
    fn default() -> Self {
        Self {
            face_name: "\"microsoft yahei\"".to_string(),
            size_px: 14.0,
            color: "#000".to_string(),
        }
    }
}

impl TextSymbol {
    pub fn font(&self) -> String {
        format!("{}px {}", self.size_px, self.face_name)
    }

    /// Rough glyph-box estimate; good enough to center short numeric labels.
    pub fn estimate_size(&self, text: &str) -> Vec2 {
        let count = text.chars().count().max(1) as f64;
        Vec2::new(self.size_px * 0.6 * count, self.size_px)
    }
}
