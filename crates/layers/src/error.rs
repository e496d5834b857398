use formats::ProfileError;

use crate::markers::GeometryKind;

#[derive(Debug)]
pub enum LayerError {
    /// A non-point geometry was offered to a layer that only holds markers. `index` is the
    /// position in the offered batch, or in the profile's geometry records when loading.
    InvalidGeometryType { index: usize, kind: GeometryKind },
    UnexpectedLayerType { expected: &'static str, found: String },
    UnknownRenderer(String),
    InvalidOptions(serde_json::Error),
    Profile(ProfileError),
}

impl std::fmt::Display for LayerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayerError::InvalidGeometryType { index, kind } => write!(
                f,
                "only a point (Marker) can be added into a ClusterLayer: geometry #{index} is a {kind}"
            ),
            LayerError::UnexpectedLayerType { expected, found } => {
                write!(f, "layer profile type mismatch: expected={expected} found={found}")
            }
            LayerError::UnknownRenderer(name) => write!(f, "no renderer registered as {name:?}"),
            LayerError::InvalidOptions(err) => write!(f, "invalid layer options: {err}"),
            LayerError::Profile(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for LayerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LayerError::InvalidOptions(err) => Some(err),
            LayerError::Profile(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProfileError> for LayerError {
    fn from(err: ProfileError) -> Self {
        LayerError::Profile(err)
    }
}
