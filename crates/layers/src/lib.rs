pub mod cluster;
pub mod cluster_layer;
pub mod error;
pub mod layer;
pub mod markers;
pub mod render;
pub mod symbology;

pub use cluster_layer::*;
pub use error::*;
pub use layer::*;
