pub mod layer_profile;

pub use layer_profile::*;
