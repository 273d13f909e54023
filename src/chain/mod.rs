//! Chain identity and consensus parameters.

mod params;

pub use params::{ChainParams, Network};
