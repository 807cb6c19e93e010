//! Configuration for the entity mapper

use crate::contract::Dialect;
use serde::Deserialize;

/// Entity mapper configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Dialect used to resolve mappers when mapping rows and binding parameters
    #[serde(default)]
    pub dialect: Option<Dialect>,

    /// Spatial reference system used when binding PostGIS geometries
    #[serde(default = "default_spatial_srid")]
    pub spatial_srid: u32,

    /// Native enum column types and their allowed labels
    #[serde(default)]
    pub native_enums: Vec<NativeEnumConfig>,

    /// Maximum number of child fetches in flight during batch resolution
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

/// A native enum column type
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NativeEnumConfig {
    /// Database type name (e.g. `mood`)
    pub type_name: String,

    /// Labels in declaration order
    pub labels: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: None,
            spatial_srid: default_spatial_srid(),
            native_enums: Vec::new(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

fn default_spatial_srid() -> u32 {
    4326 // WGS 84
}

fn default_max_concurrent_fetches() -> usize {
    16
}
