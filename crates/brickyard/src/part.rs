//! Part identifier to geometry resolution.

use crate::assets::{AssetResolver, GeometryHandle};

/// Default prefix for geometry keys.
pub const DEFAULT_GEOMETRY_PREFIX: &str = "Prefabs/";

/// Maps part identifiers to geometry keys and looks them up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartResolver {
    prefix: String,
}

impl PartResolver {
    /// Create a resolver with a key prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Geometry key for `part_id`.
    pub fn key(&self, part_id: &str) -> String {
        format!("{}{}", self.prefix, part_id)
    }

    /// Look up the geometry for `part_id`.
    pub fn resolve(&self, assets: &dyn AssetResolver, part_id: &str) -> Option<GeometryHandle> {
        assets.resolve_geometry(&self.key(part_id))
    }
}

impl Default for PartResolver {
    fn default() -> Self {
        Self::new(DEFAULT_GEOMETRY_PREFIX)
    }
}
