//! Color code to material resolution.

use crate::assets::{AssetResolver, MaterialHandle, MemoryAssets};

/// Default prefix for material keys.
pub const DEFAULT_MATERIAL_PREFIX: &str = "LegoColor_";

/// Built-in palette: `(code, [r, g, b])`.
const PALETTE: [(i32, [f64; 3]); 7] = [
    (0, [0.2, 0.2, 0.2]),  // black
    (1, [0.0, 0.5, 0.9]),  // blue
    (2, [0.0, 0.7, 0.0]),  // green
    (4, [0.7, 0.0, 0.0]),  // red
    (7, [0.7, 0.7, 0.7]),  // light gray
    (14, [1.0, 0.9, 0.0]), // yellow
    (15, [1.0, 1.0, 1.0]), // white
];

/// The built-in color palette.
pub fn default_palette() -> impl Iterator<Item = (i32, [f64; 3])> {
    PALETTE.into_iter()
}

/// Maps color codes to material keys and looks them up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorResolver {
    prefix: String,
}

impl ColorResolver {
    /// Create a resolver with a key prefix.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Material key for `code`.
    pub fn key(&self, code: i32) -> String {
        format!("{}{}", self.prefix, code)
    }

    /// Look up the material for `code`.
    pub fn resolve(&self, assets: &dyn AssetResolver, code: i32) -> Option<MaterialHandle> {
        assets.resolve_material(&self.key(code))
    }

    /// Register `palette` in `assets` under this resolver's keys.
    pub fn register(&self, assets: &mut MemoryAssets, palette: impl IntoIterator<Item = (i32, [f64; 3])>) {
        for (code, color) in palette {
            assets.insert_material(MaterialHandle {
                name: self.key(code),
                color,
            });
        }
    }
}

impl Default for ColorResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MATERIAL_PREFIX)
    }
}
