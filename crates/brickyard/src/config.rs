//! Importer configuration, loadable from TOML.
//!
//! ```toml
//! library = "parts"
//!
//! [import]
//! policy = "pool"
//! invert_y = true
//! unit_scale = [0.05, 0.05, 0.05]
//!
//! [import.pivot_offsets]
//! "3005" = [0.0, -1.2, 0.0]
//!
//! [palette]
//! "7" = [0.7, 0.7, 0.7]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use brickyard_math::{TransformResolver, Vec3};
use serde::{Deserialize, Serialize};

use crate::assembler::ReimportPolicy;
use crate::assets::MemoryAssets;
use crate::color::{default_palette, ColorResolver, DEFAULT_MATERIAL_PREFIX};
use crate::error::ConfigError;
use crate::part::{PartResolver, DEFAULT_GEOMETRY_PREFIX};

/// Options for one [`ModelAssembler`](crate::ModelAssembler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// What happens to existing children on re-import.
    pub policy: ReimportPolicy,
    /// Negate Y as well as Z when converting.
    pub invert_y: bool,
    /// File units to engine units, per axis.
    pub unit_scale: [f64; 3],
    /// Prefix for geometry keys.
    pub geometry_prefix: String,
    /// Prefix for material keys.
    pub material_prefix: String,
    /// Per-part position correction in engine units.
    pub pivot_offsets: BTreeMap<String, [f64; 3]>,
    /// Name given to the default root.
    pub root_name: String,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            policy: ReimportPolicy::Replace,
            invert_y: true,
            unit_scale: [0.05, 0.05, 0.05],
            geometry_prefix: DEFAULT_GEOMETRY_PREFIX.to_string(),
            material_prefix: DEFAULT_MATERIAL_PREFIX.to_string(),
            pivot_offsets: BTreeMap::new(),
            root_name: "Model".to_string(),
        }
    }
}

impl ImportOptions {
    /// Set the re-import policy.
    pub fn with_policy(mut self, policy: ReimportPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set Y inversion.
    pub fn with_invert_y(mut self, invert_y: bool) -> Self {
        self.invert_y = invert_y;
        self
    }

    /// Set the unit scale.
    pub fn with_unit_scale(mut self, unit_scale: Vec3) -> Self {
        self.unit_scale = [unit_scale.x, unit_scale.y, unit_scale.z];
        self
    }

    /// Add a pivot offset for `part_id`.
    pub fn with_pivot_offset(mut self, part_id: impl Into<String>, offset: Vec3) -> Self {
        self.pivot_offsets
            .insert(part_id.into(), [offset.x, offset.y, offset.z]);
        self
    }

    /// Pivot offset for `part_id`; zero when none is configured.
    pub fn pivot_offset(&self, part_id: &str) -> Vec3 {
        self.pivot_offsets
            .get(part_id)
            .map(|o| Vec3::from(*o))
            .unwrap_or_else(Vec3::zeros)
    }

    /// Transform resolver for these options.
    pub fn transform_resolver(&self) -> TransformResolver {
        TransformResolver::new(self.invert_y, Vec3::from(self.unit_scale))
    }

    /// Part resolver for these options.
    pub fn part_resolver(&self) -> PartResolver {
        PartResolver::new(self.geometry_prefix.clone())
    }

    /// Color resolver for these options.
    pub fn color_resolver(&self) -> ColorResolver {
        ColorResolver::new(self.material_prefix.clone())
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    /// Import options.
    pub import: ImportOptions,
    /// Color code to `[r, g, b]`. Defaults to the built-in palette; a
    /// `[palette]` table replaces it entirely.
    pub palette: BTreeMap<String, [f64; 3]>,
    /// Part library directory.
    pub library: Option<PathBuf>,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            import: ImportOptions::default(),
            palette: default_palette()
                .map(|(code, color)| (code.to_string(), color))
                .collect(),
            library: None,
        }
    }
}

impl ImporterConfig {
    /// Parse from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// The palette as `(code, color)` pairs.
    pub fn palette(&self) -> Result<Vec<(i32, [f64; 3])>, ConfigError> {
        self.palette
            .iter()
            .map(|(code, color)| {
                code.trim()
                    .parse::<i32>()
                    .map(|c| (c, *color))
                    .map_err(|_| ConfigError::InvalidPaletteCode(code.clone()))
            })
            .collect()
    }

    /// An in-memory registry holding the palette's materials.
    pub fn materials(&self) -> Result<MemoryAssets, ConfigError> {
        let mut assets = MemoryAssets::new();
        self.import
            .color_resolver()
            .register(&mut assets, self.palette()?);
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetResolver;

    #[test]
    fn test_defaults() {
        let options = ImportOptions::default();
        assert_eq!(options.policy, ReimportPolicy::Replace);
        assert!(options.invert_y);
        assert_eq!(options.unit_scale, [0.05, 0.05, 0.05]);
        assert_eq!(options.pivot_offset("3005"), Vec3::zeros());
        assert_eq!(options.part_resolver().key("3005"), "Prefabs/3005");
        assert_eq!(options.color_resolver().key(7), "LegoColor_7");
    }

    #[test]
    fn test_parse_toml() {
        let config = ImporterConfig::from_toml_str(
            r#"
library = "parts"

[import]
policy = "pool"
invert_y = false
unit_scale = [0.4, 0.4, 0.4]

[import.pivot_offsets]
"3005" = [0.0, -1.2, 0.0]

[palette]
"4" = [0.7, 0.0, 0.0]
"#,
        )
        .unwrap();

        assert_eq!(config.library, Some(PathBuf::from("parts")));
        assert_eq!(config.import.policy, ReimportPolicy::Pool);
        assert!(!config.import.invert_y);
        assert_eq!(config.import.pivot_offset("3005"), Vec3::new(0.0, -1.2, 0.0));
        assert_eq!(config.import.root_name, "Model");
        // an explicit table replaces the built-in palette
        assert_eq!(config.palette.len(), 1);
        assert_eq!(config.palette().unwrap(), vec![(4, [0.7, 0.0, 0.0])]);

        let materials = config.materials().unwrap();
        assert!(materials.resolve_material("LegoColor_4").is_some());
        assert!(materials.resolve_material("LegoColor_7").is_none());
    }

    #[test]
    fn test_empty_config_uses_builtin_palette() {
        let config = ImporterConfig::from_toml_str("").unwrap();
        assert_eq!(config, ImporterConfig::default());
        assert_eq!(config.palette.len(), 7);
        assert!(config.palette.contains_key("15"));
        assert_eq!(config.palette().unwrap().len(), 7);
        assert!(config.materials().unwrap().resolve_material("LegoColor_15").is_some());
    }

    #[test]
    fn test_bad_palette_key() {
        let config = ImporterConfig::from_toml_str("[palette]\nred = [1.0, 0.0, 0.0]\n").unwrap();
        assert!(matches!(
            config.palette(),
            Err(ConfigError::InvalidPaletteCode(key)) if key == "red"
        ));
    }

    #[test]
    fn test_bad_policy() {
        let err = ImporterConfig::from_toml_str("[import]\npolicy = \"merge\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
