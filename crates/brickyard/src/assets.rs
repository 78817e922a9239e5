//! Asset resolution: geometry and material lookups by string key.
//!
//! The importer never loads meshes or shaders itself. It asks an
//! [`AssetResolver`] for an opaque handle and attaches whatever comes back
//! to the scene node.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Reference to a piece of part geometry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeometryHandle {
    /// Lookup key the geometry was resolved from (e.g. `Prefabs/3005`).
    pub key: String,
    /// Backing file, for resolvers that have one.
    pub source: Option<PathBuf>,
}

impl GeometryHandle {
    /// A handle with no backing file.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            source: None,
        }
    }
}

/// Reference to a surface material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialHandle {
    /// Material key (e.g. `LegoColor_7`).
    pub name: String,
    /// Base color as `[r, g, b]` in 0.0..1.0.
    pub color: [f64; 3],
}

/// Resolves geometry and material keys to handles.
pub trait AssetResolver {
    /// Look up part geometry.
    fn resolve_geometry(&self, key: &str) -> Option<GeometryHandle>;

    /// Look up a material.
    fn resolve_material(&self, key: &str) -> Option<MaterialHandle>;
}

impl<T: AssetResolver + ?Sized> AssetResolver for &T {
    fn resolve_geometry(&self, key: &str) -> Option<GeometryHandle> {
        (**self).resolve_geometry(key)
    }

    fn resolve_material(&self, key: &str) -> Option<MaterialHandle> {
        (**self).resolve_material(key)
    }
}

/// In-memory registry of geometry keys and materials.
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    geometry: HashMap<String, GeometryHandle>,
    materials: HashMap<String, MaterialHandle>,
    accept_any_geometry: bool,
}

impl MemoryAssets {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a geometry key.
    pub fn with_geometry(mut self, key: impl Into<String>) -> Self {
        self.insert_geometry(GeometryHandle::new(key));
        self
    }

    /// Register a material under `name`.
    pub fn with_material(mut self, name: impl Into<String>, color: [f64; 3]) -> Self {
        self.insert_material(MaterialHandle {
            name: name.into(),
            color,
        });
        self
    }

    /// Resolve every geometry key, registered or not.
    ///
    /// Useful when only the placement layout matters.
    pub fn accept_any_geometry(mut self) -> Self {
        self.accept_any_geometry = true;
        self
    }

    /// Register a geometry handle under its key.
    pub fn insert_geometry(&mut self, handle: GeometryHandle) {
        self.geometry.insert(handle.key.clone(), handle);
    }

    /// Register a material handle under its name.
    pub fn insert_material(&mut self, handle: MaterialHandle) {
        self.materials.insert(handle.name.clone(), handle);
    }
}

impl AssetResolver for MemoryAssets {
    fn resolve_geometry(&self, key: &str) -> Option<GeometryHandle> {
        match self.geometry.get(key) {
            Some(handle) => Some(handle.clone()),
            None if self.accept_any_geometry => Some(GeometryHandle::new(key)),
            None => None,
        }
    }

    fn resolve_material(&self, key: &str) -> Option<MaterialHandle> {
        self.materials.get(key).cloned()
    }
}

/// Geometry file extensions tried by [`DirectoryAssets`], in order.
pub const GEOMETRY_EXTENSIONS: [&str; 5] = ["glb", "gltf", "obj", "stl", "dat"];

/// Resolves geometry keys against a part library on disk.
///
/// `Prefabs/3005` resolves to the first of `<library>/Prefabs/3005.glb`,
/// `.gltf`, `.obj`, `.stl`, `.dat` that exists. Materials come from an
/// in-memory table.
#[derive(Debug, Clone)]
pub struct DirectoryAssets {
    library: PathBuf,
    materials: MemoryAssets,
}

impl DirectoryAssets {
    /// Create a resolver rooted at `library`.
    pub fn new(library: impl Into<PathBuf>, materials: MemoryAssets) -> Self {
        Self {
            library: library.into(),
            materials,
        }
    }

    /// Library root.
    pub fn library(&self) -> &Path {
        &self.library
    }
}

impl AssetResolver for DirectoryAssets {
    fn resolve_geometry(&self, key: &str) -> Option<GeometryHandle> {
        let base = self.library.join(key);
        GEOMETRY_EXTENSIONS
            .iter()
            .map(|ext| append_extension(&base, ext))
            .find(|path| path.is_file())
            .map(|path| GeometryHandle {
                key: key.to_string(),
                source: Some(path),
            })
    }

    fn resolve_material(&self, key: &str) -> Option<MaterialHandle> {
        self.materials.resolve_material(key)
    }
}

/// `base` plus `.ext`, keeping any dot already in the file name.
fn append_extension(base: &Path, ext: &str) -> PathBuf {
    let mut path = base.as_os_str().to_os_string();
    path.push(".");
    path.push(ext);
    PathBuf::from(path)
}
