#![warn(missing_docs)]

//! brickyard - brick model import.
//!
//! Reads line-oriented part placement files (`.ldr`), resolves every
//! placement to part geometry, a material, and an engine-space transform,
//! and assembles the result under a reusable model root.
//!
//! # Example
//!
//! ```rust,no_run
//! use brickyard::{ImporterConfig, ModelAssembler};
//!
//! let config = ImporterConfig::default();
//! let assets = config.materials().unwrap().accept_any_geometry();
//! let mut assembler = ModelAssembler::new(assets, config.import);
//!
//! let root = assembler.import("car.ldr").unwrap();
//! for node in assembler.scene().nodes(root) {
//!     println!("{} at {:?}", node.part_id, node.transform.position);
//! }
//! ```
//!
//! Per-record problems (malformed lines, unknown parts, unknown colors) are
//! reported through a [`DiagnosticSink`] and never abort an import. The
//! only fatal errors are the ones in [`ImportError`].

mod assembler;
mod assets;
mod color;
mod config;
mod diagnostics;
mod error;
mod part;
mod pool;
mod record;
mod scene;

pub use assembler::{ImportSummary, ModelAssembler, ReimportPolicy};
pub use assets::{
    AssetResolver, DirectoryAssets, GeometryHandle, MaterialHandle, MemoryAssets, GEOMETRY_EXTENSIONS,
};
pub use color::{default_palette, ColorResolver, DEFAULT_MATERIAL_PREFIX};
pub use config::{ImportOptions, ImporterConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
pub use error::{ConfigError, ImportError, RecordError};
pub use part::{PartResolver, DEFAULT_GEOMETRY_PREFIX};
pub use pool::NodePool;
pub use record::{parse_line, records, scan, strip_extension, PlacementRecord, RecordStats, PLACEMENT_MARKER};
pub use scene::{Bounds, ModelNode, ModelSnapshot, NodeKey, NodeSnapshot, RootHandle, RootState, Scene};

pub use brickyard_math as math;

/// Import `path` into a fresh assembler's model root.
///
/// Returns the assembler, which owns the resulting scene.
pub fn import_model<R: AssetResolver>(
    path: impl AsRef<std::path::Path>,
    assets: R,
    options: ImportOptions,
) -> Result<(ModelAssembler<R>, RootHandle), ImportError> {
    let mut assembler = ModelAssembler::new(assets, options);
    let root = assembler.import(path)?;
    Ok((assembler, root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_import_model() {
        let mut file = tempfile::Builder::new().suffix(".ldr").tempfile().unwrap();
        writeln!(file, "0 two bricks").unwrap();
        writeln!(file, "1 4 0 0 0 1 0 0 0 1 0 0 0 1 3001.dat").unwrap();
        writeln!(file, "1 14 0 -24 0 0 0 1 0 1 0 -1 0 0 3001.dat").unwrap();
        file.flush().unwrap();

        let config = ImporterConfig::default();
        let assets = config.materials().unwrap().accept_any_geometry();
        let (assembler, root) = import_model(file.path(), assets, config.import).unwrap();

        let snapshot = assembler.scene().snapshot(root).unwrap();
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.nodes[1].material.as_deref(), Some("LegoColor_14"));
    }

    #[test]
    fn test_demo_model() {
        let demos = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos");
        let config = ImporterConfig::load(demos.join("brickyard.toml")).unwrap();
        let assets = config.materials().unwrap().accept_any_geometry();
        let mut assembler = ModelAssembler::new(assets, config.import).with_sink(Vec::<Diagnostic>::new());
        let root = assembler.import(demos.join("car.ldr")).unwrap();

        assert_eq!(assembler.scene().children(root).len(), 7);
        let summary = assembler.last_summary().unwrap();
        assert_eq!(summary.diagnostics.len(), 1);
        assert_eq!(summary.diagnostics[0].line, 12);

        // 3005 carries a pivot offset of -1.2 on Y: 72 * 0.05 - 1.2
        let brick = assembler.scene().nodes(root).find(|n| n.part_id == "3005").unwrap();
        approx::assert_abs_diff_eq!(brick.transform.position.y, 2.4, epsilon = 1e-9);
    }

    #[test]
    fn test_import_model_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = import_model(dir.path().join("missing.ldr"), MemoryAssets::new(), ImportOptions::default());
        assert!(matches!(result, Err(ImportError::NotFound { .. })));
    }
}
