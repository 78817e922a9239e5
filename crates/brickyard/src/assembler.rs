//! Model assembly: drives parsing and resolution, and owns the scene.

use std::path::{Path, PathBuf};

use brickyard_math::{TransformResolver, Vec3};
use serde::{Deserialize, Serialize};

use crate::assets::AssetResolver;
use crate::color::ColorResolver;
use crate::config::ImportOptions;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
use crate::error::ImportError;
use crate::part::PartResolver;
use crate::pool::NodePool;
use crate::record::records;
use crate::scene::{ModelNode, RootHandle, RootState, Scene};

/// What happens to a root's existing children when it is imported into
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReimportPolicy {
    /// Destroy every child, then build from scratch.
    #[default]
    Replace,
    /// Park children in a pool keyed by geometry and reactivate them for
    /// records that need the same geometry.
    Pool,
}

/// Outcome of the most recent import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    /// Root that was populated.
    pub root: RootHandle,
    /// Source file, if the import came from disk.
    pub path: Option<PathBuf>,
    /// Nodes allocated by this import.
    pub created: usize,
    /// Nodes taken back from the pool.
    pub reused: usize,
    /// Everything that was skipped or left incomplete.
    pub diagnostics: Vec<Diagnostic>,
}

impl ImportSummary {
    /// Nodes attached to the root.
    pub fn nodes(&self) -> usize {
        self.created + self.reused
    }

    /// Records that produced no node.
    pub fn skipped(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.skipped_node()).count()
    }
}

/// Builds and rebuilds models from placement files.
///
/// The assembler exclusively owns its [`Scene`]; callers read it through
/// [`ModelAssembler::scene`] and change it only through imports and
/// [`ModelAssembler::clear`].
pub struct ModelAssembler<R> {
    assets: R,
    options: ImportOptions,
    transforms: TransformResolver,
    parts: PartResolver,
    colors: ColorResolver,
    scene: Scene,
    pool: NodePool,
    sink: Box<dyn DiagnosticSink>,
    model_root: Option<RootHandle>,
    last_import: Option<(RootHandle, PathBuf)>,
    summary: Option<ImportSummary>,
}

impl<R: AssetResolver> ModelAssembler<R> {
    /// Create an assembler that logs diagnostics through `tracing`.
    pub fn new(assets: R, options: ImportOptions) -> Self {
        Self {
            transforms: options.transform_resolver(),
            parts: options.part_resolver(),
            colors: options.color_resolver(),
            assets,
            options,
            scene: Scene::new(),
            pool: NodePool::new(),
            sink: Box::new(TracingSink),
            model_root: None,
            last_import: None,
            summary: None,
        }
    }

    /// Replace the diagnostics sink.
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Import options.
    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Asset resolver.
    pub fn assets(&self) -> &R {
        &self.assets
    }

    /// The scene.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Summary of the last completed import.
    pub fn last_summary(&self) -> Option<&ImportSummary> {
        self.summary.as_ref()
    }

    /// Number of parked nodes.
    pub fn pooled(&self) -> usize {
        self.pool.len()
    }

    /// The reusable model root, created on first use.
    pub fn root(&mut self) -> RootHandle {
        match self.model_root {
            Some(root) => root,
            None => {
                let root = self.scene.create_root(self.options.root_name.clone());
                self.model_root = Some(root);
                root
            }
        }
    }

    /// Add another root to the scene.
    pub fn create_root(&mut self, name: impl Into<String>) -> RootHandle {
        self.scene.create_root(name)
    }

    /// Import `path` into the model root.
    pub fn import(&mut self, path: impl AsRef<Path>) -> Result<RootHandle, ImportError> {
        let root = self.root();
        self.import_into(root, path)
    }

    /// Import `path` into `root`.
    ///
    /// The file is read before the root is touched, so a missing file
    /// leaves the previous model in place.
    pub fn import_into(&mut self, root: RootHandle, path: impl AsRef<Path>) -> Result<RootHandle, ImportError> {
        let path = path.as_ref();
        self.check_ready(root)?;
        let text = std::fs::read_to_string(path).map_err(|e| ImportError::from_io(path, e))?;
        self.assemble(root, &text, Some(path.to_path_buf()));
        self.last_import = Some((root, path.to_path_buf()));
        Ok(root)
    }

    /// Import placement text into `root`.
    pub fn import_str(&mut self, root: RootHandle, text: &str) -> Result<RootHandle, ImportError> {
        self.check_ready(root)?;
        self.assemble(root, text, None);
        Ok(root)
    }

    /// Import the most recently imported file again, into the same root.
    pub fn reload(&mut self) -> Result<RootHandle, ImportError> {
        let (root, path) = self.last_import.clone().ok_or(ImportError::NothingToReload)?;
        self.import_into(root, path)
    }

    /// Remove every child of `root` and return it to the empty state.
    ///
    /// Under [`ReimportPolicy::Pool`] the children are parked rather than
    /// destroyed. Also recovers a root left mid-import by a panic.
    pub fn clear(&mut self, root: RootHandle) -> Result<(), ImportError> {
        if !self.scene.contains_root(root) {
            return Err(ImportError::UnknownRoot);
        }
        self.release_children(root);
        self.scene.set_state(root, RootState::Empty);
        Ok(())
    }

    /// Destroy every parked node. Returns how many were destroyed.
    pub fn drain_pool(&mut self) -> usize {
        let keys = self.pool.drain();
        for key in &keys {
            self.scene.destroy(*key);
        }
        keys.len()
    }

    /// Center `root`'s children on its origin. Returns the applied offset.
    pub fn center_to_origin(&mut self, root: RootHandle) -> Option<Vec3> {
        self.scene.center_to_origin(root)
    }

    fn check_ready(&self, root: RootHandle) -> Result<(), ImportError> {
        match self.scene.state(root) {
            None => Err(ImportError::UnknownRoot),
            Some(RootState::Importing) => Err(ImportError::Busy {
                root: self.scene.root_name(root).unwrap_or_default().to_string(),
            }),
            Some(_) => Ok(()),
        }
    }

    fn release_children(&mut self, root: RootHandle) {
        let previous = self.scene.detach_all(root);
        match self.options.policy {
            ReimportPolicy::Replace => {
                for key in previous {
                    self.scene.destroy(key);
                }
            }
            ReimportPolicy::Pool => {
                for key in previous {
                    if let Some(node) = self.scene.node(key) {
                        self.pool.park(node.geometry.clone(), key);
                    }
                }
            }
        }
    }

    fn assemble(&mut self, root: RootHandle, text: &str, path: Option<PathBuf>) {
        self.scene.set_state(root, RootState::Importing);
        self.release_children(root);

        let mut diagnostics = Vec::new();
        let mut created = 0;
        let mut reused = 0;

        for (line, result) in records(text) {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    self.report(&mut diagnostics, line, DiagnosticKind::MalformedRecord(e));
                    continue;
                }
            };

            let Some(geometry) = self.parts.resolve(&self.assets, &record.part_id) else {
                let kind = DiagnosticKind::MissingPart {
                    key: self.parts.key(&record.part_id),
                    part_id: record.part_id,
                };
                self.report(&mut diagnostics, line, kind);
                continue;
            };

            let material = self.colors.resolve(&self.assets, record.color);
            if material.is_none() {
                let kind = DiagnosticKind::MissingMaterial {
                    color: record.color,
                    key: self.colors.key(record.color),
                };
                self.report(&mut diagnostics, line, kind);
            }

            let transform = self
                .transforms
                .resolve(&record.position, &record.matrix)
                .translated(&self.options.pivot_offset(&record.part_id));

            let node = ModelNode::new(record.part_id, geometry, transform, material)
                .with_source(record.color, line);

            let pooled = match self.options.policy {
                ReimportPolicy::Pool => self.pool.take(&node.geometry),
                ReimportPolicy::Replace => None,
            };
            let key = match pooled {
                Some(key) if self.scene.node(key).is_some() => {
                    self.scene.reset_node(key, node);
                    reused += 1;
                    key
                }
                _ => {
                    created += 1;
                    self.scene.insert_node(node)
                }
            };
            self.scene.attach(root, key);
        }

        self.scene.set_state(root, RootState::Populated);
        let summary = ImportSummary {
            root,
            path,
            created,
            reused,
            diagnostics,
        };
        tracing::debug!(
            created,
            reused,
            skipped = summary.skipped(),
            warnings = summary.diagnostics.len(),
            pooled = self.pool.len(),
            "model assembled"
        );
        self.summary = Some(summary);
    }

    fn report(&mut self, diagnostics: &mut Vec<Diagnostic>, line: usize, kind: DiagnosticKind) {
        let diagnostic = Diagnostic { line, kind };
        self.sink.warn(&diagnostic);
        diagnostics.push(diagnostic);
    }
}
