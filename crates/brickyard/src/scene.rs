//! Scene arena: model roots and the part nodes placed under them.
//!
//! Roots and nodes live in two `slotmap`s and are addressed by
//! [`RootHandle`] and [`NodeKey`]. The hierarchy is flat: a root holds an
//! ordered list of leaf nodes, one per placed part.

use std::path::PathBuf;

use brickyard_math::{ResolvedTransform, Vec3};
use serde::{Deserialize, Serialize};
use slotmap::{new_key_type, SlotMap};

use crate::assets::{GeometryHandle, MaterialHandle};

new_key_type! {
    /// Handle to a model root.
    pub struct RootHandle;
    /// Handle to a placed part node.
    pub struct NodeKey;
}

/// Lifecycle of a model root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootState {
    /// No import has completed since creation or the last clear.
    Empty,
    /// An import is running (or panicked part way through).
    Importing,
    /// The last import completed.
    Populated,
}

/// A placed part.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    /// Node name; the part identifier.
    pub name: String,
    /// Part identifier from the source file.
    pub part_id: String,
    /// Resolved geometry.
    pub geometry: GeometryHandle,
    /// Local transform relative to the root.
    pub transform: ResolvedTransform,
    /// Resolved material, if the color code was known.
    pub material: Option<MaterialHandle>,
    /// Color code from the source file.
    pub color: i32,
    /// 1-based source line.
    pub line: usize,
    parent: Option<RootHandle>,
    active: bool,
}

impl ModelNode {
    /// Create a detached, inactive node.
    pub fn new(
        part_id: impl Into<String>,
        geometry: GeometryHandle,
        transform: ResolvedTransform,
        material: Option<MaterialHandle>,
    ) -> Self {
        let part_id = part_id.into();
        Self {
            name: part_id.clone(),
            part_id,
            geometry,
            transform,
            material,
            color: 0,
            line: 0,
            parent: None,
            active: false,
        }
    }

    /// Set the source color code and line.
    pub fn with_source(mut self, color: i32, line: usize) -> Self {
        self.color = color;
        self.line = line;
        self
    }

    /// Root this node is attached to.
    pub fn parent(&self) -> Option<RootHandle> {
        self.parent
    }

    /// Whether the node is attached and visible.
    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[derive(Debug, Clone)]
struct RootNode {
    name: String,
    children: Vec<NodeKey>,
    state: RootState,
}

/// Axis-aligned bounds of node positions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Bounds {
    /// Center point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    fn extend(&mut self, p: &Vec3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }
}

/// Owns every root and node.
#[derive(Debug, Clone, Default)]
pub struct Scene {
    roots: SlotMap<RootHandle, RootNode>,
    nodes: SlotMap<NodeKey, ModelNode>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty root.
    pub fn create_root(&mut self, name: impl Into<String>) -> RootHandle {
        self.roots.insert(RootNode {
            name: name.into(),
            children: Vec::new(),
            state: RootState::Empty,
        })
    }

    /// Whether `root` exists.
    pub fn contains_root(&self, root: RootHandle) -> bool {
        self.roots.contains_key(root)
    }

    /// Name of `root`.
    pub fn root_name(&self, root: RootHandle) -> Option<&str> {
        self.roots.get(root).map(|r| r.name.as_str())
    }

    /// Lifecycle state of `root`.
    pub fn state(&self, root: RootHandle) -> Option<RootState> {
        self.roots.get(root).map(|r| r.state)
    }

    /// Children of `root` in source order. Empty for an unknown root.
    pub fn children(&self, root: RootHandle) -> &[NodeKey] {
        self.roots
            .get(root)
            .map(|r| r.children.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate over the child nodes of `root`.
    pub fn nodes(&self, root: RootHandle) -> impl Iterator<Item = &ModelNode> + '_ {
        self.children(root)
            .iter()
            .filter_map(move |key| self.nodes.get(*key))
    }

    /// Look up a node.
    pub fn node(&self, key: NodeKey) -> Option<&ModelNode> {
        self.nodes.get(key)
    }

    /// Number of nodes in the arena, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn set_state(&mut self, root: RootHandle, state: RootState) {
        if let Some(r) = self.roots.get_mut(root) {
            r.state = state;
        }
    }

    pub(crate) fn insert_node(&mut self, node: ModelNode) -> NodeKey {
        self.nodes.insert(node)
    }

    /// Overwrite a parked node's contents, keeping its key.
    pub(crate) fn reset_node(&mut self, key: NodeKey, node: ModelNode) {
        if let Some(slot) = self.nodes.get_mut(key) {
            *slot = node;
        }
    }

    pub(crate) fn attach(&mut self, root: RootHandle, key: NodeKey) {
        let Some(r) = self.roots.get_mut(root) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(key) {
            node.parent = Some(root);
            node.active = true;
            r.children.push(key);
        }
    }

    /// Detach and deactivate every child of `root`, returning their keys.
    pub(crate) fn detach_all(&mut self, root: RootHandle) -> Vec<NodeKey> {
        let children = match self.roots.get_mut(root) {
            Some(r) => std::mem::take(&mut r.children),
            None => return Vec::new(),
        };
        for key in &children {
            if let Some(node) = self.nodes.get_mut(*key) {
                node.parent = None;
                node.active = false;
            }
        }
        children
    }

    pub(crate) fn destroy(&mut self, key: NodeKey) -> Option<ModelNode> {
        self.nodes.remove(key)
    }

    /// Bounds of the active children's positions, or `None` if there are none.
    pub fn bounds(&self, root: RootHandle) -> Option<Bounds> {
        let mut positions = self.nodes(root).map(|n| n.transform.position);
        let first = positions.next()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in positions {
            bounds.extend(&p);
        }
        Some(bounds)
    }

    /// Move every child so the bounds are centered on the root's origin.
    ///
    /// Returns the offset that was applied.
    pub fn center_to_origin(&mut self, root: RootHandle) -> Option<Vec3> {
        let offset = -self.bounds(root)?.center();
        let children = self.roots.get(root)?.children.clone();
        for key in children {
            if let Some(node) = self.nodes.get_mut(key) {
                node.transform.position += offset;
            }
        }
        Some(offset)
    }

    /// Serializable copy of `root` and its children.
    pub fn snapshot(&self, root: RootHandle) -> Option<ModelSnapshot> {
        let name = self.root_name(root)?.to_string();
        let nodes = self.nodes(root).map(NodeSnapshot::from).collect();
        Some(ModelSnapshot { name, nodes })
    }
}

/// Plain-data copy of a model, for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    /// Root name.
    pub name: String,
    /// Child nodes in source order.
    pub nodes: Vec<NodeSnapshot>,
}

impl ModelSnapshot {
    /// Serialize to a JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Plain-data copy of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    /// Node name.
    pub name: String,
    /// Part identifier.
    pub part_id: String,
    /// Geometry key.
    pub geometry: String,
    /// Geometry file, if any.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub source: Option<PathBuf>,
    /// Source line.
    pub line: usize,
    /// Color code.
    pub color: i32,
    /// Material key, if resolved.
    pub material: Option<String>,
    /// Local position.
    pub position: [f64; 3],
    /// Local rotation as `[x, y, z, w]`.
    pub rotation: [f64; 4],
    /// Local scale.
    pub scale: [f64; 3],
}

impl From<&ModelNode> for NodeSnapshot {
    fn from(node: &ModelNode) -> Self {
        let t = &node.transform;
        let q = t.rotation.quaternion();
        Self {
            name: node.name.clone(),
            part_id: node.part_id.clone(),
            geometry: node.geometry.key.clone(),
            source: node.geometry.source.clone(),
            line: node.line,
            color: node.color,
            material: node.material.as_ref().map(|m| m.name.clone()),
            position: [t.position.x, t.position.y, t.position.z],
            rotation: [q.i, q.j, q.k, q.w],
            scale: [t.scale.x, t.scale.y, t.scale.z],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn brick_at(x: f64, y: f64, z: f64) -> ModelNode {
        let transform = ResolvedTransform::identity().translated(&Vec3::new(x, y, z));
        ModelNode::new("3005", GeometryHandle::new("Prefabs/3005"), transform, None)
    }

    #[test]
    fn test_attach_and_detach() {
        let mut scene = Scene::new();
        let root = scene.create_root("Model");
        assert_eq!(scene.state(root), Some(RootState::Empty));

        let a = scene.insert_node(brick_at(0.0, 0.0, 0.0));
        let b = scene.insert_node(brick_at(1.0, 0.0, 0.0));
        assert!(!scene.node(a).unwrap().is_active());

        scene.attach(root, a);
        scene.attach(root, b);
        assert_eq!(scene.children(root), &[a, b]);
        assert_eq!(scene.node(a).unwrap().parent(), Some(root));
        assert!(scene.node(b).unwrap().is_active());

        let detached = scene.detach_all(root);
        assert_eq!(detached, vec![a, b]);
        assert!(scene.children(root).is_empty());
        assert_eq!(scene.node(a).unwrap().parent(), None);
        assert_eq!(scene.node_count(), 2);

        scene.destroy(a);
        assert!(scene.node(a).is_none());
    }

    #[test]
    fn test_bounds_and_center() {
        let mut scene = Scene::new();
        let root = scene.create_root("Model");
        assert!(scene.bounds(root).is_none());
        assert!(scene.center_to_origin(root).is_none());

        for p in [(0.0, 0.0, 0.0), (4.0, -2.0, 1.0), (2.0, 2.0, -3.0)] {
            let key = scene.insert_node(brick_at(p.0, p.1, p.2));
            scene.attach(root, key);
        }
        let bounds = scene.bounds(root).unwrap();
        assert_eq!(bounds.min, Vec3::new(0.0, -2.0, -3.0));
        assert_eq!(bounds.max, Vec3::new(4.0, 2.0, 1.0));
        assert_eq!(bounds.size(), Vec3::new(4.0, 4.0, 4.0));

        let offset = scene.center_to_origin(root).unwrap();
        assert_abs_diff_eq!(offset, Vec3::new(-2.0, 0.0, 1.0), epsilon = 1e-12);
        let centered = scene.bounds(root).unwrap();
        assert_abs_diff_eq!(centered.center(), Vec3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn test_snapshot_json() {
        let mut scene = Scene::new();
        let root = scene.create_root("Model");
        let key = scene.insert_node(brick_at(0.5, 1.0, -0.25).with_source(7, 2));
        scene.attach(root, key);

        let snapshot = scene.snapshot(root).unwrap();
        assert_eq!(snapshot.name, "Model");
        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(snapshot.nodes[0].rotation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(snapshot.nodes[0].line, 2);

        let json = snapshot.to_json().unwrap();
        assert!(json.contains(r#""part_id": "3005""#));
        let restored = ModelSnapshot::from_json(&json).unwrap();
        assert_eq!(restored, snapshot);
    }

    #[test]
    fn test_unknown_root() {
        let mut other = Scene::new();
        let foreign = other.create_root("Other");
        let scene = Scene::new();
        assert!(!scene.contains_root(foreign));
        assert!(scene.children(foreign).is_empty());
        assert!(scene.snapshot(foreign).is_none());
    }
}
