//! Scene-graph and asset-loading collaborators.
//!
//! The renderer owns the scene graph; the interaction controller only needs a
//! handful of operations from it, captured by [`SceneGraph`]:
//!
//! 1. **Parenting** - `add_child`, `remove_from_parent`, `destroy` and the
//!    world-transform-preserving `attach`
//! 2. **Transforms and visibility** - for the reticle and spawned content
//! 3. **Ray intersection** - nearest-first hits against a candidate set
//!
//! Models are fetched through [`AssetLoader`], which answers asynchronously via a
//! [`Responder`](crate::platform::Responder).
//!
//! [`NodeTree`] and [`ModelCatalog`] are small in-memory implementations used by
//! the demo and the tests.

pub mod loader;
pub mod node_tree;

pub use loader::{AssetLoader, ModelCatalog};
pub use node_tree::NodeTree;

use crate::error::Result;
use crate::math::{Ray, Transform, Vec3};

/// Handle to a node in the scene graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Result of a ray intersection test against one candidate node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Candidate whose subtree was hit
    pub node: NodeId,
    /// Distance from ray origin to hit point (in meters)
    pub distance: f32,
    /// Hit point in world space
    pub point: Vec3,
}

/// A model subtree delivered by an [`AssetLoader`], ready to be instantiated.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    pub path: String,
    pub name: String,
    /// Radius of a sphere around the model origin enclosing its geometry,
    /// used for selection rays
    pub bounding_radius: f32,
}

impl LoadedModel {
    pub fn new(path: impl Into<String>, name: impl Into<String>, bounding_radius: f32) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            bounding_radius,
        }
    }
}

/// Trait for the renderer's scene graph.
///
/// Implement this over your engine's node hierarchy. Nodes are created
/// detached; a node has at most one parent at a time and `add_child`/`attach`
/// move it away from any previous parent.
pub trait SceneGraph {
    /// Scene root; always present
    fn root(&self) -> NodeId;

    /// Create an empty, detached group node
    fn create_node(&mut self, name: &str) -> NodeId;

    /// Instantiate a loaded model as a detached subtree and return its root
    fn instantiate(&mut self, model: &LoadedModel) -> Result<NodeId>;

    /// Parent `node` under `parent`, keeping its local transform
    fn add_child(&mut self, parent: NodeId, node: NodeId) -> Result<()>;

    /// Detach `node`. Detaching an already detached node is a no-op.
    fn remove_from_parent(&mut self, node: NodeId) -> Result<()>;

    /// Detach `node` and free it together with its whole subtree. The ids are
    /// invalid afterwards.
    fn destroy(&mut self, node: NodeId) -> Result<()>;

    /// Parent `node` under `parent`, rewriting its local transform so that its
    /// world transform is unchanged
    fn attach(&mut self, parent: NodeId, node: NodeId) -> Result<()>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    fn children(&self, node: NodeId) -> Vec<NodeId>;

    fn name(&self, node: NodeId) -> Option<String>;

    fn local_transform(&self, node: NodeId) -> Option<Transform>;

    fn set_local_transform(&mut self, node: NodeId, transform: Transform) -> Result<()>;

    fn world_transform(&self, node: NodeId) -> Option<Transform>;

    fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<()>;

    fn is_visible(&self, node: NodeId) -> Option<bool>;

    /// Intersect `ray` with the subtrees rooted at `candidates`.
    ///
    /// Returns at most one hit per candidate, ordered nearest first. Hits
    /// farther than `max_distance` are dropped. Equal distances keep the order
    /// of `candidates`.
    fn intersect(&self, ray: &Ray, candidates: &[NodeId], max_distance: f32) -> Vec<RayHit>;
}
