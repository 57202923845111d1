use crate::error::{ArPlaceError, Result};
use crate::math::{Ray, Transform};
use crate::scene::{LoadedModel, NodeId, RayHit, SceneGraph};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct Node {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    local: Transform,
    visible: bool,
    bounding_radius: Option<f32>,
}

impl Node {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
            children: Vec::new(),
            local: Transform::IDENTITY,
            visible: true,
            bounding_radius: None,
        }
    }
}

/// Minimal in-memory scene graph.
///
/// Every node is a group with a local transform; nodes instantiated from a
/// [`LoadedModel`] also carry a bounding sphere used by [`SceneGraph::intersect`].
#[derive(Debug, Clone)]
pub struct NodeTree {
    nodes: HashMap<NodeId, Node>,
    root: NodeId,
    next_id: u64,
}

impl NodeTree {
    pub fn new() -> Self {
        let root = NodeId::from_raw(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, Node::new("root"));
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn insert(&mut self, node: Node) -> NodeId {
        let id = NodeId::from_raw(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(&id).ok_or(ArPlaceError::NodeNotFound(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(&id).ok_or(ArPlaceError::NodeNotFound(id))
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    fn detach(&mut self, node: NodeId) -> Result<()> {
        let Some(parent) = self.node(node)?.parent else {
            return Ok(());
        };
        self.node_mut(parent)?.children.retain(|child| *child != node);
        self.node_mut(node)?.parent = None;
        Ok(())
    }

    fn link(&mut self, parent: NodeId, node: NodeId) -> Result<()> {
        self.node(parent)?;
        self.node(node)?;
        if self.is_ancestor_or_self(node, parent) {
            return Err(ArPlaceError::Scene(format!(
                "cannot parent {} under its own descendant {}",
                node, parent
            )));
        }
        self.detach(node)?;
        self.node_mut(parent)?.children.push(node);
        self.node_mut(node)?.parent = Some(parent);
        Ok(())
    }

    /// Nearest hit of `ray` on the bounding spheres within the subtree of `node`
    fn nearest_in_subtree(&self, ray: &Ray, node: NodeId) -> Option<f32> {
        let mut nearest: Option<f32> = None;
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(entry) = self.nodes.get(&id) else {
                continue;
            };
            if !entry.visible {
                continue;
            }
            if let (Some(radius), Some(world)) = (entry.bounding_radius, self.world_transform(id))
            {
                let scaled = radius * world.scale.abs().max_element();
                if let Some(distance) = ray.intersect_sphere(world.translation, scaled) {
                    nearest = Some(nearest.map_or(distance, |d| d.min(distance)));
                }
            }
            stack.extend(entry.children.iter().copied());
        }
        nearest
    }
}

impl Default for NodeTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph for NodeTree {
    fn root(&self) -> NodeId {
        self.root
    }

    fn create_node(&mut self, name: &str) -> NodeId {
        self.insert(Node::new(name))
    }

    fn instantiate(&mut self, model: &LoadedModel) -> Result<NodeId> {
        if !model.bounding_radius.is_finite() || model.bounding_radius < 0.0 {
            return Err(ArPlaceError::Scene(format!(
                "model '{}' has invalid bounding radius {}",
                model.path, model.bounding_radius
            )));
        }
        let mut node = Node::new(&model.name);
        node.bounding_radius = Some(model.bounding_radius);
        Ok(self.insert(node))
    }

    fn add_child(&mut self, parent: NodeId, node: NodeId) -> Result<()> {
        self.link(parent, node)
    }

    fn remove_from_parent(&mut self, node: NodeId) -> Result<()> {
        self.detach(node)
    }

    fn destroy(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(ArPlaceError::Scene("cannot destroy the scene root".into()));
        }
        self.detach(node)?;
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            if let Some(entry) = self.nodes.remove(&id) {
                stack.extend(entry.children);
            }
        }
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, node: NodeId) -> Result<()> {
        let world = self
            .world_transform(node)
            .ok_or(ArPlaceError::NodeNotFound(node))?;
        let parent_world = self
            .world_transform(parent)
            .ok_or(ArPlaceError::NodeNotFound(parent))?;
        self.link(parent, node)?;
        self.node_mut(node)?.local = parent_world.inverse().mul_transform(&world);
        Ok(())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(&node).and_then(|n| n.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .get(&node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    fn name(&self, node: NodeId) -> Option<String> {
        self.nodes.get(&node).map(|n| n.name.clone())
    }

    fn local_transform(&self, node: NodeId) -> Option<Transform> {
        self.nodes.get(&node).map(|n| n.local)
    }

    fn set_local_transform(&mut self, node: NodeId, transform: Transform) -> Result<()> {
        self.node_mut(node)?.local = transform;
        Ok(())
    }

    fn world_transform(&self, node: NodeId) -> Option<Transform> {
        let entry = self.nodes.get(&node)?;
        let mut matrix = entry.local.to_matrix();
        let mut parent = entry.parent;
        while let Some(id) = parent {
            let ancestor = self.nodes.get(&id)?;
            matrix = ancestor.local.to_matrix() * matrix;
            parent = ancestor.parent;
        }
        Some(Transform::from_matrix(matrix))
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<()> {
        self.node_mut(node)?.visible = visible;
        Ok(())
    }

    fn is_visible(&self, node: NodeId) -> Option<bool> {
        self.nodes.get(&node).map(|n| n.visible)
    }

    fn intersect(&self, ray: &Ray, candidates: &[NodeId], max_distance: f32) -> Vec<RayHit> {
        let mut hits: Vec<RayHit> = candidates
            .iter()
            .filter_map(|&node| {
                let distance = self.nearest_in_subtree(ray, node)?;
                (distance <= max_distance).then(|| RayHit {
                    node,
                    distance,
                    point: ray.at(distance),
                })
            })
            .collect();
        // stable: equal distances keep candidate order
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}
