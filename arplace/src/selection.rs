//! Controller-ray grab and release.
//!
//! Each tracked input source gets a [`Controller`] with a two-state machine:
//!
//! ```text
//!            select-start, ray hits a pickable
//!   Idle  ------------------------------------>  Holding(node)
//!         <------------------------------------
//!            select-end, node returns to anchor
//! ```
//!
//! Both transitions reparent with [`SceneGraph::attach`], so the grabbed object
//! never jumps. While holding, the object follows the controller through scene
//! parenting alone.

use crate::error::{ArPlaceError, Result};
use crate::math::{Ray, Transform};
use crate::platform::InputSourceId;
use crate::scene::{NodeId, SceneGraph};

/// Selection state of one controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Holding(NodeId),
}

/// Objects that selection rays are tested against, in registration order.
#[derive(Debug, Clone, Default)]
pub struct SelectableSet {
    nodes: Vec<NodeId>,
}

impl SelectableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `node` was already registered
    pub fn register(&mut self, node: NodeId) -> bool {
        if self.nodes.contains(&node) {
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn unregister(&mut self, node: NodeId) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|n| *n != node);
        self.nodes.len() != before
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Registered nodes minus the ones in `held`
    pub fn available(&self, held: &[NodeId]) -> Vec<NodeId> {
        self.nodes
            .iter()
            .copied()
            .filter(|node| !held.contains(node))
            .collect()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// A tracked input source and whatever it is holding.
#[derive(Debug, Clone)]
pub struct Controller {
    id: InputSourceId,
    node: NodeId,
    state: ControllerState,
}

impl Controller {
    pub fn new(id: InputSourceId, node: NodeId) -> Self {
        Self {
            id,
            node,
            state: ControllerState::Idle,
        }
    }

    pub fn id(&self) -> InputSourceId {
        self.id
    }

    /// Scene node that follows the controller's tracked pose
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn held_object(&self) -> Option<NodeId> {
        match self.state {
            ControllerState::Holding(node) => Some(node),
            ControllerState::Idle => None,
        }
    }

    pub fn is_holding(&self) -> bool {
        self.held_object().is_some()
    }

    /// Selection ray from the controller's current world pose
    pub fn ray<S: SceneGraph>(&self, scene: &S) -> Result<Ray> {
        let world: Transform = scene
            .world_transform(self.node)
            .ok_or(ArPlaceError::NodeNotFound(self.node))?;
        Ok(Ray::from_transform(&world))
    }

    /// `Idle -> Holding` on select-start.
    ///
    /// Casts the controller ray against `candidates` and grabs the nearest hit.
    /// Returns the grabbed node, or `None` if nothing was hit. Already holding
    /// something makes this a no-op.
    pub fn select_start<S: SceneGraph>(
        &mut self,
        scene: &mut S,
        candidates: &[NodeId],
        max_distance: f32,
    ) -> Result<Option<NodeId>> {
        if let ControllerState::Holding(node) = self.state {
            log::debug!(
                "{}: select-start ignored, already holding {}",
                self.id,
                node
            );
            return Ok(None);
        }

        let ray = self.ray(scene)?;
        let hits = scene.intersect(&ray, candidates, max_distance);
        let Some(hit) = hits.first() else {
            log::debug!("{}: select-start hit nothing", self.id);
            return Ok(None);
        };

        scene.attach(self.node, hit.node)?;
        self.state = ControllerState::Holding(hit.node);
        log::debug!(
            "{}: grabbed {} at {:.3} m ({} hits)",
            self.id,
            hit.node,
            hit.distance,
            hits.len()
        );
        Ok(Some(hit.node))
    }

    /// `Holding -> Idle` on select-end.
    ///
    /// Hands the held object back to `anchor`. Returns the released node, or
    /// `None` if nothing was held.
    pub fn select_end<S: SceneGraph>(
        &mut self,
        scene: &mut S,
        anchor: NodeId,
    ) -> Result<Option<NodeId>> {
        let ControllerState::Holding(node) = self.state else {
            log::debug!("{}: select-end with nothing held", self.id);
            return Ok(None);
        };

        scene.attach(anchor, node)?;
        self.state = ControllerState::Idle;
        log::debug!("{}: released {}", self.id, node);
        Ok(Some(node))
    }

    /// Forgets the held object without touching the scene, for objects that
    /// were removed out from under the controller.
    pub(crate) fn drop_held(&mut self) -> Option<NodeId> {
        let held = self.held_object();
        self.state = ControllerState::Idle;
        held
    }
}
