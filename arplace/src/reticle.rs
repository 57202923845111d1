//! Hit-test driven reticle.
//!
//! The reticle is polled, not event driven: once per frame the tracker samples
//! the hit-test source and keeps only the latest surface estimate.

use crate::events::ArEvent;
use crate::math::{Mat4, Transform};
use crate::platform::{HitTestResult, HitTestSourceHandle, ReferenceSpace, XrPlatform};
use crate::scene::NodeId;

/// Marker showing where content would be placed.
///
/// While `visible`, `pose` is the first hit-test result of the most recent
/// frame. When a frame has no result the reticle is hidden and the last pose
/// is kept as is.
#[derive(Debug, Clone)]
pub struct Reticle {
    node: NodeId,
    visible: bool,
    pose: Mat4,
    transform: Transform,
}

impl Reticle {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            visible: false,
            pose: Mat4::IDENTITY,
            transform: Transform::IDENTITY,
        }
    }

    /// Scene node that renders the reticle
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    /// Raw pose matrix of the latest hit
    pub fn pose(&self) -> Mat4 {
        self.pose
    }

    /// The latest hit decomposed into translation, rotation and scale
    pub fn transform(&self) -> Transform {
        self.transform
    }

    /// Samples `source` for `frame` and updates pose and visibility.
    ///
    /// Returns `ReticleShown`/`ReticleHidden` when visibility changed.
    pub fn update<P: XrPlatform>(
        &mut self,
        platform: &P,
        frame: &P::Frame,
        source: HitTestSourceHandle,
        space: &ReferenceSpace,
    ) -> Option<ArEvent> {
        let was_visible = self.visible;

        let results = platform.hit_test_results(frame, source);
        match results.first().and_then(|hit| hit.pose(space)) {
            Some(cols) => {
                self.pose = Mat4::from_cols_array(&cols);
                self.transform = Transform::from_matrix(self.pose);
                self.visible = true;
            }
            None => self.visible = false,
        }
        log::trace!(
            "Reticle: {} hit-test results, visible = {}",
            results.len(),
            self.visible
        );

        self.visibility_change(was_visible)
    }

    /// Hides the reticle without touching its pose.
    pub fn hide(&mut self) -> Option<ArEvent> {
        let was_visible = self.visible;
        self.visible = false;
        self.visibility_change(was_visible)
    }

    fn visibility_change(&self, was_visible: bool) -> Option<ArEvent> {
        match (was_visible, self.visible) {
            (false, true) => Some(ArEvent::ReticleShown),
            (true, false) => Some(ArEvent::ReticleHidden),
            _ => None,
        }
    }
}
