//! Immersive-session platform interface.
//!
//! The controller never talks to a device directly. Everything it needs from
//! the AR runtime goes through [`XrPlatform`]:
//!
//! 1. **Reference spaces** - requested asynchronously, resolved to opaque handles
//! 2. **Hit-test sources** - requested asynchronously against a reference space
//! 3. **Hit-test results** - polled synchronously once per frame
//!
//! Asynchronous requests carry a [`Responder`]. The platform resolves or rejects
//! it whenever the underlying request completes, from any thread. The reply is
//! queued and applied by the controller at the start of the next tick, so a
//! late reply for a session that already ended is detected and dropped.
//!
//! [`ScriptedPlatform`] is a deterministic in-process implementation used by the
//! demo and the tests.

pub mod reply;
pub mod scripted;

pub use reply::Responder;
pub use scripted::{ReplyMode, ScriptedFrame, ScriptedHit, ScriptedPlatform};

/// Identifier of a tracked input source (controller, hand, or screen touch).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputSourceId(pub u32);

impl std::fmt::Display for InputSourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InputSourceId({})", self.0)
    }
}

/// Kind of reference space requested from the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceSpaceKind {
    /// Tracks the viewer; hit-test rays are cast from here
    Viewer,
    /// Fixed at the session origin; placed content lives here
    Local,
}

/// Opaque handle to a platform reference space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReferenceSpace {
    pub id: u64,
    pub kind: ReferenceSpaceKind,
}

/// Opaque handle to a platform hit-test source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HitTestSourceHandle(pub u64);

impl std::fmt::Display for HitTestSourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HitTestSource({})", self.0)
    }
}

/// One surface intersection reported by a hit-test source.
pub trait HitTestResult {
    /// Pose of the intersection expressed in `space`, as a column-major 4x4
    /// matrix. `None` if the platform cannot relate the result to that space
    /// this frame.
    fn pose(&self, space: &ReferenceSpace) -> Option<[f32; 16]>;
}

/// The immersive AR runtime as seen by the interaction controller.
///
/// All methods are called from the thread that drives the frame loop.
pub trait XrPlatform {
    /// Per-frame object handed to the frame callback
    type Frame;
    type HitResult: HitTestResult;

    /// Request a reference space. Resolve `reply` with the handle, or reject it
    /// with [`ArPlaceError::Unsupported`](crate::ArPlaceError::Unsupported).
    fn request_reference_space(
        &mut self,
        kind: ReferenceSpaceKind,
        reply: Responder<ReferenceSpace>,
    );

    /// Request a hit-test source whose rays originate in `space`.
    fn request_hit_test_source(
        &mut self,
        space: ReferenceSpace,
        reply: Responder<HitTestSourceHandle>,
    );

    /// Results of `source` for `frame`, best first.
    fn hit_test_results(
        &self,
        frame: &Self::Frame,
        source: HitTestSourceHandle,
    ) -> Vec<Self::HitResult>;

    /// Release a hit-test source. Must tolerate handles that were already released.
    fn cancel_hit_test_source(&mut self, source: HitTestSourceHandle);

    /// Reference space the renderer expresses world poses in, if the session
    /// has one yet.
    fn render_reference_space(&self) -> Option<ReferenceSpace>;
}
