//! Deterministic in-process AR platform.
//!
//! Hit-test results are carried by the frame itself, and each asynchronous
//! request kind can be answered immediately, held until
//! [`ScriptedPlatform::resolve_pending`], or rejected as unsupported.

use crate::error::ArPlaceError;
use crate::math::Transform;
use crate::platform::{
    HitTestResult, HitTestSourceHandle, ReferenceSpace, ReferenceSpaceKind, Responder, XrPlatform,
};
use std::collections::HashSet;

/// How the platform answers an asynchronous request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyMode {
    /// Resolve inside the request call
    #[default]
    Immediate,
    /// Hold the request until `resolve_pending` is called
    Deferred,
    /// Reject as an unsupported feature
    Reject,
}

/// A single scripted surface hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptedHit {
    /// Pose in the render reference space; `None` simulates an unresolvable pose
    pub pose: Option<Transform>,
}

impl ScriptedHit {
    pub fn at(pose: Transform) -> Self {
        Self { pose: Some(pose) }
    }

    pub fn unresolvable() -> Self {
        Self { pose: None }
    }
}

impl HitTestResult for ScriptedHit {
    fn pose(&self, _space: &ReferenceSpace) -> Option<[f32; 16]> {
        self.pose.map(|pose| pose.to_matrix().to_cols_array())
    }
}

/// Frame object for [`ScriptedPlatform`]; holds the hits this frame reports
#[derive(Debug, Clone, Default)]
pub struct ScriptedFrame {
    pub hits: Vec<ScriptedHit>,
}

impl ScriptedFrame {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_hit(pose: Transform) -> Self {
        Self {
            hits: vec![ScriptedHit::at(pose)],
        }
    }

    pub fn with_hits(hits: Vec<ScriptedHit>) -> Self {
        Self { hits }
    }
}

pub struct ScriptedPlatform {
    reference_space_mode: ReplyMode,
    hit_test_mode: ReplyMode,
    next_id: u64,
    render_space: ReferenceSpace,
    pending_spaces: Vec<(ReferenceSpaceKind, Responder<ReferenceSpace>)>,
    pending_sources: Vec<Responder<HitTestSourceHandle>>,
    live_sources: HashSet<HitTestSourceHandle>,
    cancelled_sources: Vec<HitTestSourceHandle>,
    hit_test_requests: usize,
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        Self {
            reference_space_mode: ReplyMode::Immediate,
            hit_test_mode: ReplyMode::Immediate,
            next_id: 1,
            render_space: ReferenceSpace {
                id: 0,
                kind: ReferenceSpaceKind::Local,
            },
            pending_spaces: Vec::new(),
            pending_sources: Vec::new(),
            live_sources: HashSet::new(),
            cancelled_sources: Vec::new(),
            hit_test_requests: 0,
        }
    }

    pub fn with_reference_space_mode(mut self, mode: ReplyMode) -> Self {
        self.reference_space_mode = mode;
        self
    }

    pub fn with_hit_test_mode(mut self, mode: ReplyMode) -> Self {
        self.hit_test_mode = mode;
        self
    }

    /// Answers every deferred request. Returns how many were answered.
    pub fn resolve_pending(&mut self) -> usize {
        let spaces = std::mem::take(&mut self.pending_spaces);
        let sources = std::mem::take(&mut self.pending_sources);
        let answered = spaces.len() + sources.len();

        for (kind, reply) in spaces {
            let space = self.allocate_space(kind);
            reply.resolve(space);
        }
        for reply in sources {
            let source = self.allocate_source();
            reply.resolve(source);
        }
        answered
    }

    /// Number of hit-test sources requested so far
    pub fn hit_test_requests(&self) -> usize {
        self.hit_test_requests
    }

    pub fn live_sources(&self) -> usize {
        self.live_sources.len()
    }

    pub fn cancelled_sources(&self) -> &[HitTestSourceHandle] {
        &self.cancelled_sources
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn allocate_space(&mut self, kind: ReferenceSpaceKind) -> ReferenceSpace {
        ReferenceSpace {
            id: self.next_id(),
            kind,
        }
    }

    fn allocate_source(&mut self) -> HitTestSourceHandle {
        let source = HitTestSourceHandle(self.next_id());
        self.live_sources.insert(source);
        source
    }
}

impl Default for ScriptedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl XrPlatform for ScriptedPlatform {
    type Frame = ScriptedFrame;
    type HitResult = ScriptedHit;

    fn request_reference_space(
        &mut self,
        kind: ReferenceSpaceKind,
        reply: Responder<ReferenceSpace>,
    ) {
        match self.reference_space_mode {
            ReplyMode::Immediate => {
                let space = self.allocate_space(kind);
                reply.resolve(space);
            }
            ReplyMode::Deferred => self.pending_spaces.push((kind, reply)),
            ReplyMode::Reject => reply.reject(ArPlaceError::Unsupported(format!(
                "reference space {:?}",
                kind
            ))),
        }
    }

    fn request_hit_test_source(
        &mut self,
        _space: ReferenceSpace,
        reply: Responder<HitTestSourceHandle>,
    ) {
        self.hit_test_requests += 1;
        match self.hit_test_mode {
            ReplyMode::Immediate => {
                let source = self.allocate_source();
                reply.resolve(source);
            }
            ReplyMode::Deferred => self.pending_sources.push(reply),
            ReplyMode::Reject => reply.reject(ArPlaceError::Unsupported("hit-test".into())),
        }
    }

    fn hit_test_results(
        &self,
        frame: &Self::Frame,
        source: HitTestSourceHandle,
    ) -> Vec<Self::HitResult> {
        if !self.live_sources.contains(&source) {
            return Vec::new();
        }
        frame.hits.clone()
    }

    fn cancel_hit_test_source(&mut self, source: HitTestSourceHandle) {
        if self.live_sources.remove(&source) {
            self.cancelled_sources.push(source);
        }
    }

    fn render_reference_space(&self) -> Option<ReferenceSpace> {
        Some(self.render_space)
    }
}
