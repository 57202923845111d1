//! Session lifecycle and per-session state.
//!
//! A [`SessionContext`] is created when the AR session starts and owns every
//! piece of state scoped to that session: the hit-test source, the reference
//! spaces it was negotiated against, and the one-shot placement latch.
//!
//! Hit-test acquisition is a two-step asynchronous chain (viewer reference
//! space, then a hit-test source bound to it). Its progress is tracked by
//! [`HitTestState`]; replies tagged with a different or ended session never
//! reach the context.

use crate::error::{ArPlaceError, Result};
use crate::events::ArEvent;
use crate::platform::reply::{Reply, ReplyPayload};
use crate::platform::{
    HitTestSourceHandle, ReferenceSpace, ReferenceSpaceKind, Responder, XrPlatform,
};
use crossbeam_channel::Sender;
use uuid::Uuid;

/// Unique identity of one AR session
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Progress of the hit-test source acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTestState {
    /// No source, and none on the way
    Absent,
    /// A reference-space or hit-test-source request is outstanding
    Pending,
    Ready(HitTestSourceHandle),
}

impl HitTestState {
    pub fn source(&self) -> Option<HitTestSourceHandle> {
        match self {
            Self::Ready(source) => Some(*source),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct SessionContext {
    id: SessionId,
    active: bool,
    hit_test: HitTestState,
    hit_test_requested: bool,
    viewer_space: Option<ReferenceSpace>,
    render_space: Option<ReferenceSpace>,
    placed: bool,
}

impl SessionContext {
    pub fn begin(render_space: Option<ReferenceSpace>) -> Self {
        let context = Self {
            id: SessionId::new(),
            active: true,
            hit_test: HitTestState::Absent,
            hit_test_requested: false,
            viewer_space: None,
            render_space,
            placed: false,
        };
        log::info!("AR session {} started", context.id);
        context
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// True if `session` names this context and it has not ended
    pub fn is_current(&self, session: SessionId) -> bool {
        self.active && self.id == session
    }

    pub fn hit_test_state(&self) -> HitTestState {
        self.hit_test
    }

    pub fn hit_test_requested(&self) -> bool {
        self.hit_test_requested
    }

    pub fn viewer_space(&self) -> Option<ReferenceSpace> {
        self.viewer_space
    }

    /// Space hit-test poses are resolved against: the renderer's space, or the
    /// viewer space if the renderer has none.
    pub fn result_space(&self) -> Option<ReferenceSpace> {
        self.render_space.or(self.viewer_space)
    }

    pub fn has_placed(&self) -> bool {
        self.placed
    }

    /// Sets the placement latch. Returns false if it was already set or the
    /// session has ended.
    pub fn try_latch_placement(&mut self) -> bool {
        if !self.active || self.placed {
            return false;
        }
        self.placed = true;
        true
    }

    /// Starts hit-test acquisition unless it was already started this session.
    ///
    /// The request flag is set before the platform is called so replies that
    /// take several frames to arrive cannot trigger a second request.
    pub(crate) fn request_hit_test_source<P: XrPlatform>(
        &mut self,
        platform: &mut P,
        replies: &Sender<Reply>,
    ) {
        if !self.active || self.hit_test_requested {
            return;
        }
        self.hit_test_requested = true;
        self.hit_test = HitTestState::Pending;

        log::debug!("Session {}: requesting viewer reference space", self.id);
        platform.request_reference_space(
            ReferenceSpaceKind::Viewer,
            Responder::new(self.id, replies.clone(), ReplyPayload::ReferenceSpace),
        );
    }

    /// Second step of acquisition: the viewer space arrived (or was refused).
    pub(crate) fn accept_reference_space<P: XrPlatform>(
        &mut self,
        platform: &mut P,
        replies: &Sender<Reply>,
        result: Result<ReferenceSpace>,
    ) -> Option<ArEvent> {
        match result {
            Ok(space) => {
                log::debug!(
                    "Session {}: viewer space {} ready, requesting hit-test source",
                    self.id,
                    space.id
                );
                self.viewer_space = Some(space);
                platform.request_hit_test_source(
                    space,
                    Responder::new(self.id, replies.clone(), ReplyPayload::HitTestSource),
                );
                None
            }
            Err(error) => Some(self.degrade(error)),
        }
    }

    /// Final step of acquisition.
    pub(crate) fn accept_hit_test_source(
        &mut self,
        result: Result<HitTestSourceHandle>,
    ) -> ArEvent {
        match result {
            Ok(source) => {
                log::info!("Session {}: {} ready", self.id, source);
                self.hit_test = HitTestState::Ready(source);
                ArEvent::HitTestSourceReady {
                    session: self.id,
                    source,
                }
            }
            Err(error) => self.degrade(error),
        }
    }

    /// Ends the session. Safe to call repeatedly.
    ///
    /// Releases the hit-test source, clears the placement latch and marks the
    /// context inactive so replies still in flight are discarded. Returns false
    /// if the session had already ended.
    pub fn end<P: XrPlatform>(&mut self, platform: &mut P) -> bool {
        if let HitTestState::Ready(source) = self.hit_test {
            platform.cancel_hit_test_source(source);
        }
        self.hit_test = HitTestState::Absent;
        self.placed = false;

        let was_active = self.active;
        self.active = false;
        if was_active {
            log::info!("AR session {} ended", self.id);
        }
        was_active
    }

    fn degrade(&mut self, error: ArPlaceError) -> ArEvent {
        // the request flag stays set: no retries within this session
        log::warn!(
            "Session {}: hit-testing unavailable, reticle disabled: {}",
            self.id,
            error
        );
        self.hit_test = HitTestState::Absent;
        ArEvent::HitTestUnavailable {
            session: self.id,
            reason: error.to_string(),
        }
    }
}
