//! Event types for arplace

use crate::placement::PlaceableKind;
use crate::platform::{HitTestSourceHandle, InputSourceId};
use crate::scene::NodeId;
use crate::session::SessionId;

#[derive(Debug, Clone, PartialEq)]
pub enum ArEvent {
    SessionStarted {
        session: SessionId,
    },
    SessionEnded {
        session: SessionId,
    },
    HitTestSourceReady {
        session: SessionId,
        source: HitTestSourceHandle,
    },
    HitTestUnavailable {
        session: SessionId,
        reason: String,
    },
    ReticleShown,
    ReticleHidden,
    ObjectPlaced {
        node: NodeId,
        kind: PlaceableKind,
    },
    AssetLoadFailed {
        path: String,
        reason: String,
    },
    ObjectGrabbed {
        controller: InputSourceId,
        node: NodeId,
    },
    ObjectReleased {
        controller: InputSourceId,
        node: NodeId,
    },
    StaleReplyDiscarded {
        what: &'static str,
    },
}

impl ArEvent {
    pub fn controller(&self) -> Option<InputSourceId> {
        match self {
            Self::ObjectGrabbed { controller, .. } | Self::ObjectReleased { controller, .. } => {
                Some(*controller)
            }
            _ => None,
        }
    }

    pub fn node(&self) -> Option<NodeId> {
        match self {
            Self::ObjectPlaced { node, .. }
            | Self::ObjectGrabbed { node, .. }
            | Self::ObjectReleased { node, .. } => Some(*node),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::HitTestUnavailable { .. } | Self::AssetLoadFailed { .. }
        )
    }
}
