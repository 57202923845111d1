use crate::error::{ArPlaceError, Result};
use crate::placement::PlacementSlot;
use crate::platform::{HitTestSourceHandle, ReferenceSpace};
use crate::scene::LoadedModel;
use crate::session::SessionId;
use crossbeam_channel::Sender;

/// Completed asynchronous request, queued for the controller thread
#[derive(Debug)]
pub(crate) struct Reply {
    pub(crate) session: SessionId,
    pub(crate) payload: ReplyPayload,
}

#[derive(Debug)]
pub(crate) enum ReplyPayload {
    ReferenceSpace(Result<ReferenceSpace>),
    HitTestSource(Result<HitTestSourceHandle>),
    Model {
        slot: PlacementSlot,
        result: Result<LoadedModel>,
    },
}

impl ReplyPayload {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            Self::ReferenceSpace(_) => "reference space",
            Self::HitTestSource(_) => "hit-test source",
            Self::Model { .. } => "model",
        }
    }
}

type Wrap<T> = Box<dyn FnOnce(Result<T>) -> ReplyPayload + Send>;

/// One-shot completion handle for an asynchronous collaborator request.
///
/// Collaborators receive a `Responder` with every request and call
/// [`resolve`](Self::resolve) or [`reject`](Self::reject) exactly once, possibly
/// long after the request returned and possibly from another thread. Dropping
/// it without completing leaves the request pending forever.
pub struct Responder<T> {
    session: SessionId,
    sender: Sender<Reply>,
    wrap: Wrap<T>,
}

impl<T> Responder<T> {
    pub(crate) fn new<F>(session: SessionId, sender: Sender<Reply>, wrap: F) -> Self
    where
        F: FnOnce(Result<T>) -> ReplyPayload + Send + 'static,
    {
        Self {
            session,
            sender,
            wrap: Box::new(wrap),
        }
    }

    /// Session the request was issued for
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn resolve(self, value: T) {
        self.complete(Ok(value));
    }

    pub fn reject(self, error: ArPlaceError) {
        self.complete(Err(error));
    }

    pub fn complete(self, result: Result<T>) {
        let payload = (self.wrap)(result);
        let what = payload.describe();
        if self
            .sender
            .send(Reply {
                session: self.session,
                payload,
            })
            .is_err()
        {
            log::warn!(
                "Dropping {} reply for session {}: interaction controller is gone",
                what,
                self.session
            );
        }
    }
}

impl<T> std::fmt::Debug for Responder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Responder")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_queues_tagged_reply() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let session = SessionId::new();
        let responder = Responder::new(session, tx, ReplyPayload::HitTestSource);
        responder.resolve(HitTestSourceHandle(7));

        let reply = rx.try_recv().expect("reply should be queued");
        assert_eq!(reply.session, session);
        assert!(matches!(
            reply.payload,
            ReplyPayload::HitTestSource(Ok(HitTestSourceHandle(7)))
        ));
    }

    #[test]
    fn test_complete_after_receiver_dropped_does_not_panic() {
        let (tx, rx) = crossbeam_channel::unbounded();
        drop(rx);
        let responder = Responder::new(SessionId::new(), tx, ReplyPayload::ReferenceSpace);
        responder.reject(ArPlaceError::Unsupported("viewer space".into()));
    }
}
