use crate::config::ArInteractionDesc;
use crate::error::{ArPlaceError, Result};
use crate::events::ArEvent;
use crate::math::Transform;
use crate::placement::{PlacedObject, PlacementSlot, PlacementTrigger};
use crate::platform::reply::{Reply, ReplyPayload};
use crate::platform::{InputSourceId, Responder, XrPlatform};
use crate::reticle::Reticle;
use crate::scene::{AssetLoader, LoadedModel, NodeId, SceneGraph};
use crate::selection::{Controller, SelectableSet};
use crate::session::{HitTestState, SessionContext};
use crossbeam_channel::{Receiver, Sender};
use rand::RngCore;
use std::collections::BTreeMap;

/// AR interaction controller.
///
/// `ArInteraction` owns the platform, scene-graph and asset-loader
/// collaborators and routes everything the host forwards to it:
///
/// - **Session lifecycle**: [`on_session_start`](Self::on_session_start),
///   [`on_session_end`](Self::on_session_end)
/// - **Frames**: [`on_frame`](Self::on_frame), once per display refresh
/// - **Input**: [`on_select`](Self::on_select),
///   [`on_select_start`](Self::on_select_start),
///   [`on_select_end`](Self::on_select_end)
///
/// None of these return errors or panic. Failures are logged and reported as
/// [`ArEvent`]s through [`poll_events`](Self::poll_events), so a misbehaving
/// collaborator can never stop the frame loop.
///
/// # Threading
///
/// Everything runs on the thread that drives the frame loop. Collaborators may
/// complete their [`Responder`]s from anywhere; replies are queued and applied
/// at the start of the next frame or at the end of the current handler.
pub struct ArInteraction<P: XrPlatform, S: SceneGraph, L: AssetLoader> {
    desc: ArInteractionDesc,
    platform: P,
    scene: S,
    loader: L,
    session: Option<SessionContext>,
    reticle: Reticle,
    anchor: NodeId,
    placement: PlacementTrigger,
    placed: Vec<PlacedObject>,
    selectables: SelectableSet,
    controllers: BTreeMap<InputSourceId, Controller>,
    reply_sender: Sender<Reply>,
    reply_receiver: Receiver<Reply>,
    event_sender: Sender<ArEvent>,
    event_receiver: Receiver<ArEvent>,
}

impl<P: XrPlatform, S: SceneGraph, L: AssetLoader> ArInteraction<P, S, L> {
    /// Creates the controller and its persistent scene nodes (placement
    /// anchor and hidden reticle) under the scene root.
    pub fn new(desc: ArInteractionDesc, platform: P, mut scene: S, loader: L) -> Result<Self> {
        desc.validate()?;

        let root = scene.root();
        let anchor = scene.create_node("placement-anchor");
        scene.add_child(root, anchor)?;

        let reticle_node = scene.create_node("reticle");
        scene.add_child(root, reticle_node)?;
        scene.set_visible(reticle_node, false)?;

        let (reply_sender, reply_receiver) = crossbeam_channel::unbounded();
        let (event_sender, event_receiver) = crossbeam_channel::unbounded();

        Ok(Self {
            placement: PlacementTrigger::new(&desc),
            desc,
            platform,
            scene,
            loader,
            session: None,
            reticle: Reticle::new(reticle_node),
            anchor,
            placed: Vec::new(),
            selectables: SelectableSet::new(),
            controllers: BTreeMap::new(),
            reply_sender,
            reply_receiver,
            event_sender,
            event_receiver,
        })
    }

    /// Replaces the scatter RNG.
    pub fn with_rng<R>(mut self, rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        self.placement.set_rng(rng);
        self
    }

    pub fn desc(&self) -> &ArInteractionDesc {
        &self.desc
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn loader_mut(&mut self) -> &mut L {
        &mut self.loader
    }

    /// Current or most recent session
    pub fn session(&self) -> Option<&SessionContext> {
        self.session.as_ref()
    }

    pub fn is_session_active(&self) -> bool {
        self.session.as_ref().is_some_and(SessionContext::is_active)
    }

    pub fn reticle(&self) -> &Reticle {
        &self.reticle
    }

    pub fn anchor(&self) -> NodeId {
        self.anchor
    }

    pub fn placed_objects(&self) -> &[PlacedObject] {
        &self.placed
    }

    pub fn selectables(&self) -> &SelectableSet {
        &self.selectables
    }

    pub fn controller(&self, id: InputSourceId) -> Option<&Controller> {
        self.controllers.get(&id)
    }

    /// Drains every event emitted since the last call.
    pub fn poll_events(&self) -> Vec<ArEvent> {
        self.event_receiver.try_iter().collect()
    }

    // ---- session lifecycle ----

    /// Starts a session and kicks off hit-test acquisition.
    ///
    /// A start while a session is already active is ignored.
    pub fn on_session_start(&mut self) {
        if let Some(current) = self.session.as_ref().filter(|s| s.is_active()) {
            log::warn!(
                "Session start ignored: session {} is still active",
                current.id()
            );
            return;
        }

        let mut session = SessionContext::begin(self.platform.render_reference_space());
        self.emit(ArEvent::SessionStarted {
            session: session.id(),
        });
        session.request_hit_test_source(&mut self.platform, &self.reply_sender);
        self.session = Some(session);

        self.pump_replies();
    }

    /// Ends the active session. Calling it again, or without a session, does
    /// nothing.
    ///
    /// Held objects go back to the anchor first; placed content is then
    /// removed if `clear_placed_on_session_end` is set.
    pub fn on_session_end(&mut self) {
        if !self.is_session_active() {
            log::debug!("Session end ignored: no active session");
            return;
        }

        self.release_all();
        if self.desc.clear_placed_on_session_end {
            self.clear_placed();
        }
        if let Some(event) = self.reticle.hide() {
            self.emit(event);
        }
        self.sync_reticle_node();

        if let Some(session) = self.session.as_mut() {
            if session.end(&mut self.platform) {
                let id = session.id();
                self.emit(ArEvent::SessionEnded { session: id });
            }
        }
    }

    // ---- frame pump ----

    /// Per-frame update. `frame` is `None` outside an AR session.
    pub fn on_frame(&mut self, frame: Option<&P::Frame>) {
        self.pump_replies();

        let Some(frame) = frame else {
            return;
        };
        let Some(session) = self.session.as_mut().filter(|s| s.is_active()) else {
            return;
        };

        session.request_hit_test_source(&mut self.platform, &self.reply_sender);

        let (HitTestState::Ready(source), Some(space)) =
            (session.hit_test_state(), session.result_space())
        else {
            return;
        };

        if let Some(event) = self.reticle.update(&self.platform, frame, source, &space) {
            self.emit(event);
        }
        self.sync_reticle_node();

        // requests issued during this frame may already be answered
        self.pump_replies();
    }

    /// Applies every queued collaborator reply.
    pub fn pump_replies(&mut self) {
        while let Ok(reply) = self.reply_receiver.try_recv() {
            self.handle_reply(reply);
        }
    }

    // ---- controllers ----

    /// Creates a scene node for `id` under the scene root.
    pub fn register_controller(&mut self, id: InputSourceId) -> Result<NodeId> {
        if let Some(existing) = self.controllers.get(&id) {
            return Ok(existing.node());
        }
        let root = self.scene.root();
        let node = self.scene.create_node(&format!("controller-{}", id.0));
        self.scene.add_child(root, node)?;
        self.controllers.insert(id, Controller::new(id, node));
        log::debug!("Registered {} as {}", id, node);
        Ok(node)
    }

    /// Removes `id`, first handing anything it holds back to the anchor.
    pub fn unregister_controller(&mut self, id: InputSourceId) -> Result<()> {
        self.release(id);
        let controller = self
            .controllers
            .remove(&id)
            .ok_or(ArPlaceError::UnknownController(id))?;
        self.scene.destroy(controller.node())
    }

    /// Tracking update: sets the controller's pose in scene-root space.
    pub fn update_controller_pose(&mut self, id: InputSourceId, pose: Transform) -> Result<()> {
        let controller = self
            .controllers
            .get(&id)
            .ok_or(ArPlaceError::UnknownController(id))?;
        self.scene.set_local_transform(controller.node(), pose)
    }

    // ---- input ----

    /// Primary select action: place content at the reticle, once per session.
    pub fn on_select(&mut self, id: InputSourceId) {
        log::debug!("{}: select", id);
        if !self.reticle.visible() {
            return;
        }
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !session.try_latch_placement() {
            log::trace!("Placement already done this session");
            return;
        }

        let session_id = session.id();
        let slots = self.placement.plan(self.reticle.transform());
        log::info!(
            "Placing {} objects at {:?}",
            slots.len(),
            self.reticle.transform().translation
        );
        for slot in slots {
            let path = slot.path.clone();
            let reply = Responder::new(
                session_id,
                self.reply_sender.clone(),
                move |result: Result<LoadedModel>| ReplyPayload::Model { slot, result },
            );
            self.loader.load(&path, reply);
        }

        self.pump_replies();
    }

    /// Grab the nearest pickable under the controller ray.
    pub fn on_select_start(&mut self, id: InputSourceId) {
        if !self.is_session_active() {
            return;
        }
        let held: Vec<NodeId> = self
            .controllers
            .values()
            .filter_map(Controller::held_object)
            .collect();
        let candidates = self.selectables.available(&held);

        let Some(controller) = self.controllers.get_mut(&id) else {
            log::warn!("select-start from unregistered {}", id);
            return;
        };
        match controller.select_start(&mut self.scene, &candidates, self.desc.select_ray_length) {
            Ok(Some(node)) => self.emit(ArEvent::ObjectGrabbed {
                controller: id,
                node,
            }),
            Ok(None) => {}
            Err(error) => log::warn!("{}: select-start failed: {}", id, error),
        }
    }

    /// Drop whatever the controller holds back under the anchor.
    pub fn on_select_end(&mut self, id: InputSourceId) {
        if !self.controllers.contains_key(&id) {
            log::warn!("select-end from unregistered {}", id);
            return;
        }
        self.release(id);
    }

    // ---- internals ----

    fn emit(&self, event: ArEvent) {
        if self.event_sender.send(event).is_err() {
            log::warn!("Event queue closed");
        }
    }

    fn release(&mut self, id: InputSourceId) {
        let Some(controller) = self.controllers.get_mut(&id) else {
            return;
        };
        match controller.select_end(&mut self.scene, self.anchor) {
            Ok(Some(node)) => self.emit(ArEvent::ObjectReleased {
                controller: id,
                node,
            }),
            Ok(None) => {}
            Err(error) => {
                // the node is gone; forget it so the controller is usable again
                log::warn!("{}: release failed: {}", id, error);
                controller.drop_held();
            }
        }
    }

    fn release_all(&mut self) {
        let ids: Vec<InputSourceId> = self.controllers.keys().copied().collect();
        for id in ids {
            self.release(id);
        }
    }

    fn clear_placed(&mut self) {
        for object in std::mem::take(&mut self.placed) {
            if let Err(error) = self.scene.destroy(object.node) {
                log::warn!("Failed to remove placed {}: {}", object.node, error);
            }
        }
        self.selectables.clear();
    }

    fn sync_reticle_node(&mut self) {
        let node = self.reticle.node();
        let visible = self.reticle.visible();
        let result = if visible {
            self.scene
                .set_local_transform(node, self.reticle.transform())
                .and_then(|()| self.scene.set_visible(node, true))
        } else {
            self.scene.set_visible(node, false)
        };
        if let Err(error) = result {
            log::warn!("Failed to update reticle node: {}", error);
        }
    }

    fn handle_reply(&mut self, reply: Reply) {
        let Some(session) = self
            .session
            .as_mut()
            .filter(|s| s.is_current(reply.session))
        else {
            self.discard_stale(reply);
            return;
        };

        match reply.payload {
            ReplyPayload::ReferenceSpace(result) => {
                if let Some(event) =
                    session.accept_reference_space(&mut self.platform, &self.reply_sender, result)
                {
                    self.emit(event);
                }
            }
            ReplyPayload::HitTestSource(result) => {
                let event = session.accept_hit_test_source(result);
                self.emit(event);
            }
            ReplyPayload::Model { slot, result } => self.finish_placement(slot, result),
        }
    }

    fn discard_stale(&mut self, reply: Reply) {
        let what = reply.payload.describe();
        log::warn!(
            "Discarding {} reply for ended session {}",
            what,
            reply.session
        );
        if let ReplyPayload::HitTestSource(Ok(source)) = reply.payload {
            self.platform.cancel_hit_test_source(source);
        }
        self.emit(ArEvent::StaleReplyDiscarded { what });
    }

    fn finish_placement(&mut self, slot: PlacementSlot, result: Result<LoadedModel>) {
        match self.spawn(&slot, result) {
            Ok(node) => {
                if slot.kind.is_pickable() {
                    self.selectables.register(node);
                }
                self.placed.push(PlacedObject {
                    node,
                    kind: slot.kind,
                });
                log::info!("Placed {:?} '{}' as {}", slot.kind, slot.path, node);
                self.emit(ArEvent::ObjectPlaced {
                    node,
                    kind: slot.kind,
                });
            }
            Err(error) => {
                log::warn!("Skipping {:?} '{}': {}", slot.kind, slot.path, error);
                let reason = match error {
                    ArPlaceError::AssetLoad { reason, .. } => reason,
                    other => other.to_string(),
                };
                self.emit(ArEvent::AssetLoadFailed {
                    path: slot.path,
                    reason,
                });
            }
        }
    }

    fn spawn(&mut self, slot: &PlacementSlot, model: Result<LoadedModel>) -> Result<NodeId> {
        let node = self.scene.instantiate(&model?)?;
        let placed = self
            .scene
            .set_local_transform(node, slot.transform)
            .and_then(|()| self.scene.add_child(self.anchor, node));
        if let Err(error) = placed {
            if let Err(cleanup) = self.scene.destroy(node) {
                log::warn!("Failed to free unplaced {}: {}", node, cleanup);
            }
            return Err(error);
        }
        Ok(node)
    }
}

impl<P: XrPlatform, S: SceneGraph, L: AssetLoader> Drop for ArInteraction<P, S, L> {
    fn drop(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.end(&mut self.platform);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Quat, Vec3};
    use crate::placement::PlaceableKind;
    use crate::platform::{ReplyMode, ScriptedFrame, ScriptedPlatform};
    use crate::scene::{ModelCatalog, NodeTree};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    type TestInteraction = ArInteraction<ScriptedPlatform, NodeTree, ModelCatalog>;

    const HAND: InputSourceId = InputSourceId(0);

    fn catalog() -> ModelCatalog {
        ModelCatalog::new()
            .with_model("assets/environment.glb", "environment", 0.8)
            .with_model("assets/pickable.glb", "pickable", 0.08)
    }

    fn surface() -> Transform {
        Transform::new(Vec3::new(0.2, -1.0, -1.5), Quat::from_rotation_y(0.5))
    }

    fn interaction_with(platform: ScriptedPlatform) -> TestInteraction {
        let _ = env_logger::builder().is_test(true).try_init();
        let desc = ArInteractionDesc::new().rng_seed(3);
        let mut interaction = ArInteraction::new(desc, platform, NodeTree::new(), catalog()).unwrap();
        interaction.register_controller(HAND).unwrap();
        interaction
    }

    fn started() -> TestInteraction {
        let mut interaction = interaction_with(ScriptedPlatform::new());
        interaction.on_session_start();
        interaction
    }

    /// Session with content placed via one surface hit and one select.
    fn placed() -> TestInteraction {
        let mut interaction = started();
        interaction.on_frame(Some(&ScriptedFrame::with_hit(surface())));
        interaction.on_select(HAND);
        interaction
    }

    fn count(interaction: &TestInteraction, pickable: bool) -> usize {
        interaction
            .placed_objects()
            .iter()
            .filter(|o| o.kind.is_pickable() == pickable)
            .filter(|o| interaction.scene().parent(o.node) == Some(interaction.anchor()))
            .count()
    }

    fn aim_controller_at(interaction: &mut TestInteraction, node: NodeId) {
        let target = interaction.scene().world_transform(node).unwrap().translation;
        let origin = Vec3::new(0.0, 1.0, 0.0);
        let rotation = Quat::from_rotation_arc(-Vec3::Z, (target - origin).normalize());
        interaction
            .update_controller_pose(HAND, Transform::new(origin, rotation))
            .unwrap();
    }

    #[test]
    fn test_session_start_acquires_hit_test_source() {
        let interaction = started();
        let session = interaction.session().unwrap();
        assert!(matches!(session.hit_test_state(), HitTestState::Ready(_)));
        let events = interaction.poll_events();
        assert!(matches!(events[0], ArEvent::SessionStarted { .. }));
        assert!(matches!(events[1], ArEvent::HitTestSourceReady { .. }));
    }

    #[test]
    fn test_no_results_keep_reticle_hidden() {
        let mut interaction = started();
        for _ in 0..10 {
            interaction.on_frame(Some(&ScriptedFrame::empty()));
            assert!(!interaction.reticle().visible());
            let node = interaction.reticle().node();
            assert_eq!(interaction.scene().is_visible(node), Some(false));
        }
    }

    #[test]
    fn test_result_shows_reticle_at_first_pose() {
        let mut interaction = started();
        interaction.on_frame(Some(&ScriptedFrame::with_hit(surface())));

        let reticle = interaction.reticle();
        assert!(reticle.visible());
        assert_eq!(reticle.pose(), surface().to_matrix());
        let node_transform = interaction.scene().local_transform(reticle.node()).unwrap();
        assert!(node_transform.abs_diff_eq(&surface(), 1e-5));
        assert_eq!(interaction.scene().is_visible(reticle.node()), Some(true));
    }

    #[test]
    fn test_missing_frame_leaves_reticle_alone() {
        let mut interaction = started();
        interaction.on_frame(Some(&ScriptedFrame::with_hit(surface())));
        interaction.on_frame(None);
        assert!(interaction.reticle().visible());
    }

    #[test]
    fn test_select_places_environment_and_pickables_once() {
        let mut interaction = placed();
        assert_eq!(count(&interaction, false), 1);
        assert_eq!(count(&interaction, true), 3);
        assert_eq!(interaction.selectables().len(), 3);

        let environment = interaction.placed_objects()[0];
        assert_eq!(environment.kind, PlaceableKind::Environment);
        let local = interaction.scene().local_transform(environment.node).unwrap();
        assert!(local.abs_diff_eq(&surface(), 1e-5));

        interaction.on_select(HAND);
        assert_eq!(interaction.placed_objects().len(), 4);
        assert_eq!(interaction.loader().requests(), 4);
    }

    #[test]
    fn test_select_without_reticle_places_nothing() {
        let mut interaction = started();
        interaction.on_frame(Some(&ScriptedFrame::empty()));
        interaction.on_select(HAND);
        assert!(interaction.placed_objects().is_empty());
        assert!(!interaction.session().unwrap().has_placed());
    }

    #[test]
    fn test_failed_asset_is_skipped() {
        let mut interaction = started();
        interaction.loader_mut().remove("assets/environment.glb");
        interaction.on_frame(Some(&ScriptedFrame::with_hit(surface())));
        interaction.on_select(HAND);

        assert_eq!(count(&interaction, false), 0);
        assert_eq!(count(&interaction, true), 3);
        let failures: Vec<ArEvent> = interaction
            .poll_events()
            .into_iter()
            .filter(ArEvent::is_error)
            .collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(
            &failures[0],
            ArEvent::AssetLoadFailed { path, .. } if path == "assets/environment.glb"
        ));
    }

    #[test]
    fn test_second_select_while_loads_pending_does_not_double_place() {
        let mut interaction = started();
        interaction.loader_mut().set_deferred(true);
        interaction.on_frame(Some(&ScriptedFrame::with_hit(surface())));
        interaction.on_select(HAND);
        interaction.on_select(HAND);
        assert_eq!(interaction.loader().requests(), 4);

        interaction.loader_mut().resolve_pending();
        interaction.on_frame(Some(&ScriptedFrame::with_hit(surface())));
        assert_eq!(interaction.placed_objects().len(), 4);
    }

    /// Moves the pickables into a row along X, 0.3 m apart, so a vertical ray
    /// can only ever touch one of them.
    fn line_up_pickables(interaction: &mut TestInteraction) -> Vec<NodeId> {
        let pickables = interaction.selectables().as_slice().to_vec();
        for (i, node) in pickables.iter().enumerate() {
            let x = (i as f32 - 1.0) * 0.3;
            interaction
                .scene_mut()
                .set_local_transform(*node, Transform::from_translation(Vec3::new(x, 0.25, 0.0)))
                .unwrap();
        }
        pickables
    }

    fn aim_from_above(interaction: &mut TestInteraction, node: NodeId) {
        let target = interaction.scene().world_transform(node).unwrap().translation;
        let rotation = Quat::from_rotation_arc(-Vec3::Z, -Vec3::Y);
        interaction
            .update_controller_pose(HAND, Transform::new(target + Vec3::Y, rotation))
            .unwrap();
    }

    #[test]
    fn test_model_resolved_after_session_end_is_discarded() {
        let mut interaction = started();
        interaction.loader_mut().set_deferred(true);
        interaction.on_frame(Some(&ScriptedFrame::with_hit(surface())));
        interaction.on_select(HAND);
        interaction.on_session_end();
        let nodes = interaction.scene().len();
        interaction.poll_events();

        assert_eq!(interaction.loader_mut().resolve_pending(), 4);
        interaction.on_frame(None);

        assert!(interaction.placed_objects().is_empty());
        assert!(interaction.selectables().is_empty());
        assert!(interaction.scene().children(interaction.anchor()).is_empty());
        assert_eq!(interaction.scene().len(), nodes);
        let events = interaction.poll_events();
        assert_eq!(events.len(), 4);
        assert!(
            events
                .iter()
                .all(|e| *e == ArEvent::StaleReplyDiscarded { what: "model" })
        );
    }

    #[test]
    fn test_late_model_does_not_land_in_next_session() {
        let mut interaction = started();
        interaction.loader_mut().set_deferred(true);
        interaction.on_frame(Some(&ScriptedFrame::with_hit(surface())));
        interaction.on_select(HAND);
        interaction.on_session_end();
        interaction.on_session_start();

        interaction.loader_mut().resolve_pending();
        interaction.on_frame(Some(&ScriptedFrame::empty()));
        assert!(interaction.placed_objects().is_empty());
        assert!(interaction.scene().children(interaction.anchor()).is_empty());
        assert!(!interaction.session().unwrap().has_placed());

        // the new session still gets its own placement
        interaction.loader_mut().set_deferred(false);
        interaction.on_frame(Some(&ScriptedFrame::with_hit(surface())));
        interaction.on_select(HAND);
        assert_eq!(interaction.placed_objects().len(), 4);
        assert_eq!(interaction.scene().children(interaction.anchor()).len(), 4);
    }

    #[test]
    fn test_injected_rng_reproduces_layout() {
        let layout = |seed: u64| {
            let desc = ArInteractionDesc::new();
            let mut interaction =
                ArInteraction::new(desc, ScriptedPlatform::new(), NodeTree::new(), catalog())
                    .unwrap()
                    .with_rng(StdRng::seed_from_u64(seed));
            interaction.on_session_start();
            interaction.on_frame(Some(&ScriptedFrame::with_hit(surface())));
            interaction.on_select(HAND);
            let transforms: Vec<Transform> = interaction
                .placed_objects()
                .iter()
                .map(|o| interaction.scene().local_transform(o.node).unwrap())
                .collect();
            transforms
        };

        let first = layout(11);
        assert_eq!(first.len(), 4);
        assert_eq!(first, layout(11));
    }

    #[test]
    fn test_session_end_frees_placed_nodes() {
        let mut interaction = started();
        let nodes = interaction.scene().len();
        interaction.on_frame(Some(&ScriptedFrame::with_hit(surface())));
        interaction.on_select(HAND);
        assert_eq!(interaction.scene().len(), nodes + 4);

        interaction.on_session_end();
        assert_eq!(interaction.scene().len(), nodes);
    }

    #[test]
    fn test_unregister_frees_controller_node() {
        let mut interaction = started();
        let node = interaction.controller(HAND).unwrap().node();
        interaction.unregister_controller(HAND).unwrap();
        assert_eq!(interaction.scene().parent(node), None);
        assert_eq!(interaction.scene().world_transform(node), None);
    }

    #[test]
    fn test_grab_aimed_pickable_only() {
        let mut interaction = placed();
        let pickables = line_up_pickables(&mut interaction);
        aim_from_above(&mut interaction, pickables[1]);
        interaction.poll_events();

        interaction.on_select_start(HAND);

        let controller_node = interaction.controller(HAND).unwrap().node();
        let held = interaction.controller(HAND).unwrap().held_object();
        assert_eq!(held, Some(pickables[1]));
        assert_eq!(interaction.scene().parent(pickables[1]), Some(controller_node));
        assert_eq!(interaction.scene().parent(pickables[0]), Some(interaction.anchor()));
        assert_eq!(interaction.scene().parent(pickables[2]), Some(interaction.anchor()));
        assert_eq!(
            interaction.poll_events(),
            vec![ArEvent::ObjectGrabbed {
                controller: HAND,
                node: pickables[1]
            }]
        );
    }

    #[test]
    fn test_grab_picks_each_aimed_pickable() {
        for index in [0, 2] {
            let mut interaction = placed();
            let pickables = line_up_pickables(&mut interaction);
            aim_from_above(&mut interaction, pickables[index]);
            interaction.on_select_start(HAND);
            assert_eq!(
                interaction.controller(HAND).unwrap().held_object(),
                Some(pickables[index])
            );
        }
    }

    #[test]
    fn test_select_start_into_nothing_stays_idle() {
        let mut interaction = placed();
        interaction
            .update_controller_pose(
                HAND,
                Transform::new(Vec3::new(0.0, 1.0, 0.0), Quat::from_rotation_x(1.5)),
            )
            .unwrap();
        interaction.on_select_start(HAND);
        assert_eq!(interaction.controller(HAND).unwrap().held_object(), None);
    }

    #[test]
    fn test_pick_up_and_release_round_trip() {
        let mut interaction = placed();
        let target = interaction.selectables().as_slice()[0];
        aim_controller_at(&mut interaction, target);
        let before = interaction.scene().world_transform(target).unwrap();

        interaction.on_select_start(HAND);
        interaction.on_select_end(HAND);

        assert_eq!(interaction.controller(HAND).unwrap().held_object(), None);
        assert_eq!(interaction.scene().parent(target), Some(interaction.anchor()));
        let after = interaction.scene().world_transform(target).unwrap();
        assert!(after.abs_diff_eq(&before, 1e-4));
    }

    #[test]
    fn test_stray_select_end_is_noop() {
        let mut interaction = placed();
        interaction.poll_events();
        interaction.on_select_end(HAND);
        interaction.on_select_end(InputSourceId(9));
        assert!(interaction.poll_events().is_empty());
    }

    #[test]
    fn test_second_controller_cannot_steal_held_object() {
        let mut interaction = placed();
        let other = InputSourceId(1);
        interaction.register_controller(other).unwrap();
        let target = interaction.selectables().as_slice()[2];
        aim_controller_at(&mut interaction, target);
        interaction.on_select_start(HAND);
        let held = interaction.controller(HAND).unwrap().held_object().unwrap();

        let pose = interaction
            .scene()
            .world_transform(interaction.controller(HAND).unwrap().node())
            .unwrap();
        interaction.update_controller_pose(other, pose).unwrap();
        interaction.on_select_start(other);

        assert_ne!(interaction.controller(other).unwrap().held_object(), Some(held));
        assert_eq!(interaction.controller(HAND).unwrap().held_object(), Some(held));
    }

    #[test]
    fn test_session_end_during_pending_acquisition_discards_source() {
        let platform = ScriptedPlatform::new().with_hit_test_mode(ReplyMode::Deferred);
        let mut interaction = interaction_with(platform);
        interaction.on_session_start();
        assert_eq!(
            interaction.session().unwrap().hit_test_state(),
            HitTestState::Pending
        );

        interaction.on_session_end();
        interaction.platform_mut().resolve_pending();
        interaction.on_frame(None);

        let session = interaction.session().unwrap();
        assert!(!session.is_active());
        assert_eq!(session.hit_test_state(), HitTestState::Absent);
        assert_eq!(interaction.platform().live_sources(), 0);
        assert_eq!(interaction.platform().cancelled_sources().len(), 1);
        assert!(
            interaction
                .poll_events()
                .contains(&ArEvent::StaleReplyDiscarded {
                    what: "hit-test source"
                })
        );
    }

    #[test]
    fn test_late_reply_does_not_leak_into_next_session() {
        let platform = ScriptedPlatform::new().with_reference_space_mode(ReplyMode::Deferred);
        let mut interaction = interaction_with(platform);
        interaction.on_session_start();
        interaction.on_session_end();
        interaction.on_session_start();

        // answers both the old and the new request
        interaction.platform_mut().resolve_pending();
        interaction.on_frame(Some(&ScriptedFrame::empty()));

        assert_eq!(interaction.platform().hit_test_requests(), 1);
        assert!(matches!(
            interaction.session().unwrap().hit_test_state(),
            HitTestState::Ready(_)
        ));
    }

    #[test]
    fn test_unsupported_hit_test_degrades_silently() {
        let platform = ScriptedPlatform::new().with_hit_test_mode(ReplyMode::Reject);
        let mut interaction = interaction_with(platform);
        interaction.on_session_start();
        for _ in 0..3 {
            interaction.on_frame(Some(&ScriptedFrame::with_hit(surface())));
        }
        interaction.on_select(HAND);

        assert!(!interaction.reticle().visible());
        assert!(interaction.placed_objects().is_empty());
        assert_eq!(interaction.platform().hit_test_requests(), 1);
    }

    #[test]
    fn test_session_end_resets_for_fresh_session() {
        let mut interaction = placed();
        let target = interaction.selectables().as_slice()[0];
        aim_controller_at(&mut interaction, target);
        interaction.on_select_start(HAND);

        interaction.on_session_end();
        interaction.on_session_end();
        assert_eq!(interaction.controller(HAND).unwrap().held_object(), None);
        assert!(interaction.placed_objects().is_empty());
        assert!(interaction.selectables().is_empty());
        assert!(interaction.scene().children(interaction.anchor()).is_empty());
        assert!(!interaction.reticle().visible());

        interaction.on_session_start();
        interaction.on_frame(Some(&ScriptedFrame::with_hit(surface())));
        interaction.on_select(HAND);
        assert_eq!(interaction.placed_objects().len(), 4);
    }

    #[test]
    fn test_duplicate_session_start_is_ignored() {
        let mut interaction = started();
        let id = interaction.session().unwrap().id();
        interaction.on_session_start();
        assert_eq!(interaction.session().unwrap().id(), id);
        assert_eq!(interaction.platform().hit_test_requests(), 1);
    }

    #[test]
    fn test_unregister_returns_held_object_to_anchor() {
        let mut interaction = placed();
        let target = interaction.selectables().as_slice()[1];
        aim_controller_at(&mut interaction, target);
        interaction.on_select_start(HAND);
        let held = interaction.controller(HAND).unwrap().held_object().unwrap();

        interaction.unregister_controller(HAND).unwrap();
        assert_eq!(interaction.scene().parent(held), Some(interaction.anchor()));
        assert!(interaction.controller(HAND).is_none());
        assert!(interaction.unregister_controller(HAND).is_err());
    }
}
