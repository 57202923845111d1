//! # arplace
//!
//! Interaction layer for placing and handling virtual objects in an immersive
//! AR session.
//!
//! The host application forwards session lifecycle, frames and controller input
//! to an [`ArInteraction`]. In return it gets:
//!
//! - a **reticle** that snaps to real surfaces through per-frame hit-testing,
//! - **tap-to-place**: one select spawns an environment model at the reticle
//!   and a batch of pickable models around it, once per session,
//! - **grab and release**: select-start picks the pickable under the
//!   controller ray and parents it to the controller, select-end puts it back.
//!
//! ## Quick Start
//!
//! ```no_run
//! use arplace::*;
//! use arplace::platform::{ScriptedFrame, ScriptedPlatform};
//! use arplace::scene::{ModelCatalog, NodeTree};
//!
//! let catalog = ModelCatalog::new()
//!     .with_model("assets/environment.glb", "environment", 0.8)
//!     .with_model("assets/pickable.glb", "pickable", 0.08);
//!
//! let mut interaction = ArInteraction::new(
//!     ArInteractionDesc::default(),
//!     ScriptedPlatform::new(),
//!     NodeTree::new(),
//!     catalog,
//! )?;
//! let hand = InputSourceId(0);
//! interaction.register_controller(hand)?;
//!
//! interaction.on_session_start();
//!
//! let mut pump = FramePump::new();
//! let frame = ScriptedFrame::with_hit(Transform::from_translation(Vec3::new(0.0, -1.0, -1.5)));
//! pump.tick(&mut interaction, Some(&frame), |_scene| { /* draw */ });
//!
//! interaction.on_select(hand);
//!
//! for event in interaction.poll_events() {
//!     if let ArEvent::ObjectPlaced { node, kind } = event {
//!         println!("placed {:?} as {}", kind, node);
//!     }
//! }
//! # Ok::<(), ArPlaceError>(())
//! ```
//!
//! ## Key Components
//!
//! - **[`ArInteraction`]**: owns the collaborators and routes lifecycle, frame and input events
//! - **[`FramePump`]**: per-tick driver; reticle update always precedes rendering
//! - **[`XrPlatform`]**: trait over the AR runtime (reference spaces, hit-test sources)
//! - **[`SceneGraph`]** / **[`AssetLoader`]**: traits over the renderer and model loading
//! - **[`SessionContext`]**: per-session state, including the [`HitTestState`] tri-state
//! - **[`ArEvent`]**: what happened, drained with [`ArInteraction::poll_events`]
//!
//! ## Threading
//!
//! Single-threaded and frame driven. Collaborators answer asynchronous requests
//! through a [`Responder`](platform::Responder) from any thread; answers are applied
//! on the frame thread, and answers for a session that has already ended are
//! dropped.

pub mod config;
pub mod error;
pub mod events;
pub mod frame;
pub mod interaction;
pub mod math;
pub mod placement;
pub mod platform;
pub mod reticle;
pub mod scene;
pub mod selection;
pub mod session;

pub use config::{ArInteractionDesc, ScatterOrigin};
pub use error::ArPlaceError;
pub use events::ArEvent;
pub use frame::{FramePump, FrameStats};
pub use interaction::ArInteraction;
pub use math::{Mat4, Quat, Ray, Transform, Vec3};
pub use placement::{PlaceableKind, PlacedObject, PlacementTrigger};
pub use platform::{
    HitTestResult, HitTestSourceHandle, InputSourceId, ReferenceSpace, ReferenceSpaceKind,
    XrPlatform,
};
pub use reticle::Reticle;
pub use scene::{AssetLoader, LoadedModel, NodeId, RayHit, SceneGraph};
pub use selection::{Controller, ControllerState, SelectableSet};
pub use session::{HitTestState, SessionContext, SessionId};
