//! Frame pump.
//!
//! Drives one [`ArInteraction`] tick per display refresh and guarantees the
//! reticle is updated before the frame is rendered.

use crate::interaction::ArInteraction;
use crate::platform::XrPlatform;
use crate::scene::{AssetLoader, SceneGraph};

/// Counters kept by the [`FramePump`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Ticks driven so far
    pub ticks: u64,
    /// Ticks that carried an AR frame
    pub xr_ticks: u64,
    /// Ticks rendered with the reticle showing
    pub reticle_ticks: u64,
}

#[derive(Debug, Default)]
pub struct FramePump {
    stats: FrameStats,
}

impl FramePump {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Runs one tick: interaction update first, then `render` with the
    /// updated scene. `frame` is `None` while no AR session is running.
    pub fn tick<P, S, L, R>(
        &mut self,
        interaction: &mut ArInteraction<P, S, L>,
        frame: Option<&P::Frame>,
        render: R,
    ) where
        P: XrPlatform,
        S: SceneGraph,
        L: AssetLoader,
        R: FnOnce(&S),
    {
        self.stats.ticks += 1;
        if frame.is_some() {
            self.stats.xr_ticks += 1;
        }

        interaction.on_frame(frame);

        if interaction.reticle().visible() {
            self.stats.reticle_ticks += 1;
        }
        log::trace!("Frame {}: rendering", self.stats.ticks);
        render(interaction.scene());
    }
}
