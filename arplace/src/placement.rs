//! Tap-to-place.
//!
//! Placement fires once per session: the environment model goes to the
//! reticle pose and a batch of pickable models is scattered around a fixed
//! height. The trigger only plans the batch; the models arrive asynchronously
//! from the [`AssetLoader`](crate::scene::AssetLoader) and are attached under
//! the placement anchor as each one lands.

use crate::config::{ArInteractionDesc, ScatterOrigin};
use crate::math::{Transform, Vec3};
use crate::scene::NodeId;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// Role of a placed object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceableKind {
    /// Static scenery spawned at the reticle pose
    Environment,
    /// Object that controllers can grab; `index` is its position in the batch
    Pickable { index: usize },
}

impl PlaceableKind {
    pub fn is_pickable(&self) -> bool {
        matches!(self, Self::Pickable { .. })
    }
}

/// One object of a planned placement, waiting for its model
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementSlot {
    pub kind: PlaceableKind,
    /// Model path requested from the loader
    pub path: String,
    /// Local transform under the placement anchor
    pub transform: Transform,
}

/// An object that landed in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedObject {
    pub node: NodeId,
    pub kind: PlaceableKind,
}

/// Plans placement batches.
pub struct PlacementTrigger {
    desc: ArInteractionDesc,
    rng: Box<dyn RngCore + Send>,
}

impl PlacementTrigger {
    /// Scatter RNG is seeded from `desc.rng_seed`, or from the OS if unset
    pub fn new(desc: &ArInteractionDesc) -> Self {
        let rng = match desc.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(desc, rng)
    }

    pub fn with_rng<R>(desc: &ArInteractionDesc, rng: R) -> Self
    where
        R: RngCore + Send + 'static,
    {
        Self {
            desc: desc.clone(),
            rng: Box::new(rng),
        }
    }

    pub fn set_rng<R>(&mut self, rng: R)
    where
        R: RngCore + Send + 'static,
    {
        self.rng = Box::new(rng);
    }

    /// Lays out one environment object at `reticle` followed by
    /// `pickable_count` pickables.
    pub fn plan(&mut self, reticle: Transform) -> Vec<PlacementSlot> {
        let mut slots = Vec::with_capacity(self.desc.pickable_count + 1);
        slots.push(PlacementSlot {
            kind: PlaceableKind::Environment,
            path: self.desc.environment_model.clone(),
            transform: reticle,
        });

        let origin = match self.desc.scatter_origin {
            ScatterOrigin::AnchorOrigin => Vec3::ZERO,
            ScatterOrigin::Reticle => reticle.translation,
        };
        for index in 0..self.desc.pickable_count {
            let Some(path) = self.desc.pickable_model(index) else {
                break;
            };
            let path = path.to_string();
            let offset = self.scatter_offset();
            slots.push(PlacementSlot {
                kind: PlaceableKind::Pickable { index },
                path,
                transform: Transform::from_translation(origin + offset),
            });
        }
        slots
    }

    /// Random offset with `x, z` in `[-R, R]` and `y` at the spawn height
    pub fn scatter_offset(&mut self) -> Vec3 {
        let radius = self.desc.scatter_radius;
        let x = self.rng.gen_range(-radius..=radius);
        let z = self.rng.gen_range(-radius..=radius);
        Vec3::new(x, self.desc.spawn_height, z)
    }
}
