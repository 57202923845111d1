use crate::error::{ArPlaceError, Result};

/// Point the pickable scatter offsets are measured from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScatterOrigin {
    /// Local origin of the placement anchor
    #[default]
    AnchorOrigin,
    /// Position of the reticle at the moment placement fired
    Reticle,
}

/// Configuration descriptor for an [`ArInteraction`](crate::ArInteraction)
#[derive(Debug, Clone)]
pub struct ArInteractionDesc {
    /// Model path of the single environment object spawned at the reticle pose
    pub environment_model: String,
    /// Model paths for pickable objects; pickable `i` uses `pickable_models[i % len]`
    pub pickable_models: Vec<String>,
    /// Number of pickable objects spawned per placement
    pub pickable_count: usize,
    /// Half-extent of the square the pickables are scattered over, in meters.
    /// Offsets are drawn from `[-scatter_radius, scatter_radius]` on X and Z.
    pub scatter_radius: f32,
    /// Height of the pickables above the scatter origin, in meters
    pub spawn_height: f32,
    pub scatter_origin: ScatterOrigin,
    /// Selection rays ignore hits farther than this, in meters
    pub select_ray_length: f32,
    /// Seed for the scatter RNG (None seeds from the OS)
    pub rng_seed: Option<u64>,
    /// Remove placed content when the session ends so the next session starts empty
    pub clear_placed_on_session_end: bool,
}

impl Default for ArInteractionDesc {
    fn default() -> Self {
        Self {
            environment_model: "assets/environment.glb".to_string(),
            pickable_models: vec!["assets/pickable.glb".to_string()],
            pickable_count: 3,
            scatter_radius: 0.5,
            spawn_height: 0.25,
            scatter_origin: ScatterOrigin::AnchorOrigin,
            select_ray_length: 10.0,
            rng_seed: None,
            clear_placed_on_session_end: true,
        }
    }
}

impl ArInteractionDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn environment_model(mut self, path: impl Into<String>) -> Self {
        self.environment_model = path.into();
        self
    }

    pub fn pickable_models<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.pickable_models = paths.into_iter().map(Into::into).collect();
        self
    }

    pub fn pickable_count(mut self, count: usize) -> Self {
        self.pickable_count = count;
        self
    }

    pub fn scatter_radius(mut self, radius: f32) -> Self {
        self.scatter_radius = radius;
        self
    }

    pub fn spawn_height(mut self, height: f32) -> Self {
        self.spawn_height = height;
        self
    }

    pub fn scatter_origin(mut self, origin: ScatterOrigin) -> Self {
        self.scatter_origin = origin;
        self
    }

    pub fn select_ray_length(mut self, length: f32) -> Self {
        self.select_ray_length = length;
        self
    }

    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn clear_placed_on_session_end(mut self, clear: bool) -> Self {
        self.clear_placed_on_session_end = clear;
        self
    }

    /// Model path used for the pickable at `index`
    pub fn pickable_model(&self, index: usize) -> Option<&str> {
        if self.pickable_models.is_empty() {
            return None;
        }
        Some(&self.pickable_models[index % self.pickable_models.len()])
    }

    pub fn validate(&self) -> Result<()> {
        if self.pickable_count == 0 {
            return Err(ArPlaceError::Configuration(
                "pickable_count must be at least 1".into(),
            ));
        }
        if self.pickable_models.is_empty() {
            return Err(ArPlaceError::Configuration(
                "pickable_models must not be empty".into(),
            ));
        }
        if self.environment_model.is_empty() {
            return Err(ArPlaceError::Configuration(
                "environment_model must not be empty".into(),
            ));
        }
        for (name, value) in [
            ("scatter_radius", self.scatter_radius),
            ("spawn_height", self.spawn_height),
            ("select_ray_length", self.select_ray_length),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ArPlaceError::Configuration(format!(
                    "{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
