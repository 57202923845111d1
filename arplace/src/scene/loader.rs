use crate::error::ArPlaceError;
use crate::platform::Responder;
use crate::scene::LoadedModel;
use std::collections::HashMap;

/// Trait for loading model assets by path.
///
/// Loading is asynchronous: the loader answers through `reply` whenever the
/// asset is ready, or rejects it with [`ArPlaceError::AssetLoad`].
///
/// # Example
///
/// ```ignore
/// use arplace::platform::Responder;
/// use arplace::scene::{AssetLoader, LoadedModel};
///
/// struct GltfLoader { /* ... */ }
///
/// impl AssetLoader for GltfLoader {
///     fn load(&mut self, path: &str, reply: Responder<LoadedModel>) {
///         // hand `reply` to your fetch/decode pipeline
///         todo!()
///     }
/// }
/// ```
pub trait AssetLoader {
    fn load(&mut self, path: &str, reply: Responder<LoadedModel>);
}

/// In-memory loader backed by a fixed set of known models.
///
/// Unknown paths are rejected. With `set_deferred(true)` every request is held
/// until [`resolve_pending`](Self::resolve_pending).
#[derive(Debug, Default)]
pub struct ModelCatalog {
    models: HashMap<String, LoadedModel>,
    deferred: bool,
    pending: Vec<(String, Responder<LoadedModel>)>,
    requests: usize,
}

impl ModelCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, path: &str, name: &str, bounding_radius: f32) -> Self {
        self.insert(LoadedModel::new(path, name, bounding_radius));
        self
    }

    pub fn insert(&mut self, model: LoadedModel) {
        self.models.insert(model.path.clone(), model);
    }

    pub fn remove(&mut self, path: &str) -> Option<LoadedModel> {
        self.models.remove(path)
    }

    pub fn set_deferred(&mut self, deferred: bool) {
        self.deferred = deferred;
    }

    /// Number of load requests received so far
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Answers every held request. Returns how many were answered.
    pub fn resolve_pending(&mut self) -> usize {
        let pending = std::mem::take(&mut self.pending);
        let answered = pending.len();
        for (path, reply) in pending {
            self.answer(&path, reply);
        }
        answered
    }

    fn answer(&self, path: &str, reply: Responder<LoadedModel>) {
        match self.models.get(path) {
            Some(model) => reply.resolve(model.clone()),
            None => reply.reject(ArPlaceError::AssetLoad {
                path: path.to_string(),
                reason: "not found in catalog".into(),
            }),
        }
    }
}

impl AssetLoader for ModelCatalog {
    fn load(&mut self, path: &str, reply: Responder<LoadedModel>) {
        self.requests += 1;
        if self.deferred {
            self.pending.push((path.to_string(), reply));
        } else {
            self.answer(path, reply);
        }
    }
}
