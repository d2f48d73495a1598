//! Shared application state for the API gateway.

use std::sync::Arc;

use crate::adapters::TargetKind;
use crate::engine::Engine;

/// State handed to every request handler.
///
/// Requests are stateless with respect to each other; the only shared pieces
/// are the immutable engine (adapters, limits) and the configured default
/// target.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<Engine>,
    default_target: TargetKind,
}

impl AppState {
    pub fn new(engine: Arc<Engine>, default_target: TargetKind) -> Self {
        Self {
            engine,
            default_target,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn default_target(&self) -> TargetKind {
        self.default_target
    }
}
