#![feature(int_roundings)]
// Library exports for the flag bot
//
// Integration tests and embedding binaries drive the gateway through these
// modules.

pub mod adapters;
pub mod config;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod server;
pub mod state;
pub mod transport;
pub mod verdict;

// Re-export the types most callers need
pub use adapters::{InjectionRequest, TargetKind};
pub use config::{AppConfig, EngineConfig};
pub use engine::Engine;
pub use error::BotError;
pub use verdict::{Outcome, Verdict};
