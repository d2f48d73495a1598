//! Low-level I/O drivers for target protocols.
//!
//! Two clients live here: a raw line-oriented TCP client and a cookie-carrying
//! HTTP session client. Both bound every operation with an explicit timeout
//! and report faults as [`BotError::Transport`](crate::error::BotError);
//! neither interprets target semantics, that is the adapters' job.

pub mod http;
pub mod line;

pub use http::{FormSession, StepResponse};
pub use line::LineClient;
