//! Error taxonomy for the injection pipeline.
//!
//! Transport and protocol faults are caught at the adapter boundary and
//! converted into a [`Verdict`](crate::verdict::Verdict); only input errors
//! surface to the API caller as a 4xx response.

use thiserror::Error;

/// Errors produced while driving an injection attempt.
#[derive(Debug, Error)]
pub enum BotError {
    /// Caller supplied a malformed or incomplete request. Raised at the
    /// gateway before any network I/O.
    #[error("invalid request: {reason}")]
    Input {
        /// Explanation returned to the caller.
        reason: String,
    },
    /// The target could not be reached or the connection died mid-flight
    /// (refused, timed out, reset). Maps to the `error` verdict.
    #[error("transport failure: {reason}")]
    Transport {
        /// Description of the underlying I/O fault.
        reason: String,
    },
    /// The target was reachable but answered outside its protocol contract
    /// (wrong banner, rejected login, missing marker). Maps to the `failure`
    /// verdict.
    #[error("protocol rejection: {reason}")]
    Protocol {
        /// Offending response, trimmed for the diagnostic.
        reason: String,
    },
    /// The protocol round-trip completed but the flag did not come back
    /// intact. Maps to the `failure` verdict.
    #[error("verification failed: {reason}")]
    Verification {
        /// What the read-back contained instead.
        reason: String,
    },
}

impl BotError {
    pub fn input<S: Into<String>>(reason: S) -> Self {
        Self::Input {
            reason: reason.into(),
        }
    }

    pub fn transport<S: Into<String>>(reason: S) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    pub fn protocol<S: Into<String>>(reason: S) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }

    pub fn verification<S: Into<String>>(reason: S) -> Self {
        Self::Verification {
            reason: reason.into(),
        }
    }
}
