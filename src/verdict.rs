//! Tri-state outcome of an injection attempt.

use serde::{Deserialize, Serialize};

use crate::error::BotError;

/// The three outcome classes the scoring engine distinguishes.
///
/// `Failure` and `Error` stay separate on purpose: a broken-but-reachable
/// target and an unreachable target call for different remediation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// The flag round-tripped intact.
    Success,
    /// The protocol completed but the flag was not recoverable or the target
    /// explicitly rejected the bot.
    Failure,
    /// A transport-level fault prevented the protocol from completing.
    Error,
}

/// Outcome plus an optional human-readable diagnostic.
///
/// Serializes to the wire shape the scoring engine consumes:
/// `{"status": "success" | "failure" | "error", "message"?: "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    /// Outcome class.
    #[serde(rename = "status")]
    pub outcome: Outcome,
    /// Diagnostic for non-success outcomes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Verdict {
    pub fn success() -> Self {
        Self {
            outcome: Outcome::Success,
            message: None,
        }
    }

    pub fn failure<S: Into<String>>(message: S) -> Self {
        Self {
            outcome: Outcome::Failure,
            message: Some(message.into()),
        }
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self {
            outcome: Outcome::Error,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome == Outcome::Success
    }
}

impl From<BotError> for Verdict {
    fn from(err: BotError) -> Self {
        match err {
            // Input errors are rejected at the gateway before the engine
            // runs; mapping them here keeps the conversion total.
            BotError::Input { .. } | BotError::Transport { .. } => Self::error(err.to_string()),
            BotError::Protocol { .. } | BotError::Verification { .. } => {
                Self::failure(err.to_string())
            }
        }
    }
}
