//! The `POST /inject` handler.
//!
//! Validates that every field the selected adapter requires is present before
//! any network I/O happens; a bad payload is rejected with a 400 and provably
//! no connection attempt. Completed attempts always come back as HTTP 200
//! with the verdict in the body; the HTTP status never encodes the verdict.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::adapters::{AdapterSpec, AuthSecret, InjectionRequest, TargetKind};
use crate::error::BotError;
use crate::state::AppState;
use crate::verdict::Verdict;

/// Inbound request payload.
///
/// Everything is optional at the serde level so that missing fields produce
/// the gateway's own input-error response instead of a deserialization
/// rejection; adapter-specific requirements are enforced in
/// [`build_request`].
#[derive(Debug, Deserialize)]
pub struct InjectPayload {
    /// Adapter selection; falls back to the configured default target.
    #[serde(default)]
    pub target: Option<TargetKind>,
    /// Target host. `ip` is accepted as an alias for compatibility with the
    /// older per-challenge bots.
    #[serde(default, alias = "ip")]
    pub host: Option<String>,
    /// Target port; adapters with a well-known port supply a default.
    #[serde(default)]
    pub port: Option<u16>,
    /// Flag to plant.
    #[serde(default)]
    pub flag: Option<String>,
    /// Adapter-specific credential.
    #[serde(default, alias = "authSecret")]
    pub password: Option<AuthSecret>,
}

/// Validate a payload against the selected adapter's spec and assemble the
/// immutable injection request. Fails fast, before any I/O.
pub fn build_request(
    payload: InjectPayload,
    spec: &'static AdapterSpec,
) -> Result<InjectionRequest, BotError> {
    let mut missing = Vec::new();

    let host = match payload.host.as_deref() {
        Some(host) if !host.trim().is_empty() => host.trim().to_string(),
        _ => {
            missing.push("ip");
            String::new()
        }
    };
    let flag = match payload.flag {
        Some(ref flag) if !flag.is_empty() => flag.clone(),
        _ => {
            missing.push("flag");
            String::new()
        }
    };
    let port = match payload.port.or(spec.default_port) {
        Some(port) => port,
        None => {
            missing.push("port");
            0
        }
    };
    let auth_secret = payload.password;
    if spec.requires_secret && auth_secret.is_none() {
        missing.push("password");
    }

    if !missing.is_empty() {
        return Err(BotError::input(format!(
            "missing required parameters for target '{}': {}",
            spec.name,
            missing.join(", ")
        )));
    }

    Ok(InjectionRequest {
        host,
        port,
        flag,
        auth_secret,
    })
}

/// `POST /inject`
pub async fn inject(
    State(state): State<AppState>,
    Json(payload): Json<InjectPayload>,
) -> (StatusCode, Json<Verdict>) {
    let kind = payload.target.unwrap_or_else(|| state.default_target());
    let spec = state.engine().registry().spec(kind);

    let req = match build_request(payload, spec) {
        Ok(req) => req,
        Err(err) => {
            tracing::debug!(target_kind = %kind, error = %err, "rejecting malformed inject request");
            return (
                StatusCode::BAD_REQUEST,
                Json(Verdict::error(err.to_string())),
            );
        }
    };

    let verdict = state.engine().run(kind, req).await;
    (StatusCode::OK, Json(verdict))
}
