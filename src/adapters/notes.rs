//! Form-session adapter for the note-storage target.
//!
//! Flow: register a flag-derived throwaway account, store the flag as that
//! account's note, then read the home page back and look for the literal
//! flag. All three steps share one cookie session.

use std::time::Duration;

use async_trait::async_trait;

use super::{Adapter, AdapterSpec, InjectionRequest, ProtocolSession, TransportKind};
use crate::error::BotError;
use crate::transport::FormSession;
use crate::verdict::Verdict;

static SPEC: AdapterSpec = AdapterSpec {
    name: "notes",
    transport: TransportKind::FormSession,
    default_port: None,
    requires_secret: false,
    // The only marker this protocol needs is dynamic: the literal flag value
    // in the read-back body.
    markers: &[],
};

/// Adapter for the note-storage web target.
pub struct NotesAdapter {
    call_timeout: Duration,
}

impl NotesAdapter {
    pub fn new(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }
}

#[async_trait]
impl Adapter for NotesAdapter {
    fn spec(&self) -> &'static AdapterSpec {
        &SPEC
    }

    async fn inject(&self, req: &InjectionRequest) -> Result<ProtocolSession, BotError> {
        let identity = req.identity();
        let session = FormSession::open(&req.host, req.port, self.call_timeout)?;

        tracing::debug!(host = %req.host, port = req.port, identity = %identity, "registering throwaway account");
        session
            .post_form("signup", &[("user", &identity), ("passwd", &identity)])
            .await?
            .ensure_ok("signup")?;

        session
            .post_form("note", &[("note", &req.flag)])
            .await?
            .ensure_ok("note submission")?;

        Ok(ProtocolSession::form(session, identity))
    }

    async fn verify(
        &self,
        req: &InjectionRequest,
        session: ProtocolSession,
    ) -> Result<Verdict, BotError> {
        let http = session
            .http
            .as_ref()
            .ok_or_else(|| BotError::protocol("form session missing from attempt state"))?;

        let home = http.get("home").await?.ensure_ok("home read-back")?;
        if home.body.contains(&req.flag) {
            Ok(Verdict::success())
        } else {
            Ok(Verdict::failure(
                "flag not present in note read-back".to_string(),
            ))
        }
    }
}
