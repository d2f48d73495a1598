//! Line-protocol adapter for the raw TCP mailbox target.
//!
//! Injection: connect, validate the `220` banner, `LOGIN` with the privileged
//! credential, `SEND` the flag, and pull the assigned identifier out of the
//! `(ID: ...)` reply. The connection is then closed and the engine sleeps the
//! jitter interval before verification opens a fresh connection,
//! re-authenticates and `READ`s the message back. Defenders watching the wire
//! see two unrelated sessions with an uncorrelated gap between them.

use std::time::Duration;

use async_trait::async_trait;

use super::{excerpt, Adapter, AdapterSpec, InjectionRequest, Marker, ProtocolSession, TransportKind};
use crate::error::BotError;
use crate::transport::line::{extract_delimited, LineClient};
use crate::verdict::Verdict;

/// Privileged mailbox account the bot authenticates as.
const ADMIN_USER: &str = "admin";

const BANNER_PREFIX: &str = "220";
const OK_PREFIX: &str = "200";
const ID_OPEN: &str = "(ID: ";
const ID_CLOSE: &str = ")";

static SPEC: AdapterSpec = AdapterSpec {
    name: "mailbox",
    transport: TransportKind::LineProtocol,
    default_port: Some(9999),
    requires_secret: true,
    markers: &[
        Marker {
            name: "service banner",
            pattern: BANNER_PREFIX,
        },
        Marker {
            name: "command accepted",
            pattern: OK_PREFIX,
        },
        Marker {
            name: "assigned identifier",
            pattern: "(ID: <token>)",
        },
    ],
};

/// Adapter for the line-oriented mailbox target.
pub struct MailboxAdapter {
    call_timeout: Duration,
}

impl MailboxAdapter {
    pub fn new(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }

    /// Open a connection, validate the banner and authenticate.
    ///
    /// Used once per phase: injection and verification deliberately run on
    /// separate connections.
    async fn connect_and_login(&self, req: &InjectionRequest) -> Result<LineClient, BotError> {
        let secret = req
            .auth_secret
            .as_ref()
            .ok_or_else(|| BotError::input("mailbox adapter requires a password"))?;

        let mut client = LineClient::connect(&req.host, req.port, self.call_timeout).await?;

        let banner = client.read_line().await?;
        if !banner.starts_with(BANNER_PREFIX) {
            return Err(BotError::protocol(format!(
                "unexpected banner: {}",
                excerpt(&banner)
            )));
        }

        client
            .send_line(&format!("LOGIN {ADMIN_USER} {}", secret.expose()))
            .await?;
        let reply = client.read_line().await?;
        if !reply.starts_with(OK_PREFIX) {
            return Err(BotError::protocol(format!(
                "login rejected: {}",
                excerpt(&reply)
            )));
        }

        Ok(client)
    }
}

#[async_trait]
impl Adapter for MailboxAdapter {
    fn spec(&self) -> &'static AdapterSpec {
        &SPEC
    }

    async fn inject(&self, req: &InjectionRequest) -> Result<ProtocolSession, BotError> {
        let mut client = self.connect_and_login(req).await?;

        client
            .send_line(&format!("SEND {ADMIN_USER} {}", req.flag))
            .await?;
        let reply = client.read_line().await?;
        let id = extract_delimited(&reply, ID_OPEN, ID_CLOSE).ok_or_else(|| {
            BotError::protocol(format!(
                "no assigned identifier in reply: {}",
                excerpt(&reply)
            ))
        })?;

        tracing::debug!(host = %req.host, port = req.port, message_id = %id, "flag stored");
        // Connection drops here; verification reconnects after the jitter gap.
        Ok(ProtocolSession::stored_message(id.to_string()))
    }

    async fn verify(
        &self,
        req: &InjectionRequest,
        session: ProtocolSession,
    ) -> Result<Verdict, BotError> {
        let id = session
            .message_id
            .as_deref()
            .ok_or_else(|| BotError::protocol("stored message id missing from attempt state"))?;

        let mut client = self.connect_and_login(req).await?;

        client.send_line(&format!("READ {id}")).await?;
        let head = client.read_line().await?;
        if !head.starts_with(OK_PREFIX) {
            // Rejections are single-line; only an accepted READ is followed
            // by the dot-terminated content block.
            return Ok(Verdict::failure(format!(
                "read-back rejected: {}",
                excerpt(&head)
            )));
        }
        let block = client.read_block().await?;

        if block.contains(&req.flag) {
            Ok(Verdict::success())
        } else {
            Ok(Verdict::failure(format!(
                "flag not found in read-back: {}",
                excerpt(&block)
            )))
        }
    }
}
