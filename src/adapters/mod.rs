//! Target adapters.
//!
//! One adapter per target-service protocol, each implementing the inject /
//! verify capability on top of the transport clients. The per-challenge
//! near-duplicate scripts of earlier competitions are unified here behind a
//! single [`Adapter`] trait keyed by [`TargetKind`]; the marker strings each
//! adapter matches against are enumerated in its [`AdapterSpec`] rather than
//! buried in control flow.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::EngineConfig;
use crate::error::BotError;
use crate::transport::FormSession;
use crate::verdict::Verdict;

pub mod mailbox;
pub mod notes;
pub mod points;

pub use mailbox::MailboxAdapter;
pub use notes::NotesAdapter;
pub use points::PointsAdapter;

/// Adapter-specific credential (admin token, shared password).
///
/// Wrapped so the secret is never logged verbatim: `Debug` prints
/// `<redacted>`, and there is no `Display`. Call sites that genuinely need
/// the value use [`AuthSecret::expose`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthSecret(String);

impl AuthSecret {
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self(secret.into())
    }

    /// Access the raw secret for use on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

/// Immutable per-call description of one injection attempt.
#[derive(Debug, Clone)]
pub struct InjectionRequest {
    /// Target hostname or IP.
    pub host: String,
    /// Target port (already resolved against the adapter default).
    pub port: u16,
    /// The secret artifact to plant and read back.
    pub flag: String,
    /// Adapter-specific credential, when the adapter requires one.
    pub auth_secret: Option<AuthSecret>,
}

impl InjectionRequest {
    /// Collision-resistant pseudo-identity derived from the flag, used as a
    /// throwaway account name so concurrent injections for different teams
    /// never collide.
    pub fn identity(&self) -> String {
        derive_identity(&self.flag)
    }
}

/// Trim a target response down to a diagnostic-sized excerpt.
///
/// Keeps verdict messages readable when a target answers with a whole HTML
/// page.
pub(crate) fn excerpt(body: &str) -> String {
    const MAX: usize = 200;
    let trimmed = body.trim();
    if trimmed.len() <= MAX {
        trimmed.to_string()
    } else {
        let mut cut = MAX;
        while !trimmed.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &trimmed[..cut])
    }
}

/// First 10 hex characters of the flag's SHA-256 digest.
pub fn derive_identity(flag: &str) -> String {
    let digest = Sha256::digest(flag.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(10);
    hex
}

/// Which target protocol an attempt should speak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Note-storage web app driven over an HTTP form session.
    #[default]
    Notes,
    /// Loyalty-points store driven over an HTTP form session, reached through
    /// an economy exploit.
    Points,
    /// Line-oriented TCP mailbox service.
    Mailbox,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Notes => "notes",
            Self::Points => "points",
            Self::Mailbox => "mailbox",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TargetKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notes" => Ok(Self::Notes),
            "points" => Ok(Self::Points),
            "mailbox" => Ok(Self::Mailbox),
            other => Err(format!(
                "unknown target kind {other:?} (expected notes, points or mailbox)"
            )),
        }
    }
}

/// Transport client an adapter is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Cookie-carrying HTTP session.
    FormSession,
    /// Raw line-oriented TCP.
    LineProtocol,
}

/// One documented response marker an adapter matches against.
#[derive(Debug, Clone, Copy)]
pub struct Marker {
    /// What the marker means in the protocol.
    pub name: &'static str,
    /// Exact substring (or prefix) looked for in the response.
    pub pattern: &'static str,
}

/// Static per-target-type description. Read-only after startup.
#[derive(Debug, Clone, Copy)]
pub struct AdapterSpec {
    /// Adapter name, matching its [`TargetKind`].
    pub name: &'static str,
    /// Transport client the adapter uses.
    pub transport: TransportKind,
    /// Port assumed when the request does not carry one.
    pub default_port: Option<u16>,
    /// Whether the request must carry an [`AuthSecret`].
    pub requires_secret: bool,
    /// Marker contract: every substring/prefix the adapter recognizes in
    /// target responses.
    pub markers: &'static [Marker],
}

/// Ephemeral per-attempt state handed from the inject phase to the verify
/// phase. Owned by exactly one attempt and dropped with it, whatever the
/// outcome.
#[derive(Default)]
pub struct ProtocolSession {
    /// Live HTTP session (cookies), for form-session adapters.
    pub http: Option<FormSession>,
    /// Flag-derived identity registered during injection.
    pub identity: Option<String>,
    /// Identifier the target assigned to the stored flag.
    pub message_id: Option<String>,
}

impl ProtocolSession {
    /// Session state for a form-session adapter.
    pub fn form(http: FormSession, identity: String) -> Self {
        Self {
            http: Some(http),
            identity: Some(identity),
            message_id: None,
        }
    }

    /// Session state for a line-protocol adapter. The injection connection is
    /// already closed by the time this exists; only the assigned identifier
    /// crosses the jitter gap.
    pub fn stored_message(id: String) -> Self {
        Self {
            http: None,
            identity: None,
            message_id: Some(id),
        }
    }
}

/// Capability implemented by every target adapter.
///
/// `inject` plants the flag and returns the intermediate state `verify` needs
/// to prove the flag is still retrievable. The engine inserts the randomized
/// jitter delay between the two calls and owns all error-to-verdict mapping
/// above the adapter boundary.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Static protocol description for this adapter.
    fn spec(&self) -> &'static AdapterSpec;

    /// Plant the flag into the target.
    async fn inject(&self, req: &InjectionRequest) -> Result<ProtocolSession, BotError>;

    /// Prove the flag is still retrievable.
    async fn verify(
        &self,
        req: &InjectionRequest,
        session: ProtocolSession,
    ) -> Result<Verdict, BotError>;
}

/// All adapters, instantiated once at startup from engine configuration.
///
/// Adapter instances are immutable after construction; concurrent attempts
/// share them freely and keep all mutable state in their own
/// [`ProtocolSession`].
pub struct AdapterRegistry {
    notes: Arc<NotesAdapter>,
    points: Arc<PointsAdapter>,
    mailbox: Arc<MailboxAdapter>,
}

impl AdapterRegistry {
    pub fn new(config: &EngineConfig) -> Self {
        let call_timeout = config.call_timeout();
        Self {
            notes: Arc::new(NotesAdapter::new(call_timeout)),
            points: Arc::new(PointsAdapter::new(call_timeout)),
            mailbox: Arc::new(MailboxAdapter::new(call_timeout)),
        }
    }

    /// Select the adapter for a target type.
    pub fn get(&self, kind: TargetKind) -> Arc<dyn Adapter> {
        match kind {
            TargetKind::Notes => self.notes.clone(),
            TargetKind::Points => self.points.clone(),
            TargetKind::Mailbox => self.mailbox.clone(),
        }
    }

    /// Static spec for a target type, for request validation at the gateway.
    pub fn spec(&self, kind: TargetKind) -> &'static AdapterSpec {
        self.get(kind).spec()
    }
}
