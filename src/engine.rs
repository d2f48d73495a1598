//! Verification engine.
//!
//! Orchestrates one injection attempt through the phases
//! `Idle -> Injecting -> Jitter -> Verifying -> Done`, inserting the
//! randomized anti-fingerprinting delay between injection and verification,
//! bounding each phase with a hard timeout independent of anything the
//! adapter does, and reducing every outcome to a [`Verdict`]. A semaphore
//! caps simultaneous in-flight attempts so a burst of scoring requests cannot
//! exhaust the bot's own outbound connection capacity.
//!
//! The engine never retries: a failed network call fails the attempt, and
//! the caller (the scoring engine) decides whether to try again. Adapters may
//! carry one deterministic fallback step internally, nothing more.

use std::sync::Arc;

use rand::Rng;
use tokio::sync::Semaphore;
use tokio::time::{sleep, timeout, Duration};

use crate::adapters::{AdapterRegistry, InjectionRequest, TargetKind};
use crate::config::EngineConfig;
use crate::verdict::Verdict;

/// Orchestrates adapters into verdicts.
pub struct Engine {
    config: EngineConfig,
    registry: AdapterRegistry,
    limiter: Arc<Semaphore>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let registry = AdapterRegistry::new(&config);
        let limiter = Arc::new(Semaphore::new(config.max_in_flight));
        Self {
            config,
            registry,
            limiter,
        }
    }

    /// Adapter registry, for request validation at the gateway.
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Run one complete inject-and-verify attempt.
    ///
    /// Always produces a verdict; transport, protocol and timeout faults are
    /// absorbed here and never propagate to the gateway.
    pub async fn run(&self, kind: TargetKind, req: InjectionRequest) -> Verdict {
        let _permit = match self.limiter.acquire().await {
            Ok(permit) => permit,
            Err(_) => return Verdict::error("engine is shutting down"),
        };

        let adapter = self.registry.get(kind);
        let phase_timeout = self.config.phase_timeout();

        tracing::info!(
            target_kind = %kind,
            host = %req.host,
            port = req.port,
            identity = %req.identity(),
            "injecting"
        );
        let session = match timeout(phase_timeout, adapter.inject(&req)).await {
            Ok(Ok(session)) => session,
            Ok(Err(err)) => {
                tracing::warn!(target_kind = %kind, host = %req.host, error = %err, "injection failed");
                return Verdict::from(err);
            }
            Err(_) => {
                tracing::warn!(target_kind = %kind, host = %req.host, "injection phase timed out");
                return Verdict::error(format!(
                    "injection did not complete within {}s",
                    self.config.phase_timeout_secs
                ));
            }
        };

        let delay = self.jitter();
        tracing::debug!(target_kind = %kind, delay_ms = delay.as_millis() as u64, "jitter before verification");
        sleep(delay).await;

        tracing::info!(target_kind = %kind, host = %req.host, "verifying");
        match timeout(phase_timeout, adapter.verify(&req, session)).await {
            Ok(Ok(verdict)) => {
                if !verdict.is_success() {
                    tracing::warn!(
                        target_kind = %kind,
                        host = %req.host,
                        message = verdict.message.as_deref().unwrap_or(""),
                        "verification did not confirm the flag"
                    );
                }
                verdict
            }
            Ok(Err(err)) => {
                tracing::warn!(target_kind = %kind, host = %req.host, error = %err, "verification failed");
                Verdict::from(err)
            }
            Err(_) => {
                tracing::warn!(target_kind = %kind, host = %req.host, "verification phase timed out");
                Verdict::error(format!(
                    "verification did not complete within {}s",
                    self.config.phase_timeout_secs
                ))
            }
        }
    }

    /// Uniformly random delay from the configured bounded range. Never zero,
    /// never unbounded; config validation guarantees `min >= 1` and
    /// `min <= max`.
    fn jitter(&self) -> Duration {
        let ms = rand::thread_rng().gen_range(self.config.jitter_min_ms..=self.config.jitter_max_ms);
        Duration::from_millis(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with_jitter(min_ms: u64, max_ms: u64) -> Engine {
        Engine::new(EngineConfig {
            jitter_min_ms: min_ms,
            jitter_max_ms: max_ms,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn jitter_stays_within_the_configured_range() {
        let engine = engine_with_jitter(50, 120);
        for _ in 0..200 {
            let delay = engine.jitter();
            assert!(delay >= Duration::from_millis(50));
            assert!(delay <= Duration::from_millis(120));
        }
    }

    #[test]
    fn degenerate_range_is_exact() {
        let engine = engine_with_jitter(75, 75);
        assert_eq!(engine.jitter(), Duration::from_millis(75));
    }

    #[tokio::test]
    async fn unreachable_target_yields_error_verdict() {
        use crate::verdict::Outcome;
        use tokio::net::TcpListener;

        // Bind then drop for a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let engine = engine_with_jitter(1, 1);
        let req = InjectionRequest {
            host: "127.0.0.1".to_string(),
            port,
            flag: "FLAG{closed}".to_string(),
            auth_secret: None,
        };
        let verdict = engine.run(TargetKind::Notes, req).await;
        assert_eq!(verdict.outcome, Outcome::Error);
    }
}
