//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Resolving the hosted zone once at startup
//! - Polling the IpSource on a fixed interval
//! - Reconciling the address record through the DnsProvider
//! - Stopping at the next checkpoint once shutdown is requested
//!
//! ## Lifecycle
//!
//! ```text
//! ┌──────────┐  zone ok   ┌─────────┐  onetime   ┌─────────────┐
//! │ Starting │──────────▶│ Polling │───────────▶│ Terminating │
//! └──────────┘            └─────────┘            └─────────────┘
//!      │ zone err            │   ▲                      ▲
//!      ▼                     ▼   │ interval elapsed     │ shutdown
//!   Err(..)               ┌──────────┐                  │
//!                         │ Sleeping │──────────────────┘
//!                         └──────────┘
//! ```
//!
//! ## Checkpoints
//!
//! The shutdown flag is read at the top of every iteration and after every
//! sleep tick. Calls already in flight are allowed to finish.

use crate::config::DdnsConfig;
use crate::error::Result;
use crate::name::{DomainName, ZoneId};
use crate::reconcile::{ReconcileOutcome, reconcile};
use crate::shutdown::Shutdown;
use crate::traits::{DnsProvider, IpSource};
use crate::zone::resolve_zone;
use std::net::Ipv4Addr;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// Farewell line logged when a continuous run ends
pub const FAREWELL_MESSAGE: &str = "Thank you for using ddnsd. Have a nice day.";

/// Why the engine left its loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Single-shot mode finished its poll
    Onetime,
    /// A shutdown was requested
    Shutdown,
}

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Zone known, entering the poll loop
    Started {
        record_name: String,
        zone_id: String,
    },

    /// IP lookup failed; this interval is skipped
    IpUnavailable {
        rate_limited: bool,
        error: String,
    },

    /// A reconciliation ran for the current address
    Reconciled {
        address: Ipv4Addr,
        outcome: ReconcileOutcome,
    },

    /// Engine stopped
    Stopped {
        reason: StopReason,
    },
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Start with [`DdnsEngine::run()`], passing a [`Shutdown`] handle
/// 3. Engine runs until single-shot completion or shutdown
///
/// ## Threading
///
/// All work happens on the calling task; there is never more than one
/// remote call in flight.
pub struct DdnsEngine {
    /// IP source for discovering the public address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for zone and record operations
    provider: Box<dyn DnsProvider>,

    /// Record to maintain
    record_name: DomainName,

    /// Zone given up front, bypassing resolution
    hosted_zone_id: Option<ZoneId>,

    /// Time between polls
    poll_interval: Duration,

    /// Interruptible sleep granularity
    tick: Duration,

    /// Stop after the first poll
    onetime: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let engine = Self {
            ip_source,
            provider,
            record_name: config.record.name,
            hosted_zone_id: config.record.hosted_zone_id.map(ZoneId::new),
            poll_interval: Duration::from_secs(config.engine.poll_interval_secs),
            tick: Duration::from_secs(config.engine.tick_secs),
            onetime: config.engine.onetime,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine
    ///
    /// # Returns
    ///
    /// - `Ok(StopReason)`: The loop ended normally
    /// - `Err(Error)`: The hosted zone could not be determined; the loop
    ///   was never entered
    pub async fn run(&self, shutdown: &Shutdown) -> Result<StopReason> {
        let zone_id = self.start().await?;

        self.emit_event(EngineEvent::Started {
            record_name: self.record_name.to_string(),
            zone_id: zone_id.to_string(),
        });

        let reason = loop {
            if shutdown.is_triggered() {
                break StopReason::Shutdown;
            }

            self.poll(&zone_id).await;

            if self.onetime {
                break StopReason::Onetime;
            }

            if !self.sleep(shutdown).await {
                break StopReason::Shutdown;
            }
        };

        debug!("Engine stopped: {:?}", reason);
        if !self.onetime {
            info!("{}", FAREWELL_MESSAGE);
        }

        self.emit_event(EngineEvent::Stopped { reason });
        Ok(reason)
    }

    /// Determine the zone to operate on
    async fn start(&self) -> Result<ZoneId> {
        if let Some(zone_id) = &self.hosted_zone_id {
            info!("Using hosted zone {} for {}", zone_id, self.record_name);
            return Ok(zone_id.clone());
        }

        resolve_zone(self.provider.as_ref(), &self.record_name)
            .await
            .inspect_err(|e| error!("Could not find a hosted zone for {}: {}", self.record_name, e))
    }

    /// One polling phase: look up the IP, reconcile if we have one
    async fn poll(&self, zone_id: &ZoneId) {
        let address = match self.ip_source.current().await {
            Ok(address) => address,
            Err(e) => {
                if e.is_rate_limited() {
                    warn!(
                        "Exceeded the rate limit of IP source {}: {}",
                        self.ip_source.source_name(),
                        e
                    );
                } else {
                    warn!("IP lookup via {} failed: {}", self.ip_source.source_name(), e);
                }
                warn!("Could not get IP, skipping this interval");

                self.emit_event(EngineEvent::IpUnavailable {
                    rate_limited: e.is_rate_limited(),
                    error: e.to_string(),
                });
                return;
            }
        };

        debug!("Current IP: {}", address);

        let outcome = reconcile(self.provider.as_ref(), zone_id, &self.record_name, address).await;
        if let ReconcileOutcome::Failed { reason } = &outcome {
            warn!("No change applied this interval: {}", reason);
        }

        self.emit_event(EngineEvent::Reconciled { address, outcome });
    }

    /// Sleep one poll interval in ticks
    ///
    /// # Returns
    ///
    /// `false` if shutdown was requested during the sleep
    async fn sleep(&self, shutdown: &Shutdown) -> bool {
        let mut remaining = self.poll_interval;

        while !remaining.is_zero() {
            let step = remaining.min(self.tick);
            tokio::time::sleep(step).await;
            remaining -= step;

            if shutdown.is_triggered() {
                return false;
            }
        }

        true
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening; events are optional
            Err(TrySendError::Closed(_)) => {}
        }
    }
}
