//! Hosted zone resolution
//!
//! Finds the most specific hosted zone containing a name by walking its
//! suffixes from the full name down to the two-label apex:
//!
//! ```text
//! a.b.example.com.  ──query──▶  match? ── yes ──▶ ZoneId
//!        │ no
//! b.example.com.    ──query──▶  match? ── yes ──▶ ZoneId
//!        │ no
//! example.com.      ──query──▶  match? ── yes ──▶ ZoneId
//!        │ no
//!   ZoneNotFound
//! ```
//!
//! Resolution happens once at startup. Any failure here is fatal to the
//! caller: a provider error stops the walk immediately.

use crate::error::{Error, Result};
use crate::name::{DomainName, ZoneId};
use crate::traits::DnsProvider;
use tracing::{debug, info};

/// Resolve the hosted zone that governs `name`
///
/// Each candidate suffix is queried with a single-item list-by-name call.
/// The first zone returned must equal the candidate exactly to count as
/// a match. Candidates are already lowercased and terminated.
///
/// # Returns
///
/// - `Ok(ZoneId)`: The most specific matching zone
/// - `Err(Error::ZoneNotFound)`: No candidate matched
/// - `Err(Error)`: The provider failed on a candidate query
pub async fn resolve_zone(provider: &dyn DnsProvider, name: &DomainName) -> Result<ZoneId> {
    for candidate in name.zone_candidates() {
        debug!("Looking up hosted zone {}", candidate);

        let zones = provider.list_zones_by_name(&candidate, 1).await?;

        if let Some(zone) = zones.first().filter(|zone| zone.name == candidate) {
            let zone_id = ZoneId::new(&zone.id);
            info!("Resolved {} to hosted zone {} ({})", name, zone_id, zone.name);
            return Ok(zone_id);
        }
    }

    Err(Error::zone_not_found(name.as_str()))
}
