//! Address record reconciliation
//!
//! One reconciliation reads the remote record, compares it to the desired
//! address and issues at most one upsert:
//!
//! 1. List address records of the zone starting at the name (one item)
//! 2. Existing record with the same name and value → `Unchanged`
//! 3. Existing record with the same name, other value → update
//! 4. No record, or the next record has another name → create
//! 5. Update and create both submit one UPSERT with TTL 300
//!
//! Provider failures never escape: they become [`ReconcileOutcome::Failed`].

use crate::name::{DomainName, ZoneId};
use crate::traits::{AddressRecord, ChangeStatus, DnsProvider};
use std::net::Ipv4Addr;
use tracing::{info, warn};

/// Comment attached to every submitted change batch
pub const CHANGE_COMMENT: &str = "Record updated by ddnsd";

/// Result of a single reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// An upsert was submitted and accepted
    Applied {
        /// The value replaced, `None` when the record was created
        previous: Option<String>,
        /// Provider change-status token
        change_status: ChangeStatus,
    },
    /// The remote record already pointed at the address; no write issued
    Unchanged,
    /// A provider call failed; nothing was written by this reconciliation
    Failed {
        reason: String,
    },
}

/// Bring the address record for `name` in `zone` to `address`
pub async fn reconcile(
    provider: &dyn DnsProvider,
    zone: &ZoneId,
    name: &DomainName,
    address: Ipv4Addr,
) -> ReconcileOutcome {
    let existing = match provider.list_address_records(zone, name, 1).await {
        Ok(records) => records,
        Err(e) => {
            warn!("Failed to look up A record {}: {}", name, e);
            return ReconcileOutcome::Failed {
                reason: e.to_string(),
            };
        }
    };

    let desired = address.to_string();
    let previous = match existing.into_iter().next() {
        Some(record) if record.name == name.as_str() => {
            let current = record.value().map(str::to_string);
            if current.as_deref() == Some(desired.as_str()) {
                info!("A record {} already points to {}", name, address);
                return ReconcileOutcome::Unchanged;
            }

            info!(
                "Updating {} from {} to {}",
                name,
                current.as_deref().unwrap_or("<no value>"),
                address
            );
            current
        }
        _ => {
            info!("Adding new A record {} pointing to {}", name, address);
            None
        }
    };

    let record = AddressRecord::new(name.clone(), address);
    match provider
        .upsert_address_record(zone, &record, CHANGE_COMMENT)
        .await
    {
        Ok(change_status) => {
            info!("{} change status: {}", provider.provider_name(), change_status);
            ReconcileOutcome::Applied {
                previous,
                change_status,
            }
        }
        Err(e) => {
            warn!("Failed to upsert A record {}: {}", name, e);
            ReconcileOutcome::Failed {
                reason: e.to_string(),
            }
        }
    }
}
