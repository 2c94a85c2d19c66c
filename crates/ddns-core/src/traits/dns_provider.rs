// # DNS Provider Trait
//
// Defines the interface to the remote DNS provider API.
//
// ## Implementations
//
// - Route 53: `ddns-provider-route53` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
// use ddns_core::name::{DomainName, ZoneId};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let zones = provider.list_zones_by_name("example.com.", 1).await?;
//     let zone = ZoneId::new(&zones[0].id);
//
//     let name = DomainName::new("host.example.com")?;
//     let existing = provider.list_address_records(&zone, &name, 1).await?;
//
//     Ok(())
// }
// ```

use crate::name::{DomainName, ZoneId};
use async_trait::async_trait;
use std::fmt;
use std::net::Ipv4Addr;

/// TTL applied to every record this system writes
pub const RECORD_TTL_SECS: u32 = 300;

/// A hosted zone as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    /// Provider zone id, possibly in path form (`/hostedzone/Z0123`)
    pub id: String,
    /// Registered zone name, including the trailing terminator
    pub name: String,
}

/// An address record read back from the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingRecord {
    /// Record name as stored by the provider
    pub name: String,
    /// Time-to-live, if reported
    pub ttl: Option<u32>,
    /// Record values in provider order
    pub values: Vec<String>,
}

impl ExistingRecord {
    /// The address value this system manages (the first one)
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }
}

/// The desired state of the managed address record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub name: DomainName,
    pub ttl: u32,
    pub address: Ipv4Addr,
}

impl AddressRecord {
    /// Create the record with the fixed TTL
    pub fn new(name: DomainName, address: Ipv4Addr) -> Self {
        Self {
            name,
            ttl: RECORD_TTL_SECS,
            address,
        }
    }
}

/// Status token returned by the provider for a submitted change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeStatus(pub String);

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for DNS provider implementations
///
/// This trait exposes exactly three remote operations. Deciding whether a
/// write is needed is owned by the reconciler, never by the provider.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Implement retry logic or backoff (the next engine poll is the retry)
/// - ❌ Cache zone or record state between requests
/// - ❌ Decide whether an update is needed (owned by the reconciler)
///
/// A malformed response (missing fields) must surface as an `Err`, so the
/// caller can treat it like any other failure of that operation.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List hosted zones starting at `dns_name` in the provider's order
    ///
    /// # Parameters
    ///
    /// - `dns_name`: Candidate zone name, with trailing terminator
    /// - `max_items`: Maximum number of zones to return
    ///
    /// # Returns
    ///
    /// Zero or more zones. The first zone is not guaranteed to match
    /// `dns_name`; the caller compares names.
    async fn list_zones_by_name(
        &self,
        dns_name: &str,
        max_items: u32,
    ) -> Result<Vec<HostedZone>, crate::Error>;

    /// List address records of `zone` whose name sorts at or after `start_name`
    ///
    /// # Returns
    ///
    /// Zero or more records. An empty list is a valid answer, not an error.
    async fn list_address_records(
        &self,
        zone: &ZoneId,
        start_name: &DomainName,
        max_items: u32,
    ) -> Result<Vec<ExistingRecord>, crate::Error>;

    /// Submit an insert-or-replace change for one address record
    ///
    /// # Returns
    ///
    /// The provider's change-status token
    async fn upsert_address_record(
        &self,
        zone: &ZoneId,
        record: &AddressRecord,
        comment: &str,
    ) -> Result<ChangeStatus, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
///
/// Construction is async because provider SDKs may resolve credentials
/// and regions from the environment.
#[async_trait]
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    async fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
