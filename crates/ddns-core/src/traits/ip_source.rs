// # IP Source Trait
//
// Defines the interface for discovering the current public IP address.
//
// ## Implementations
//
// - HTTP JSON lookup (ipinfo.io): `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("Public IP: {}", current_ip);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

/// Trait for IP source implementations
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Trust Level: Semi-Trusted
///
/// IP sources are **observers**, not **decision-makers**:
///
/// ## Allowed Capabilities
/// - ✅ Perform I/O against their lookup endpoint
/// - ✅ Parse endpoint-specific responses
///
/// ## Forbidden Capabilities
/// - ❌ Perform DNS updates (use `DnsProvider`)
/// - ❌ Implement retry logic (the next engine poll is the retry)
/// - ❌ Cache results between calls
/// - ❌ Spawn tasks or polling loops (scheduling is owned by `DdnsEngine`)
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IPv4 address
    ///
    /// Performs a single lookup, with no retries.
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The current IP address
    /// - `Err(Error::RateLimited)`: The lookup service refused the request (HTTP 429)
    /// - `Err(Error)`: Any other failure to determine the address
    async fn current(&self) -> Result<Ipv4Addr, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// Helper trait for constructing IP sources from configuration
pub trait IpSourceFactory: Send + Sync {
    /// Create an IpSource instance from configuration
    ///
    /// # Parameters
    ///
    /// - `config`: Configuration specific to this IP source type
    ///
    /// # Returns
    ///
    /// A boxed IpSource trait object
    fn create(
        &self,
        config: &crate::config::IpSourceConfig,
    ) -> Result<Box<dyn IpSource>, crate::Error>;
}
