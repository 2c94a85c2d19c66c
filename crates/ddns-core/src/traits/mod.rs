//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`IpSource`]: Discover the current public IP address
//! - [`DnsProvider`]: Look up zones and records, submit upserts

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::{IpSource, IpSourceFactory};
pub use dns_provider::{
    AddressRecord, ChangeStatus, DnsProvider, DnsProviderFactory, ExistingRecord, HostedZone,
    RECORD_TTL_SECS,
};
