// # Route 53 DNS Provider
//
// This crate provides an AWS Route 53 provider implementation for the DDNS system.
//
// ## Operations
//
// | DnsProvider method        | Route 53 API                  |
// |---------------------------|-------------------------------|
// | `list_zones_by_name`      | `ListHostedZonesByName`       |
// | `list_address_records`    | `ListResourceRecordSets` (A)  |
// | `upsert_address_record`   | `ChangeResourceRecordSets`    |
//
// Each method is exactly one API call. Retries, zone walking and the
// "is a write needed" decision live in `ddns-core`.
//
// ## Credentials
//
// Taken from the standard AWS provider chain (environment variables,
// shared profile, instance metadata). Nothing credential-related is
// logged by this crate.
//
// ## Error Mapping
//
// - Throttling or HTTP 429 -> `Error::RateLimited`
// - Any other SDK failure -> `Error::Provider { provider: "route53", .. }`
// - A response without the fields we rely on -> `Error::Provider`

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_route53::Client;
use aws_sdk_route53::config::Region;
use aws_sdk_route53::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_route53::types::{
    Change, ChangeAction, ChangeBatch, ResourceRecord, ResourceRecordSet, RrType,
};
use ddns_core::config::ProviderConfig;
use ddns_core::name::{DomainName, ZoneId};
use ddns_core::traits::{
    AddressRecord, ChangeStatus, DnsProvider, DnsProviderFactory, ExistingRecord, HostedZone,
};
use ddns_core::{Error, Result};
use std::time::Duration;

const PROVIDER_NAME: &str = "route53";

/// Error codes Route 53 uses when it sheds load
const THROTTLING_CODES: [&str; 3] = ["Throttling", "ThrottlingException", "PriorRequestNotComplete"];

/// AWS Route 53 provider
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot: the SDK client is the only thing held
/// between calls.
#[derive(Debug, Clone)]
pub struct Route53Provider {
    client: Client,
}

impl Route53Provider {
    /// Wrap an already configured SDK client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the ambient AWS configuration
    ///
    /// # Parameters
    ///
    /// - `region`: Optional region override (Route 53 is global; this only
    ///   affects request signing)
    /// - `timeout`: Upper bound for each API operation, including retries
    ///   made inside the SDK
    pub async fn from_env(region: Option<String>, timeout: Duration) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest()).timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(timeout)
                .build(),
        );

        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }

        let config = loader.load().await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl DnsProvider for Route53Provider {
    async fn list_zones_by_name(&self, dns_name: &str, max_items: u32) -> Result<Vec<HostedZone>> {
        tracing::debug!("Listing hosted zones starting at {}", dns_name);

        let output = self
            .client
            .list_hosted_zones_by_name()
            .dns_name(dns_name)
            .max_items(to_max_items(max_items))
            .send()
            .await
            .map_err(|e| map_sdk_error("ListHostedZonesByName", e))?;

        Ok(output
            .hosted_zones()
            .iter()
            .map(|zone| HostedZone {
                id: zone.id().to_string(),
                name: zone.name().to_string(),
            })
            .collect())
    }

    async fn list_address_records(
        &self,
        zone: &ZoneId,
        start_name: &DomainName,
        max_items: u32,
    ) -> Result<Vec<ExistingRecord>> {
        tracing::debug!("Listing A records in {} starting at {}", zone, start_name);

        let output = self
            .client
            .list_resource_record_sets()
            .hosted_zone_id(zone.as_str())
            .start_record_name(start_name.as_str())
            .start_record_type(RrType::A)
            .max_items(to_max_items(max_items))
            .send()
            .await
            .map_err(|e| map_sdk_error("ListResourceRecordSets", e))?;

        Ok(output
            .resource_record_sets()
            .iter()
            .filter_map(existing_record)
            .collect())
    }

    async fn upsert_address_record(
        &self,
        zone: &ZoneId,
        record: &AddressRecord,
        comment: &str,
    ) -> Result<ChangeStatus> {
        let batch = upsert_batch(record, comment)?;

        let output = self
            .client
            .change_resource_record_sets()
            .hosted_zone_id(zone.as_str())
            .change_batch(batch)
            .send()
            .await
            .map_err(|e| map_sdk_error("ChangeResourceRecordSets", e))?;

        let info = output.change_info().ok_or_else(|| {
            Error::provider(PROVIDER_NAME, "Invalid response format: ChangeInfo is missing")
        })?;

        Ok(ChangeStatus(info.status().as_str().to_string()))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

fn to_max_items(max_items: u32) -> i32 {
    i32::try_from(max_items).unwrap_or(i32::MAX)
}

/// Keep only A record sets; other types can follow the start name in the listing
fn existing_record(set: &ResourceRecordSet) -> Option<ExistingRecord> {
    if *set.r#type() != RrType::A {
        return None;
    }

    Some(ExistingRecord {
        name: set.name().to_string(),
        ttl: set.ttl().and_then(|ttl| u32::try_from(ttl).ok()),
        values: set
            .resource_records()
            .iter()
            .map(|rr| rr.value().to_string())
            .collect(),
    })
}

/// Build the single-change UPSERT batch for `record`
fn upsert_batch(record: &AddressRecord, comment: &str) -> Result<ChangeBatch> {
    let invalid = |e: aws_sdk_route53::error::BuildError| {
        Error::provider(PROVIDER_NAME, format!("Invalid change request: {}", e))
    };

    let value = ResourceRecord::builder()
        .value(record.address.to_string())
        .build()
        .map_err(invalid)?;

    let record_set = ResourceRecordSet::builder()
        .name(record.name.as_str())
        .r#type(RrType::A)
        .ttl(i64::from(record.ttl))
        .resource_records(value)
        .build()
        .map_err(invalid)?;

    let change = Change::builder()
        .action(ChangeAction::Upsert)
        .resource_record_set(record_set)
        .build()
        .map_err(invalid)?;

    ChangeBatch::builder()
        .comment(comment)
        .changes(change)
        .build()
        .map_err(invalid)
}

fn is_throttled(code: Option<&str>, status: Option<u16>) -> bool {
    status == Some(429) || code.is_some_and(|code| THROTTLING_CODES.contains(&code))
}

fn map_sdk_error<E>(operation: &str, err: SdkError<E>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let status = err.raw_response().map(|raw| raw.status().as_u16());
    let message = format!("{} failed: {}", operation, DisplayErrorContext(&err));

    if is_throttled(err.code(), status) {
        Error::rate_limited(message)
    } else {
        Error::provider(PROVIDER_NAME, message)
    }
}

/// Factory for creating Route 53 providers
pub struct Route53Factory;

#[async_trait]
impl DnsProviderFactory for Route53Factory {
    async fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Route53 {
                region,
                timeout_secs,
            } => Ok(Box::new(
                Route53Provider::from_env(region.clone(), Duration::from_secs(*timeout_secs))
                    .await,
            )),
            _ => Err(Error::config("Invalid config for Route 53 provider")),
        }
    }
}

/// Register the Route 53 provider with a registry
pub fn register(registry: &ddns_core::ProviderRegistry) {
    registry.register_provider(PROVIDER_NAME, Box::new(Route53Factory));
}
