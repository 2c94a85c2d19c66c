//! Test doubles and common utilities for contract tests
//!
//! The doubles record every remote call so tests can assert on exactly
//! which provider operations were issued, and in which order.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::name::{DomainName, ZoneId};
use ddns_core::shutdown::Shutdown;
use ddns_core::traits::{
    AddressRecord, ChangeStatus, DnsProvider, ExistingRecord, HostedZone, IpSource,
};
use ddns_core::{DdnsConfig, RecordConfig};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A remote call observed by [`MockDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    ListZones(String),
    ListRecords { zone: String, start_name: String },
    Upsert { zone: String, record: AddressRecord },
}

/// Scripted state and call log, shared between clones of a mock provider
#[derive(Default)]
struct ProviderState {
    zones: Vec<HostedZone>,
    records: Vec<ExistingRecord>,
    fail_zone_lookup: bool,
    fail_record_lookup: bool,
    fail_upsert: bool,
    calls: Vec<ProviderCall>,
}

/// A mock DnsProvider with Route 53 listing semantics
///
/// Zones and records are returned in name order starting at the queried
/// name, so the first item may be a neighbour rather than a match. Names
/// are stored lowercased, as Route 53 reports them.
#[derive(Clone, Default)]
pub struct MockDnsProvider {
    state: Arc<Mutex<ProviderState>>,
}

impl MockDnsProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().zones.push(HostedZone {
            id: id.to_string(),
            name: name.to_ascii_lowercase(),
        });
        self
    }

    pub fn with_record(self, name: &str, value: &str) -> Self {
        self.state.lock().unwrap().records.push(ExistingRecord {
            name: name.to_ascii_lowercase(),
            ttl: Some(300),
            values: vec![value.to_string()],
        });
        self
    }

    pub fn failing_zone_lookup(self) -> Self {
        self.state.lock().unwrap().fail_zone_lookup = true;
        self
    }

    pub fn failing_record_lookup(self) -> Self {
        self.state.lock().unwrap().fail_record_lookup = true;
        self
    }

    pub fn failing_upsert(self) -> Self {
        self.state.lock().unwrap().fail_upsert = true;
        self
    }

    /// All calls in the order they were issued
    pub fn calls(&self) -> Vec<ProviderCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Names passed to list-zones-by-name, in order
    pub fn zone_queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::ListZones(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    /// Records submitted through upsert, in order
    pub fn upserts(&self) -> Vec<AddressRecord> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProviderCall::Upsert { record, .. } => Some(record),
                _ => None,
            })
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_zones_by_name(&self, dns_name: &str, max_items: u32) -> Result<Vec<HostedZone>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ProviderCall::ListZones(dns_name.to_string()));

        if state.fail_zone_lookup {
            return Err(Error::provider("mock", "zone lookup failed"));
        }

        let mut zones: Vec<HostedZone> = state
            .zones
            .iter()
            .filter(|zone| zone.name.as_str() >= dns_name)
            .cloned()
            .collect();
        zones.sort_by(|a, b| a.name.cmp(&b.name));
        zones.truncate(max_items as usize);
        Ok(zones)
    }

    async fn list_address_records(
        &self,
        zone: &ZoneId,
        start_name: &DomainName,
        max_items: u32,
    ) -> Result<Vec<ExistingRecord>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ProviderCall::ListRecords {
            zone: zone.to_string(),
            start_name: start_name.to_string(),
        });

        if state.fail_record_lookup {
            return Err(Error::provider("mock", "record lookup failed"));
        }

        let mut records: Vec<ExistingRecord> = state
            .records
            .iter()
            .filter(|record| record.name.as_str() >= start_name.as_str())
            .cloned()
            .collect();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        records.truncate(max_items as usize);
        Ok(records)
    }

    async fn upsert_address_record(
        &self,
        zone: &ZoneId,
        record: &AddressRecord,
        _comment: &str,
    ) -> Result<ChangeStatus> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(ProviderCall::Upsert {
            zone: zone.to_string(),
            record: record.clone(),
        });

        if state.fail_upsert {
            return Err(Error::provider("mock", "upsert failed"));
        }

        let value = record.address.to_string();
        let stored_name = record.name.as_str().to_ascii_lowercase();
        let position = state
            .records
            .iter()
            .position(|existing| existing.name == stored_name);
        match position {
            Some(i) => state.records[i].values = vec![value],
            None => state.records.push(ExistingRecord {
                name: stored_name,
                ttl: Some(record.ttl),
                values: vec![value],
            }),
        }

        Ok(ChangeStatus("PENDING".to_string()))
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// An IP source that replays a script of results
///
/// Once the script runs out, the last entry is repeated. An optional
/// shutdown handle is triggered on the n-th call, simulating a signal
/// arriving while the lookup is in flight.
#[derive(Clone)]
pub struct ScriptedIpSource {
    script: Arc<Mutex<VecDeque<std::result::Result<Ipv4Addr, Lookup>>>>,
    last: Arc<Mutex<std::result::Result<Ipv4Addr, Lookup>>>,
    call_count: Arc<AtomicUsize>,
    trigger_on_call: Option<(usize, Shutdown)>,
}

/// Failure kinds a scripted lookup can produce
#[derive(Debug, Clone, Copy)]
pub enum Lookup {
    RateLimited,
    Failed,
}

impl ScriptedIpSource {
    pub fn always(ip: Ipv4Addr) -> Self {
        Self::script(vec![Ok(ip)])
    }

    pub fn script(entries: Vec<std::result::Result<Ipv4Addr, Lookup>>) -> Self {
        let last = entries.last().copied().unwrap_or(Err(Lookup::Failed));
        Self {
            script: Arc::new(Mutex::new(entries.into())),
            last: Arc::new(Mutex::new(last)),
            call_count: Arc::new(AtomicUsize::new(0)),
            trigger_on_call: None,
        }
    }

    pub fn triggering_shutdown_on_call(mut self, call: usize, shutdown: &Shutdown) -> Self {
        self.trigger_on_call = Some((call, shutdown.clone()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((n, shutdown)) = &self.trigger_on_call
            && *n == call
        {
            shutdown.trigger();
        }

        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(*self.last.lock().unwrap());

        match next {
            Ok(ip) => Ok(ip),
            Err(Lookup::RateLimited) => Err(Error::rate_limited("HTTP 429 Too Many Requests")),
            Err(Lookup::Failed) => Err(Error::http("HTTP 503 Service Unavailable")),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

pub const HOST: &str = "host.example.com.";

pub fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

pub fn name(s: &str) -> DomainName {
    DomainName::new(s).unwrap()
}

/// Helper to create a DdnsConfig for testing
pub fn test_config(record_name: &str, onetime: bool) -> DdnsConfig {
    let mut config = DdnsConfig::new(RecordConfig::new(name(record_name)));
    config.engine.onetime = onetime;
    config
}
