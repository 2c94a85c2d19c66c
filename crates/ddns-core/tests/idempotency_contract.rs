//! Contract Test: Idempotency
//!
//! Constraints verified:
//! - A record that already holds the address is never re-submitted
//! - Idempotency comes from re-reading remote state, not a local cache
//! - A record changed out-of-band is corrected on the next poll
//! - A mixed-case name matches the lowercased remote record
//!
//! If this test fails, the engine is issuing duplicate upserts.

mod common;

use common::*;
use ddns_core::name::ZoneId;
use ddns_core::reconcile::reconcile;
use ddns_core::{DdnsEngine, ReconcileOutcome, Shutdown};

#[tokio::test]
async fn matching_record_is_unchanged_without_write() {
    let provider = MockDnsProvider::new().with_record(HOST, "203.0.113.5");
    let zone = ZoneId::new("Z1");

    let outcome = reconcile(&provider, &zone, &name(HOST), ip("203.0.113.5")).await;

    assert_eq!(outcome, ReconcileOutcome::Unchanged);
    assert!(provider.upserts().is_empty(), "no upsert for an identical record");
    assert_eq!(provider.call_count(), 1, "only the read is issued");
}

#[tokio::test]
async fn repeated_runs_with_same_ip_write_once() {
    let provider = MockDnsProvider::new().with_zone("/hostedzone/Z1", "example.com.");
    let source = ScriptedIpSource::always(ip("203.0.113.9"));

    for _ in 0..3 {
        let (engine, _event_rx) = DdnsEngine::new(
            Box::new(source.clone()),
            Box::new(provider.clone()),
            test_config(HOST, true),
        )
        .expect("engine construction succeeds");

        engine.run(&Shutdown::new()).await.expect("run succeeds");
    }

    assert_eq!(source.call_count(), 3);
    assert_eq!(
        provider.upserts().len(),
        1,
        "only the first run creates the record; later runs read it back unchanged"
    );
}

async fn run_once(provider: &MockDnsProvider, source: &ScriptedIpSource) {
    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(source.clone()),
        Box::new(provider.clone()),
        test_config(HOST, true),
    )
    .expect("engine construction succeeds");

    engine.run(&Shutdown::new()).await.expect("run succeeds");
}

#[tokio::test]
async fn out_of_band_change_is_corrected() {
    let provider = MockDnsProvider::new().with_zone("/hostedzone/Z1", "example.com.");
    let source = ScriptedIpSource::always(ip("203.0.113.9"));

    run_once(&provider, &source).await;
    assert_eq!(provider.upserts().len(), 1);

    // Someone else repoints the record behind our back
    reconcile(&provider, &ZoneId::new("Z1"), &name(HOST), ip("198.51.100.7")).await;
    assert_eq!(provider.upserts().len(), 2);

    run_once(&provider, &source).await;

    let upserts = provider.upserts();
    assert_eq!(upserts.len(), 3, "drift is detected by re-reading remote state");
    assert_eq!(upserts[2].address, ip("203.0.113.9"));
}

#[tokio::test]
async fn mixed_case_name_does_not_churn() {
    let provider = MockDnsProvider::new();
    let source = ScriptedIpSource::always(ip("203.0.113.9"));

    for _ in 0..3 {
        let mut config = test_config("Host.Example.com", true);
        config.record = config.record.with_hosted_zone_id("/hostedzone/Z1");

        let (engine, _event_rx) =
            DdnsEngine::new(Box::new(source.clone()), Box::new(provider.clone()), config)
                .expect("engine construction succeeds");

        engine.run(&Shutdown::new()).await.expect("run succeeds");
    }

    let upserts = provider.upserts();
    assert_eq!(upserts.len(), 1, "later runs find the lowercased record unchanged");
    assert_eq!(upserts[0].name.as_str(), HOST);
}
