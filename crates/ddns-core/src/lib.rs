// # ddns-core
//
// Core library for the Route 53 dynamic DNS updater.
//
// ## Architecture Overview
//
// This library provides the core functionality for dynamic DNS updates:
// - **IpSource**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for zone lookup, record lookup and upsert
// - **zone**: Most-specific hosted zone resolution by suffix walk
// - **reconcile**: Read-compare-upsert of the address record
// - **DdnsEngine**: Poll loop with single-shot mode and cooperative shutdown
// - **ProviderRegistry**: Plugin-based registry for providers and IP sources
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from implementations
// 2. **Read Before Write**: The remote record is re-read every interval
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: An identical record is never re-submitted

pub mod traits;
pub mod engine;
pub mod registry;
pub mod config;
pub mod error;
pub mod name;
pub mod reconcile;
pub mod shutdown;
pub mod zone;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider};
pub use engine::{DdnsEngine, EngineEvent, StopReason};
pub use registry::ProviderRegistry;
pub use config::{DdnsConfig, EngineConfig, IpSourceConfig, ProviderConfig, RecordConfig};
pub use error::{Error, Result};
pub use name::{DomainName, ZoneId};
pub use reconcile::ReconcileOutcome;
pub use shutdown::Shutdown;
