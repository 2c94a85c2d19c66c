//! Configuration types for the DDNS system
//!
//! This module defines all configuration structures used throughout the crate.

use crate::name::DomainName;
use serde::{Deserialize, Serialize};

/// Default IP lookup endpoint (ipinfo.io, JSON body with an `ip` field)
pub const DEFAULT_IP_SOURCE_URL: &str = "http://ipinfo.io/json";

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// The address record to maintain
    pub record: RecordConfig,

    /// IP source configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// DNS provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration for `record` with defaults everywhere else
    pub fn new(record: RecordConfig) -> Self {
        Self {
            record,
            ip_source: IpSourceConfig::default(),
            provider: ProviderConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.record.validate()?;
        self.provider.validate()?;
        self.ip_source.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// DNS record configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Fully-qualified name of the A record (e.g. "host.example.com.")
    pub name: DomainName,

    /// Hosted zone id; when set, zone resolution is skipped
    #[serde(default)]
    pub hosted_zone_id: Option<String>,
}

impl RecordConfig {
    /// Create a new record configuration
    pub fn new(name: DomainName) -> Self {
        Self {
            name,
            hosted_zone_id: None,
        }
    }

    /// Use a known hosted zone instead of resolving one
    pub fn with_hosted_zone_id(mut self, zone_id: impl Into<String>) -> Self {
        self.hosted_zone_id = Some(zone_id.into());
        self
    }

    /// Validate the record name per RFC 1035 (underscores allowed)
    pub fn validate(&self) -> Result<(), crate::Error> {
        let name = self.name.as_str();

        // Total length limit (RFC 1035: 253 chars max, without the root dot)
        if name.len() - 1 > 253 {
            return Err(crate::Error::config(format!(
                "Domain name too long: {} chars (max 253). Got: {}",
                name.len() - 1,
                name
            )));
        }

        for label in self.name.labels() {
            if label.len() > 63 {
                return Err(crate::Error::config(format!(
                    "Domain label too long: {} chars (max 63). Label: '{}'",
                    label.len(),
                    label
                )));
            }

            if !label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(crate::Error::config(format!(
                    "Domain label contains invalid characters. Label: '{}'. \
                    Valid: alphanumeric, hyphen and underscore only.",
                    label
                )));
            }

            if label.starts_with('-') || label.ends_with('-') {
                return Err(crate::Error::config(format!(
                    "Domain label cannot start or end with hyphen. Label: '{}'",
                    label
                )));
            }
        }

        if let Some(zone_id) = &self.hosted_zone_id
            && zone_id.trim().is_empty()
        {
            return Err(crate::Error::config("Hosted zone id cannot be empty"));
        }

        Ok(())
    }
}

/// IP source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpSourceConfig {
    /// HTTP JSON lookup service
    Http {
        /// URL to fetch IP from
        url: String,
        /// Request timeout in seconds
        #[serde(default = "default_ip_timeout_secs")]
        timeout_secs: u64,
    },

    /// Custom IP source
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            IpSourceConfig::Http { url, timeout_secs } => {
                if url.is_empty() {
                    return Err(crate::Error::config("HTTP IP source URL cannot be empty"));
                }
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "HTTP IP source URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("HTTP IP source timeout must be > 0"));
                }
                Ok(())
            }
            IpSourceConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom IP source factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom IP source config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the IP source type name
    pub fn type_name(&self) -> &str {
        match self {
            IpSourceConfig::Http { .. } => "http",
            IpSourceConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        IpSourceConfig::Http {
            url: DEFAULT_IP_SOURCE_URL.to_string(),
            timeout_secs: default_ip_timeout_secs(),
        }
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// AWS Route 53
    ///
    /// Credentials come from the standard AWS provider chain
    /// (environment, profile, instance metadata).
    Route53 {
        /// Region override; Route 53 is global, so this only affects signing
        #[serde(default)]
        region: Option<String>,
        /// Per-operation timeout in seconds
        #[serde(default = "default_provider_timeout_secs")]
        timeout_secs: u64,
    },

    /// Custom provider
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Route53 { region, timeout_secs } => {
                if region.as_ref().is_some_and(|r| r.trim().is_empty()) {
                    return Err(crate::Error::config("Route 53 region cannot be empty"));
                }
                if *timeout_secs == 0 {
                    return Err(crate::Error::config("Route 53 timeout must be > 0"));
                }
                Ok(())
            }
            ProviderConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config(
                        "Custom provider factory cannot be empty",
                    ));
                }
                if config.is_null() {
                    return Err(crate::Error::config(
                        "Custom provider config cannot be null",
                    ));
                }
                Ok(())
            }
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &str {
        match self {
            ProviderConfig::Route53 { .. } => "route53",
            ProviderConfig::Custom { factory, .. } => factory,
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig::Route53 {
            region: None,
            timeout_secs: default_provider_timeout_secs(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Interval between polls (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Granularity of the interruptible sleep (in seconds)
    ///
    /// Bounds how long a shutdown request can go unnoticed while sleeping.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Run one poll and exit
    #[serde(default)]
    pub onetime: bool,

    /// Capacity of the engine event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.tick_secs == 0 {
            return Err(crate::Error::config("Engine tick must be > 0 seconds"));
        }
        if self.poll_interval_secs < self.tick_secs {
            return Err(crate::Error::config(format!(
                "Poll interval ({}s) must be at least one tick ({}s)",
                self.poll_interval_secs, self.tick_secs
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            tick_secs: default_tick_secs(),
            onetime: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_ip_timeout_secs() -> u64 {
    10
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_secs() -> u64 {
    1800
}

fn default_tick_secs() -> u64 {
    1
}

fn default_event_channel_capacity() -> usize {
    100
}
