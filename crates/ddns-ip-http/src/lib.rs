// # HTTP IP Source
//
// This crate provides an HTTP-based IP source for the DDNS system.
//
// ## Protocol
//
// A single GET to a JSON "what is my IP" endpoint (ipinfo.io by default):
//
// ```text
// GET http://ipinfo.io/json
//
// 200 {"ip": "203.0.113.5", "city": ..., ...}   -> Ok(203.0.113.5)
// 429                                           -> Err(RateLimited)
// anything else                                 -> Err(Http)
// ```
//
// ipinfo.io limits free use to 1000 requests per day; at the default
// 30 minute interval the daemon uses 48.
//
// No retries and no caching: each call is one request, and the engine's
// next poll is the retry.

use ddns_core::ProviderRegistry;
use ddns_core::config::IpSourceConfig;
use ddns_core::traits::{IpSource, IpSourceFactory};
use ddns_core::{Error, Result};

use serde::Deserialize;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Body of a successful lookup; other fields are ignored
#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    ip: String,
}

/// HTTP-based IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: JSON endpoint returning an `ip` field (e.g., "http://ipinfo.io/json")
    /// - `timeout`: Request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| Error::http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::rate_limited(format!(
                "{} refused the request: {}",
                self.url, status
            )));
        }
        if status != reqwest::StatusCode::OK {
            return Err(Error::http(format!("Unexpected status: {}", status)));
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to parse response: {}", e)))?;

        let ip_text = body.ip.trim();
        let ip: Ipv4Addr = ip_text
            .parse()
            .map_err(|_| Error::ip_source(format!("Not an IPv4 address: {}", ip_text)))?;

        tracing::debug!("{} reports public IP {}", self.url, ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}

/// Factory for creating HTTP IP sources
pub struct HttpFactory;

impl IpSourceFactory for HttpFactory {
    fn create(&self, config: &IpSourceConfig) -> Result<Box<dyn IpSource>> {
        match config {
            IpSourceConfig::Http { url, timeout_secs } => Ok(Box::new(HttpIpSource::new(
                url.clone(),
                Duration::from_secs(*timeout_secs),
            )?)),
            _ => Err(Error::config("Invalid config for HTTP IP source")),
        }
    }
}

/// Register the HTTP IP source with a registry
pub fn register(registry: &ProviderRegistry) {
    registry.register_ip_source("http", Box::new(HttpFactory));
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn source_for(server: &MockServer) -> HttpIpSource {
        HttpIpSource::new(format!("{}/json", server.uri()), Duration::from_secs(5)).unwrap()
    }

    async fn respond_with(template: ResponseTemplate) -> (MockServer, HttpIpSource) {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json"))
            .respond_with(template)
            .expect(1)
            .mount(&server)
            .await;
        let source = source_for(&server).await;
        (server, source)
    }

    #[tokio::test]
    async fn test_ok_with_ip_field() {
        let (_server, source) = respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "ip": "203.0.113.5", "city": "Springfield", "org": "AS64500" }),
        ))
        .await;

        assert_eq!(source.current().await.unwrap(), Ipv4Addr::new(203, 0, 113, 5));
    }

    #[tokio::test]
    async fn test_429_is_rate_limited() {
        let (_server, source) = respond_with(ResponseTemplate::new(429)).await;

        let err = source.current().await.unwrap_err();
        assert!(err.is_rate_limited(), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_other_status_is_failure() {
        let (_server, source) = respond_with(ResponseTemplate::new(500)).await;

        let err = source.current().await.unwrap_err();
        assert!(matches!(err, Error::Http(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_non_ok_success_status_is_failure() {
        let (_server, source) = respond_with(ResponseTemplate::new(204)).await;

        assert!(source.current().await.is_err());
    }

    #[tokio::test]
    async fn test_missing_ip_field_is_failure() {
        let (_server, source) = respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "city": "Springfield" })),
        )
        .await;

        let err = source.current().await.unwrap_err();
        assert!(matches!(err, Error::IpSource(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_ipv6_is_rejected() {
        let (_server, source) = respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ip": "2001:db8::1" })),
        )
        .await;

        let err = source.current().await.unwrap_err();
        assert!(err.to_string().contains("Not an IPv4 address"));
    }

    #[test]
    fn test_factory_creation() {
        let factory = HttpFactory;

        let config = IpSourceConfig::Http {
            url: "http://ipinfo.io/json".to_string(),
            timeout_secs: 10,
        };

        let source = factory.create(&config);
        assert!(source.is_ok());
    }

    #[test]
    fn test_factory_rejects_foreign_config() {
        let config = IpSourceConfig::Custom {
            factory: "other".to_string(),
            config: serde_json::json!({}),
        };

        assert!(HttpFactory.create(&config).is_err());
    }

    #[test]
    fn test_register() {
        let registry = ProviderRegistry::new();
        register(&registry);
        assert!(registry.has_ip_source("http"));
    }
}
