//! Reqwest-based HTTP client for the license verification API.

use crate::client::RemoteValidator;
use crate::config::TierlockConfig;
use crate::protocol::models::{parse_verify_response, ValidatorResponse};
use crate::TierlockError;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use tracing::debug;

/// Blocking client for a Gumroad-style `licenses/verify` endpoint.
pub struct GumroadClient {
    client: Client,
    user_agent: String,
    product_id: String,
    verify_url: String,
}

impl GumroadClient {
    /// Create a new client from config.
    pub fn new(config: &TierlockConfig) -> Result<Self, TierlockError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                TierlockError::ConfigError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            user_agent: build_user_agent(config),
            product_id: config.product_id.to_string(),
            verify_url: config.verify_url.to_string(),
        })
    }

    /// Get the configured endpoint.
    pub fn verify_url(&self) -> &str {
        &self.verify_url
    }
}

impl RemoteValidator for GumroadClient {
    fn verify(&self, license_key: &str) -> Result<ValidatorResponse, TierlockError> {
        let form = [
            ("product_id", self.product_id.as_str()),
            ("license_key", license_key),
            ("increment_uses_count", "true"),
        ];

        let response = self
            .client
            .post(&self.verify_url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .map_err(|e| TierlockError::ValidatorTransport(format!("Request failed: {}", e)))?;

        let status = response.status();
        debug!(status = status.as_u16(), "license server responded");

        if status == StatusCode::NOT_FOUND {
            return Ok(ValidatorResponse::rejected("Invalid license key"));
        }
        if status.is_server_error() {
            return Err(TierlockError::ValidatorServerError(status.as_u16()));
        }

        let body = response.bytes().map_err(|e| {
            TierlockError::ValidatorTransport(format!("Failed to read body: {}", e))
        })?;

        Ok(parse_verify_response(&body)?.normalize())
    }
}

/// Build a User-Agent string from config.
///
/// Format: `<product>/tierlock-<version> <app>`
/// Example: `ccp-installer/tierlock-0.1.0 ccp`
pub fn build_user_agent(config: &TierlockConfig) -> String {
    format!(
        "{}/tierlock-{} {}",
        config.user_agent_product,
        env!("CARGO_PKG_VERSION"),
        config.app_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::model::PaidTier;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> TierlockConfig {
        let mut config = TierlockConfig::new("ccp", "product-123");
        config.user_agent_product = "ccp-installer";
        config
    }

    #[test]
    fn test_build_user_agent_format() {
        let ua = build_user_agent(&test_config());
        let version = env!("CARGO_PKG_VERSION");
        assert_eq!(ua, format!("ccp-installer/tierlock-{} ccp", version));
    }

    #[test]
    fn test_client_creation() {
        let client = GumroadClient::new(&test_config());
        assert!(client.is_ok());
    }

    #[test]
    fn test_client_verify_url() {
        let client = GumroadClient::new(&test_config()).unwrap();
        assert_eq!(client.verify_url(), crate::config::DEFAULT_VERIFY_URL);
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        let mut config = test_config();
        // Port 9 (discard) on loopback is closed on test machines.
        config.verify_url = "http://127.0.0.1:9/v2/licenses/verify";
        config.request_timeout = Duration::from_secs(2);

        let client = GumroadClient::new(&config).unwrap();
        let result = client.verify("SOME-KEY");
        assert!(matches!(result, Err(TierlockError::ValidatorTransport(_))));
    }

    // The blocking client owns its own runtime, so it is built, used and
    // dropped off the async test thread.
    async fn verify_against(
        server: &MockServer,
        license_key: &'static str,
    ) -> Result<ValidatorResponse, TierlockError> {
        let url: &'static str =
            Box::leak(format!("{}/v2/licenses/verify", server.uri()).into_boxed_str());

        tokio::task::spawn_blocking(move || {
            let mut config = test_config();
            config.verify_url = url;
            GumroadClient::new(&config)?.verify(license_key)
        })
        .await
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_verify_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v2/licenses/verify"))
            .and(body_string_contains("license_key=GOOD-KEY"))
            .and(body_string_contains("product_id=product-123"))
            .and(body_string_contains("increment_uses_count=true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "uses": 2,
                "purchase": {
                    "email": "buyer@example.com",
                    "refunded": false,
                    "disputed": false,
                    "quantity": 10,
                    "variants": "(Enterprise)"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = verify_against(&server, "GOOD-KEY").await.unwrap();
        assert!(response.success);
        assert_eq!(response.tier, Some(PaidTier::Enterprise));
        assert_eq!(response.email.as_deref(), Some("buyer@example.com"));
        assert_eq!(response.seats_total, Some(10));
        assert_eq!(response.seats_used, Some(2));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_verify_sends_user_agent() {
        let server = MockServer::start().await;
        let expected = build_user_agent(&test_config());
        Mock::given(method("POST"))
            .and(header("user-agent", expected.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "purchase": {"email": "buyer@example.com"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = verify_against(&server, "GOOD-KEY").await.unwrap();
        assert_eq!(response.tier, Some(PaidTier::Commercial));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_verify_refunded_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "purchase": {"email": "buyer@example.com", "refunded": true}
            })))
            .mount(&server)
            .await;

        let response = verify_against(&server, "REFUNDED-KEY").await.unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("License has been refunded"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_verify_not_found_is_invalid_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "success": false,
                "message": "That license does not exist for the provided product."
            })))
            .mount(&server)
            .await;

        let response = verify_against(&server, "BAD-KEY").await.unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("Invalid license key"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_verify_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = verify_against(&server, "ANY-KEY").await;
        assert!(matches!(result, Err(TierlockError::ValidatorServerError(503))));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_verify_non_json_client_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("<html>Bad Request</html>"))
            .mount(&server)
            .await;

        let result = verify_against(&server, "ANY-KEY").await;
        assert!(matches!(result, Err(TierlockError::ProtocolError(_))));
    }
}
