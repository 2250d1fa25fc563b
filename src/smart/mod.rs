//! SMART-on-FHIR authorization flow
//!
//! [`AuthFlowConfig`] holds the app's OAuth client registration (client id,
//! redirect URL, scopes) and talks to whichever FHIR server launched the app.
//! Endpoints are resolved from the issuer's discovery document on every call,
//! since different launches may come from different issuers.
//!
//! The CSRF `state` is always supplied by the caller; this module never
//! generates one.

pub mod discovery;
pub mod token;

pub use discovery::{fetch_smart_endpoints, SmartEndpoints, SMART_CONFIG_PATH};
pub use token::{parse_token_response, FhirToken};

use thiserror::Error;

use crate::utils::logging::LoggingHelper;
use token::CodeGrant;

/// Failures talking to a FHIR authorization server
#[derive(Debug, Error)]
pub enum SmartError {
    #[error("SMART discovery failed: {0}")]
    Discovery(String),
    #[error("token exchange failed: {0}")]
    TokenExchange(String),
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Process-wide OAuth client configuration for SMART launches
#[derive(Clone, Debug)]
pub struct AuthFlowConfig {
    client_id: String,
    redirect_url: String,
    scopes: Vec<String>,
    http_client: reqwest::Client,
}

impl AuthFlowConfig {
    #[must_use]
    pub fn new(client_id: impl Into<String>, redirect_url: impl Into<String>, scopes: Vec<String>) -> Self {
        Self::with_client(client_id, redirect_url, scopes, reqwest::Client::new())
    }

    /// Same as [`AuthFlowConfig::new`] with a caller-provided HTTP client
    #[must_use]
    pub fn with_client(
        client_id: impl Into<String>,
        redirect_url: impl Into<String>,
        scopes: Vec<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_url: redirect_url.into(),
            scopes,
            http_client,
        }
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Resolve the issuer's authorization and token endpoints
    ///
    /// # Errors
    ///
    /// Returns [`SmartError::Discovery`] if the discovery document cannot be
    /// fetched or lacks either endpoint
    pub async fn resolve_endpoints(&self, issuer_url: &str) -> Result<SmartEndpoints, SmartError> {
        let endpoints = fetch_smart_endpoints(&self.http_client, issuer_url).await?;
        LoggingHelper::log_discovery_resolved(issuer_url, &endpoints);
        Ok(endpoints)
    }

    /// URL of the issuer's authorization page for this launch
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails or the advertised authorization
    /// endpoint is not a valid URL
    pub async fn build_authorization_url(
        &self,
        issuer_url: &str,
        launch_context_id: &str,
        state: &str,
    ) -> Result<String, SmartError> {
        let endpoints = self.resolve_endpoints(issuer_url).await?;
        self.authorization_url_for(&endpoints, issuer_url, launch_context_id, state)
    }

    /// Build the authorization URL against already resolved endpoints
    ///
    /// # Errors
    ///
    /// Returns [`SmartError::InvalidUrl`] if the authorization endpoint does not parse
    pub fn authorization_url_for(
        &self,
        endpoints: &SmartEndpoints,
        issuer_url: &str,
        launch_context_id: &str,
        state: &str,
    ) -> Result<String, SmartError> {
        let mut url = url::Url::parse(&endpoints.authorization_endpoint).map_err(|e| {
            SmartError::InvalidUrl {
                url: endpoints.authorization_endpoint.clone(),
                reason: e.to_string(),
            }
        })?;
        let scope = self.scopes.join(" ");
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_url)
            .append_pair("scope", &scope)
            .append_pair("launch", launch_context_id)
            .append_pair("state", state)
            .append_pair("aud", issuer_url);

        LoggingHelper::log_authorization_url_built(issuer_url, &scope);
        Ok(url.into())
    }

    /// Exchange an authorization code for a token at the issuer's token endpoint
    ///
    /// # Errors
    ///
    /// Returns [`SmartError::Discovery`] if endpoint resolution fails and
    /// [`SmartError::TokenExchange`] if the grant is rejected or the response is
    /// malformed
    pub async fn exchange_code(&self, issuer_url: &str, code: &str) -> Result<FhirToken, SmartError> {
        let endpoints = self.resolve_endpoints(issuer_url).await?;
        LoggingHelper::log_token_exchange_start(issuer_url);

        let token = token::exchange_code(
            &self.http_client,
            CodeGrant {
                token_endpoint: &endpoints.token_endpoint,
                client_id: &self.client_id,
                redirect_uri: &self.redirect_url,
                code,
            },
        )
        .await?;

        LoggingHelper::log_token_exchange_summary(issuer_url, &token);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const CLIENT_ID: &str = "fhir_client";
    const REDIRECT_URL: &str = "https://redirect.com/fhir_redirect";

    fn config() -> AuthFlowConfig {
        AuthFlowConfig::new(
            CLIENT_ID,
            REDIRECT_URL,
            vec!["launch".to_string(), "profile".to_string()],
        )
    }

    async fn fhir_server(auth_url: &str, token_url: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SMART_CONFIG_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "authorization_endpoint": auth_url,
                "token_endpoint": token_url
            })))
            .mount(&server)
            .await;
        server
    }

    fn query_of(url: &str) -> HashMap<String, String> {
        url::Url::parse(url)
            .unwrap()
            .query_pairs()
            .into_owned()
            .collect()
    }

    #[tokio::test]
    async fn test_build_authorization_url() {
        let server = fhir_server("https://auth.com/authorize", "https://token.com").await;
        let issuer = server.uri();

        let raw = config()
            .build_authorization_url(&issuer, "123", "test-state")
            .await
            .unwrap();

        let parsed = url::Url::parse(&raw).unwrap();
        assert_eq!(parsed.scheme(), "https");
        assert_eq!(parsed.host_str(), Some("auth.com"));
        assert_eq!(parsed.path(), "/authorize");

        let query = query_of(&raw);
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["client_id"], CLIENT_ID);
        assert_eq!(query["redirect_uri"], REDIRECT_URL);
        assert_eq!(query["scope"], "launch profile");
        assert_eq!(query["launch"], "123");
        assert_eq!(query["state"], "test-state");
        assert_eq!(query["aud"], issuer);
    }

    #[tokio::test]
    async fn test_authorization_url_keeps_existing_query() {
        let endpoints = SmartEndpoints {
            authorization_endpoint: "https://auth.com/authorize?tenant=t1".to_string(),
            token_endpoint: "https://token.com".to_string(),
        };
        let raw = config()
            .authorization_url_for(&endpoints, "https://fhir.example", "L1", "s")
            .unwrap();
        let query = query_of(&raw);
        assert_eq!(query["tenant"], "t1");
        assert_eq!(query["launch"], "L1");
    }

    #[test]
    fn test_authorization_url_rejects_bad_endpoint() {
        let endpoints = SmartEndpoints {
            authorization_endpoint: "not a url".to_string(),
            token_endpoint: "https://token.com".to_string(),
        };
        assert!(matches!(
            config().authorization_url_for(&endpoints, "https://fhir.example", "L1", "s"),
            Err(SmartError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_build_authorization_url_discovery_failure() {
        let server = MockServer::start().await;
        let err = config()
            .build_authorization_url(&server.uri(), "123", "state")
            .await
            .unwrap_err();
        assert!(matches!(err, SmartError::Discovery(_)));
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let token_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=auth-code"))
            .and(body_string_contains("client_id=fhir_client"))
            .and(body_string_contains(
                "redirect_uri=https%3A%2F%2Fredirect.com%2Ffhir_redirect",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "test-token",
                "refresh_token": "test-refresh-token",
                "token_type": "Bearer",
                "patient": "p123",
                "encounter": "e123",
                "scope": "launch profile"
            })))
            .expect(1)
            .mount(&token_server)
            .await;
        let fhir = fhir_server("https://auth.com", &format!("{}/token", token_server.uri())).await;

        let token = config().exchange_code(&fhir.uri(), "auth-code").await.unwrap();
        assert_eq!(token.access_token, "test-token");
        assert_eq!(token.refresh_token.as_deref(), Some("test-refresh-token"));
        assert_eq!(token.token_type, "Bearer");
        assert_eq!(token.patient.as_deref(), Some("p123"));
        assert_eq!(token.encounter.as_deref(), Some("e123"));
        assert_eq!(token.scope.as_deref(), Some("launch profile"));
    }

    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let token_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&token_server)
            .await;
        let fhir = fhir_server("https://auth.com", &format!("{}/token", token_server.uri())).await;

        let err = config().exchange_code(&fhir.uri(), "wrong-code").await.unwrap_err();
        assert!(matches!(err, SmartError::TokenExchange(_)));
    }

    #[tokio::test]
    async fn test_exchange_code_malformed_body() {
        let token_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"token_type\":\"Bearer\"}"))
            .mount(&token_server)
            .await;
        let fhir = fhir_server("https://auth.com", &format!("{}/token", token_server.uri())).await;

        let err = config().exchange_code(&fhir.uri(), "auth-code").await.unwrap_err();
        assert!(matches!(err, SmartError::TokenExchange(_)));
    }
}
