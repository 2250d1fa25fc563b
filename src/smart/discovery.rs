//! SMART configuration discovery
//!
//! Resolves a FHIR server's OAuth endpoints from
//! `{issuer}/.well-known/smart-configuration`. Only `authorization_endpoint`
//! and `token_endpoint` are required; `scopes_supported` and the other optional
//! members are ignored.

use serde_json::Value;

use super::SmartError;

/// Path of the discovery document relative to the FHIR base URL
pub const SMART_CONFIG_PATH: &str = "/.well-known/smart-configuration";

const AUTHORIZATION_ENDPOINT_KEY: &str = "authorization_endpoint";
const TOKEN_ENDPOINT_KEY: &str = "token_endpoint";

/// OAuth endpoints advertised by a FHIR server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmartEndpoints {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
}

/// Discovery document URL for a FHIR base URL
#[must_use]
pub fn discovery_url(issuer_url: &str) -> String {
    format!("{}{SMART_CONFIG_PATH}", issuer_url.trim_end_matches('/'))
}

/// Fetch and parse the discovery document for `issuer_url`
///
/// # Errors
///
/// Returns [`SmartError::Discovery`] if the request fails, the status is not
/// 200, the body is not a JSON object, or either endpoint is missing or not a
/// string
pub async fn fetch_smart_endpoints(
    client: &reqwest::Client,
    issuer_url: &str,
) -> Result<SmartEndpoints, SmartError> {
    let url = discovery_url(issuer_url);
    log::debug!("Fetching SMART configuration from: {url}");

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| SmartError::Discovery(format!("failed to fetch {url}: {e}")))?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(SmartError::Discovery(format!(
            "got response code {status} when fetching smart configuration"
        )));
    }

    let document: Value = response.json().await.map_err(|e| {
        SmartError::Discovery(format!("failed to parse smart configuration JSON: {e}"))
    })?;

    parse_smart_endpoints(&document)
}

/// Extract the endpoints from a parsed discovery document
///
/// # Errors
///
/// Returns [`SmartError::Discovery`] if either endpoint is absent or not a string
pub fn parse_smart_endpoints(document: &Value) -> Result<SmartEndpoints, SmartError> {
    let endpoint = |key: &str| {
        document[key]
            .as_str()
            .map(ToString::to_string)
            .ok_or_else(|| SmartError::Discovery(format!("no {key} found in smart configuration")))
    };

    Ok(SmartEndpoints {
        authorization_endpoint: endpoint(AUTHORIZATION_ENDPOINT_KEY)?,
        token_endpoint: endpoint(TOKEN_ENDPOINT_KEY)?,
    })
}
