//! Authorization-code token exchange

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::SmartError;

/// Token response from a FHIR authorization server
///
/// Besides the standard OAuth 2.0 members this carries the SMART launch context
/// (`patient`, `encounter`). Every other member of the response is kept verbatim
/// in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FhirToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Parameters of an authorization-code grant
pub(crate) struct CodeGrant<'a> {
    pub token_endpoint: &'a str,
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
    pub code: &'a str,
}

/// POST the authorization-code grant and parse the token response
///
/// # Errors
///
/// Returns [`SmartError::TokenExchange`] on transport failure, any non-2xx
/// status, malformed JSON, or an empty `access_token`
pub(crate) async fn exchange_code(
    client: &reqwest::Client,
    grant: CodeGrant<'_>,
) -> Result<FhirToken, SmartError> {
    let params = [
        ("grant_type", "authorization_code"),
        ("code", grant.code),
        ("redirect_uri", grant.redirect_uri),
        ("client_id", grant.client_id),
    ];

    let response = client
        .post(grant.token_endpoint)
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&params)
        .send()
        .await
        .map_err(|e| SmartError::TokenExchange(format!("failed to exchange code for token: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(SmartError::TokenExchange(format!(
            "token exchange failed with status {status}: {error_text}"
        )));
    }

    let response_text = response
        .text()
        .await
        .map_err(|e| SmartError::TokenExchange(format!("failed to read token response: {e}")))?;

    parse_token_response(&response_text)
}

/// Parse a token response body
///
/// # Errors
///
/// Returns [`SmartError::TokenExchange`] if the body is not a token object or
/// has an empty `access_token`
pub fn parse_token_response(body: &str) -> Result<FhirToken, SmartError> {
    let token: FhirToken = serde_json::from_str(body)
        .map_err(|e| SmartError::TokenExchange(format!("failed to parse token response: {e}")))?;
    if token.access_token.is_empty() {
        return Err(SmartError::TokenExchange(
            "token response has an empty access_token".to_string(),
        ));
    }
    Ok(token)
}
