// Centralized logging for the launch flow
use log::{debug, info, warn};

use crate::smart::{FhirToken, SmartEndpoints};

pub struct LoggingHelper;

impl LoggingHelper {
    /// Log a launch that passed issuer and launch-id validation
    pub fn log_launch_accepted(issuer_url: &str, launch_context_id: &str) {
        info!("🚀 Launch accepted from {issuer_url} (launch: {launch_context_id})");
    }

    /// Log a request turned away before any session work
    pub fn log_request_rejected(endpoint: &str, reason: &str) {
        warn!("⛔ Rejected {endpoint} request: {reason}");
    }

    /// Log session creation
    pub fn log_session_created(expires_at: &chrono::DateTime<chrono::Utc>) {
        info!("Created new session expiring at {expires_at}");
    }

    /// Log a session write after launch or token exchange
    pub fn log_session_saved(stage: &str) {
        debug!("Saved session after {stage}");
    }

    /// Log discovered endpoints
    pub fn log_discovery_resolved(issuer_url: &str, endpoints: &SmartEndpoints) {
        debug!(
            "🔍 SMART configuration for {}: authorize={}, token={}",
            issuer_url, endpoints.authorization_endpoint, endpoints.token_endpoint
        );
    }

    /// Log authorization URL building
    pub fn log_authorization_url_built(issuer_url: &str, scopes: &str) {
        info!("🔍 Built FHIR authorization URL for {issuer_url} with scopes: {scopes}");
    }

    /// Log token exchange start
    pub fn log_token_exchange_start(issuer_url: &str) {
        info!("🔄 Exchanging authorization code for tokens with {issuer_url}");
    }

    /// Log token exchange summary. Token values are never logged.
    pub fn log_token_exchange_summary(issuer_url: &str, token: &FhirToken) {
        info!(
            "🔍 Token exchange summary for {}: refresh_token={}, id_token={}, token_type={}, scope={:?}, patient={}, encounter={}, extra_claims={}",
            issuer_url,
            presence(token.refresh_token.as_ref()),
            presence(token.id_token.as_ref()),
            token.token_type,
            token.scope,
            presence(token.patient.as_ref()),
            presence(token.encounter.as_ref()),
            token.extra.len()
        );
    }
}

fn presence<T>(value: Option<&T>) -> &'static str {
    if value.is_some() {
        "present"
    } else {
        "missing"
    }
}
