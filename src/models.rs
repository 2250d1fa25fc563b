use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::smart::FhirToken;

#[derive(Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

/// Server-side record of one browser's SMART launch
///
/// The `id` is both the value of the `session` cookie and the CSRF `state`
/// round-tripped through the FHIR authorization server. It never changes after
/// creation. `issuer_url` and `launch_context_id` are filled in by `/launch`,
/// `auth_token` by `/fhir_redirect`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Session {
    id: String,
    pub expires_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launch_context_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<FhirToken>,
}

impl Session {
    /// Create an empty session with the given id and absolute expiry
    #[must_use]
    pub fn new(id: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            expires_at,
            issuer_url: None,
            launch_context_id: None,
            auth_token: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether the session is past its expiry at `now`
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Issuer that started this launch; empty values count as absent
    #[must_use]
    pub fn issuer_url(&self) -> Option<&str> {
        self.issuer_url.as_deref().filter(|s| !s.is_empty())
    }

    /// Launch context id supplied by the EHR; empty values count as absent
    #[must_use]
    pub fn launch_context_id(&self) -> Option<&str> {
        self.launch_context_id.as_deref().filter(|s| !s.is_empty())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.auth_token
            .as_ref()
            .is_some_and(|token| !token.access_token.is_empty())
    }

    /// Serialize to the stored JSON representation
    ///
    /// # Errors
    ///
    /// Returns an error if JSON serialization fails
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Rebuild a session from its stored JSON representation
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid session record
    pub fn from_bytes(data: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(data)
    }
}
