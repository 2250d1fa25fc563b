//! Testing utilities for the launch flow
//!
//! Compiled for unit tests and, for downstream crates, behind the `testing`
//! cargo feature.
//!
//! - [`fixtures`] - Pre-built settings, sessions and controllers
//! - [`mock`] - [`FaultyStore`], a session store with injectable failures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use smartlaunch::testing::{FaultyStore, TestFixtures};
//!
//! let store = FaultyStore::new();
//! store.fail_next_retrieve();
//! let controller = TestFixtures::launch_controller("https://fhir.example", store.clone());
//! ```

pub mod fixtures;
pub mod mock;

pub use fixtures::TestFixtures;
pub use mock::FaultyStore;

/// Common test constants
pub mod constants {
    /// OAuth client id registered with the test FHIR server
    pub const TEST_CLIENT_ID: &str = "fhir_client";

    /// Redirect URL registered with the test FHIR server
    pub const TEST_REDIRECT_URL: &str = "https://redirect.com/fhir_redirect";

    /// Launch context id sent by the test EHR
    pub const TEST_LAUNCH_ID: &str = "L1";

    /// Access token issued by the test token endpoint
    pub const TEST_ACCESS_TOKEN: &str = "test-token";

    /// HMAC secret for signed-state tests
    pub const TEST_STATE_SECRET: &[u8] = b"test_state_secret_32_bytes_long_";
}
