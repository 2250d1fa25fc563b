pub mod crypto;
pub mod logging;
pub mod query;
pub mod response_builder;
