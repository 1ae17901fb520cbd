pub mod hook_signature;
pub mod metrics;
pub mod security_headers;
pub mod tracing;
