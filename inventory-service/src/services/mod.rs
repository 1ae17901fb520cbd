pub mod genai;
pub mod identity;
pub mod metrics;
pub mod store;

pub use genai::GeminiClient;
pub use identity::{IdentityVerifier, JwtVerifier, VerifiedIdentity, VerifyError};
pub use metrics::{get_metrics, init_metrics};
pub use store::{DocumentStore, MemoryStore, MongoStore, StoreError};
