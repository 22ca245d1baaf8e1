// Service exports
pub mod auth;
pub mod gemini;
pub mod profiles;

pub use auth::{AuthError, Claims, TokenVerifier};
pub use gemini::{GeminiClient, GenerationError, GenerationRequest, ResponseFormat, TextGenerator};
pub use profiles::{ProfileStore, ProfileStoreError, ProfileTables};
