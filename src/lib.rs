//! Outreach AI - networking connection and outreach message generation
//!
//! Generates candidate connections for a target company or role with a hosted
//! text-generation model, repairs and parses the model's JSON output, and
//! attaches a personalized message to every candidate.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{repair_json, parse_connections, ConnectionError, ConnectionFinder, FinderSettings, RepairError};
pub use models::{GeneratedConnection, PersonResult, SearchInput, Tone, UserProfile};
pub use services::{GeminiClient, GenerationError, GenerationRequest, TextGenerator};
