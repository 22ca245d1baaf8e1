use serde::{Deserialize, Serialize};
use crate::models::domain::PersonResult;

/// Response for the AI connections endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsResponse {
    pub success: bool,
    pub connections: Vec<PersonResult>,
    pub metadata: ConnectionsMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsMetadata {
    pub total: usize,
    #[serde(rename = "generatedAt")]
    pub generated_at: chrono::DateTime<chrono::Utc>,
    pub source: String,
}

/// Response for the test message endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestMessageResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "messageLength")]
    pub message_length: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into(), details: None }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self { error: error.into(), details: Some(details.into()) }
    }
}
