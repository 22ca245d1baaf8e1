use actix_web::{web, HttpRequest, HttpResponse, Responder};
use std::sync::Arc;
use validator::Validate;

use crate::core::{ConnectionError, ConnectionFinder};
use crate::models::{
    ConnectionsMetadata, ConnectionsRequest, ConnectionsResponse, ErrorResponse, HealthResponse,
    SearchInput, TestMessageResponse, UserProfile,
};
use crate::services::{ProfileStore, TokenVerifier};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub finder: Arc<ConnectionFinder>,
    pub profiles: Option<Arc<ProfileStore>>,
    pub tokens: Option<TokenVerifier>,
}

/// Configure AI connection routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/ai-connections", web::post().to(generate_connections))
        .route("/ai-connections", web::get().to(describe_connections))
        .route("/test-message", web::post().to(test_message));
}

/// Health check endpoint
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let status = if state.finder.is_configured() { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn error_response(err: &ConnectionError) -> HttpResponse {
    match err {
        ConnectionError::EmptyResult => HttpResponse::NotFound().json(ErrorResponse::new(
            "No connections found for the given criteria",
        )),
        _ => HttpResponse::InternalServerError().json(ErrorResponse::with_details(
            "Failed to generate AI connections",
            err.user_message(),
        )),
    }
}

/// Profile from the body, else the profile store for the authenticated user, else defaults
async fn resolve_profile(
    state: &AppState,
    http_req: &HttpRequest,
    provided: Option<UserProfile>,
    input: &SearchInput,
) -> UserProfile {
    if let Some(profile) = provided {
        return profile;
    }

    if let (Some(store), Some(tokens)) = (&state.profiles, &state.tokens) {
        let header = http_req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        if header.is_some() {
            match tokens.user_id_from_header(header) {
                Ok(user_id) => match store.get_profile(&user_id).await {
                    Ok(profile) => {
                        tracing::debug!("Loaded stored profile for user {}", user_id);
                        return profile;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load profile for {}, using defaults: {}", user_id, e);
                    }
                },
                Err(e) => tracing::warn!("Ignoring authorization header: {}", e),
            }
        }
    }

    UserProfile::synthesized(input)
}

/// Generate AI connections
///
/// POST /api/ai-connections
///
/// Request body:
/// ```json
/// {
///   "searchInput": { "company": "Google", "role": "Software Engineer", "userBio": "...", "tone": "casual", "includeFollowUps": false },
///   "userProfile": { "firstName": "Jane", "lastName": "Doe", "skills": [] },
///   "generateMessages": true
/// }
/// ```
async fn generate_connections(
    state: web::Data<AppState>,
    req: web::Json<ConnectionsRequest>,
    http_req: HttpRequest,
) -> impl Responder {
    let ConnectionsRequest {
        search_input,
        user_profile,
        generate_messages,
    } = req.into_inner();

    let search_input = match search_input {
        Some(input) => input,
        None => {
            tracing::info!("AI connections request without searchInput");
            return HttpResponse::BadRequest().json(ErrorResponse::new("Search input is required"));
        }
    };

    if let Err(errors) = search_input.validate() {
        tracing::info!("Validation failed for AI connections request: {:?}", errors);
        return HttpResponse::BadRequest().json(ErrorResponse::with_details(
            "Validation failed",
            errors.to_string(),
        ));
    }

    let profile = resolve_profile(&state, &http_req, user_profile, &search_input).await;

    tracing::info!(
        "Generating AI connections (company: {:?}, role: {:?}, tone: {}, messages: {})",
        search_input.company(),
        search_input.role(),
        search_input.tone,
        generate_messages
    );

    let connections = match state
        .finder
        .find_connections(&search_input, &profile, generate_messages)
        .await
    {
        Ok(connections) => connections,
        Err(e) => {
            tracing::error!("Error in AI connections API: {}", e);
            return error_response(&e);
        }
    };

    if connections.is_empty() {
        return error_response(&ConnectionError::EmptyResult);
    }

    let response = ConnectionsResponse {
        success: true,
        metadata: ConnectionsMetadata {
            total: connections.len(),
            generated_at: chrono::Utc::now(),
            source: "ai-generated".to_string(),
        },
        connections,
    };

    tracing::info!("Returning {} AI connections", response.metadata.total);

    HttpResponse::Ok().json(response)
}

/// Static description of the POST contract
///
/// GET /api/ai-connections
async fn describe_connections() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "AI Connections API is running",
        "endpoints": {
            "POST": "/api/ai-connections - Generate AI-based connections",
        },
        "requiredFields": {
            "searchInput": {
                "company": "string (optional)",
                "role": "string (optional)",
                "location": "string (optional)",
                "jobUrl": "string (optional)",
                "userBio": "string (required)",
                "tone": "string (formal|casual|enthusiastic|direct)",
                "includeFollowUps": "boolean",
            },
            "userProfile": {
                "firstName": "string",
                "lastName": "string",
                "age": "number",
                "location": "string",
                "education": "object",
                "skills": "string[]",
                "interests": "string[]",
                "experience": "string (optional)",
                "socialLinks": "object (optional)",
            },
            "generateMessages": "boolean (optional, default: true)",
        },
    }))
}

/// Diagnostic message generation
///
/// POST /api/test-message
async fn test_message(state: web::Data<AppState>) -> impl Responder {
    match state.finder.test_message().await {
        Ok(message) => HttpResponse::Ok().json(TestMessageResponse {
            success: true,
            message_length: message.chars().count(),
            message,
        }),
        Err(e) => {
            tracing::error!("Test message generation error: {}", e);
            HttpResponse::InternalServerError().json(ErrorResponse::with_details(
                "Message generation failed",
                e.user_message(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_codes() {
        let not_found = error_response(&ConnectionError::EmptyResult);
        assert_eq!(not_found.status(), actix_web::http::StatusCode::NOT_FOUND);

        let config = error_response(&ConnectionError::Configuration("missing key".to_string()));
        assert_eq!(config.status(), actix_web::http::StatusCode::INTERNAL_SERVER_ERROR);
    }
}
