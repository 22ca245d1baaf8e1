// Route exports
pub mod connections;

use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse};

pub use connections::AppState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(connections::health_check))
        .service(web::scope("/api").configure(connections::configure));
}

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub details: String,
    #[serde(skip)]
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.details)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "Invalid JSON".to_string(),
        details: err.to_string(),
        status_code: 400,
    }
    .into()
}

/// JSON extractor config with readable 400 responses
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(handle_json_payload_error)
}
