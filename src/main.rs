use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use outreach_ai::config::{LoggingSettings, Settings};
use outreach_ai::core::{ConnectionFinder, FinderSettings};
use outreach_ai::routes::{self, AppState};
use outreach_ai::services::{GeminiClient, ProfileStore, ProfileTables, TextGenerator, TokenVerifier};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(logging: &LoggingSettings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    init_logging(&settings.logging);

    info!("Starting Outreach AI service...");

    let gemini = GeminiClient::new(
        settings.gemini.endpoint.clone(),
        settings.gemini.api_key.clone(),
        settings.gemini.model.clone(),
        settings.gemini.timeout_secs,
    );

    if gemini.is_configured() {
        info!("Gemini client initialized (model: {})", gemini.model());
    } else {
        warn!("Gemini API key not configured; connection requests will fail until GEMINI_API_KEY is set");
    }

    let finder_settings = FinderSettings::from(&settings.generation);
    info!(
        "Connection finder initialized (batch size: {}, message delay: {}ms)",
        finder_settings.effective_batch_size(),
        finder_settings.message_delay_ms
    );
    let finder = Arc::new(ConnectionFinder::new(Arc::new(gemini), finder_settings));

    // Profile store and token verification are optional
    let profiles = settings.supabase.store_credentials().map(|(url, key)| {
        info!("Profile store enabled at {}", url);
        Arc::new(ProfileStore::new(url.to_string(), key.to_string(), ProfileTables::default()))
    });
    let tokens = settings.supabase.jwt_secret().map(TokenVerifier::new);

    if profiles.is_some() != tokens.is_some() {
        warn!("Stored profiles need both supabase credentials and a JWT secret; profile lookup disabled");
    }

    let app_state = AppState {
        finder,
        profiles,
        tokens,
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(routes::json_config())
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
