use actix_cors::Cors;
use actix_web::{web, App, HttpServer, HttpResponse, middleware, error, http::StatusCode};
use evac_rank::config::{LoggingSettings, Settings};
use evac_rank::core::Ranker;
use evac_rank::models::ErrorResponse;
use evac_rank::routes::{self, evacuations::AppState};
use evac_rank::services::CmopClient;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, error};

/// JSON error response for JSON payload errors
#[derive(Debug)]
struct JsonError(ErrorResponse);

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(&self.0)
    }
}

/// Handle JSON payload errors
fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    })
    .into()
}

/// Handle query payload errors
fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError(ErrorResponse {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    })
    .into()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    // Initialize logging from [logging], or from the environment alone when
    // the settings cannot be read
    let logging = match &settings {
        Ok(settings) => settings.logging.clone(),
        Err(_) => LoggingSettings::from_env(),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(logging.env_filter())
        .with_target(false)
        .with_level(true);

    if logging.is_pretty() {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }

    info!("Starting evacuation ranking service...");

    let settings = settings.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    let engine = settings.engine_config().map_err(|e| {
        error!("Invalid engine configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    info!("Configuration loaded successfully");

    let cmop = CmopClient::new(
        settings.cmop.api_base.clone(),
        Duration::from_secs(settings.cmop.request_timeout_secs),
    )
    .map_err(|e| {
        error!("Failed to create CMOP client: {}", e);
        std::io::Error::new(std::io::ErrorKind::Other, e.to_string())
    })?;

    info!("CMOP client initialized for {}", settings.cmop.api_base);

    let ranker = Ranker::new(engine);

    info!(
        "Ranker initialized (MASCAL threshold {}, ground speed {} km/h)",
        engine.mascal_threshold, engine.ground_speed_kmh
    );

    let app_state = AppState {
        cmop: Arc::new(cmop),
        ranker,
        poi_radius_m: settings.cmop.poi_radius_m,
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
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
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
