use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use postrec::services::recommendation::ServiceStats;
use postrec::utils::validation::{validate_interaction, validate_recommendation_request};
use postrec::{init_tracing, AppState, Config};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    message: String,
}

impl<T> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: "Success".to_string(),
        }
    }

    fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateRecommendationsBody {
    user_id: String,
    limit: Option<usize>,
    #[serde(default, alias = "exclude_post_ids")]
    exclude_item_ids: HashSet<String>,
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<T>>)>;

fn api_error<T>(status: StatusCode, message: String) -> (StatusCode, Json<ApiResponse<T>>) {
    (status, Json(ApiResponse::error(message)))
}

async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<HashMap<String, String>>> {
    let mut status = HashMap::new();
    status.insert("status".to_string(), "healthy".to_string());
    status.insert("service".to_string(), "postrec-recommendation".to_string());
    status.insert("version".to_string(), env!("CARGO_PKG_VERSION").to_string());

    let source = match state.interaction_repository.ping().await {
        Ok(_) => "reachable",
        Err(e) => {
            warn!("Interaction source health probe failed: {}", e);
            "unreachable"
        }
    };
    status.insert("interaction_source".to_string(), source.to_string());

    Json(ApiResponse::success(status))
}

async fn generate_recommendations(
    State(state): State<AppState>,
    Json(body): Json<GenerateRecommendationsBody>,
) -> ApiResult<postrec::RecommendationResponse> {
    // Fall back to the configured default limit
    let request = postrec::RecommendationRequest {
        user_id: body.user_id,
        limit: body.limit.unwrap_or(state.config.recommendation.default_limit),
        exclude_item_ids: body.exclude_item_ids,
    };
    if let Err(e) = validate_recommendation_request(&request, state.config.recommendation.max_limit) {
        return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()));
    }

    match state.recommendation_service.generate_recommendations(&request).await {
        Ok(response) => Ok(Json(ApiResponse::success(response))),
        Err(e) => {
            tracing::error!("Failed to generate recommendations: {:#}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn train_model(State(state): State<AppState>) -> ApiResult<postrec::TrainingSummary> {
    match state.recommendation_service.train().await {
        Ok(summary) => Ok(Json(ApiResponse::success(summary))),
        Err(e) => {
            tracing::error!("Failed to train model: {:#}", e);
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

async fn model_stats(State(state): State<AppState>) -> Json<ApiResponse<ServiceStats>> {
    Json(ApiResponse::success(state.recommendation_service.stats()))
}

async fn record_interaction(
    State(state): State<AppState>,
    Json(interaction): Json<postrec::Interaction>,
) -> ApiResult<String> {
    if let Err(e) = validate_interaction(&interaction) {
        return Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()));
    }

    match state.recommendation_service.record_interaction(&interaction).await {
        Ok(()) => Ok(Json(ApiResponse::success("Interaction recorded successfully".to_string()))),
        Err(e) => {
            tracing::error!("Failed to record interaction: {:#}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommendations/generate", post(generate_recommendations))
        .route("/model/train", post(train_model))
        .route("/model/stats", get(model_stats))
        .route("/interactions", post(record_interaction))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
        )
        .with_state(state)
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let addr = config.server.socket_addr()?;
    // Initialize application state
    let state = AppState::new(config).await?;
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    // Load configuration
    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        info!("Config file not found, using default configuration");
        Config::default()
    };
    info!("Starting postrec recommendation server with config: {:?}", config.server);

    // Start the server on a runtime sized from config
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers)
        .enable_all()
        .build()?
        .block_on(serve(config))
}
