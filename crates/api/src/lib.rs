pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    routing::{get, post},
};
use state::AppState;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Auth routes
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/me", get(routes::auth::me));

    // Realtime room-join token
    let rtc_routes = Router::new().route("/token", post(routes::rtc::create_token));

    // Transcript ingest (one utterance per call, from the voice agent)
    let transcript_routes = Router::new().route("/", post(routes::transcript::ingest));

    // Session routes: buffer status, checkpointing and finalization
    let session_routes = Router::new()
        .route("/", get(routes::session::list))
        .route("/{session_id}", get(routes::session::get))
        .route("/{session_id}/save", post(routes::session::save))
        .route("/{session_id}/message", get(routes::session::messages))
        .route("/{session_id}/analysis", get(routes::session::analysis))
        .route("/{session_id}/end", post(routes::session::end))
        .route("/{session_id}/summary", get(routes::session::summary));

    // Per-user call history and dashboard counters
    let call_routes = Router::new().route("/recent", get(routes::call::recent));
    let dashboard_routes = Router::new().route("/stats", get(routes::call::stats));

    // Compose API
    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/rtc", rtc_routes)
        .nest("/transcript", transcript_routes)
        .nest("/session", session_routes)
        .nest("/call", call_routes)
        .nest("/dashboard", dashboard_routes);

    // Health check
    let health = Router::new().route("/health", get(routes::health::health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
