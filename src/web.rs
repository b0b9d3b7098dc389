use crate::scheduler::RefreshScheduler;
use axum::{
    extract::State,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

type SharedScheduler = Arc<RefreshScheduler>;

pub async fn start_view_server(scheduler: SharedScheduler, port: u16) -> anyhow::Result<()> {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/", get(page_handler))
        .route("/api/page", get(page_json_handler))
        .route("/api/refresh", post(refresh_handler))
        .layer(cors)
        .with_state(scheduler);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Dashboard view listening on port {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn page_handler(State(scheduler): State<SharedScheduler>) -> Html<String> {
    Html(scheduler.render_page())
}

async fn page_json_handler(State(scheduler): State<SharedScheduler>) -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "data": scheduler.page_json()
    }))
}

async fn refresh_handler(State(scheduler): State<SharedScheduler>) -> impl IntoResponse {
    scheduler.run_once().await;
    Json(serde_json::json!({
        "success": true,
        "data": scheduler.page_json()
    }))
}
