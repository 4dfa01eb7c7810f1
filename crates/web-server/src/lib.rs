use axum::{routing::get, Router};
use configuration::ServerSettings;
use database::RepoStore;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
///
/// Handlers talk to the store through the `RepoStore` trait object, so the
/// server can run against live Postgres while tests drive the same router
/// with an in-memory stub.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RepoStore>,
    pub server: ServerSettings,
}

/// Builds the full application router: every API route nested under the
/// configured version prefix, plus a bare `/health` probe outside it.
///
/// Separated from `run_server` so tests can drive the router directly with
/// `tower::ServiceExt::oneshot` instead of a real socket.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    // --- DEFINE THE APPLICATION ROUTES ---
    let api = Router::new()
        .route("/giants-project/repos", get(handlers::get_repo_names))
        .route(
            "/giants-project/status/:repo_id",
            get(handlers::get_repo_status),
        )
        .route(
            "/giants-project/test1/:repo_id",
            get(handlers::get_recent_issue_counts),
        )
        .route("/repos", get(handlers::get_repo_overviews))
        .route(
            "/repo-groups/:repo_group_id/repos",
            get(handlers::get_group_repos),
        )
        .route("/owner/:owner/name/:repo", get(handlers::get_repo_by_git_name))
        .route(
            "/rg-name/:rg_name/repo-name/:repo_name",
            get(handlers::get_repo_by_group_and_name),
        )
        .route("/rg-name/:rg_name", get(handlers::get_group_by_name))
        .route("/dosocs/repos", get(handlers::get_checkout_paths))
        .route(
            "/repo-groups/:repo_group_id/get-issues",
            get(handlers::get_group_issues),
        )
        .route("/repos/:repo_id/get-issues", get(handlers::get_repo_issues))
        .route("/api-port", get(handlers::get_api_port));

    Router::new()
        .nest(&state.server.api_prefix, api)
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// The main function to configure and run the web server.
pub async fn run_server(
    settings: ServerSettings,
    store: Arc<dyn RepoStore>,
) -> anyhow::Result<()> {
    let addr = settings.bind_addr();
    let state = Arc::new(AppState {
        store,
        server: settings,
    });
    let app = build_router(state);

    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr.as_str()).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
