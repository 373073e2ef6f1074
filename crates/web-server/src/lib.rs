use axum::{Router, routing::get};
use engine::Orchestrator;
use market_data::CsvDataSource;
use result_store::{FsResultStore, ResultCache, ResultStore};
use selectors::SelectorCatalog;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer, ExposeHeaders},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Direct handle for the read-only result query endpoints.
    pub store: Arc<dyn ResultStore>,
    /// Kept alongside the orchestrator so the health check can report on
    /// the deployment paths.
    pub data_dir: PathBuf,
    pub config_path: PathBuf,
}

impl AppState {
    /// Wires the standard deployment: CSV bar files, filesystem result store,
    /// and the built-in selector catalog.
    pub fn new(data_dir: PathBuf, result_dir: PathBuf, config_path: PathBuf) -> Self {
        let source = Arc::new(CsvDataSource::new(data_dir.clone()));
        let store: Arc<dyn ResultStore> = Arc::new(FsResultStore::new(result_dir));
        let cache = ResultCache::new(Arc::clone(&store));
        let orchestrator = Orchestrator::new(
            source,
            cache,
            SelectorCatalog::builtin(),
            config_path.clone(),
        );

        Self {
            orchestrator,
            store,
            data_dir,
            config_path,
        }
    }
}

/// Builds the application router. Separate from `run_server` so tests can
/// drive it in-process without binding a socket.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any())
        .expose_headers(ExposeHeaders::any());

    // --- DEFINE THE APPLICATION ROUTES ---
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        .route("/selectors", get(handlers::get_selectors))
        .route(
            "/select",
            get(handlers::select_get).post(handlers::select_post),
        )
        .route("/results/dates", get(handlers::get_result_dates))
        .route("/results/:date", get(handlers::get_results_by_date))
        .route(
            "/results/:date/:selector",
            get(handlers::get_result_by_date_and_selector),
        )
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every
        // incoming request.
        .layer(TraceLayer::new_for_http())
}

/// The main function to configure and run the web server.
pub async fn run_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = app(Arc::new(state));

    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
