use std::net::SocketAddr;
use std::path::PathBuf;
use web_server::AppState;

// This main function is the entry point when running `cargo run -p web-server`.
// Paths come from the environment with the same defaults the CLI uses.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let data_dir = env_path("SIFT_DATA_DIR", "./data");
    let result_dir = env_path("SIFT_RESULT_DIR", "./result");
    let config_path = env_path("SIFT_CONFIG_PATH", "./configs.json");

    let addr = SocketAddr::from(([0, 0, 0, 0], 8000));
    web_server::run_server(addr, AppState::new(data_dir, result_dir, config_path)).await
}

fn env_path(var: &str, default: &str) -> PathBuf {
    std::env::var(var)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}
