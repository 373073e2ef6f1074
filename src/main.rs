use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use engine::{Orchestrator, SelectionRequest};
use market_data::CsvDataSource;
use result_store::{FsResultStore, ResultCache, ResultStore};
use selectors::SelectorCatalog;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use web_server::AppState;

/// The main entry point for the Sift selection service.
#[tokio::main]
async fn main() {
    // Load environment variables from .env file, if one exists
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => {
            if let Err(e) = handle_serve(args).await {
                eprintln!("Error running server: {}", e);
            }
        }
        Commands::Select(args) => {
            if let Err(e) = handle_select(args).await {
                eprintln!("Error during selection: {}", e);
            }
        }
        Commands::Selectors(args) => {
            if let Err(e) = handle_selectors(args) {
                eprintln!("Error listing selectors: {}", e);
            }
        }
    }
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A stock selection service with configurable selectors and cached results.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST API server.
    Serve(ServeArgs),
    /// Run the activated selectors once and print the picks.
    Select(SelectArgs),
    /// List the selectors the configuration activates.
    Selectors(SelectorsArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// The address to bind the server on.
    #[arg(long, default_value = "0.0.0.0:8000")]
    addr: SocketAddr,

    #[command(flatten)]
    paths: PathArgs,
}

#[derive(Parser)]
struct SelectArgs {
    /// The trade date to select for (format: YYYY-MM-DD). Defaults to the
    /// latest date present in the data.
    #[arg(long)]
    date: Option<NaiveDate>,

    /// Restrict the universe to these tickers (comma-separated).
    #[arg(long)]
    tickers: Option<String>,

    /// Ignore stored results and recompute.
    #[arg(long)]
    no_cache: bool,

    /// Do not persist the computed results.
    #[arg(long)]
    no_save: bool,

    #[command(flatten)]
    paths: PathArgs,
}

#[derive(Parser)]
struct SelectorsArgs {
    #[command(flatten)]
    paths: PathArgs,
}

#[derive(Parser)]
struct PathArgs {
    /// Directory of per-instrument CSV bar files.
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// Selector configuration file (JSON or TOML).
    #[arg(long, default_value = "./configs.json")]
    config: PathBuf,

    /// Directory selection results are stored under.
    #[arg(long, default_value = "./result")]
    result_dir: PathBuf,
}

// ==============================================================================
// Command Logic
// ==============================================================================

async fn handle_serve(args: ServeArgs) -> anyhow::Result<()> {
    let state = AppState::new(args.paths.data_dir, args.paths.result_dir, args.paths.config);
    web_server::run_server(args.addr, state).await
}

async fn handle_select(args: SelectArgs) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(&args.paths);

    let tickers = args.tickers.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|ticker| !ticker.is_empty())
            .map(str::to_string)
            .collect()
    });

    let request = SelectionRequest {
        trade_date: args.date,
        tickers,
        config_path: None,
        overrides: None,
        use_cache: !args.no_cache,
        save_result: !args.no_save,
    };

    let report = orchestrator.run(request).await?;

    println!("Trade date: {}", report.trade_date);
    for result in &report.results {
        println!(
            "\n{} ({}) - {} picks",
            result.alias, result.selector_name, result.count
        );
        for ticker in &result.selected {
            match result.scores.get(ticker) {
                Some(score) => println!("  {:<12} {:>12.4}", ticker, score),
                None => println!("  {}", ticker),
            }
        }
    }
    for failure in &report.failures {
        eprintln!("\n{} failed: {}", failure.class_name, failure.message);
    }
    println!("\n{}", report.message());

    Ok(())
}

fn handle_selectors(args: SelectorsArgs) -> anyhow::Result<()> {
    let orchestrator = build_orchestrator(&args.paths);
    let selectors = orchestrator.list_selectors(None)?;

    if selectors.is_empty() {
        println!("No selectors activated.");
        return Ok(());
    }
    for info in selectors {
        println!("{:<16} {:<20} {}", info.class_name, info.alias, info.description);
    }

    Ok(())
}

fn build_orchestrator(paths: &PathArgs) -> Orchestrator {
    let source = Arc::new(CsvDataSource::new(paths.data_dir.clone()));
    let store: Arc<dyn ResultStore> = Arc::new(FsResultStore::new(paths.result_dir.clone()));
    let cache = ResultCache::new(store);
    Orchestrator::new(
        source,
        cache,
        SelectorCatalog::builtin(),
        paths.config.clone(),
    )
}
