//! ARREMATE — Real-Estate Auction Investment Analyzer
//!
//! Entry point. Loads configuration, initialises structured logging,
//! opens the JSON stores (restoring persisted rate settings if any),
//! wires the notice extractor, and serves the API until shutdown.

use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, warn};

use arremate::config;
use arremate::extraction::gemini::GeminiClient;
use arremate::extraction::NoticeExtractor;
use arremate::server;
use arremate::server::routes::ServerState;
use arremate::storage::{self, JsonAnalysisStore, JsonUserStore};
use arremate::types::RateSettings;

const BANNER: &str = r#"
    _    ____  ____  _____ __  __    _  _____ _____
   / \  |  _ \|  _ \| ____|  \/  |  / \|_   _| ____|
  / _ \ | |_) | |_) |  _| | |\/| | / _ \ | | |  _|
 / ___ \|  _ <|  _ <| |___| |  | |/ ___ \| | | |___
/_/   \_\_| \_\_| \_\_____|_|  |_/_/   \_\_| |_____|

  Leilão Investment Analyzer
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging(&cfg);

    // Print startup banner
    println!("{BANNER}");
    info!(
        app_name = %cfg.app.name,
        data_dir = %cfg.app.data_dir,
        port = cfg.server.port,
        "ARREMATE starting up"
    );

    // -- Open stores -----------------------------------------------------

    let users = Arc::new(JsonUserStore::open(cfg.users_path())?);
    let analyses = Arc::new(JsonAnalysisStore::open(cfg.analyses_path())?);

    // Rate settings: persisted override wins over config defaults.
    let settings_path = cfg.settings_path();
    let rates = match storage::load_json::<RateSettings>(&settings_path)? {
        Some(saved) => {
            info!("Resumed persisted rate settings");
            saved
        }
        None => cfg.rates.settings(),
    };

    // -- Notice extractor ------------------------------------------------

    let extractor: Option<Arc<dyn NoticeExtractor>> = if cfg.extraction.enabled {
        let api_key = std::env::var(&cfg.extraction.api_key_env).unwrap_or_default();
        if api_key.is_empty() {
            warn!(
                env = %cfg.extraction.api_key_env,
                "No extraction API key configured — extraction will return empty results"
            );
            None
        } else {
            match cfg.extraction.provider.as_str() {
                "gemini" => {
                    info!(model = %cfg.extraction.model, "Using Gemini extraction provider");
                    Some(Arc::new(GeminiClient::new(
                        SecretString::new(api_key),
                        Some(cfg.extraction.model.clone()),
                    )?))
                }
                other => {
                    warn!(provider = other, "Unknown extraction provider — extraction disabled");
                    None
                }
            }
        }
    } else {
        info!("Extraction disabled by config");
        None
    };

    // -- Serve -----------------------------------------------------------

    let state = Arc::new(ServerState::new(
        rates,
        users,
        analyses,
        extractor,
        Some(settings_path),
    ));

    server::serve(state, cfg.server.port).await?;

    info!("ARREMATE shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging(cfg: &config::AppConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("arremate=info"));

    let json_logging = std::env::var("ARREMATE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }

    let _ = cfg;
}
