//! Davomat REST server binary.
//!
//! Start the server with:
//! ```bash
//! CREDENTIAL_KEY=xxx JWT_SECRET=yyy cargo run -p davomat-api -- --port 8000
//! ```

use std::sync::Arc;

use clap::Parser;
use davomat_api::{serve, ApiConfig, AppState, JwtConfig};
use davomat_core::{
    config, required_env, AcademicService, ErpApi, ErpClient, ErpConfig, MentorDirectory,
    TokenManager, CREDENTIAL_KEY_ENV,
};
use davomat_persistence::{JsonCredentialStore, PasswordCipher};
use tracing_subscriber::EnvFilter;

/// Davomat API - JSON proxy for the Acharya ERP
#[derive(Parser, Debug)]
#[command(name = "davomat-api")]
#[command(about = "REST proxy for the Acharya ERP with cached upstream sessions")]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = davomat_api::config::DEFAULT_HOST, env = "DAVOMAT_API_HOST")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value_t = davomat_api::config::DEFAULT_PORT, env = "DAVOMAT_API_PORT")]
    port: u16,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::load_env_files();
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "davomat_api=info,davomat_core=info,tower_http=warn",
        1 => "davomat_api=debug,davomat_core=debug,tower_http=info",
        2 => "davomat_api=trace,davomat_core=trace,tower_http=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = config::ensure_all_dirs() {
        tracing::warn!(error = %e, "Failed to create all directories");
    }

    let cipher = PasswordCipher::from_base64(&required_env(CREDENTIAL_KEY_ENV)?)?;
    let jwt = JwtConfig::from_env()?;
    let erp_config = ErpConfig::from_env()?;

    let store = Arc::new(JsonCredentialStore::open(config::credentials_file())?);
    let erp: Arc<dyn ErpApi> = Arc::new(ErpClient::new(&erp_config)?);
    let tokens = Arc::new(TokenManager::new(store, erp.clone(), cipher));
    let mentors = Arc::new(MentorDirectory::new(erp, erp_config.service_account.clone()));
    if !mentors.is_enabled() {
        tracing::info!("No ERP service account configured; mentor lookups disabled");
    }
    let service = Arc::new(AcademicService::new(
        tokens,
        mentors,
        erp_config.attendance_period.clone(),
    ));

    let state = AppState::new(ApiConfig::new(args.host, args.port), jwt, service);
    serve(state).await?;

    Ok(())
}
