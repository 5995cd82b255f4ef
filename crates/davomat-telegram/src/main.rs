//! Davomat Telegram Bot binary.
//!
//! Start the bot with:
//! ```bash
//! TELEGRAM_BOT_TOKEN=xxx CREDENTIAL_KEY=yyy cargo run -p davomat-telegram
//! ```

use std::sync::Arc;

use clap::Parser;
use davomat_core::{
    config, required_env, AcademicService, ErpApi, ErpClient, ErpConfig, MentorDirectory,
    TokenManager, CREDENTIAL_KEY_ENV,
};
use davomat_persistence::{JsonCredentialStore, PasswordCipher};
use davomat_telegram::{parse_allowed_users, BotState, DavomatBot, ALLOWED_USERS_ENV};
use tracing_subscriber::EnvFilter;

/// Davomat Telegram Bot - timetable and attendance from the Acharya ERP
#[derive(Parser, Debug)]
#[command(name = "davomat-telegram")]
#[command(about = "Telegram bot for the Acharya ERP: today's classes, attendance, profile")]
struct Args {
    /// Comma-separated Telegram user ids allowed to use the bot
    #[arg(long, env = ALLOWED_USERS_ENV, default_value = "")]
    allowed_users: String,

    /// Verbose logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Env files first so clap sees TELEGRAM_ALLOWED_USERS from them
    config::load_env_files();
    let args = Args::parse();

    let filter = match args.verbose {
        0 => "davomat_telegram=info,davomat_core=info,teloxide=warn",
        1 => "davomat_telegram=debug,davomat_core=debug,teloxide=info",
        2 => "davomat_telegram=trace,davomat_core=trace,teloxide=debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = config::ensure_all_dirs() {
        tracing::warn!(error = %e, "Failed to create all directories");
    }

    let cipher = PasswordCipher::from_base64(&required_env(CREDENTIAL_KEY_ENV)?)?;
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

    let allowed = parse_allowed_users(&args.allowed_users);
    let state = Arc::new(BotState::new(service, allowed));
    let bot = DavomatBot::new(state)?;

    match bot.get_me().await {
        Ok(username) => {
            tracing::info!(username = %username, "Bot initialized successfully");
            println!("\n[robot] Davomat Telegram Bot");
            println!("   Bot: @{}", username);
            println!("   ERP: {}", erp_config.base_url);
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    println!("\n[phone] Open Telegram and send /start to begin");
    println!("   Press Ctrl+C to stop\n");

    bot.start_polling().await?;

    Ok(())
}
