//! Storefront Session - CLI Entry Point
//!
//! Drives the session manager from the command line against a storefront
//! backend. Output is JSON on stdout.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use storefront_session::{
    commands,
    config::Config,
    logging, ApiClient, SecureStorage, SessionManager, SystemClock, TokenStore,
};

#[derive(Debug, Parser)]
#[command(name = "storefront-session", version, about = "Storefront session manager")]
struct Cli {
    /// Backend base URL (overrides STOREFRONT_API_URL)
    #[arg(long, env = "STOREFRONT_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Check whether the stored session is still valid
    Status {
        /// Skip the cache and ask the backend
        #[arg(long)]
        force: bool,
    },
    /// Sign in
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        full_name: String,
    },
    /// Forget the stored session
    Logout,
    /// Print the auth cache state
    CacheInfo,
    /// Print the current user after a status check
    Whoami,
    /// Keep the session fresh until Ctrl-C
    Watch,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::from_env().context("Invalid configuration")?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }

    let _log_guard = logging::init(&config.log_settings());
    info!(api = %config.api_base_url, "Storefront session starting...");

    let storage = SecureStorage::open(&config.data_dir).context("Failed to open token storage")?;
    let api = ApiClient::new(&config.api_base_url, config.http_timeout)
        .context("Failed to create HTTP client")?;

    let manager = Arc::new(SessionManager::new(
        Arc::new(api),
        TokenStore::new(Arc::new(storage)),
        Arc::new(SystemClock),
        config.session_settings(),
    ));

    match cli.command {
        Command::Status { force } => {
            let view = if force {
                commands::force_auth_check(&manager).await
            } else {
                commands::check_status(&manager).await
            };
            print_json(&view)?;
        }
        Command::Login { email, password } => {
            print_json(&commands::login(&manager, &email, &password).await)?;
        }
        Command::Register {
            email,
            password,
            full_name,
        } => {
            print_json(&commands::register(&manager, &email, &password, &full_name).await)?;
        }
        Command::Logout => print_json(&commands::logout(&manager))?,
        Command::CacheInfo => {
            commands::check_status(&manager).await;
            print_json(&commands::cache_info(&manager))?;
        }
        Command::Whoami => {
            let view = commands::check_status(&manager).await;
            print_json(&view.user)?;
        }
        Command::Watch => {
            let scheduler = manager.start_scheduler(config.check_interval);
            let mut status = manager.subscribe();
            commands::check_status(&manager).await;
            print_json(&*status.borrow_and_update())?;

            loop {
                tokio::select! {
                    changed = status.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        print_json(&*status.borrow_and_update())?;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted, shutting down");
                        break;
                    }
                }
            }
            scheduler.stop();
        }
    }

    Ok(())
}
