//! Provider auth CLI
//!
//! Command-line host for the session manager:
//! 1. Loads the client config (TOML + env overlay)
//! 2. Keeps tokens in a JSON file store and the session hint in the temp dir
//! 3. Prints login URLs instead of opening a browser
//! 4. Runs one session operation per invocation

mod cli;
mod config;

use anyhow::{Context, Result, bail};
use provider_auth::{ApiTransport, AuthClient, FederatedProvider};
use provider_session::{FileStore, KeyValueStore, Navigator, SessionManager};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Command, Invocation, USAGE};
use crate::config::Config;

/// Navigation for a terminal: show the URL and let the user open it.
struct StdoutNavigator;

impl Navigator for StdoutNavigator {
    fn navigate(&self, url: &str) -> provider_session::Result<()> {
        println!("Open this URL in your browser to continue:\n{url}");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr with LOG_LEVEL / RUST_LOG support; stdout is for command output
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = Invocation::parse(&args)?;
    if invocation.command == Command::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let config_path = Config::resolve_path(invocation.config_path.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        client_id = %config.client.client_id,
        api_url = %config.client.api_url,
        "configuration loaded"
    );

    let store = FileStore::load(config.storage.path.clone())
        .await
        .context("failed to open session store")?;
    let hints = FileStore::load(config.storage.session_path(&config.client.client_id))
        .await
        .context("failed to open session hint store")?;
    info!(
        store = %store.path().display(),
        hints = %hints.path().display(),
        "session stores opened"
    );
    let client = AuthClient::from_config(config.client.clone())?;
    let manager = SessionManager::new(client, store, hints, StdoutNavigator);

    run(&manager, &config, invocation.command).await
}

async fn run<T, S, N>(manager: &SessionManager<T, S, N>, config: &Config, command: Command) -> Result<()>
where
    T: ApiTransport,
    S: KeyValueStore,
    N: Navigator,
{
    match command {
        Command::Help => println!("{USAGE}"),
        Command::AuthorizeUrl => println!("{}", manager.client().authorize_url()),
        Command::Login => {
            manager.login_with_redirect()?;
        }
        Command::LoginFederated(provider) => {
            let key = match provider {
                FederatedProvider::Kakao => config.federated.kakao_key.as_ref(),
            };
            let key = key.map(|key| key.expose().as_str()).unwrap_or_default();
            manager.login_with_federated(provider, key)?;
        }
        Command::Callback(url) => match manager.complete_login(&url).await? {
            Some(_) => println!("Signed in."),
            None => bail!("login rejected: the token was not issued for this client"),
        },
        Command::WhoAmI => match manager.current_user().await? {
            Some(user) => println!("{}", serde_json::to_string_pretty(&user)?),
            None => println!("Not signed in."),
        },
        Command::Refresh => match manager.refresh_silently().await {
            Ok(Some(_)) => println!("Tokens refreshed."),
            Ok(None) => println!("No session to refresh."),
            Err(e) if e.is_rejected() => {
                warn!(error = %e, "refresh token rejected, clearing session");
                manager.logout().await?;
                bail!("refresh token rejected, signed out: {e}");
            }
            Err(e) => return Err(e.into()),
        },
        Command::Status => {
            let active = manager.check_session().await?;
            let stored = manager.stored_tokens().await?.is_some();
            println!("session started: {}", if active { "yes" } else { "no" });
            println!("tokens stored:   {}", if stored { "yes" } else { "no" });
        }
        Command::Logout => {
            manager.logout().await?;
            println!("Signed out.");
        }
    }
    Ok(())
}
