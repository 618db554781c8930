use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;
use weekcp::{
    ApiClient, ClientConfig, ClientError, CountdownTicker, FileStore, Loading, Navigation, RouteGuard, StatusSnapshot,
    Store, UserStatus,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("token must not be empty")]
    EmptyToken,
}

#[derive(Parser, Debug)]
#[command(name = "weekcp", about = "一周CP client: user status, deadline countdown and route guard")]
struct Cli {
    /// Backend host, overriding `WEEKCP_API_HOST`.
    #[arg(long)]
    api_host: Option<String>,

    /// Store file, overriding `WEEKCP_STORE_PATH`.
    #[arg(long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print the current user state.
    Status,
    /// Follow the countdown until the deadline passes.
    Watch,
    /// Evaluate the navigation guard for a path.
    Guard { path: String },
    /// Save a bearer token.
    Login {
        #[arg(long, env = "WEEKCP_TOKEN")]
        token: String,
    },
    /// Forget the saved token.
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(host) = cli.api_host.as_deref() {
        config = config.with_api_host(host)?;
    }
    if let Some(path) = cli.store {
        config.store_path = path;
    }
    let store = Arc::new(FileStore::open(&config.store_path)?);

    match cli.command {
        Command::Status => run_status(&config, store).await,
        Command::Watch => run_watch(&config, store).await,
        Command::Guard { path } => run_guard(&config, store, &path).await,
        Command::Login { token } => run_login(store.as_ref(), &token),
        Command::Logout => {
            store.clear_token()?;
            println!("logged out");
            Ok(())
        }
    }
}

fn build_status(config: &ClientConfig, store: Arc<FileStore>) -> Result<UserStatus, CliError> {
    let api = ApiClient::new(config, store, Loading::new())?;
    Ok(UserStatus::new(Arc::new(api)))
}

fn print_snapshot(snap: &StatusSnapshot) {
    println!("state:     {}", snap.state);
    match snap.next_deadline {
        Some(deadline) => println!("deadline:  {deadline}"),
        None => println!("deadline:  -"),
    }
    println!("countdown: {}", snap.countdown.as_deref().unwrap_or("-"));
}

/// Fetch once, pointing out failures that are worth simply retrying.
async fn fetch(status: &UserStatus) -> Result<(), CliError> {
    status.fetch_state().await.map_err(|e| {
        if e.retryable() {
            eprintln!("hint: the backend may be temporarily unavailable, try again shortly");
        }
        CliError::from(e)
    })
}

async fn run_status(config: &ClientConfig, store: Arc<FileStore>) -> Result<(), CliError> {
    let status = build_status(config, store)?;
    fetch(&status).await?;
    print_snapshot(&status.snapshot());
    Ok(())
}

async fn run_watch(config: &ClientConfig, store: Arc<FileStore>) -> Result<(), CliError> {
    let status = build_status(config, store)?;
    fetch(&status).await?;

    let snap = status.snapshot();
    print_snapshot(&snap);
    if snap.next_deadline.is_none() || snap.deadline_reached {
        return Ok(());
    }

    let mut rx = status.subscribe();
    let ticker = CountdownTicker::spawn(status.clone(), config.tick_period());
    info!(tick_millis = config.tick_millis, "watching countdown");

    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);
    loop {
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = rx.borrow_and_update().clone();
                println!("{}", snap.countdown.as_deref().unwrap_or("-"));
                if snap.deadline_reached {
                    break;
                }
            }
            _ = &mut interrupted => {
                info!("interrupted");
                break;
            }
        }
    }

    ticker.stop().await;
    Ok(())
}

async fn run_guard(config: &ClientConfig, store: Arc<FileStore>, path: &str) -> Result<(), CliError> {
    let status = build_status(config, store.clone())?;
    let guard = RouteGuard::new(status, store);
    match guard.evaluate(path).await {
        Navigation::Allow => println!("allow {path}"),
        Navigation::Redirect(target) => println!("redirect {target}"),
    }
    Ok(())
}

fn run_login(store: &dyn Store, token: &str) -> Result<(), CliError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(CliError::EmptyToken);
    }
    store.set_token(token)?;
    println!("token saved");
    Ok(())
}
