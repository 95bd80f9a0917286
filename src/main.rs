use std::path::PathBuf;

use clap::Parser;
use mvikit::config::RuntimeConfig;
use mvikit::container::ContainerBuilder;
use mvikit::context::ExecutionContext;
use mvikit::login::{login_host, LoginIntent, LoginState, LOGIN_DELAY, VALIDATION_DELAY};
use mvikit::persist::MemoryStore;

#[derive(Parser, Debug)]
#[command(name = "mvikit-demo", about = "Run the sample login screen headless")]
struct Cli {
    /// E-mail typed into the form
    #[arg(long, default_value = "test@example.com")]
    email: String,

    /// Password typed into the form
    #[arg(long, default_value = "password")]
    password: String,

    /// Config file (default: ~/.config/mvikit/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log every state transition
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mvikit::logging::init_tracing();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::load_from(path)?,
        None => RuntimeConfig::load()?,
    };
    config.debug |= cli.debug;

    let store = MemoryStore::with_key(config.state_key.clone());
    let container = ContainerBuilder::new(LoginState::default(), ExecutionContext::current())
        .with_config(&config)
        .persist_with(store.clone())
        .build()?;
    let host = login_host(container, &config)?;

    let mut states = host.observe_state();
    let mut events = host.observe_events();
    let printer = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(state) = states.next() => tracing::info!(?state, "State"),
                Some(event) = events.next() => tracing::info!(?event, "Event"),
                else => break,
            }
        }
    });

    host.dispatch(LoginIntent::EmailChanged(cli.email))?;
    host.dispatch(LoginIntent::PasswordChanged(cli.password))?;
    tokio::time::sleep(VALIDATION_DELAY).await;

    host.dispatch(LoginIntent::LoginClicked)?;
    // A second tap while the first login is in flight is ignored.
    let repeated = host.dispatch(LoginIntent::LoginClicked)?;
    tracing::info!(dropped = repeated.is_dropped(), "Repeated login tap");

    tokio::time::timeout(LOGIN_DELAY * 2, host.context().wait_idle()).await?;
    tracing::info!(state = ?host.state(), snapshot = ?store.raw(), "Finished");

    host.shutdown();
    printer.abort();
    Ok(())
}
