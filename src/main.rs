use std::fs::File;
use std::io::{self, BufRead, IsTerminal, Write};

use clap::{Parser, Subcommand};
use log::{error, info};
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};
use tokio::net::TcpListener;

use noteterm::core::config::{self, CliOverrides, ResolvedConfig, StoreBackend};
use noteterm::server::session::SessionSettings;
use noteterm::server::Supervisor;
use noteterm::store::{self, EffectGateway, SqliteStore};
use noteterm::tui;
use noteterm::tui::theme::Theme;

const LOG_FILE: &str = "noteterm.log";

#[derive(Parser)]
#[command(name = "noteterm", version, about = "Multi-user terminal note taking")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Accept terminal sessions over TCP (default)
    Serve {
        /// Address to listen on, e.g. 0.0.0.0:2323
        #[arg(long)]
        listen: Option<String>,
        /// Storage backend
        #[arg(long, value_parser = ["sqlite", "http"])]
        store: Option<String>,
    },
    /// Run one session on this terminal
    Local {
        #[arg(long, value_parser = ["sqlite", "http"])]
        store: Option<String>,
    },
    /// Create an account in the SQLite store; the password is read from stdin
    AddUser { username: String },
}

fn init_logging(to_terminal: bool) {
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if let Ok(log_file) = File::create(LOG_FILE) {
        loggers.push(WriteLogger::new(LevelFilter::Debug, log_config.clone(), log_file));
    }
    if to_terminal {
        loggers.push(TermLogger::new(
            LevelFilter::Info,
            log_config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    let _ = CombinedLogger::init(loggers);
}

fn invalid(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, e.to_string())
}

fn resolve_config(cli: &CliOverrides) -> io::Result<ResolvedConfig> {
    let file_config = config::load_config().map_err(invalid)?;
    config::resolve(&file_config, cli).map_err(invalid)
}

fn gateway_for(config: &ResolvedConfig) -> io::Result<EffectGateway> {
    let store = store::open_store(config).map_err(invalid)?;
    info!("Using {} store", store.name());
    Ok(EffectGateway::new(store, config.effect_timeout))
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    let command = args.command.unwrap_or(Command::Serve {
        listen: None,
        store: None,
    });
    init_logging(matches!(command, Command::Serve { .. }));
    info!("noteterm {} starting up", env!("CARGO_PKG_VERSION"));

    let result = match command {
        Command::Serve { listen, store } => serve(CliOverrides { listen, store }).await,
        Command::Local { store } => local(CliOverrides { listen: None, store }).await,
        Command::AddUser { username } => add_user(&username).await,
    };
    if let Err(e) = &result {
        error!("Exiting with error: {}", e);
    }
    result
}

async fn serve(cli: CliOverrides) -> io::Result<()> {
    let config = resolve_config(&cli)?;
    let theme = Theme::from_settings(&config.theme).map_err(invalid)?;
    let gateway = gateway_for(&config)?;

    let listener = TcpListener::bind(&config.listen).await?;
    let supervisor = Supervisor::new(gateway, &config, theme);
    supervisor
        .serve(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
}

async fn local(cli: CliOverrides) -> io::Result<()> {
    let config = resolve_config(&cli)?;
    let theme = Theme::from_settings(&config.theme).map_err(invalid)?;
    let gateway = gateway_for(&config)?;
    tui::run_local(gateway, SessionSettings::from_config(&config), theme).await
}

async fn add_user(username: &str) -> io::Result<()> {
    let config = resolve_config(&CliOverrides::default())?;
    if config.store != StoreBackend::Sqlite {
        return Err(invalid("add-user only works with the sqlite store"));
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("Password for {}: ", username);
        io::stderr().flush()?;
    }
    let mut secret = String::new();
    stdin.lock().read_line(&mut secret)?;
    let secret = secret.trim_end_matches(['\r', '\n']);

    let store = SqliteStore::open(&config.sqlite_path).map_err(invalid)?;
    let id = store.add_user(username, secret).await.map_err(invalid)?;
    println!("Created user {} (id {}) in {}", username, id, store.path().display());
    Ok(())
}
