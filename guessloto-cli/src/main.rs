mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::CliConfig;
use guessloto_core::{GameConfig, LotoError};
use guessloto_game::GameError;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "guessloto")]
#[command(about = "Guess Loto - pay to play number guessing with a shared pot")]
#[command(version)]
struct Cli {
    /// Data directory for guesses, pot, winners and sessions
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a new session
    New,
    /// Show payment instructions, pot size and recent winners
    Paywall {
        /// Session ID
        session: Uuid,
    },
    /// Verify a payment and unlock the session
    Verify {
        /// Session ID
        session: Uuid,
        /// Wallet address the payment was sent from
        address: String,
    },
    /// Submit a guess
    Guess {
        /// Session ID
        session: Uuid,
        /// Your guess
        value: String,
    },
    /// Play interactively until you quit
    Play {
        /// Session ID
        session: Uuid,
    },
    /// Start a new round in the session
    Reset {
        /// Session ID
        session: Uuid,
    },
    /// Show the game page for a session
    Status {
        /// Session ID
        session: Uuid,
    },
    /// List known sessions
    Sessions,
    /// Show the most recent guesses from all players
    Guesses {
        #[arg(short, long, default_value_t = 50)]
        limit: usize,
    },
    /// Show past winners
    Winners {
        #[arg(short, long, default_value_t = 3)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "guessloto_cli={0},guessloto_core={0},guessloto_game={0}",
            log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli_config = CliConfig::new(cli.data_dir, cli.json);

    tracing::debug!("Using data directory {}", cli_config.data_dir.display());

    // Ensure data directory exists
    tokio::fs::create_dir_all(&cli_config.data_dir).await?;

    let result = run(cli.command, &cli_config).await;

    if let Err(e) = result {
        match e.downcast_ref::<GameError>() {
            Some(GameError::SessionNotFound(id)) => {
                eprintln!("Error: Session '{}' not found", id);
                eprintln!("Use 'guessloto sessions' to see known sessions");
            }
            Some(GameError::PaymentRequired(id)) => {
                eprintln!("Error: Session '{}' is locked", id);
                eprintln!("Pay the pot wallet, then run 'guessloto verify {} <your address>'", id);
            }
            Some(GameError::Core(LotoError::Config(msg))) => {
                eprintln!("Error: Invalid configuration: {}", msg);
                eprintln!("Set WALLET_ADDRESS and ETHERSCAN_API_KEY in the environment");
            }
            _ => match e.downcast_ref::<LotoError>() {
                Some(LotoError::Config(msg)) => {
                    eprintln!("Error: Invalid configuration: {}", msg);
                    eprintln!("Set WALLET_ADDRESS and ETHERSCAN_API_KEY in the environment");
                }
                _ => eprintln!("Error: {:#}", e),
            },
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands, cli_config: &CliConfig) -> anyhow::Result<()> {
    let config = GameConfig::from_env()?;
    let game = guessloto_game::open_game(config, &cli_config.data_dir).await?;

    match command {
        Commands::New => commands::new_session(&game, cli_config).await,
        Commands::Paywall { session } => commands::show_paywall(&game, session, cli_config).await,
        Commands::Verify { session, address } => {
            commands::verify_payment(&game, session, &address, cli_config).await
        }
        Commands::Guess { session, value } => {
            commands::submit_guess(&game, session, &value, cli_config).await
        }
        Commands::Play { session } => commands::play(&game, session).await,
        Commands::Reset { session } => commands::reset_session(&game, session, cli_config).await,
        Commands::Status { session } => commands::show_status(&game, session, cli_config).await,
        Commands::Sessions => commands::list_sessions(&game, cli_config),
        Commands::Guesses { limit } => commands::show_guesses(&game, limit, cli_config).await,
        Commands::Winners { limit } => commands::show_winners(&game, limit, cli_config).await,
    }
}
