use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use quotes_api::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Run the HTTP quote service
    Serve {
        /// Address to bind, overrides the configuration
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on, overrides the configuration
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print a single quote as JSON
    Quote {
        #[arg(long = "from")]
        from: String,
        #[arg(long = "to")]
        to: String,
        #[arg(long)]
        amount: String,
    },
    /// Show the rates every source reports for a base currency
    Rates {
        #[arg(long, default_value = "USD")]
        base: String,
        /// Also store the best rates in the rate cache
        #[arg(long)]
        refresh: bool,
    },
}

impl From<Commands> for quotes_api::AppCommand {
    fn from(cmd: Commands) -> quotes_api::AppCommand {
        match cmd {
            Commands::Serve { host, port } => quotes_api::AppCommand::Serve { host, port },
            Commands::Quote { from, to, amount } => {
                quotes_api::AppCommand::Quote { from, amount, to }
            }
            Commands::Rates { base, refresh } => quotes_api::AppCommand::Rates { base, refresh },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => quotes_api::cli::setup::setup(),
        Some(cmd) => quotes_api::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
