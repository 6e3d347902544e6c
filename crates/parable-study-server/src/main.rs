//! Parable Study server: entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use parable_study_server::config::{ConfigOverrides, ServerConfig};
use parable_study_server::transport::{http::ROUTES, HttpTransport};

#[derive(Parser)]
#[command(
    name = "parable-study",
    about = "Parable Study: Bible parables, verse text, and topics over HTTP",
    version
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(flatten)]
    config: ConfigOverrides,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default).
    Serve,

    /// Aggregate parables once and print the entries as JSON.
    Fetch {
        /// Group by parable and attach topics instead of listing entries.
        #[arg(long)]
        grouped: bool,
    },

    /// Parse a scripture reference and print it as JSON.
    Parse {
        /// Reference such as "Luke 15:11-32".
        reference: String,
    },

    /// Print server routes and version as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   parable-study completions bash > ~/.local/share/bash-completion/completions/parable-study
    ///   parable-study completions zsh > ~/.zfunc/_parable-study
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is normal.
    let _ = dotenv::dotenv();

    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let config = ServerConfig::resolve(cli.config)?;
            if config.api_key.is_none() {
                tracing::warn!("RAPIDAPI_KEY is not set; the parable source will likely reject requests");
            }
            tracing::info!("Topics file: {}", config.topics_file.display());
            let transport = HttpTransport::new(config.build_state(), config.cors_origin.clone());
            transport.run(&config.addr()).await?;
        }

        Commands::Fetch { grouped } => {
            let config = ServerConfig::resolve(cli.config)?;
            let state = config.build_state();
            let entries = state.aggregator.aggregate().await?;
            let output = if grouped {
                let topics = state.topics.load_topics().await?;
                serde_json::to_string_pretty(&parable_study::merge(&entries, &topics))?
            } else {
                serde_json::to_string_pretty(&entries)?
            };
            println!("{output}");
        }

        Commands::Parse { reference } => match parable_study::parse(&reference) {
            Some(parsed) => println!("{}", serde_json::to_string_pretty(&parsed)?),
            None => {
                eprintln!("Unparseable reference: {reference}");
                std::process::exit(1);
            }
        },

        Commands::Info => {
            let info = serde_json::json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
                "routes": ROUTES,
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "parable-study", &mut std::io::stdout());
        }
    }

    Ok(())
}
