//! `statusboard`: the status board in a terminal.
//!
//! Every command drives the same BFF requests the mobile shells emit,
//! then prints the resulting state.

mod board;
mod commands;

use clap::{Parser, Subcommand};
use statusboard_core::AppConfig;

/// Status board CLI.
#[derive(Parser, Debug)]
#[command(name = "statusboard", about = "Post and read short status updates")]
struct Cli {
    /// Path to config file (default: ~/.statusboard/config.toml).
    #[arg(long = "config", global = true)]
    config: Option<String>,

    /// Output format: table or json.
    #[arg(long = "output", short = 'o', global = true, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a config file interactively.
    Setup,

    /// Create an account and sign in.
    #[command(name = "sign-up")]
    SignUp {
        #[arg(long)]
        email: Option<String>,
        /// Password; prefer the interactive prompt.
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign in to an existing account.
    #[command(name = "sign-in")]
    SignIn {
        #[arg(long)]
        email: Option<String>,
        /// Password; prefer the interactive prompt.
        #[arg(long)]
        password: Option<String>,
    },

    /// End the current session.
    #[command(name = "sign-out")]
    SignOut,

    /// Show the signed-in account.
    Whoami,

    /// Show the feed, newest first.
    Feed {
        /// Keep printing as the feed changes (Ctrl-C to stop).
        #[arg(long)]
        watch: bool,
    },

    /// Post a status.
    Post {
        /// Status text.
        text: String,
        /// Attach the current location.
        #[arg(long)]
        location: bool,
        /// Attach current weather.
        #[arg(long)]
        weather: bool,
    },

    /// Show location and current weather.
    Weather {
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Show version.
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .map(std::path::PathBuf::from)
        .unwrap_or_else(AppConfig::default_path);
    let json_output = cli.output == "json";

    match cli.command {
        Commands::Setup => commands::setup::run(&config_path)?,

        Commands::SignUp { email, password } => {
            let email = match email {
                Some(e) => e,
                None => commands::prompt("Email: ")?,
            };
            let password = match password {
                Some(p) => p,
                None => {
                    let pw = rpassword::prompt_password("Password: ")?;
                    let confirm = rpassword::prompt_password("Confirm password: ")?;
                    if pw != confirm {
                        anyhow::bail!("Passwords do not match.");
                    }
                    pw
                }
            };
            commands::session::sign_up(&config_path, &email, &password).await?;
        }

        Commands::SignIn { email, password } => {
            let email = match email {
                Some(e) => e,
                None => commands::prompt("Email: ")?,
            };
            let password = match password {
                Some(p) => p,
                None => rpassword::prompt_password("Password: ")?,
            };
            commands::session::sign_in(&config_path, &email, &password).await?;
        }

        Commands::SignOut => commands::session::sign_out(&config_path).await?,

        Commands::Whoami => commands::session::whoami(&config_path, json_output).await?,

        Commands::Feed { watch } => commands::feed::show(&config_path, watch, json_output).await?,

        Commands::Post {
            text,
            location,
            weather,
        } => commands::feed::post(&config_path, &text, location, weather).await?,

        Commands::Weather { lat, lon } => {
            let at = lat.zip(lon);
            commands::weather::show(&config_path, at, json_output).await?;
        }

        Commands::Version => {
            println!("statusboard cli v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
