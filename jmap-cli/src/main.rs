// jmap-cli/src/main.rs
mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Config;
use jmap_rpc::{Client, ReqwestClient};
use output::{print_response, ErrorResponse, ExitCode, Response};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "jmap")]
#[command(about = "A command-line client for JMAP servers", long_about = None)]
struct Cli {
    /// Session resource URL, overriding the config file and environment
    #[arg(long, global = true)]
    session_url: Option<String>,
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the server's session: capabilities, accounts and endpoints
    Session,
    /// Send a Core/echo call and print what comes back
    Echo {
        /// Arguments as key=value; values are parsed as JSON when possible
        #[arg(value_name = "KEY=VALUE")]
        pairs: Vec<String>,
    },
    /// Upload a file as a blob
    Upload {
        /// Path to the file to upload
        path: PathBuf,
        /// Media type [default: guessed from the file name]
        #[arg(short = 't', long = "type")]
        media_type: Option<String>,
        /// Account ID [default: primary account]
        #[arg(short, long)]
        account: Option<String>,
    },
    /// Download blob content
    Download {
        /// Blob ID
        blob_id: String,
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
        /// Account ID [default: primary account]
        #[arg(short, long)]
        account: Option<String>,
        /// Media type the server should label the blob with
        #[arg(short = 't', long = "type")]
        media_type: Option<String>,
        /// File name the server should label the blob with
        #[arg(short, long)]
        name: Option<String>,
        /// Overwrite the output file if it exists
        #[arg(long)]
        force: bool,
    },
    /// Look up the JMAP session endpoints of a domain through DNS SRV
    Discover {
        /// Domain, eg example.com
        domain: String,
    },
    /// Interactive setup
    Setup,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command, cli.session_url).await {
        log::debug!("command failed: {:?}", e);
        let (error, code) = ErrorResponse::from_error(&e);
        let _ = print_response(&Response::<()>::error(error));
        std::process::exit(code.code());
    }
    std::process::exit(ExitCode::Success.code());
}

/// `warn` unless raised by `-v`; `RUST_LOG` wins over both.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Client from the config file and environment, with `--session-url` on top.
async fn connect(session_url: Option<String>) -> Result<Client<ReqwestClient>> {
    let mut config = Config::load()?;
    if let Some(url) = session_url {
        config.server.session_url = Some(url);
    }
    config.client().await
}

async fn run(command: Commands, session_url: Option<String>) -> Result<()> {
    match command {
        Commands::Setup => {
            let code = commands::run_setup().await?;
            std::process::exit(code)
        }
        Commands::Discover { domain } => commands::discover::run(&domain).await,
        Commands::Session => {
            let client = connect(session_url).await?;
            commands::session::run(&client).await
        }
        Commands::Echo { pairs } => {
            let client = connect(session_url).await?;
            commands::echo::run(&client, &pairs).await
        }
        Commands::Upload {
            path,
            media_type,
            account,
        } => {
            let client = connect(session_url).await?;
            commands::blob::upload(&client, &path, media_type.as_deref(), account.as_deref())
                .await
        }
        Commands::Download {
            blob_id,
            output,
            account,
            media_type,
            name,
            force,
        } => {
            let client = connect(session_url).await?;
            commands::blob::download(
                &client,
                commands::blob::DownloadArgs {
                    blob_id: &blob_id,
                    output: &output,
                    account: account.as_deref(),
                    media_type: media_type.as_deref(),
                    name: name.as_deref(),
                    force,
                },
            )
            .await
        }
    }
}
