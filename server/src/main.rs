mod config;
mod graphql;
mod http;
mod service;

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use platform_obs::{ObsConfig, init_tracing, shutdown_tracing};
use products_pipeline::PipelineBoard;
use tracing::info;

use crate::{
    config::AppConfig,
    http::{AppState, ServeConfig},
    service::BoardHandle,
};

#[derive(Parser, Debug)]
#[command(name = "pipeline-server", version, about = "Sales pipeline board service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP + GraphQL server.
    Serve(ServeCommand),
    /// Print the board document as JSON.
    #[command(name = "board:print")]
    BoardPrint {
        #[arg(long, value_name = "FILE", help = "Board document to load instead of the demo board")]
        board: Option<PathBuf>,
    },
    /// Print the GraphQL schema snapshot.
    #[command(name = "schema:print")]
    SchemaPrint {
        #[arg(long, value_name = "FILE", help = "Destination file path")]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, value_name = "FILE", help = "Board document to load instead of the demo board")]
    board: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(ObsConfig::default())?;
    let cli = Cli::parse();
    let config = Arc::new(AppConfig::load()?);
    let result = match cli.command {
        Command::Serve(cmd) => run_server(cmd, config).await,
        Command::BoardPrint { board } => board_print(board.as_deref().or(config.board_file.as_deref())),
        Command::SchemaPrint { output } => schema_print(output),
    };
    shutdown_tracing();
    result
}

fn load_board(path: Option<&Path>) -> Result<PipelineBoard> {
    let Some(path) = path else {
        info!("no board document configured; using demo board");
        return Ok(PipelineBoard::demo());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read board document {}", path.display()))?;
    let board = PipelineBoard::from_json(&raw)
        .with_context(|| format!("invalid board document {}", path.display()))?;
    info!(
        path = %path.display(),
        stages = board.stages().len(),
        deals = board.deal_count(),
        "board document loaded"
    );
    Ok(board)
}

fn board_print(path: Option<&Path>) -> Result<()> {
    let board = load_board(path)?;
    println!("{}", board.to_json_pretty()?);
    Ok(())
}

fn schema_print(path: Option<PathBuf>) -> Result<()> {
    let sdl = graphql::sdl();
    match path {
        Some(target) => {
            std::fs::write(&target, sdl)
                .with_context(|| format!("failed to write {}", target.display()))?;
            info!(path = %target.display(), "schema snapshot written");
        }
        None => println!("{sdl}"),
    }
    Ok(())
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let path = cmd.board.as_deref().or(config.board_file.as_deref());
    let board = BoardHandle::spawn(load_board(path)?, config.queue_depth);
    let schema = graphql::build_schema(board.clone());
    let state = AppState {
        schema,
        config: config.clone(),
        board,
    };
    http::serve(ServeConfig::new(cmd.host, cmd.port), state).await
}
