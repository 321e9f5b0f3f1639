use anyhow::Context;
use clap::Parser;
use owo_colors::{OwoColorize, Style};
use std::sync::Arc;
use tasklane_core::error::CoreError;
use tasklane_core::gateway::{GatewayError, SqliteGateway};
use tasklane_core::models::UserSession;
use tasklane_core::store::TaskStore;
use tasklane_core::timezone::today_in;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod util;
mod views;

#[tokio::main]
async fn main() {
    // Quiet by default; RUST_LOG=debug shows every remote call.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .init();

    let cli = cli::Cli::parse();

    if let Err(e) = run(cli).await {
        handle_error(e);
        std::process::exit(1);
    }
}

async fn run(cli: cli::Cli) -> anyhow::Result<()> {
    let config = config::Config::new().context("Failed to load configuration")?;
    let today = today_in(config.timezone()?);

    let gateway = SqliteGateway::open(&config.database_path).await?;
    let store = TaskStore::new(Arc::new(gateway), config.store_config());
    store.init(UserSession::new(config.user.as_str())).await?;

    let result = match cli.command {
        cli::Commands::Add(command) => commands::add::add_task(&store, command).await,
        cli::Commands::List(command) => commands::list::list_tasks(&store, command, &config, today),
        cli::Commands::Done(command) => commands::done::toggle_task(&store, command).await,
        cli::Commands::Edit(command) => commands::edit::edit_task(&store, command).await,
        cli::Commands::Delete(command) => commands::delete::delete_task(&store, command).await,
        cli::Commands::Tag(command) => commands::tag::tag_command(&store, command).await,
        cli::Commands::Notify(command) => commands::notify::due_notifications(&store, command, today),
        cli::Commands::Import(command) => commands::import::import_task(&store, command).await,
        cli::Commands::Stats => commands::stats::show_stats(&store),
    };

    store.teardown();
    result
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    if let Some(core_error) = err.downcast_ref::<CoreError>() {
        match core_error {
            CoreError::NotFound(s) => {
                eprintln!("{} {}", "Error:".style(error_style), s);
            }
            CoreError::AmbiguousId(tasks) => {
                eprintln!("{}", "Error: Ambiguous ID.".style(error_style));
                eprintln!("Did you mean one of these?");
                for (id, title) in tasks {
                    eprintln!("  {} ({})", id.yellow(), title);
                }
            }
            CoreError::InvalidInput(s) => {
                eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
            }
            CoreError::InvalidTag(tag) => {
                eprintln!(
                    "{} Tag '{}' does not exist. Create it with `tasklane tag add {}`.",
                    "Error:".style(error_style),
                    tag.yellow(),
                    tag
                );
            }
            CoreError::ProtectedTag(tag) => {
                eprintln!(
                    "{} The '{}' tag cannot be removed.",
                    "Error:".style(error_style),
                    tag.yellow()
                );
            }
            CoreError::Remote(GatewayError::Timeout(after)) => {
                eprintln!(
                    "{} The store did not answer within {:?}; the change was undone.",
                    "Error:".style(error_style),
                    after
                );
            }
            CoreError::Remote(remote) => {
                eprintln!(
                    "{} The change was undone: {}",
                    "Error:".style(error_style),
                    remote
                );
            }
            _ => eprintln!("{} {}", "Error:".style(error_style), err),
        }
    } else {
        eprintln!("{} {:#}", "Error:".style(error_style), err);
    }
}
