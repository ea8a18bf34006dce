//! Parley CLI and HTTP proxy entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, initializes database and services, then dispatches
//! to the appropriate command handler or starts the HTTP proxy.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;
use tracing::{info, warn};

use cli::{ChatsAction, Cli, Commands, FoldersAction, UsersAction};
use http::state::ProxyState;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG overrides these
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,parley=debug",
        _ => "trace",
    };
    parley_observe::tracing_setup::init_tracing_with(cli.otel, filter)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "parley", &mut std::io::stdout());
        return Ok(());
    }

    let result = run(cli).await;
    parley_observe::tracing_setup::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = AppState::init().await?;
    let json = cli.json;

    match cli.command {
        Commands::Chat { chat, model } => {
            cli::chat::loop_runner::run_chat_loop(&state, chat, model).await?;
        }

        Commands::Chats { action } => match action {
            ChatsAction::List { sort, folder } => {
                cli::chats::list_chats(&state, sort, folder, json).await?;
            }
            ChatsAction::Rename { id, title } => {
                cli::chats::rename_chat(&state, id, &title, json).await?;
            }
            ChatsAction::Delete { id, force } => {
                cli::chats::delete_chat(&state, id, force, json).await?;
            }
            ChatsAction::Move { id, folder } => {
                cli::chats::move_chat(&state, id, folder, json).await?;
            }
        },

        Commands::Folders { action } => match action {
            FoldersAction::List => cli::folders::list_folders(&state, json).await?,
            FoldersAction::Create { name, color, icon } => {
                cli::folders::create_folder(&state, &name, color, icon, json).await?;
            }
            FoldersAction::Rename { id, name } => {
                cli::folders::rename_folder(&state, id, &name, json).await?;
            }
            FoldersAction::Delete { id, force } => {
                cli::folders::delete_folder(&state, id, force, json).await?;
            }
        },

        Commands::Models => cli::models::list_models(&state, json)?,

        Commands::Stats => cli::stats::show_stats(&state, json).await?,

        Commands::Users { action } => match action {
            UsersAction::List => cli::users::list_users(&state, json).await?,
            UsersAction::Promote { id, role } => {
                cli::users::set_role(&state, id, &role, json).await?;
            }
        },

        Commands::Serve { port, host } => {
            let proxy = ProxyState::new(state.provider()?, &state.config);

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} Parley proxy listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}/api/v1")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());
            info!(%addr, "HTTP proxy started");

            let router = http::router::build_router(proxy);
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            println!("\n  Server stopped.");
        }

        Commands::Completions { .. } => {}
    }

    state.db_pool.close().await;
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
///
/// A signal that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
