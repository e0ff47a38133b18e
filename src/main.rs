//! gdrive-sync - Mirror a Google Drive folder into a local directory.
//!
//! Walks the remote folder depth-first, exports native Google documents to
//! portable formats, downloads regular files that are missing or whose size
//! changed, and never deletes anything locally.
//!
//!   gdrive-sync sync <folder-url-or-id> ~/backup    # Mirror a folder
//!   gdrive-sync parse <folder-url>                  # Show the folder ID
//!   gdrive-sync config init                         # Write default config

mod application;
mod cli;
mod domain;
mod infrastructure;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use application::{
    format_report, ConsoleReporter, OutputFormat, SilentReporter, SyncEngine, SyncReporter,
};
use cli::{Cli, Commands, ConfigAction};
use domain::{parse_folder_ref, AppError, RemoteDrive};
use infrastructure::{
    config_file_path, ensure_config_exists, load_config, render_config, DriveClient,
    TokenProvider,
};

/// Exit status for `--strict` runs that had failures.
const EXIT_PARTIAL_FAILURE: i32 = 2;
/// Exit status for runs stopped by Ctrl-C or SIGTERM.
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose);

    match run(cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Main application logic. Returns the process exit status.
async fn run(cli: Cli) -> domain::Result<i32> {
    let format = cli
        .output_format()
        .map_err(|e| AppError::Config { message: e })?;

    match cli.command {
        Commands::Sync {
            folder,
            local_path,
            strict,
            quiet,
        } => {
            cmd_sync(
                &folder,
                &local_path,
                cli.config.as_deref(),
                format,
                strict,
                quiet,
            )
            .await
        }
        Commands::Parse { folder } => {
            cmd_parse(&folder)?;
            Ok(0)
        }
        Commands::Config { action } => {
            cmd_config(action, cli.config.as_deref())?;
            Ok(0)
        }
    }
}

/// Sync a remote folder into a local directory.
async fn cmd_sync(
    folder: &str,
    local_path: &Path,
    config_path: Option<&Path>,
    format: OutputFormat,
    strict: bool,
    quiet: bool,
) -> domain::Result<i32> {
    let folder_id = parse_folder_ref(folder)?;
    let local_root = resolve_local_path(local_path)?;
    let config = load_config(config_path)?;

    let tokens = Arc::new(TokenProvider::discover(&config.token_path())?);
    let client = DriveClient::new(tokens, &config.drive, &config.transfer)?;

    let root = client.get_entry(&folder_id).await?;
    if !root.is_folder() {
        return Err(AppError::NotAFolder {
            id: root.id,
            name: root.name,
        });
    }

    let show_progress = !quiet && format != OutputFormat::Json;
    if show_progress {
        println!(
            "{} {} {} {}",
            "🔄 Syncing".bold(),
            root.name.cyan().bold(),
            "→".dimmed(),
            local_root.display()
        );
        println!();
    }
    info!(folder_id = %folder_id, local_root = %local_root.display(), "Starting sync");

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal(signal_token).await;
    });

    let reporter: &dyn SyncReporter = if show_progress {
        &ConsoleReporter
    } else {
        &SilentReporter
    };

    let engine = SyncEngine::new(&client, reporter, cancel);
    let report = engine.sync(&folder_id, &local_root).await?;

    if show_progress {
        println!();
    }
    println!("{}", format_report(&report, format)?);

    if report.cancelled {
        return Ok(EXIT_INTERRUPTED);
    }
    if strict && report.stats.failed > 0 {
        return Ok(EXIT_PARTIAL_FAILURE);
    }
    Ok(0)
}

/// Print the folder ID a reference resolves to.
fn cmd_parse(folder: &str) -> domain::Result<()> {
    let id = parse_folder_ref(folder)?;
    println!("{id}");
    Ok(())
}

/// Configuration subcommands.
fn cmd_config(action: ConfigAction, config_path: Option<&Path>) -> domain::Result<()> {
    let path = config_path.map_or_else(config_file_path, Path::to_path_buf);

    match action {
        ConfigAction::Init => {
            if ensure_config_exists(&path)? {
                println!(
                    "{} Created {}",
                    "✓".green().bold(),
                    path.display()
                );
            } else {
                println!("Config already exists: {}", path.display());
            }
        }
        ConfigAction::Show => {
            let config = load_config(Some(&path))?;
            print!("{}", render_config(&config)?);
        }
        ConfigAction::Path => {
            println!("{}", path.display());
        }
    }

    Ok(())
}

/// Expand a leading `~` and make the path absolute.
fn resolve_local_path(path: &Path) -> domain::Result<PathBuf> {
    let expanded = match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .ok_or_else(|| AppError::Config {
                message: "Cannot determine home directory".to_string(),
            })?
            .join(rest),
        Err(_) => path.to_path_buf(),
    };

    if expanded.is_absolute() {
        return Ok(expanded);
    }

    let cwd = std::env::current_dir()
        .map_err(|e| AppError::io("Failed to read current directory", e))?;
    Ok(cwd.join(expanded))
}

/// Cancel `token` on Ctrl-C or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), stopping after the current entry");
        }
        () = terminate => {
            info!("Received SIGTERM, stopping after the current entry");
        }
    }

    token.cancel();
}

/// Setup tracing/logging based on verbosity level.
fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
