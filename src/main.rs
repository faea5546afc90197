//! Pomodoro Countdown CLI - a terminal Pomodoro timer
//!
//! This tool helps you stay focused using the Pomodoro Technique:
//! - 25 minutes of focused work
//! - 5 minutes of short break
//! - 15 minutes of long break after every 4 pomodoros

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use tokio::io::BufReader;

use pomodoro_countdown::cli::{Cli, Commands, Display, Session, SettingsCommand};
use pomodoro_countdown::settings::{default_settings_path, SettingsStore, SettingsUpdate};

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` takes precedence; otherwise `--verbose` selects `debug`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Some(Commands::Run(args)) => {
            let store = load_store(cli.settings)?;
            let session = Session::new(store, args.mode, args.auto_cycle);
            let input = BufReader::new(tokio::io::stdin());
            let summary = session.run(input, args.minutes).await?;
            tracing::info!(
                completed = summary.completed_pomodoros,
                "Session finished"
            );
        }
        Some(Commands::Settings { action }) => {
            let mut store = load_store(cli.settings)?;
            match action {
                SettingsCommand::Show => Display::show_settings(&store.settings()),
                SettingsCommand::Set(args) => {
                    let update = SettingsUpdate::from(&args);
                    if update.is_empty() {
                        bail!("変更する設定を1つ以上指定してください");
                    }
                    store
                        .set_time_setting(update)
                        .context("設定の保存に失敗しました")?;
                    Display::show_settings_saved(&store.settings());
                }
                SettingsCommand::Reset => {
                    store.reset().context("設定の保存に失敗しました")?;
                    Display::show_settings_reset();
                }
            }
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Loads the settings store from `path` or the default location.
fn load_store(path: Option<PathBuf>) -> Result<SettingsStore> {
    let path = match path {
        Some(path) => path,
        None => default_settings_path().context("設定ディレクトリが見つかりません")?,
    };
    SettingsStore::load(&path).context("設定の読み込みに失敗しました")
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
