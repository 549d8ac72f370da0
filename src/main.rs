use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use orderdesk::backup::RestorePlan;
use orderdesk::cli::{self, Cli, CliError, Command};
use orderdesk::config::Config;
use orderdesk::shell;
use orderdesk::state::AppState;
use orderdesk::storage::{FileStorage, MemoryStorage, Storage};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("warning: could not load .env: {e}");
        }
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config();

    let result = if cli.ephemeral {
        run(AppState::open(MemoryStorage::new()), &config, cli.command).await
    } else {
        match FileStorage::open(&config.data_dir) {
            Ok(storage) => run(AppState::open(storage), &config, cli.command).await,
            Err(e) => Err(e.into()),
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run<S: Storage>(mut state: AppState<S>, config: &Config, command: Command) -> Result<(), CliError> {
    match command {
        Command::Shell => {
            let stdin = io::stdin();
            shell::run_shell(&mut state, config, &mut stdin.lock(), &mut io::stdout()).await
        }
        Command::Desk(command) => {
            let marker = state.logs().latest().map(|e| e.id.clone());
            let mut prompt_error = None;
            let result = {
                let mut confirm = |plan: &RestorePlan| {
                    let stdin = io::stdin();
                    match cli::ask_confirmation(&mut stdin.lock(), &mut io::stderr(), plan) {
                        Ok(answer) => answer,
                        Err(e) => {
                            prompt_error = Some(e);
                            false
                        }
                    }
                };
                cli::execute(&mut state, config, command, &mut confirm).await
            };

            let mut stderr = io::stderr();
            for entry in cli::entries_since(state.logs(), marker.as_deref()) {
                writeln!(stderr, "{}", cli::format_entry(entry))?;
            }
            if let Some(e) = prompt_error {
                return Err(e.into());
            }
            let out = result?;
            writeln!(io::stdout(), "{out}")?;
            Ok(())
        }
    }
}
