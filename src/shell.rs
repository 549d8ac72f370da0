//! Interactive shell: one live state container driven by typed commands.
//!
//! DESIGN
//! ======
//! Each input line is split into words and parsed with the same clap
//! command tree as one-shot invocations. After every command the action log
//! entries it produced are echoed, oldest first, so the log doubles as the
//! shell's status line. Restore confirmation reads its answer from the same
//! input stream as the commands.

use std::io::{BufRead, Write};

use clap::{Parser, Subcommand};

use crate::backup::RestorePlan;
use crate::cli::{self, CliError, DeskCommand};
use crate::config::Config;
use crate::state::AppState;
use crate::storage::Storage;

const DEFAULT_LOG_LIMIT: usize = 10;

#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    #[command(flatten)]
    Desk(DeskCommand),
    /// Show the most recent action log entries, newest first.
    Log {
        #[arg(long, default_value_t = DEFAULT_LOG_LIMIT)]
        limit: usize,
    },
    /// Leave the shell.
    #[command(alias = "quit")]
    Exit,
}

/// Split a command line into words. Single and double quotes group words;
/// a backslash escapes the next character outside single quotes.
///
/// # Errors
///
/// Returns an error for an unterminated quote or a trailing backslash.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some('\''), '\'') | (Some('"'), '"') => quote = None,
            (Some('\''), _) => current.push(c),
            (_, '\\') => {
                let Some(next) = chars.next() else {
                    return Err("trailing backslash".to_owned());
                };
                current.push(next);
                in_word = true;
            }
            (Some(_), _) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, _) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

/// Read commands from `input` until EOF or `exit`.
///
/// # Errors
///
/// Returns an error only when the terminal itself fails. Command failures are
/// reported on `output` and the loop continues.
pub async fn run_shell<S: Storage, R: BufRead, W: Write>(
    state: &mut AppState<S>,
    config: &Config,
    input: &mut R,
    output: &mut W,
) -> Result<(), CliError> {
    writeln!(output, "orderdesk shell. Type `help` for commands, `exit` to leave.")?;
    let mut line = String::new();

    loop {
        write!(output, "> ")?;
        output.flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let words = match split_words(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(e) => {
                writeln!(output, "error: {e}")?;
                continue;
            }
        };
        let parsed = match ShellLine::try_parse_from(&words) {
            Ok(parsed) => parsed,
            Err(e) => {
                write!(output, "{}", e.render())?;
                continue;
            }
        };

        match parsed.command {
            ShellCommand::Exit => break,
            ShellCommand::Log { limit } => {
                for entry in state.logs().entries().take(limit) {
                    writeln!(output, "{}", cli::format_entry(entry))?;
                }
            }
            ShellCommand::Desk(command) => run_desk(state, config, command, input, output).await?,
        }
    }

    tracing::debug!(logs = state.logs().len(), "shell closed");
    Ok(())
}

async fn run_desk<S: Storage, R: BufRead, W: Write>(
    state: &mut AppState<S>,
    config: &Config,
    command: DeskCommand,
    input: &mut R,
    output: &mut W,
) -> Result<(), CliError> {
    let marker = state.logs().latest().map(|e| e.id.clone());
    let mut prompt_error = None;
    let result = {
        let mut confirm = |plan: &RestorePlan| match cli::ask_confirmation(input, output, plan) {
            Ok(answer) => answer,
            Err(e) => {
                prompt_error = Some(e);
                false
            }
        };
        cli::execute(state, config, command, &mut confirm).await
    };
    if let Some(e) = prompt_error {
        return Err(e.into());
    }

    let fresh = cli::entries_since(state.logs(), marker.as_deref());
    match result {
        Ok(out) => writeln!(output, "{out}")?,
        // Logged failures are echoed with the other fresh entries below.
        Err(e) if fresh.is_empty() => writeln!(output, "error: {e}")?,
        Err(_) => {}
    }
    for entry in fresh {
        writeln!(output, "{}", cli::format_entry(entry))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "shell_test.rs"]
mod tests;
