//! Command-line surface shared by one-shot invocations and the shell.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use crate::activity::{ActionLog, LogEntry, LogKind};
use crate::backup::{self, BackupError, RestorePlan};
use crate::config::Config;
use crate::model::OrderStatus;
use crate::services::customer::{self, CustomerError, CustomerPatch, NewCustomer};
use crate::services::order::{self, OrderError, OrderLine};
use crate::services::product::{self, NewProduct, ProductError, ProductPatch};
use crate::state::{AppState, RestoreOutcome};
use crate::storage::{Storage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Product(#[from] ProductError),
    #[error(transparent)]
    Customer(#[from] CustomerError),
    #[error(transparent)]
    Order(#[from] OrderError),
    #[error(transparent)]
    Backup(#[from] BackupError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("terminal io failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "orderdesk", version, about = "Local order, product and customer book")]
pub struct Cli {
    /// Directory holding the stored collections.
    #[arg(long, env = "ORDERDESK_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory receiving exported backups.
    #[arg(long, env = "ORDERDESK_BACKUP_DIR")]
    pub backup_dir: Option<PathBuf>,

    /// Leading part of backup file names.
    #[arg(long, env = "ORDERDESK_BACKUP_PREFIX")]
    pub backup_prefix: Option<String>,

    /// Keep everything in memory; nothing is read from or written to disk.
    #[arg(long, default_value_t = false)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Resolve flags (or their environment variables) into a full config.
    #[must_use]
    pub fn config(&self) -> Config {
        Config::resolve(self.data_dir.clone(), self.backup_dir.clone(), self.backup_prefix.clone())
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(flatten)]
    Desk(DeskCommand),
    /// Read commands from stdin against one live session.
    Shell,
}

/// Commands that operate on the state container.
#[derive(Subcommand, Debug)]
pub enum DeskCommand {
    Product(ProductCommand),
    Customer(CustomerCommand),
    Order(OrderCommand),
    Backup(BackupCommand),
}

// =============================================================================
// PRODUCT
// =============================================================================

#[derive(Args, Debug)]
pub struct ProductCommand {
    #[command(subcommand)]
    pub command: ProductSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ProductSubcommand {
    List,
    Add {
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(long, default_value = "")]
        unit: String,
        #[arg(long)]
        stock: Option<u32>,
        #[arg(long, default_value = "")]
        description: String,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        unit: Option<String>,
        #[arg(long, conflicts_with = "untracked")]
        stock: Option<u32>,
        /// Stop tracking stock for this product.
        #[arg(long, default_value_t = false)]
        untracked: bool,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        id: String,
    },
}

// =============================================================================
// CUSTOMER
// =============================================================================

#[derive(Args, Debug)]
pub struct CustomerCommand {
    #[command(subcommand)]
    pub command: CustomerSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CustomerSubcommand {
    List,
    Add {
        name: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    Delete {
        id: String,
    },
}

// =============================================================================
// ORDER
// =============================================================================

#[derive(Args, Debug)]
pub struct OrderCommand {
    #[command(subcommand)]
    pub command: OrderSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum OrderSubcommand {
    List {
        #[arg(long)]
        status: Option<OrderStatus>,
    },
    Create {
        customer_id: String,
        /// `PRODUCT_ID[:QTY]`, repeatable.
        #[arg(required = true, num_args = 1..)]
        items: Vec<OrderLine>,
        #[arg(long, default_value = "")]
        note: String,
    },
    Status {
        id: String,
        status: OrderStatus,
    },
    Delete {
        id: String,
    },
    Summary,
}

// =============================================================================
// BACKUP
// =============================================================================

#[derive(Args, Debug)]
pub struct BackupCommand {
    #[command(subcommand)]
    pub command: BackupSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum BackupSubcommand {
    /// Write every collection to a date-stamped JSON file.
    Export {
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Replace every collection with the contents of a backup file.
    Restore {
        file: PathBuf,
        /// Skip the confirmation prompt.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

// =============================================================================
// EXECUTION
// =============================================================================

/// Run one command and return what should be printed on stdout.
///
/// # Errors
///
/// Returns service validation errors, backup failures and output encoding
/// failures. Each error is also recorded in the action log.
pub async fn execute<S: Storage>(
    state: &mut AppState<S>,
    config: &Config,
    command: DeskCommand,
    confirm: &mut dyn FnMut(&RestorePlan) -> bool,
) -> Result<String, CliError> {
    let result = dispatch(state, config, command, confirm).await;
    // Backup paths record their own failures.
    if let Err(e @ (CliError::Product(_) | CliError::Customer(_) | CliError::Order(_))) = &result {
        state.log(e.to_string(), LogKind::Error);
    }
    result
}

async fn dispatch<S: Storage>(
    state: &mut AppState<S>,
    config: &Config,
    command: DeskCommand,
    confirm: &mut dyn FnMut(&RestorePlan) -> bool,
) -> Result<String, CliError> {
    match command {
        DeskCommand::Product(cmd) => run_product(state, cmd.command),
        DeskCommand::Customer(cmd) => run_customer(state, cmd.command),
        DeskCommand::Order(cmd) => run_order(state, cmd.command),
        DeskCommand::Backup(cmd) => run_backup(state, config, cmd.command, confirm).await,
    }
}

fn run_product<S: Storage>(state: &mut AppState<S>, command: ProductSubcommand) -> Result<String, CliError> {
    match command {
        ProductSubcommand::List => to_json(state.products()),
        ProductSubcommand::Add { name, price, unit, stock, description } => {
            let created = product::add_product(state, NewProduct { name, price, unit, stock, description })?;
            to_json(&created)
        }
        ProductSubcommand::Update { id, name, price, unit, stock, untracked, description } => {
            let stock = if untracked { Some(None) } else { stock.map(Some) };
            let patch = ProductPatch { name, price, unit, stock, description };
            to_json(&product::update_product(state, &id, patch)?)
        }
        ProductSubcommand::Delete { id } => to_json(&product::delete_product(state, &id)?),
    }
}

fn run_customer<S: Storage>(state: &mut AppState<S>, command: CustomerSubcommand) -> Result<String, CliError> {
    match command {
        CustomerSubcommand::List => to_json(state.customers()),
        CustomerSubcommand::Add { name, phone, address, note } => {
            to_json(&customer::add_customer(state, NewCustomer { name, phone, address, note })?)
        }
        CustomerSubcommand::Update { id, name, phone, address, note } => {
            let patch = CustomerPatch { name, phone, address, note };
            to_json(&customer::update_customer(state, &id, patch)?)
        }
        CustomerSubcommand::Delete { id } => to_json(&customer::delete_customer(state, &id)?),
    }
}

fn run_order<S: Storage>(state: &mut AppState<S>, command: OrderSubcommand) -> Result<String, CliError> {
    match command {
        OrderSubcommand::List { status } => {
            let orders: Vec<_> = state.orders().iter().filter(|o| status.is_none_or(|s| o.status == s)).collect();
            to_json(&orders)
        }
        OrderSubcommand::Create { customer_id, items, note } => {
            to_json(&order::create_order(state, &customer_id, &items, &note)?)
        }
        OrderSubcommand::Status { id, status } => to_json(&order::set_order_status(state, &id, status)?),
        OrderSubcommand::Delete { id } => to_json(&order::delete_order(state, &id)?),
        OrderSubcommand::Summary => to_json(&order::order_summary(state)),
    }
}

async fn run_backup<S: Storage>(
    state: &mut AppState<S>,
    config: &Config,
    command: BackupSubcommand,
    confirm: &mut dyn FnMut(&RestorePlan) -> bool,
) -> Result<String, CliError> {
    match command {
        BackupSubcommand::Export { dir } => {
            let dir = dir.unwrap_or_else(|| config.backup_dir.clone());
            let path = state.export_backup(&dir, &config.backup_prefix)?;
            Ok(path.display().to_string())
        }
        BackupSubcommand::Restore { file, yes } => {
            let text = match backup::read_backup_file(&file).await {
                Ok(text) => text,
                Err(e) => {
                    state.log(format!("Could not read backup file: {e}"), LogKind::Error);
                    return Err(e.into());
                }
            };
            let outcome = state.restore_backup(&text, |plan| yes || confirm(plan));
            match outcome {
                RestoreOutcome::Restored { skipped } => Ok(format!(
                    "restored {} products, {} customers, {} orders ({skipped} skipped)",
                    state.products().len(),
                    state.customers().len(),
                    state.orders().len()
                )),
                RestoreOutcome::Declined => Ok("restore cancelled".to_owned()),
                RestoreOutcome::Rejected(e) => Err(e.into()),
            }
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

// =============================================================================
// TERMINAL HELPERS
// =============================================================================

/// Ask for destructive confirmation. Anything but `y`/`yes` declines.
///
/// # Errors
///
/// Returns an error if the prompt cannot be written or the answer read.
pub fn ask_confirmation<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    plan: &RestorePlan,
) -> Result<bool, std::io::Error> {
    let c = &plan.collections;
    write!(
        output,
        "Restore backup with {} products, {} customers, {} orders? This overwrites all current data. [y/N] ",
        c.products.len(),
        c.customers.len(),
        c.orders.len()
    )?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Log entries pushed after the entry with id `since` (all of them if `None`),
/// oldest first.
#[must_use]
pub fn entries_since<'a>(log: &'a ActionLog, since: Option<&str>) -> Vec<&'a LogEntry> {
    let mut fresh: Vec<&LogEntry> = log.entries().take_while(|e| Some(e.id.as_str()) != since).collect();
    fresh.reverse();
    fresh
}

#[must_use]
pub fn format_entry(entry: &LogEntry) -> String {
    format!("[{}] {}", entry.kind.as_str(), entry.message)
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
