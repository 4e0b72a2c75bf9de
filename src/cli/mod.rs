//! Command-line interface wiring for the `idcards` binary.
//!
//! This module owns the clap definitions and delegates execution to
//! submodules that encapsulate each command family.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use idcards::{AppConfig, AppContext, ThemeColor, logging};

pub mod common;
pub mod export;
pub mod layout;
pub mod records;
pub mod utils;

use common::{VariantArg, ViewArg};

/// Parsed CLI entrypoint for the `idcards` binary.
#[derive(Parser, Debug)]
#[command(name = "idcards", version, about = "Institution ID card generator")]
pub struct Cli {
    /// Config file (defaults to $IDCARDS_CONFIG, then built-in defaults).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Theme color, e.g. #1e3a8a or rgb(30,58,138).
    #[arg(long, global = true)]
    pub theme: Option<String>,
    /// Card viewing mode.
    #[arg(long, global = true, default_value_t = ViewArg::Single, value_enum)]
    pub view: ViewArg,
    /// Card design; `auto` follows each record.
    #[arg(long, global = true, default_value_t = VariantArg::Auto, value_enum)]
    pub variant: VariantArg,
    /// Top-level command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// High-level command families made available to end users.
#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(subcommand)]
    Records(records::RecordsCommand),
    #[command(subcommand)]
    Layout(layout::LayoutCommand),
    #[command(subcommand)]
    Export(export::ExportCommand),
}

/// Build the session context from global flags.
fn context(cli: &Cli) -> Result<AppContext> {
    let config = AppConfig::load(cli.config.as_deref());
    logging::init_logging(&config.logging);
    let mut ctx = AppContext::new(config);
    if let Some(raw) = &cli.theme {
        ctx.theme = ThemeColor::parse(raw)?;
    }
    ctx.view_mode = cli.view.into();
    ctx.variant = cli.variant.into();
    Ok(ctx)
}

/// Execute the requested command.
pub async fn run(cli: Cli) -> Result<()> {
    let ctx = context(&cli)?;
    match cli.command {
        Command::Records(cmd) => records::handle(&ctx, cmd),
        Command::Layout(cmd) => layout::handle(&ctx, cmd),
        Command::Export(cmd) => export::handle(&ctx, cmd).await,
    }
}
