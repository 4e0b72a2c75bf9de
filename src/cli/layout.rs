//! Layout inspection commands (`idcards layout ...`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use idcards::AppContext;

use crate::cli::utils::{find, load_store};

/// Supported `idcards layout` subcommands.
#[derive(Subcommand, Debug)]
pub enum LayoutCommand {
    /// Print the resolved card layout for one record.
    Show(LayoutShowArgs),
}

/// Arguments for `idcards layout show`.
#[derive(Args, Debug)]
pub struct LayoutShowArgs {
    /// JSON array of student/faculty records.
    #[arg(short = 'd', long = "data")]
    pub data: PathBuf,
    /// Roll number or faculty ID.
    #[arg(short = 'k', long)]
    pub key: String,
}

/// Execute a layout command.
pub fn handle(ctx: &AppContext, command: LayoutCommand) -> Result<()> {
    match command {
        LayoutCommand::Show(args) => show(ctx, args),
    }
}

fn show(ctx: &AppContext, args: LayoutShowArgs) -> Result<()> {
    let store = load_store(&args.data)?;
    let record = find(&store, &args.key)?;
    let variant = ctx.variant.pick(&record.body);
    let layout = ctx
        .layout_resolver()
        .resolve(record, variant, ctx.theme)
        .with_context(|| format!("failed to lay out {}", args.key))?;
    print!("{}", layout.describe());
    Ok(())
}
