//! Record inspection commands (`idcards records ...`).

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use idcards::{AppContext, Category, RecordBody};

use crate::cli::common::SelectionArgs;
use crate::cli::utils::{find, load_store, select};

/// Supported `idcards records` subcommands.
#[derive(Subcommand, Debug)]
pub enum RecordsCommand {
    /// List records matching a category/year filter.
    List(SelectionArgs),
    /// Show one record as stored.
    Show(RecordsShowArgs),
    /// Summarize a records file.
    Stats(RecordsStatsArgs),
}

/// Arguments for `idcards records show`.
#[derive(Args, Debug)]
pub struct RecordsShowArgs {
    /// JSON array of student/faculty records.
    #[arg(short = 'd', long = "data")]
    pub data: PathBuf,
    /// Roll number or faculty ID.
    #[arg(short = 'k', long)]
    pub key: String,
}

/// Arguments for `idcards records stats`.
#[derive(Args, Debug)]
pub struct RecordsStatsArgs {
    /// JSON array of student/faculty records.
    #[arg(short = 'd', long = "data")]
    pub data: PathBuf,
}

/// Execute a records command.
pub fn handle(_ctx: &AppContext, command: RecordsCommand) -> Result<()> {
    match command {
        RecordsCommand::List(args) => list(args),
        RecordsCommand::Show(args) => show(args),
        RecordsCommand::Stats(args) => stats(args),
    }
}

fn list(args: SelectionArgs) -> Result<()> {
    let store = load_store(&args.data)?;
    let selected = select(&store, &args);
    for record in &selected {
        let extra = match &record.body {
            RecordBody::Student(s) if s.is_bus_student() => format!("{} (bus)", s.core.year),
            RecordBody::Student(s) => s.core.year.clone(),
            RecordBody::Faculty(f) => f.designation.clone(),
        };
        println!(
            "{:>4}  {:<8} {:<14} {:<32} {}",
            record.id,
            record.body.category(),
            record.body.natural_key(),
            record.body.name(),
            extra
        );
    }
    println!(
        "{} of {} records (category: {}, year: {})",
        selected.len(),
        store.len(),
        args.category,
        args.year
    );
    Ok(())
}

fn show(args: RecordsShowArgs) -> Result<()> {
    let store = load_store(&args.data)?;
    let record = find(&store, &args.key)?;
    println!("{}", serde_json::to_string_pretty(record)?);
    Ok(())
}

fn stats(args: RecordsStatsArgs) -> Result<()> {
    let store = load_store(&args.data)?;
    println!("Records: {}", store.len());
    println!("Students: {}", store.by_category(Category::Student).len());
    println!("  bus: {}", store.bus_students().len());
    println!("Faculty: {}", store.by_category(Category::Faculty).len());
    Ok(())
}
