//! Card export commands (`idcards export ...`).

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Subcommand};
use idcards::{AppContext, CardArena, Category, DirectorySink, FsPhotoLoader, Record};

use crate::cli::common::{CategoryArg, SelectionArgs};
use crate::cli::utils::{find, load_store, select};

/// Supported `idcards export` subcommands.
#[derive(Subcommand, Debug)]
pub enum ExportCommand {
    /// Download one card as `ID_Card_<key>.jpg`.
    Single(ExportSingleArgs),
    /// Download the selected cards one after another.
    Batch(ExportBatchArgs),
    /// Bundle the selected cards into one zip archive.
    Archive(ExportArchiveArgs),
    /// Save records of one category as JSON.
    Json(ExportJsonArgs),
}

/// Arguments for `idcards export single`.
#[derive(Args, Debug)]
pub struct ExportSingleArgs {
    /// JSON array of student/faculty records.
    #[arg(short = 'd', long = "data")]
    pub data: PathBuf,
    /// Roll number or faculty ID.
    #[arg(short = 'k', long)]
    pub key: String,
    /// Output directory.
    #[arg(short = 'o', long = "out", default_value = ".")]
    pub out: PathBuf,
}

/// Arguments for `idcards export batch`.
#[derive(Args, Debug)]
pub struct ExportBatchArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
    /// Output directory.
    #[arg(short = 'o', long = "out", default_value = ".")]
    pub out: PathBuf,
}

/// Arguments for `idcards export archive`.
#[derive(Args, Debug)]
pub struct ExportArchiveArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,
    /// Output directory.
    #[arg(short = 'o', long = "out", default_value = ".")]
    pub out: PathBuf,
    /// Archive file name.
    #[arg(long, default_value = "ID_Cards.zip")]
    pub name: String,
}

/// Arguments for `idcards export json`.
#[derive(Args, Debug)]
pub struct ExportJsonArgs {
    /// JSON array of student/faculty records.
    #[arg(short = 'd', long = "data")]
    pub data: PathBuf,
    /// Which records to save.
    #[arg(short = 'c', long, value_enum)]
    pub category: CategoryArg,
    /// Output directory.
    #[arg(short = 'o', long = "out", default_value = ".")]
    pub out: PathBuf,
}

/// Execute an export command.
pub async fn handle(ctx: &AppContext, command: ExportCommand) -> Result<()> {
    match command {
        ExportCommand::Single(args) => single(ctx, args).await,
        ExportCommand::Batch(args) => batch(ctx, args).await,
        ExportCommand::Archive(args) => archive(ctx, args).await,
        ExportCommand::Json(args) => json(ctx, args),
    }
}

fn loader(ctx: &AppContext) -> FsPhotoLoader {
    FsPhotoLoader::new(ctx.config.avatar.photo_dir.clone())
}

fn ensure_selected(records: &[&Record]) -> Result<()> {
    if records.is_empty() {
        return Err(anyhow!("no records match the selection"));
    }
    Ok(())
}

async fn single(ctx: &AppContext, args: ExportSingleArgs) -> Result<()> {
    let store = load_store(&args.data)?;
    let record = find(&store, &args.key)?;
    let mut arena = CardArena::new();
    let targets = ctx.prepare_cards(&[record], &mut arena, &loader(ctx))?;
    let target = targets
        .first()
        .ok_or_else(|| anyhow!("card {} was not realized", args.key))?;
    let mut sink = DirectorySink::new(&args.out);
    let mut orchestrator = ctx.orchestrator();
    let report = orchestrator
        .export_single(&mut arena, target, &mut sink)
        .await
        .with_context(|| format!("failed to export card {}", args.key))?;
    println!("{} -> {}", report.notice(), args.out.display());
    Ok(())
}

async fn batch(ctx: &AppContext, args: ExportBatchArgs) -> Result<()> {
    let store = load_store(&args.selection.data)?;
    let selected = select(&store, &args.selection);
    ensure_selected(&selected)?;
    let mut arena = CardArena::new();
    let targets = ctx.prepare_cards(&selected, &mut arena, &loader(ctx))?;
    let mut sink = DirectorySink::new(&args.out);
    let mut orchestrator = ctx.orchestrator();
    let report = orchestrator
        .export_sequential(&mut arena, &targets, &mut sink)
        .await
        .context("batch export failed")?;
    for skipped in &report.skipped {
        eprintln!("Skipped {}: {}", skipped.natural_key, skipped.reason);
    }
    println!("{} -> {}", report.notice(), args.out.display());
    Ok(())
}

async fn archive(ctx: &AppContext, args: ExportArchiveArgs) -> Result<()> {
    let store = load_store(&args.selection.data)?;
    let selected = select(&store, &args.selection);
    ensure_selected(&selected)?;
    let mut arena = CardArena::new();
    let targets = ctx.prepare_cards(&selected, &mut arena, &loader(ctx))?;
    let mut sink = DirectorySink::new(&args.out);
    let mut orchestrator = ctx.orchestrator();
    let report = orchestrator
        .export_archive(&mut arena, &targets, &args.name, &mut sink)
        .await
        .context("archive export aborted; no file was written")?;
    println!("{} -> {}", report.notice(), args.out.display());
    Ok(())
}

fn json(ctx: &AppContext, args: ExportJsonArgs) -> Result<()> {
    let store = load_store(&args.data)?;
    let category: Category = args.category.into();
    let records = store.by_category(category);
    let mut sink = DirectorySink::new(&args.out);
    let filename = ctx
        .orchestrator()
        .export_json(&records, category, &mut sink)
        .context("json export failed")?;
    println!(
        "Saved {} {} records to {}",
        records.len(),
        category,
        args.out.join(filename).display()
    );
    Ok(())
}
