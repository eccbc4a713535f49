use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use twinsync_common::{
    ensure_config, load_config, AppConfig, Category, CompareVariant, FileEntry, SessionId, Side, SyncConfig, SyncOperation,
    SyncVariant,
};
use twinsync_core::{
    detect_moved_files, redetermine_sync_directions, visit_recursively, CompareSettings, ComparisonEngine,
    FolderComparison, FolderScanner, ObjectId, SyncStatistics,
};

#[derive(Parser)]
#[command(name = "twinsync")]
#[command(author = "TwinSync Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Compare two folders and show what a synchronization would do", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare two folders and print the resolved sync plan
    Compare(CompareArgs),
    /// Write the default configuration file if none exists and print its path
    Config {
        /// Keep the configuration next to the executable
        #[arg(long)]
        portable: bool,
    },
}

#[derive(Args)]
struct CompareArgs {
    /// Left folder path
    left: PathBuf,

    /// Right folder path
    right: PathBuf,

    /// How files are compared (defaults to the configured variant)
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,

    /// Rule used to derive sync directions (defaults to the configured rule)
    #[arg(long, value_enum)]
    sync: Option<SyncArg>,

    /// Allowed modification time difference in seconds
    #[arg(long, value_name = "SECS")]
    time_tolerance: Option<i32>,

    /// Time shift to ignore, e.g. 60 for DST (can be specified multiple times)
    #[arg(long, value_name = "MINUTES")]
    ignore_time_shift: Vec<u32>,

    /// Ignore patterns (can be specified multiple times)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// Follow symbolic links
    #[arg(short = 'L', long)]
    follow_symlinks: bool,

    /// Pair up renamed files instead of copying and deleting them
    #[arg(long)]
    detect_moves: bool,

    /// Swap left and right before assigning directions
    #[arg(long)]
    flip: bool,

    /// Show only differences (hide equal items)
    #[arg(short = 'd', long)]
    diff_only: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    TimeSize,
    Content,
    Size,
}

impl From<VariantArg> for CompareVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::TimeSize => CompareVariant::TimeSize,
            VariantArg::Content => CompareVariant::Content,
            VariantArg::Size => CompareVariant::Size,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SyncArg {
    TwoWay,
    Mirror,
    Update,
}

impl From<SyncArg> for SyncVariant {
    fn from(arg: SyncArg) -> Self {
        match arg {
            SyncArg::TwoWay => SyncVariant::TwoWay,
            SyncArg::Mirror => SyncVariant::Mirror,
            SyncArg::Update => SyncVariant::Update,
        }
    }
}

fn main() {
    // Log to stderr so JSON output can go cleanly to stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compare(args) => match run_compare(args) {
            Ok(true) => std::process::exit(0),
            Ok(false) => std::process::exit(2),
            Err(e) => {
                error!("Compare failed: {:#}", e);
                std::process::exit(1);
            }
        },
        Commands::Config { portable } => {
            if let Err(e) = run_config(portable) {
                error!("Config failed: {:#}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_config(portable: bool) -> anyhow::Result<()> {
    let existed = load_config(portable)?.exists;
    let loaded = ensure_config(portable)?;
    if !existed {
        info!("Wrote default configuration");
    }
    println!("{}", loaded.path.display());
    Ok(())
}

/// Applies command line overrides on top of the loaded configuration
fn apply_overrides(config: &mut AppConfig, args: &CompareArgs) -> anyhow::Result<()> {
    config.ignore_patterns.extend(args.ignore.iter().cloned());
    config.ignored_time_shift_minutes.extend(args.ignore_time_shift.iter().copied());
    if args.follow_symlinks {
        config.follow_symlinks = true;
    }
    if args.detect_moves {
        config.detect_moves = true;
    }
    if let Some(variant) = args.variant {
        config.compare_variant = variant.into();
    }
    if let Some(sync) = args.sync {
        config.sync = SyncConfig::new(sync.into());
    }
    if let Some(tolerance) = args.time_tolerance {
        if tolerance < 0 {
            bail!("Time tolerance must not be negative: {}", tolerance);
        }
        config.file_time_tolerance = tolerance;
    }
    Ok(())
}

/// Returns whether both folders are already in sync
fn run_compare(args: CompareArgs) -> anyhow::Result<bool> {
    let loaded = load_config(false)?;
    let mut config = loaded.config;
    apply_overrides(&mut config, &args)?;

    info!("Comparing:");
    info!("  Left:  {}", args.left.display());
    info!("  Right: {}", args.right.display());

    let left_exists = check_folder(&args.left)?;
    let right_exists = check_folder(&args.right)?;
    if !left_exists && !right_exists {
        bail!(
            "Neither {} nor {} exists",
            args.left.display(),
            args.right.display()
        );
    }

    let mut left_scanner = FolderScanner::from_config(&config)?;
    let mut right_scanner = FolderScanner::from_config(&config)?;
    let left_entries = scan_side(&mut left_scanner, &args.left, left_exists)?;
    let right_entries = scan_side(&mut right_scanner, &args.right, right_exists)?;

    let settings = CompareSettings {
        filter: left_scanner.filter(),
        compare_variant: config.compare_variant,
        file_time_tolerance: config.file_time_tolerance,
        ignored_time_shift_minutes: config.ignored_time_shift_minutes.clone(),
    };
    let mut tree = FolderComparison::new();
    let base = ComparisonEngine::new(settings)
        .compare(&mut tree, &args.left, &args.right, &left_entries, &right_entries)
        .context("Comparison failed")?;

    if args.flip {
        tree.flip(base);
    }
    if config.detect_moves {
        detect_moved_files(&mut tree, base);
    }
    redetermine_sync_directions(&mut tree, base, &config.sync);

    let stats = SyncStatistics::from_root(&tree, base);
    let entries = collect_entries(&tree, base, args.diff_only);
    let (left_label, right_label) = if args.flip {
        (&args.right, &args.left)
    } else {
        (&args.left, &args.right)
    };

    if args.json {
        let report = JsonReport {
            left: left_label.to_string_lossy().to_string(),
            right: right_label.to_string_lossy().to_string(),
            session: tree.session_id(),
            generated_at: Utc::now().to_rfc3339(),
            compare_variant: config.compare_variant,
            sync_variant: config.sync.variant,
            summary: &stats,
            entries,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_text_report(left_label, right_label, &stats, &entries);
    }

    Ok(stats.is_in_sync())
}

/// A missing folder is compared as empty; anything else that is not a folder is an error
fn check_folder(path: &Path) -> anyhow::Result<bool> {
    if path.is_dir() {
        Ok(true)
    } else if path.exists() {
        bail!("Path is not a directory: {}", path.display())
    } else {
        warn!("Folder does not exist, treating it as empty: {}", path.display());
        Ok(false)
    }
}

fn scan_side(scanner: &mut FolderScanner, root: &Path, exists: bool) -> anyhow::Result<Vec<FileEntry>> {
    if !exists {
        return Ok(Vec::new());
    }
    if let Err(e) = scanner.load_gitignore(root) {
        warn!("Ignoring .gitignore files below {}: {}", root.display(), e);
    }
    let entries = scanner
        .scan(root)
        .with_context(|| format!("Failed to scan {}", root.display()))?;
    info!("Found {} entries in {}", entries.len(), root.display());
    Ok(entries)
}

#[derive(Serialize)]
struct JsonReport<'a> {
    left: String,
    right: String,
    session: SessionId,
    generated_at: String,
    compare_variant: CompareVariant,
    sync_variant: SyncVariant,
    summary: &'a SyncStatistics,
    entries: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum EntryType {
    Folder,
    File,
    Symlink,
}

#[derive(Debug, Serialize)]
struct ReportEntry {
    path: String,
    kind: EntryType,
    category: Category,
    operation: SyncOperation,
    action: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    conflict: Option<String>,
    left: Option<ReportSide>,
    right: Option<ReportSide>,
}

#[derive(Debug, Serialize)]
struct ReportSide {
    name: String,
    size: Option<u64>,
    modified: Option<String>,
}

fn format_unix_time(secs: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp(secs, 0).map(|time| time.to_rfc3339())
}

/// Flattens the tree in traversal order
fn collect_entries(tree: &FolderComparison, base: ObjectId, diff_only: bool) -> Vec<ReportEntry> {
    let entries = RefCell::new(Vec::new());
    let push = |id: ObjectId, kind: EntryType, details: &dyn Fn(Side) -> (Option<u64>, Option<i64>)| {
        let Some(obj) = tree.fs_object(id) else {
            return;
        };
        if diff_only && obj.category() == Category::Equal {
            return;
        }
        let side = |side: Side| {
            if obj.is_empty(side) {
                return None;
            }
            let (size, modified) = details(side);
            Some(ReportSide {
                name: obj.item_name(side).to_string(),
                size,
                modified: modified.and_then(format_unix_time),
            })
        };
        let operation = tree.sync_operation(id).unwrap_or(SyncOperation::DoNothing);
        entries.borrow_mut().push(ReportEntry {
            path: tree.relative_path(id, Side::Left).unwrap_or_default(),
            kind,
            category: obj.category(),
            operation,
            action: operation.description(),
            conflict: tree.sync_op_conflict(id).map(str::to_string),
            left: side(Side::Left),
            right: side(Side::Right),
        });
    };

    visit_recursively(
        tree,
        base,
        |id, _| push(id, EntryType::Folder, &|_: Side| (None, None)),
        |id, file| {
            push(id, EntryType::File, &|side: Side| {
                (Some(file.file_size(side)), Some(file.mod_time(side)))
            })
        },
        |id, link| push(id, EntryType::Symlink, &|side: Side| (None, Some(link.mod_time(side)))),
    );
    entries.into_inner()
}

fn operation_symbol(op: SyncOperation) -> &'static str {
    match op {
        SyncOperation::CreateLeft => " <+ ",
        SyncOperation::CreateRight => " +> ",
        SyncOperation::DeleteLeft => " <x ",
        SyncOperation::DeleteRight => " x> ",
        SyncOperation::MoveLeftFrom | SyncOperation::MoveLeftTo => " <m ",
        SyncOperation::MoveRightFrom | SyncOperation::MoveRightTo => " m> ",
        SyncOperation::OverwriteLeft => " <- ",
        SyncOperation::OverwriteRight => " -> ",
        SyncOperation::CopyMetadataToLeft => " <a ",
        SyncOperation::CopyMetadataToRight => " a> ",
        SyncOperation::DoNothing => " == ",
        SyncOperation::UnresolvedConflict => " ?? ",
    }
}

fn print_text_report(left: &Path, right: &Path, stats: &SyncStatistics, entries: &[ReportEntry]) {
    println!("\n{}", "=".repeat(80));
    println!("Sync Plan");
    println!("  Left:  {}", left.display());
    println!("  Right: {}", right.display());
    println!("{}", "=".repeat(80));

    for entry in entries {
        let suffix = if entry.kind == EntryType::Folder { "/" } else { "" };
        println!(
            "{} {:<12} {}{}",
            operation_symbol(entry.operation),
            entry.category.to_string(),
            entry.path,
            suffix
        );
        if let Some(conflict) = &entry.conflict {
            println!("      {}", conflict);
        }
    }

    println!("\n{}", "=".repeat(80));
    println!("Summary:");
    println!("  Items:           {}", stats.rows_total());
    for side in Side::BOTH {
        println!(
            "  {:<6} create {:>6}  update {:>6}  delete {:>6}",
            format!("{}:", side),
            stats.create_count(side),
            stats.update_count(side),
            stats.delete_count(side)
        );
    }
    println!("  Conflicts:       {}", stats.conflict_count());
    println!("  Bytes to copy:   {}", stats.bytes_to_process());
    if stats.is_in_sync() {
        println!("  Both sides are in sync");
    }
    println!("{}", "=".repeat(80));
}
