//! `HireBook` command line tool
//!
//! Usage:
//! ```bash
//! hirebook summary --year 2025 --month 9
//! hirebook trash list
//! hirebook trash restore worker 3
//! hirebook backup export --output backups/
//! hirebook backup import backups/hirebook_backup_2025-09-01.json --replace
//! hirebook search workers kim
//! ```

use chrono::Datelike;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use hirebook::{
    config::{database, settings},
    core::{backup, employer, stats, timestamp, trash, worker},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// `HireBook` - bookkeeping for labor brokers
#[derive(Parser)]
#[command(name = "hirebook")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Settings file (defaults to `hirebook.toml` when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Income and expense summary for a month
    Summary {
        /// Year (defaults to the current year in KST)
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12 (defaults to the current month in KST)
        #[arg(long)]
        month: Option<u32>,
    },

    /// Inspect and maintain the trash
    Trash {
        #[command(subcommand)]
        action: TrashAction,
    },

    /// Export or import a full backup
    Backup {
        #[command(subcommand)]
        action: BackupAction,
    },

    /// Search people by name, type or note
    Search {
        #[command(subcommand)]
        target: SearchTarget,
    },
}

#[derive(Subcommand)]
enum TrashAction {
    /// List soft-deleted items, newest first
    List,
    /// Bring an item back
    Restore {
        /// employer, worker or transaction
        kind: String,
        /// Row id
        id: i64,
    },
    /// Delete one item for good
    Purge {
        /// employer, worker or transaction
        kind: String,
        /// Row id
        id: i64,
    },
    /// Delete every trashed item for good
    Empty,
}

#[derive(Subcommand)]
enum BackupAction {
    /// Write a backup JSON file
    Export {
        /// Target directory (defaults to the configured backup directory)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Load a backup JSON file
    Import {
        /// Backup file path
        path: PathBuf,
        /// Clear the database before importing
        #[arg(long)]
        replace: bool,
    },
}

#[derive(Subcommand)]
enum SearchTarget {
    /// Search workers
    Workers {
        /// Search term
        term: String,
    },
    /// Search employers
    Employers {
        /// Search term
        term: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenv().ok(); // env vars can be set externally
    let cli = Cli::parse();

    let app_config = settings::load_app_configuration(cli.config.as_deref())
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    let db = database::init_db(&app_config.database_url())
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    match cli.command {
        Commands::Summary { year, month } => run_summary(&db, year, month).await,
        Commands::Trash { action } => run_trash(&db, action).await,
        Commands::Backup { action } => run_backup(&db, &app_config, action).await,
        Commands::Search { target } => run_search(&db, target).await,
    }
}

async fn run_summary(db: &DatabaseConnection, year: Option<i32>, month: Option<u32>) -> Result<()> {
    let today = timestamp::kst_today();
    let summary = stats::monthly_summary(
        db,
        year.unwrap_or_else(|| today.year()),
        month.unwrap_or_else(|| today.month()),
    )
    .await?;

    println!("{}-{:02}", summary.year, summary.month);
    println!(
        "  income {}  expense {}  balance {}",
        summary.totals.income, summary.totals.expense, summary.totals.balance
    );
    for day in &summary.days {
        println!(
            "  {}  +{} -{} ({} entries)",
            day.date, day.totals.income, day.totals.expense, day.count
        );
    }
    for category in &summary.expense_by_category {
        println!("  expense/{}: {}", category.category, category.amount);
    }
    for category in &summary.income_by_category {
        println!("  income/{}: {}", category.category, category.amount);
    }
    Ok(())
}

async fn run_trash(db: &DatabaseConnection, action: TrashAction) -> Result<()> {
    match action {
        TrashAction::List => {
            for item in trash::list_deleted(db).await? {
                println!(
                    "{:<12} {:>6}  {}  {}",
                    item.kind, item.id, item.deleted_at, item.display_name
                );
            }
        }
        TrashAction::Restore { kind, id } => {
            trash::restore(db, kind.parse()?, id).await?;
            println!("Restored {kind} {id}");
        }
        TrashAction::Purge { kind, id } => {
            trash::permanently_delete(db, kind.parse()?, id).await?;
            println!("Permanently deleted {kind} {id}");
        }
        TrashAction::Empty => {
            let removed = trash::empty_trash(db).await?;
            println!("Removed {removed} items");
        }
    }
    Ok(())
}

async fn run_backup(
    db: &DatabaseConnection,
    app_config: &settings::AppConfig,
    action: BackupAction,
) -> Result<()> {
    match action {
        BackupAction::Export { output } => {
            let dir = output.unwrap_or_else(|| app_config.backup_dir());
            let document = backup::export_all(db).await?;
            let path = backup::write_backup(&dir, &document)?;
            println!("{}", path.display());
        }
        BackupAction::Import { path, replace } => {
            let document = backup::read_backup(&path)?;
            let report = if replace {
                backup::restore_all(db, &document).await?
            } else {
                backup::import_all(db, &document).await?
            };
            println!(
                "Imported {} employers, {} workers, {} records, {} transactions",
                report.employers, report.workers, report.records, report.transactions
            );
        }
    }
    Ok(())
}

async fn run_search(db: &DatabaseConnection, target: SearchTarget) -> Result<()> {
    match target {
        SearchTarget::Workers { term } => {
            for found in worker::search(db, &term).await? {
                println!(
                    "{:>6}  {}  {}  {}",
                    found.id, found.name, found.tel, found.nationality
                );
            }
        }
        SearchTarget::Employers { term } => {
            for found in employer::search(db, &term).await? {
                println!(
                    "{:>6}  {}  {}  {}",
                    found.id, found.name, found.tel, found.kind
                );
            }
        }
    }
    Ok(())
}
