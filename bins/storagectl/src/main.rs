//! Storage maintenance for Pinboard.
//!
//! Usage:
//!   storagectl check                         - Report broken rows and orphaned objects
//!   storagectl repair-rows   [--confirm DELETE]
//!   storagectl purge-orphans [--confirm DELETE]
//!   storagectl repair-all    [--confirm DELETE]
//!   storagectl migrate --legacy-root <dir> [--verify-checksum]
//!
//! Destructive commands prompt for `DELETE` unless `--confirm` is given.
//! Concurrent runs against the same database and bucket are not guarded.

mod output;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pinboard_core::consistency::{CONFIRMATION_TOKEN, Confirmation, ConsistencyChecker};
use pinboard_core::migration::LegacyMigrator;
use pinboard_core::storage::{
    ObjectStore, StorageConfig, StorageProvider, StorageService, build_store,
};
use pinboard_db::{ImageRepository, connect};
use pinboard_shared::AppConfig;

use output::{MigrateOutput, OutputFormat, RepairOutput, emit};

/// Pinboard storage maintenance.
#[derive(Parser)]
#[command(
    name = "storagectl",
    version,
    about = "Check and repair links between image rows and stored files"
)]
struct Cli {
    /// Output format (text, json).
    #[arg(short = 'f', long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Dry run: list broken rows and orphaned objects.
    Check,
    /// Delete image rows whose file is missing.
    RepairRows(ConfirmArgs),
    /// Delete stored objects no image row references.
    PurgeOrphans(ConfirmArgs),
    /// Delete broken rows, then orphaned objects.
    RepairAll(ConfirmArgs),
    /// Copy files from a legacy filesystem store into the configured store.
    Migrate {
        /// Root directory of the legacy media store.
        #[arg(long, value_name = "DIR")]
        legacy_root: PathBuf,
        /// Compare SHA-256 digests before trusting files already migrated.
        #[arg(long)]
        verify_checksum: bool,
    },
}

#[derive(Args)]
struct ConfirmArgs {
    /// Skip the prompt. The value must be `DELETE`.
    #[arg(long, value_name = "WORD")]
    confirm: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout stays parseable with --format json
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pinboard=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    let store = build_store(&config.storage).context("Failed to initialize object storage")?;
    let repo = Arc::new(ImageRepository::new(db));

    let descriptor = store.describe();
    info!(
        provider = descriptor.provider,
        bucket = %descriptor.bucket,
        endpoint = ?descriptor.endpoint,
        "Using object storage"
    );

    match cli.command {
        Command::Check => {
            let report = ConsistencyChecker::new(store, repo).check().await?;
            emit(&report, cli.format)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::RepairRows(args) => {
            repair(store, repo, &args, RepairScope::Rows, cli.format).await
        }
        Command::PurgeOrphans(args) => {
            repair(store, repo, &args, RepairScope::Orphans, cli.format).await
        }
        Command::RepairAll(args) => {
            repair(store, repo, &args, RepairScope::All, cli.format).await
        }
        Command::Migrate {
            legacy_root,
            verify_checksum,
        } => migrate(store, repo, legacy_root, verify_checksum, cli.format).await,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum RepairScope {
    Rows,
    Orphans,
    All,
}

async fn repair(
    store: Arc<dyn ObjectStore>,
    repo: Arc<ImageRepository>,
    args: &ConfirmArgs,
    scope: RepairScope,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    let checker = ConsistencyChecker::new(store, repo);
    let report = checker.check().await?;
    let mut output = RepairOutput::new(report);

    if scope != RepairScope::Orphans {
        let count = output.report.broken.len();
        if count == 0 {
            output.broken_rows = Some(Default::default());
        } else if let Some(confirmed) =
            confirm(args, &format!("delete {count} broken image row(s)"))?
        {
            output.broken_rows = Some(checker.repair_broken(&output.report, confirmed).await);
        }
    }

    if scope != RepairScope::Rows {
        let count = output.report.orphaned.len();
        if count == 0 {
            output.orphaned_objects = Some(Default::default());
        } else if let Some(confirmed) =
            confirm(args, &format!("delete {count} orphaned object(s)"))?
        {
            output.orphaned_objects =
                Some(checker.purge_orphans(&output.report, confirmed).await);
        }
    }

    emit(&output, format)?;
    Ok(if output.has_failures() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn migrate(
    target: Arc<dyn ObjectStore>,
    repo: Arc<ImageRepository>,
    legacy_root: PathBuf,
    verify_checksum: bool,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    if !legacy_root.is_dir() {
        bail!("Legacy root {} is not a directory", legacy_root.display());
    }

    let source: Arc<dyn ObjectStore> = Arc::new(StorageService::from_config(StorageConfig::new(
        StorageProvider::local_fs(&legacy_root),
    ))?);
    info!(legacy_root = %legacy_root.display(), verify_checksum, "Starting legacy migration");

    let report = LegacyMigrator::new(source, target.clone(), repo)
        .with_checksum_verification(verify_checksum)
        .run()
        .await?;
    let inventory = target
        .list_objects()
        .await
        .context("Failed to list the target store after migration")?;

    let failed = !report.failed.is_empty();
    emit(&MigrateOutput { report, inventory }, format)?;
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Resolve the operator's confirmation, prompting on stdin when needed.
///
/// Returns `None` when the operator declined; nothing must be changed then.
fn confirm(args: &ConfirmArgs, action: &str) -> anyhow::Result<Option<Confirmation>> {
    let answer = if let Some(word) = &args.confirm {
        word.clone()
    } else {
        let mut stderr = io::stderr();
        write!(stderr, "About to {action}. Type {CONFIRMATION_TOKEN} to continue: ")?;
        stderr.flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        line
    };

    let confirmation = Confirmation::parse(&answer);
    if confirmation.is_none() {
        eprintln!("Cancelled: {action} skipped, no changes made.");
    }
    Ok(confirmation)
}
