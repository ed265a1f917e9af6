use std::path::PathBuf;

use anyhow::{Context, Result};
use blockcache_config::{BlockcacheConfig, LoggingConfig};
use blockcache_migrate::{
    CacheKind, CacheLayout, Halt, MigrationMode, MigrationOptions, MigrationReport, Migrator,
    ReconciliationPolicy,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::Layer as _;

const EXIT_OK: i32 = 0;
const EXIT_FAILED: i32 = 1;
const EXIT_ERROR: i32 = 2;
const EXIT_CANCELLED: i32 = 130;

#[derive(Parser)]
#[command(
    name = "blockcache",
    version,
    about = "Upgrade an on-disk block cache to the current archive format"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upgrade every outdated archive in place
    Migrate(MigrateArgs),
    /// Report what `migrate` would do without touching the cache
    Check(MigrateArgs),
}

#[derive(Args)]
struct MigrateArgs {
    /// Cache root (overrides BLOCKCACHE_CACHE_DIR and the config file)
    #[arg(long, value_name = "PATH")]
    cache_root: Option<PathBuf>,
    /// Cache directory to process; repeat for several (default: all)
    #[arg(long = "kind", value_name = "KIND")]
    kinds: Vec<CacheKind>,
    /// How reconciliation archives are handled
    #[arg(long, value_enum, value_name = "POLICY")]
    reconciliations: Option<ReconciliationsArg>,
    /// Config file (overrides BLOCKCACHE_CONFIG)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReconciliationsArg {
    Skip,
    Rewrite,
}

impl From<ReconciliationsArg> for ReconciliationPolicy {
    fn from(arg: ReconciliationsArg) -> Self {
        match arg {
            ReconciliationsArg::Skip => ReconciliationPolicy::Skip,
            ReconciliationsArg::Rewrite => ReconciliationPolicy::Rewrite,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Migrate(args) => migrate(args, MigrationMode::Apply),
        Command::Check(args) => migrate(args, MigrationMode::DryRun),
    }
}

fn migrate(args: MigrateArgs, mode: MigrationMode) -> Result<i32> {
    let (config, config_path, diagnostics) =
        blockcache_config::load(args.config.as_deref()).context("failed to load config")?;
    init_tracing(&config.logging);

    if let Some(path) = &config_path {
        tracing::debug!(target: "blockcache.cli", path = %path.display(), "loaded config");
    }
    for key in &diagnostics.unknown_keys {
        tracing::warn!(target: "blockcache.cli", key = %key, "ignoring unknown config key");
    }
    for warning in &diagnostics.warnings {
        tracing::warn!(target: "blockcache.cli", warning = ?warning, "config warning");
    }

    let cache_root = config
        .cache_config(args.cache_root.as_deref())
        .cache_root()
        .context("failed to determine cache root")?;
    let layout = CacheLayout::new(cache_root);
    let kinds = select_kinds(&args.kinds, &config);
    let options = MigrationOptions {
        mode,
        reconciliations: args
            .reconciliations
            .map(ReconciliationPolicy::from)
            .unwrap_or(config.cache.reconciliations),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("failed to start signal runtime")?;
    let cancel = CancellationToken::new();
    runtime.spawn(cancel_on_ctrl_c(cancel.clone()));

    let migrator = Migrator::new(layout.clone(), options, cancel)
        .with_context(|| format!("failed to prepare cache root {}", layout.root().display()))?;
    let report = migrator.run(&layout.targets(&kinds));
    runtime.shutdown_background();

    print_report(&report, args.json)?;
    Ok(exit_code(&report))
}

fn select_kinds(flags: &[CacheKind], config: &BlockcacheConfig) -> Vec<CacheKind> {
    if flags.is_empty() {
        return config.kinds();
    }
    let mut out = Vec::with_capacity(flags.len());
    for &kind in flags {
        if !out.contains(&kind) {
            out.push(kind);
        }
    }
    out
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::warn!(target: "blockcache.cli", "interrupt received; stopping after the current file");
        cancel.cancel();
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let layer: Box<dyn tracing_subscriber::Layer<_> + Send + Sync> = if logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .boxed()
    };

    let subscriber = tracing_subscriber::registry()
        .with(logging.env_filter())
        .with(layer);
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn exit_code(report: &MigrationReport) -> i32 {
    if report.cancelled {
        EXIT_CANCELLED
    } else if report.has_failures() {
        EXIT_FAILED
    } else {
        EXIT_OK
    }
}

fn print_report(report: &MigrationReport, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(report)?;
        println!("{out}");
        return Ok(());
    }

    if report.mode == MigrationMode::DryRun {
        println!("dry run: nothing was changed");
    }
    for dir in &report.directories {
        let halt = match dir.halt {
            None => "",
            Some(Halt::Failed) => " (halted: failed)",
            Some(Halt::Cancelled) => " (halted: cancelled)",
        };
        println!("{}: {}{}", dir.kind, dir.stats, halt);
    }
    println!("total: {}", report.totals);
    if report.cancelled {
        println!("cancelled before every directory was processed");
    }
    Ok(())
}
