//! mchstats - maternal & child health dashboard statistics
//!
//! A CLI tool that loads exported facility records and renders the
//! dashboard statistics for a facility scope as Markdown or JSON.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments, unreadable or malformed input, or write failure

mod cli;
mod config;

use anyhow::{Context, Result};
use cli::Args;
use config::{Config, CONFIG_FILE};
use indicatif::{ProgressBar, ProgressStyle};
use mch_stats::report::{self, ReportFormat, StatsReport};
use mch_stats::source::{self, RecordBundle, SourcePaths};
use mch_stats::Scope;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is resolved first so `[general] verbose` can set the log level.
    let (config, config_path) = match resolve_config(&args) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_level(config.general.verbose));

    info!("mchstats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    match config_path {
        Some(path) => info!("Loaded config from {}", path.display()),
        None => debug!("No config file found, using defaults"),
    }

    if let Err(e) = run(args, config).await {
        error!("Statistics run failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .mchstats.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to customize the output, reporting year and facility places.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

/// Load, scope, compute and write the report.
async fn run(args: Args, config: Config) -> Result<()> {
    let start_time = Instant::now();
    let to_stdout = args.output.as_deref() == Some(Path::new("-"));
    let chatty = !args.quiet && !to_stdout;

    let paths = collect_sources(&args)?;
    if paths.is_empty() {
        anyhow::bail!("No export files found");
    }

    if chatty {
        println!("📥 Loading {} export files...", paths.file_count());
    }
    let bundle = load_with_spinner(&paths, chatty).await?;

    let scope = args.scope();
    if matches!(scope, Scope::Lga(_) | Scope::Ward(_)) && bundle.facilities.is_empty() {
        warn!(
            "Scope {} needs a facility listing; no records will match without one",
            scope
        );
    }
    let label = scope.describe(&bundle.facilities);
    let bundle = bundle.scoped(&scope);
    info!(
        "{} patients, {} nutrition reports, {} vaccine reports in scope {}",
        bundle.patients.len(),
        bundle.nutrition.len(),
        bundle.vaccine.len(),
        scope
    );

    let options = config.stats_options();
    let report = StatsReport::build(&bundle, label, &options, config.stats.include_drafts);

    let format = config.general.format;
    let include_empty = config.report.include_empty_sections;
    if to_stdout {
        let content = match format {
            ReportFormat::Json => report::generate_json_report(&report)?,
            ReportFormat::Markdown => report::generate_markdown_report(&report, include_empty),
        };
        println!("{}", content);
        return Ok(());
    }

    report::write_report(&report, &config.general.output, format, include_empty)?;

    if !args.quiet {
        print_summary(&report, start_time.elapsed());
        println!(
            "\n✅ Report saved to: {}",
            config.general.output.display()
        );
    }

    Ok(())
}

/// Discover files under --input-dir and add the explicitly named ones.
fn collect_sources(args: &Args) -> Result<SourcePaths> {
    let mut paths = match args.input_dir {
        Some(ref dir) => source::discover_sources(dir)?,
        None => SourcePaths::default(),
    };

    paths.merge(SourcePaths {
        patients: args.patients.clone(),
        nutrition: args.nutrition.clone(),
        vaccine: args.vaccine.clone(),
        facilities: args.facilities.clone(),
    });

    Ok(paths)
}

async fn load_with_spinner(paths: &SourcePaths, show: bool) -> Result<RecordBundle> {
    let spinner = if show {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message("Reading records...");
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    } else {
        None
    };

    let result = source::load_bundle(paths).await;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    Ok(result?)
}

fn print_summary(report: &StatsReport, elapsed: Duration) {
    let stats = &report.patients;

    println!("\n📊 Statistics Summary ({}):", report.metadata.scope);
    println!("   Patients: {}", stats.total_patients);
    println!(
        "   ANC1: {}% | ANC4: {}% | ANC8: {}%",
        stats.anc1_rate, stats.anc4_rate, stats.anc8_rate
    );
    println!(
        "   Deliveries: {} ({}% at a facility)",
        stats.delivered, stats.facility_delivery_rate
    );
    println!(
        "   PNC: {}% / {}% / {}%",
        stats.pnc1_rate, stats.pnc2_rate, stats.pnc3_rate
    );
    println!("   FP uptake: {}%", stats.fp_uptake_rate);
    if let Some(ref nutrition) = report.nutrition {
        println!(
            "   Nutrition: {} screened, {} MAM, {} SAM",
            nutrition.total_screened(),
            nutrition.total_mam,
            nutrition.total_sam
        );
    }
    if let Some(ref vaccine) = report.vaccine {
        println!(
            "   Vaccine wastage: {}% ({} stock-outs)",
            vaccine.vaccine_wastage_rate, vaccine.stock_out_count
        );
    }
    println!("   Duration: {:.1}s", elapsed.as_secs_f64());
}

/// Pick the configuration file and merge CLI arguments over it.
///
/// An explicit `--config` wins, then `.mchstats.toml` in `--input-dir`,
/// then the one in the working directory. Returns the file used, if any.
fn resolve_config(args: &Args) -> Result<(Config, Option<PathBuf>)> {
    let (mut config, path) = if let Some(ref config_path) = args.config {
        (Config::load(config_path)?, Some(config_path.clone()))
    } else {
        let from_input_dir = match args.input_dir {
            Some(ref dir) => Config::load_from_dir(dir)?.map(|c| (c, dir.join(CONFIG_FILE))),
            None => None,
        };
        match from_input_dir {
            Some((config, path)) => (config, Some(path)),
            None => match Config::load_default()? {
                Some(config) => (config, Some(PathBuf::from(CONFIG_FILE))),
                None => (Config::default(), None),
            },
        }
    };

    config.merge_with_args(args);
    Ok((config, path))
}
