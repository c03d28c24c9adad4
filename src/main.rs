//! CourseStat - group-by dashboards for course exports
//!
//! A CLI tool that loads a CSV export, groups its rows by an organizational
//! dimension and writes a ranked Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (missing file, missing column, empty selection, bad config, etc.)

use anyhow::{Context, Result};
use coursestat::cli::{Args, OutputFormat};
use coursestat::config::{Config, CONFIG_FILE};
use coursestat::dashboard::{self, DashboardRequest};
use coursestat::rules::{SortDirection, SortMetric};
use coursestat::{loader, report};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load configuration before logging so [general] verbose can apply
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose))?;

    info!("CourseStat v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run_report(args, config) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Report failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .coursestat.toml.
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
    println!("   Edit it to customize column names, dimensions and pass mark.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the complete report workflow. Returns the exit code.
fn run_report(args: Args, config: Config) -> Result<i32> {
    let start_time = Instant::now();

    let input = args
        .input
        .clone()
        .context("--input is required to build a report")?;
    let kind = args.report_kind();

    // Step 1: Load the export
    let table = loader::load_csv(&input)?;
    info!(
        "Loaded {} rows from {}",
        table.records.len(),
        input.display()
    );

    // Step 2: Collect the user's choices
    let mut request = DashboardRequest::new(kind);
    request.dimension = args.dimension.clone();
    request.metric = args.metric.map(SortMetric::from);
    request.direction = if config.report.descending {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    request.show_negative = config.report.show_negative;
    for (field, values) in &args.select {
        request.selections.select(field.clone(), values.clone());
    }

    if args.list_dimensions {
        return handle_list_dimensions(&table, &request, &config);
    }

    // Step 3: Aggregate
    let report = dashboard::build_report(&table, &request, &config)?;

    if report.metadata.dropped_records > 0 {
        warn!(
            "{} selected record(s) have no '{}' value",
            report.metadata.dropped_records, report.metadata.dimension
        );
    }

    // Step 4: Render and save
    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    if args.writes_to_stdout() {
        println!("{}", output);
        return Ok(0);
    }

    let output_path = Path::new(&config.general.output);
    std::fs::write(output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    // Print summary
    if !args.quiet {
        println!("\n📊 {}", report.metadata.title);
        println!("   Dimension: {}", report.metadata.dimension);
        println!(
            "   Records: {} loaded, {} selected",
            report.metadata.records_loaded, report.metadata.records_selected
        );
        println!("   Groups: {}", report.metadata.group_count);
        for group in report.groups.iter().take(5) {
            println!(
                "   - {}: {}% of {}",
                group.group, group.rate_display, group.total_count
            );
        }
        println!("   Duration: {:.2}s", start_time.elapsed().as_secs_f64());
        println!("\n✅ Report saved to: {}", output_path.display());
    }

    Ok(0)
}

/// Handle --list-dimensions: print what can be chosen, exit.
fn handle_list_dimensions(
    table: &loader::Table,
    request: &DashboardRequest,
    config: &Config,
) -> Result<i32> {
    let options = dashboard::list_options(table, request, config);

    println!("Dimensions:");
    for dimension in &options.dimensions {
        let marker = if table.has_column(dimension) {
            ""
        } else {
            " (not in export)"
        };
        println!("  {}{}", dimension, marker);
    }

    for (field, values) in &options.filters {
        println!("\n{} ({} values):", field, values.len());
        for value in values {
            println!("  {}", value);
        }
    }

    Ok(0)
}

/// Load configuration from file or use defaults.
///
/// Runs before logging is set up, so failures are returned rather than logged.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    Ok(Config::load_default()?.unwrap_or_default())
}
