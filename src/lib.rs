pub mod category;
pub mod clean;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod error;
pub mod io_utils;
pub mod record;
pub mod recommend;
pub mod session;
pub mod table;

use std::{env, io, path::PathBuf, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    clean::{CategoryPolicy, Cleaner, HeaderPolicy},
    cli::{Cli, Commands, OutputFormat},
    config::WaxConfig,
    dataset::{Dataset, SnapshotCache},
    recommend::{Outcome, Query, RecommendOptions, Recommender},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("wax_advisor", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = WaxConfig::load_or_default(cli.config.as_deref())?;
    match cli.command {
        Commands::Clean(args) => handle_clean(&args, &config),
        Commands::Recommend(args) => handle_recommend(&args, &config),
        Commands::Preview(args) => handle_preview(&args, &config),
        Commands::Options(args) => handle_options(&args, &config),
        Commands::Session(args) => handle_session(&args, &config),
    }
}

fn dataset_path(provided: &Option<PathBuf>, config: &WaxConfig) -> PathBuf {
    provided
        .clone()
        .unwrap_or_else(|| config.dataset_path.clone())
}

fn handle_clean(args: &cli::CleanArgs, config: &WaxConfig) -> Result<()> {
    let input = args.input.clone().unwrap_or_else(|| config.raw_path.clone());
    let output = dataset_path(&args.output, config);
    let encoding = io_utils::resolve_encoding(
        args.input_encoding
            .as_deref()
            .or(config.input_encoding.as_deref()),
    )?;
    let mut options = config.clean_options();
    if args.strict_headers {
        options.header_policy = HeaderPolicy::Strict;
    }
    if args.strict_categories {
        options.category_policy = CategoryPolicy::Strict;
    }
    let cleaner = Cleaner::default().with_options(options);
    cleaner.clean_path(
        &input,
        &output,
        args.delimiter.or(config.delimiter_byte()),
        encoding,
    )?;
    Ok(())
}

fn recommender_for(
    tolerance: Option<f64>,
    top: Option<usize>,
    config: &WaxConfig,
) -> Result<Recommender> {
    let mut options: RecommendOptions = config.recommend_options();
    if let Some(tolerance) = tolerance {
        anyhow::ensure!(
            tolerance.is_finite() && tolerance >= 0.0,
            "Tolerance must be a non-negative number"
        );
        options.temperature_tolerance = tolerance;
    }
    if let Some(top) = top {
        anyhow::ensure!(top > 0, "--top must be at least 1");
        options.top = top;
    }
    Ok(Recommender::new(options))
}

fn handle_recommend(args: &cli::RecommendArgs, config: &WaxConfig) -> Result<()> {
    let path = dataset_path(&args.dataset, config);
    let recommender = recommender_for(args.tolerance, args.top, config)?;
    let query = Query {
        location: args.location.clone(),
        air_temp: args.air_temp,
        snow_type: args.snow_type,
        snow_moisture: args.snow_moisture,
    };
    info!(
        "Recommending for '{}' at {} °C on {} / {} snow",
        query.location, query.air_temp, query.snow_type, query.snow_moisture
    );
    let outcome = recommender.recommend_from_path(&path, &query)?;
    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&outcome).context("Serializing outcome")?;
            println!("{json}");
        }
        OutputFormat::Table => match &outcome {
            Outcome::Ranked(rows) => print!("{}", table::render_recommendations(rows)),
            Outcome::Diagnostic(diagnostic) => println!("{diagnostic}"),
        },
    }
    Ok(())
}

fn handle_preview(args: &cli::PreviewArgs, config: &WaxConfig) -> Result<()> {
    let path = dataset_path(&args.dataset, config);
    let dataset = Dataset::load(&path)?;
    let shown = &dataset.records()[..args.rows.min(dataset.len())];
    print!("{}", table::render_records(shown));
    info!(
        "Displayed {} of {} row(s) from {:?}",
        shown.len(),
        dataset.len(),
        path
    );
    Ok(())
}

fn handle_options(args: &cli::OptionsArgs, config: &WaxConfig) -> Result<()> {
    let path = dataset_path(&args.dataset, config);
    let dataset = Dataset::load(&path)?;
    let snow_types = dataset.snow_types();
    let moistures = dataset.snow_moistures();
    let mut table = table::Table::new(["field", "value"]);
    for location in dataset.locations() {
        table.push_row(vec!["location".into(), location]);
    }
    for snow_type in snow_types {
        table.push_row(vec!["snow_type".into(), snow_type.to_string()]);
    }
    for moisture in moistures {
        table.push_row(vec!["snow_moisture".into(), moisture.to_string()]);
    }
    print!("{}", table.render());
    Ok(())
}

fn handle_session(args: &cli::SessionArgs, config: &WaxConfig) -> Result<()> {
    let path = dataset_path(&args.dataset, config);
    let recommender = recommender_for(None, None, config)?;
    let mut cache = SnapshotCache::new(path);
    let stdin = io::stdin();
    let stats = session::run(&mut cache, &recommender, stdin.lock(), io::stdout().lock())?;
    info!(
        "Session answered {} query(ies), rejected {}, snapshot {:?} loaded {} time(s)",
        stats.answered,
        stats.rejected,
        cache.path(),
        cache.loads()
    );
    Ok(())
}
