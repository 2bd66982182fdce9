//! # flowsynth_cli
//!
//! Part of the flowsynth crate family.
//!
//! ## Use
//!
//! ```bash
//! flowsynth_cli new -p config.yml      # write a template configuration
//! flowsynth_cli -p config.yml          # generate the dataset and load it into the database
//! flowsynth_cli -p config.yml -s 7     # same, overriding the seed
//! flowsynth_cli query -p config.yml "SELECT * FROM flow_summary"
//! ```
//!
//! A log of each invocation is written to `./flowsynth.log`.
use clap::{value_parser, Arg, Command};
use indicatif::{ProgressBar, ProgressStyle};
use spdlog::formatter::{pattern, PatternFormatter};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

use libflowsynth::config::Config;
use libflowsynth::process::process;
use libflowsynth::store::{SqliteStore, TableStore};
use libflowsynth::worker_status::{Stage, WorkerStatus};

/// Log to the terminal (the stock sinks) and to a log file
fn setup_logging() -> Result<(), spdlog::Error> {
    let file_sink = Arc::new(
        spdlog::sink::FileSink::builder()
            .path(PathBuf::from("./flowsynth.log"))
            .formatter(Box::new(PatternFormatter::new(pattern!(
                "[{date_short} {time_short}] - [thread: {tid}] - [{^{level}}] - {payload}{eol}"
            ))))
            .truncate(true)
            .build()?,
    );
    let logger = Arc::new(
        spdlog::Logger::builder()
            .flush_level_filter(spdlog::LevelFilter::All)
            .sinks(spdlog::default_logger().sinks().to_owned())
            .sink(file_sink)
            .build()?,
    );
    spdlog::set_default_logger(logger);
    Ok(())
}

fn make_template_config(path: &Path) {
    match Config::default().write_config_file(path) {
        Ok(()) => spdlog::info!("Done."),
        Err(e) => spdlog::error!("Could not write template config: {e}"),
    }
}

fn run_query(config: &Config, sql: &str) {
    let store = match SqliteStore::open(&config.database_path) {
        Ok(s) => s,
        Err(e) => {
            spdlog::error!("{e}");
            return;
        }
    };
    match store.query(sql) {
        Ok(table) => print!("{table}"),
        Err(e) => spdlog::error!("Query failed with error: {e}"),
    }
}

fn run_generation(config: Config) {
    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("{msg:12} [{bar:40.cyan/blue}] {pos:>3}%") {
        pb.set_style(style);
    }

    let (tx, rx) = mpsc::channel::<WorkerStatus>();
    // Spawn the task!
    let handle = std::thread::spawn(move || process(config, tx));

    // The channel closes when the worker finishes, successfully or not
    for status in rx.iter() {
        pb.set_message(match status.stage {
            Stage::Generating => format!("sample {}", status.samples_done),
            Stage::Storing => String::from("storing"),
            Stage::Done => String::from("done"),
        });
        pb.set_position((status.progress * 100.0) as u64);
    }
    pb.finish();

    match handle.join() {
        Ok(result) => match result {
            Ok(_) => spdlog::info!("Successfully generated data!"),
            Err(e) => spdlog::error!("Generation failed with error: {e}"),
        },
        Err(_) => spdlog::error!("Failed to join generation task!"),
    }
}

fn main() {
    // Create a cli
    let matches = Command::new("flowsynth_cli")
        .about("Generate synthetic gated flow cytometry data into an SQLite database")
        .arg_required_else_help(true)
        .subcommand(Command::new("new").about("Make a template configuration yaml file"))
        .subcommand(
            Command::new("query")
                .about("Run SQL against the configured database and print the result")
                .arg(Arg::new("sql").required(true).help("The query to run")),
        )
        .arg(
            Arg::new("path")
                .short('p')
                .long("path")
                .global(true)
                .help("Path to the configuration file"),
        )
        .arg(
            Arg::new("seed")
                .short('s')
                .long("seed")
                .value_parser(value_parser!(u64))
                .help("Override the seed of the configuration"),
        )
        .get_matches();

    // Initialize feedback
    if let Err(e) = setup_logging() {
        eprintln!("Could not create log file, logging to terminal only: {e}");
    }

    // Parse the cli
    let config_path = match matches.get_one::<String>("path") {
        Some(p) => PathBuf::from(p),
        None => {
            spdlog::error!("A configuration path is required (-p/--path)");
            return;
        }
    };

    if let Some(("new", _)) = matches.subcommand() {
        spdlog::info!(
            "Making a template config at {}...",
            config_path.to_string_lossy()
        );
        make_template_config(&config_path);
        return;
    }

    // Load our config
    spdlog::info!("Loading config from {}...", config_path.to_string_lossy());
    let mut config = match Config::read_config_file(&config_path) {
        Ok(c) => c,
        Err(e) => {
            spdlog::error!("{e}");
            return;
        }
    };
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config.seed = *seed;
    }
    spdlog::info!("Config successfully loaded.");
    spdlog::info!("Database Path: {}", config.database_path.to_string_lossy());

    if let Some(("query", sub)) = matches.subcommand() {
        if let Some(sql) = sub.get_one::<String>("sql") {
            run_query(&config, sql);
        }
        return;
    }

    spdlog::info!("Seed: {}", config.seed);
    spdlog::info!(
        "Tables: {} (events), {} (summary)",
        config.events_table,
        config.summary_table
    );
    for sample in config.samples.iter() {
        spdlog::info!(
            "Sample {}: {} events, debris {}, dead {}, singlets {}, outliers {}",
            sample.sample_id,
            sample.n_events,
            sample.debris_pct,
            sample.dead_pct,
            sample.singlet_pct,
            sample.outlier_pct
        );
    }

    run_generation(config);

    spdlog::info!("Done.");
}
