use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::mpsc::Sender;

use super::config::Config;
use super::dataset::{Dataset, DatasetBuilder};
use super::error::ProcessorError;
use super::store::{quote_identifier, SqliteStore, TableStore};
use super::table::Table;
use super::worker_status::{Stage, WorkerStatus};

/// Fraction of the progress bar given to generation; storing takes the rest
const GENERATION_SHARE: f32 = 0.8;

/// Generate the gated dataset described by the config.
///
/// The random stream is seeded from `config.seed` and consumed in sample order, so the same
/// config always produces the same dataset.
pub fn generate(config: &Config, tx: &Sender<WorkerStatus>) -> Result<Dataset, ProcessorError> {
    let builder = DatasetBuilder::new(&config.samples)?;
    let n_samples = builder.n_samples();
    let mut rng = StdRng::seed_from_u64(config.seed);
    spdlog::info!(
        "Generating {} samples ({} events) with seed {}...",
        n_samples,
        config.total_events(),
        config.seed
    );
    tx.send(WorkerStatus::new(0.0, Stage::Generating, 0))?;

    let mut send_result = Ok(());
    let dataset = builder.build_with_progress(&mut rng, |done| {
        if send_result.is_ok() {
            send_result = tx.send(WorkerStatus::new(
                GENERATION_SHARE * done as f32 / n_samples as f32,
                Stage::Generating,
                done,
            ));
        }
    })?;
    send_result?;
    Ok(dataset)
}

/// Write the events and summary relations of a dataset to the store
pub fn store_dataset<S: TableStore + ?Sized>(
    store: &mut S,
    config: &Config,
    dataset: &Dataset,
    tx: &Sender<WorkerStatus>,
) -> Result<(), ProcessorError> {
    let n_samples = dataset.samples().len();
    tx.send(WorkerStatus::new(
        GENERATION_SHARE,
        Stage::Storing,
        n_samples,
    ))?;
    store.create_or_replace_table(&config.events_table, &dataset.events_table())?;
    tx.send(WorkerStatus::new(
        GENERATION_SHARE + 0.5 * (1.0 - GENERATION_SHARE),
        Stage::Storing,
        n_samples,
    ))?;
    store.create_or_replace_table(&config.summary_table, &dataset.summary_table())?;
    Ok(())
}

/// Read back per-sample gate counts from the stored events relation
pub fn gate_counts<S: TableStore + ?Sized>(
    store: &S,
    events_table: &str,
) -> Result<Table, ProcessorError> {
    let sql = format!(
        "SELECT sample_id, COUNT(*) AS n_events, SUM(id_live) AS n_live, SUM(id_size) AS n_size \
         FROM {} GROUP BY sample_id ORDER BY sample_id",
        quote_identifier(events_table)
    );
    Ok(store.query(&sql)?)
}

/// Run the full job against any store: generate, write, and verify
pub fn process_with_store<S: TableStore + ?Sized>(
    config: &Config,
    store: &mut S,
    tx: &Sender<WorkerStatus>,
) -> Result<Dataset, ProcessorError> {
    config.validate()?;
    let dataset = generate(config, tx)?;
    store_dataset(store, config, &dataset, tx)?;

    let counts = gate_counts(store, &config.events_table)?;
    for row in counts.rows.iter() {
        spdlog::info!(
            "Stored sample {}: {} events, {} live, {} size gated",
            row[0],
            row[1],
            row[2],
            row[3]
        );
    }
    tx.send(WorkerStatus::new(1.0, Stage::Done, dataset.samples().len()))?;
    Ok(dataset)
}

/// The function to be called by a separate thread (typically the CLI).
///
/// Opens the SQLite database named in the config and runs the whole job.
pub fn process(config: Config, tx: Sender<WorkerStatus>) -> Result<(), ProcessorError> {
    spdlog::info!("Opening database {}...", config.database_path.display());
    let mut store = SqliteStore::open(&config.database_path)?;
    process_with_store(&config, &mut store, &tx)?;
    spdlog::info!("Finished writing {}.", config.database_path.display());
    Ok(())
}
