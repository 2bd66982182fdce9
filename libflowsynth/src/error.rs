use std::path::PathBuf;
use thiserror::Error;

use super::worker_status::WorkerStatus;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleConfigError {
    #[error("Sample configuration has an empty sample_id")]
    EmptySampleId,
    #[error("Sample {0} requests zero events; at least one event is required")]
    NoEvents(String),
    #[error("Sample {0} requests {1} events; event ids are limited to u32::MAX")]
    TooManyEvents(String, usize),
    #[error("Sample {sample} has {field} = {value}, which is outside of [0, 1]")]
    FractionOutOfRange {
        sample: String,
        field: &'static str,
        value: f64,
    },
    #[error("Sample {0} has debris_pct + dead_pct = {1}, which exceeds 1")]
    FractionSumExceeded(String, f64),
    #[error("Sample {sample} has invalid scatter parameter {field} = {value}")]
    BadScatterParameter {
        sample: String,
        field: &'static str,
        value: f64,
    },
}

#[derive(Debug, Error)]
pub enum SamplerError {
    #[error("Sampler was given invalid normal/log-normal parameters: {0}")]
    BadNormal(#[from] rand_distr::NormalError),
    #[error("Sampler was given an invalid uniform range: {0}")]
    BadUniform(#[from] rand::distr::uniform::Error),
    #[error("Sampler was given a negative standard deviation: {0}")]
    NegativeSd(f64),
}

#[derive(Debug, Error)]
pub enum AssemblerError {
    #[error("SampleAssembler rejected the sample configuration: {0}")]
    BadConfig(#[from] SampleConfigError),
    #[error("SampleAssembler failed due to sampler error: {0}")]
    SamplerError(#[from] SamplerError),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("DatasetBuilder rejected a sample configuration: {0}")]
    BadConfig(#[from] SampleConfigError),
    #[error("DatasetBuilder found sample_id {0} more than once")]
    DuplicateSample(String),
    #[error("DatasetBuilder was given no sample configurations")]
    NoSamples,
    #[error("DatasetBuilder failed due to SampleAssembler error: {0}")]
    AssemblerError(#[from] AssemblerError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FlowSetError {
    #[error("FlowSet contains no frames")]
    EmptySet,
    #[error("FlowFrame {name} has {columns} data columns but {channels} channel names")]
    ShapeMismatch {
        name: String,
        columns: usize,
        channels: usize,
    },
    #[error("FlowSet contains sample {0} more than once")]
    DuplicateSample(String),
    #[error("FlowFrame {name} has channels {found:?}; expected {expected:?}")]
    ChannelMismatch {
        name: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("FlowSet metadata refers to unknown sample {0}")]
    UnknownSample(String),
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Table row {row} has {found} values but the table has {expected} columns")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Table has column {0} more than once")]
    DuplicateColumn(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("TableStore failed due to SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("TableStore was given a malformed table: {0}")]
    BadTable(#[from] TableError),
    #[error("TableStore was given an invalid table name {0:?}")]
    BadTableName(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration as file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("Config failed due to IO error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("Config failed to parse YAML: {0}")]
    ParsingError(#[from] serde_yaml::Error),
    #[error("Config failed validation: {0}")]
    BadSample(#[from] SampleConfigError),
    #[error("Config has an empty {0} name")]
    EmptyTableName(&'static str),
    #[error("Config names both the events and summary tables {0:?}; they must differ")]
    SharedTableName(String),
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("Processor failed due to DatasetBuilder error: {0}")]
    DatasetError(#[from] DatasetError),
    #[error("Processor failed due to TableStore error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Processor failed due to Config error: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("Processor failed due to Send error: {0}")]
    SendError(#[from] std::sync::mpsc::SendError<WorkerStatus>),
}
