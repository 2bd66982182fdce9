use ndarray::Array2;
use rand::Rng;
use std::collections::HashSet;

use super::assembler::SampleAssembler;
use super::constants::CHANNEL_NAMES;
use super::error::DatasetError;
use super::event::Event;
use super::flowset::{FlowFrame, FlowSet};
use super::gating::{apply_gates, GateReport};
use super::sample_config::SampleConfig;
use super::summary::{summary_table, SampleSummary};
use super::table::{Column, ColumnType, Table, Value};

/// Gated events of every sample, in sample order then event order.
///
/// A Dataset is never modified after the DatasetBuilder hands it out.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    events: Vec<Event>,
    samples: Vec<SampleRange>,
}

/// Where one sample's events live in the dataset, and how its gating went
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRange {
    pub sample_id: String,
    pub start: usize,
    pub end: usize,
    pub gates: GateReport,
}

impl Dataset {
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn samples(&self) -> &[SampleRange] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// The events of one sample, if present
    pub fn sample_events(&self, sample_id: &str) -> Option<&[Event]> {
        self.samples
            .iter()
            .find(|range| range.sample_id == sample_id)
            .map(|range| &self.events[range.start..range.end])
    }

    /// Per-sample summaries, in sample order
    pub fn summaries(&self) -> Vec<SampleSummary> {
        self.samples
            .iter()
            .map(|range| {
                SampleSummary::from_events(&range.sample_id, &self.events[range.start..range.end])
            })
            .collect()
    }

    pub fn event_columns() -> Vec<Column> {
        let mut columns = vec![
            Column::new("sample_id", ColumnType::Text),
            Column::new("event_id", ColumnType::Integer),
        ];
        columns.extend(
            CHANNEL_NAMES
                .iter()
                .map(|name| Column::new(name, ColumnType::Real)),
        );
        columns.push(Column::new("population", ColumnType::Text));
        columns.push(Column::new("id_live", ColumnType::Boolean));
        columns.push(Column::new("id_size", ColumnType::Boolean));
        columns
    }

    /// The events relation
    pub fn events_table(&self) -> Table {
        let mut table = Table::new(Self::event_columns());
        table.rows.reserve(self.events.len());
        for event in self.events.iter() {
            let mut row = Vec::with_capacity(table.columns.len());
            row.push(Value::Text(event.sample_id.clone()));
            row.push(Value::Integer(event.event_id as i64));
            row.extend(event.channels.as_array().iter().map(|v| Value::Real(*v)));
            row.push(Value::Text(event.population_label()));
            row.push(Value::Boolean(event.id_live));
            row.push(Value::Boolean(event.id_size));
            table.rows.push(row);
        }
        table
    }

    /// The summary relation
    pub fn summary_table(&self) -> Table {
        summary_table(&self.summaries())
    }

    /// View the channel data as a FlowSet, one frame per sample
    pub fn to_flow_set(&self) -> FlowSet {
        let mut set = FlowSet::new();
        for range in self.samples.iter() {
            let events = &self.events[range.start..range.end];
            let exprs = Array2::from_shape_fn((events.len(), CHANNEL_NAMES.len()), |(row, col)| {
                events[row].channels.as_array()[col]
            });
            set.push(FlowFrame::new(&range.sample_id, &CHANNEL_NAMES, exprs));
        }
        set
    }
}

/// DatasetBuilder runs the assembler and the gates over a sequence of sample configurations.
#[derive(Debug)]
pub struct DatasetBuilder {
    configs: Vec<SampleConfig>,
}

impl DatasetBuilder {
    /// Create a builder, validating every configuration before anything is generated
    pub fn new(configs: &[SampleConfig]) -> Result<Self, DatasetError> {
        if configs.is_empty() {
            return Err(DatasetError::NoSamples);
        }
        let mut ids = HashSet::new();
        for config in configs.iter() {
            config.validate()?;
            if !ids.insert(config.sample_id.as_str()) {
                return Err(DatasetError::DuplicateSample(config.sample_id.clone()));
            }
        }
        Ok(Self {
            configs: configs.to_vec(),
        })
    }

    pub fn n_samples(&self) -> usize {
        self.configs.len()
    }

    /// Build the dataset. `on_sample` is called after each sample with the number of samples
    /// completed so far, which callers use for progress reporting.
    pub fn build_with_progress<R, F>(&self, rng: &mut R, mut on_sample: F) -> Result<Dataset, DatasetError>
    where
        R: Rng + ?Sized,
        F: FnMut(usize),
    {
        let mut dataset = Dataset::default();
        for (idx, config) in self.configs.iter().enumerate() {
            let mut events = SampleAssembler::new(config)?.assemble(rng)?;
            let gates = apply_gates(&mut events);
            spdlog::info!(
                "Sample {}: {} events, {} pass the live gate (FSC-A cap {}), {} pass the size gate{}",
                config.sample_id,
                gates.n_events,
                gates.n_live,
                gates
                    .fsc_threshold
                    .map(|v| format!("{v:.1}"))
                    .unwrap_or_else(|| String::from("none")),
                gates.n_size,
                if gates.size_fallback {
                    " (fallback)"
                } else {
                    ""
                }
            );

            let start = dataset.events.len();
            dataset.events.extend(events);
            dataset.samples.push(SampleRange {
                sample_id: config.sample_id.clone(),
                start,
                end: dataset.events.len(),
                gates,
            });
            on_sample(idx + 1);
        }
        Ok(dataset)
    }

    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Dataset, DatasetError> {
        self.build_with_progress(rng, |_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flowset::{flatten, FlattenOptions};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn all_singlets() -> SampleConfig {
        SampleConfig {
            sample_id: String::from("singlets"),
            n_events: 1000,
            debris_pct: 0.0,
            dead_pct: 0.0,
            singlet_pct: 1.0,
            fsc_mean: 50_000.0,
            fsc_sd: 0.25,
            ssc_mean: 30_000.0,
            ssc_sd: 0.3,
            fl2_pos_pct: 0.3,
            fl3_pos_pct: 0.1,
            outlier_pct: 0.0,
        }
    }

    fn build(configs: &[SampleConfig], seed: u64) -> Dataset {
        let mut rng = StdRng::seed_from_u64(seed);
        DatasetBuilder::new(configs).unwrap().build(&mut rng).unwrap()
    }

    #[test]
    fn test_standard_set_invariants() {
        let configs = SampleConfig::standard_set();
        let dataset = build(&configs, 42);
        let expected: usize = configs.iter().map(|c| c.n_events).sum();
        assert_eq!(dataset.len(), expected);

        for config in configs.iter() {
            let events = dataset.sample_events(&config.sample_id).unwrap();
            assert_eq!(events.len(), config.n_events);
            let ids: Vec<u32> = events.iter().map(|e| e.event_id).collect();
            let expected_ids: Vec<u32> = (1..=config.n_events as u32).collect();
            assert_eq!(ids, expected_ids);
        }
        for event in dataset.events() {
            assert!(event.channels.as_array().iter().all(|v| *v >= 0.0));
            assert!(!event.id_size || event.id_live);
        }
        // Samples are concatenated in configuration order
        let order: Vec<&str> = dataset
            .samples()
            .iter()
            .map(|s| s.sample_id.as_str())
            .collect();
        assert_eq!(order, vec!["sample_01", "sample_02", "sample_03"]);
    }

    #[test]
    fn test_same_seed_same_dataset() {
        let configs = SampleConfig::standard_set();
        let first = build(&configs, 7);
        let second = build(&configs, 7);
        assert_eq!(first, second);
        assert_eq!(first.events_table(), second.events_table());
        let third = build(&configs, 8);
        assert_ne!(first.events(), third.events());
    }

    #[test]
    fn test_all_singlets_mostly_live() {
        let dataset = build(&[all_singlets()], 3);
        assert!(dataset
            .events()
            .iter()
            .all(|e| e.population_label() == "live_singlet"));
        let live = dataset.events().iter().filter(|e| e.id_live).count();
        assert!(live >= 990);
    }

    #[test]
    fn test_failed_sample_profile() {
        let mut config = all_singlets();
        config.sample_id = String::from("failed");
        config.n_events = 20_000;
        config.dead_pct = 0.9;
        config.outlier_pct = 0.02;
        let dataset = build(&[config], 5);
        let dead = dataset
            .events()
            .iter()
            .filter(|e| e.population_label().starts_with("dead"))
            .count();
        assert_eq!(dead, 18_000);
        let live = dataset.events().iter().filter(|e| e.id_live).count();
        assert!(live < 2200);
    }

    #[test]
    fn test_rejects_before_generation() {
        let mut bad = all_singlets();
        bad.sample_id = String::from("bad");
        bad.debris_pct = 0.7;
        bad.dead_pct = 0.7;
        let configs = vec![all_singlets(), bad];
        assert!(matches!(
            DatasetBuilder::new(&configs),
            Err(DatasetError::BadConfig(_))
        ));
        assert!(matches!(
            DatasetBuilder::new(&[all_singlets(), all_singlets()]),
            Err(DatasetError::DuplicateSample(_))
        ));
        assert!(matches!(
            DatasetBuilder::new(&[]),
            Err(DatasetError::NoSamples)
        ));
    }

    #[test]
    fn test_tables_and_flow_set() {
        let configs = vec![SampleConfig::healthy("a"), SampleConfig::failed("b")];
        let mut progress = Vec::new();
        let mut rng = StdRng::seed_from_u64(9);
        let dataset = DatasetBuilder::new(&configs)
            .unwrap()
            .build_with_progress(&mut rng, |done| progress.push(done))
            .unwrap();
        assert_eq!(progress, vec![1, 2]);

        let events = dataset.events_table();
        let names: Vec<&str> = events.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "sample_id",
                "event_id",
                "FSC-A",
                "SSC-A",
                "FSC-H",
                "FL1-A",
                "FL2-A",
                "FL3-A",
                "population",
                "id_live",
                "id_size"
            ]
        );
        assert_eq!(events.n_rows(), 30_000);

        let summary = dataset.summary_table();
        assert_eq!(summary.n_rows(), 2);
        assert_eq!(summary.rows[1][1], Value::Integer(20_000));
        let dead_estimate = summary.rows[1][9].as_i64().unwrap();
        assert!(dead_estimate >= 18_000);

        let flat = flatten(&dataset.to_flow_set(), &FlattenOptions::default()).unwrap();
        assert_eq!(flat.n_rows(), 30_000);
        assert_eq!(flat.columns.len(), 7);
        assert_eq!(flat.rows[10_000][0], Value::Text(String::from("b")));
    }
}
