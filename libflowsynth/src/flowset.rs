//! Collections of per-sample event matrices and their conversion to one flat table.
//!
//! A [`FlowFrame`] holds the events of one sample as an (events x channels) matrix. A
//! [`FlowSet`] is an ordered collection of frames that share a channel layout, optionally
//! with per-sample phenotype metadata. [`flatten`] stacks the frames into a single
//! [`Table`] with a sample identifier column, which is the shape general purpose
//! statistical tooling expects.
use ndarray::Array2;
use std::collections::{BTreeMap, BTreeSet, HashSet};

use super::error::FlowSetError;
use super::table::{Column, ColumnType, Table, Value};

/// The events of a single sample
#[derive(Debug, Clone, PartialEq)]
pub struct FlowFrame {
    pub name: String,
    pub channels: Vec<String>,
    pub exprs: Array2<f64>,
}

impl FlowFrame {
    pub fn new(name: &str, channels: &[&str], exprs: Array2<f64>) -> Self {
        Self {
            name: name.to_string(),
            channels: channels.iter().map(|c| c.to_string()).collect(),
            exprs,
        }
    }

    pub fn n_events(&self) -> usize {
        self.exprs.nrows()
    }
}

/// An ordered set of FlowFrames with optional per-sample metadata
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlowSet {
    frames: Vec<FlowFrame>,
    metadata: BTreeMap<String, BTreeMap<String, String>>,
}

/// Output layout options for [`flatten`]
#[derive(Debug, Clone, PartialEq)]
pub struct FlattenOptions {
    pub sample_column: String,
    pub include_event_id: bool,
    pub include_metadata: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            sample_column: String::from("sample_id"),
            include_event_id: false,
            include_metadata: true,
        }
    }
}

impl FlowSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: FlowFrame) {
        self.frames.push(frame);
    }

    pub fn frames(&self) -> &[FlowFrame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Attach a metadata value to a sample. The sample must already be in the set.
    pub fn set_metadata(&mut self, sample: &str, key: &str, value: &str) -> Result<(), FlowSetError> {
        if !self.frames.iter().any(|frame| frame.name == sample) {
            return Err(FlowSetError::UnknownSample(sample.to_string()));
        }
        self.metadata
            .entry(sample.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    /// Check that the set is non-empty, every frame's matrix matches its channel list,
    /// sample names are unique and all frames share the first frame's channels (in order).
    pub fn validate(&self) -> Result<(), FlowSetError> {
        let first = self.frames.first().ok_or(FlowSetError::EmptySet)?;
        let mut names = HashSet::new();
        for frame in self.frames.iter() {
            if frame.exprs.ncols() != frame.channels.len() {
                return Err(FlowSetError::ShapeMismatch {
                    name: frame.name.clone(),
                    columns: frame.exprs.ncols(),
                    channels: frame.channels.len(),
                });
            }
            if !names.insert(frame.name.as_str()) {
                return Err(FlowSetError::DuplicateSample(frame.name.clone()));
            }
            if frame.channels != first.channels {
                return Err(FlowSetError::ChannelMismatch {
                    name: frame.name.clone(),
                    expected: first.channels.clone(),
                    found: frame.channels.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Stack every frame of the set into one table.
///
/// Columns are the sample column, an optional 1-based per-sample `event_id`, one real column
/// per channel, and optionally one text column per metadata key (sorted; null where a
/// sample has no value). Rows are in frame order, then event order.
pub fn flatten(set: &FlowSet, options: &FlattenOptions) -> Result<Table, FlowSetError> {
    set.validate()?;
    let channels = &set.frames[0].channels;
    let metadata_keys: Vec<&String> = if options.include_metadata {
        set.metadata
            .values()
            .flat_map(|entries| entries.keys())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    } else {
        Vec::new()
    };

    let mut columns = vec![Column::new(&options.sample_column, ColumnType::Text)];
    if options.include_event_id {
        columns.push(Column::new("event_id", ColumnType::Integer));
    }
    columns.extend(channels.iter().map(|c| Column::new(c, ColumnType::Real)));
    columns.extend(metadata_keys.iter().map(|k| Column::new(k, ColumnType::Text)));

    let n_rows: usize = set.frames.iter().map(|frame| frame.n_events()).sum();
    let mut table = Table::new(columns);
    table.rows.reserve(n_rows);
    for frame in set.frames.iter() {
        let sample_meta = set.metadata.get(&frame.name);
        let meta_values: Vec<Value> = metadata_keys
            .iter()
            .map(|key| match sample_meta.and_then(|entries| entries.get(*key)) {
                Some(v) => Value::Text(v.clone()),
                None => Value::Null,
            })
            .collect();

        for (idx, event) in frame.exprs.outer_iter().enumerate() {
            let mut row = Vec::with_capacity(table.columns.len());
            row.push(Value::Text(frame.name.clone()));
            if options.include_event_id {
                row.push(Value::Integer(idx as i64 + 1));
            }
            row.extend(event.iter().map(|v| Value::Real(*v)));
            row.extend(meta_values.iter().cloned());
            table.rows.push(row);
        }
    }
    spdlog::debug!(
        "Flattened {} frames into {} rows",
        set.len(),
        table.n_rows()
    );
    Ok(table)
}
