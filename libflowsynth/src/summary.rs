use super::constants::FL1_LIVE_THRESHOLD;
use super::event::Event;
use super::table::{Column, ColumnType, Table, Value};

/// Per-sample summary statistics
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSummary {
    pub sample_id: String,
    pub total_events: usize,
    pub mean_fsc_a: f64,
    pub sd_fsc_a: f64,
    pub mean_ssc_a: f64,
    pub mean_fl1_a: f64,
    pub mean_fl2_a: f64,
    pub mean_fl3_a: f64,
    /// Events with FL1-A below the fixed viability threshold
    pub estimated_live_cells: usize,
    pub estimated_dead_cells: usize,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1); zero for fewer than two values
fn standard_deviation(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

impl SampleSummary {
    /// Summarize the events of one sample
    pub fn from_events(sample_id: &str, events: &[Event]) -> Self {
        let column = |f: fn(&Event) -> f64| -> Vec<f64> { events.iter().map(f).collect() };
        let fsc_a = column(|e| e.channels.fsc_a);
        let fl1_a = column(|e| e.channels.fl1_a);
        let estimated_live_cells = fl1_a.iter().filter(|v| **v < FL1_LIVE_THRESHOLD).count();
        Self {
            sample_id: sample_id.to_string(),
            total_events: events.len(),
            mean_fsc_a: mean(&fsc_a),
            sd_fsc_a: standard_deviation(&fsc_a),
            mean_ssc_a: mean(&column(|e| e.channels.ssc_a)),
            mean_fl1_a: mean(&fl1_a),
            mean_fl2_a: mean(&column(|e| e.channels.fl2_a)),
            mean_fl3_a: mean(&column(|e| e.channels.fl3_a)),
            estimated_live_cells,
            estimated_dead_cells: events.len() - estimated_live_cells,
        }
    }

    pub fn columns() -> Vec<Column> {
        vec![
            Column::new("sample_id", ColumnType::Text),
            Column::new("total_events", ColumnType::Integer),
            Column::new("mean_fsc_a", ColumnType::Real),
            Column::new("sd_fsc_a", ColumnType::Real),
            Column::new("mean_ssc_a", ColumnType::Real),
            Column::new("mean_fl1_a", ColumnType::Real),
            Column::new("mean_fl2_a", ColumnType::Real),
            Column::new("mean_fl3_a", ColumnType::Real),
            Column::new("estimated_live_cells", ColumnType::Integer),
            Column::new("estimated_dead_cells", ColumnType::Integer),
        ]
    }

    pub fn to_row(&self) -> Vec<Value> {
        vec![
            Value::Text(self.sample_id.clone()),
            Value::Integer(self.total_events as i64),
            Value::Real(self.mean_fsc_a),
            Value::Real(self.sd_fsc_a),
            Value::Real(self.mean_ssc_a),
            Value::Real(self.mean_fl1_a),
            Value::Real(self.mean_fl2_a),
            Value::Real(self.mean_fl3_a),
            Value::Integer(self.estimated_live_cells as i64),
            Value::Integer(self.estimated_dead_cells as i64),
        ]
    }
}

/// Build the summary relation, one row per summary in the given order
pub fn summary_table(summaries: &[SampleSummary]) -> Table {
    let mut table = Table::new(SampleSummary::columns());
    for summary in summaries {
        table.rows.push(summary.to_row());
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Channels, Population};

    fn event(fsc_a: f64, fl1_a: f64) -> Event {
        Event {
            sample_id: String::from("s"),
            event_id: 1,
            channels: Channels {
                fsc_a,
                ssc_a: 2.0 * fsc_a,
                fsc_h: 0.0,
                fl1_a,
                fl2_a: 10.0,
                fl3_a: 20.0,
            },
            population: Population::LiveSinglet,
            outlier: false,
            id_live: true,
            id_size: true,
        }
    }

    #[test]
    fn test_summary_statistics() {
        let events = vec![event(2.0, 100.0), event(4.0, 5000.0), event(6.0, 4999.0)];
        let summary = SampleSummary::from_events("s", &events);
        assert_eq!(summary.total_events, 3);
        assert!((summary.mean_fsc_a - 4.0).abs() < 1e-12);
        assert!((summary.sd_fsc_a - 2.0).abs() < 1e-12);
        assert!((summary.mean_ssc_a - 8.0).abs() < 1e-12);
        assert!((summary.mean_fl2_a - 10.0).abs() < 1e-12);
        assert!((summary.mean_fl3_a - 20.0).abs() < 1e-12);
        assert_eq!(summary.estimated_live_cells, 2);
        assert_eq!(summary.estimated_dead_cells, 1);
    }

    #[test]
    fn test_single_event_sd() {
        let summary = SampleSummary::from_events("s", &[event(2.0, 100.0)]);
        assert_eq!(summary.sd_fsc_a, 0.0);
    }

    #[test]
    fn test_summary_table_shape() {
        let summaries = vec![
            SampleSummary::from_events("a", &[event(1.0, 1.0)]),
            SampleSummary::from_events("b", &[event(1.0, 1.0)]),
        ];
        let table = summary_table(&summaries);
        assert_eq!(table.columns.len(), 10);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][0], Value::Text(String::from("b")));
        assert!(table.validate().is_ok());
    }
}
