//! # flowsynth
//!
//! flowsynth generates synthetic, gated flow cytometry datasets and loads them into an
//! analytical table store. It also flattens collections of per-sample event matrices
//! (flow sets) into a single table suitable for general purpose statistical tooling.
//!
//! ## Installation
//!
//! The only method of install is from source. If you have not used Rust before, you will
//! need to install the Rust tool chain; see the
//! [Rust docs](https://www.rust-lang.org/tools/install) for instructions.
//!
//! To build and install the CLI use `cargo install --path ./flowsynth_cli` from the top
//! level flowsynth repository. SQLite is bundled, so no system database is required.
//!
//! ## Generation
//!
//! Each sample is described by a [`sample_config::SampleConfig`]. Events are drawn from
//! four populations, in this order:
//!
//! - debris: low, noisy forward and side scatter
//! - dead cells: shrunken scatter and a bright viability (FL1-A) channel
//! - live singlets: forward scatter height tracking area tightly
//! - doublets: forward scatter area well above height
//!
//! Two marker channels (FL2-A, FL3-A) are a positive/negative mixture for live cells. A
//! fraction of events across the whole sample are then turned into outliers by scaling their
//! scatter, and every channel is clamped to zero.
//!
//! ## Gating
//!
//! Two gates are applied to each sample (see [`gating`]):
//!
//! - `id_live`: not debris or dead, FL1-A below 5000, and FSC-A at or below the 99th
//! percentile of the live-labelled events
//! - `id_size`: live, and inside the 99% ellipse of the live events on FSC-A vs SSC-A
//!
//! ## Reproducibility
//!
//! A run consumes one random stream seeded from the configuration, in sample order and,
//! within a sample, in the order debris, dead, singlets, doublets, outliers. The same
//! configuration therefore always yields bit-identical tables.
//!
//! ## Configuration
//!
//! The YAML format of a configuration file is as follows:
//!
//! ```yml
//! database_path: flow_data.db
//! seed: 42
//! events_table: flow_events
//! summary_table: flow_summary
//! samples:
//! - sample_id: sample_01
//!   n_events: 10000
//!   debris_pct: 0.05
//!   dead_pct: 0.1
//!   singlet_pct: 0.9
//!   fsc_mean: 50000.0
//!   fsc_sd: 0.25
//!   ssc_mean: 30000.0
//!   ssc_sd: 0.3
//!   fl2_pos_pct: 0.3
//!   fl3_pos_pct: 0.1
//!   outlier_pct: 0.01
//! ```
//!
//! ## Output
//!
//! Two relations are written to the database:
//!
//! ```text
//! flow_events  - sample_id, event_id, FSC-A, SSC-A, FSC-H, FL1-A, FL2-A, FL3-A, population, id_live, id_size
//! flow_summary - sample_id, total_events, mean_fsc_a, sd_fsc_a, mean_ssc_a, mean_fl1_a, mean_fl2_a,
//!                mean_fl3_a, estimated_live_cells, estimated_dead_cells
//! ```
pub mod assembler;
pub mod config;
pub mod constants;
pub mod dataset;
pub mod error;
pub mod event;
pub mod flowset;
pub mod gating;
pub mod process;
pub mod sample_config;
pub mod samplers;
pub mod store;
pub mod summary;
pub mod table;
pub mod worker_status;
