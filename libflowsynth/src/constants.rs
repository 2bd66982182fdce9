// Channel names as they appear in the events relation
pub const FSC_A: &str = "FSC-A";
pub const SSC_A: &str = "SSC-A";
pub const FSC_H: &str = "FSC-H";
pub const FL1_A: &str = "FL1-A";
pub const FL2_A: &str = "FL2-A";
pub const FL3_A: &str = "FL3-A";
pub const CHANNEL_NAMES: [&str; 6] = [FSC_A, SSC_A, FSC_H, FL1_A, FL2_A, FL3_A];

// Debris scatter
pub const DEBRIS_FSC_MEAN: f64 = 5000.0;
pub const DEBRIS_SSC_MEAN: f64 = 3000.0;
pub const DEBRIS_SCATTER_SD: f64 = 0.5;
pub const DEBRIS_HEIGHT_RATIO: (f64, f64) = (0.7, 0.2);

// Dead cell scatter, relative to the live scatter means
pub const DEAD_FSC_SCALE: f64 = 0.6;
pub const DEAD_SSC_SCALE: f64 = 1.2;
pub const DEAD_HEIGHT_RATIO: (f64, f64) = (0.8, 0.1);

// Live singlets: height tracks area tightly
pub const SINGLET_HEIGHT_RATIO: (f64, f64) = (0.85, 0.05);

// Doublets: height is drawn first, area exceeds it
pub const DOUBLET_HEIGHT_SCALE: f64 = 0.7;
pub const DOUBLET_AREA_RATIO: (f64, f64) = (1.5, 0.1);
pub const DOUBLET_SSC_SCALE: f64 = 1.5;

// Viability channel (FL1-A)
pub const LIVE_VIABILITY: (f64, f64) = (500.0, 0.4);
pub const DEAD_VIABILITY: (f64, f64) = (50000.0, 0.3);

// Marker channels (FL2-A, FL3-A)
pub const MARKER_POSITIVE: (f64, f64) = (15000.0, 0.4);
pub const MARKER_NEGATIVE: (f64, f64) = (300.0, 0.3);

// Outlier scatter perturbation factor range
pub const OUTLIER_FACTOR_RANGE: (f64, f64) = (0.1, 3.0);

/// Fixed FL1-A threshold separating live (below) from dead (at or above) events
pub const FL1_LIVE_THRESHOLD: f64 = 5000.0;
/// Quantile of the live FSC-A distribution used as the gate 1 scatter cap
pub const FSC_CAP_QUANTILE: f64 = 0.99;
/// Probability mass contained by the gate 2 ellipse
pub const ELLIPSE_PROBABILITY: f64 = 0.99;
/// Minimum number of live events for a non-degenerate 2x2 covariance
pub const MIN_ELLIPSE_EVENTS: usize = 3;

pub const DEFAULT_EVENTS_TABLE: &str = "flow_events";
pub const DEFAULT_SUMMARY_TABLE: &str = "flow_summary";
pub const DEFAULT_SEED: u64 = 42;
