//! The two sequential gates applied to an assembled sample.
//!
//! Gate 1 (`id_live`) is a threshold gate on the viability channel and forward scatter. The
//! scatter cap is the 99th percentile of FSC-A over events labelled live singlet or doublet;
//! those labels are used only to pick the calibration set and to exclude debris and dead
//! events, never for anything else.
//!
//! Gate 2 (`id_size`) is an elliptical gate on (FSC-A, SSC-A): the squared Mahalanobis
//! distance to the live events' mean, under their sample covariance, must not exceed the
//! 0.99 quantile of the chi-squared distribution with two degrees of freedom.
use ndarray::{Array1, Array2, Axis};

use super::constants::{
    ELLIPSE_PROBABILITY, FL1_LIVE_THRESHOLD, FSC_CAP_QUANTILE, MIN_ELLIPSE_EVENTS,
};
use super::event::Event;

/// Outcome of gating one sample
#[derive(Debug, Clone, PartialEq)]
pub struct GateReport {
    pub n_events: usize,
    pub n_live: usize,
    pub n_size: usize,
    /// FSC-A cap of gate 1; None if no event was eligible for calibration
    pub fsc_threshold: Option<f64>,
    /// True if gate 2 degraded to a pass-through of gate 1
    pub size_fallback: bool,
}

/// Quantile with linear interpolation between order statistics.
///
/// For sorted values `x[0..n]` the quantile is `x[j] + g * (x[j+1] - x[j])` with
/// `h = (n - 1) * p`, `j = floor(h)` and `g = h - j`. Returns None for an empty input.
pub fn quantile(values: &[f64], p: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let h = (sorted.len() - 1) as f64 * p.clamp(0.0, 1.0);
    let j = h.floor() as usize;
    let g = h - j as f64;
    if j + 1 >= sorted.len() {
        return Some(sorted[sorted.len() - 1]);
    }
    Some(sorted[j] + g * (sorted[j + 1] - sorted[j]))
}

/// Quantile function of the chi-squared distribution with two degrees of freedom.
///
/// With two degrees of freedom the distribution is exponential with mean 2, so the
/// quantile has the closed form `-2 ln(1 - p)`.
pub fn chi_squared_2df_quantile(p: f64) -> f64 {
    -2.0 * (1.0 - p).ln()
}

/// A bivariate normal fit (mean and inverse covariance) used for Mahalanobis distances
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterEllipse {
    pub mean: Array1<f64>,
    pub covariance: Array2<f64>,
    inverse: Array2<f64>,
}

impl ScatterEllipse {
    /// Fit to an (n, 2) matrix of points using the unbiased (n - 1) covariance.
    ///
    /// Returns None when there are fewer than three points or the covariance is singular.
    pub fn fit(points: &Array2<f64>) -> Option<Self> {
        let n = points.nrows();
        if n < MIN_ELLIPSE_EVENTS || points.ncols() != 2 {
            return None;
        }
        let mean = points.mean_axis(Axis(0))?;
        let centered = points - &mean;
        let covariance = centered.t().dot(&centered) / (n - 1) as f64;

        let (a, b, c, d) = (
            covariance[[0, 0]],
            covariance[[0, 1]],
            covariance[[1, 0]],
            covariance[[1, 1]],
        );
        let det = a * d - b * c;
        if !det.is_finite() || det <= f64::EPSILON * a * d {
            return None;
        }
        let inverse = ndarray::arr2(&[[d / det, -b / det], [-c / det, a / det]]);
        Some(Self {
            mean,
            covariance,
            inverse,
        })
    }

    /// Squared Mahalanobis distance of a point to the fitted mean
    pub fn distance_squared(&self, x: f64, y: f64) -> f64 {
        let delta = ndarray::arr1(&[x - self.mean[0], y - self.mean[1]]);
        delta.dot(&self.inverse.dot(&delta))
    }
}

/// (FSC-A, SSC-A) of the given events as an (n, 2) matrix
fn scatter_matrix<'a, I>(events: I) -> Array2<f64>
where
    I: IntoIterator<Item = &'a Event>,
{
    let values: Vec<[f64; 2]> = events
        .into_iter()
        .map(|event| [event.channels.fsc_a, event.channels.ssc_a])
        .collect();
    Array2::from_shape_fn((values.len(), 2), |(row, col)| values[row][col])
}

/// Apply gate 1, setting `id_live` on every event. Returns the FSC-A cap.
pub fn gate_live(events: &mut [Event]) -> Option<f64> {
    let calibration: Vec<f64> = events
        .iter()
        .filter(|event| event.population.is_live())
        .map(|event| event.channels.fsc_a)
        .collect();
    let fsc_threshold = quantile(&calibration, FSC_CAP_QUANTILE);

    for event in events.iter_mut() {
        event.id_live = match fsc_threshold {
            Some(cap) => {
                event.population.is_live()
                    && event.channels.fl1_a < FL1_LIVE_THRESHOLD
                    && event.channels.fsc_a <= cap
            }
            None => false,
        };
    }
    fsc_threshold
}

/// Apply gate 2, setting `id_size` on every event. Gate 1 must already have been applied.
///
/// Returns true if the gate fell back to copying `id_live` because the live events could
/// not support a covariance estimate.
pub fn gate_size(events: &mut [Event]) -> bool {
    let points = scatter_matrix(events.iter().filter(|event| event.id_live));
    let ellipse = match ScatterEllipse::fit(&points) {
        Some(ellipse) => ellipse,
        None => {
            if points.nrows() >= MIN_ELLIPSE_EVENTS {
                spdlog::warn!(
                    "Scatter covariance of {} live events is singular; size gate passes all live events",
                    points.nrows()
                );
            }
            for event in events.iter_mut() {
                event.id_size = event.id_live;
            }
            return true;
        }
    };

    let threshold = chi_squared_2df_quantile(ELLIPSE_PROBABILITY);
    for event in events.iter_mut() {
        let distance = ellipse.distance_squared(event.channels.fsc_a, event.channels.ssc_a);
        event.id_size = event.id_live && distance <= threshold;
    }
    false
}

/// Apply both gates in order and report the outcome
pub fn apply_gates(events: &mut [Event]) -> GateReport {
    let fsc_threshold = gate_live(events);
    let size_fallback = gate_size(events);
    GateReport {
        n_events: events.len(),
        n_live: events.iter().filter(|event| event.id_live).count(),
        n_size: events.iter().filter(|event| event.id_size).count(),
        fsc_threshold,
        size_fallback,
    }
}
