//! Population samplers.
//!
//! Every sampler is a pure function of its count, its parameters and the random source it is
//! handed. Within a block the channels are drawn in a fixed order (primary scatter, the
//! height/area ratio, side scatter, FL1, FL2, FL3), each channel drawing all `n` of its values
//! before the next channel starts, so a seeded source always yields the same block.
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, LogNormal, Normal};

use super::constants::*;
use super::error::SamplerError;
use super::event::Channels;
use super::sample_config::{round_count, SampleConfig};

/// Log-normal scatter parameters: linear-scale means, log-scale standard deviations
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterParams {
    pub fsc_mean: f64,
    pub fsc_sd: f64,
    pub ssc_mean: f64,
    pub ssc_sd: f64,
}

impl From<&SampleConfig> for ScatterParams {
    fn from(config: &SampleConfig) -> Self {
        Self {
            fsc_mean: config.fsc_mean,
            fsc_sd: config.fsc_sd,
            ssc_mean: config.ssc_mean,
            ssc_sd: config.ssc_sd,
        }
    }
}

/// Positive fractions of the two marker channels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerParams {
    pub fl2_pos_pct: f64,
    pub fl3_pos_pct: f64,
}

impl From<&SampleConfig> for MarkerParams {
    fn from(config: &SampleConfig) -> Self {
        Self {
            fl2_pos_pct: config.fl2_pos_pct,
            fl3_pos_pct: config.fl3_pos_pct,
        }
    }
}

/// Column-oriented channel values for one population
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopulationBlock {
    pub fsc_a: Vec<f64>,
    pub ssc_a: Vec<f64>,
    pub fsc_h: Vec<f64>,
    pub fl1_a: Vec<f64>,
    pub fl2_a: Vec<f64>,
    pub fl3_a: Vec<f64>,
}

impl PopulationBlock {
    pub fn len(&self) -> usize {
        self.fsc_a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fsc_a.is_empty()
    }

    /// Convert the columns into per-event channel rows
    pub fn into_channels(self) -> Vec<Channels> {
        (0..self.len())
            .map(|idx| Channels {
                fsc_a: self.fsc_a[idx],
                ssc_a: self.ssc_a[idx],
                fsc_h: self.fsc_h[idx],
                fl1_a: self.fl1_a[idx],
                fl2_a: self.fl2_a[idx],
                fl3_a: self.fl3_a[idx],
            })
            .collect()
    }
}

/// Draw `n` values from LogNormal(ln(mean), sd)
pub fn log_normal<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    mean: f64,
    sd: f64,
) -> Result<Vec<f64>, SamplerError> {
    if sd < 0.0 {
        return Err(SamplerError::NegativeSd(sd));
    }
    let dist = LogNormal::new(mean.ln(), sd)?;
    Ok((0..n).map(|_| dist.sample(rng)).collect())
}

/// Multiply each base value by an independent Normal(mean, sd) draw
fn scale_by_normal<R: Rng + ?Sized>(
    rng: &mut R,
    base: &[f64],
    (mean, sd): (f64, f64),
) -> Result<Vec<f64>, SamplerError> {
    if sd < 0.0 {
        return Err(SamplerError::NegativeSd(sd));
    }
    let dist = Normal::new(mean, sd)?;
    Ok(base.iter().map(|value| value * dist.sample(rng)).collect())
}

/// Viability dye (FL1-A). Dead cells take up the dye and are bright; everything else is dim.
pub fn viability<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    dead: bool,
) -> Result<Vec<f64>, SamplerError> {
    let (mean, sd) = if dead { DEAD_VIABILITY } else { LIVE_VIABILITY };
    log_normal(rng, n, mean, sd)
}

/// Two component marker mixture.
///
/// `round(n * positive_pct)` positive values are drawn first, then the negatives, and the
/// combined vector is shuffled so position carries no information about positivity.
pub fn marker<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    positive_pct: f64,
) -> Result<Vec<f64>, SamplerError> {
    let n_pos = round_count(n as f64 * positive_pct).min(n);
    let mut values = log_normal(rng, n_pos, MARKER_POSITIVE.0, MARKER_POSITIVE.1)?;
    values.extend(log_normal(
        rng,
        n - n_pos,
        MARKER_NEGATIVE.0,
        MARKER_NEGATIVE.1,
    )?);
    values.shuffle(rng);
    Ok(values)
}

/// Debris: low, noisy scatter with a loosely correlated height
pub fn sample_debris<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
) -> Result<PopulationBlock, SamplerError> {
    let fsc_a = log_normal(rng, n, DEBRIS_FSC_MEAN, DEBRIS_SCATTER_SD)?;
    let fsc_h = scale_by_normal(rng, &fsc_a, DEBRIS_HEIGHT_RATIO)?;
    let ssc_a = log_normal(rng, n, DEBRIS_SSC_MEAN, DEBRIS_SCATTER_SD)?;
    let fl1_a = viability(rng, n, false)?;
    let fl2_a = marker(rng, n, 0.0)?;
    let fl3_a = marker(rng, n, 0.0)?;
    Ok(PopulationBlock {
        fsc_a,
        ssc_a,
        fsc_h,
        fl1_a,
        fl2_a,
        fl3_a,
    })
}

/// Dead cells: shrunken, more granular scatter and a bright viability channel
pub fn sample_dead<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    scatter: &ScatterParams,
) -> Result<PopulationBlock, SamplerError> {
    let fsc_a = log_normal(rng, n, scatter.fsc_mean * DEAD_FSC_SCALE, scatter.fsc_sd)?;
    let fsc_h = scale_by_normal(rng, &fsc_a, DEAD_HEIGHT_RATIO)?;
    let ssc_a = log_normal(rng, n, scatter.ssc_mean * DEAD_SSC_SCALE, scatter.ssc_sd)?;
    let fl1_a = viability(rng, n, true)?;
    let fl2_a = marker(rng, n, 0.0)?;
    let fl3_a = marker(rng, n, 0.0)?;
    Ok(PopulationBlock {
        fsc_a,
        ssc_a,
        fsc_h,
        fl1_a,
        fl2_a,
        fl3_a,
    })
}

/// Live singlets: height tracks area tightly
pub fn sample_singlets<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    scatter: &ScatterParams,
    markers: &MarkerParams,
) -> Result<PopulationBlock, SamplerError> {
    let fsc_a = log_normal(rng, n, scatter.fsc_mean, scatter.fsc_sd)?;
    let fsc_h = scale_by_normal(rng, &fsc_a, SINGLET_HEIGHT_RATIO)?;
    let ssc_a = log_normal(rng, n, scatter.ssc_mean, scatter.ssc_sd)?;
    let fl1_a = viability(rng, n, false)?;
    let fl2_a = marker(rng, n, markers.fl2_pos_pct)?;
    let fl3_a = marker(rng, n, markers.fl3_pos_pct)?;
    Ok(PopulationBlock {
        fsc_a,
        ssc_a,
        fsc_h,
        fl1_a,
        fl2_a,
        fl3_a,
    })
}

/// Doublets: two cells in the beam at once, so the pulse is wide and area exceeds height
pub fn sample_doublets<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    scatter: &ScatterParams,
    markers: &MarkerParams,
) -> Result<PopulationBlock, SamplerError> {
    let fsc_h = log_normal(
        rng,
        n,
        scatter.fsc_mean * DOUBLET_HEIGHT_SCALE,
        scatter.fsc_sd,
    )?;
    let fsc_a = scale_by_normal(rng, &fsc_h, DOUBLET_AREA_RATIO)?;
    let ssc_a = log_normal(
        rng,
        n,
        scatter.ssc_mean * DOUBLET_SSC_SCALE,
        scatter.ssc_sd,
    )?;
    let fl1_a = viability(rng, n, false)?;
    let fl2_a = marker(rng, n, markers.fl2_pos_pct)?;
    let fl3_a = marker(rng, n, markers.fl3_pos_pct)?;
    Ok(PopulationBlock {
        fsc_a,
        ssc_a,
        fsc_h,
        fl1_a,
        fl2_a,
        fl3_a,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn scatter() -> ScatterParams {
        ScatterParams {
            fsc_mean: 50_000.0,
            fsc_sd: 0.25,
            ssc_mean: 30_000.0,
            ssc_sd: 0.3,
        }
    }

    fn median(values: &[f64]) -> f64 {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted[sorted.len() / 2]
    }

    #[test]
    fn test_block_lengths() {
        let mut rng = StdRng::seed_from_u64(1);
        let markers = MarkerParams {
            fl2_pos_pct: 0.5,
            fl3_pos_pct: 0.1,
        };
        let block = sample_singlets(&mut rng, 250, &scatter(), &markers).unwrap();
        assert_eq!(block.len(), 250);
        assert_eq!(block.fl3_a.len(), 250);
        let rows = block.into_channels();
        assert_eq!(rows.len(), 250);

        let empty = sample_debris(&mut rng, 0).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_marker_positive_count() {
        let mut rng = StdRng::seed_from_u64(2);
        let values = marker(&mut rng, 1000, 0.3).unwrap();
        assert_eq!(values.len(), 1000);
        // The two components are separated by more than an order of magnitude
        let positives = values.iter().filter(|v| **v > 3000.0).count();
        assert!((290..=310).contains(&positives));
        // Shuffled: positives are not all at the front
        assert!(values[..300].iter().any(|v| *v < 3000.0));
    }

    #[test]
    fn test_viability_separates_dead() {
        let mut rng = StdRng::seed_from_u64(3);
        let live = viability(&mut rng, 2000, false).unwrap();
        let dead = viability(&mut rng, 2000, true).unwrap();
        assert!(live.iter().all(|v| *v < FL1_LIVE_THRESHOLD));
        assert!(dead.iter().all(|v| *v >= FL1_LIVE_THRESHOLD));
    }

    #[test]
    fn test_singlet_and_doublet_height_ratio() {
        let mut rng = StdRng::seed_from_u64(4);
        let markers = MarkerParams {
            fl2_pos_pct: 0.0,
            fl3_pos_pct: 0.0,
        };
        let singlets = sample_singlets(&mut rng, 2000, &scatter(), &markers).unwrap();
        let doublets = sample_doublets(&mut rng, 2000, &scatter(), &markers).unwrap();
        let singlet_ratio: Vec<f64> = singlets
            .fsc_h
            .iter()
            .zip(singlets.fsc_a.iter())
            .map(|(h, a)| h / a)
            .collect();
        let doublet_ratio: Vec<f64> = doublets
            .fsc_h
            .iter()
            .zip(doublets.fsc_a.iter())
            .map(|(h, a)| h / a)
            .collect();
        assert!((median(&singlet_ratio) - 0.85).abs() < 0.01);
        assert!((median(&doublet_ratio) - 1.0 / 1.5).abs() < 0.02);
    }

    #[test]
    fn test_debris_is_dim() {
        let mut rng = StdRng::seed_from_u64(5);
        let debris = sample_debris(&mut rng, 2000).unwrap();
        let fsc = median(&debris.fsc_a);
        assert!(fsc > 4000.0 && fsc < 6000.0);
        let ssc = median(&debris.ssc_a);
        assert!(ssc > 2400.0 && ssc < 3600.0);
    }

    #[test]
    fn test_bad_parameters() {
        let mut rng = StdRng::seed_from_u64(6);
        assert!(matches!(
            log_normal(&mut rng, 10, 100.0, -1.0),
            Err(SamplerError::NegativeSd(_))
        ));
        assert!(matches!(
            scale_by_normal(&mut rng, &[1.0, 2.0], (0.85, -0.05)),
            Err(SamplerError::NegativeSd(_))
        ));
        assert!(log_normal(&mut rng, 10, 100.0, 0.0).is_ok());
    }

    #[test]
    fn test_same_seed_same_block() {
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        let block_a = sample_dead(&mut a, 100, &scatter()).unwrap();
        let block_b = sample_dead(&mut b, 100, &scatter()).unwrap();
        assert_eq!(block_a, block_b);
    }
}
