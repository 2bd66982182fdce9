use rand::distr::Uniform;
use rand::seq::index;
use rand::Rng;
use rand_distr::Distribution;

use super::constants::OUTLIER_FACTOR_RANGE;
use super::error::{AssemblerError, SamplerError};
use super::event::{Channels, Event, Population};
use super::sample_config::SampleConfig;
use super::samplers::{
    sample_dead, sample_debris, sample_doublets, sample_singlets, MarkerParams, PopulationBlock,
    ScatterParams,
};

/// SampleAssembler turns a SampleConfig into one event table.
///
/// Populations are generated in the fixed order debris, dead, live singlets, doublets and
/// given contiguous 1-based event ids in that order. Outliers are then injected across the
/// whole sample and every channel is clamped to zero. Gate flags are left unset; see
/// [`crate::gating`].
#[derive(Debug)]
pub struct SampleAssembler<'a> {
    config: &'a SampleConfig,
}

impl<'a> SampleAssembler<'a> {
    /// Create a new SampleAssembler, rejecting an invalid configuration before any sampling
    pub fn new(config: &'a SampleConfig) -> Result<Self, AssemblerError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Generate all events of the sample, consuming the random source in the order
    /// debris, dead, singlets, doublets, outliers.
    pub fn assemble<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<Event>, AssemblerError> {
        let sizes = self.config.population_sizes();
        let scatter = ScatterParams::from(self.config);
        let markers = MarkerParams::from(self.config);

        let blocks = [
            (Population::Debris, sample_debris(rng, sizes.debris)?),
            (Population::Dead, sample_dead(rng, sizes.dead, &scatter)?),
            (
                Population::LiveSinglet,
                sample_singlets(rng, sizes.singlets, &scatter, &markers)?,
            ),
            (
                Population::Doublet,
                sample_doublets(rng, sizes.doublets, &scatter, &markers)?,
            ),
        ];

        let mut events = self.label_blocks(blocks);
        inject_outliers(rng, &mut events, sizes.outliers)?;
        for event in events.iter_mut() {
            event.channels.clamp_non_negative();
        }

        spdlog::debug!(
            "Assembled sample {}: {} debris, {} dead, {} singlets, {} doublets, {} outliers",
            self.config.sample_id,
            sizes.debris,
            sizes.dead,
            sizes.singlets,
            sizes.doublets,
            sizes.outliers
        );
        Ok(events)
    }

    /// Concatenate the population blocks, assigning event ids and labels
    fn label_blocks(&self, blocks: [(Population, PopulationBlock); 4]) -> Vec<Event> {
        let mut events: Vec<Event> = Vec::with_capacity(self.config.n_events);
        for (population, block) in blocks {
            for channels in block.into_channels() {
                // n_events is bounded by u32::MAX in validate
                events.push(Event {
                    sample_id: self.config.sample_id.clone(),
                    event_id: (events.len() + 1) as u32,
                    channels,
                    population,
                    outlier: false,
                    id_live: false,
                    id_size: false,
                });
            }
        }
        events
    }
}

/// Perturb the scatter of `count` distinct events chosen uniformly from the whole sample.
///
/// All FSC-A factors are drawn before the SSC-A factors.
pub fn inject_outliers<R: Rng + ?Sized>(
    rng: &mut R,
    events: &mut [Event],
    count: usize,
) -> Result<(), SamplerError> {
    let count = count.min(events.len());
    if count == 0 {
        return Ok(());
    }
    let chosen = index::sample(rng, events.len(), count).into_vec();
    let factor = Uniform::new(OUTLIER_FACTOR_RANGE.0, OUTLIER_FACTOR_RANGE.1)?;
    let fsc_factors: Vec<f64> = (0..count).map(|_| factor.sample(rng)).collect();
    let ssc_factors: Vec<f64> = (0..count).map(|_| factor.sample(rng)).collect();

    for (n, idx) in chosen.into_iter().enumerate() {
        let event = &mut events[idx];
        event.channels = Channels {
            fsc_a: event.channels.fsc_a * fsc_factors[n],
            ssc_a: event.channels.ssc_a * ssc_factors[n],
            ..event.channels
        };
        event.outlier = true;
    }
    Ok(())
}
