use serde::{Deserialize, Serialize};

use super::error::SampleConfigError;

/// Generation parameters for a single synthetic sample.
///
/// Scatter channels are log-normal; `fsc_mean`/`ssc_mean` are on the linear scale
/// (the distribution is centered on `ln(mean)`) and `fsc_sd`/`ssc_sd` are on the log scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    pub sample_id: String,
    pub n_events: usize,
    pub debris_pct: f64,
    pub dead_pct: f64,
    pub singlet_pct: f64,
    pub fsc_mean: f64,
    pub fsc_sd: f64,
    pub ssc_mean: f64,
    pub ssc_sd: f64,
    pub fl2_pos_pct: f64,
    pub fl3_pos_pct: f64,
    pub outlier_pct: f64,
}

/// Number of events generated for each population of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopulationSizes {
    pub debris: usize,
    pub dead: usize,
    pub singlets: usize,
    pub doublets: usize,
    pub outliers: usize,
}

impl PopulationSizes {
    pub fn total(&self) -> usize {
        self.debris + self.dead + self.singlets + self.doublets
    }
}

/// Round half to even, which is how the count arithmetic has always been done for these
/// datasets (`round(2.5) == 2`).
pub fn round_count(value: f64) -> usize {
    let rounded = value.round_ties_even();
    if rounded <= 0.0 {
        0
    } else {
        rounded as usize
    }
}

impl SampleConfig {
    /// Check the configuration, failing fast on any fraction outside of [0, 1] or on
    /// debris and dead fractions that leave a negative live remainder.
    pub fn validate(&self) -> Result<(), SampleConfigError> {
        if self.sample_id.trim().is_empty() {
            return Err(SampleConfigError::EmptySampleId);
        }
        if self.n_events == 0 {
            return Err(SampleConfigError::NoEvents(self.sample_id.clone()));
        }
        if self.n_events > u32::MAX as usize {
            return Err(SampleConfigError::TooManyEvents(
                self.sample_id.clone(),
                self.n_events,
            ));
        }

        let fractions = [
            ("debris_pct", self.debris_pct),
            ("dead_pct", self.dead_pct),
            ("singlet_pct", self.singlet_pct),
            ("fl2_pos_pct", self.fl2_pos_pct),
            ("fl3_pos_pct", self.fl3_pos_pct),
            ("outlier_pct", self.outlier_pct),
        ];
        for (field, value) in fractions {
            // NaN fails the range check too
            if !(0.0..=1.0).contains(&value) {
                return Err(SampleConfigError::FractionOutOfRange {
                    sample: self.sample_id.clone(),
                    field,
                    value,
                });
            }
        }

        let removed = self.debris_pct + self.dead_pct;
        if removed > 1.0 {
            return Err(SampleConfigError::FractionSumExceeded(
                self.sample_id.clone(),
                removed,
            ));
        }

        for (field, value) in [("fsc_mean", self.fsc_mean), ("ssc_mean", self.ssc_mean)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(SampleConfigError::BadScatterParameter {
                    sample: self.sample_id.clone(),
                    field,
                    value,
                });
            }
        }
        for (field, value) in [("fsc_sd", self.fsc_sd), ("ssc_sd", self.ssc_sd)] {
            if !value.is_finite() || value < 0.0 {
                return Err(SampleConfigError::BadScatterParameter {
                    sample: self.sample_id.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }

    /// Split the event count into populations.
    ///
    /// Debris and dead counts are rounded first and the live count is the remainder, so the
    /// total is always exactly `n_events`. Singlets are rounded within the live remainder.
    /// Assumes the configuration is valid.
    pub fn population_sizes(&self) -> PopulationSizes {
        let n = self.n_events;
        let debris = round_count(n as f64 * self.debris_pct).min(n);
        let dead = round_count(n as f64 * self.dead_pct).min(n - debris);
        let live = n - debris - dead;
        let singlets = round_count(live as f64 * self.singlet_pct).min(live);
        PopulationSizes {
            debris,
            dead,
            singlets,
            doublets: live - singlets,
            outliers: round_count(n as f64 * self.outlier_pct).min(n),
        }
    }

    /// A healthy, mostly live sample
    pub fn healthy(sample_id: &str) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            n_events: 10_000,
            debris_pct: 0.05,
            dead_pct: 0.10,
            singlet_pct: 0.90,
            fsc_mean: 50_000.0,
            fsc_sd: 0.25,
            ssc_mean: 30_000.0,
            ssc_sd: 0.30,
            fl2_pos_pct: 0.30,
            fl3_pos_pct: 0.10,
            outlier_pct: 0.01,
        }
    }

    /// A stimulated sample with larger cells, more debris and higher marker expression
    pub fn stimulated(sample_id: &str) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            n_events: 15_000,
            debris_pct: 0.10,
            dead_pct: 0.15,
            singlet_pct: 0.85,
            fsc_mean: 60_000.0,
            fsc_sd: 0.30,
            ssc_mean: 35_000.0,
            ssc_sd: 0.35,
            fl2_pos_pct: 0.60,
            fl3_pos_pct: 0.25,
            outlier_pct: 0.02,
        }
    }

    /// A failed sample where almost everything is dead
    pub fn failed(sample_id: &str) -> Self {
        Self {
            sample_id: sample_id.to_string(),
            n_events: 20_000,
            debris_pct: 0.05,
            dead_pct: 0.90,
            singlet_pct: 0.80,
            fsc_mean: 45_000.0,
            fsc_sd: 0.35,
            ssc_mean: 32_000.0,
            ssc_sd: 0.40,
            fl2_pos_pct: 0.20,
            fl3_pos_pct: 0.05,
            outlier_pct: 0.03,
        }
    }

    /// The standard three sample set: healthy, stimulated, failed
    pub fn standard_set() -> Vec<Self> {
        vec![
            Self::healthy("sample_01"),
            Self::stimulated("sample_02"),
            Self::failed("sample_03"),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_count_ties_to_even() {
        assert_eq!(round_count(2.5), 2);
        assert_eq!(round_count(3.5), 4);
        assert_eq!(round_count(2.4), 2);
        assert_eq!(round_count(-1.0), 0);
    }

    #[test]
    fn test_population_sizes_preserve_total() {
        let mut config = SampleConfig::healthy("s");
        config.n_events = 1001;
        config.debris_pct = 0.033;
        config.dead_pct = 0.071;
        config.singlet_pct = 0.77;
        let sizes = config.population_sizes();
        assert_eq!(sizes.total(), 1001);
        assert_eq!(sizes.debris, 33);
        assert_eq!(sizes.dead, 71);
        assert_eq!(sizes.singlets, 691);
        assert_eq!(sizes.doublets, 1001 - 33 - 71 - 691);
    }

    #[test]
    fn test_failed_profile_sizes() {
        let config = SampleConfig::failed("s");
        let sizes = config.population_sizes();
        assert_eq!(sizes.dead, 18_000);
        assert_eq!(sizes.debris, 1_000);
        assert_eq!(sizes.singlets + sizes.doublets, 1_000);
        assert_eq!(sizes.outliers, 600);
    }

    #[test]
    fn test_standard_set_is_valid() {
        for config in SampleConfig::standard_set() {
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_rejects_fraction_sum() {
        let mut config = SampleConfig::healthy("s");
        config.debris_pct = 0.6;
        config.dead_pct = 0.5;
        match config.validate() {
            Err(SampleConfigError::FractionSumExceeded(id, _)) => assert_eq!(id, "s"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_rejects_out_of_range_fraction() {
        let mut config = SampleConfig::healthy("s");
        config.singlet_pct = 1.2;
        assert!(matches!(
            config.validate(),
            Err(SampleConfigError::FractionOutOfRange {
                field: "singlet_pct",
                ..
            })
        ));

        let mut config = SampleConfig::healthy("s");
        config.outlier_pct = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = SampleConfig::healthy("s");
        config.dead_pct = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_scatter_and_counts() {
        let mut config = SampleConfig::healthy("s");
        config.fsc_mean = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SampleConfigError::BadScatterParameter { field: "fsc_mean", .. })
        ));

        let mut config = SampleConfig::healthy("s");
        config.n_events = 0;
        assert_eq!(
            config.validate(),
            Err(SampleConfigError::NoEvents(String::from("s")))
        );

        let mut config = SampleConfig::healthy("s");
        config.n_events = u32::MAX as usize + 1;
        assert!(matches!(
            config.validate(),
            Err(SampleConfigError::TooManyEvents(_, _))
        ));

        let config = SampleConfig::healthy("  ");
        assert_eq!(config.validate(), Err(SampleConfigError::EmptySampleId));
    }
}
