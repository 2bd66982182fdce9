use std::fmt::Display;

/// The generating process of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Population {
    Debris,
    Dead,
    LiveSinglet,
    Doublet,
}

impl Population {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Debris => "debris",
            Self::Dead => "dead",
            Self::LiveSinglet => "live_singlet",
            Self::Doublet => "doublet",
        }
    }

    /// Live singlets and doublets are the only populations that can pass the live gate, and
    /// the only ones used to calibrate its scatter cap.
    pub fn is_live(&self) -> bool {
        matches!(self, Self::LiveSinglet | Self::Doublet)
    }
}

impl Display for Population {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// The six measured channels of an event
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Channels {
    pub fsc_a: f64,
    pub ssc_a: f64,
    pub fsc_h: f64,
    pub fl1_a: f64,
    pub fl2_a: f64,
    pub fl3_a: f64,
}

impl Channels {
    /// Channel values in the canonical column order (FSC-A, SSC-A, FSC-H, FL1-A, FL2-A, FL3-A)
    pub fn as_array(&self) -> [f64; 6] {
        [
            self.fsc_a, self.ssc_a, self.fsc_h, self.fl1_a, self.fl2_a, self.fl3_a,
        ]
    }

    /// Clamp every channel to a minimum of zero
    pub fn clamp_non_negative(&mut self) {
        self.fsc_a = self.fsc_a.max(0.0);
        self.ssc_a = self.ssc_a.max(0.0);
        self.fsc_h = self.fsc_h.max(0.0);
        self.fl1_a = self.fl1_a.max(0.0);
        self.fl2_a = self.fl2_a.max(0.0);
        self.fl3_a = self.fl3_a.max(0.0);
    }
}

/// One flow cytometry measurement row
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub sample_id: String,
    pub event_id: u32,
    pub channels: Channels,
    pub population: Population,
    pub outlier: bool,
    pub id_live: bool,
    pub id_size: bool,
}

impl Event {
    /// The population label as written to the events relation, with the `_outlier` suffix
    /// if the event was perturbed.
    pub fn population_label(&self) -> String {
        if self.outlier {
            format!("{}_outlier", self.population.label())
        } else {
            self.population.label().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_label() {
        let mut event = Event {
            sample_id: String::from("s"),
            event_id: 1,
            channels: Channels::default(),
            population: Population::Dead,
            outlier: false,
            id_live: false,
            id_size: false,
        };
        assert_eq!(event.population_label(), "dead");
        event.outlier = true;
        assert_eq!(event.population_label(), "dead_outlier");
        event.population = Population::LiveSinglet;
        assert_eq!(event.population_label(), "live_singlet_outlier");
    }

    #[test]
    fn test_clamp() {
        let mut channels = Channels {
            fsc_a: -1.0,
            ssc_a: 2.0,
            fsc_h: -0.5,
            fl1_a: 0.0,
            fl2_a: 3.0,
            fl3_a: -10.0,
        };
        channels.clamp_non_negative();
        assert_eq!(channels.as_array(), [0.0, 2.0, 0.0, 0.0, 3.0, 0.0]);
    }
}
