/// Which stage of a run a status message refers to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    #[default]
    Generating,
    Storing,
    Done,
}

/// Progress message sent from the worker running a job to whoever is watching it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkerStatus {
    pub progress: f32,
    pub stage: Stage,
    pub samples_done: usize,
}

impl WorkerStatus {
    pub fn new(progress: f32, stage: Stage, samples_done: usize) -> Self {
        Self {
            progress,
            stage,
            samples_done,
        }
    }
}
