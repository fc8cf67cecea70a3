/// Reconstruction settings shared by the foreign entry point and the CLI
use crate::constants::{CELL_SIZE, DEFAULT_TOLERANCE, GRID_CAPACITY, NORMAL_BATCH_SIZE};
use serde::{Deserialize, Serialize};

/// Reconstruction strategy requested by the host.
/// Only `Subdiv` is implemented; the selector is carried but never consulted.
#[repr(u32)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReconstructMode {
    #[default]
    Subdiv = 0,
    Topology = 1,
}

impl ReconstructMode {
    /// Decode a raw selector, `None` for values the host should not send.
    pub fn from_raw(raw: u32) -> Option<Self> {
        match raw {
            0 => Some(ReconstructMode::Subdiv),
            1 => Some(ReconstructMode::Topology),
            _ => None,
        }
    }
}

/// How the data-parallel phases are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Execution {
    #[default]
    Parallel,
    Sequential,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructSettings {
    /// Spatial index cell edge length.
    pub cell_size: f64,
    /// Total cell count above which the index switches to a hash map.
    pub grid_capacity: u64,
    /// Vertices per normal accumulation batch; bounds scratch memory per worker.
    pub normal_batch_size: usize,
    pub execution: Execution,
    /// Rayon pool size, `None` for one worker per hardware thread.
    pub worker_threads: Option<usize>,
    pub mode: ReconstructMode,
    pub tolerance: f64,
}

impl Default for ReconstructSettings {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE,
            grid_capacity: GRID_CAPACITY,
            normal_batch_size: NORMAL_BATCH_SIZE,
            execution: Execution::Parallel,
            worker_threads: None,
            mode: ReconstructMode::Subdiv,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl ReconstructSettings {
    /// Same settings with every phase forced onto the calling thread.
    pub fn sequential(mut self) -> Self {
        self.execution = Execution::Sequential;
        self
    }
}
