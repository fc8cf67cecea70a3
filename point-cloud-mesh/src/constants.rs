/// Shared configuration for point cloud reconstruction

/// Physical edge length of one spatial index cell (0.1 µm at metre scale)
pub const CELL_SIZE: f64 = 1e-4;

/// Largest cell count backed by a flat grid before falling back to a hash map
pub const GRID_CAPACITY: u64 = 1 << 31;

/// Vertices covered by one normal accumulation batch
pub const NORMAL_BATCH_SIZE: usize = 256_000;

/// Discrete steps per colour ramp band
pub const COLOUR_BAND_STEPS: usize = 255;

/// Number of linear ramps in the depth colour map
pub const COLOUR_BANDS: usize = 5;

/// Total entries in the depth colour lookup table
pub const COLOUR_LUT_LEN: usize = COLOUR_BANDS * COLOUR_BAND_STEPS;

/// Normal assigned to vertices with no incident face area
pub const UP_NORMAL: [f32; 3] = [0.0, 0.0, 1.0];

/// Minimum number of points needed to build a face
pub const MIN_POINTS: usize = 3;

/// Reserved topology tolerance passed through by hosts
pub const DEFAULT_TOLERANCE: f64 = 0.1;
