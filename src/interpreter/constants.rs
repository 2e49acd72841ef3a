// Default limits for the engine, explorer and trace recorder

/// Maximum number of scheduled steps before `run` gives up
pub const DEFAULT_STEP_BUDGET: usize = 10_000;

/// Maximum number of micro-steps an atomic block may take internally.
/// Also bounds the detector's search for faults inside atomic blocks.
pub const DEFAULT_ATOMIC_FUEL: usize = 1_000;

/// Maximum path length for exhaustive exploration
pub const DEFAULT_EXPLORE_DEPTH: usize = 64;

/// Maximum number of leaves (finished, faulted or truncated paths) the
/// explorer visits before stopping
pub const DEFAULT_EXPLORE_PATHS: usize = 200_000;

/// Snapshot memory limit for recorded traces (64 MB)
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 64 * 1024 * 1024;
