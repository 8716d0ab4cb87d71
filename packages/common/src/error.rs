use thiserror::Error;

/// Failure reported by a persistence backend.
///
/// A backend call either completes with a value or fails with one of these,
/// never both.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Backend unavailable")]
    Unavailable,

    #[error("Store is closed")]
    Closed,
}

/// Rejected level settings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Level name must not be empty")]
    EmptyLevelName,

    #[error("Plot size must be at least 1, got {0}")]
    PlotSizeTooSmall(u32),

    #[error("Block id for {0} must not be empty")]
    EmptyBlock(&'static str),

    #[error("Invalid height range {min_y}..={max_y} for ground height {ground_height}")]
    InvalidHeightRange {
        min_y: i64,
        max_y: i64,
        ground_height: i64,
    },
}

/// Error channel of every plot operation.
///
/// Validation failures and hook vetoes are not errors; they surface as
/// `Ok(false)`. An `Err` means the outcome could not be determined.
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Persistence error: {0}")]
    Store(#[from] StoreError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}
