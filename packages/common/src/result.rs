use crate::error::{PlotError, StoreError};

/// Result of a plot operation
pub type PlotResult<T> = Result<T, PlotError>;

/// Result of a persistence backend call
pub type StoreResult<T> = Result<T, StoreError>;
