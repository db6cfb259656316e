use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TerrainError {
    #[error("invalid grid dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("expected {expected} samples, got {actual}")]
    SampleCountMismatch { expected: usize, actual: usize },

    #[error("sample {index} is not a finite number")]
    NonFiniteSample { index: usize },

    #[error("horizontal spacing must be positive and finite, got {0}")]
    InvalidSpacing(f32),

    #[error("parameter `{name}` has invalid value {value}")]
    InvalidParameter { name: &'static str, value: f32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    #[error("path has no waypoints")]
    EmptyPath,

    #[error("line {line}: `{token}` is not a number")]
    InvalidNumber { line: usize, token: String },

    #[error("line {line}: waypoint has {values} value(s), expected 3")]
    IncompleteWaypoint { line: usize, values: usize },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("setting `{name}` has invalid value {value}")]
    InvalidSetting { name: &'static str, value: f32 },
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Terrain(#[from] TerrainError),

    #[error(transparent)]
    Path(#[from] PathError),
}
