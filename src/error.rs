use std::path::PathBuf;

use thiserror::Error;

/// Front-end error: a message plus the process exit code it maps to.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Fatal dataset load failure.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open trip data '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read trip data header row: {0}")]
    Header(#[source] csv::Error),

    #[error("Missing required column: `{0}`")]
    MissingColumn(&'static str),
}

/// Returned by the forecast when the daily series is too short to fit a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Forecast needs at least 2 daily points, got {points}")]
pub struct InsufficientDataError {
    pub points: usize,
}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        AppError::new(2, err.to_string())
    }
}
