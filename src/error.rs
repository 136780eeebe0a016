//! Error types for map generation

use std::fmt;

/// Errors that can occur during map generation or queries
#[derive(Debug, Clone)]
pub enum MapError {
    /// Configuration validation failed
    InvalidConfig(String),
    /// A pipeline stage ran before its prerequisite data was produced
    MissingPrerequisite(&'static str),
    /// Generation failed due to geometry issues
    GenerationFailed(String),
    /// Requested cell ID does not exist
    CellNotFound(usize),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::InvalidConfig(msg) => write!(f, "invalid configuration: {}", msg),
            MapError::MissingPrerequisite(array) => {
                write!(f, "missing prerequisite array: {}", array)
            }
            MapError::GenerationFailed(msg) => write!(f, "generation failed: {}", msg),
            MapError::CellNotFound(id) => write!(f, "cell not found: {}", id),
        }
    }
}

impl std::error::Error for MapError {}

/// Result type alias for map generation operations
pub type Result<T> = std::result::Result<T, MapError>;
