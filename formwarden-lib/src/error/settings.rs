//! Settings loading error types

/// Errors that can occur while loading validator settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    /// The settings document is malformed.
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}
