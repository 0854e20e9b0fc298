use thiserror::Error;

/// Main error type for the Showreel library
#[derive(Error, Debug)]
pub enum ShowreelError {
    #[error("Playback error: {0}")]
    Playback(#[from] PlaybackError),

    #[error("Gallery error: {0}")]
    Gallery(#[from] GalleryError),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Playback-specific errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Autoplay rejected for clip: {locator}")]
    AutoplayRejected { locator: String },

    #[error("Failed to decode clip: {locator} - {reason}")]
    DecodeFailed { locator: String, reason: String },
}

/// Gallery-specific errors
#[derive(Error, Debug)]
pub enum GalleryError {
    #[error("Failed to probe image dimensions: {locator} - {reason}")]
    ProbeFailed { locator: String, reason: String },

    #[error("Image has zero width: {locator}")]
    ZeroWidth { locator: String },

    #[error("Remote image cannot be probed locally: {locator}")]
    RemoteLocator { locator: String },
}

/// Content-source errors
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Failed to read content export: {path}")]
    ReadFailed { path: String },

    #[error("Failed to parse content export: {path} - {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid content type name: {name}")]
    InvalidContentType { name: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using ShowreelError
pub type Result<T> = std::result::Result<T, ShowreelError>;

impl ShowreelError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::Config(ConfigError::InvalidValue { key, value }) => {
                format!("Configuration key '{}' has an invalid value '{}'.", key, value)
            }
            Self::Content(ContentError::ReadFailed { path }) => {
                format!("Could not read content export '{}'. Please check the directory exists.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_names_the_key() {
        let err: ShowreelError = ConfigError::InvalidValue {
            key: "sequencer.window_size".to_string(),
            value: "7".to_string(),
        }
        .into();
        assert_eq!(
            err.user_message(),
            "Configuration key 'sequencer.window_size' has an invalid value '7'."
        );
    }

    #[test]
    fn test_user_message_falls_back_to_display() {
        let err: ShowreelError = PlaybackError::DecodeFailed {
            locator: "intro.mp4".to_string(),
            reason: "truncated".to_string(),
        }
        .into();
        assert_eq!(
            err.user_message(),
            "Playback error: Failed to decode clip: intro.mp4 - truncated"
        );
    }
}
