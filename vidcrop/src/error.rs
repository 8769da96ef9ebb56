/*!
    Error types for vidcrop.
*/

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while opening, trimming, cropping or encoding.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid settings: unsupported codec, bad geometry, malformed markers or keyframes.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A file, stream, decoder or encoder is missing.
    #[error("not found: {0}")]
    NotFound(String),

    /// Decode, filter, encode or mux failure.
    #[error(transparent)]
    Codec(ffmpeg_types::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Job description parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Still image encoding error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

impl From<ffmpeg_types::Error> for Error {
    fn from(e: ffmpeg_types::Error) -> Self {
        match e {
            ffmpeg_types::Error::NotFound { message } => Self::NotFound(message),
            ffmpeg_types::Error::Io(io) if io.kind() == std::io::ErrorKind::NotFound => {
                Self::NotFound(io.to_string())
            }
            other => Self::Codec(other),
        }
    }
}
