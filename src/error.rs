use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdPulseError {
    #[error("Plan generation failed: {0}")]
    Generation(String),

    #[error("Image generation failed: {0}")]
    ImageGeneration(String),

    #[error("Failed to encode asset {path}: {message}")]
    Encoding { path: String, message: String },

    #[error("Failed to extract valid JSON from response")]
    Extraction,

    #[error("Provider API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Request to provider failed: {0}")]
    Transport(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Video generation failed: {0}")]
    VideoGeneration(String),

    #[error("Video analysis failed: {0}")]
    Analysis(String),
}

/// Error code for JSON output
impl AdPulseError {
    pub fn code(&self) -> &'static str {
        match self {
            AdPulseError::Generation(_) => "GENERATION_FAILED",
            AdPulseError::ImageGeneration(_) => "IMAGE_GENERATION_FAILED",
            AdPulseError::Encoding { .. } => "ENCODING_FAILED",
            AdPulseError::Extraction => "EXTRACTION_FAILED",
            AdPulseError::Api { .. } => "API_ERROR",
            AdPulseError::Transport(_) => "TRANSPORT_ERROR",
            AdPulseError::Timeout(_) => "TIMEOUT",
            AdPulseError::VideoGeneration(_) => "VIDEO_GENERATION_FAILED",
            AdPulseError::Analysis(_) => "ANALYSIS_FAILED",
        }
    }
}

impl From<reqwest::Error> for AdPulseError {
    fn from(err: reqwest::Error) -> Self {
        AdPulseError::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AdPulseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(
            AdPulseError::Generation("x".into()).code(),
            "GENERATION_FAILED"
        );
        assert_eq!(AdPulseError::Extraction.code(), "EXTRACTION_FAILED");
        assert_eq!(
            AdPulseError::Api {
                status: 500,
                body: String::new()
            }
            .code(),
            "API_ERROR"
        );
    }

    #[test]
    fn timeout_reports_sub_second_limits() {
        let err = AdPulseError::Timeout(Duration::from_millis(250));
        assert_eq!(err.to_string(), "Timed out after 250ms");
        assert_eq!(err.code(), "TIMEOUT");
    }
}
