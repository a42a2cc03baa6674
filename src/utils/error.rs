use thiserror::Error;

use crate::domain::model::InputFormat;

#[derive(Error, Debug)]
pub enum ConvertError {
    /// The content does not conform to the claimed or detected format's grammar.
    #[error("invalid {format} input: {message}")]
    Parse {
        format: InputFormat,
        message: String,
    },

    /// The content parsed, but does not decode to a non-empty sequence of
    /// field-mappings.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// A format tag outside the recognized set.
    #[error("unsupported format tag: {tag}")]
    UnknownFormat { tag: String },

    /// Auto-detection exhausted every parser. Keeps each attempt's error so
    /// nothing is discarded on the way up.
    #[error("unable to detect input format; attempted {}", format_attempts(.attempts))]
    DetectionExhausted {
        attempts: Vec<(InputFormat, String)>,
    },

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConvertError {
    pub fn parse(format: InputFormat, message: impl Into<String>) -> Self {
        Self::Parse {
            format,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

fn format_attempts(attempts: &[(InputFormat, String)]) -> String {
    attempts
        .iter()
        .map(|(format, message)| format!("{format} ({message})"))
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, ConvertError>;
