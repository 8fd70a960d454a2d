use thiserror::Error;

use crate::types::SampleKind;

#[derive(Error, Debug)]
pub enum Error {
    // Identifier errors
    #[error("Invalid device path: {message}")]
    InvalidDevicePath { message: String },

    #[error("Invalid device name: {message}")]
    InvalidDeviceName { message: String },

    #[error("Invalid card id: {message}")]
    InvalidCardId { message: String },

    // Sample vocabulary errors
    #[error("Unknown sample kind: {value}")]
    UnknownSampleKind { value: String },

    #[error("Unknown depletion marker: {value}")]
    UnknownDepletionMarker { value: String },

    #[error("{kind} sample takes {expected} traits, got {actual}")]
    WrongTraitCount {
        kind: SampleKind,
        expected: usize,
        actual: usize,
    },

    #[error("{kind} sample requires a depletion marker")]
    MissingDepletionMarker { kind: SampleKind },

    #[error("{kind} sample does not take a depletion marker")]
    UnexpectedDepletionMarker { kind: SampleKind },

    // Wire errors
    #[error("Line of {length} bytes exceeds the {max} byte limit")]
    LineTooLong { length: usize, max: usize },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an invalid-device-path error.
    pub fn invalid_device_path(message: impl Into<String>) -> Self {
        Self::InvalidDevicePath {
            message: message.into(),
        }
    }

    /// Create an invalid-device-name error.
    pub fn invalid_device_name(message: impl Into<String>) -> Self {
        Self::InvalidDeviceName {
            message: message.into(),
        }
    }

    /// Create an invalid-card-id error.
    pub fn invalid_card_id(message: impl Into<String>) -> Self {
        Self::InvalidCardId {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
