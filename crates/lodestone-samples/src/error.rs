use thiserror::Error;

use lodestone_core::SampleKind;

/// Errors from parsing or generating samples.
#[derive(Error, Debug)]
pub enum SampleError {
    /// A token did not name any variant of the expected attribute.
    #[error("Unknown {field}: {value:?}")]
    UnknownAttribute { field: &'static str, value: String },

    /// An origin label outside the known site tables.
    #[error("Unknown origin: {value:?}")]
    UnknownOrigin { value: String },

    /// The origin's tables hold no candidates for this attribute.
    #[error("Origin {origin:?} has no {field} candidates")]
    EmptyPool { origin: String, field: &'static str },

    /// A wire token list with the wrong shape for its sample kind.
    #[error("{kind} wire form takes {expected} tokens, got {actual}")]
    WrongTokenCount {
        kind: SampleKind,
        expected: usize,
        actual: usize,
    },

    #[error(transparent)]
    Core(#[from] lodestone_core::Error),
}

impl SampleError {
    /// Create an unknown-attribute error.
    pub fn unknown_attribute(field: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownAttribute {
            field,
            value: value.into(),
        }
    }

    /// Create an empty-pool error.
    pub fn empty_pool(origin: impl Into<String>, field: &'static str) -> Self {
        Self::EmptyPool {
            origin: origin.into(),
            field,
        }
    }
}

pub type Result<T> = std::result::Result<T, SampleError>;
