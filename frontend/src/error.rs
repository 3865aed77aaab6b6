use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::BlogId;

/// Failure of a single REST call. Cloneable so it can sit inside a `LoadState`.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not decode response: {0}")]
    Decode(String),
    #[error("not logged in")]
    Unauthenticated,
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage is not available")]
    Unavailable,
    #[error("could not write key {0}")]
    Write(String),
    #[error("storage file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReactionError {
    #[error("blogs are not loaded")]
    NotLoaded,
    #[error("blog {0} is not on the current page")]
    NotFound(BlogId),
    #[error("a reaction for blog {0} is still waiting for the server")]
    InFlight(BlogId),
}

/// Field name to the messages that failed for it, sorted by field name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<&'static str, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum FormError {
    #[error("invalid form: {0}")]
    Invalid(#[from] ValidationErrors),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("could not store the session: {0}")]
    Storage(String),
}

impl From<StorageError> for FormError {
    fn from(err: StorageError) -> Self {
        FormError::Storage(err.to_string())
    }
}
