//! Error types for the items API client.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers distinguish "the item
//! does not exist" from other failures. Every other non-2xx status lands in
//! `Http` with the raw body kept intact, since the error translator reads
//! the server's `detail` field from it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server returned 404.
    #[error("resource not found")]
    NotFound { body: String },

    /// The server returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The request never produced a response.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl ApiError {
    /// Raw response body, for errors that carry one.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::NotFound { body } | ApiError::Http { body, .. } => Some(body),
            _ => None,
        }
    }

    /// HTTP status, for errors produced by a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::NotFound { .. } => Some(404),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
