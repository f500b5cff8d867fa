// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error types.

/// Errors surfaced by the API client and the boundary workflows.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// User-supplied boundary text or file is not valid GeoJSON.
    #[error("Invalid GeoJSON: {0}")]
    MalformedInput(String),

    #[error("Unsupported boundary file: {0} (expected .zip shapefile or .kml)")]
    UnsupportedUpload(String),

    /// Non-2xx response. The message is the server's response body.
    #[error("{body}")]
    Http { status: u16, body: String },

    #[error("Request failed: {0}")]
    Network(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether the error matters to the user's task and belongs in a notification.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, AppError::Internal(_))
    }

    /// HTTP status for server-side rejections.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Decode(err.to_string())
        } else {
            AppError::Network(err.to_string())
        }
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, AppError>;
