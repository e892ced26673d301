//! Defines application-specific error types.
//!
//! This module provides the `Error` enum, which categorizes every way a single
//! request can fail. Each variant knows the HTTP status it surfaces as and the
//! short, generic message the caller is allowed to see. The `Display` output
//! carries the detailed context (URLs, paths, OS errors) and is meant for the
//! server-side log only.

use axum::http::StatusCode;
use thiserror::Error;

/// Application-specific errors used throughout `repotar`.
#[derive(Error, Debug)]
pub enum Error {
    // --- Request Errors ---
    /// The request could not be interpreted (bad path, bad timeout, bad JSON, missing fields).
    /// The message is safe to show to the caller.
    #[error("Malformed request: {0}")]
    RequestMalformed(String),

    /// The HTTP method is neither GET nor POST.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// The repository host is not in the configured allowlist.
    #[error("Host '{host}' is not in the allowlist")]
    HostNotAllowed {
        /// The rejected host.
        host: String,
    },

    // --- Pipeline Errors ---
    /// The per-request workspace could not be allocated.
    #[error("Failed to create workspace under '{path}': {source}")]
    Resource {
        /// The parent directory the workspace was requested in.
        path: String,
        /// The underlying `std::io::Error`.
        #[source]
        source: std::io::Error,
    },

    /// The snapshot archive could not be downloaded.
    #[error("Failed to download '{url}': {source}")]
    Download {
        /// The snapshot URL that was requested.
        url: String,
        /// What went wrong.
        #[source]
        source: DownloadFailure,
    },

    /// The downloaded zip could not be opened or one of its entries could not be written.
    #[error("Failed to extract '{path}': {source}")]
    Extraction {
        /// The archive or entry path involved.
        path: String,
        /// The underlying `std::io::Error`.
        #[source]
        source: std::io::Error,
    },

    /// The requested subdirectory does not exist in the extracted snapshot.
    #[error("Path does not exist: '{path}'")]
    PathNotFound {
        /// The resolved path that was looked up.
        path: String,
    },

    /// Walking, archiving or compressing the tree failed.
    #[error("Failed to create archive '{path}': {source}")]
    Repack {
        /// The path being archived or written when the failure happened.
        path: String,
        /// The underlying `std::io::Error`.
        #[source]
        source: std::io::Error,
    },

    /// The produced archive could not be opened for streaming.
    #[error("Failed to stream archive '{path}': {source}")]
    Stream {
        /// The archive path.
        path: String,
        /// The underlying `std::io::Error`.
        #[source]
        source: std::io::Error,
    },

    // --- Control Flow ---
    /// The request deadline elapsed before the archive was ready.
    #[error("Request exceeded its timeout of {seconds}s")]
    TimedOut {
        /// The deadline that was exceeded.
        seconds: u64,
    },

    /// The pipeline observed a cancellation (deadline or client disconnect).
    #[error("Operation cancelled")]
    Cancelled,

    /// The worker running the pipeline failed unexpectedly.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// The ways a snapshot download can fail.
#[derive(Error, Debug)]
pub enum DownloadFailure {
    /// The provider answered with a non-success status.
    #[error("provider returned HTTP {0}")]
    Status(reqwest::StatusCode),
    /// DNS, connection or transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Writing the body to disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The body exceeded the configured download limit.
    #[error("archive exceeds the download limit of {0} bytes")]
    TooLarge(u64),
}

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// The HTTP status this error surfaces as.
    pub fn status(&self) -> StatusCode {
        match self {
            Error::RequestMalformed(_) | Error::PathNotFound { .. } => StatusCode::BAD_REQUEST,
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Error::HostNotAllowed { .. } => StatusCode::FORBIDDEN,
            Error::TimedOut { .. } | Error::Cancelled => StatusCode::GATEWAY_TIMEOUT,
            Error::Resource { .. }
            | Error::Download { .. }
            | Error::Extraction { .. }
            | Error::Repack { .. }
            | Error::Stream { .. }
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The short, generic message sent to the caller. Never contains server paths.
    pub fn client_message(&self) -> String {
        match self {
            Error::RequestMalformed(msg) => msg.clone(),
            Error::MethodNotAllowed => "Method not allowed".to_string(),
            Error::HostNotAllowed { .. } => "Repository host is not allowed".to_string(),
            Error::Resource { .. } => "Failed to create temporary directory".to_string(),
            Error::Download { .. } => "Failed to download repository".to_string(),
            Error::Extraction { .. } => "Failed to extract ZIP file".to_string(),
            Error::PathNotFound { .. } => "Specified path does not exist".to_string(),
            Error::Repack { .. } => "Failed to create archive".to_string(),
            Error::Stream { .. } | Error::Internal(_) => "Internal server error".to_string(),
            Error::TimedOut { .. } | Error::Cancelled => "Request timed out".to_string(),
        }
    }
}

/// Helper to create an `Error::Extraction` with path context.
pub fn extraction_error<P: AsRef<std::path::Path>>(source: std::io::Error, path: P) -> Error {
    Error::Extraction {
        path: path.as_ref().display().to_string(),
        source,
    }
}

/// Helper to create an `Error::Repack` with path context.
pub fn repack_error<P: AsRef<std::path::Path>>(source: std::io::Error, path: P) -> Error {
    Error::Repack {
        path: path.as_ref().display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io, path::PathBuf};

    #[test]
    fn test_extraction_error_with_path_helper() {
        let path = PathBuf::from("some/test/repo.zip");
        let source_error = io::Error::new(io::ErrorKind::InvalidData, "invalid Zip archive");
        let error = extraction_error(source_error, &path);

        match &error {
            Error::Extraction {
                path: error_path,
                source,
            } => {
                assert!(error_path.contains("some/test/repo.zip"));
                assert_eq!(source.kind(), io::ErrorKind::InvalidData);
            }
            _ => panic!("Expected Error::Extraction"),
        }
        assert_eq!(error.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_status_mapping_follows_taxonomy() {
        assert_eq!(
            Error::RequestMalformed("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::PathNotFound { path: "p".into() }.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            Error::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        let download = Error::Download {
            url: "https://example.com/a/b/archive/main.zip".into(),
            source: DownloadFailure::Status(reqwest::StatusCode::NOT_FOUND),
        };
        assert_eq!(download.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            Error::TimedOut { seconds: 3 }.status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_client_message_hides_detail() {
        let error = repack_error(
            io::Error::new(io::ErrorKind::PermissionDenied, "Access denied"),
            "/tmp/repo-download-abc/repo/secret",
        );
        let detail = error.to_string();
        let message = error.client_message();

        assert!(detail.contains("/tmp/repo-download-abc/repo/secret"));
        assert!(detail.contains("Access denied"));
        assert_eq!(message, "Failed to create archive");
        assert!(!message.contains("/tmp"));
    }

    #[test]
    fn test_download_error_display_carries_status() {
        let error = Error::Download {
            url: "https://github.com/acme/widgets/archive/v2.zip".into(),
            source: DownloadFailure::Status(reqwest::StatusCode::NOT_FOUND),
        };
        let detail = error.to_string();
        assert!(detail.contains("https://github.com/acme/widgets/archive/v2.zip"));
        assert!(detail.contains("404"));
    }
}
