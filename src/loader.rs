//! Schema loading from various sources.
//!
//! Handles loading SDL from files, strings, and HTTP URLs and parsing it
//! into a [`ServiceDocument`].

use std::path::Path;

use async_graphql_parser::{parse_schema, types::ServiceDocument};

use crate::error::{CompileError, LoadError};

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Read a text file, such as a schema or a JSON payload.
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if the file doesn't exist,
/// or `LoadError::ReadError` if it can't be read.
pub fn read_text(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    std::fs::read_to_string(path).map_err(|source| LoadError::ReadError {
        path: path.to_path_buf(),
        source,
    })
}

/// Load and parse a schema from a file path.
///
/// # Errors
///
/// Returns `CompileError::Load` if the file can't be read,
/// or `CompileError::Parse` if it isn't valid SDL.
pub fn load_schema(path: &Path) -> Result<ServiceDocument, CompileError> {
    let content = read_text(path)?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "loaded schema file");
    load_schema_str(&content)
}

/// Parse a schema from SDL text.
///
/// # Errors
///
/// Returns `CompileError::Parse` if the text isn't valid SDL.
pub fn load_schema_str(content: &str) -> Result<ServiceDocument, CompileError> {
    parse_schema(content).map_err(|source| CompileError::Parse { source })
}

/// Fetch raw schema text from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::NetworkError` if the request fails or the server
/// answers with an error status.
#[cfg(feature = "remote")]
pub fn fetch_schema(url: &str) -> Result<String, LoadError> {
    let network = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network)?;

    // Check for HTTP errors before reading the body
    client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network)
}

/// Load and parse a schema from an HTTP/HTTPS URL.
///
/// # Errors
///
/// Returns `CompileError::Load` if the fetch fails,
/// or `CompileError::Parse` if the body isn't valid SDL.
#[cfg(feature = "remote")]
pub fn load_schema_url(url: &str) -> Result<ServiceDocument, CompileError> {
    let content = fetch_schema(url)?;
    tracing::debug!(url, bytes = content.len(), "fetched schema");
    load_schema_str(&content)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Read raw schema text from a file path or URL.
///
/// URL loading requires the `remote` feature.
pub fn read_schema_auto(source: &str) -> Result<String, LoadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            fetch_schema(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(LoadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        read_text(Path::new(source))
    }
}

/// Load and parse a schema from a file path or URL.
///
/// Automatically detects whether the source is a URL or file path.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub fn load_schema_auto(source: &str) -> Result<ServiceDocument, CompileError> {
    load_schema_str(&read_schema_auto(source)?)
}
