//! Utilities for the `opgenesis` binary.

use crate::validate::ValidationError;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Reads and decodes a JSON file.
///
/// ## Takes
/// - `path` - The path of the JSON file.
///
/// ## Returns
/// - `Result<T, ValidationError>` - The decoded value, or the read / parse error.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ValidationError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ValidationError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_str(&content).map_err(|source| ValidationError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
