//! Text encodings for structured data.
//!
//! Provides [`encode`] and [`decode`] for any serde type (including
//! [`Value`](super::Value)) in JSON or RON, plus file helpers that pick the
//! format from the extension.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::DataError;

/// Supported text formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// JSON, the default asset format.
    #[default]
    Json,
    /// RON (Rusty Object Notation).
    Ron,
}

impl Format {
    /// Infers the format from a file extension (`.json`, `.ron`).
    pub fn from_path(path: &Path) -> Result<Self, DataError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Ok(Format::Json),
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Ok(Format::Ron),
            _ => Err(DataError::UnknownFormat(path.to_path_buf())),
        }
    }
}

/// Encode a serde-serializable value as pretty-printed text.
pub fn encode<T: Serialize + ?Sized>(value: &T, format: Format) -> Result<String, DataError> {
    match format {
        Format::Json => {
            serde_json::to_string_pretty(value).map_err(|e| DataError::Format(e.to_string()))
        }
        Format::Ron => ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
            .map_err(|e| DataError::Format(e.to_string())),
    }
}

/// Decode text in the given format.
pub fn decode<T: DeserializeOwned>(text: &str, format: Format) -> Result<T, DataError> {
    match format {
        Format::Json => serde_json::from_str(text).map_err(|e| DataError::Format(e.to_string())),
        Format::Ron => ron::from_str(text).map_err(|e| DataError::Format(e.to_string())),
    }
}

/// Read and decode a file. The format follows the extension unless given.
pub fn load_file<T: DeserializeOwned>(
    path: impl AsRef<Path>,
    format: Option<Format>,
) -> Result<T, DataError> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => Format::from_path(path)?,
    };
    let text = std::fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Loaded {} bytes from {}", text.len(), path.display());
    decode(&text, format)
}

/// Encode and write a file. The format follows the extension unless given.
pub fn save_file<T: Serialize + ?Sized>(
    path: impl AsRef<Path>,
    value: &T,
    format: Option<Format>,
) -> Result<(), DataError> {
    let path = path.as_ref();
    let format = match format {
        Some(format) => format,
        None => Format::from_path(path)?,
    };
    let text = encode(value, format)?;
    std::fs::write(path, text).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })
}
