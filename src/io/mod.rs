//! Persistence for saved surrogates.
//!
//! A saved surrogate occupies up to three gzip-compressed payload files in
//! one directory (see the filename constants). Each payload is wrapped in a
//! versioned envelope and serialized with either bincode (default) or JSON.
//! The inner codec is sniffed on load: a JSON envelope begins with `{`,
//! while a bincode envelope begins with the little-endian schema version,
//! so the two never collide.
//!
//! All I/O is synchronous and unlocked; concurrent dump/load on the same
//! directory is unsupported.

use crate::core::error::{Result, SurrogateError};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// Parameters payload: hyperparameters, configuration space, column order
/// and the trained flag.
pub const PARAMS_FILENAME: &str = "params.bin.gz";
/// Label-column index payload; present only for trained surrogates.
pub const HEADERS_FILENAME: &str = "label_headers.bin.gz";
/// Fitted pipeline/search payload; present only for trained surrogates.
pub const MODEL_FILENAME: &str = "model.bin.gz";

const SCHEMA_VERSION: u32 = 1;

/// Inner serialization codec for persisted payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Format {
    /// Compact binary encoding (default)
    #[default]
    Bincode,
    /// Human-readable encoding, for debugging saved surrogates
    Json,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope<T> {
    schema_version: u32,
    payload: T,
}

/// Serialize `value` into a gzip-compressed payload file.
pub fn save_payload<T: Serialize, P: AsRef<Path>>(
    path: P,
    value: &T,
    format: Format,
) -> Result<()> {
    let envelope = Envelope {
        schema_version: SCHEMA_VERSION,
        payload: value,
    };
    let file = File::create(path.as_ref())?;
    let mut encoder = GzEncoder::new(file, Compression::default());
    match format {
        Format::Bincode => bincode::serialize_into(&mut encoder, &envelope)?,
        Format::Json => serde_json::to_writer(&mut encoder, &envelope)?,
    }
    encoder.finish()?;
    Ok(())
}

/// Read a gzip-compressed payload file written by [`save_payload`].
///
/// A missing file surfaces as an I/O error; a corrupt or incompatible
/// payload as a serialization error.
pub fn load_payload<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let file = File::open(path.as_ref())?;
    let mut decoder = GzDecoder::new(file);
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;

    if bytes.is_empty() {
        return Err(SurrogateError::serialization(format!(
            "payload file '{}' is empty",
            path.as_ref().display()
        )));
    }
    let envelope: Envelope<T> = if bytes[0] == b'{' {
        serde_json::from_slice(&bytes)?
    } else {
        bincode::deserialize(&bytes)?
    };
    if envelope.schema_version != SCHEMA_VERSION {
        return Err(SurrogateError::serialization(format!(
            "unsupported payload schema version {} in '{}'",
            envelope.schema_version,
            path.as_ref().display()
        )));
    }
    Ok(envelope.payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        values: Vec<f64>,
    }

    fn sample() -> Sample {
        Sample {
            name: "valid_acc".into(),
            values: vec![0.25, 0.5, 0.125],
        }
    }

    #[test]
    fn test_bincode_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PARAMS_FILENAME);
        save_payload(&path, &sample(), Format::Bincode).unwrap();
        let loaded: Sample = load_payload(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_json_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PARAMS_FILENAME);
        save_payload(&path, &sample(), Format::Json).unwrap();
        let loaded: Sample = load_payload(&path).unwrap();
        assert_eq!(loaded, sample());
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let err =
            load_payload::<Sample, _>(dir.path().join(MODEL_FILENAME)).unwrap_err();
        assert_eq!(err.category(), "io");
    }

    #[test]
    fn test_corrupt_payload_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(HEADERS_FILENAME);
        std::fs::write(&path, b"not a gzip stream").unwrap();
        assert!(load_payload::<Sample, _>(&path).is_err());
    }
}
