//! Dictionary metadata and packed marker codes.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// An ArUco-style dictionary.
///
/// JSON form: `{ "name": ..., "marker_size": 5, "max_correction_bits": 0, "codes": [...] }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dictionary {
    /// Human-readable name (for logging and reports).
    pub name: String,
    /// Marker side length (number of inner bits per side).
    pub marker_size: usize,
    /// Maximum error-correcting Hamming distance supported by the dictionary.
    #[serde(default)]
    pub max_correction_bits: u8,
    /// One `u64` per marker id, encoding the inner `marker_size × marker_size` bits.
    ///
    /// Bits are stored in row-major order with **black = 1**.
    pub codes: Vec<u64>,
}

#[derive(thiserror::Error, Debug)]
pub enum DictionaryError {
    #[error("marker_size {marker_size} implies {bits} bits (supported: 1..=64)")]
    UnsupportedSize { marker_size: usize, bits: usize },
    #[error("dictionary '{name}' has no codes")]
    Empty { name: String },
    #[error("code #{id} (0x{code:x}) uses bits beyond the {bits}-bit marker")]
    CodeOverflow { id: usize, code: u64, bits: usize },
    #[error("unknown built-in dictionary '{0}'")]
    UnknownBuiltin(String),
    #[error("failed to read dictionary file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse dictionary JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Dictionary {
    /// Total number of inner bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Check size limits and that every code fits in `bit_count()` bits.
    pub fn validate(&self) -> Result<(), DictionaryError> {
        let bits = self.bit_count();
        if bits == 0 || bits > 64 {
            return Err(DictionaryError::UnsupportedSize {
                marker_size: self.marker_size,
                bits,
            });
        }
        if self.codes.is_empty() {
            return Err(DictionaryError::Empty {
                name: self.name.clone(),
            });
        }
        if bits < 64 {
            let mask = (1u64 << bits) - 1;
            if let Some((id, &code)) = self.codes.iter().enumerate().find(|(_, &c)| c & !mask != 0)
            {
                return Err(DictionaryError::CodeOverflow { id, code, bits });
            }
        }
        Ok(())
    }

    /// Parse and validate a dictionary from JSON text.
    pub fn from_json_str(raw: &str) -> Result<Self, DictionaryError> {
        let dict: Dictionary = serde_json::from_str(raw)?;
        dict.validate()?;
        Ok(dict)
    }

    /// Read, parse and validate a dictionary JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
