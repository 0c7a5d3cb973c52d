//! Built-in dictionaries.
//!
//! `ARUCO_ORIGINAL` is generated from its construction rule rather than
//! embedded: each of the five rows of a 5×5 marker carries two data bits
//! (columns 1 and 3) and the other three columns are derived from them.

use crate::{Dictionary, DictionaryError};

/// Name of the original 1024-id ArUco dictionary.
pub const ARUCO_ORIGINAL: &str = "ARUCO_ORIGINAL";

/// All names accepted by [`builtin_dictionary`].
pub const BUILTIN_DICTIONARY_NAMES: &[&str] = &[ARUCO_ORIGINAL];

const ORIGINAL_SIDE: usize = 5;
const ORIGINAL_IDS: u32 = 1 << (2 * ORIGINAL_SIDE);

/// Look up a built-in dictionary by name (case-insensitive, `DICT_` prefix optional).
pub fn builtin_dictionary(name: &str) -> Result<Dictionary, DictionaryError> {
    let upper = name.trim().to_ascii_uppercase();
    let key = upper.strip_prefix("DICT_").unwrap_or(&upper);
    match key {
        ARUCO_ORIGINAL => Ok(aruco_original()),
        _ => Err(DictionaryError::UnknownBuiltin(name.to_string())),
    }
}

/// The original ArUco dictionary: 1024 ids of 5×5 bits.
pub fn aruco_original() -> Dictionary {
    Dictionary {
        name: ARUCO_ORIGINAL.to_string(),
        marker_size: ORIGINAL_SIDE,
        max_correction_bits: 0,
        codes: (0..ORIGINAL_IDS).map(original_code).collect(),
    }
}

/// Row words of the original ArUco code, indexed by the row's two data bits.
///
/// `true` means a white cell.
fn original_row(data: u32) -> [bool; ORIGINAL_SIDE] {
    let x1 = data & 0b10 != 0;
    let x3 = data & 0b01 != 0;
    [!x1, x1, x3, x3, x1 ^ x3]
}

fn original_code(id: u32) -> u64 {
    let mut code = 0u64;
    for row in 0..ORIGINAL_SIDE {
        let shift = 2 * (ORIGINAL_SIDE - 1 - row);
        let words = original_row((id >> shift) & 0b11);
        for (col, white) in words.into_iter().enumerate() {
            if !white {
                code |= 1 << (row * ORIGINAL_SIDE + col);
            }
        }
    }
    code
}
