//! The process-wide marker dictionary.

use std::path::Path;

use marker_track_aruco::{builtins, Dictionary, DictionaryError, Matcher};

/// Read-only dictionary prepared for matching.
///
/// Built once at startup and shared by reference afterwards.
#[derive(Clone, Debug)]
pub struct MarkerDictionary {
    matcher: Matcher,
}

impl MarkerDictionary {
    pub fn new(dict: Dictionary, max_hamming: u8) -> Result<Self, DictionaryError> {
        let matcher = Matcher::new(dict, max_hamming)?;
        log::info!(
            "dictionary {}: {} markers of {}x{} bits, max hamming {}",
            matcher.dictionary().name,
            matcher.dictionary().len(),
            matcher.dictionary().marker_size,
            matcher.dictionary().marker_size,
            matcher.max_hamming()
        );
        Ok(Self { matcher })
    }

    /// One of [`builtins::BUILTIN_DICTIONARY_NAMES`].
    pub fn builtin(name: &str, max_hamming: u8) -> Result<Self, DictionaryError> {
        Self::new(builtins::builtin_dictionary(name)?, max_hamming)
    }

    pub fn from_json_file(path: impl AsRef<Path>, max_hamming: u8) -> Result<Self, DictionaryError> {
        Self::new(Dictionary::from_json_file(path)?, max_hamming)
    }

    #[inline]
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        self.matcher.dictionary()
    }

    pub fn name(&self) -> &str {
        &self.dictionary().name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_and_unknown_names() {
        let dict = MarkerDictionary::builtin("DICT_ARUCO_ORIGINAL", 2).expect("builtin");
        assert_eq!(dict.name(), "ARUCO_ORIGINAL");
        assert_eq!(dict.dictionary().len(), 1024);
        assert_eq!(dict.matcher().max_hamming(), 0);
        assert!(MarkerDictionary::builtin("DICT_APRILTAG_36h11", 0).is_err());
    }

    #[test]
    fn loads_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tiny.json");
        std::fs::write(
            &path,
            r#"{ "name": "TINY", "marker_size": 3, "max_correction_bits": 1, "codes": [7, 56, 448] }"#,
        )
        .expect("write");
        let dict = MarkerDictionary::from_json_file(&path, 1).expect("load");
        assert_eq!(dict.name(), "TINY");
        assert_eq!(dict.matcher().max_hamming(), 1);
    }
}
