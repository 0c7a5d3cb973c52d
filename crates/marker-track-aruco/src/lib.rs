//! ArUco dictionaries, square-candidate search and marker decoding.
//!
//! This crate covers:
//! - dictionaries (the generated `ARUCO_ORIGINAL` set or JSON files),
//! - matching observed marker codes against a dictionary in all four rotations,
//! - full-frame detection: adaptive binarization, contour tracing, quad
//!   filtering and bit sampling through a homography.
//!
//! It does not track anything over time; see the `marker-track` crate.

pub mod builtins;
mod decode;
mod detector;
mod dictionary;
mod matcher;
mod quad;
mod threshold;

pub use decode::{DecodeParams, MarkerDetection};
pub use detector::{ArucoDetector, ArucoParams};
pub use dictionary::{Dictionary, DictionaryError};
pub use matcher::{rotate_code_u64, Match, Matcher};
pub use quad::{find_quad_candidates, QuadParams};
pub use threshold::adaptive_threshold_inv;
