//! Dictionary matching and rotation helpers.

use nalgebra::Point2;

use crate::{Dictionary, DictionaryError};

/// A dictionary match for an observed marker code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// Marker id in the dictionary.
    pub id: u32,
    /// Rotation `0..=3` such that: `observed_code == rotate(dict_code, rotation)`.
    pub rotation: u8,
    /// Hamming distance between observed and dictionary code (after rotation).
    pub hamming: u8,
}

impl Match {
    /// Reorder the sampled quad corners so that index 0 is the marker's own
    /// top-left corner, continuing clockwise.
    pub fn canonical_corners(&self, sampled: &[Point2<f32>; 4]) -> [Point2<f32>; 4] {
        let rot = self.rotation as usize & 3;
        std::array::from_fn(|k| sampled[(k + rot) % 4])
    }
}

/// Brute-force matcher over a fixed dictionary with every rotation
/// precomputed.
#[derive(Clone, Debug)]
pub struct Matcher {
    dict: Dictionary,
    max_hamming: u8,
    rotated: Vec<[u64; 4]>,
}

impl Matcher {
    /// Build a matcher; `max_hamming` is capped by the dictionary's
    /// `max_correction_bits`.
    pub fn new(dict: Dictionary, max_hamming: u8) -> Result<Self, DictionaryError> {
        dict.validate()?;
        let n = dict.marker_size;
        let rotated = dict
            .codes
            .iter()
            .map(|&base| std::array::from_fn(|rot| rotate_code_u64(base, n, rot as u8)))
            .collect();
        let max_hamming = max_hamming.min(dict.max_correction_bits);

        Ok(Self {
            dict,
            max_hamming,
            rotated,
        })
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dict
    }

    /// Maximum Hamming distance allowed for matches.
    #[inline]
    pub fn max_hamming(&self) -> u8 {
        self.max_hamming
    }

    /// Closest dictionary code within `max_hamming`, over all ids and
    /// rotations. Ties go to the lowest id, then the lowest rotation.
    pub fn match_code(&self, observed: u64) -> Option<Match> {
        self.rotated
            .iter()
            .zip(0u32..)
            .flat_map(|(rots, id)| {
                rots.iter().zip(0u8..).map(move |(&cand, rotation)| Match {
                    id,
                    rotation,
                    hamming: (observed ^ cand).count_ones() as u8,
                })
            })
            .filter(|m| m.hamming <= self.max_hamming)
            .min_by_key(|m| m.hamming)
    }
}

/// Rotate an `n × n` code stored row-major (`bit = y * n + x`) by `rot`
/// quarter turns clockwise.
pub fn rotate_code_u64(code: u64, n: usize, rot: u8) -> u64 {
    (0..rot & 3).fold(code, |c, _| quarter_turn(c, n))
}

/// One clockwise quarter turn: output cell `(x, y)` reads input cell `(y, n - 1 - x)`.
fn quarter_turn(code: u64, n: usize) -> u64 {
    (0..n * n).fold(0u64, |out, i| {
        let (x, y) = (i % n, i / n);
        let src = (n - 1 - x) * n + y;
        out | (((code >> src) & 1) << i)
    })
}
