//! Reading marker bits through a quad homography.

use marker_track_core::{GrayImageView, Homography};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::threshold::cell_threshold;
use crate::Matcher;

/// Cell-sampling parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeParams {
    /// Marker border width in cells (ArUco uses 1).
    pub border_bits: usize,
    /// Fraction of the marker side ignored near its outline.
    pub inset_frac: f32,
    /// Require border-black ratio >= this.
    pub min_border_score: f32,
    /// Also try reading light-on-dark markers.
    pub allow_inverted: bool,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            border_bits: 1,
            inset_frac: 0.02,
            min_border_score: 0.85,
            allow_inverted: false,
        }
    }
}

/// One decoded marker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarkerDetection {
    pub id: u32,
    /// Image corners starting at the marker's own top-left, clockwise.
    pub corners: [Point2<f32>; 4],
    pub rotation: u8,
    pub hamming: u8,
    /// Border score scaled down by the Hamming distance.
    pub score: f32,
    pub border_score: f32,
    /// Observed inner bits (row-major, black=1).
    pub code: u64,
    /// Whether the decoder inverted polarity to maximize `border_score`.
    pub inverted: bool,
}

/// Bits read under one polarity.
#[derive(Clone, Copy, Debug)]
struct Reading {
    code: u64,
    border_score: f32,
    inverted: bool,
}

/// Side of the canonical square the sample grid is laid out in.
const CANONICAL_SIDE: f32 = 1.0;

/// Threshold samples per cell along each axis.
const THRESHOLD_SUBDIV: usize = 3;

/// Sampling positions for one marker layout, reused across quads.
pub(crate) struct SampleGrid {
    bits: usize,
    border: usize,
    cells: usize,
    /// Cell centres, row-major.
    centres: Vec<Point2<f32>>,
    /// Denser grid the cell threshold is estimated from.
    dense: Vec<Point2<f32>>,
}

impl SampleGrid {
    pub(crate) fn new(params: &DecodeParams, bits: usize) -> Option<Self> {
        if bits == 0 || bits * bits > 64 {
            return None;
        }
        let border = params.border_bits;
        let cells = bits + 2 * border;
        let inset = (params.inset_frac * CANONICAL_SIDE).clamp(0.0, 0.25);
        let side = CANONICAL_SIDE - 2.0 * inset;

        Some(Self {
            bits,
            border,
            cells,
            centres: lattice(inset, side, cells),
            dense: lattice(inset, side, cells * THRESHOLD_SUBDIV),
        })
    }

    /// Sample, binarize and match the marker inside `quad` (clockwise, image coords).
    pub(crate) fn decode(
        &self,
        img: &GrayImageView<'_>,
        quad: &[Point2<f32>; 4],
        params: &DecodeParams,
        matcher: &Matcher,
    ) -> Option<MarkerDetection> {
        let h = Homography::square_to_quad(CANONICAL_SIDE, quad)?;
        let sample = |p: &Point2<f32>| {
            let q = h.apply(*p);
            patch_mean(img, q.x, q.y)
        };

        // Every cell centre must land inside the image; the dense grid may clip.
        let cells = self.centres.iter().map(sample).collect::<Option<Vec<u8>>>()?;
        let dense: Vec<u8> = self.dense.iter().filter_map(sample).collect();
        let level = cell_threshold(if dense.is_empty() { &cells } else { &dense });

        let reading = self.read(&cells, level, params)?;
        let m = matcher.match_code(reading.code)?;
        let bit_count = (self.bits * self.bits) as f32;
        let score = (reading.border_score * (1.0 - m.hamming as f32 / bit_count)).clamp(0.0, 1.0);

        Some(MarkerDetection {
            id: m.id,
            corners: m.canonical_corners(quad),
            rotation: m.rotation,
            hamming: m.hamming,
            score,
            border_score: reading.border_score,
            code: reading.code,
            inverted: reading.inverted,
        })
    }

    /// Binarize `cells` and keep the polarity with the best border.
    fn read(&self, cells: &[u8], level: u8, params: &DecodeParams) -> Option<Reading> {
        let lo = cells.iter().min()?;
        if cells.iter().max() == Some(lo) {
            // No contrast: nothing to read.
            return None;
        }

        let polarities: &[bool] = if params.allow_inverted {
            &[false, true]
        } else {
            &[false]
        };
        polarities
            .iter()
            .map(|&inverted| self.read_polarity(cells, level, inverted))
            .filter(|r| r.border_score >= params.min_border_score)
            .fold(None, |best: Option<Reading>, r| match best {
                Some(b) if b.border_score >= r.border_score => Some(b),
                _ => Some(r),
            })
    }

    fn read_polarity(&self, cells: &[u8], level: u8, inverted: bool) -> Reading {
        let n = self.cells;
        let inner = self.border..n - self.border;
        let mut code = 0u64;
        let (mut dark_border, mut border) = (0u32, 0u32);

        for (i, &v) in cells.iter().enumerate() {
            let (cx, cy) = (i % n, i / n);
            let dark = (v <= level) != inverted;
            if inner.contains(&cx) && inner.contains(&cy) {
                let bit = (cy - self.border) * self.bits + (cx - self.border);
                code |= (dark as u64) << bit;
            } else {
                border += 1;
                dark_border += dark as u32;
            }
        }

        Reading {
            code,
            border_score: if border == 0 {
                1.0
            } else {
                dark_border as f32 / border as f32
            },
            inverted,
        }
    }
}

/// `n × n` cell centres covering `[start, start + side]²`, row-major.
fn lattice(start: f32, side: f32, n: usize) -> Vec<Point2<f32>> {
    let step = side / n as f32;
    (0..n * n)
        .map(|i| {
            let (x, y) = (i % n, i / n);
            Point2::new(
                start + (x as f32 + 0.5) * step,
                start + (y as f32 + 0.5) * step,
            )
        })
        .collect()
}

/// Mean of the 3×3 pixel patch around `(x, y)`, or `None` if it leaves the image.
fn patch_mean(img: &GrayImageView<'_>, x: f32, y: f32) -> Option<u8> {
    if !img.contains(x.floor(), y.floor(), 1.0) {
        return None;
    }
    let (ix, iy) = (x.floor() as usize, y.floor() as usize);
    let sum: u32 = (iy - 1..=iy + 1)
        .flat_map(|py| (ix - 1..=ix + 1).map(move |px| (px, py)))
        .map(|(px, py)| img.data[py * img.width + px] as u32)
        .sum();
    Some((sum / 9) as u8)
}
