//! Core image primitives for marker tracking.
//!
//! This crate is intentionally small and knows nothing about markers,
//! dictionaries or frame sources. It provides:
//! - borrowed/owned grayscale images with bilinear sampling,
//! - 4-point homographies between a canonical square and image quads,
//! - a dyadic image pyramid,
//! - iterative sub-pixel corner refinement,
//! - single-point pyramidal Lucas–Kanade motion estimation,
//! - a tiny stderr logger (or a `tracing` subscriber behind the `tracing` feature).

mod criteria;
mod flow;
mod homography;
mod image;
mod logger;
mod pyramid;
mod subpix;

pub use criteria::TermCriteria;
pub use flow::{track_point, FlowError, FlowEstimate, FlowParams};
pub use homography::Homography;
pub use image::{
    sample_bilinear, sample_bilinear_clamped, GrayImage, GrayImageView,
};
pub use pyramid::Pyramid;
pub use subpix::{refine_corner_subpix, SubPixError, SubPixParams};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::{init_with_level, parse_level};
