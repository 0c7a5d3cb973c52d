#![allow(dead_code)]

use image::{Rgb, RgbImage};
use marker_track::aruco::builtins;

pub const CELL: u32 = 10;
/// Marker side in cells, border included.
pub const CELLS: u32 = 7;

/// White frame with one ARUCO_ORIGINAL marker whose top-left pixel is `(x0, y0)`.
pub fn render_marker_frame(width: u32, height: u32, id: u32, x0: u32, y0: u32) -> RgbImage {
    let dict = builtins::aruco_original();
    let code = dict.codes[id as usize];
    let bits = dict.marker_size as u32;
    let side = CELLS * CELL;

    RgbImage::from_fn(width, height, |x, y| {
        if x < x0 || y < y0 || x >= x0 + side || y >= y0 + side {
            return Rgb([255, 255, 255]);
        }
        let cx = (x - x0) / CELL;
        let cy = (y - y0) / CELL;
        let border = cx == 0 || cy == 0 || cx + 1 == CELLS || cy + 1 == CELLS;
        let black = border || (code >> ((cy - 1) * bits + (cx - 1))) & 1 == 1;
        if black {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

/// Sub-pixel marker corners (TL, TR, BR, BL) on pixel edges.
pub fn marker_corners(x0: u32, y0: u32) -> [(f32, f32); 4] {
    let lo_x = x0 as f32 - 0.5;
    let lo_y = y0 as f32 - 0.5;
    let side = (CELLS * CELL) as f32;
    [
        (lo_x, lo_y),
        (lo_x + side, lo_y),
        (lo_x + side, lo_y + side),
        (lo_x, lo_y + side),
    ]
}
