//! Drawing tracked modules over a frame.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_line_segment_mut};

use crate::{Frame, Registry};

const OUTLINE: Rgb<u8> = Rgb([0, 255, 0]);

/// Copy of the frame with every module drawn on top.
///
/// Consecutive corners of one id are joined; a run of four corners is closed
/// into a quadrilateral. Every corner gets a small cross.
pub fn annotate(frame: &Frame, registry: &Registry) -> RgbImage {
    let mut canvas = frame.image().clone();

    for module in registry {
        for (_, run) in module.id_runs() {
            for pair in run.windows(2) {
                draw_line_segment_mut(
                    &mut canvas,
                    (pair[0].x, pair[0].y),
                    (pair[1].x, pair[1].y),
                    OUTLINE,
                );
            }
            if let [first, .., last] = run {
                if run.len() == 4 {
                    draw_line_segment_mut(&mut canvas, (last.x, last.y), (first.x, first.y), OUTLINE);
                }
            }
        }
        for p in module.corners() {
            draw_cross_mut(&mut canvas, OUTLINE, p.x.round() as i32, p.y.round() as i32);
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Detection, ReconcilePolicy};
    use nalgebra::Point2;

    fn frame() -> Frame {
        Frame::new(0, RgbImage::from_pixel(40, 40, Rgb([0, 0, 0])))
    }

    #[test]
    fn empty_registry_leaves_frame_untouched() {
        let f = frame();
        assert_eq!(annotate(&f, &Registry::new()), *f.image());
    }

    #[test]
    fn closed_outline_and_crosses_are_drawn() {
        let f = frame();
        let mut reg = Registry::new();
        reg.ingest(
            &Detection {
                id: 1,
                corners: [
                    Point2::new(10.0, 10.0),
                    Point2::new(30.0, 10.0),
                    Point2::new(30.0, 30.0),
                    Point2::new(10.0, 30.0),
                ],
            },
            0,
            ReconcilePolicy::Append,
        );

        let out = annotate(&f, &reg);
        assert_eq!(*out.get_pixel(20, 10), OUTLINE);
        assert_eq!(*out.get_pixel(30, 20), OUTLINE);
        // Closing edge from the last corner back to the first.
        assert_eq!(*out.get_pixel(10, 20), OUTLINE);
        assert_eq!(*out.get_pixel(20, 20), Rgb([0, 0, 0]));
        // The source frame is not modified.
        assert_eq!(*f.image().get_pixel(20, 10), Rgb([0, 0, 0]));
    }
}
