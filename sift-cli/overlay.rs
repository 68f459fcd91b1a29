//! Side-by-side match rendering for the final matched pairs.

use std::path::Path;

use image::{GrayImage, ImageReader, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use sift_core::{KeypointSet, MatchedPair};

use crate::SiftResult;

pub const MATCH_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Place `image_a` and `image_b` side by side and join each pair with a line.
///
/// The canvas is `wA + wB` wide and `max(hA, hB)` tall; image B is shifted
/// right by `wA`, so a pair is drawn from `(colA, rowA)` to `(wA + colB, rowB)`.
pub fn render_matches(image_a: &GrayImage, image_b: &GrayImage, pairs: &[MatchedPair]) -> RgbImage {
    let (wa, ha) = image_a.dimensions();
    let (wb, hb) = image_b.dimensions();
    let mut canvas = RgbImage::new(wa + wb, ha.max(hb));

    for (x, y, p) in image_a.enumerate_pixels() {
        canvas.put_pixel(x, y, Rgb([p[0]; 3]));
    }
    for (x, y, p) in image_b.enumerate_pixels() {
        canvas.put_pixel(wa + x, y, Rgb([p[0]; 3]));
    }

    let offset = wa as f32;
    for pair in pairs {
        let ((row_a, col_a), (row_b, col_b)) = pair.endpoints();
        draw_line_segment_mut(&mut canvas, (col_a, row_a), (offset + col_b, row_b), MATCH_COLOR);
    }
    canvas
}

/// Decode the grayscale raster paired with `set` by base name inside `dir`
pub fn load_companion<P: AsRef<Path>>(set: &KeypointSet, dir: P) -> SiftResult<GrayImage> {
    let path = set.companion_image(dir);
    Ok(ImageReader::open(&path)?.decode()?.to_luma8())
}
