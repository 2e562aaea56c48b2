//! Neighborhood topology of 1-pixel-wide skeletons.
//!
//! The crossing number is the count of background→foreground transitions
//! walking once around the 8-neighborhood. It is 1 at a curve end, 2 along
//! a curve and 3 or more where curves meet.

use image::GrayImage;

use crate::plate_pipeline::common::PixelPos;
use crate::plate_pipeline::raster::is_set;

/// N, NE, E, SE, S, SW, W, NW.
pub const RING: [(i64, i64); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

pub fn ring(image: &GrayImage, (x, y): PixelPos) -> [bool; 8] {
    let mut out = [false; 8];
    for (i, (dx, dy)) in RING.iter().enumerate() {
        out[i] = is_set(image, x as i64 + dx, y as i64 + dy);
    }
    out
}

pub fn crossing_number(image: &GrayImage, p: PixelPos) -> u32 {
    let r = ring(image, p);
    (0..8).filter(|&i| !r[i] && r[(i + 1) % 8]).count() as u32
}

pub fn neighbor_count(image: &GrayImage, p: PixelPos) -> u32 {
    ring(image, p).iter().filter(|&&b| b).count() as u32
}

pub fn is_end_point(image: &GrayImage, p: PixelPos) -> bool {
    is_set(image, p.0 as i64, p.1 as i64)
        && (crossing_number(image, p) == 1 || neighbor_count(image, p) == 0)
}

pub fn is_branch_point(image: &GrayImage, p: PixelPos) -> bool {
    is_set(image, p.0 as i64, p.1 as i64) && crossing_number(image, p) >= 3
}

fn collect(image: &GrayImage, keep: impl Fn(&GrayImage, PixelPos) -> bool) -> Vec<PixelPos> {
    let (w, h) = image.dimensions();
    (0..h)
        .flat_map(|y| (0..w).map(move |x| (x, y)))
        .filter(|&p| keep(image, p))
        .collect()
}

/// End points in raster order.
pub fn end_points(image: &GrayImage) -> Vec<PixelPos> {
    collect(image, is_end_point)
}

pub fn branch_points(image: &GrayImage) -> Vec<PixelPos> {
    collect(image, is_branch_point)
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;
    use crate::plate_pipeline::raster::FOREGROUND;

    fn draw(size: u32, pts: &[PixelPos]) -> GrayImage {
        let mut img = GrayImage::new(size, size);
        for &(x, y) in pts {
            img.put_pixel(x, y, Luma([FOREGROUND]));
        }
        img
    }

    #[test]
    fn line_ends_and_t_junction() {
        let mut pts: Vec<PixelPos> = (2..12).map(|x| (x, 6)).collect();
        pts.extend([(7, 5), (7, 4), (7, 3)]);
        let img = draw(14, &pts);
        assert_eq!(end_points(&img), vec![(7, 3), (2, 6), (11, 6)]);
        assert_eq!(branch_points(&img), vec![(7, 6)]);
    }

    #[test]
    fn staircase_is_a_plain_curve() {
        let img = draw(8, &[(1, 1), (2, 1), (2, 2), (3, 2), (3, 3), (4, 3)]);
        assert_eq!(end_points(&img), vec![(1, 1), (4, 3)]);
        assert!(branch_points(&img).is_empty());
    }

    #[test]
    fn isolated_pixel_is_an_end_point() {
        let img = draw(5, &[(2, 2)]);
        assert_eq!(end_points(&img), vec![(2, 2)]);
    }
}
