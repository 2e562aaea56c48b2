use image::{GrayImage, Luma};

use crate::plate_pipeline::common::PixelPos;
use crate::plate_pipeline::morphometry::topology::ring;
use crate::plate_pipeline::raster::{BACKGROUND, FOREGROUND};

/// Zhang–Suen thinning to a 1-pixel-wide, 8-connected medial curve.
pub fn thin(binary: &GrayImage) -> GrayImage {
    let (w, h) = binary.dimensions();
    let mut img = GrayImage::from_fn(w, h, |x, y| {
        Luma([if binary.get_pixel(x, y)[0] != BACKGROUND {
            FOREGROUND
        } else {
            BACKGROUND
        }])
    });

    loop {
        let mut changed = false;
        for pass in 0..2 {
            let doomed: Vec<PixelPos> = img
                .enumerate_pixels()
                .filter(|(_, _, p)| p[0] != BACKGROUND)
                .map(|(x, y, _)| (x, y))
                .filter(|&p| deletable(&img, p, pass))
                .collect();
            changed |= !doomed.is_empty();
            for (x, y) in doomed {
                img.put_pixel(x, y, Luma([BACKGROUND]));
            }
        }
        if !changed {
            break;
        }
    }
    img
}

fn deletable(img: &GrayImage, p: PixelPos, pass: u32) -> bool {
    // ring order: N, NE, E, SE, S, SW, W, NW
    let r = ring(img, p);
    let b = r.iter().filter(|&&v| v).count();
    if !(2..=6).contains(&b) {
        return false;
    }
    let a = (0..8).filter(|&i| !r[i] && r[(i + 1) % 8]).count();
    if a != 1 {
        return false;
    }
    let (n, e, s, west) = (r[0], r[2], r[4], r[6]);
    if pass == 0 {
        !(n && e && s) && !(e && s && west)
    } else {
        !(n && e && west) && !(n && s && west)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate_pipeline::morphometry::topology::{branch_points, end_points};
    use crate::plate_pipeline::raster::set_count;

    #[test]
    fn thick_bar_thins_to_a_line() {
        let mut img = GrayImage::new(40, 15);
        for y in 5..10 {
            for x in 5..35 {
                img.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        let skel = thin(&img);
        let n = set_count(&skel);
        assert!(n >= 20 && n <= 32, "skeleton has {n} pixels");
        assert_eq!(end_points(&skel).len(), 2);
        assert!(branch_points(&skel).is_empty());
        // every column in the bar interior carries exactly one skeleton pixel
        for x in 10..30 {
            let column = (0..15).filter(|&y| skel.get_pixel(x, y)[0] != 0).count();
            assert_eq!(column, 1, "column {x}");
        }
    }

    #[test]
    fn thin_line_is_left_alone() {
        let mut img = GrayImage::new(20, 5);
        for x in 2..18 {
            img.put_pixel(x, 2, Luma([FOREGROUND]));
        }
        assert_eq!(thin(&img), img);
    }
}
