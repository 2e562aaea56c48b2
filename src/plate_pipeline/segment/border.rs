use image::GrayImage;
use imageproc::region_labelling::Connectivity;

use crate::plate_pipeline::raster::{BACKGROUND, flood_fill};

/// Floods every foreground component that touches the image border back to
/// background. Worms never touch the plate edge; anything that does is
/// rim glare or a plate-holder shadow. Returns the number of components
/// removed.
pub fn clear_border(binary: &mut GrayImage, conn: Connectivity) -> usize {
    let (w, h) = binary.dimensions();
    if w == 0 || h == 0 {
        return 0;
    }
    let border = (0..w)
        .flat_map(|x| [(x, 0), (x, h - 1)])
        .chain((0..h).flat_map(|y| [(0, y), (w - 1, y)]));

    let mut removed = 0;
    for (x, y) in border.collect::<Vec<_>>() {
        if binary.get_pixel(x, y)[0] != BACKGROUND {
            flood_fill(binary, (x, y), conn, BACKGROUND);
            removed += 1;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use image::Luma;

    use super::*;
    use crate::plate_pipeline::raster::{FOREGROUND, set_count};

    #[test]
    fn border_components_go_interior_ones_stay() {
        let mut img = GrayImage::new(12, 12);
        // touches the left edge
        for y in 3..6 {
            for x in 0..3 {
                img.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        // interior
        for y in 6..9 {
            for x in 6..9 {
                img.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
        // corner pixel
        img.put_pixel(11, 11, Luma([FOREGROUND]));

        let removed = clear_border(&mut img, Connectivity::Eight);
        assert_eq!(removed, 2);
        assert_eq!(set_count(&img), 9);
        assert_eq!(img.get_pixel(7, 7)[0], FOREGROUND);
    }
}
