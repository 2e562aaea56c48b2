use std::collections::HashSet;

use image::{GrayImage, Luma};
use imageproc::region_labelling::Connectivity;

use crate::plate_pipeline::common::{BoundingBox, PixelPos};

pub const FOREGROUND: u8 = 255;
pub const BACKGROUND: u8 = 0;

const FOUR: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
const EIGHT: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

fn offsets(conn: Connectivity) -> &'static [(i32, i32)] {
    match conn {
        Connectivity::Four => &FOUR,
        Connectivity::Eight => &EIGHT,
    }
}

/// In-bounds neighbors of `p` under `conn`.
pub fn neighbors(
    (width, height): (u32, u32),
    (x, y): PixelPos,
    conn: Connectivity,
) -> impl Iterator<Item = PixelPos> {
    offsets(conn).iter().filter_map(move |&(dx, dy)| {
        let nx = x as i64 + dx as i64;
        let ny = y as i64 + dy as i64;
        (nx >= 0 && ny >= 0 && nx < width as i64 && ny < height as i64)
            .then_some((nx as u32, ny as u32))
    })
}

/// True when `(x, y)` is inside `image` and not background. Out of bounds
/// reads as background.
pub fn is_set(image: &GrayImage, x: i64, y: i64) -> bool {
    x >= 0
        && y >= 0
        && x < image.width() as i64
        && y < image.height() as i64
        && image.get_pixel(x as u32, y as u32)[0] != BACKGROUND
}

pub fn set_count(image: &GrayImage) -> u32 {
    image.pixels().filter(|p| p[0] != BACKGROUND).count() as u32
}

/// Iterative flood fill from `seed` over pixels equal to the seed value.
///
/// Every reached pixel is repainted with `fill` and returned in visiting
/// order. Work is proportional to the region, not the image: painting marks
/// a pixel as visited. When `fill` equals the seed value nothing changes and
/// the visited set is kept per region instead.
pub fn flood_fill(
    image: &mut GrayImage,
    seed: PixelPos,
    conn: Connectivity,
    fill: u8,
) -> Vec<PixelPos> {
    let target = image.get_pixel(seed.0, seed.1)[0];
    if fill == target {
        return collect_region(image, seed, conn);
    }

    let dims = image.dimensions();
    let mut region = Vec::new();
    let mut stack = vec![seed];
    image.put_pixel(seed.0, seed.1, Luma([fill]));
    while let Some(p) = stack.pop() {
        region.push(p);
        for n in neighbors(dims, p, conn) {
            if image.get_pixel(n.0, n.1)[0] == target {
                image.put_pixel(n.0, n.1, Luma([fill]));
                stack.push(n);
            }
        }
    }
    region
}

fn collect_region(image: &GrayImage, seed: PixelPos, conn: Connectivity) -> Vec<PixelPos> {
    let dims = image.dimensions();
    let target = image.get_pixel(seed.0, seed.1)[0];
    let mut visited = HashSet::from([seed]);
    let mut region = Vec::new();
    let mut stack = vec![seed];
    while let Some(p) = stack.pop() {
        region.push(p);
        for n in neighbors(dims, p, conn) {
            if image.get_pixel(n.0, n.1)[0] == target && visited.insert(n) {
                stack.push(n);
            }
        }
    }
    region
}

/// Binary sub-image holding only `pixels`, shifted so that `bbox` starts at
/// `(pad, pad)`. Returns the image and the plate coordinate of its origin.
pub fn blob_mask(pixels: &[PixelPos], bbox: &BoundingBox, pad: u32) -> (GrayImage, (i64, i64)) {
    let mut mask = GrayImage::new(bbox.width + 2 * pad, bbox.height + 2 * pad);
    for &(x, y) in pixels {
        mask.put_pixel(x - bbox.x + pad, y - bbox.y + pad, Luma([FOREGROUND]));
    }
    (
        mask,
        (bbox.x as i64 - pad as i64, bbox.y as i64 - pad as i64),
    )
}

pub fn invert(image: &mut GrayImage) {
    for p in image.pixels_mut() {
        p[0] = 255 - p[0];
    }
}

/// Keeps foreground pixels with at least one 4-neighbor in the background
/// (image edges count as background).
pub fn outline(binary: &GrayImage) -> GrayImage {
    let (w, h) = binary.dimensions();
    GrayImage::from_fn(w, h, |x, y| {
        if binary.get_pixel(x, y)[0] == BACKGROUND {
            return Luma([BACKGROUND]);
        }
        let (x, y) = (x as i64, y as i64);
        let border = FOUR
            .iter()
            .any(|&(dx, dy)| !is_set(binary, x + dx as i64, y + dy as i64));
        Luma([if border { FOREGROUND } else { BACKGROUND }])
    })
}

/// Population standard deviation of gray values inside `bbox`.
pub fn gray_std_dev(gray: &GrayImage, bbox: &BoundingBox) -> f64 {
    let right = bbox.right().min(gray.width());
    let bottom = bbox.bottom().min(gray.height());
    let mut n = 0u64;
    let mut sum = 0f64;
    let mut sum_sq = 0f64;
    for y in bbox.y..bottom {
        for x in bbox.x..right {
            let v = gray.get_pixel(x, y)[0] as f64;
            n += 1;
            sum += v;
            sum_sq += v * v;
        }
    }
    if n == 0 {
        return 0.0;
    }
    let mean = sum / n as f64;
    (sum_sq / n as f64 - mean * mean).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: u32, x0: u32, y0: u32, side: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            let inside = x >= x0 && x < x0 + side && y >= y0 && y < y0 + side;
            Luma([if inside { FOREGROUND } else { BACKGROUND }])
        })
    }

    #[test]
    fn flood_fill_paints_whole_region() {
        let mut img = square(10, 2, 2, 3);
        let region = flood_fill(&mut img, (3, 3), Connectivity::Four, BACKGROUND);
        assert_eq!(region.len(), 9);
        assert_eq!(set_count(&img), 0);
    }

    #[test]
    fn diagonal_touch_depends_on_connectivity() {
        let mut img = GrayImage::new(4, 4);
        img.put_pixel(0, 0, Luma([FOREGROUND]));
        img.put_pixel(1, 1, Luma([FOREGROUND]));
        let mut four = img.clone();
        assert_eq!(flood_fill(&mut four, (0, 0), Connectivity::Four, 7).len(), 1);
        assert_eq!(flood_fill(&mut img, (0, 0), Connectivity::Eight, 7).len(), 2);
    }

    #[test]
    fn fill_with_seed_value_collects_without_repainting() {
        let mut img = square(10, 2, 2, 3);
        let before = img.clone();
        let region = flood_fill(&mut img, (2, 2), Connectivity::Eight, FOREGROUND);
        assert_eq!(region.len(), 9);
        assert_eq!(region[0], (2, 2));
        assert_eq!(img, before);
    }

    #[test]
    fn fill_leaves_other_regions_alone() {
        let mut img = square(12, 1, 1, 3);
        for (x, y) in [(8, 8), (9, 8), (9, 9)] {
            img.put_pixel(x, y, Luma([FOREGROUND]));
        }
        let region = flood_fill(&mut img, (9, 9), Connectivity::Four, 9);
        assert_eq!(region.len(), 3);
        assert_eq!(img.get_pixel(8, 8)[0], 9);
        assert_eq!(img.get_pixel(2, 2)[0], FOREGROUND);
        assert_eq!(set_count(&img), 12);
    }

    #[test]
    fn outline_of_filled_square_is_its_ring() {
        let img = square(9, 2, 2, 5);
        let ring = outline(&img);
        assert_eq!(set_count(&ring), 16);
        assert_eq!(ring.get_pixel(4, 4)[0], BACKGROUND);
        assert_eq!(ring.get_pixel(2, 4)[0], FOREGROUND);
    }

    #[test]
    fn std_dev_of_flat_region_is_zero() {
        let gray = GrayImage::from_pixel(8, 8, Luma([120]));
        assert_eq!(gray_std_dev(&gray, &BoundingBox::new(1, 1, 4, 4)), 0.0);
        let mut two = gray.clone();
        two.put_pixel(0, 0, Luma([0]));
        two.put_pixel(1, 0, Luma([240]));
        let sd = gray_std_dev(&two, &BoundingBox::new(0, 0, 2, 1));
        assert!((sd - 120.0).abs() < 1e-9);
    }

    #[test]
    fn blob_mask_applies_padding_offset() {
        let pixels = vec![(10, 20), (11, 20), (11, 21)];
        let bbox = BoundingBox::enclosing(&pixels).unwrap();
        let (mask, origin) = blob_mask(&pixels, &bbox, 3);
        assert_eq!(mask.dimensions(), (8, 8));
        assert_eq!(origin, (7, 17));
        assert_eq!(mask.get_pixel(3, 3)[0], FOREGROUND);
        assert_eq!(mask.get_pixel(4, 4)[0], FOREGROUND);
        assert_eq!(set_count(&mask), 3);
    }
}
