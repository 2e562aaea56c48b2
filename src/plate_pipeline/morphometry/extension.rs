use image::{GrayImage, Luma};

use crate::plate_pipeline::common::PixelPos;
use crate::plate_pipeline::morphometry::path::trace_path;
use crate::plate_pipeline::morphometry::topology::{RING, end_points, is_branch_point};
use crate::plate_pipeline::raster::{FOREGROUND, is_set};

/// Extends each skeleton tail in a straight line until it leaves `mask`.
///
/// The direction is taken from the last `window` pixels of the chain ending
/// at the tail. Chains shorter than that, or holding a branch point, are
/// left alone. A walk also stops when it would touch another part of the
/// skeleton. Returns the number of pixels added.
pub fn extend_tails(skeleton: &mut GrayImage, mask: &GrayImage, window: u32) -> u32 {
    if window == 0 {
        return 0;
    }
    let mut added = 0;
    for end in end_points(skeleton) {
        let chain = trace_path(skeleton, end, Some(window as usize + 1));
        if chain.len() <= window as usize || chain.iter().any(|&p| is_branch_point(skeleton, p)) {
            continue;
        }
        let anchor = chain[window as usize];
        let dx = end.0 as f64 - anchor.0 as f64;
        let dy = end.1 as f64 - anchor.1 as f64;
        let norm = dx.hypot(dy);
        if norm == 0.0 {
            continue;
        }
        added += walk(skeleton, mask, end, (dx / norm, dy / norm));
    }
    added
}

fn walk(skeleton: &mut GrayImage, mask: &GrayImage, start: PixelPos, dir: (f64, f64)) -> u32 {
    let max_steps = (skeleton.width() + skeleton.height()) as usize;
    let (mut fx, mut fy) = (start.0 as f64, start.1 as f64);
    let mut last = (start.0 as i64, start.1 as i64);
    let mut added = 0;
    for _ in 0..max_steps {
        fx += dir.0;
        fy += dir.1;
        let q = (fx.round() as i64, fy.round() as i64);
        if q == last {
            continue;
        }
        if !is_set(mask, q.0, q.1) || is_set(skeleton, q.0, q.1) {
            break;
        }
        let touches_other = RING.iter().any(|&(ox, oy)| {
            let n = (q.0 + ox, q.1 + oy);
            n != last && is_set(skeleton, n.0, n.1)
        });
        if touches_other {
            break;
        }
        skeleton.put_pixel(q.0 as u32, q.1 as u32, Luma([FOREGROUND]));
        last = q;
        added += 1;
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar_mask() -> GrayImage {
        GrayImage::from_fn(50, 20, |x, y| {
            if (5..45).contains(&x) && (8..13).contains(&y) {
                Luma([FOREGROUND])
            } else {
                Luma([0])
            }
        })
    }

    fn line(pts: impl IntoIterator<Item = PixelPos>) -> GrayImage {
        let mut img = GrayImage::new(50, 20);
        for (x, y) in pts {
            img.put_pixel(x, y, Luma([FOREGROUND]));
        }
        img
    }

    #[test]
    fn straight_tails_reach_mask_edge() {
        let mask = bar_mask();
        let mut skel = line((12..39).map(|x| (x, 10)));
        assert_eq!(extend_tails(&mut skel, &mask, 6), 13);
        for x in 5..45 {
            assert_eq!(skel.get_pixel(x, 10)[0], FOREGROUND, "x = {x}");
        }
        assert_eq!(skel.get_pixel(4, 10)[0], 0);
    }

    #[test]
    fn tail_near_branch_is_not_extended() {
        let mask = bar_mask();
        let mut skel = line((12..39).map(|x| (x, 10)).chain([(14, 9)]));
        assert_eq!(extend_tails(&mut skel, &mask, 6), 6);
        assert_eq!(skel.get_pixel(11, 10)[0], 0);
        assert_eq!(skel.get_pixel(44, 10)[0], FOREGROUND);
    }
}
