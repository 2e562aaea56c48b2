use image::{GrayImage, Luma};
use imageproc::region_labelling::Connectivity;

use crate::plate_pipeline::common::PixelPos;
use crate::plate_pipeline::morphometry::topology::{end_points, is_end_point};
use crate::plate_pipeline::raster::{BACKGROUND, FOREGROUND, neighbors, set_count};

/// Removes spurs of up to `budget` pixels.
///
/// End-point pixels are peeled `budget` times, then every surviving end
/// point grows back along the peeled pixels for up to `budget` steps. True
/// tails come back at full length; a spur is gone because its root is no
/// longer an end point. A skeleton that would vanish entirely is returned
/// unpruned.
pub fn prune_spurs(skeleton: &GrayImage, budget: u32) -> GrayImage {
    if budget == 0 {
        return skeleton.clone();
    }
    let dims = skeleton.dimensions();
    let idx = |(x, y): PixelPos| y as usize * dims.0 as usize + x as usize;

    let mut pruned = skeleton.clone();
    let mut removed = vec![false; dims.0 as usize * dims.1 as usize];
    for _ in 0..budget {
        let ends: Vec<PixelPos> = pruned
            .enumerate_pixels()
            .filter(|(_, _, p)| p[0] != BACKGROUND)
            .map(|(x, y, _)| (x, y))
            .filter(|&p| is_end_point(&pruned, p))
            .collect();
        if ends.is_empty() {
            break;
        }
        for p in ends {
            pruned.put_pixel(p.0, p.1, Luma([BACKGROUND]));
            removed[idx(p)] = true;
        }
    }

    if set_count(&pruned) == 0 {
        return skeleton.clone();
    }

    let mut frontier = end_points(&pruned);
    for _ in 0..budget {
        let mut next = Vec::new();
        for &p in &frontier {
            for n in neighbors(dims, p, Connectivity::Eight) {
                if removed[idx(n)] {
                    removed[idx(n)] = false;
                    next.push(n);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        for &(x, y) in &next {
            pruned.put_pixel(x, y, Luma([FOREGROUND]));
        }
        frontier = next;
    }
    pruned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate_pipeline::morphometry::topology::branch_points;

    fn draw(w: u32, h: u32, pts: impl IntoIterator<Item = PixelPos>) -> GrayImage {
        let mut img = GrayImage::new(w, h);
        for (x, y) in pts {
            img.put_pixel(x, y, Luma([FOREGROUND]));
        }
        img
    }

    #[test]
    fn short_spur_is_removed_and_line_restored() {
        let line: Vec<PixelPos> = (5..35).map(|x| (x, 10)).collect();
        let spur = [(20, 9), (20, 8), (20, 7)];
        let skel = draw(40, 20, line.iter().copied().chain(spur));

        let pruned = prune_spurs(&skel, 5);
        for (x, y) in spur {
            assert_eq!(pruned.get_pixel(x, y)[0], BACKGROUND, "spur pixel ({x}, {y})");
        }
        for &(x, y) in &line {
            assert_eq!(pruned.get_pixel(x, y)[0], FOREGROUND, "line pixel ({x}, {y})");
        }
        assert!(branch_points(&pruned).is_empty());
    }

    #[test]
    fn long_tail_survives_at_full_length() {
        let line: Vec<PixelPos> = (5..45).map(|x| (x, 20)).collect();
        let tail: Vec<PixelPos> = (10..20).map(|y| (25, y)).collect();
        let skel = draw(50, 30, line.iter().copied().chain(tail.iter().copied()));

        let pruned = prune_spurs(&skel, 5);
        let kept = tail
            .iter()
            .filter(|&&(x, y)| pruned.get_pixel(x, y)[0] == FOREGROUND)
            .count();
        assert_eq!(kept, 10);
        assert_eq!(set_count(&pruned), set_count(&skel));
    }

    #[test]
    fn tiny_skeleton_is_not_erased() {
        let skel = draw(10, 10, [(3, 3), (4, 3), (5, 3)]);
        assert_eq!(prune_spurs(&skel, 5), skel);
    }
}
