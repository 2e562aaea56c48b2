use image::GrayImage;

use crate::plate_pipeline::common::PixelPos;
use crate::plate_pipeline::raster::is_set;

const ORTHOGONAL: [(i64, i64); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
const DIAGONAL: [(i64, i64); 4] = [(1, -1), (1, 1), (-1, 1), (-1, -1)];

/// Walks a skeleton from `start`, one unvisited neighbor at a time, until
/// no unvisited neighbor is left or `limit` pixels have been collected.
///
/// Orthogonal neighbors are tried before diagonal ones so staircase corners
/// are visited rather than cut.
pub fn trace_path(skeleton: &GrayImage, start: PixelPos, limit: Option<usize>) -> Vec<PixelPos> {
    let (w, h) = skeleton.dimensions();
    if !is_set(skeleton, start.0 as i64, start.1 as i64) {
        return Vec::new();
    }
    let mut visited = vec![false; w as usize * h as usize];
    let idx = |(x, y): PixelPos| y as usize * w as usize + x as usize;

    let mut path = vec![start];
    visited[idx(start)] = true;
    let mut current = start;
    while limit.is_none_or(|l| path.len() < l) {
        let next = ORTHOGONAL
            .iter()
            .chain(DIAGONAL.iter())
            .map(|&(dx, dy)| (current.0 as i64 + dx, current.1 as i64 + dy))
            .find(|&(x, y)| is_set(skeleton, x, y) && !visited[idx((x as u32, y as u32))]);
        let Some((x, y)) = next else {
            break;
        };
        current = (x as u32, y as u32);
        visited[idx(current)] = true;
        path.push(current);
    }
    path
}
