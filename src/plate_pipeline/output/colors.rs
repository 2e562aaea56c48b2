use image::Rgb;
use palette::{FromColor, Hsl, Srgb};

use crate::plate_pipeline::classify::WormClass;

/// `n` evenly spaced, saturated hues.
pub fn contrasting_colors(n: usize) -> Vec<Rgb<u8>> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 * 360.0) / n as f32;
            let srgb: Srgb<u8> = Srgb::from_color(Hsl::new(hue, 0.9, 0.5)).into_format();
            Rgb([srgb.red, srgb.green, srgb.blue])
        })
        .collect()
}

/// Box color for a blob. Suspicious blobs share one color whatever their
/// class; unclassified blobs (count variant) use the fourth hue.
pub fn class_color(class: Option<WormClass>, suspicious: bool) -> Rgb<u8> {
    let palette = contrasting_colors(5);
    let index = match (suspicious, class) {
        (true, _) => 4,
        (false, Some(c)) => c.index(),
        (false, None) => 3,
    };
    palette[index]
}
