//! Tray icon artwork, drawn at startup.

use anyhow::{anyhow, Result};
use image::{Rgba, RgbaImage};
use tray_icon::Icon;

const ICON_SIZE: u32 = 32;
const BODY: Rgba<u8> = Rgba([0x2b, 0x7a, 0xd8, 0xff]);
const WHEEL: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// A rounded mouse silhouette with a scroll wheel.
pub fn render(size: u32) -> RgbaImage {
    let s = size as f32;
    let (cx, cy) = (s / 2.0, s / 2.0);
    let (rx, ry) = (s * 0.32, s * 0.45);

    RgbaImage::from_fn(size, size, |x, y| {
        let px = x as f32 + 0.5;
        let py = y as f32 + 0.5;
        let nx = (px - cx) / rx;
        let ny = (py - cy) / ry;
        if nx * nx + ny * ny > 1.0 {
            return CLEAR;
        }

        let on_wheel = (px - cx).abs() <= s * 0.05 && py >= s * 0.2 && py <= s * 0.38;
        if on_wheel {
            WHEEL
        } else {
            BODY
        }
    })
}

pub fn tray_icon() -> Result<Icon> {
    let image = render(ICON_SIZE);
    let (width, height) = image.dimensions();
    Icon::from_rgba(image.into_raw(), width, height)
        .map_err(|e| anyhow!("Failed to create tray icon image: {:?}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_shape() {
        let image = render(ICON_SIZE);
        assert_eq!(image.dimensions(), (32, 32));
        assert_eq!(*image.get_pixel(0, 0), CLEAR);
        assert_eq!(*image.get_pixel(31, 31), CLEAR);
        assert_eq!(*image.get_pixel(16, 24), BODY);
        assert_eq!(*image.get_pixel(16, 9), WHEEL);
    }
}
