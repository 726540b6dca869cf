//! Synthetic rooftop scenes for trying the verifier without real photos.

use std::path::{Path, PathBuf};

use image::Rgb;
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use solar_verify_core::RasterImage;

pub const DEMO_WIDTH: u32 = 800;
pub const DEMO_HEIGHT: u32 = 600;

/// Panel rectangles `(x, y, width, height)` of [`house_with_panels`].
pub const DEMO_PANELS: [(i32, i32, u32, u32); 3] = [
    (120, 180, 161, 141),
    (320, 180, 161, 141),
    (520, 180, 161, 141),
];

const BACKGROUND: Rgb<u8> = Rgb([220, 220, 220]);
const SKY: Rgb<u8> = Rgb([200, 215, 230]);
const WALL: Rgb<u8> = Rgb([180, 140, 100]);
const ROOF_OUTLINE: Rgb<u8> = Rgb([100, 100, 100]);
const GRAY_ROOF: Rgb<u8> = Rgb([130, 140, 150]);
const TILE_ROOF: Rgb<u8> = Rgb([160, 100, 80]);
const TILE_EDGE: Rgb<u8> = Rgb([150, 90, 70]);
const PANEL: Rgb<u8> = Rgb([30, 60, 100]);
const PANEL_FRAME: Rgb<u8> = Rgb([20, 40, 80]);
const PANEL_GRID: Rgb<u8> = Rgb([15, 30, 60]);

/// A house with three dark-blue panel arrays on its front.
pub fn house_with_panels() -> RasterImage {
    let mut img = house_shell(GRAY_ROOF);
    for &(x, y, w, h) in &DEMO_PANELS {
        draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(w, h), PANEL);
        for inset in 0..3 {
            draw_hollow_rect_mut(
                &mut img,
                Rect::at(x + inset, y + inset).of_size(w - 2 * inset as u32, h - 2 * inset as u32),
                PANEL_FRAME,
            );
        }
    }
    for x in (120..680).step_by(40) {
        draw_line_segment_mut(&mut img, (x as f32, 180.0), (x as f32, 320.0), PANEL_GRID);
    }
    for y in (180..=320).step_by(35) {
        draw_line_segment_mut(&mut img, (120.0, y as f32), (680.0, y as f32), PANEL_GRID);
    }
    add_texture(&mut img, 0x5eed_0001);
    img
}

/// The same house with a red-brown tiled roof and no panels.
pub fn house_without_panels() -> RasterImage {
    let mut img = house_shell(TILE_ROOF);
    for x in (100..700).step_by(40) {
        for y in (50..200).step_by(30) {
            let (x, y) = (x as f32, y as f32);
            draw_line_segment_mut(&mut img, (x, y), (x + 30.0, y), TILE_EDGE);
            draw_line_segment_mut(&mut img, (x, y), (x, y + 25.0), TILE_EDGE);
        }
    }
    add_texture(&mut img, 0x5eed_0002);
    img
}

/// Write both scenes as PNG into `dir`, returning
/// `(with_panels_path, without_panels_path)`.
pub fn write_demo_scenes(dir: impl AsRef<Path>) -> Result<(PathBuf, PathBuf), image::ImageError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let with = dir.join("demo_with_panels.png");
    let without = dir.join("demo_without_panels.png");
    house_with_panels().save(&with)?;
    house_without_panels().save(&without)?;
    Ok((with, without))
}

fn house_shell(roof: Rgb<u8>) -> RasterImage {
    let mut img = RasterImage::from_pixel(DEMO_WIDTH, DEMO_HEIGHT, BACKGROUND);
    draw_filled_rect_mut(&mut img, Rect::at(0, 0).of_size(DEMO_WIDTH, 150), SKY);
    draw_filled_rect_mut(&mut img, Rect::at(100, 150).of_size(601, 351), WALL);

    let gable = [Point::new(100, 150), Point::new(400, 50), Point::new(700, 150)];
    draw_polygon_mut(&mut img, &gable, roof);
    for i in 0..gable.len() {
        let (a, b) = (gable[i], gable[(i + 1) % gable.len()]);
        for d in -1..=1 {
            let d = d as f32;
            draw_line_segment_mut(
                &mut img,
                (a.x as f32, a.y as f32 + d),
                (b.x as f32, b.y as f32 + d),
                ROOF_OUTLINE,
            );
        }
    }
    img
}

/// Deterministic per-pixel jitter of a few intensity levels.
fn add_texture(img: &mut RasterImage, seed: u64) {
    let mut state = seed;
    for px in img.pixels_mut() {
        // xorshift64
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        let jitter = (state % 9) as i16 - 4;
        for c in px.0.iter_mut() {
            *c = (*c as i16 + jitter).clamp(0, 255) as u8;
        }
    }
}
