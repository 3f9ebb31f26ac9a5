// Synthetic images shared by unit tests

use image::{Rgba, RgbaImage, imageops};

/// Gray level used for template margins and the default frame background
pub const BACKGROUND: u8 = 128;

/// (x, y, width, height, luma)
type Patch = (u32, u32, u32, u32, u8);

const TEMPLATE_A: [Patch; 4] = [
    (8, 8, 6, 4, 240),
    (16, 8, 7, 5, 30),
    (8, 15, 4, 8, 200),
    (15, 16, 8, 7, 60),
];

const TEMPLATE_B: [Patch; 3] = [(9, 8, 13, 4, 250), (8, 15, 4, 9, 20), (16, 15, 7, 7, 180)];

/// A dark one-pixel outline on the template edge around four icon blocks
const BUTTON: [Patch; 8] = [
    (0, 0, 48, 1, 40),
    (0, 31, 48, 1, 40),
    (0, 0, 1, 32, 40),
    (47, 0, 1, 32, 40),
    (10, 8, 8, 6, 30),
    (22, 10, 6, 12, 90),
    (32, 9, 7, 7, 250),
    (12, 18, 6, 5, 150),
];

fn paint(size: (u32, u32), fill: u8, patches: &[Patch]) -> RgbaImage {
    let mut image = RgbaImage::from_pixel(size.0, size.1, gray(fill));
    for &(x, y, w, h, luma) in patches {
        for py in y..y + h {
            for px in x..x + w {
                image.put_pixel(px, py, gray(luma));
            }
        }
    }
    image
}

fn gray(luma: u8) -> Rgba<u8> {
    Rgba([luma, luma, luma, 255])
}

/// 32x32 template with four blocks inside a wide uniform margin
pub fn template_a() -> RgbaImage {
    paint((32, 32), BACKGROUND, &TEMPLATE_A)
}

pub fn template_b() -> RgbaImage {
    paint((32, 32), BACKGROUND, &TEMPLATE_B)
}

/// 48x32 light button whose outline runs along the image edge
pub fn template_button() -> RgbaImage {
    paint((48, 32), 210, &BUTTON)
}

pub fn blank_frame(width: u32, height: u32) -> RgbaImage {
    blank_frame_on(BACKGROUND, width, height)
}

pub fn blank_frame_on(background: u8, width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, gray(background))
}

/// A background frame with `template` pasted at `at`
pub fn frame_with(template: &RgbaImage, at: (i64, i64), size: (u32, u32)) -> RgbaImage {
    frame_on(BACKGROUND, template, at, size)
}

pub fn frame_on(background: u8, template: &RgbaImage, at: (i64, i64), size: (u32, u32)) -> RgbaImage {
    let mut frame = blank_frame_on(background, size.0, size.1);
    imageops::replace(&mut frame, template, at.0, at.1);
    frame
}
