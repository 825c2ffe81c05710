use crate::archive::TextureData;
use crate::error::DecodeError;
use image::{imageops, Rgba, RgbaImage};
use std::sync::OnceLock;

pub const MAX_EDGE: u32 = 256;

pub const COLOR_SET_WIDTH: u32 = 4;
pub const COLOR_SET_HEIGHT: u32 = 16;
/// Four half-float channels per color set pixel.
pub const COLOR_SET_HALVES: usize = (COLOR_SET_WIDTH * COLOR_SET_HEIGHT * 4) as usize;

#[derive(Debug, Clone, PartialEq)]
pub enum Thumbnail {
    Image(RgbaImage),
    ModelPlaceholder,
    None,
}

impl Thumbnail {
    pub fn image(&self) -> Option<&RgbaImage> {
        match self {
            Thumbnail::Image(img) => Some(img),
            Thumbnail::ModelPlaceholder => Some(model_placeholder()),
            Thumbnail::None => None,
        }
    }
}

/// IEEE 754 binary16 to f32.
pub fn half_to_f32(bits: u16) -> f32 {
    let sign = if bits & 0x8000 != 0 { -1.0 } else { 1.0 };
    let exp = ((bits >> 10) & 0x1f) as i32;
    let mantissa = (bits & 0x3ff) as f32;

    match exp {
        0 => sign * mantissa * 2f32.powi(-24),
        0x1f if mantissa == 0.0 => sign * f32::INFINITY,
        0x1f => f32::NAN,
        _ => sign * (1.0 + mantissa / 1024.0) * 2f32.powi(exp - 15),
    }
}

fn channel(bits: u16) -> u8 {
    let value = half_to_f32(bits);
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Color set as a 4x16 opaque image. An empty color set has no thumbnail.
pub fn color_set_image(path: &str, halves: &[u16]) -> Result<Option<RgbaImage>, DecodeError> {
    if halves.is_empty() {
        return Ok(None);
    }
    if halves.len() < COLOR_SET_HALVES {
        return Err(DecodeError::Pixels {
            path: path.to_string(),
            reason: format!(
                "color set holds {} values, expected {COLOR_SET_HALVES}",
                halves.len()
            ),
        });
    }

    let mut img = RgbaImage::new(COLOR_SET_WIDTH, COLOR_SET_HEIGHT);
    for (pixel, rgba) in img.pixels_mut().zip(halves[..COLOR_SET_HALVES].chunks_exact(4)) {
        *pixel = Rgba([channel(rgba[0]), channel(rgba[1]), channel(rgba[2]), 255]);
    }
    Ok(Some(img))
}

/// Texture pixels scaled down to fit in a `MAX_EDGE` square.
pub fn texture_image(path: &str, data: TextureData) -> Result<RgbaImage, DecodeError> {
    let (width, height) = (data.width, data.height);
    let img = RgbaImage::from_raw(width, height, data.rgba).ok_or_else(|| DecodeError::Pixels {
        path: path.to_string(),
        reason: format!("pixel buffer does not match {width}x{height}"),
    })?;

    if width <= MAX_EDGE && height <= MAX_EDGE {
        return Ok(img);
    }

    let scale = f64::from(MAX_EDGE) / f64::from(width.max(height));
    let w = ((f64::from(width) * scale).round() as u32).max(1);
    let h = ((f64::from(height) * scale).round() as u32).max(1);
    Ok(imageops::thumbnail(&img, w, h))
}

/// Shown for model files, which have no pixels of their own.
pub fn model_placeholder() -> &'static RgbaImage {
    static PLACEHOLDER: OnceLock<RgbaImage> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        const EDGE: u32 = 64;
        RgbaImage::from_fn(EDGE, EDGE, |x, y| {
            let border = x < 2 || y < 2 || x >= EDGE - 2 || y >= EDGE - 2;
            let diagonal = x == y || x + y == EDGE - 1;
            if border || diagonal {
                Rgba([200, 200, 200, 255])
            } else {
                Rgba([70, 70, 70, 255])
            }
        })
    })
}
