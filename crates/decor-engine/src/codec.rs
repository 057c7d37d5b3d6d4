use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use crate::error::GenerationError;

/// Side of the square canvas sent to the image-to-image endpoint.
pub const CANVAS_SIZE: u32 = 1024;
pub const JPEG_QUALITY: u8 = 80;

/// Letterboxes `bytes` onto a white `CANVAS_SIZE` square and re-encodes it
/// as JPEG. Alpha is flattened onto white first.
pub fn prepare_source_image(bytes: &[u8]) -> Result<Vec<u8>, GenerationError> {
    let image = image::load_from_memory(bytes).map_err(|err| {
        GenerationError::ImageConversion(format!("source image could not be decoded: {err}"))
    })?;
    if image.width() == 0 || image.height() == 0 {
        return Err(GenerationError::ImageConversion(
            "source image has no pixels".to_string(),
        ));
    }

    let fitted = DynamicImage::ImageRgb8(flatten_onto_white(&image))
        .resize(CANVAS_SIZE, CANVAS_SIZE, FilterType::Triangle)
        .to_rgb8();
    let mut canvas = RgbImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, Rgb([255, 255, 255]));
    let x = (CANVAS_SIZE - fitted.width().min(CANVAS_SIZE)) / 2;
    let y = (CANVAS_SIZE - fitted.height().min(CANVAS_SIZE)) / 2;
    imageops::overlay(&mut canvas, &fitted, i64::from(x), i64::from(y));

    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    encoder
        .encode_image(&canvas)
        .map_err(|err| {
            GenerationError::ImageConversion(format!("canvas could not be encoded: {err}"))
        })?;
    Ok(out)
}

/// Decodes a base64 artifact and verifies it is a readable image. The
/// decoded bytes are returned untouched.
pub fn decode_result_image(encoded: &str) -> Result<Vec<u8>, GenerationError> {
    let trimmed = encoded.trim();
    if trimmed.is_empty() {
        return Err(GenerationError::ImageConversion(
            "result image payload is empty".to_string(),
        ));
    }
    let bytes = BASE64.decode(trimmed.as_bytes()).map_err(|err| {
        GenerationError::ImageConversion(format!("result image is not valid base64: {err}"))
    })?;
    image::load_from_memory(&bytes).map_err(|err| {
        GenerationError::ImageConversion(format!("result payload is not a valid image: {err}"))
    })?;
    Ok(bytes)
}

pub fn image_extension(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(ImageFormat::Jpeg) => "jpg",
        Ok(ImageFormat::WebP) => "webp",
        Ok(ImageFormat::Gif) => "gif",
        _ => "png",
    }
}

fn flatten_onto_white(image: &DynamicImage) -> RgbImage {
    let rgba = image.to_rgba8();
    let mut flattened = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u16::from(pixel[3]);
        let blend =
            |channel: u8| -> u8 { (((u16::from(channel) * alpha) + (255 * (255 - alpha))) / 255) as u8 };
        flattened.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }
    flattened
}
