//! Loading drawings from images and exporting the surface as PNG.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageFormat};

use crate::surface::StrokeSurface;
use crate::types::{SketchError, SketchResult};

/// Load a drawing from an image file, converted to grayscale.
pub fn surface_from_file(path: impl AsRef<Path>, line_width: f32) -> SketchResult<StrokeSurface> {
    let img = image::open(path.as_ref())?;
    StrokeSurface::from_gray(img.to_luma8(), line_width)
}

/// Load a drawing from base64 image data.
///
/// Accepts either bare base64 or a data URL such as
/// `data:image/png;base64,...`. The mime type in a data URL overrides `mime`.
pub fn surface_from_base64(data: &str, mime: &str, line_width: f32) -> SketchResult<StrokeSurface> {
    use base64::Engine;

    let (mime, payload) = split_data_url(data).unwrap_or((mime, data));
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| SketchError::InvalidInput(format!("Invalid base64: {e}")))?;

    let format = match mime {
        "image/png" => Some(ImageFormat::Png),
        "image/jpeg" | "image/jpg" => Some(ImageFormat::Jpeg),
        "image/webp" => Some(ImageFormat::WebP),
        "image/gif" => Some(ImageFormat::Gif),
        "image/bmp" => Some(ImageFormat::Bmp),
        _ => None,
    };

    let img = if let Some(fmt) = format {
        image::load_from_memory_with_format(&bytes, fmt)?
    } else {
        image::load_from_memory(&bytes)?
    };

    StrokeSurface::from_gray(img.to_luma8(), line_width)
}

/// Encode the surface as PNG bytes.
pub fn encode_png(surface: &StrokeSurface) -> SketchResult<Vec<u8>> {
    let mut buf = Vec::new();
    DynamicImage::ImageLuma8(surface.pixels().clone())
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    Ok(buf)
}

/// Write the surface to `path` as PNG.
pub fn save_png(surface: &StrokeSurface, path: impl AsRef<Path>) -> SketchResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, encode_png(surface)?)?;
    Ok(())
}

/// True when the file extension names an image format the decoder knows.
pub fn is_readable_image(path: impl AsRef<Path>) -> bool {
    ImageFormat::from_path(path).is_ok()
}

/// Load a drawing named on the command line: a `data:` URL or an image path.
pub fn surface_from_source(source: &str, line_width: f32) -> SketchResult<StrokeSurface> {
    if source.starts_with("data:") {
        return surface_from_base64(source, "image/png", line_width);
    }
    if !is_readable_image(source) {
        return Err(SketchError::InvalidInput(format!(
            "{source} is not a recognized image file"
        )));
    }
    surface_from_file(source, line_width)
}

fn split_data_url(data: &str) -> Option<(&str, &str)> {
    let rest = data.strip_prefix("data:")?;
    let (header, payload) = rest.split_once(',')?;
    let mime = header.strip_suffix(";base64")?;
    Some((mime, payload))
}
