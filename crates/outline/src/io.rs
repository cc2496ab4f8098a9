use std::io::Cursor;
use std::path::Path;

use image::{ImageFormat, RgbImage};
use tracing::debug;

use crate::{error::Result, types::ensure_not_empty};

/// Decode an encoded raster image (PNG, JPEG, TIFF) into an RGB buffer
pub fn load_image(bytes: &[u8]) -> Result<RgbImage> {
    let image = image::load_from_memory(bytes)?.to_rgb8();
    ensure_not_empty(image.width(), image.height())?;
    debug!(width = image.width(), height = image.height(), "decoded image");
    Ok(image)
}

/// Load an image file into an RGB buffer
pub fn open_image<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let image = image::open(path.as_ref())?.to_rgb8();
    ensure_not_empty(image.width(), image.height())?;
    debug!(path = %path.as_ref().display(), width = image.width(), height = image.height(), "opened image");
    Ok(image)
}

/// Encode an RGB buffer in the given format
pub fn encode_image(image: &RgbImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut bytes = Cursor::new(Vec::new());
    image.write_to(&mut bytes, format)?;
    Ok(bytes.into_inner())
}

/// Write an RGB buffer to disk; the format follows the extension, PNG when it has none
pub fn save_image<P: AsRef<Path>>(image: &RgbImage, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path).unwrap_or(ImageFormat::Png);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, encode_image(image, format)?)?;
    debug!(path = %path.display(), ?format, "saved image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_png_bytes_survive_reload() {
        let image = RgbImage::from_fn(5, 3, |x, y| Rgb([x as u8 * 40, y as u8 * 80, 7]));
        let bytes = encode_image(&image, ImageFormat::Png).unwrap();
        assert_eq!(load_image(&bytes).unwrap(), image);
    }

    #[test]
    fn test_garbage_bytes_are_an_image_error() {
        assert!(matches!(
            load_image(b"definitely not a png"),
            Err(crate::OutlineError::Image(_))
        ));
    }
}
