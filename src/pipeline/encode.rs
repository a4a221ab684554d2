//! Image encoding: `DynamicImage` → bytes in the configured [`OutputFormat`].
//!
//! PNG and TIFF are written as rendered. JPEG and PPM have no alpha
//! channel; pages the rasterizer already produced as `Rgb8` are borrowed,
//! anything else is converted first. PPM goes through the PNM
//! encoder with an explicit binary-pixmap subtype; left to itself the
//! encoder picks PAM (`P7`) for RGB data.

use crate::config::OutputFormat;
use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbImage};
use std::borrow::Cow;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page for upload.
pub fn encode_page(img: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();

    match format {
        OutputFormat::Png | OutputFormat::Tiff => {
            img.write_to(&mut Cursor::new(&mut buf), format.image_format())?;
        }
        OutputFormat::Jpeg => {
            rgb8(img).write_to(&mut Cursor::new(&mut buf), format.image_format())?;
        }
        OutputFormat::Ppm => {
            let rgb = rgb8(img);
            PnmEncoder::new(&mut buf)
                .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
                .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;
        }
    }

    debug!("Encoded image → {} bytes {}", buf.len(), format);
    Ok(buf)
}

fn rgb8(img: &DynamicImage) -> Cow<'_, RgbImage> {
    match img.as_rgb8() {
        Some(rgb) => Cow::Borrowed(rgb),
        None => Cow::Owned(img.to_rgb8()),
    }
}
