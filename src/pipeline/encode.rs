//! Image encoding: `DynamicImage` → image candidate file on disk.
//!
//! Full-page renders are always PNG. Embedded images keep the family of
//! their PDF stream encoding: DCT (JPEG) streams are written as `.jpeg`,
//! everything else (Flate, JBIG2, CCITT, JPX, raw) as lossless `.png`.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::debug;

/// On-disk encoding of an image candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    Png,
    Jpeg,
}

impl ImageEncoding {
    /// File extension written for this encoding.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageEncoding::Png => "png",
            ImageEncoding::Jpeg => "jpeg",
        }
    }

    /// Pick the encoding matching a PDF image stream's filter chain.
    pub fn from_filter_names<S: AsRef<str>>(names: &[S]) -> Self {
        let is_dct = names.iter().any(|n| {
            let n = n.as_ref().trim_start_matches('/');
            n == "DCTDecode" || n == "DCT"
        });
        if is_dct {
            ImageEncoding::Jpeg
        } else {
            ImageEncoding::Png
        }
    }

    fn format(&self) -> ImageFormat {
        match self {
            ImageEncoding::Png => ImageFormat::Png,
            ImageEncoding::Jpeg => ImageFormat::Jpeg,
        }
    }
}

/// Quality for re-encoded DCT streams. pdfium hands back decoded pixels, so
/// JPEG output is one lossy generation away from the stream in the PDF.
pub const JPEG_QUALITY: u8 = 95;

/// Write `img` to `path`, replacing any existing file.
///
/// JPEG has no alpha channel, so JPEG output is flattened to RGB first.
pub fn write_image(
    img: &DynamicImage,
    path: &Path,
    encoding: ImageEncoding,
) -> Result<(), image::ImageError> {
    match encoding {
        ImageEncoding::Png => img.save_with_format(path, encoding.format())?,
        ImageEncoding::Jpeg => {
            let writer = BufWriter::new(File::create(path)?);
            DynamicImage::ImageRgb8(img.to_rgb8())
                .write_with_encoder(JpegEncoder::new_with_quality(writer, JPEG_QUALITY))?
        }
    }
    debug!(
        "Wrote {}x{} {} → {}",
        img.width(),
        img.height(),
        encoding.extension(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn red_square() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])))
    }

    #[test]
    fn dct_maps_to_jpeg() {
        assert_eq!(
            ImageEncoding::from_filter_names(&["DCTDecode"]),
            ImageEncoding::Jpeg
        );
        assert_eq!(
            ImageEncoding::from_filter_names(&["FlateDecode", "/DCTDecode"]),
            ImageEncoding::Jpeg
        );
        assert_eq!(
            ImageEncoding::from_filter_names(&["FlateDecode"]),
            ImageEncoding::Png
        );
        assert_eq!(
            ImageEncoding::from_filter_names::<&str>(&[]),
            ImageEncoding::Png
        );
    }

    #[test]
    fn writes_png_and_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let img = red_square();

        let png = dir.path().join("page_1.png");
        write_image(&img, &png, ImageEncoding::Png).expect("png write");
        let bytes = std::fs::read(&png).unwrap();
        assert_eq!(&bytes[1..4], b"PNG");

        let jpeg = dir.path().join("page_1_img_1.jpeg");
        write_image(&img, &jpeg, ImageEncoding::Jpeg).expect("jpeg write");
        let bytes = std::fs::read(&jpeg).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
    }
}
