//! Page rasterisation and embedded-image extraction via pdfium.
//!
//! Every page yields a primary candidate `page_<N>.png` (the full-page
//! render) followed by one `page_<N>_img_<K>.<ext>` per embedded image
//! object, K counting image objects on that page from 1.
//!
//! `max_rendered_pixels` caps the longest edge regardless of physical page
//! size, keeping memory bounded for oversized pages.

use crate::config::PipelineConfig;
use crate::error::{PageIssue, Pdf2DatasetError};
use crate::pipeline::encode::{write_image, ImageEncoding};
use ::image::DynamicImage;
use pdfium_render::prelude::*;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the primary (full-page) candidate for `page`.
pub fn primary_image_name(page: u32) -> String {
    format!("page_{}.png", page)
}

/// File name of the `index`-th embedded image of `page`.
pub fn embedded_image_name(page: u32, index: usize, encoding: ImageEncoding) -> String {
    format!("page_{}_img_{}.{}", page, index, encoding.extension())
}

/// Render every page and save its embedded images under `images_dir`.
///
/// Returns the written files in page order. Images are written to a staging
/// directory that replaces `images_dir` only once every page rendered, so
/// files from an earlier extraction never survive a re-run. A failure to
/// render a page aborts the whole phase and leaves `images_dir` empty; a
/// single undecodable embedded image is recorded in `issues` and skipped.
pub fn render_page_images(
    document: &PdfDocument,
    images_dir: &Path,
    config: &PipelineConfig,
    issues: &mut Vec<PageIssue>,
) -> Result<Vec<PathBuf>, Pdf2DatasetError> {
    let staged = replace_image_dir(images_dir, |staging| {
        render_into(document, staging, config, issues)
    })?;

    Ok(staged
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| images_dir.join(name))
        .collect())
}

fn render_into(
    document: &PdfDocument,
    images_dir: &Path,
    config: &PipelineConfig,
    issues: &mut Vec<PageIssue>,
) -> Result<Vec<PathBuf>, Pdf2DatasetError> {
    let max_pixels = i32::try_from(config.max_rendered_pixels).unwrap_or(i32::MAX);
    let render_config = PdfRenderConfig::new()
        .scale_page_by_factor(config.dpi as f32 / 72.0)
        .set_maximum_width(max_pixels)
        .set_maximum_height(max_pixels);

    let pages = document.pages();
    info!("Rendering {} pages", pages.len());

    let mut written = Vec::new();

    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx as u32 + 1;

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            Pdf2DatasetError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            }
        })?;
        let image = bitmap.as_image();
        let primary = images_dir.join(primary_image_name(page_num));
        write_image(&image, &primary, ImageEncoding::Png).map_err(|e| {
            Pdf2DatasetError::RasterisationFailed {
                page: page_num,
                detail: format!("cannot save {}: {}", primary.display(), e),
            }
        })?;
        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );
        written.push(primary);

        if config.extract_embedded_images {
            written.extend(save_embedded_images(&page, page_num, images_dir, issues));
        }
    }

    Ok(written)
}

/// Decode each image object on `page` and write it out.
fn save_embedded_images(
    page: &PdfPage,
    page_num: u32,
    images_dir: &Path,
    issues: &mut Vec<PageIssue>,
) -> Vec<PathBuf> {
    let decoded = page.objects().iter().filter_map(|object| {
        let image_object = object.as_image_object()?;
        let filter_names: Vec<String> = image_object
            .filters()
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        let encoding = ImageEncoding::from_filter_names(&filter_names);
        let image = image_object
            .get_raw_image()
            .map_err(|e| format!("{:?}", e));
        Some((encoding, image))
    });

    write_embedded_images(decoded, page_num, images_dir, issues)
}

/// Write decoded embedded images of `page_num` as `page_<N>_img_<K>.<ext>`.
///
/// K counts every image object from 1, including ones that failed, so a
/// bad object never shifts the names of the images after it. Failures are
/// per-image and non-fatal.
pub fn write_embedded_images(
    decoded: impl IntoIterator<Item = (ImageEncoding, Result<DynamicImage, String>)>,
    page_num: u32,
    images_dir: &Path,
    issues: &mut Vec<PageIssue>,
) -> Vec<PathBuf> {
    let mut written = Vec::new();

    for (i, (encoding, image)) in decoded.into_iter().enumerate() {
        let index = i + 1;
        let result = image.and_then(|img| {
            let path = images_dir.join(embedded_image_name(page_num, index, encoding));
            write_image(&img, &path, encoding)
                .map(|_| path)
                .map_err(|e| e.to_string())
        });

        match result {
            Ok(path) => written.push(path),
            Err(detail) => {
                warn!(
                    "Page {}: embedded image {} skipped: {}",
                    page_num, index, detail
                );
                issues.push(PageIssue::EmbeddedImageFailed {
                    page: page_num,
                    index,
                    detail,
                });
            }
        }
    }

    written
}

/// Run `write` against a fresh staging directory beside `images_dir`, then
/// swap the staging directory into place.
///
/// When `write` or the swap fails, the staging directory and any previous
/// `images_dir` are removed and an empty `images_dir` is left behind.
pub fn replace_image_dir<T>(
    images_dir: &Path,
    write: impl FnOnce(&Path) -> Result<T, Pdf2DatasetError>,
) -> Result<T, Pdf2DatasetError> {
    let staging = staging_dir(images_dir);
    remove_dir_if_present(&staging)?;
    std::fs::create_dir_all(&staging).map_err(|e| Pdf2DatasetError::write_failed(&staging, e))?;

    let result = write(&staging).and_then(|value| {
        remove_dir_if_present(images_dir)?;
        std::fs::rename(&staging, images_dir)
            .map_err(|e| Pdf2DatasetError::write_failed(images_dir, e))?;
        Ok(value)
    });

    if result.is_err() {
        let cleanup = remove_dir_if_present(&staging)
            .and_then(|_| remove_dir_if_present(images_dir))
            .and_then(|_| {
                std::fs::create_dir_all(images_dir)
                    .map_err(|e| Pdf2DatasetError::write_failed(images_dir, e))
            });
        if let Err(e) = cleanup {
            warn!("Cannot reset {}: {}", images_dir.display(), e);
        }
    }
    result
}

fn staging_dir(images_dir: &Path) -> PathBuf {
    let mut name = images_dir
        .file_name()
        .unwrap_or_else(|| OsStr::new("images"))
        .to_os_string();
    name.push(".partial");
    images_dir.with_file_name(name)
}

fn remove_dir_if_present(dir: &Path) -> Result<(), Pdf2DatasetError> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Pdf2DatasetError::write_failed(dir, e)),
    }
}
