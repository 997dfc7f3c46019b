//! Screenshot capture with graceful degradation.
//!
//! Rasterization itself is an external capability behind the
//! [`Rasterizer`] trait (in a browser host this is a canvas-based DOM
//! snapshot). The service downscales the result to a pixel budget,
//! compresses it, and produces an optional thumbnail preview. Capture
//! never fails: any rasterizer absence or error yields a deterministic
//! placeholder image instead.

use std::io::Cursor;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{imageops, Rgb, RgbImage, RgbaImage};

use crate::context::{iso_now, PageFacts};

/// Requested capture region, in CSS pixels.
#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    pub width: u32,
    pub height: u32,
}

/// Failure inside an external rasterizer.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RasterizeError(pub String);

/// External page-rasterization capability.
///
/// Implementations return an unscaled snapshot of the page; the service
/// owns all downscaling and compression.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, options: &CaptureOptions) -> Result<RgbaImage, RasterizeError>;
}

/// Tuning knobs for capture output.
#[derive(Debug, Clone, Copy)]
pub struct ScreenshotOptions {
    /// JPEG quality for the full image (0-100).
    pub quality: u8,
    pub max_width: u32,
    pub max_height: u32,
    /// Side length of the square preview canvas.
    pub preview_size: u32,
    /// JPEG quality for the preview (0-100).
    pub preview_quality: u8,
}

impl Default for ScreenshotOptions {
    fn default() -> Self {
        Self {
            quality: 70,
            max_width: 1920,
            max_height: 1080,
            preview_size: 200,
            preview_quality: 80,
        }
    }
}

/// A capture result: the full compressed image and a thumbnail preview
/// for immediate feedback while the user edits the report.
#[derive(Debug, Clone)]
pub struct Capture {
    pub data_url: String,
    pub preview: String,
}

/// Produces data-URL screenshots of the current page.
pub struct ScreenshotService {
    rasterizer: Option<Arc<dyn Rasterizer>>,
    options: ScreenshotOptions,
}

impl ScreenshotService {
    pub fn new(rasterizer: Option<Arc<dyn Rasterizer>>, options: ScreenshotOptions) -> Self {
        Self {
            rasterizer,
            options,
        }
    }

    /// Capture the page as a single data-URL image. Never fails.
    pub fn capture(&self, page: &PageFacts) -> String {
        self.capture_with_preview(page).data_url
    }

    /// Capture the page as a full image plus a preview thumbnail.
    ///
    /// One best-effort attempt; the caller re-invokes for a retake. On any
    /// failure both fields carry the placeholder image.
    pub fn capture_with_preview(&self, page: &PageFacts) -> Capture {
        match self.try_capture(page) {
            Ok(capture) => capture,
            Err(e) => {
                tracing::warn!(error = %e, "Screenshot capture failed, using placeholder");
                let placeholder = self.placeholder(page);
                Capture {
                    data_url: placeholder.clone(),
                    preview: placeholder,
                }
            }
        }
    }

    fn try_capture(&self, page: &PageFacts) -> Result<Capture, RasterizeError> {
        let rasterizer = self
            .rasterizer
            .as_ref()
            .ok_or_else(|| RasterizeError("rasterizer unavailable".into()))?;

        let snapshot = rasterizer.rasterize(&CaptureOptions {
            width: page.viewport.0,
            height: page.viewport.1,
        })?;

        let data_url = self.compress(&snapshot)?;
        let preview = self.preview(&snapshot)?;
        Ok(Capture { data_url, preview })
    }

    /// Uniform downscale factor keeping the pixel count within the
    /// `max_width x max_height` budget and both axes within their maxima.
    /// Never scales up.
    fn downscale_factor(&self, width: u32, height: u32) -> f64 {
        if width == 0 || height == 0 {
            return 1.0;
        }
        let pixels = f64::from(width) * f64::from(height);
        let budget = f64::from(self.options.max_width) * f64::from(self.options.max_height);

        let budget_factor = if pixels <= budget {
            1.0
        } else {
            (budget / pixels).sqrt()
        };

        budget_factor
            .min(f64::from(self.options.max_width) / f64::from(width))
            .min(f64::from(self.options.max_height) / f64::from(height))
            .min(1.0)
    }

    fn compress(&self, snapshot: &RgbaImage) -> Result<String, RasterizeError> {
        let (width, height) = snapshot.dimensions();
        let factor = self.downscale_factor(width, height);

        let rgb = if factor < 1.0 {
            let target_w = ((f64::from(width) * factor).round() as u32).max(1);
            let target_h = ((f64::from(height) * factor).round() as u32).max(1);
            let resized = imageops::resize(snapshot, target_w, target_h, FilterType::Triangle);
            image::DynamicImage::ImageRgba8(resized).to_rgb8()
        } else {
            image::DynamicImage::ImageRgba8(snapshot.clone()).to_rgb8()
        };

        encode_jpeg(&rgb, self.options.quality)
    }

    /// Render the snapshot centered on a fixed-size square canvas.
    fn preview(&self, snapshot: &RgbaImage) -> Result<String, RasterizeError> {
        let size = self.options.preview_size;
        let (width, height) = snapshot.dimensions();

        let mut canvas = RgbImage::from_pixel(size, size, Rgb([0xf3, 0xf4, 0xf6]));

        if width > 0 && height > 0 {
            let aspect = f64::from(width) / f64::from(height);
            let (draw_w, draw_h) = if aspect > 1.0 {
                (size, ((f64::from(size) / aspect).round() as u32).max(1))
            } else {
                (((f64::from(size) * aspect).round() as u32).max(1), size)
            };

            let thumb = image::DynamicImage::ImageRgba8(imageops::resize(
                snapshot,
                draw_w,
                draw_h,
                FilterType::Triangle,
            ))
            .to_rgb8();

            let offset_x = i64::from((size - draw_w) / 2);
            let offset_y = i64::from((size - draw_h) / 2);
            imageops::overlay(&mut canvas, &thumb, offset_x, offset_y);
        }

        encode_jpeg(&canvas, self.options.preview_quality)
    }

    /// Deterministic stand-in when real capture is impossible: a small SVG
    /// naming the page URL and the capture time.
    fn placeholder(&self, page: &PageFacts) -> String {
        let url = xml_escape(&page.url);
        let timestamp = iso_now();
        let svg = format!(
            concat!(
                r##"<svg xmlns="http://www.w3.org/2000/svg" width="400" height="300">"##,
                r##"<rect width="400" height="300" fill="#f3f4f6"/>"##,
                r##"<text x="200" y="150" font-family="sans-serif" font-size="16" fill="#374151" text-anchor="middle">Screenshot captured</text>"##,
                r##"<text x="200" y="180" font-family="sans-serif" font-size="12" fill="#374151" text-anchor="middle">URL: {url}</text>"##,
                r##"<text x="200" y="210" font-family="sans-serif" font-size="12" fill="#374151" text-anchor="middle">Time: {time}</text>"##,
                r##"</svg>"##
            ),
            url = url,
            time = timestamp,
        );
        format!("data:image/svg+xml;utf8,{svg}")
    }
}

fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<String, RasterizeError> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality);
    encoder
        .encode_image(image)
        .map_err(|e| RasterizeError(format!("jpeg encoding failed: {e}")))?;
    Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&buf)))
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
