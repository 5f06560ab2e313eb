//! Image decoding, transforms, colour histograms and HSV segmentation.
//!
//! HSV follows the OpenCV 8-bit convention: hue in `0..=179` (degrees / 2),
//! saturation and value in `0..=255`.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Largest width or height accepted for resize targets.
pub const MAX_DIMENSION: u32 = 10_000;

/// Maximum hue in the OpenCV 8-bit HSV space.
pub const MAX_HUE: i64 = 179;

/// Maximum saturation / value in the OpenCV 8-bit HSV space.
pub const MAX_SV: i64 = 255;

/// Number of histogram bins per channel.
pub const HISTOGRAM_BINS: usize = 256;

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

/// Encodings the service can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Png,
    Jpeg,
    Webp,
}

impl OutputFormat {
    /// Parse a user-supplied format name; `jpg` is an alias for JPEG.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            other => Err(CoreError::Validation(format!(
                "Unsupported image format '{other}'. Must be one of: png, jpeg, webp"
            ))),
        }
    }

    /// Map a decoded source format, if it is one we can write back.
    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Webp => ImageFormat::WebP,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

/// Pick the output encoding: an explicit request wins, then the source
/// format, then PNG.
pub fn resolve_output_format(
    requested: Option<&str>,
    source: Option<ImageFormat>,
) -> Result<OutputFormat, CoreError> {
    if let Some(name) = requested.filter(|n| !n.trim().is_empty()) {
        return OutputFormat::parse(name);
    }
    Ok(source
        .and_then(OutputFormat::from_image_format)
        .unwrap_or(OutputFormat::Png))
}

// ---------------------------------------------------------------------------
// Decode / encode
// ---------------------------------------------------------------------------

/// A decoded image together with the container format it came in.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: Option<ImageFormat>,
}

/// Decode bytes, sniffing the container format from the content.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage, CoreError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| CoreError::Validation(format!("Unreadable image data: {e}")))?;
    let format = reader.format();
    let image = reader
        .decode()
        .map_err(|e| CoreError::Validation(format!("Invalid image: {e}")))?;
    Ok(DecodedImage { image, format })
}

/// Encode an image. JPEG output drops any alpha channel.
pub fn encode(image: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>, CoreError> {
    let prepared = match format {
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()),
        OutputFormat::Webp => DynamicImage::ImageRgba8(image.to_rgba8()),
        OutputFormat::Png => image.clone(),
    };
    let mut out = Cursor::new(Vec::new());
    prepared
        .write_to(&mut out, format.image_format())
        .map_err(|e| CoreError::Internal(format!("Failed to encode {format:?}: {e}")))?;
    Ok(out.into_inner())
}

/// Encode an RGB buffer as PNG.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, CoreError> {
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .map_err(|e| CoreError::Internal(format!("Failed to encode PNG: {e}")))?;
    Ok(out.into_inner())
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

fn validate_dimension(value: i64, name: &str) -> Result<u32, CoreError> {
    if value <= 0 || value > i64::from(MAX_DIMENSION) {
        return Err(CoreError::Validation(format!(
            "{name} must be between 1 and {MAX_DIMENSION}, got {value}"
        )));
    }
    Ok(value as u32)
}

/// Resize to exactly `width` x `height` (aspect ratio is not preserved).
pub fn resize(image: &DynamicImage, width: i64, height: i64) -> Result<DynamicImage, CoreError> {
    let width = validate_dimension(width, "width")?;
    let height = validate_dimension(height, "height")?;
    Ok(image.resize_exact(width, height, FilterType::CatmullRom))
}

/// A crop rectangle in source pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropBox {
    /// Validate a requested crop against the source dimensions.
    pub fn new(
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        image_width: u32,
        image_height: u32,
    ) -> Result<Self, CoreError> {
        if x < 0 || y < 0 {
            return Err(CoreError::Validation(
                "Crop origin must not be negative".to_string(),
            ));
        }
        if width <= 0 || height <= 0 {
            return Err(CoreError::Validation(
                "Crop width and height must be positive".to_string(),
            ));
        }
        // Both origins are non-negative here, so the subtractions cannot overflow.
        if width > i64::from(image_width) - x || height > i64::from(image_height) - y {
            return Err(CoreError::Validation(
                "Crop area exceeds image bounds".to_string(),
            ));
        }
        Ok(Self {
            x: x as u32,
            y: y as u32,
            width: width as u32,
            height: height as u32,
        })
    }
}

pub fn crop(image: &DynamicImage, area: CropBox) -> DynamicImage {
    image.crop_imm(area.x, area.y, area.width, area.height)
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Per-channel pixel intensity counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColorHistogram {
    pub red: Vec<u64>,
    pub green: Vec<u64>,
    pub blue: Vec<u64>,
}

/// Count pixel intensities per RGB channel (alpha is ignored).
pub fn color_histogram(image: &DynamicImage) -> ColorHistogram {
    let mut hist = ColorHistogram {
        red: vec![0; HISTOGRAM_BINS],
        green: vec![0; HISTOGRAM_BINS],
        blue: vec![0; HISTOGRAM_BINS],
    };
    for Rgb([r, g, b]) in image.to_rgb8().pixels() {
        hist.red[usize::from(*r)] += 1;
        hist.green[usize::from(*g)] += 1;
        hist.blue[usize::from(*b)] += 1;
    }
    hist
}

// ---------------------------------------------------------------------------
// HSV segmentation
// ---------------------------------------------------------------------------

/// An HSV triple in OpenCV 8-bit units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    /// Validate a `[h, s, v]` list from a request body.
    pub fn from_components(components: &[i64], name: &str) -> Result<Self, CoreError> {
        let [h, s, v] = components else {
            return Err(CoreError::Validation(format!(
                "{name} must have exactly 3 components [h, s, v]"
            )));
        };
        if !(0..=MAX_HUE).contains(h) {
            return Err(CoreError::Validation(format!(
                "{name} hue must be between 0 and {MAX_HUE}, got {h}"
            )));
        }
        for (label, value) in [("saturation", s), ("value", v)] {
            if !(0..=MAX_SV).contains(value) {
                return Err(CoreError::Validation(format!(
                    "{name} {label} must be between 0 and {MAX_SV}, got {value}"
                )));
            }
        }
        Ok(Self {
            h: *h as u8,
            s: *s as u8,
            v: *v as u8,
        })
    }
}

/// Convert an 8-bit RGB pixel to OpenCV 8-bit HSV.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (rf, gf, bf) = (f64::from(r), f64::from(g), f64::from(b));
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    let s = if max == 0.0 { 0.0 } else { 255.0 * delta / max };

    let mut h = if delta == 0.0 {
        0.0
    } else if max == rf {
        60.0 * (gf - bf) / delta
    } else if max == gf {
        120.0 + 60.0 * (bf - rf) / delta
    } else {
        240.0 + 60.0 * (rf - gf) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    Hsv {
        h: ((h / 2.0).round() as u8).min(MAX_HUE as u8),
        s: s.round() as u8,
        v: max as u8,
    }
}

/// Keep pixels whose HSV lies inside the inclusive `[lower, upper]` box and
/// paint everything else black.
pub fn segment_by_hsv(image: &DynamicImage, lower: Hsv, upper: Hsv) -> RgbImage {
    let mut rgb = image.to_rgb8();
    for pixel in rgb.pixels_mut() {
        let Rgb([r, g, b]) = *pixel;
        let hsv = rgb_to_hsv(r, g, b);
        let inside = (lower.h..=upper.h).contains(&hsv.h)
            && (lower.s..=upper.s).contains(&hsv.s)
            && (lower.v..=upper.v).contains(&hsv.v);
        if !inside {
            *pixel = Rgb([0, 0, 0]);
        }
    }
    rgb
}
