//! Raw pixmaps and decoded images

use crate::error::Result;
use image::{DynamicImage, GrayAlphaImage, GrayImage, RgbImage, RgbaImage};
use serde::Serialize;

/// Reference to an image embedded in a page, as enumerated by a backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageRef {
    /// Position of the image object among the page's objects
    pub index: u32,
    /// Cross-reference number of the image object, 0 when the backend does not expose it
    pub xref: u32,
}

/// Raw, undecoded pixel buffer handed out by a backend.
///
/// Samples are 8 bits, interleaved, color channels first followed by alpha
/// when `alpha` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct Pixmap {
    pub width: u32,
    pub height: u32,
    /// Number of color channels, alpha excluded (1 gray, 3 RGB, 4 CMYK)
    pub colorants: u8,
    pub alpha: bool,
    pub samples: Vec<u8>,
}

impl Pixmap {
    /// Channels per pixel, alpha included
    pub fn channels(&self) -> usize {
        self.colorants as usize + usize::from(self.alpha)
    }

    /// Materialize the pixmap as a bitmap.
    ///
    /// Pixmaps with more than 3 color channels are converted to RGB and lose
    /// their alpha channel. Gray and RGB pixmaps keep their layout.
    pub fn into_image(self) -> std::result::Result<DynamicImage, String> {
        let expected = self.width as usize * self.height as usize * self.channels();
        if self.samples.len() != expected {
            return Err(format!(
                "pixmap has {} samples, expected {} for {}x{} with {} channels",
                self.samples.len(),
                expected,
                self.width,
                self.height,
                self.channels()
            ));
        }

        let (width, height) = (self.width, self.height);
        let image = match (self.colorants, self.alpha) {
            (1, false) => {
                GrayImage::from_raw(width, height, self.samples).map(DynamicImage::ImageLuma8)
            }
            (1, true) => {
                GrayAlphaImage::from_raw(width, height, self.samples).map(DynamicImage::ImageLumaA8)
            }
            (3, false) => {
                RgbImage::from_raw(width, height, self.samples).map(DynamicImage::ImageRgb8)
            }
            (3, true) => {
                RgbaImage::from_raw(width, height, self.samples).map(DynamicImage::ImageRgba8)
            }
            (n, _) if n > 3 => {
                let rgb = cmyk_to_rgb(&self.samples, self.channels());
                RgbImage::from_raw(width, height, rgb).map(DynamicImage::ImageRgb8)
            }
            (n, _) => return Err(format!("unsupported pixmap with {} color channels", n)),
        };

        image.ok_or_else(|| "pixmap buffer does not match its dimensions".to_string())
    }
}

impl From<&DynamicImage> for Pixmap {
    /// Wrap an already decoded image. Layouts other than 8-bit gray/RGB are
    /// widened to RGBA.
    fn from(image: &DynamicImage) -> Self {
        let (width, height) = (image.width(), image.height());
        let (colorants, alpha, samples) = match image {
            DynamicImage::ImageLuma8(buf) => (1, false, buf.as_raw().clone()),
            DynamicImage::ImageLumaA8(buf) => (1, true, buf.as_raw().clone()),
            DynamicImage::ImageRgb8(buf) => (3, false, buf.as_raw().clone()),
            DynamicImage::ImageRgba8(buf) => (3, true, buf.as_raw().clone()),
            other => (3, true, other.to_rgba8().into_raw()),
        };

        Self {
            width,
            height,
            colorants,
            alpha,
            samples,
        }
    }
}

/// Naive CMYK to RGB conversion over interleaved samples with `stride`
/// bytes per pixel (the first four are C, M, Y, K).
fn cmyk_to_rgb(samples: &[u8], stride: usize) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(samples.len() / stride * 3);
    for pixel in samples.chunks_exact(stride) {
        let k = 255 - pixel[3] as u16;
        for &ink in &pixel[..3] {
            rgb.push(((255 - ink as u16) * k / 255) as u8);
        }
    }
    rgb
}

/// Image extracted from a page
#[derive(Debug, Clone, Serialize)]
pub struct Image {
    /// Page number (1-indexed)
    pub page: u32,
    /// Image index on the page
    pub index: u32,
    /// Cross-reference number of the image object (0 when unknown)
    pub xref: u32,
    #[serde(skip)]
    pub image: DynamicImage,
}

impl Image {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Encode the bitmap as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        self.image.write_to(
            &mut std::io::Cursor::new(&mut png_bytes),
            image::ImageFormat::Png,
        )?;
        Ok(png_bytes)
    }
}
