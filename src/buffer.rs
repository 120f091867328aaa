//! RGBA8 frame buffer shared between the patch engine and the display sink.

use image::RgbaImage;

/// A rectangular RGBA8 pixel grid, 4 bytes per pixel, row-major.
///
/// Two roles exist at runtime: the *original* buffer for a slide, which is
/// never written after decode, and the *working* buffer, a full copy made at
/// slide entry that accumulates all decay/restore effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Solid-color opaque buffer.
    #[must_use]
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..width as usize * height as usize {
            pixels.extend_from_slice(&[color[0], color[1], color[2], 255]);
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    #[must_use]
    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }

    /// Rebuild from raw parts; `None` when the byte length does not match.
    #[must_use]
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            pixels,
        })
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Byte offset of the pixel at `(x, y)`. Caller keeps coordinates in bounds.
    #[must_use]
    pub const fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * 4
    }

    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Bulk read access for a batch of mutations.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// Bulk write access for a batch of mutations.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    /// View as an [`RgbaImage`] for encoding; `None` only if dimensions and
    /// byte length disagree, which the constructors rule out.
    #[must_use]
    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }
}
