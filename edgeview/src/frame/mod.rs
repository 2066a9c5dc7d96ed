
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::{Error, Result};

/// Bytes per pixel of the only supported format, 4-channel 8-bit color.
pub const RGBA_BYTES: usize = 4;

/// Validated frame dimensions. Both sides are strictly positive.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// Validates host-supplied dimensions.
    pub fn new(width: i32, height: i32) -> Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidDimensions { width, height });
        }

        Ok(Self {
            width: width as u32,
            height: height as u32,
        })
    }

    pub fn width_i32(&self) -> i32 {
        self.width as i32
    }

    pub fn height_i32(&self) -> i32 {
        self.height as i32
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn size_in_bytes(&self) -> usize {
        self.pixel_count() * RGBA_BYTES
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// CPU-side RGBA8 image, tightly packed, rows in GL read-back order.
#[derive(Clone, Eq, PartialEq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl PixelBuffer {
    /// Zeroed buffer. Zero width or height gives an empty buffer.
    pub fn new_black(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize * RGBA_BYTES;
        Self {
            width,
            height,
            bytes: vec![0; len],
        }
    }

    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let bytes = rgba.repeat(width as usize * height as usize);
        Self {
            width,
            height,
            bytes,
        }
    }

    pub fn from_rgba(width: u32, height: u32, bytes: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * RGBA_BYTES;
        if bytes.len() != expected {
            return Err(Error::PixelDataLength {
                expected,
                actual: bytes.len(),
            });
        }

        Ok(Self {
            width,
            height,
            bytes,
        })
    }

    pub fn for_size(size: FrameSize) -> Self {
        Self::new_black(size.width, size.height)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * RGBA_BYTES
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    pub fn take_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.offset(x, y);
        [
            self.bytes[i],
            self.bytes[i + 1],
            self.bytes[i + 2],
            self.bytes[i + 3],
        ]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let i = self.offset(x, y);
        self.bytes[i..i + RGBA_BYTES].copy_from_slice(&rgba);
    }

    /// True when both buffers have equal dimensions (the format is fixed).
    pub fn same_shape(&self, other: &PixelBuffer) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.len_matches()
            && other.len_matches()
    }

    pub fn shape_string(&self) -> String {
        format!("{}x{}x{}", self.width, self.height, RGBA_BYTES)
    }

    fn len_matches(&self) -> bool {
        self.bytes.len() == self.width as usize * self.height as usize * RGBA_BYTES
    }

    #[inline]
    fn offset(&self, x: u32, y: u32) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) out of bounds for {}x{}",
            self.width,
            self.height
        );
        (y as usize * self.width as usize + x as usize) * RGBA_BYTES
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}
