//! Pixel-buffer transforms applied between read-back and upload.
//!
//! A filter maps an RGBA8 [`PixelBuffer`] to a buffer of the same width and
//! height. The engine rejects any result with a different shape.

mod canny;
#[cfg(test)]
mod tests;

pub use canny::{CannyConfig, CannyFilter};

use rayon::prelude::*;

use crate::frame::{PixelBuffer, RGBA_BYTES};

pub trait FrameFilter {
    fn name(&self) -> &str;

    fn apply(&self, input: &PixelBuffer) -> PixelBuffer;
}

impl<F> FrameFilter for F
where
    F: Fn(&PixelBuffer) -> PixelBuffer,
{
    fn name(&self) -> &str {
        "closure"
    }

    fn apply(&self, input: &PixelBuffer) -> PixelBuffer {
        self(input)
    }
}

/// Returns frames unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughFilter;

impl FrameFilter for PassthroughFilter {
    fn name(&self) -> &str {
        "passthrough"
    }

    fn apply(&self, input: &PixelBuffer) -> PixelBuffer {
        input.clone()
    }
}

/// Replaces color with its luma, alpha forced opaque.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrayscaleFilter;

impl FrameFilter for GrayscaleFilter {
    fn name(&self) -> &str {
        "grayscale"
    }

    fn apply(&self, input: &PixelBuffer) -> PixelBuffer {
        if input.is_empty() {
            return input.clone();
        }

        let gray = luma_plane(input);
        gray_to_rgba(&gray, input.width(), input.height())
    }
}

/// BT.601 luma in 14-bit fixed point, rounded.
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    const R: u32 = 4899;
    const G: u32 = 9617;
    const B: u32 = 1868;
    ((r as u32 * R + g as u32 * G + b as u32 * B + (1 << 13)) >> 14) as u8
}

/// One intensity byte per pixel, same row order as the input.
pub(crate) fn luma_plane(input: &PixelBuffer) -> Vec<u8> {
    let width = input.width() as usize;
    let mut gray = vec![0u8; width * input.height() as usize];

    gray.par_chunks_mut(width)
        .zip(input.bytes().par_chunks(input.row_bytes()))
        .for_each(|(dst, src)| {
            for (d, px) in dst.iter_mut().zip(src.chunks_exact(RGBA_BYTES)) {
                *d = luma(px[0], px[1], px[2]);
            }
        });

    gray
}

/// Replicates each intensity into R, G and B with full opacity.
pub(crate) fn gray_to_rgba(gray: &[u8], width: u32, height: u32) -> PixelBuffer {
    let mut output = PixelBuffer::new_black(width, height);

    output
        .bytes_mut()
        .par_chunks_mut(RGBA_BYTES)
        .zip(gray.par_iter())
        .for_each(|(px, &v)| {
            px.copy_from_slice(&[v, v, v, u8::MAX]);
        });

    output
}
