use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{gray_to_rgba, luma_plane, FrameFilter};
use crate::common::{Error, Result};
use crate::frame::PixelBuffer;

/// tan(22.5°), splits gradient directions into four sectors.
const TAN_22_5: f32 = 0.414_213_57;

const NOT_EDGE: u8 = 0;
const WEAK: u8 = 1;
const STRONG: u8 = 2;

/// Two-threshold edge detector parameters, on the 0–255 intensity scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CannyConfig {
    /// Gradient magnitudes at or below this are never edges.
    pub low_threshold: f32,
    /// Gradient magnitudes above this are always edges.
    pub high_threshold: f32,
    /// Euclidean gradient magnitude instead of `|gx| + |gy|`.
    pub l2_gradient: bool,
}

impl Default for CannyConfig {
    fn default() -> Self {
        Self {
            low_threshold: 50.0,
            high_threshold: 150.0,
            l2_gradient: false,
        }
    }
}

impl CannyConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.low_threshold >= 0.0 && self.high_threshold >= 0.0) {
            return Err(Error::InvalidConfig(format!(
                "thresholds must be non-negative, got {} / {}",
                self.low_threshold, self.high_threshold
            )));
        }
        if self.low_threshold > self.high_threshold {
            return Err(Error::InvalidConfig(format!(
                "low threshold {} exceeds high threshold {}",
                self.low_threshold, self.high_threshold
            )));
        }

        Ok(())
    }
}

/// Canny edge detection: luma, 3x3 Sobel, non-maximum suppression, and
/// 8-connected hysteresis. Edges come out white, everything else black.
#[derive(Debug, Clone, Default)]
pub struct CannyFilter {
    config: CannyConfig,
}

impl CannyFilter {
    pub fn new(config: CannyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CannyConfig {
        &self.config
    }

    /// Single-channel edge map (0 or 255 per pixel).
    pub fn edge_map(&self, input: &PixelBuffer) -> Vec<u8> {
        let width = input.width() as usize;
        let height = input.height() as usize;
        if input.is_empty() {
            return Vec::new();
        }

        let gray = luma_plane(input);
        let (gx, gy) = sobel(&gray, width, height);
        let magnitude = gradient_magnitude(&gx, &gy, self.config.l2_gradient);
        let classes = suppress_non_maxima(
            &magnitude,
            &gx,
            &gy,
            width,
            height,
            self.config.low_threshold,
            self.config.high_threshold,
        );

        hysteresis(classes, width, height)
    }
}

impl FrameFilter for CannyFilter {
    fn name(&self) -> &str {
        "canny"
    }

    fn apply(&self, input: &PixelBuffer) -> PixelBuffer {
        if input.is_empty() {
            return input.clone();
        }

        let edges = self.edge_map(input);
        gray_to_rgba(&edges, input.width(), input.height())
    }
}

/// 3x3 Sobel derivatives with replicated borders.
fn sobel(gray: &[u8], width: usize, height: usize) -> (Vec<i32>, Vec<i32>) {
    let mut gx = vec![0i32; width * height];
    let mut gy = vec![0i32; width * height];

    let at = |x: isize, y: isize| -> i32 {
        let x = x.clamp(0, width as isize - 1) as usize;
        let y = y.clamp(0, height as isize - 1) as usize;
        gray[y * width + x] as i32
    };

    gx.par_chunks_mut(width)
        .zip(gy.par_chunks_mut(width))
        .enumerate()
        .for_each(|(y, (row_x, row_y))| {
            let y = y as isize;
            for x in 0..width {
                let xi = x as isize;
                let (tl, t, tr) = (at(xi - 1, y - 1), at(xi, y - 1), at(xi + 1, y - 1));
                let (l, r) = (at(xi - 1, y), at(xi + 1, y));
                let (bl, b, br) = (at(xi - 1, y + 1), at(xi, y + 1), at(xi + 1, y + 1));

                row_x[x] = (tr + 2 * r + br) - (tl + 2 * l + bl);
                row_y[x] = (bl + 2 * b + br) - (tl + 2 * t + tr);
            }
        });

    (gx, gy)
}

fn gradient_magnitude(gx: &[i32], gy: &[i32], l2: bool) -> Vec<f32> {
    gx.par_iter()
        .zip(gy.par_iter())
        .map(|(&dx, &dy)| {
            if l2 {
                ((dx * dx + dy * dy) as f32).sqrt()
            } else {
                (dx.abs() + dy.abs()) as f32
            }
        })
        .collect()
}

/// Classifies each pixel as not-edge, weak or strong.
///
/// A pixel survives only if its magnitude exceeds `low` and is a local maximum
/// along the quantized gradient direction. Neighbors outside the image count
/// as zero magnitude.
fn suppress_non_maxima(
    magnitude: &[f32],
    gx: &[i32],
    gy: &[i32],
    width: usize,
    height: usize,
    low: f32,
    high: f32,
) -> Vec<u8> {
    let mag = |x: isize, y: isize| -> f32 {
        if x < 0 || y < 0 || x >= width as isize || y >= height as isize {
            0.0
        } else {
            magnitude[y as usize * width + x as usize]
        }
    };

    let mut classes = vec![NOT_EDGE; width * height];

    classes
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            let yi = y as isize;
            for (x, class) in row.iter_mut().enumerate() {
                let i = y * width + x;
                let m = magnitude[i];
                if m <= low {
                    continue;
                }

                let xi = x as isize;
                let dx = gx[i];
                let dy = gy[i];
                let ax = dx.abs() as f32;
                let ay = dy.abs() as f32;
                let tan22 = ax * TAN_22_5;
                let tan67 = tan22 + 2.0 * ax;

                let is_max = if ay < tan22 {
                    m > mag(xi - 1, yi) && m >= mag(xi + 1, yi)
                } else if ay > tan67 {
                    m > mag(xi, yi - 1) && m >= mag(xi, yi + 1)
                } else {
                    let s: isize = if (dx ^ dy) < 0 { -1 } else { 1 };
                    m > mag(xi - s, yi - 1) && m > mag(xi + s, yi + 1)
                };

                if is_max {
                    *class = if m > high { STRONG } else { WEAK };
                }
            }
        });

    classes
}

/// Promotes weak pixels 8-connected to a strong pixel, drops the rest.
fn hysteresis(mut classes: Vec<u8>, width: usize, height: usize) -> Vec<u8> {
    let mut stack: Vec<usize> = classes
        .iter()
        .enumerate()
        .filter(|&(_, &c)| c == STRONG)
        .map(|(i, _)| i)
        .collect();

    while let Some(i) = stack.pop() {
        let x = (i % width) as isize;
        let y = (i / width) as isize;
        for ny in y - 1..=y + 1 {
            for nx in x - 1..=x + 1 {
                if nx < 0 || ny < 0 || nx >= width as isize || ny >= height as isize {
                    continue;
                }
                let n = ny as usize * width + nx as usize;
                if classes[n] == WEAK {
                    classes[n] = STRONG;
                    stack.push(n);
                }
            }
        }
    }

    for c in classes.iter_mut() {
        *c = if *c == STRONG { u8::MAX } else { 0 };
    }

    classes
}
