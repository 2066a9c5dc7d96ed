use crate::frame::PixelBuffer;

pub(crate) fn solid_gray(width: u32, height: u32, value: u8) -> PixelBuffer {
    PixelBuffer::filled(width, height, [value, value, value, 255])
}

/// Columns `0..split` get `left`, the rest `right`.
pub(crate) fn vertical_step(width: u32, height: u32, split: u32, left: u8, right: u8) -> PixelBuffer {
    let mut buffer = PixelBuffer::new_black(width, height);
    for y in 0..height {
        for x in 0..width {
            let v = if x < split { left } else { right };
            buffer.set_pixel(x, y, [v, v, v, 255]);
        }
    }
    buffer
}

/// Rows `0..split` get `top`, the rest `bottom`.
pub(crate) fn horizontal_step(width: u32, height: u32, split: u32, top: u8, bottom: u8) -> PixelBuffer {
    let mut buffer = PixelBuffer::new_black(width, height);
    for y in 0..height {
        let v = if y < split { top } else { bottom };
        for x in 0..width {
            buffer.set_pixel(x, y, [v, v, v, 255]);
        }
    }
    buffer
}

/// Distinct columns holding at least one non-black pixel.
pub(crate) fn edge_columns(buffer: &PixelBuffer) -> Vec<u32> {
    (0..buffer.width())
        .filter(|&x| (0..buffer.height()).any(|y| buffer.pixel(x, y)[0] != 0))
        .collect()
}

/// Distinct rows holding at least one non-black pixel.
pub(crate) fn edge_rows(buffer: &PixelBuffer) -> Vec<u32> {
    (0..buffer.height())
        .filter(|&y| (0..buffer.width()).any(|x| buffer.pixel(x, y)[0] != 0))
        .collect()
}

pub(crate) fn count_lit(buffer: &PixelBuffer) -> usize {
    buffer
        .bytes()
        .chunks_exact(4)
        .filter(|px| px[0] != 0)
        .count()
}
