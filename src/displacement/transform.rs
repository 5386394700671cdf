//! # 灰度变换模块（核心）
//!
//! ## 设计思路
//!
//! 对每个像素独立计算感知亮度：
//!
//! ```text
//! L = 0.299·R + 0.587·G + 0.114·B
//! 输出像素 = (L, L, L, A)
//! ```
//!
//! 像素之间没有任何依赖，因此可以按行并行，结果与串行完全一致。
//!
//! ## 取整规则
//!
//! 统一采用“向零截断”，并用千分位定点整数实现：
//! `(299·R + 587·G + 114·B) / 1000`。
//! 浮点实现在 R=G=B 时会出现 `254.99999…` 被截断为 254 的情况，
//! 定点实现与精确实数截断逐字节一致，且对已灰度化的图片保持幂等。

use rayon::prelude::*;

use super::{ImageError, RgbaBuffer};

pub const LUMA_R: u32 = 299;
pub const LUMA_G: u32 = 587;
pub const LUMA_B: u32 = 114;
pub const LUMA_SCALE: u32 = 1000;

/// 未指定阈值时的并行门槛（像素数）。
pub const DEFAULT_PARALLEL_THRESHOLD_PIXELS: u64 = 512 * 512;

/// 单像素亮度（向零截断）。
///
/// # 示例
/// ```rust
/// use displacement_map::displacement::luminance;
///
/// assert_eq!(luminance(255, 0, 0), 76);
/// assert_eq!(luminance(255, 255, 255), 255);
/// ```
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> u8 {
    let weighted = LUMA_R * r as u32 + LUMA_G * g as u32 + LUMA_B * b as u32;
    // 三个权重之和为 LUMA_SCALE，结果必然落在 0..=255
    (weighted / LUMA_SCALE) as u8
}

/// 生成灰度化后的新缓冲，输入保持不变。
pub fn transform(buffer: &RgbaBuffer) -> Result<RgbaBuffer, ImageError> {
    transform_with_threshold(buffer, DEFAULT_PARALLEL_THRESHOLD_PIXELS)
}

/// 同 [`transform`]，可指定并行门槛。
pub fn transform_with_threshold(
    buffer: &RgbaBuffer,
    parallel_threshold_pixels: u64,
) -> Result<RgbaBuffer, ImageError> {
    ensure_not_empty(buffer)?;

    let mut output = buffer.clone();
    grayscale_pixels(&mut output, parallel_threshold_pixels);
    Ok(output)
}

/// 在调用方持有的私有副本上原地灰度化。
pub fn transform_in_place(
    buffer: &mut RgbaBuffer,
    parallel_threshold_pixels: u64,
) -> Result<(), ImageError> {
    ensure_not_empty(buffer)?;
    grayscale_pixels(buffer, parallel_threshold_pixels);
    Ok(())
}

fn ensure_not_empty(buffer: &RgbaBuffer) -> Result<(), ImageError> {
    if buffer.is_empty() {
        return Err(ImageError::EmptyInput(format!(
            "图片尺寸为 {}x{}，无法生成置换贴图",
            buffer.width(),
            buffer.height()
        )));
    }
    Ok(())
}

fn grayscale_pixels(buffer: &mut RgbaBuffer, parallel_threshold_pixels: u64) {
    let stride = buffer.stride();
    let parallel = buffer.pixel_count() >= parallel_threshold_pixels && buffer.height() > 1;

    log::debug!(
        "🎨 灰度变换 - 尺寸: {}x{} 并行: {}",
        buffer.width(),
        buffer.height(),
        parallel
    );

    if parallel {
        buffer
            .as_raw_mut()
            .par_chunks_exact_mut(stride)
            .for_each(grayscale_row);
    } else {
        buffer.as_raw_mut().chunks_exact_mut(stride).for_each(grayscale_row);
    }
}

fn grayscale_row(row: &mut [u8]) {
    for px in row.chunks_exact_mut(RgbaBuffer::CHANNELS) {
        let gray = luminance(px[0], px[1], px[2]);
        px[0] = gray;
        px[1] = gray;
        px[2] = gray;
        // alpha 原样保留
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_pixel(rgba: [u8; 4]) -> RgbaBuffer {
        RgbaBuffer::from_raw(1, 1, rgba.to_vec()).expect("1x1 buffer")
    }

    #[test]
    fn pure_red_truncates_to_76() {
        let output = transform(&single_pixel([255, 0, 0, 255])).expect("transform");
        assert_eq!(output.pixel(0, 0), Some([76, 76, 76, 255]));
    }

    #[test]
    fn transparent_black_stays_transparent_black() {
        let output = transform(&single_pixel([0, 0, 0, 0])).expect("transform");
        assert_eq!(output.pixel(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn white_is_invariant() {
        let white = RgbaBuffer::filled(2, 2, [255, 255, 255, 255]).expect("white");
        let output = transform(&white).expect("transform");
        assert_eq!(output, white);
    }

    #[test]
    fn primary_channels_use_perceptual_weights() {
        assert_eq!(luminance(0, 255, 0), 149);
        assert_eq!(luminance(0, 0, 255), 29);
        assert_eq!(luminance(10, 20, 30), 18);
    }

    #[test]
    fn every_gray_level_is_a_fixed_point() {
        for v in 0..=255u8 {
            assert_eq!(luminance(v, v, v), v, "gray level {} drifted", v);
        }
    }

    #[test]
    fn alpha_passes_through() {
        let output = transform(&single_pixel([12, 200, 99, 37])).expect("transform");
        assert_eq!(output.pixel(0, 0).map(|px| px[3]), Some(37));
    }

    #[test]
    fn empty_buffer_is_rejected() {
        let empty = RgbaBuffer::from_raw(0, 0, Vec::new()).expect("0x0 buffer");
        assert!(matches!(transform(&empty), Err(ImageError::EmptyInput(_))));

        let mut zero_height = RgbaBuffer::from_raw(5, 0, Vec::new()).expect("5x0 buffer");
        assert!(matches!(
            transform_in_place(&mut zero_height, 0),
            Err(ImageError::EmptyInput(_))
        ));
    }

    #[test]
    fn parallel_and_sequential_paths_agree() {
        let (width, height) = (37u32, 23u32);
        let data: Vec<u8> = (0..width * height * 4).map(|i| (i * 31 % 256) as u8).collect();
        let buffer = RgbaBuffer::from_raw(width, height, data).expect("buffer");

        let sequential = transform_with_threshold(&buffer, u64::MAX).expect("sequential");
        let parallel = transform_with_threshold(&buffer, 0).expect("parallel");

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn in_place_matches_copying_transform() {
        let data: Vec<u8> = (0..4 * 3 * 4).map(|i| (i * 7 % 256) as u8).collect();
        let buffer = RgbaBuffer::from_raw(4, 3, data).expect("buffer");

        let copied = transform(&buffer).expect("transform");
        let mut owned = buffer.clone();
        transform_in_place(&mut owned, DEFAULT_PARALLEL_THRESHOLD_PIXELS).expect("in place");

        assert_eq!(owned, copied);
    }
}
