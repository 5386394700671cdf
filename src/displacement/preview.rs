//! # 预览降采样模块
//!
//! 展示方把原图与置换贴图放进固定大小的方框中显示（等比缩放、完整可见）。
//! 这里为展示生成单边不超过 `max_dimension` 的副本；下载产物始终是原尺寸。
//!
//! 优先使用 `fast_image_resize`，失败时回退 `image::imageops::resize`。

use fast_image_resize as fr;
use image::imageops::FilterType;

use super::{ImageError, RgbaBuffer};

/// 等比缩放到单边不超过 `max_dimension`，不放大。
pub fn fit_within(
    buffer: &RgbaBuffer,
    max_dimension: u32,
    filter: FilterType,
) -> Result<RgbaBuffer, ImageError> {
    if buffer.is_empty() {
        return Err(ImageError::EmptyInput(format!(
            "无法为 {}x{} 的图片生成预览",
            buffer.width(),
            buffer.height()
        )));
    }
    if max_dimension == 0 {
        return Err(ImageError::InvalidConfig("预览尺寸上限不能为 0".to_string()));
    }

    let (width, height) = buffer.dimensions();
    let Some((target_width, target_height)) = target_dimensions(width, height, max_dimension) else {
        return Ok(buffer.clone());
    };

    log::debug!(
        "🧩 预览降采样：{}x{} -> {}x{}（filter={:?}）",
        width,
        height,
        target_width,
        target_height,
        filter
    );

    match resize_with_fast_image_resize(buffer, target_width, target_height, filter) {
        Ok(resized) => Ok(resized),
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 降采样失败，回退 image::imageops::resize：{}", err);
            let source = buffer.to_rgba_image()?;
            Ok(RgbaBuffer::from(image::imageops::resize(
                &source,
                target_width,
                target_height,
                filter,
            )))
        }
    }
}

/// 超出上限时返回目标尺寸；无需缩放返回 `None`。
fn target_dimensions(width: u32, height: u32, max_dimension: u32) -> Option<(u32, u32)> {
    if width <= max_dimension && height <= max_dimension {
        return None;
    }

    let scale = (max_dimension as f64 / width as f64).min(max_dimension as f64 / height as f64);
    let target_width = ((width as f64 * scale).floor() as u32).clamp(1, max_dimension);
    let target_height = ((height as f64 * scale).floor() as u32).clamp(1, max_dimension);

    Some((target_width, target_height))
}

fn resize_with_fast_image_resize(
    buffer: &RgbaBuffer,
    target_width: u32,
    target_height: u32,
    filter: FilterType,
) -> Result<RgbaBuffer, ImageError> {
    let src_image = fr::images::Image::from_vec_u8(
        buffer.width(),
        buffer.height(),
        buffer.as_raw().to_vec(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| ImageError::Encode(format!("构建源图像缓冲失败：{}", e)))?;

    let mut dst_image = fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ImageError::Encode(format!("fast_image_resize 执行失败：{}", e)))?;

    resized_buffer(target_width, target_height, dst_image.into_vec())
}

/// 缩放结果装回缓冲；长度不符属于编码阶段的错误。
fn resized_buffer(width: u32, height: u32, data: Vec<u8>) -> Result<RgbaBuffer, ImageError> {
    RgbaBuffer::from_raw(width, height, data).map_err(|err| match err {
        ImageError::Decode(reason) => ImageError::Encode(format!("缩放结果异常：{}", reason)),
        other => other,
    })
}

fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest => fr::FilterType::Box,
        FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}
