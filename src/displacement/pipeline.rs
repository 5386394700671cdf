//! # 解码与编码流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → RGBA 像素”与“RGBA 像素 → PNG 字节”集中管理，并在关键节点增加资源上限控制。
//! 优先做格式与尺寸检查，再进行完整解码，降低恶意输入触发高内存开销的风险。
//!
//! ## 实现思路
//!
//! 1. 猜测格式并确认在可接受列表内
//! 2. 读取 header 尺寸，按像素/内存上限快速拒绝
//! 3. 完整解码并转换为 RGBA8
//! 4. 编码阶段统一输出 PNG（保留 alpha）

use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, ImageFormat, ImageReader};
use std::io::Cursor;

use super::{DisplacementHandler, EncodedImage, ImageConfig, ImageError, RawImageData, RgbaBuffer};

pub const PNG_MIME_TYPE: &str = "image/png";

impl DisplacementHandler {
    /// 将原始字节解码为 RGBA 像素缓冲。
    pub(crate) fn decode_to_buffer(
        &self,
        raw: &RawImageData,
        config: &ImageConfig,
    ) -> Result<RgbaBuffer, ImageError> {
        let format = image::guess_format(&raw.bytes)
            .map_err(|e| ImageError::Decode(format!("不支持的图片格式：{}", e)))?;

        if !config.accepts_format(format) {
            return Err(ImageError::Decode(format!(
                "不支持的图片格式：{:?}（仅支持 PNG / JPEG / WEBP）",
                format
            )));
        }

        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes, format)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;
        Self::validate_decoded_memory_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory_with_format(&raw.bytes, format)
            .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;

        let buffer = RgbaBuffer::from(decoded.to_rgba8());

        log::info!(
            "✅ 图片解码成功 - 来源: {} 类型: {} 尺寸: {}x{}",
            raw.source_hint,
            raw.mime_type,
            buffer.width(),
            buffer.height()
        );

        Ok(buffer)
    }

    /// 仅通过内存中的图片头信息读取宽高。
    ///
    /// 用于在完整解码前做像素限制检查；头部损坏同样视为解码错误。
    fn inspect_dimensions_from_memory(
        bytes: &[u8],
        format: ImageFormat,
    ) -> Result<(u32, u32), ImageError> {
        ImageReader::with_format(Cursor::new(bytes), format)
            .into_dimensions()
            .map_err(|e| ImageError::Decode(format!("无法读取图片尺寸：{}", e)))
    }

    fn validate_pixel_limits(config: &ImageConfig, width: u32, height: u32) -> Result<(), ImageError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| ImageError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(ImageError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    fn validate_decoded_memory_limits(
        config: &ImageConfig,
        width: u32,
        height: u32,
    ) -> Result<(), ImageError> {
        let estimated = (width as u64)
            .checked_mul(height as u64)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| ImageError::ResourceLimit("图片解码内存估算溢出".to_string()))?;

        if estimated > config.max_decoded_bytes {
            return Err(ImageError::ResourceLimit(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                config.max_decoded_bytes as f64 / 1024.0 / 1024.0
            )));
        }

        Ok(())
    }
}

/// 将 RGBA 缓冲编码为 PNG。
///
/// 空缓冲（宽或高为 0）报 `EmptyInput`，不会产出退化的 PNG。
pub fn encode_png(buffer: &RgbaBuffer, compression: CompressionType) -> Result<EncodedImage, ImageError> {
    if buffer.is_empty() {
        return Err(ImageError::EmptyInput(format!(
            "无法编码 {}x{} 的图片",
            buffer.width(),
            buffer.height()
        )));
    }

    let mut bytes = Vec::new();
    PngEncoder::new_with_quality(&mut bytes, compression, PngFilterType::Adaptive)
        .write_image(
            buffer.as_raw(),
            buffer.width(),
            buffer.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|e| ImageError::Encode(format!("PNG 编码失败：{}", e)))?;

    Ok(EncodedImage {
        bytes,
        mime_type: PNG_MIME_TYPE,
        width: buffer.width(),
        height: buffer.height(),
    })
}
