//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示外部来源语义
//! - `RawImageData` 表示已加载但未解码的字节
//! - `RgbaBuffer` 表示解码后的 RGBA 像素网格
//! - `EncodedImage` 表示可交给展示/下载方的编码结果

use std::path::PathBuf;

use base64::{Engine as _, engine::general_purpose};
use image::RgbaImage;

use super::ImageError;

/// 图片输入来源。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// 拖放、选择文件或粘贴得到的原始字节。
    Bytes(Vec<u8>),
    /// `data:image/...;base64,...` 形式的 Data URL。
    DataUrl(String),
    /// 纯 Base64 字符串。
    Base64(String),
    /// 本地文件路径。
    FilePath(PathBuf),
}

/// 加载阶段输出：原始字节与来源标识。
#[derive(Debug, Clone)]
pub struct RawImageData {
    /// 原始图片字节。
    pub bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub source_hint: &'static str,
    /// 按文件签名识别出的 MIME 类型。
    pub mime_type: &'static str,
}

/// 行优先的 RGBA8 像素缓冲。
///
/// 允许宽或高为 0，以便变换阶段报告 `EmptyInput`；
/// 但字节长度必须严格等于 `width * height * 4`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbaBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl RgbaBuffer {
    pub const CHANNELS: usize = 4;

    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, ImageError> {
        let expected_len = Self::expected_len(width, height)?;
        if data.len() != expected_len {
            return Err(ImageError::Decode(format!(
                "像素数据长度异常：{} 字节（期望 {} 字节）",
                data.len(),
                expected_len
            )));
        }

        Ok(Self { width, height, data })
    }

    /// 以单一颜色填充的缓冲。
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Result<Self, ImageError> {
        let pixels = Self::expected_len(width, height)? / Self::CHANNELS;
        let data = rgba.iter().copied().cycle().take(pixels * Self::CHANNELS).collect();
        Ok(Self { width, height, data })
    }

    fn expected_len(width: u32, height: u32) -> Result<usize, ImageError> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(Self::CHANNELS))
            .ok_or_else(|| ImageError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// 读取 `(x, y)` 处像素；越界返回 `None`。
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
        let px = &self.data[offset..offset + Self::CHANNELS];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// 行跨度（字节）。
    pub fn stride(&self) -> usize {
        self.width as usize * Self::CHANNELS
    }

    pub fn as_raw(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn as_raw_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// 转换为 `image` crate 的缓冲；空缓冲会被拒绝。
    pub(crate) fn to_rgba_image(&self) -> Result<RgbaImage, ImageError> {
        if self.is_empty() {
            return Err(ImageError::EmptyInput(format!(
                "无法编码 {}x{} 的图片",
                self.width, self.height
            )));
        }

        RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| ImageError::Encode("像素缓冲长度与尺寸不一致".to_string()))
    }
}

impl From<RgbaImage> for RgbaBuffer {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            data: image.into_raw(),
        }
    }
}

/// 编码后的图片：字节 + MIME + 尺寸。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// 渲染为 `data:<mime>;base64,<payload>`。
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_rejects_length_mismatch() {
        let result = RgbaBuffer::from_raw(2, 2, vec![0; 15]);
        assert!(matches!(result, Err(ImageError::Decode(_))));
    }

    #[test]
    fn zero_sized_buffer_is_representable() {
        let buffer = RgbaBuffer::from_raw(0, 0, Vec::new()).expect("0x0 buffer");
        assert!(buffer.is_empty());
        assert_eq!(buffer.pixel(0, 0), None);
        assert!(matches!(buffer.to_rgba_image(), Err(ImageError::EmptyInput(_))));
    }

    #[test]
    fn pixel_is_row_major() {
        let data = vec![
            1, 1, 1, 1, 2, 2, 2, 2, //
            3, 3, 3, 3, 4, 4, 4, 4,
        ];
        let buffer = RgbaBuffer::from_raw(2, 2, data).expect("2x2 buffer");

        assert_eq!(buffer.pixel(1, 0), Some([2, 2, 2, 2]));
        assert_eq!(buffer.pixel(0, 1), Some([3, 3, 3, 3]));
        assert_eq!(buffer.pixel(2, 0), None);
        assert_eq!(buffer.stride(), 8);
    }

    #[test]
    fn filled_repeats_color() {
        let buffer = RgbaBuffer::filled(3, 2, [9, 8, 7, 6]).expect("filled buffer");
        assert_eq!(buffer.as_raw().len(), 24);
        assert_eq!(buffer.pixel(2, 1), Some([9, 8, 7, 6]));
    }

    #[test]
    fn data_url_has_mime_prefix() {
        let encoded = EncodedImage {
            bytes: b"hello".to_vec(),
            mime_type: "image/png",
            width: 1,
            height: 1,
        };
        assert_eq!(encoded.to_data_url(), "data:image/png;base64,aGVsbG8=");
    }
}
