//! # 配置模块
//!
//! ## 设计思路
//!
//! 将所有“可调策略”集中到 `ImageConfig`，保证运行时行为可观测、可调整、可测试。
//! 性能档位（quality / balanced / speed）作为高层语义，映射到 PNG 压缩与预览参数。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - `ImagePerformanceProfile` 负责档位字符串解析与反向输出。
//! - `ImageAdvancedConfig` 是可序列化的高级参数 DTO，应用前统一校验。
//!
//! 注意：灰度公式本身没有任何可调参数，档位只影响编码速度与预览尺寸，
//! 不会改变下载产物的像素值。

use image::ImageFormat;
use image::codecs::png::CompressionType;
use image::imageops::FilterType;

use super::ImageError;

/// 上传体积提示（5MB），仅供展示层使用，变换本身不强制。
pub const DEFAULT_UPLOAD_SIZE_HINT: u64 = 5 * 1024 * 1024;

pub const DEFAULT_ORIGINAL_FILE_NAME: &str = "original-image.png";
pub const DEFAULT_DISPLACEMENT_FILE_NAME: &str = "displacement-map.png";

/// 置换贴图生成配置。
///
/// 字段覆盖了加载、解码、变换、编码与预览五个阶段。
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// 读取原始字节时允许的最大体积（字节），超过即拒绝。
    pub max_file_size: u64,
    /// 上传体积提示（字节），超过只记录警告。
    pub upload_size_hint: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 可接受的输入容器格式。
    pub accepted_formats: Vec<ImageFormat>,
    /// 像素数达到该阈值时按行并行变换。
    pub parallel_threshold_pixels: u64,
    /// 输出 PNG 压缩策略。
    pub png_compression: CompressionType,
    /// 预览图单边最大值；`None` 表示不生成预览。
    pub preview_max_dimension: Option<u32>,
    /// 预览降采样滤镜。
    pub preview_filter: FilterType,
    /// 原图下载文件名。
    pub original_file_name: String,
    /// 置换贴图下载文件名。
    pub displacement_file_name: String,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            upload_size_hint: DEFAULT_UPLOAD_SIZE_HINT,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            accepted_formats: vec![ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::WebP],
            parallel_threshold_pixels: 512 * 512,
            png_compression: CompressionType::Default,
            preview_max_dimension: Some(1024),
            preview_filter: FilterType::Triangle,
            original_file_name: DEFAULT_ORIGINAL_FILE_NAME.to_string(),
            displacement_file_name: DEFAULT_DISPLACEMENT_FILE_NAME.to_string(),
        }
    }
}

impl ImageConfig {
    /// 原始字节是否超过上传体积提示。
    pub fn exceeds_upload_hint(&self, len: u64) -> bool {
        len > self.upload_size_hint
    }

    pub(crate) fn accepts_format(&self, format: ImageFormat) -> bool {
        self.accepted_formats.contains(&format)
    }

    /// 基于当前参数反推性能档位。
    pub(crate) fn infer_performance_profile(&self) -> ImagePerformanceProfile {
        match self.png_compression {
            CompressionType::Best => ImagePerformanceProfile::Quality,
            CompressionType::Fast => ImagePerformanceProfile::Speed,
            _ => ImagePerformanceProfile::Balanced,
        }
    }

    /// 应用指定性能档位到实际参数。
    pub(crate) fn apply_performance_profile(&mut self, profile: ImagePerformanceProfile) {
        match profile {
            ImagePerformanceProfile::Quality => {
                self.png_compression = CompressionType::Best;
                self.preview_max_dimension = Some(2048);
                self.preview_filter = FilterType::CatmullRom;
            }
            ImagePerformanceProfile::Balanced => {
                self.png_compression = CompressionType::Default;
                self.preview_max_dimension = Some(1024);
                self.preview_filter = FilterType::Triangle;
            }
            ImagePerformanceProfile::Speed => {
                self.png_compression = CompressionType::Fast;
                self.preview_max_dimension = Some(512);
                self.preview_filter = FilterType::Nearest;
            }
        }
    }

    /// 校验并写入高级配置。
    pub(crate) fn apply_advanced(&mut self, advanced: &ImageAdvancedConfig) -> Result<(), ImageError> {
        advanced.validate()?;

        self.max_file_size = advanced.max_file_size;
        self.upload_size_hint = advanced.upload_size_hint;
        self.max_decoded_pixels = advanced.max_decoded_pixels;
        self.max_decoded_bytes = advanced.max_decoded_bytes;
        self.parallel_threshold_pixels = advanced.parallel_threshold_pixels;
        self.preview_max_dimension = advanced.preview_max_dimension;

        Ok(())
    }

    pub(crate) fn advanced(&self) -> ImageAdvancedConfig {
        ImageAdvancedConfig {
            max_file_size: self.max_file_size,
            upload_size_hint: self.upload_size_hint,
            max_decoded_pixels: self.max_decoded_pixels,
            max_decoded_bytes: self.max_decoded_bytes,
            parallel_threshold_pixels: self.parallel_threshold_pixels,
            preview_max_dimension: self.preview_max_dimension,
        }
    }
}

/// 图片性能档位（面向产品/用户语义）。
///
/// - `Quality`：最高压缩率、大预览
/// - `Balanced`：默认
/// - `Speed`：优先编码速度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePerformanceProfile {
    Quality,
    Balanced,
    Speed,
}

impl ImagePerformanceProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use displacement_map::displacement::ImagePerformanceProfile;
    ///
    /// let p = ImagePerformanceProfile::parse("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), displacement_map::displacement::ImageError>(())
    /// ```
    pub fn parse(profile: &str) -> Result<Self, ImageError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(ImageError::InvalidConfig(format!(
                "未知性能档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

/// 高级配置 DTO，可由宿主以 JSON 形式下发。
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ImageAdvancedConfig {
    pub max_file_size: u64,
    pub upload_size_hint: u64,
    pub max_decoded_pixels: u64,
    pub max_decoded_bytes: u64,
    pub parallel_threshold_pixels: u64,
    #[serde(default)]
    pub preview_max_dimension: Option<u32>,
}

impl ImageAdvancedConfig {
    /// 从 JSON 字符串解析并校验。
    pub fn from_json(content: &str) -> Result<Self, ImageError> {
        let parsed: Self = serde_json::from_str(content)
            .map_err(|e| ImageError::InvalidConfig(format!("解析高级配置失败：{}", e)))?;
        parsed.validate()?;
        Ok(parsed)
    }

    pub fn to_json(&self) -> Result<String, ImageError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ImageError::InvalidConfig(format!("序列化高级配置失败：{}", e)))
    }

    fn validate(&self) -> Result<(), ImageError> {
        if self.max_file_size < 1024 * 1024 {
            return Err(ImageError::InvalidConfig("max_file_size 不能小于 1MB".to_string()));
        }
        if self.upload_size_hint == 0 || self.upload_size_hint > self.max_file_size {
            return Err(ImageError::InvalidConfig(
                "upload_size_hint 必须大于 0 且不超过 max_file_size".to_string(),
            ));
        }
        if self.max_decoded_pixels == 0 {
            return Err(ImageError::InvalidConfig("max_decoded_pixels 不能为 0".to_string()));
        }
        if self.max_decoded_bytes < 8 * 1024 * 1024 {
            return Err(ImageError::InvalidConfig("max_decoded_bytes 不能小于 8MB".to_string()));
        }
        if let Some(dim) = self.preview_max_dimension {
            if !(16..=8192).contains(&dim) {
                return Err(ImageError::InvalidConfig(
                    "preview_max_dimension 必须在 16~8192 之间".to_string(),
                ));
            }
        }
        Ok(())
    }
}
