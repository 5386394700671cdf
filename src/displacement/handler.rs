//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `DisplacementHandler` 只负责流程编排与配置管理，不绑定任何异步运行时。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 按来源加载原始字节
//! 3. 解码为 RGBA 像素
//! 4. 灰度变换
//! 5. 编码为 PNG（原图与置换贴图各一份），按需生成预览
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ImageConfig>>` 支持运行时动态切档。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `load/decode/transform/encode/total` 阶段耗时，便于性能诊断。
//! - 像素缓冲只存活于单次调用内，不做任何缓存。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::pipeline::{PNG_MIME_TYPE, encode_png};
use super::{
    DisplacementOutput, EncodedImage, ImageAdvancedConfig, ImageConfig, ImageError,
    ImagePerformanceProfile, ImageSource, RawImageData, RgbaBuffer, preview, transform,
};

/// 置换贴图处理器。
pub struct DisplacementHandler {
    pub(super) config: Arc<RwLock<ImageConfig>>,
}

impl DisplacementHandler {
    /// 根据初始配置创建处理器。
    ///
    /// # 示例
    /// ```rust
    /// use displacement_map::displacement::{DisplacementHandler, ImageConfig};
    ///
    /// let handler = DisplacementHandler::new(ImageConfig::default());
    /// assert_eq!(handler.get_performance_profile()?.as_str(), "balanced");
    /// # Ok::<(), displacement_map::displacement::ImageError>(())
    /// ```
    pub fn new(config: ImageConfig) -> Self {
        Self {
            config: Arc::new(RwLock::new(config)),
        }
    }

    /// 获取配置快照，保证单次请求链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<ImageConfig, ImageError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ImageError::Runtime("配置读取锁已中毒".to_string()))
    }

    pub fn set_performance_profile(&self, profile: ImagePerformanceProfile) -> Result<(), ImageError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::Runtime("配置写入锁已中毒".to_string()))?;
        config.apply_performance_profile(profile);

        log::info!(
            "⚙️ 已切换性能档位：{:?}（png_compression={:?}, preview_max_dimension={:?}, filter={:?}）",
            profile,
            config.png_compression,
            config.preview_max_dimension,
            config.preview_filter
        );

        Ok(())
    }

    pub fn get_performance_profile(&self) -> Result<ImagePerformanceProfile, ImageError> {
        let config = self
            .config
            .read()
            .map_err(|_| ImageError::Runtime("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_performance_profile())
    }

    /// 校验并应用高级配置；校验失败时原配置保持不变。
    pub fn set_advanced_config(&self, advanced: &ImageAdvancedConfig) -> Result<(), ImageError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::Runtime("配置写入锁已中毒".to_string()))?;
        config.apply_advanced(advanced)
    }

    pub fn get_advanced_config(&self) -> Result<ImageAdvancedConfig, ImageError> {
        let config = self
            .config
            .read()
            .map_err(|_| ImageError::Runtime("配置读取锁已中毒".to_string()))?;
        Ok(config.advanced())
    }

    /// 处理主入口：加载 → 解码 → 灰度变换 → 编码。
    ///
    /// 任一阶段失败即整体失败，不产出部分结果。
    pub fn generate(&self, source: ImageSource) -> Result<DisplacementOutput, ImageError> {
        let config = self.config_snapshot()?;
        self.generate_with_config(source, &config)
    }

    pub(super) fn generate_with_config(
        &self,
        source: ImageSource,
        config: &ImageConfig,
    ) -> Result<DisplacementOutput, ImageError> {
        let total_start = Instant::now();

        let load_start = Instant::now();
        let raw = self.load(source, config)?;
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let original_buffer = self.decode_to_buffer(&raw, config)?;
        let decode_elapsed = decode_start.elapsed();

        let transform_start = Instant::now();
        let displacement_buffer =
            transform::transform_with_threshold(&original_buffer, config.parallel_threshold_pixels)?;
        let transform_elapsed = transform_start.elapsed();

        let encode_start = Instant::now();
        let original = Self::original_as_png(raw, &original_buffer, config)?;
        let displacement_map = encode_png(&displacement_buffer, config.png_compression)?;
        let (original_preview, displacement_preview) = match config.preview_max_dimension {
            Some(max_dimension) => (
                Some(Self::encode_preview(&original_buffer, max_dimension, config)?),
                Some(Self::encode_preview(&displacement_buffer, max_dimension, config)?),
            ),
            None => (None, None),
        };
        let encode_elapsed = encode_start.elapsed();

        let total_elapsed = total_start.elapsed();
        log::info!(
            "✅ 置换贴图生成完成 - {}x{} load={}ms decode={}ms transform={}ms encode={}ms total={}ms",
            displacement_map.width,
            displacement_map.height,
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            transform_elapsed.as_millis(),
            encode_elapsed.as_millis(),
            total_elapsed.as_millis()
        );

        Ok(DisplacementOutput {
            original,
            displacement_map,
            original_preview,
            displacement_preview,
            original_file_name: config.original_file_name.clone(),
            displacement_file_name: config.displacement_file_name.clone(),
        })
    }

    /// 原图下载名是 `.png`，非 PNG 输入需要重新编码，PNG 输入直接复用原字节。
    fn original_as_png(
        raw: RawImageData,
        buffer: &RgbaBuffer,
        config: &ImageConfig,
    ) -> Result<EncodedImage, ImageError> {
        if raw.mime_type == PNG_MIME_TYPE {
            return Ok(EncodedImage {
                bytes: raw.bytes,
                mime_type: PNG_MIME_TYPE,
                width: buffer.width(),
                height: buffer.height(),
            });
        }

        log::debug!("🔁 原图为 {}，重新编码为 PNG 供下载", raw.mime_type);
        encode_png(buffer, config.png_compression)
    }

    fn encode_preview(
        buffer: &RgbaBuffer,
        max_dimension: u32,
        config: &ImageConfig,
    ) -> Result<EncodedImage, ImageError> {
        let resized = preview::fit_within(buffer, max_dimension, config.preview_filter)?;
        encode_png(&resized, config.png_compression)
    }
}
