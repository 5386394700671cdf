//! # 服务层（可注入状态）
//!
//! ## 设计思路
//!
//! 使用 `DisplacementService` 作为宿主持有的状态，替代全局单例。
//! 解码、变换、编码都是 CPU 密集的阻塞调用，统一放进一个 `spawn_blocking` 任务：
//! 同一任务内顺序执行，保证变换一定在解码完成之后开始。
//!
//! 没有取消机制：调用方丢弃 future 后，后台任务仍会跑完，结果被直接丢弃。
//!
//! ## 实现思路
//!
//! 对外仅暴露少量稳定 API：
//! - `process_source`：执行完整处理链路
//! - `set_performance_profile` / `get_performance_profile`：切换与读取档位
//! - `set_advanced_config` / `get_advanced_config`：高级参数

use std::sync::Arc;

use super::{
    DisplacementHandler, DisplacementOutput, ImageAdvancedConfig, ImageConfig, ImageError,
    ImagePerformanceProfile, ImageSource,
};

/// 置换贴图服务状态，内部持有共享的 `DisplacementHandler`。
pub struct DisplacementService {
    handler: Arc<DisplacementHandler>,
}

impl DisplacementService {
    /// 使用默认配置创建服务状态。
    pub fn new() -> Self {
        Self::with_config(ImageConfig::default())
    }

    /// 使用自定义配置创建服务状态。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use displacement_map::displacement::{DisplacementService, ImageConfig, ImageSource};
    ///
    /// # async fn demo() -> Result<(), displacement_map::displacement::ImageError> {
    /// let mut config = ImageConfig::default();
    /// config.preview_max_dimension = None;
    /// let service = DisplacementService::with_config(config);
    /// let output = service
    ///     .process_source(ImageSource::FilePath("photo.jpg".into()))
    ///     .await?;
    /// output.write_to_dir(std::path::Path::new("out"))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_config(config: ImageConfig) -> Self {
        Self {
            handler: Arc::new(DisplacementHandler::new(config)),
        }
    }

    /// 执行完整处理流程：加载 → 解码 → 灰度变换 → 编码。
    pub async fn process_source(&self, source: ImageSource) -> Result<DisplacementOutput, ImageError> {
        let handler = Arc::clone(&self.handler);
        let config = handler.config_snapshot()?;

        tokio::task::spawn_blocking(move || handler.generate_with_config(source, &config))
            .await
            .map_err(|e| ImageError::Runtime(format!("后台任务执行失败：{}", e)))?
    }

    /// 按档位名称切换（quality / balanced / speed）。
    pub fn set_performance_profile(&self, profile: &str) -> Result<(), ImageError> {
        let profile = ImagePerformanceProfile::parse(profile)?;
        self.handler.set_performance_profile(profile)
    }

    pub fn get_performance_profile(&self) -> Result<String, ImageError> {
        let profile = self.handler.get_performance_profile()?;
        Ok(profile.as_str().to_string())
    }

    pub fn set_advanced_config(&self, config: ImageAdvancedConfig) -> Result<(), ImageError> {
        self.handler.set_advanced_config(&config)
    }

    pub fn get_advanced_config(&self) -> Result<ImageAdvancedConfig, ImageError> {
        self.handler.get_advanced_config()
    }
}

impl Default for DisplacementService {
    fn default() -> Self {
        Self::new()
    }
}
