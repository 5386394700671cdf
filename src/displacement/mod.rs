//! # 置换贴图模块（displacement）
//!
//! ## 设计思路
//!
//! 该模块将“图片来源识别 → 加载校验 → 解码 → 灰度变换 → 编码导出”按职责拆分为多个子模块。
//!
//! - `service`：承载可注入状态（`DisplacementService`），异步入口
//! - `handler`：编排整条处理流水线
//! - `loader`：负责字节 / Data URL / Base64 / 文件加载与签名校验
//! - `pipeline`：负责解码、像素限制与 PNG 编码
//! - `transform`：灰度变换核心
//! - `preview`：展示用降采样
//! - `export`：下载产物与文件名
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 新同事快速上手
//!
//! ```text
//! 宿主调用
//!    ↓
//! service.rs（State 注入、spawn_blocking）
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志）
//!    ├─ loader.rs（来源加载 + 签名/体积校验）
//!    ├─ pipeline.rs（解码 + 像素限制）
//!    ├─ transform.rs（L = 0.299R + 0.587G + 0.114B）
//!    ├─ pipeline.rs（PNG 编码）
//!    └─ preview.rs（可选预览）
//!    ↓
//! export.rs（DisplacementOutput → 下载 / 写盘）
//! ```

mod config;
mod error;
mod export;
mod handler;
mod loader;
mod pipeline;
pub mod preview;
mod service;
mod source;
pub mod transform;

pub use config::{
    DEFAULT_DISPLACEMENT_FILE_NAME, DEFAULT_ORIGINAL_FILE_NAME, DEFAULT_UPLOAD_SIZE_HINT,
    ImageAdvancedConfig, ImageConfig, ImagePerformanceProfile,
};
pub use error::ImageError;
pub use export::{DisplacementOutput, DownloadArtifact};
pub use handler::DisplacementHandler;
pub use pipeline::{PNG_MIME_TYPE, encode_png};
pub use service::DisplacementService;
pub use source::{EncodedImage, ImageSource, RawImageData, RgbaBuffer};
pub use transform::{luminance, transform, transform_in_place, transform_with_threshold};
