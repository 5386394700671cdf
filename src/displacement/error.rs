//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载“加载 → 解码 → 灰度变换 → 编码”链路中的所有错误来源。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 所有错误对单次调用都是终止性的：不产出部分结果，也不自动重试。

/// 置换贴图生成统一错误类型。
///
/// 该类型会在宿主层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// 字节属于图片，但格式不受支持或数据损坏。
    #[error("解码错误：{0}")]
    Decode(String),

    /// 输入无法被识别为图片数据。
    #[error("输入不是图片：{0}")]
    UnsupportedInput(String),

    /// 宽或高为 0 的像素缓冲。
    #[error("空图片：{0}")]
    EmptyInput(String),

    /// 输出序列化失败。
    #[error("编码错误：{0}")]
    Encode(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("配置错误：{0}")]
    InvalidConfig(String),

    /// 后台阻塞任务执行失败（panic 或运行时关闭）。
    #[error("运行时错误：{0}")]
    Runtime(String),
}

impl ImageError {
    /// 稳定错误码，供宿主层展示或埋点。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "E_DECODE",
            Self::UnsupportedInput(_) => "E_UNSUPPORTED_INPUT",
            Self::EmptyInput(_) => "E_EMPTY_INPUT",
            Self::Encode(_) => "E_ENCODE",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::FileSystem(_) => "E_FILE_SYSTEM",
            Self::InvalidConfig(_) => "E_INVALID_CONFIG",
            Self::Runtime(_) => "E_RUNTIME",
        }
    }

    /// 出错所在的处理阶段。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnsupportedInput(_) | Self::FileSystem(_) => "load",
            Self::Decode(_) | Self::ResourceLimit(_) => "decode",
            Self::EmptyInput(_) => "transform",
            Self::Encode(_) => "encode",
            Self::InvalidConfig(_) => "config",
            Self::Runtime(_) => "runtime",
        }
    }
}

impl From<ImageError> for String {
    /// 兼容仍使用字符串错误的调用点。
    fn from(error: ImageError) -> Self {
        error.to_string()
    }
}
