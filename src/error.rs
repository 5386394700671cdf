//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义宿主侧统一的 `AppError` 枚举，宿主入口统一返回 `Result<T, AppError>`，
//! 通过 `Serialize` 将错误序列化为字符串，满足 IPC/JSON 传输要求。
//!
//! 面向用户只展示通用提示（`notice`）；宿主边界通过 `log_and_notice`
//! 把具体原因写入日志，用户可重新提交图片。

use serde::Serialize;

use crate::displacement::ImageError;

/// 面向用户的通用失败提示。
pub const GENERIC_FAILURE_NOTICE: &str = "Failed to process image. Please try again.";

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 置换贴图流水线错误（加载 / 解码 / 变换 / 编码）
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// 用户可见的提示文案，与具体原因无关。
    pub fn notice(&self) -> &'static str {
        GENERIC_FAILURE_NOTICE
    }

    /// 宿主边界调用：记录具体原因，返回用户可见的提示。
    pub fn log_and_notice(&self) -> &'static str {
        log::error!("❌ 处理图片失败 [{}]: {}", self.code(), self);
        self.notice()
    }

    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Image(err) => err.code(),
            Self::Io(_) => "E_IO",
        }
    }
}

/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
