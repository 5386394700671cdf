//! # 置换贴图生成器 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │            展示方（上传 / 并排预览 / 下载）               │
//! │                                                          │
//! │  ImageSource ──────────────▶ DisplacementOutput         │
//! └───────┼──────────────────────────────────▲───────────────┘
//!         ↓ Result<T, AppError>               │
//! ┌───────┼───────────────────────────────────┼──────────────┐
//! │       ↓            后端 (Rust)             │              │
//! │                                                          │
//! │  ┌─ error ────────── AppError (统一错误类型)              │
//! │  │                                                       │
//! │  └─ displacement     加载·解码·灰度变换·编码·导出          │
//! │      ├─ service      异步入口 (spawn_blocking)            │
//! │      ├─ transform    L = 0.299R + 0.587G + 0.114B         │
//! │      └─ export       original-image.png / displacement-map.png │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，宿主入口的返回类型 |
//! | [`displacement`] | 从字节/Data URL/Base64/文件生成灰度置换贴图 |

pub mod displacement;
pub mod error;

pub use displacement::{DisplacementOutput, DisplacementService, ImageConfig, ImageError, ImageSource};
pub use error::AppError;
