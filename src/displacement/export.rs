//! # 下载产物模块
//!
//! 一次生成的两个产物（原图、置换贴图）连同其下载文件名交给展示方。
//! 文件名来自配置快照，默认 `original-image.png` / `displacement-map.png`。

use std::fs;
use std::path::{Path, PathBuf};

use super::{EncodedImage, ImageError};

/// 单个可下载产物。
#[derive(Debug, Clone, Copy)]
pub struct DownloadArtifact<'a> {
    pub file_name: &'a str,
    pub image: &'a EncodedImage,
}

/// 一次生成的完整输出。
#[derive(Debug, Clone)]
pub struct DisplacementOutput {
    pub original: EncodedImage,
    pub displacement_map: EncodedImage,
    /// 仅用于展示的缩略图，未配置预览时为 `None`。
    pub original_preview: Option<EncodedImage>,
    pub displacement_preview: Option<EncodedImage>,
    pub original_file_name: String,
    pub displacement_file_name: String,
}

impl DisplacementOutput {
    /// 两个下载产物，顺序固定为（原图，置换贴图）。
    pub fn downloads(&self) -> [DownloadArtifact<'_>; 2] {
        [
            DownloadArtifact {
                file_name: &self.original_file_name,
                image: &self.original,
            },
            DownloadArtifact {
                file_name: &self.displacement_file_name,
                image: &self.displacement_map,
            },
        ]
    }

    /// 将两个产物写入目录，返回写入的路径。
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, ImageError> {
        fs::create_dir_all(dir)
            .map_err(|e| ImageError::FileSystem(format!("创建输出目录失败：{}", e)))?;

        let mut written = Vec::with_capacity(2);
        for artifact in self.downloads() {
            validate_file_name(artifact.file_name)?;

            let path = dir.join(artifact.file_name);
            fs::write(&path, &artifact.image.bytes)
                .map_err(|e| ImageError::FileSystem(format!("写入 {} 失败：{}", path.display(), e)))?;

            log::info!(
                "💾 已保存 {} - {}x{} {} bytes",
                path.display(),
                artifact.image.width,
                artifact.image.height,
                artifact.image.bytes.len()
            );
            written.push(path);
        }

        Ok(written)
    }
}

/// 文件名不能包含目录成分。
fn validate_file_name(name: &str) -> Result<(), ImageError> {
    let is_plain = !name.is_empty()
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name);

    if !is_plain {
        return Err(ImageError::FileSystem(format!("非法的下载文件名：{:?}", name)));
    }
    Ok(())
}
