//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（原始字节 / Data URL / Base64 / 本地文件）的字节加载，
//! 并在“尽可能早”的阶段执行输入校验，目标是尽快失败。
//!
//! ## 实现思路
//!
//! - 字节：体积限制 + 文件签名（magic bytes）识别。
//! - Data URL：媒体类型必须是 `image/*`，解码前先估算体积。
//! - Base64：解码前估算体积。
//! - 文件：存在性 + metadata 体积限制 + 读取。
//!
//! 无法识别为图片数据的输入统一报 `UnsupportedInput`；
//! “是图片但格式不支持/已损坏”报 `Decode`。Data URL 已声明 `image/*`，
//! 其载荷无法通过签名识别时同样按解码失败处理。

use base64::{Engine as _, engine::general_purpose};
use std::path::Path;

use super::{DisplacementHandler, ImageConfig, ImageError, ImageSource, RawImageData};

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64,";

impl DisplacementHandler {
    /// 按来源类型加载原始字节。
    pub(super) fn load(
        &self,
        source: ImageSource,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        match source {
            ImageSource::Bytes(bytes) => self.load_from_bytes(bytes, "bytes", config),
            ImageSource::DataUrl(data) => self.load_from_data_url(&data, config),
            ImageSource::Base64(data) => self.load_from_base64(&data, config),
            ImageSource::FilePath(path) => self.load_from_file(&path, config),
        }
    }

    fn load_from_bytes(
        &self,
        bytes: Vec<u8>,
        source_hint: &'static str,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        log::info!("📥 开始处理图片字节 - 来源: {} 大小: {} bytes", source_hint, bytes.len());

        Self::validate_size(bytes.len() as u64, config)?;
        let mime_type = Self::detect_image_mime(&bytes)?;

        Ok(RawImageData {
            bytes,
            source_hint,
            mime_type,
        })
    }

    fn load_from_data_url(
        &self,
        data: &str,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        log::info!("📝 开始处理 Data URL 图片");

        let (media_type, bytes) = Self::parse_data_url_with_limit(data, config.max_file_size)?;
        self.load_from_bytes(bytes, "data-url", config)
            .map_err(|err| match err {
                ImageError::UnsupportedInput(reason) => ImageError::Decode(format!(
                    "声明为 {} 的 Data URL 无法解码：{}",
                    media_type, reason
                )),
                other => other,
            })
    }

    fn load_from_base64(
        &self,
        data: &str,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        log::info!("📝 开始处理 base64 图片");

        let bytes = Self::parse_base64_with_limit(data, config.max_file_size)?;
        self.load_from_bytes(bytes, "base64", config)
    }

    fn load_from_file(&self, path: &Path, config: &ImageConfig) -> Result<RawImageData, ImageError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(ImageError::FileSystem(format!("文件不存在：{}", path.display())));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| ImageError::FileSystem(format!("无法读取文件信息：{}", e)))?;
        Self::validate_size(metadata.len(), config)?;

        let bytes = std::fs::read(path)
            .map_err(|e| ImageError::FileSystem(format!("无法读取图片文件：{}", e)))?;

        self.load_from_bytes(bytes, "file", config)
    }

    /// 解析 `data:<media>;base64,<payload>`，媒体类型必须是图片。
    ///
    /// 返回声明的媒体类型（小写）与解码后的载荷。
    pub(crate) fn parse_data_url_with_limit(
        data: &str,
        max_file_size: u64,
    ) -> Result<(String, Vec<u8>), ImageError> {
        let normalized = data.trim();

        let header_and_payload = normalized
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or_else(|| ImageError::UnsupportedInput("不是 Data URL".to_string()))?;

        let marker = header_and_payload
            .find(BASE64_MARKER)
            .ok_or_else(|| ImageError::UnsupportedInput("缺少 base64 标记".to_string()))?;

        let media_type = header_and_payload[..marker].to_ascii_lowercase();
        if !media_type.starts_with("image/") {
            return Err(ImageError::UnsupportedInput(format!(
                "Data URL 媒体类型不是图片：{}",
                if media_type.is_empty() { "<empty>" } else { media_type.as_str() }
            )));
        }

        let payload = &header_and_payload[marker + BASE64_MARKER.len()..];
        let bytes = Self::parse_base64_with_limit(payload, max_file_size)?;
        Ok((media_type, bytes))
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, ImageError> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| ImageError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| ImageError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    pub(crate) fn parse_base64_with_limit(
        data: &str,
        max_file_size: u64,
    ) -> Result<Vec<u8>, ImageError> {
        let normalized = data.trim();

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(normalized)?;
        if estimated_len > max_file_size {
            return Err(ImageError::ResourceLimit(format!(
                "Base64 预计解码体积过大：{:.2} MB（限制：{:.2} MB）",
                estimated_len as f64 / 1024.0 / 1024.0,
                max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        general_purpose::STANDARD
            .decode(normalized)
            .map_err(|e| ImageError::UnsupportedInput(format!("Base64 解码失败：{}", e)))
    }

    /// 硬上限拒绝；上传提示只记录警告。
    fn validate_size(len: u64, config: &ImageConfig) -> Result<(), ImageError> {
        if len > config.max_file_size {
            return Err(ImageError::ResourceLimit(format!(
                "文件过大：{:.2} MB（限制：{:.2} MB）",
                len as f64 / 1024.0 / 1024.0,
                config.max_file_size as f64 / 1024.0 / 1024.0
            )));
        }

        if config.exceeds_upload_hint(len) {
            log::warn!(
                "⚠️ 图片体积 {:.2} MB 超过上传建议值 {:.2} MB，继续处理",
                len as f64 / 1024.0 / 1024.0,
                config.upload_size_hint as f64 / 1024.0 / 1024.0
            );
        }

        Ok(())
    }

    /// 通过文件签名（magic bytes）确认输入是图片，并返回 MIME 类型。
    pub(crate) fn detect_image_mime(bytes: &[u8]) -> Result<&'static str, ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::UnsupportedInput("图片内容为空".to_string()));
        }

        let kind = infer::get(bytes)
            .ok_or_else(|| ImageError::UnsupportedInput("无法识别图片类型".to_string()))?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(ImageError::UnsupportedInput(format!(
                "文件签名不是图片类型：{}",
                kind.mime_type()
            )));
        }

        Ok(kind.mime_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_SIGNATURE: [u8; 16] = [137, 80, 78, 71, 13, 10, 26, 10, 0, 0, 0, 13, 73, 72, 68, 82];

    #[test]
    fn detect_image_mime_recognizes_png_header() {
        assert_eq!(
            DisplacementHandler::detect_image_mime(&PNG_SIGNATURE).expect("png signature"),
            "image/png"
        );
    }

    #[test]
    fn detect_image_mime_rejects_non_image_payload() {
        let payload = b"<html><body>not an image</body></html>";
        assert!(matches!(
            DisplacementHandler::detect_image_mime(payload),
            Err(ImageError::UnsupportedInput(_))
        ));
        assert!(matches!(
            DisplacementHandler::detect_image_mime(&[]),
            Err(ImageError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn detect_image_mime_rejects_known_non_image_kind() {
        let pdf = b"%PDF-1.4\n%\xe2\xe3\xcf\xd3\n";
        assert!(matches!(
            DisplacementHandler::detect_image_mime(pdf),
            Err(ImageError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn data_url_requires_image_media_type() {
        let result = DisplacementHandler::parse_data_url_with_limit(
            "data:text/plain;base64,SGVsbG8=",
            u64::MAX,
        );
        assert!(matches!(result, Err(ImageError::UnsupportedInput(_))));
    }

    #[test]
    fn data_url_requires_base64_marker() {
        let result = DisplacementHandler::parse_data_url_with_limit("data:image/png,abc", u64::MAX);
        assert!(matches!(result, Err(ImageError::UnsupportedInput(_))));
    }

    #[test]
    fn data_url_payload_is_decoded() {
        let (media_type, bytes) = DisplacementHandler::parse_data_url_with_limit(
            " data:Image/PNG;base64,SGVsbG8= ",
            u64::MAX,
        )
        .expect("valid data url");
        assert_eq!(media_type, "image/png");
        assert_eq!(bytes, b"Hello");
    }

    #[test]
    fn declared_image_with_garbage_payload_is_a_decode_error() {
        let handler = DisplacementHandler::new(ImageConfig::default());
        let config = ImageConfig::default();
        let data_url = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(b"garbage not a png")
        );

        let result = handler.load(ImageSource::DataUrl(data_url), &config);

        assert!(matches!(result, Err(ImageError::Decode(_))));
    }

    #[test]
    fn declared_svg_data_url_fails_as_decode_error() {
        let handler = DisplacementHandler::new(ImageConfig::default());
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="4"/>"#;
        let data_url = format!(
            "data:image/svg+xml;base64,{}",
            general_purpose::STANDARD.encode(svg)
        );

        let result = handler.generate(ImageSource::DataUrl(data_url));

        assert!(matches!(result, Err(ImageError::Decode(_))));
    }

    #[test]
    fn undeclared_garbage_stays_unsupported_input() {
        let handler = DisplacementHandler::new(ImageConfig::default());
        let config = ImageConfig::default();

        let result = handler.load(
            ImageSource::Bytes(b"garbage not a png".to_vec()),
            &config,
        );

        assert!(matches!(result, Err(ImageError::UnsupportedInput(_))));
    }

    #[test]
    fn parse_base64_with_limit_rejects_large_payload_before_decode() {
        let huge = "A".repeat(1024 * 1024);
        let result = DisplacementHandler::parse_base64_with_limit(&huge, 32);

        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }

    #[test]
    fn load_from_base64_rejects_non_image_payload() {
        let handler = DisplacementHandler::new(ImageConfig::default());
        let config = ImageConfig::default();

        let result = handler.load(ImageSource::Base64("SGVsbG8=".to_string()), &config);

        assert!(matches!(result, Err(ImageError::UnsupportedInput(_))));
    }

    #[test]
    fn load_from_missing_file_reports_file_system_error() {
        let handler = DisplacementHandler::new(ImageConfig::default());
        let config = ImageConfig::default();

        let result = handler.load(
            ImageSource::FilePath("/definitely/not/here/input.png".into()),
            &config,
        );

        assert!(matches!(result, Err(ImageError::FileSystem(_))));
    }

    #[test]
    fn load_from_bytes_enforces_hard_limit() {
        let handler = DisplacementHandler::new(ImageConfig::default());
        let mut config = ImageConfig::default();
        config.max_file_size = 8;

        let result = handler.load(ImageSource::Bytes(PNG_SIGNATURE.to_vec()), &config);

        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }

    #[test]
    fn upload_hint_is_not_enforced() {
        let handler = DisplacementHandler::new(ImageConfig::default());
        let mut config = ImageConfig::default();
        config.upload_size_hint = 4;

        let raw = handler
            .load(ImageSource::Bytes(PNG_SIGNATURE.to_vec()), &config)
            .expect("hint only warns");

        assert_eq!(raw.mime_type, "image/png");
        assert_eq!(raw.source_hint, "bytes");
    }
}
