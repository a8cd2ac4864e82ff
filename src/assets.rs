use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AdPulseError, Result};
use crate::orchestrator::AssetEncoder;

/// A local file supplied by the user (brand asset, reference image, ad video)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetHandle {
    pub path: PathBuf,
    pub mime_type: String,
}

impl AssetHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime_type = mime_for_path(&path).to_string();
        Self { path, mime_type }
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.to_string_lossy().to_string())
    }

    /// Asset description handed to the text model
    pub fn meta(&self) -> AssetMeta {
        let top_level = self
            .mime_type
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string();
        AssetMeta {
            id: self.name(),
            mime_type: self.mime_type.clone(),
            tags: vec!["brand_asset".to_string(), top_level],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetMeta {
    pub id: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    pub tags: Vec<String>,
}

/// Base64 form of an asset, ready to inline in a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAsset {
    pub mime_type: String,
    pub data: String,
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Reads assets from disk and base64-encodes them
#[derive(Debug, Clone, Default)]
pub struct FsAssetEncoder;

#[async_trait]
impl AssetEncoder for FsAssetEncoder {
    async fn encode(&self, asset: &AssetHandle) -> Result<EncodedAsset> {
        tracing::debug!("Encoding asset {}", asset.path.display());
        let bytes = tokio::fs::read(&asset.path)
            .await
            .map_err(|e| AdPulseError::Encoding {
                path: asset.path.display().to_string(),
                message: e.to_string(),
            })?;

        Ok(EncodedAsset {
            mime_type: asset.mime_type.clone(),
            data: BASE64.encode(bytes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mime_from_extension() {
        assert_eq!(AssetHandle::new("logo.PNG").mime_type, "image/png");
        assert_eq!(AssetHandle::new("shot.jpeg").mime_type, "image/jpeg");
        assert_eq!(AssetHandle::new("ad.mov").mime_type, "video/quicktime");
        assert_eq!(
            AssetHandle::new("notes").mime_type,
            "application/octet-stream"
        );
    }

    #[test]
    fn meta_tags_asset_kind() {
        let meta = AssetHandle::new("/brand/hero.webp").meta();
        assert_eq!(meta.id, "hero.webp");
        assert_eq!(meta.tags, vec!["brand_asset", "image"]);
        assert_eq!(serde_json::to_value(&meta).unwrap()["type"], "image/webp");
    }

    #[tokio::test]
    async fn encodes_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.png");
        std::fs::write(&path, b"hi").unwrap();

        let encoded = FsAssetEncoder.encode(&AssetHandle::new(&path)).await.unwrap();
        assert_eq!(encoded.data, "aGk=");
        assert_eq!(encoded.mime_type, "image/png");
    }

    #[tokio::test]
    async fn missing_file_is_encoding_error() {
        let err = FsAssetEncoder
            .encode(&AssetHandle::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ENCODING_FAILED");
    }
}
