//! ファイルテンプレート
//!
//! `file:` 接頭辞、または絶対パス・`./` 始まりの相対パスをファイルとして読み込む。
//! `file://` 形式の URL も受け付ける。

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;

use super::{FILE_PREFIX, TemplateResolver};
use crate::error::InfraError;

#[derive(Debug, Clone, Copy, Default)]
pub struct FileTemplateResolver;

impl FileTemplateResolver {
    fn path_of(reference: &str) -> Result<Option<PathBuf>, InfraError> {
        if reference.starts_with("file://") {
            let url = url::Url::parse(reference)
                .map_err(|e| InfraError::invalid_input(format!("不正なファイル URL: {e}")))?;
            return url
                .to_file_path()
                .map(Some)
                .map_err(|()| InfraError::invalid_input(format!("ファイルパスに変換できません: {reference}")));
        }

        if let Some(path) = reference.strip_prefix(FILE_PREFIX) {
            return Ok(Some(PathBuf::from(path)));
        }

        let looks_like_path = !reference.contains('\n')
            && (reference.starts_with('/') || reference.starts_with("./"));
        Ok(looks_like_path.then(|| PathBuf::from(reference)))
    }
}

#[async_trait]
impl TemplateResolver for FileTemplateResolver {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn resolve(&self, reference: &str) -> Result<Option<Bytes>, InfraError> {
        let Some(path) = Self::path_of(reference)? else {
            return Ok(None);
        };

        let content = tokio::fs::read(&path).await?;
        Ok(Some(Bytes::from(content)))
    }
}
