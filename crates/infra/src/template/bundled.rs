//! 同梱テンプレート
//!
//! バイナリに埋め込まれたテンプレートを `bundled:<パス>` で参照する。
//! `classpath:<パス>` と `classpath*:<パス>` も同じ名前空間として扱う。

use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;

use super::{BUNDLED_PREFIX, CLASSPATH_ALL_PREFIX, CLASSPATH_PREFIX, TemplateResolver};
use crate::error::InfraError;

/// 同梱テンプレートリゾルバ
#[derive(Debug, Clone, Default)]
pub struct BundledTemplateResolver {
    templates: HashMap<&'static str, &'static str>,
}

impl BundledTemplateResolver {
    /// パスとテンプレート本体の組から作成する
    pub fn new(templates: impl IntoIterator<Item = (&'static str, &'static str)>) -> Self {
        Self {
            templates: templates.into_iter().collect(),
        }
    }

    /// 登録されているテンプレート数
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn strip_prefix(reference: &str) -> Option<&str> {
        reference
            .strip_prefix(BUNDLED_PREFIX)
            .or_else(|| reference.strip_prefix(CLASSPATH_PREFIX))
            .or_else(|| reference.strip_prefix(CLASSPATH_ALL_PREFIX))
            .map(|path| path.trim_start_matches('/'))
    }
}

#[async_trait]
impl TemplateResolver for BundledTemplateResolver {
    fn name(&self) -> &'static str {
        "bundled"
    }

    async fn resolve(&self, reference: &str) -> Result<Option<Bytes>, InfraError> {
        let Some(path) = Self::strip_prefix(reference) else {
            return Ok(None);
        };

        self.templates
            .get(path)
            .map(|content| Some(Bytes::from_static(content.as_bytes())))
            .ok_or_else(|| {
                InfraError::from(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("同梱テンプレートが存在しません: {path}"),
                ))
            })
    }
}
