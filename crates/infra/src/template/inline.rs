//! インラインテンプレート
//!
//! 参照文字列そのものをテンプレート本体として扱う。
//! 既知の接頭辞を持つ参照は他のリゾルバの担当なので対象外とする。

use async_trait::async_trait;
use bytes::Bytes;

use super::{TemplateResolver, has_known_prefix};
use crate::error::InfraError;

#[derive(Debug, Clone, Copy, Default)]
pub struct InlineTemplateResolver;

#[async_trait]
impl TemplateResolver for InlineTemplateResolver {
    fn name(&self) -> &'static str {
        "inline"
    }

    async fn resolve(&self, reference: &str) -> Result<Option<Bytes>, InfraError> {
        if has_known_prefix(reference) {
            return Ok(None);
        }
        Ok(Some(Bytes::copy_from_slice(reference.as_bytes())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn 参照文字列をそのまま返す() {
        let content = InlineTemplateResolver
            .resolve("Dear {{ to }},")
            .await
            .unwrap();

        assert_eq!(content, Some(Bytes::from_static(b"Dear {{ to }},")));
    }

    #[tokio::test]
    async fn 既知の接頭辞を持つ参照は対象外() {
        let content = InlineTemplateResolver
            .resolve("file:/etc/templates/body.txt")
            .await
            .unwrap();

        assert!(content.is_none());
    }

    #[tokio::test]
    async fn ワイルドカード形式のclasspath参照は対象外() {
        let content = InlineTemplateResolver
            .resolve("classpath*:notifications/SUBMISSION_APPROVAL_INVITE/body.txt")
            .await
            .unwrap();

        assert!(content.is_none());
    }
}
