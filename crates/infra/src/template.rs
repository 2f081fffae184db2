//! # テンプレート取得
//!
//! テンプレート参照からテンプレート本体を取得するリゾルバ群。
//!
//! ## 設計方針
//!
//! - **capability trait**: 取得方法ごとに [`TemplateResolver`] を実装する
//! - **対象外は `None`**: 自分の扱う形式でない参照には `Ok(None)` を返し、次のリゾルバに委ねる
//! - **順序付きの合成**: [`CompositeTemplateResolver`] は登録順に試行し、最初の `Some` を採用する。
//!   すべて失敗した場合は各試行の結果をまとめた [`TemplateResolutionError`] を返す
//!
//! | リゾルバ | 対象 |
//! |---------|------|
//! | [`BundledTemplateResolver`] | `bundled:` / `classpath:` / `classpath*:` |
//! | [`FileTemplateResolver`] | `file:`、絶対パス、`./` 始まりの相対パス |
//! | [`HttpTemplateResolver`] | `http://` / `https://` |
//! | [`InlineTemplateResolver`] | 上記いずれの接頭辞も持たない参照（本体そのもの） |

mod bundled;
mod file;
mod http;
mod inline;

use std::sync::Arc;

use async_trait::async_trait;
pub use bundled::BundledTemplateResolver;
use bytes::Bytes;
pub use file::FileTemplateResolver;
pub use http::HttpTemplateResolver;
pub use inline::InlineTemplateResolver;
use passnotify_domain::template::TemplateResolutionError;

use crate::error::InfraError;

/// 同梱テンプレートの接頭辞
pub const BUNDLED_PREFIX: &str = "bundled:";
/// 同梱テンプレートの接頭辞（別名）
pub const CLASSPATH_PREFIX: &str = "classpath:";
/// 同梱テンプレートの接頭辞（ワイルドカード形式の別名）
pub const CLASSPATH_ALL_PREFIX: &str = "classpath*:";
/// ファイルテンプレートの接頭辞
pub const FILE_PREFIX: &str = "file:";

/// 既知の参照形式の接頭辞
const KNOWN_PREFIXES: [&str; 6] = [
    BUNDLED_PREFIX,
    CLASSPATH_PREFIX,
    CLASSPATH_ALL_PREFIX,
    FILE_PREFIX,
    "http://",
    "https://",
];

/// 参照が既知の接頭辞を持つかどうか
pub(crate) fn has_known_prefix(reference: &str) -> bool {
    KNOWN_PREFIXES
        .iter()
        .any(|prefix| reference.starts_with(prefix))
}

/// テンプレートリゾルバトレイト
#[async_trait]
pub trait TemplateResolver: Send + Sync {
    /// 集約エラーに表示するリゾルバ名
    fn name(&self) -> &'static str;

    /// 参照を解決する
    ///
    /// 対象外の参照には `Ok(None)` を返す。
    async fn resolve(&self, reference: &str) -> Result<Option<Bytes>, InfraError>;
}

/// 複数のリゾルバを順に試行するリゾルバ
#[derive(Clone)]
pub struct CompositeTemplateResolver {
    resolvers: Vec<Arc<dyn TemplateResolver>>,
}

impl CompositeTemplateResolver {
    pub fn new(resolvers: Vec<Arc<dyn TemplateResolver>>) -> Self {
        Self { resolvers }
    }

    /// 参照を解決する
    ///
    /// 最初に `Some` を返したリゾルバの結果を採用する。
    /// エラーを返したリゾルバはスキップして次を試行する。
    pub async fn resolve(&self, reference: &str) -> Result<Bytes, TemplateResolutionError> {
        let mut attempts = Vec::with_capacity(self.resolvers.len());

        for resolver in &self.resolvers {
            match resolver.resolve(reference).await {
                Ok(Some(content)) => return Ok(content),
                Ok(None) => attempts.push(format!("{}: 対象外の参照です", resolver.name())),
                Err(e) => {
                    tracing::debug!(
                        resolver = resolver.name(),
                        error = %e,
                        "テンプレートの解決に失敗、次のリゾルバを試行"
                    );
                    attempts.push(format!("{}: {e}", resolver.name()));
                }
            }
        }

        Err(TemplateResolutionError {
            reference: reference.to_string(),
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    struct FailingResolver;

    #[async_trait]
    impl TemplateResolver for FailingResolver {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn resolve(&self, _reference: &str) -> Result<Option<Bytes>, InfraError> {
            Err(InfraError::unexpected("接続拒否"))
        }
    }

    struct DecliningResolver;

    #[async_trait]
    impl TemplateResolver for DecliningResolver {
        fn name(&self) -> &'static str {
            "declining"
        }

        async fn resolve(&self, _reference: &str) -> Result<Option<Bytes>, InfraError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn 失敗したリゾルバの次のリゾルバで解決できる() {
        let sut = CompositeTemplateResolver::new(vec![
            Arc::new(FailingResolver),
            Arc::new(InlineTemplateResolver),
        ]);

        let content = sut.resolve("Hi {{ to }}").await.unwrap();

        assert_eq!(content, Bytes::from_static(b"Hi {{ to }}"));
    }

    #[tokio::test]
    async fn すべて失敗した場合は全試行の結果を含むエラーを返す() {
        let sut = CompositeTemplateResolver::new(vec![
            Arc::new(FailingResolver),
            Arc::new(DecliningResolver),
        ]);

        let err = sut.resolve("file:/missing.txt").await.unwrap_err();

        assert_eq!(err.reference, "file:/missing.txt");
        assert_eq!(err.attempts.len(), 2);
        assert!(err.attempts[0].starts_with("failing: "));
        assert!(err.attempts[0].contains("接続拒否"));
        assert_eq!(err.attempts[1], "declining: 対象外の参照です");
    }

    #[tokio::test]
    async fn リゾルバが空の場合はエラーを返す() {
        let sut = CompositeTemplateResolver::new(vec![]);

        let err = sut.resolve("x").await.unwrap_err();

        assert!(err.attempts.is_empty());
    }

    #[test]
    fn 既知の接頭辞を判定できる() {
        assert!(has_known_prefix("bundled:notifications/x/body.txt"));
        assert!(has_known_prefix("https://templates.example.org/body.txt"));
        assert!(has_known_prefix("classpath*:notifications/x/body.txt"));
        assert!(!has_known_prefix("Hello {{ to }}"));
    }
}
