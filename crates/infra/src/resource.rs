//! # リソースストア
//!
//! 投稿・投稿イベント・ユーザーを読み取る外部リポジトリへのアクセスを提供する。
//!
//! ## 設計方針
//!
//! - **読み取り専用**: 通知サービスはリソースを変更しない
//! - **trait による抽象化**: ユースケース層は `ResourceStore` のみに依存し、
//!   テストではインメモリのモックに差し替える
//! - **ID は URI**: 絶対 URL の ID はそのまま取得し、相対 ID はベース URL と種別パスから組み立てる

use async_trait::async_trait;
use passnotify_domain::submission::{
    Submission,
    SubmissionEvent,
    SubmissionEventId,
    SubmissionId,
    User,
    UserId,
};
use serde::de::DeserializeOwned;

use crate::error::InfraError;

/// リソースストアトレイト
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// 投稿を取得する
    async fn read_submission(&self, id: &SubmissionId) -> Result<Submission, InfraError>;

    /// 投稿イベントを取得する
    async fn read_submission_event(
        &self,
        id: &SubmissionEventId,
    ) -> Result<SubmissionEvent, InfraError>;

    /// ユーザーを取得する
    ///
    /// 不透明な受信者 ID をメールアドレスに解決するために使用する。
    async fn read_user(&self, id: &UserId) -> Result<User, InfraError>;
}

/// HTTP リソースストアの接続設定
#[derive(Debug, Clone, Default)]
pub struct ResourceStoreSettings {
    /// 相対 ID を解決するベース URL（例: `http://localhost:8080/data`）
    pub base_url: Option<String>,
    /// Basic 認証のユーザー名
    pub username: Option<String>,
    /// Basic 認証のパスワード
    pub password: Option<String>,
}

/// HTTP（JSON）リソースストア
#[derive(Clone)]
pub struct HttpResourceStore {
    client:   reqwest::Client,
    settings: ResourceStoreSettings,
}

impl HttpResourceStore {
    pub fn new(client: reqwest::Client, settings: ResourceStoreSettings) -> Self {
        let settings = ResourceStoreSettings {
            base_url: settings
                .base_url
                .map(|url| url.trim_end_matches('/').to_string()),
            ..settings
        };
        Self { client, settings }
    }

    /// リソース ID から取得先 URL を組み立てる
    fn resource_url(&self, kind: &str, id: &str) -> Result<String, InfraError> {
        if url::Url::parse(id).is_ok_and(|url| url.scheme().starts_with("http")) {
            return Ok(id.to_string());
        }

        match &self.settings.base_url {
            Some(base) => Ok(format!("{base}/{kind}/{}", urlencoding::encode(id))),
            None => Err(InfraError::invalid_input(format!(
                "ベース URL が未設定のため相対 ID を解決できません: {id}"
            ))),
        }
    }

    async fn read<T: DeserializeOwned>(
        &self,
        entity: &str,
        kind: &str,
        id: &str,
    ) -> Result<T, InfraError> {
        let url = self.resource_url(kind, id)?;

        let mut request = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(username) = &self.settings.username {
            request = request.basic_auth(username, self.settings.password.as_deref());
        }

        let response = request.send().await?;
        handle_response(response, entity, id).await
    }
}

#[async_trait]
impl ResourceStore for HttpResourceStore {
    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn read_submission(&self, id: &SubmissionId) -> Result<Submission, InfraError> {
        self.read("Submission", "submissions", id.as_str()).await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn read_submission_event(
        &self,
        id: &SubmissionEventId,
    ) -> Result<SubmissionEvent, InfraError> {
        self.read("SubmissionEvent", "submissionEvents", id.as_str())
            .await
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%id))]
    async fn read_user(&self, id: &UserId) -> Result<User, InfraError> {
        self.read("User", "users", id.as_str()).await
    }
}

/// リソースストアのレスポンスを共通処理する
///
/// 成功時はボディを `T` にデシリアライズし、404 は [`InfraError::not_found`]、
/// それ以外のエラーステータスは [`InfraError::unexpected_status`] に変換する。
pub(crate) async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
    entity: &str,
    id: &str,
) -> Result<T, InfraError> {
    let status = response.status();

    if status.is_success() {
        let bytes = response.bytes().await?;
        return Ok(serde_json::from_slice(&bytes)?);
    }

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(InfraError::not_found(entity, id));
    }

    let body = response.text().await.unwrap_or_default();
    Err(InfraError::unexpected_status(status.as_u16(), body))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::error::InfraErrorKind;

    /// テスト用の HTTP レスポンスを構築する
    fn make_response(status: u16, body: &str) -> reqwest::Response {
        let http_resp = http::Response::builder()
            .status(status)
            .header("content-type", "application/json")
            .body(body.to_string())
            .unwrap();
        reqwest::Response::from(http_resp)
    }

    fn store(base_url: Option<&str>) -> HttpResourceStore {
        HttpResourceStore::new(
            reqwest::Client::new(),
            ResourceStoreSettings {
                base_url: base_url.map(str::to_string),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_成功レスポンスをユーザーにデシリアライズする() {
        let response = make_response(
            200,
            r#"{"id": "https://pass.example.org/users/1", "email": "jane@x.edu"}"#,
        );

        let user: User = handle_response(response, "User", "u1").await.unwrap();

        assert_eq!(user.email.as_deref(), Some("jane@x.edu"));
    }

    #[tokio::test]
    async fn test_404でnot_foundを返す() {
        let response = make_response(404, "");

        let result: Result<User, _> = handle_response(response, "User", "u1").await;

        let err = result.unwrap_err();
        assert!(matches!(
            err.kind(),
            InfraErrorKind::NotFound { entity, id } if entity == "User" && id == "u1"
        ));
    }

    #[tokio::test]
    async fn test_500でunexpected_statusを返す() {
        let response = make_response(500, "server error");

        let result: Result<User, _> = handle_response(response, "User", "u1").await;

        assert!(matches!(
            result.unwrap_err().kind(),
            InfraErrorKind::UnexpectedStatus { status: 500, body } if body == "server error"
        ));
    }

    #[tokio::test]
    async fn test_不正なjsonでシリアライズエラーを返す() {
        let response = make_response(200, "not json");

        let result: Result<User, _> = handle_response(response, "User", "u1").await;

        assert!(matches!(
            result.unwrap_err().kind(),
            InfraErrorKind::Serialization(_)
        ));
    }

    #[test]
    fn test_絶対urlのidはそのまま使う() {
        let url = store(Some("http://localhost:8080/data"))
            .resource_url("users", "https://pass.example.org/users/1")
            .unwrap();

        assert_eq!(url, "https://pass.example.org/users/1");
    }

    #[test]
    fn test_相対idはベースurlと種別パスから組み立てる() {
        let url = store(Some("http://localhost:8080/data/"))
            .resource_url("submissions", "abc/123")
            .unwrap();

        assert_eq!(url, "http://localhost:8080/data/submissions/abc%2F123");
    }

    #[test]
    fn test_ベースurlなしの相対idは入力エラー() {
        let err = store(None).resource_url("users", "u1").unwrap_err();

        assert!(matches!(err.kind(), InfraErrorKind::InvalidInput(_)));
    }
}
