//! HTTP テンプレート
//!
//! `http://` / `https://` の URL からテンプレートを取得する。

use async_trait::async_trait;
use bytes::Bytes;

use super::TemplateResolver;
use crate::error::InfraError;

#[derive(Debug, Clone)]
pub struct HttpTemplateResolver {
    client: reqwest::Client,
}

impl HttpTemplateResolver {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// 取得レスポンスから本文を取り出す
async fn read_body(response: reqwest::Response) -> Result<Bytes, InfraError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(InfraError::unexpected_status(status.as_u16(), body));
    }
    Ok(response.bytes().await?)
}

#[async_trait]
impl TemplateResolver for HttpTemplateResolver {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn resolve(&self, reference: &str) -> Result<Option<Bytes>, InfraError> {
        if !(reference.starts_with("http://") || reference.starts_with("https://")) {
            return Ok(None);
        }

        let response = self.client.get(reference).send().await?;
        read_body(response).await.map(Some)
    }
}
