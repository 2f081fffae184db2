//! SES メール送信実装
//!
//! AWS SES v2 API を使用してメールを送信する。
//! SES のシンプルメッセージでは追跡ヘッダを付与しない。

use async_trait::async_trait;
use aws_sdk_sesv2::{
    Client,
    types::{Body, Content, Destination, EmailContent, Message},
};
use passnotify_domain::notification::{EmailMessage, MessageId, TransportError};

use super::MailTransport;

/// SES メール送信
///
/// `aws_sdk_sesv2::Client` をラップする。
/// 送信元アドレスは SES で検証済みであること。
pub struct SesMailTransport {
    client: Client,
}

impl SesMailTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// 環境（`AWS_REGION`、認証情報チェーン）から SES クライアントを構築する
    pub async fn from_env() -> Self {
        let config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(Client::new(&config))
    }
}

fn content(data: &str, part: &str) -> Result<Content, TransportError> {
    Content::builder()
        .data(data)
        .charset("UTF-8")
        .build()
        .map_err(|e| TransportError::BuildFailed(format!("{part}の構築失敗: {e}")))
}

#[async_trait]
impl MailTransport for SesMailTransport {
    async fn send(&self, email: &EmailMessage) -> Result<MessageId, TransportError> {
        let destination = Destination::builder()
            .set_to_addresses(Some(email.to.clone()))
            .set_cc_addresses((!email.cc.is_empty()).then(|| email.cc.clone()))
            .build();

        let message = Message::builder()
            .subject(content(&email.subject, "件名")?)
            .body(
                Body::builder()
                    .text(content(&email.text_body, "本文")?)
                    .build(),
            )
            .build();

        let output = self
            .client
            .send_email()
            .from_email_address(&email.from)
            .destination(destination)
            .content(EmailContent::builder().simple(message).build())
            .send()
            .await
            .map_err(|e| TransportError::SendFailed(format!("SES 送信失敗: {e}")))?;

        output
            .message_id()
            .map(MessageId::new)
            .ok_or_else(|| TransportError::SendFailed("SES がメッセージ ID を返しませんでした".to_string()))
    }
}
