//! Noop メール送信実装
//!
//! メールを実際に送信せず、ログ出力のみ行う。
//! ローカル開発やメール基盤のない環境で使用する。

use async_trait::async_trait;
use passnotify_domain::notification::{EmailMessage, MessageId, TransportError};
use uuid::Uuid;

use super::MailTransport;

/// Noop メール送信（ログ出力のみ）
#[derive(Debug, Clone, Default)]
pub struct NoopMailTransport;

#[async_trait]
impl MailTransport for NoopMailTransport {
    async fn send(&self, email: &EmailMessage) -> Result<MessageId, TransportError> {
        let message_id = MessageId::new(format!("noop-{}", Uuid::now_v7()));
        tracing::info!(
            to = %email.to.join(","),
            subject = %email.subject,
            message_id = %message_id,
            "Noop: メール送信をスキップ"
        );
        Ok(message_id)
    }
}
