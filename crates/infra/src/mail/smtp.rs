//! SMTP メール送信実装
//!
//! lettre の `AsyncSmtpTransport` を使用してメールを送信する。
//! 本番では STARTTLS 付きで SMTP リレーに、開発環境では平文で Mailpit に接続する。

use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport,
    AsyncTransport,
    Message,
    Tokio1Executor,
    message::{
        Mailbox,
        header::{ContentType, Header, HeaderName, HeaderValue},
    },
    transport::smtp::authentication::Credentials,
};
use passnotify_domain::notification::{EmailMessage, MessageId, TransportError};
use serde::Deserialize;
use uuid::Uuid;

use super::{MailTransport, NOTIFICATION_TYPE_HEADER, RESOURCE_HEADER};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// SMTP 接続設定
///
/// 設定ファイルの `smtp` セクションに対応する。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SmtpSettings {
    pub host:            String,
    #[serde(default = "default_port")]
    pub port:            u16,
    #[serde(rename = "smtpUser", alias = "smtpuser", default)]
    pub username:        Option<String>,
    #[serde(rename = "smtpPassword", alias = "smtppassword", default)]
    pub password:        Option<String>,
    /// STARTTLS を使用するか（Mailpit 等では false）
    #[serde(default = "default_secure")]
    pub secure:          bool,
    #[serde(rename = "timeoutSeconds", alias = "timeoutseconds", default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_port() -> u16 {
    587
}

fn default_secure() -> bool {
    true
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECONDS
}

/// SMTP メール送信
///
/// `lettre::AsyncSmtpTransport<Tokio1Executor>` をラップする。
pub struct SmtpMailTransport {
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailTransport {
    /// 新しい SMTP 送信インスタンスを作成
    pub fn new(settings: &SmtpSettings) -> Result<Self, TransportError> {
        let builder = if settings.secure {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
                .map_err(|e| TransportError::BuildFailed(format!("SMTP 接続設定が不正: {e}")))?
        } else {
            // TLS なしで接続（Mailpit 等のローカル SMTP 向け）
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
        };

        let builder = builder
            .port(settings.port)
            .timeout(Some(Duration::from_secs(settings.timeout_seconds)));

        let builder = match (&settings.username, &settings.password) {
            (Some(user), Some(password)) if !user.is_empty() => {
                builder.credentials(Credentials::new(user.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(Self {
            transport: builder.build(),
        })
    }
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, email: &EmailMessage) -> Result<MessageId, TransportError> {
        let (message, message_id) = build_message(email)?;

        self.transport.send(message).await.map_err(|e| {
            match e.status().map(|code| code.to_string()) {
                // 550: mailbox unavailable / 553: mailbox name not allowed
                Some(code) if e.is_permanent() && (code == "550" || code == "553") => {
                    TransportError::InvalidAddress {
                        address: email.to.join(","),
                        reason:  format!("SMTP リレーが拒否: {e}"),
                    }
                }
                _ => TransportError::SendFailed(format!("SMTP 送信失敗: {e}")),
            }
        })?;

        Ok(message_id)
    }
}

/// [`EmailMessage`] から lettre のメッセージを組み立てる
///
/// 宛先・送信元のアドレスはここで検証され、不正な場合は
/// [`TransportError::InvalidAddress`] を返す。
/// メッセージ ID は `<uuid@送信元ドメイン>` 形式で採番する。
pub fn build_message(email: &EmailMessage) -> Result<(Message, MessageId), TransportError> {
    let from = parse_mailbox(&email.from)?;
    let message_id = format!("<{}@{}>", Uuid::new_v4(), from.email.domain());

    let mut builder = Message::builder()
        .from(from)
        .subject(email.subject.as_str())
        .message_id(Some(message_id.clone()))
        .header(ContentType::TEXT_PLAIN);

    for to in &email.to {
        builder = builder.to(parse_mailbox(to)?);
    }
    for cc in &email.cc {
        builder = builder.cc(parse_mailbox(cc)?);
    }
    if let Some(resource) = &email.resource_ref {
        builder = builder.header(ResourceHeader(resource.clone()));
    }
    if let Some(notification_type) = email.notification_type {
        builder = builder.header(NotificationTypeHeader(notification_type.to_string()));
    }

    let message = builder
        .body(email.text_body.clone())
        .map_err(|e| TransportError::BuildFailed(e.to_string()))?;

    Ok((message, MessageId::new(message_id)))
}

fn parse_mailbox(address: &str) -> Result<Mailbox, TransportError> {
    address
        .trim()
        .parse::<Mailbox>()
        .map_err(|e| TransportError::InvalidAddress {
            address: address.to_string(),
            reason:  e.to_string(),
        })
}

/// `X-Pass-Notification-Resource` ヘッダ
#[derive(Debug, Clone)]
struct ResourceHeader(String);

impl Header for ResourceHeader {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str(RESOURCE_HEADER)
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}

/// `X-Pass-Notification-Type` ヘッダ
#[derive(Debug, Clone)]
struct NotificationTypeHeader(String);

impl Header for NotificationTypeHeader {
    fn name() -> HeaderName {
        HeaderName::new_from_ascii_str(NOTIFICATION_TYPE_HEADER)
    }

    fn parse(s: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self(s.to_string()))
    }

    fn display(&self) -> HeaderValue {
        HeaderValue::new(Self::name(), self.0.clone())
    }
}
