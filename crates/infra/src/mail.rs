//! # メール送信
//!
//! 組み立て済みの [`EmailMessage`] を送信するインフラストラクチャモジュール。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: `MailTransport` trait でメール送信を抽象化
//! - **3 つの実装**: SMTP（リレー / Mailpit）、SES（AWS）、Noop（送信しない）
//! - **環境変数切替**: `NOTIFICATION_BACKEND` でランタイム選択
//! - **ネイティブなエラー型**: 失敗は [`TransportError`] で返し、
//!   不正アドレスは [`TransportError::InvalidAddress`] として区別する

mod noop;
mod ses;
mod smtp;

use async_trait::async_trait;
pub use noop::NoopMailTransport;
use passnotify_domain::notification::{EmailMessage, MessageId, TransportError};
pub use ses::SesMailTransport;
pub use smtp::{SmtpMailTransport, SmtpSettings, build_message};

/// 投稿 ID を載せる追跡ヘッダ名
pub const RESOURCE_HEADER: &str = "X-Pass-Notification-Resource";
/// 通知種別を載せる追跡ヘッダ名
pub const NOTIFICATION_TYPE_HEADER: &str = "X-Pass-Notification-Type";

/// メール送信トレイト
///
/// 送信に成功した場合、トランスポートが採番したメッセージ ID を返す。
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// メールを送信する
    async fn send(&self, message: &EmailMessage) -> Result<MessageId, TransportError>;
}

/// 送信バックエンドの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::Display)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MailBackend {
    Smtp,
    Ses,
    Noop,
}
