//! # 通知サービス エラー定義
//!
//! 設定読み込みと通知処理（取得 → 合成 → ディスパッチ）で発生するエラーを定義する。
//!
//! | エラー | 発生箇所 | リスナーでの扱い |
//! |-------|---------|----------------|
//! | [`ConfigError`] | 起動時の設定読み込み | プロセスを終了する |
//! | [`NotifyError`] | メッセージ 1 件の処理 | デッドレターへ移動する |

use passnotify_domain::{DomainError, notification::NotificationType, recipient::Mode};
use passnotify_infra::InfraError;
use thiserror::Error;

use crate::usecase::notification::DispatchError;

/// 設定エラー
///
/// いずれも起動時に検出され、再試行では解消しない。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 環境変数の値が不正
    #[error("環境変数 {key} の値 '{value}' が不正です: {reason}")]
    InvalidValue {
        key:    &'static str,
        value:  String,
        reason: String,
    },

    /// 通知設定ファイルの読み込み・デシリアライズに失敗
    #[error("通知設定の読み込みに失敗: {0}")]
    Load(#[from] config::ConfigError),

    /// 同じモードの受信者設定が複数ある
    #[error("モード '{0}' の受信者設定が重複しています")]
    DuplicateRecipientConfig(Mode),

    /// 同じ通知種別のテンプレートセットが複数ある
    #[error("通知種別 '{0}' のテンプレートセットが重複しています")]
    DuplicateTemplateSet(NotificationType),

    /// 動作モードに対応する受信者設定がない
    #[error("モード '{0}' の受信者設定がありません")]
    MissingRecipientConfig(Mode),

    /// SMTP バックエンドが選択されたが `smtp` セクションがない
    #[error("NOTIFICATION_BACKEND=smtp ですが通知設定に smtp セクションがありません")]
    MissingSmtpSettings,
}

/// 通知処理エラー
#[derive(Debug, Error)]
pub enum NotifyError {
    /// リソースストアからの取得に失敗
    #[error("リソースの取得に失敗: {0}")]
    Resource(#[from] InfraError),

    /// 通知の合成に失敗（未対応のイベント種別など）
    #[error("通知の合成に失敗: {0}")]
    Compose(#[from] DomainError),

    /// ディスパッチに失敗
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl NotifyError {
    /// ログ出力用のエラー種別
    pub fn log_kind(&self) -> &'static str {
        use passnotify_shared::event_log::error::kind;

        match self {
            Self::Resource(_) => kind::RESOURCE_LOOKUP,
            Self::Compose(DomainError::UnsupportedEventType(_)) => kind::UNSUPPORTED_EVENT_TYPE,
            Self::Compose(_) => kind::INVALID_NOTIFICATION,
            Self::Dispatch(e) => e.log_kind(),
        }
    }

    /// ログ出力用のエラーカテゴリ
    pub fn log_category(&self) -> &'static str {
        use passnotify_shared::event_log::error::category;

        match self {
            Self::Resource(_) => category::EXTERNAL_SERVICE,
            Self::Compose(e) if e.is_configuration_error() => category::CONFIGURATION,
            Self::Compose(_) => category::VALIDATION,
            Self::Dispatch(e) => e.log_category(),
        }
    }
}
