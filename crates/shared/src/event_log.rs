//! # ビジネスイベントログとエラーコンテキストの構造化ヘルパー
//!
//! 通知の合成・送信・スキップ、キューメッセージの確認応答を
//! `jq` で追跡できるよう、ログフィールドの命名規約とヘルパーマクロを提供する。
//!
//! ## ビジネスイベント
//!
//! [`log_business_event!`] マクロで出力する。`event.kind = "business_event"` マーカーが
//! 自動付与され、`jq 'select(.["event.kind"] == "business_event")'` でフィルタできる。
//!
//! ## エラーコンテキスト
//!
//! `tracing::error!` に `error.category` + `error.kind` フィールドを直接追加する。
//! 定数は [`error`] モジュールで提供。
//!
//! ## フィールド命名規約
//!
//! ドット記法（`event.category`、`notification.notification_type`）を使用する。

/// ビジネスイベントを構造化ログとして出力する。
///
/// `event.kind = "business_event"` マーカーを自動付与し、
/// `tracing::info!` レベルで出力する。
///
/// ## 必須フィールド（慣例）
///
/// - `event.category`: イベントカテゴリ（[`event::category`] の定数を使用）
/// - `event.action`: アクション名（[`event::action`] の定数を使用）
/// - `event.result`: 結果（[`event::result`] の定数を使用）
///
/// ## 推奨フィールド
///
/// - `event.entity_type`: エンティティ種別（[`event::entity_type`] の定数を使用）
/// - `event.entity_id`: エンティティ ID（リソース URI）
#[macro_export]
macro_rules! log_business_event {
    ($($args:tt)*) => {
        ::tracing::info!(
            event.kind = "business_event",
            $($args)*
        )
    };
}

/// イベントフィールドの定数
pub mod event {
    /// イベントカテゴリ
    pub mod category {
        pub const NOTIFICATION: &str = "notification";
        pub const QUEUE: &str = "queue";
    }

    /// イベントアクション
    pub mod action {
        // 通知
        pub const NOTIFICATION_COMPOSED: &str = "notification.composed";
        pub const NOTIFICATION_SENT: &str = "notification.sent";
        pub const NOTIFICATION_FAILED: &str = "notification.failed";
        pub const NOTIFICATION_SKIPPED: &str = "notification.skipped";

        // キュー
        pub const MESSAGE_ACKNOWLEDGED: &str = "queue.acknowledged";
        pub const MESSAGE_DEAD_LETTERED: &str = "queue.dead_lettered";
    }

    /// エンティティ種別
    pub mod entity_type {
        pub const SUBMISSION: &str = "submission";
        pub const SUBMISSION_EVENT: &str = "submission_event";
        pub const QUEUE_MESSAGE: &str = "queue_message";
    }

    /// イベント結果
    pub mod result {
        pub const SUCCESS: &str = "success";
        pub const FAILURE: &str = "failure";
        pub const SKIPPED: &str = "skipped";
    }
}

/// エラーコンテキストフィールドの定数
pub mod error {
    /// エラーカテゴリ
    pub mod category {
        /// 設定不備（受信者設定・テンプレートセットの欠落）
        pub const CONFIGURATION: &str = "configuration";
        /// 通知内容の検証失敗（送信元・宛先の欠落）
        pub const VALIDATION: &str = "validation";
        /// インフラストラクチャ（Redis、ファイル I/O）
        pub const INFRASTRUCTURE: &str = "infrastructure";
        /// 外部サービス呼び出し（リソースストア、SMTP リレー）
        pub const EXTERNAL_SERVICE: &str = "external_service";
    }

    /// エラー種別
    pub mod kind {
        pub const UNSUPPORTED_EVENT_TYPE: &str = "unsupported_event_type";
        pub const MISSING_TEMPLATE: &str = "missing_template";
        pub const TEMPLATE_RESOLUTION: &str = "template_resolution";
        pub const TEMPLATE_RENDER: &str = "template_render";
        pub const INVALID_NOTIFICATION: &str = "invalid_notification";
        pub const RECIPIENT_RESOLUTION: &str = "recipient_resolution";
        pub const RESOURCE_LOOKUP: &str = "resource_lookup";
        pub const TRANSPORT: &str = "transport";
        pub const QUEUE: &str = "queue";
        pub const MALFORMED_MESSAGE: &str = "malformed_message";
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn アクション定数はカテゴリ接頭辞を持つ() {
        for action in [
            event::action::NOTIFICATION_COMPOSED,
            event::action::NOTIFICATION_SENT,
            event::action::NOTIFICATION_FAILED,
            event::action::NOTIFICATION_SKIPPED,
        ] {
            assert!(action.starts_with(event::category::NOTIFICATION));
        }
        for action in [
            event::action::MESSAGE_ACKNOWLEDGED,
            event::action::MESSAGE_DEAD_LETTERED,
        ] {
            assert!(action.starts_with(event::category::QUEUE));
        }
    }

    #[test]
    fn log_business_eventマクロがfmt_subscriber配下で出力できる() {
        let subscriber = tracing_subscriber::fmt().with_test_writer().finish();
        tracing::subscriber::with_default(subscriber, || {
            crate::log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_SENT,
                event.result = event::result::SUCCESS,
                "通知メール送信成功"
            );
        });
    }
}
