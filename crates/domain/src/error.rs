//! # ドメイン層エラー定義
//!
//! 通知の合成ルール違反や設定不備を表現するエラー型。
//!
//! ## 設計方針
//!
//! - **型による分類**: エラーの種類を列挙型で明示し、パターンマッチで処理可能に
//! - **thiserror 活用**: `#[error(...)]` マクロでエラーメッセージを自動生成
//! - **黙って捨てない**: 未知のイベント種別は警告ログで読み飛ばさず、必ずエラーにする
//!
//! ## エラーの種類と扱い
//!
//! | エラー種別 | 分類 | リトライ |
//! |-----------|------|---------|
//! | `Validation` | 入力値の検証失敗 | しない |
//! | `UnsupportedEventType` | 未対応のイベント種別 | しない |
//! | `MissingRecipientConfig` | 設定不備（致命的） | しない |

use thiserror::Error;

use crate::recipient::Mode;

/// ドメイン層で発生するエラー
#[derive(Debug, Error)]
pub enum DomainError {
    /// バリデーションエラー
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    /// 未対応の投稿イベント種別
    ///
    /// 受信者の決定ルールも通知種別への対応も存在しないイベント。
    /// 通知を黙って落とさないため、合成処理はこのエラーで失敗する。
    #[error("未対応の投稿イベント種別です: '{0}'")]
    UnsupportedEventType(String),

    /// 動作モードに対応する受信者設定が存在しない
    #[error("モード '{0}' の受信者設定がありません")]
    MissingRecipientConfig(Mode),
}

impl DomainError {
    /// デプロイ・設定の欠陥を示すエラーかどうか
    ///
    /// 設定エラーは再試行しても解消しないため、呼び出し側は即座に失敗扱いにする。
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::MissingRecipientConfig(_))
    }
}
