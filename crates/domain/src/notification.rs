//! # 通知
//!
//! 投稿イベントから合成される通知と、送信用メールメッセージのドメインモデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`Notification`] | 通知（送信意図） | 誰に・何を・どう送るかを確定したもの |
//! | [`NotificationType`] | 通知種別 | イベントの結果ごとに 1 種類 |
//! | [`Param`] | テンプレートパラメータ | 固定の列挙 |
//! | [`Link`] | リンク | テンプレートに渡す `{rel, href}` |
//! | [`EmailMessage`] | メールメッセージ | トランスポートに渡す最終形 |
//!
//! ## 設計方針
//!
//! - **不変**: [`Notification`] は合成後に変更されない。フィールドは getter でのみ公開する
//! - **永続化しない**: 1 イベントにつき 1 つ生成され、ディスパッチ後に破棄される
//! - **受信者は未解決のまま保持**: `mailto:` URI とリソース参照のどちらも保持し、
//!   メールアドレスへの解決はディスパッチ時に行う

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::IntoStaticStr;
use thiserror::Error;

use crate::{
    DomainError,
    submission::{SubmissionEventId, SubmissionEventType, SubmissionId, UserId},
};

define_resource_id! {
    /// 送信済みメッセージ ID
    ///
    /// トランスポートが採番した識別子（SMTP の Message-ID、SES の MessageId）。
    pub struct MessageId;
}

/// 通知種別
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    /// 新規ユーザーへの承認依頼（招待）
    SubmissionApprovalInvite,
    /// 承認依頼
    SubmissionApprovalRequested,
    /// 修正依頼
    SubmissionChangesRequested,
    /// 投稿完了
    SubmissionSubmissionSubmitted,
    /// 投稿取り消し
    SubmissionSubmissionCancelled,
}

impl NotificationType {
    /// 投稿イベント種別に対応する通知種別を返す
    pub fn for_event(event_type: &SubmissionEventType) -> Result<Self, DomainError> {
        match event_type {
            SubmissionEventType::ApprovalRequestedNewuser => Ok(Self::SubmissionApprovalInvite),
            SubmissionEventType::ApprovalRequested => Ok(Self::SubmissionApprovalRequested),
            SubmissionEventType::ChangesRequested => Ok(Self::SubmissionChangesRequested),
            SubmissionEventType::Submitted => Ok(Self::SubmissionSubmissionSubmitted),
            SubmissionEventType::Cancelled => Ok(Self::SubmissionSubmissionCancelled),
            SubmissionEventType::Unrecognized(raw) => {
                Err(DomainError::UnsupportedEventType(raw.clone()))
            }
        }
    }
}

/// テンプレートパラメータ
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    IntoStaticStr,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Param {
    To,
    From,
    Cc,
    Subject,
    ResourceMetadata,
    EventMetadata,
    Links,
}

impl Param {
    /// テンプレート内で参照する変数名
    pub fn template_key(self) -> &'static str {
        match self {
            Self::To => "to",
            Self::From => "from",
            Self::Cc => "cc",
            Self::Subject => "subject",
            Self::ResourceMetadata => "resource_metadata",
            Self::EventMetadata => "event_metadata",
            Self::Links => "link_metadata",
        }
    }
}

/// リンク関係名
pub mod link_rel {
    /// 新規ユーザーを投稿のレビューに招待する
    pub const SUBMISSION_REVIEW_INVITE: &str = "submission-review-invite";
    /// 投稿をレビューする
    pub const SUBMISSION_REVIEW: &str = "submission-review";
    /// 投稿を閲覧する
    pub const SUBMISSION_VIEW: &str = "submission-view";
}

/// テンプレートに渡すリンク
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub rel:  String,
    pub href: String,
}

/// 新規通知の作成パラメータ
pub struct NewNotification {
    pub notification_type: NotificationType,
    pub recipients:        BTreeSet<UserId>,
    pub sender:            String,
    pub cc:                BTreeSet<String>,
    pub parameters:        BTreeMap<Param, String>,
    pub event_ref:         Option<SubmissionEventId>,
    pub resource_ref:      Option<SubmissionId>,
}

/// 通知（送信意図）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    notification_type: NotificationType,
    recipients:        BTreeSet<UserId>,
    sender:            String,
    cc:                BTreeSet<String>,
    parameters:        BTreeMap<Param, String>,
    event_ref:         Option<SubmissionEventId>,
    resource_ref:      Option<SubmissionId>,
}

impl Notification {
    pub fn new(params: NewNotification) -> Self {
        Self {
            notification_type: params.notification_type,
            recipients:        params.recipients,
            sender:            params.sender,
            cc:                params.cc,
            parameters:        params.parameters,
            event_ref:         params.event_ref,
            resource_ref:      params.resource_ref,
        }
    }

    pub fn notification_type(&self) -> NotificationType {
        self.notification_type
    }

    /// 受信者（`mailto:` URI またはリソース参照）
    pub fn recipients(&self) -> &BTreeSet<UserId> {
        &self.recipients
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn cc(&self) -> &BTreeSet<String> {
        &self.cc
    }

    pub fn parameters(&self) -> &BTreeMap<Param, String> {
        &self.parameters
    }

    /// パラメータ値を返す
    pub fn parameter(&self, param: Param) -> Option<&str> {
        self.parameters.get(&param).map(String::as_str)
    }

    pub fn event_ref(&self) -> Option<&SubmissionEventId> {
        self.event_ref.as_ref()
    }

    pub fn resource_ref(&self) -> Option<&SubmissionId> {
        self.resource_ref.as_ref()
    }
}

/// メールメッセージ
///
/// ディスパッチの最終出力。インフラ層の `MailTransport` 実装に渡される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// 送信元アドレス
    pub from:              String,
    /// 送信先アドレス（解決済み、重複なし）
    pub to:                Vec<String>,
    /// CC（空の場合はヘッダを付与しない）
    pub cc:                Vec<String>,
    /// 件名
    pub subject:           String,
    /// プレーンテキスト本文（本文 + 空行 + フッター）
    pub text_body:         String,
    /// 追跡ヘッダ用の投稿 ID
    pub resource_ref:      Option<String>,
    /// 追跡ヘッダ用の通知種別
    pub notification_type: Option<NotificationType>,
}

/// メール送信エラー
///
/// トランスポート固有のエラーをこの型に変換して返す。
/// ディスパッチ失敗の根本原因として辿れるよう、`source()` チェーンの末端に置かれる。
#[derive(Debug, Error)]
pub enum TransportError {
    /// 不正なメールアドレス（送信前の検証、またはリレーによる拒否）
    #[error("不正なメールアドレス '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// メッセージの組み立てに失敗
    #[error("メールメッセージの組み立てに失敗: {0}")]
    BuildFailed(String),

    /// 送信に失敗
    #[error("メール送信に失敗: {0}")]
    SendFailed(String),
}

impl TransportError {
    /// 不正なアドレスが原因かどうか
    pub fn is_invalid_address(&self) -> bool {
        matches!(self, Self::InvalidAddress { .. })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    #[rstest]
    #[case(
        SubmissionEventType::ApprovalRequestedNewuser,
        NotificationType::SubmissionApprovalInvite
    )]
    #[case(
        SubmissionEventType::ApprovalRequested,
        NotificationType::SubmissionApprovalRequested
    )]
    #[case(
        SubmissionEventType::ChangesRequested,
        NotificationType::SubmissionChangesRequested
    )]
    #[case(
        SubmissionEventType::Submitted,
        NotificationType::SubmissionSubmissionSubmitted
    )]
    #[case(
        SubmissionEventType::Cancelled,
        NotificationType::SubmissionSubmissionCancelled
    )]
    fn イベント種別から通知種別が決まる(
        #[case] event_type: SubmissionEventType,
        #[case] expected: NotificationType,
    ) {
        assert_eq!(NotificationType::for_event(&event_type).unwrap(), expected);
    }

    #[test]
    fn 未知のイベント種別には通知種別がない() {
        let result =
            NotificationType::for_event(&SubmissionEventType::Unrecognized("x".to_string()));
        assert!(matches!(result, Err(DomainError::UnsupportedEventType(_))));
    }

    #[test]
    fn notification_typeの文字列変換が正しい() {
        assert_eq!(
            NotificationType::SubmissionApprovalInvite.to_string(),
            "SUBMISSION_APPROVAL_INVITE"
        );
        assert_eq!(
            NotificationType::from_str("SUBMISSION_SUBMISSION_CANCELLED").unwrap(),
            NotificationType::SubmissionSubmissionCancelled
        );
        assert_eq!(
            serde_json::to_string(&NotificationType::SubmissionChangesRequested).unwrap(),
            "\"SUBMISSION_CHANGES_REQUESTED\""
        );
    }

    #[test]
    fn テンプレート変数名は全パラメータで一意() {
        let keys: BTreeSet<&str> = Param::iter().map(Param::template_key).collect();
        assert_eq!(keys.len(), Param::iter().count());
        assert_eq!(Param::Links.template_key(), "link_metadata");
    }

    #[test]
    fn 通知のgetterが作成時の値を返す() {
        let notification = Notification::new(NewNotification {
            notification_type: NotificationType::SubmissionSubmissionSubmitted,
            recipients:        BTreeSet::from([UserId::new("mailto:a@x.edu")]),
            sender:            "noreply@x.edu".to_string(),
            cc:                BTreeSet::new(),
            parameters:        BTreeMap::from([(Param::To, "mailto:a@x.edu".to_string())]),
            event_ref:         Some(SubmissionEventId::new("e1")),
            resource_ref:      Some(SubmissionId::new("s1")),
        });

        assert_eq!(
            notification.notification_type(),
            NotificationType::SubmissionSubmissionSubmitted
        );
        assert_eq!(notification.sender(), "noreply@x.edu");
        assert_eq!(notification.parameter(Param::To), Some("mailto:a@x.edu"));
        assert_eq!(notification.parameter(Param::Cc), None);
        assert_eq!(notification.resource_ref().map(SubmissionId::as_str), Some("s1"));
    }

    #[test]
    fn invalid_addressを判定できる() {
        let err = TransportError::InvalidAddress {
            address: "bogus".to_string(),
            reason:  "missing domain".to_string(),
        };
        assert!(err.is_invalid_address());
        assert!(!TransportError::SendFailed("timeout".to_string()).is_invalid_address());
    }
}
