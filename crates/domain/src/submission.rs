//! # 投稿リソース
//!
//! リソースストアから読み取る投稿・投稿イベント・ユーザーのモデルを定義する。
//! 本サービスはこれらを読み取るだけで、作成・更新は行わない。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`Submission`] | 投稿 | `metadata` は不透明な文字列（通常は JSON） |
//! | [`SubmissionEvent`] | 投稿イベント | 通知の起点 |
//! | [`SubmissionEventType`] | イベント種別 | 未知の値も保持する |
//! | [`User`] | ユーザー | 不透明な受信者 ID の解決に使用 |
//!
//! ## 設計方針
//!
//! - **未知のイベント種別を保持**: デシリアライズ時点では失敗させず、
//!   [`SubmissionEventType::Unrecognized`] として保持する。
//!   失敗は受信者解析・通知種別の決定時に明示的なエラーとして表面化させる
//! - **JSON はキャメルケース**: リソースストアの表現に合わせる

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

define_resource_id! {
    /// 投稿 ID（リソース URI）
    pub struct SubmissionId;
}

define_resource_id! {
    /// 投稿イベント ID（リソース URI）
    pub struct SubmissionEventId;
}

define_resource_id! {
    /// ユーザー ID
    ///
    /// リソース URI、または `mailto:` URI のどちらも取りうる。
    /// 受信者として使う場合はディスパッチ時にメールアドレスへ解決される。
    pub struct UserId;
}

impl UserId {
    /// `mailto:` URI かどうか
    pub fn is_mailto(&self) -> bool {
        self.as_str()
            .get(..7)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
    }

    /// `mailto:` URI のアドレス部分を返す
    ///
    /// クエリ文字列（`?subject=...`）は取り除く。`mailto:` URI でない場合は `None`。
    pub fn mailto_address(&self) -> Option<&str> {
        if !self.is_mailto() {
            return None;
        }
        let rest = &self.as_str()[7..];
        let address = rest.split_once('?').map_or(rest, |(address, _)| address);
        Some(address.trim())
    }

    /// 表示用の文字列
    ///
    /// `mailto:` URI はアドレス部分、それ以外は ID をそのまま返す。
    pub fn display_address(&self) -> &str {
        self.mailto_address().unwrap_or(self.as_str())
    }
}

/// 投稿
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub id:        SubmissionId,
    pub submitter: UserId,
    #[serde(default)]
    pub preparers: Vec<UserId>,
    /// 投稿メタデータ（通常は JSON 文字列）。そのままテンプレートに渡す
    #[serde(default)]
    pub metadata:  String,
}

impl Submission {
    /// 投稿者自身が準備者を兼ねる（または準備者がいない）投稿かどうか
    ///
    /// 準備者が空、または投稿者のみの場合に真となる。
    /// 自己投稿では投稿者へ確認を依頼する必要がないため、通知を抑止する判断に使う。
    pub fn is_self_prepared(&self) -> bool {
        self.preparers.iter().all(|p| p == &self.submitter)
    }
}

/// 投稿イベント種別
///
/// 既知の 5 種類に加え、未知の値を [`Unrecognized`](Self::Unrecognized) として保持する。
/// 文字列表現はハイフン区切り（`approval-requested-newuser`）で、
/// パース時はアンダースコア区切りと大文字も受け付ける。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubmissionEventType {
    /// 新規ユーザーへの承認依頼
    ApprovalRequestedNewuser,
    /// 既存ユーザーへの承認依頼
    ApprovalRequested,
    /// 修正依頼
    ChangesRequested,
    /// 投稿完了
    Submitted,
    /// 取り消し
    Cancelled,
    /// 未知の種別
    Unrecognized(String),
}

impl SubmissionEventType {
    /// 文字列表現を返す
    pub fn as_str(&self) -> &str {
        match self {
            Self::ApprovalRequestedNewuser => "approval-requested-newuser",
            Self::ApprovalRequested => "approval-requested",
            Self::ChangesRequested => "changes-requested",
            Self::Submitted => "submitted",
            Self::Cancelled => "cancelled",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl FromStr for SubmissionEventType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Ok(match normalized.as_str() {
            "approval-requested-newuser" => Self::ApprovalRequestedNewuser,
            "approval-requested" => Self::ApprovalRequested,
            "changes-requested" => Self::ChangesRequested,
            "submitted" => Self::Submitted,
            "cancelled" => Self::Cancelled,
            _ => Self::Unrecognized(s.to_string()),
        })
    }
}

impl From<String> for SubmissionEventType {
    fn from(value: String) -> Self {
        let Ok(event_type) = value.parse::<Self>();
        event_type
    }
}

impl From<SubmissionEventType> for String {
    fn from(value: SubmissionEventType) -> Self {
        match value {
            SubmissionEventType::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for SubmissionEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 投稿イベント
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionEvent {
    pub id:             SubmissionEventId,
    /// 親の投稿
    pub submission:     SubmissionId,
    pub event_type:     SubmissionEventType,
    pub performed_by:   UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performer_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment:        Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performed_date: Option<DateTime<Utc>>,
}

/// ユーザー
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id:    UserId,
    #[serde(default)]
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    fn submission(submitter: &str, preparers: &[&str]) -> Submission {
        Submission {
            id:        SubmissionId::new("https://pass.example.org/submissions/1"),
            submitter: UserId::new(submitter),
            preparers: preparers.iter().map(|p| UserId::new(*p)).collect(),
            metadata:  "{}".to_string(),
        }
    }

    #[rstest]
    #[case("approval-requested-newuser", SubmissionEventType::ApprovalRequestedNewuser)]
    #[case("approval_requested_newuser", SubmissionEventType::ApprovalRequestedNewuser)]
    #[case("APPROVAL_REQUESTED", SubmissionEventType::ApprovalRequested)]
    #[case("changes-requested", SubmissionEventType::ChangesRequested)]
    #[case("submitted", SubmissionEventType::Submitted)]
    #[case("cancelled", SubmissionEventType::Cancelled)]
    fn イベント種別の文字列をパースできる(
        #[case] input: &str,
        #[case] expected: SubmissionEventType,
    ) {
        let parsed: SubmissionEventType = input.parse().unwrap();
        assert_eq!(parsed, expected);
    }

    #[test]
    fn 未知のイベント種別は元の文字列のまま保持される() {
        let parsed: SubmissionEventType = "withdrawn".parse().unwrap();
        assert_eq!(
            parsed,
            SubmissionEventType::Unrecognized("withdrawn".to_string())
        );
        assert_eq!(parsed.to_string(), "withdrawn");
    }

    #[test]
    fn 投稿イベントをキャメルケースのjsonからデシリアライズできる() {
        let json = r#"{
            "id": "https://pass.example.org/events/9",
            "submission": "https://pass.example.org/submissions/1",
            "eventType": "approval-requested",
            "performedBy": "https://pass.example.org/users/2",
            "performerRole": "preparer",
            "comment": "please approve",
            "performedDate": "2024-05-01T12:00:00Z"
        }"#;

        let event: SubmissionEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.event_type, SubmissionEventType::ApprovalRequested);
        assert_eq!(event.performed_by.as_str(), "https://pass.example.org/users/2");
        assert_eq!(event.performer_role.as_deref(), Some("preparer"));
        assert!(event.performed_date.is_some());
    }

    #[test]
    fn 投稿イベントのシリアライズで省略可能フィールドは出力されない() {
        let event = SubmissionEvent {
            id:             SubmissionEventId::new("e1"),
            submission:     SubmissionId::new("s1"),
            event_type:     SubmissionEventType::Submitted,
            performed_by:   UserId::new("u1"),
            performer_role: None,
            comment:        None,
            performed_date: None,
        };

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "id": "e1",
                "submission": "s1",
                "eventType": "submitted",
                "performedBy": "u1"
            })
        );
    }

    #[test]
    fn ユーザーはidとメールアドレスだけを読み取る() {
        let json = r#"{
            "id": "https://pass.example.org/users/1",
            "email": "jane@x.edu",
            "displayName": "Jane Doe",
            "firstName": "Jane"
        }"#;

        let user: User = serde_json::from_str(json).unwrap();

        assert_eq!(
            user,
            User {
                id:    UserId::new("https://pass.example.org/users/1"),
                email: Some("jane@x.edu".to_string()),
            }
        );
        assert_eq!(
            serde_json::to_value(&user).unwrap(),
            serde_json::json!({ "id": "https://pass.example.org/users/1", "email": "jane@x.edu" })
        );
    }

    #[rstest]
    #[case(&[], true)]
    #[case(&["mailto:s@x.edu"], true)]
    #[case(&["mailto:p@x.edu"], false)]
    #[case(&["mailto:s@x.edu", "mailto:p@x.edu"], false)]
    fn 自己投稿の判定(#[case] preparers: &[&str], #[case] expected: bool) {
        assert_eq!(
            submission("mailto:s@x.edu", preparers).is_self_prepared(),
            expected
        );
    }

    #[test]
    fn mailto形式のユーザーidを判定できる() {
        assert!(UserId::new("mailto:a@b.com").is_mailto());
        assert!(UserId::new("MAILTO:a@b.com").is_mailto());
        assert!(!UserId::new("https://pass.example.org/users/1").is_mailto());
        assert!(!UserId::new("mail").is_mailto());
    }

    #[rstest]
    #[case("mailto:a@b.com?subject=x", Some("a@b.com"))]
    #[case("mailto:a@b.com", Some("a@b.com"))]
    #[case("MAILTO:A@B.com", Some("A@B.com"))]
    #[case("https://pass.example.org/users/1", None)]
    fn mailtoのアドレス部分を取り出す(#[case] id: &str, #[case] expected: Option<&str>) {
        assert_eq!(UserId::new(id).mailto_address(), expected);
    }

    #[test]
    fn 表示用アドレスはmailto以外をそのまま返す() {
        assert_eq!(UserId::new("mailto:jane@x.edu").display_address(), "jane@x.edu");
        assert_eq!(
            UserId::new("https://pass.example.org/users/1").display_address(),
            "https://pass.example.org/users/1"
        );
    }
}
