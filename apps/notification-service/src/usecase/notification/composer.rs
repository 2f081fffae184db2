//! # 通知の合成
//!
//! 投稿と投稿イベントから、送信先・送信元・CC・テンプレートパラメータが
//! 確定した [`Notification`] を組み立てる。
//!
//! ## 合成手順
//!
//! 1. イベントの親投稿と渡された投稿が一致しない場合は警告する（処理は続行）
//! 2. `EVENT_METADATA` にイベントの JSON、`RESOURCE_METADATA` に投稿メタデータをそのまま設定
//! 3. global_cc（空白を除く）を CC と `CC` パラメータに設定。許可リストは適用しない
//! 4. 送信元アドレスを `sender` と `FROM` パラメータに設定
//! 5. 受信者解析の結果を `recipients` と `TO` パラメータ（辞書順のカンマ区切り）に設定
//! 6. イベント種別から通知種別を決定
//! 7. リンク生成が有効なら `LINKS` パラメータを設定
//!
//! 自己投稿の抑止は合成の責務ではない。[`NotificationService`](super::NotificationService) を参照。

use std::collections::BTreeMap;

use itertools::Itertools;
use passnotify_domain::{
    DomainError,
    notification::{NewNotification, Notification, NotificationType, Param},
    recipient::{RecipientAnalyzer, RecipientConfig},
    submission::{Submission, SubmissionEvent},
};

use super::LinkBuilder;
use crate::config::NotificationConfig;

/// 通知の合成
#[derive(Debug, Clone)]
pub struct Composer {
    recipient_config: RecipientConfig,
    analyzer:         RecipientAnalyzer,
    links:            Option<LinkBuilder>,
}

impl Composer {
    pub fn new(recipient_config: RecipientConfig, links: Option<LinkBuilder>) -> Self {
        let analyzer = RecipientAnalyzer::new(recipient_config.whitelist());
        Self {
            recipient_config,
            analyzer,
            links,
        }
    }

    /// 通知設定から動作モードの受信者設定を選んで構築する
    pub fn from_config(config: &NotificationConfig) -> Result<Self, DomainError> {
        let recipient_config = config
            .recipient_config()
            .cloned()
            .ok_or(DomainError::MissingRecipientConfig(config.mode))?;
        let links = config
            .link
            .as_ref()
            .map(|link| LinkBuilder::new(&link.app_base_url));

        Ok(Self::new(recipient_config, links))
    }

    /// 通知を合成する
    pub fn compose(
        &self,
        submission: &Submission,
        event: &SubmissionEvent,
    ) -> Result<Notification, DomainError> {
        if event.submission != submission.id {
            tracing::warn!(
                event.id = %event.id,
                event.submission = %event.submission,
                submission.id = %submission.id,
                "イベントの親投稿と通知対象の投稿が一致しません"
            );
        }

        let mut parameters = BTreeMap::new();

        let event_json = serde_json::to_string(event)
            .map_err(|e| DomainError::Validation(format!("イベントを JSON に変換できません: {e}")))?;
        parameters.insert(Param::EventMetadata, event_json);
        parameters.insert(Param::ResourceMetadata, submission.metadata.clone());

        let cc = self.recipient_config.effective_global_cc();
        if !cc.is_empty() {
            parameters.insert(Param::Cc, cc.join(","));
        }

        let sender = self.recipient_config.from_address.clone();
        parameters.insert(Param::From, sender.clone());

        let recipients = self.analyzer.analyze(submission, event)?;
        parameters.insert(
            Param::To,
            recipients.iter().map(|r| r.display_address()).join(","),
        );

        let notification_type = NotificationType::for_event(&event.event_type)?;

        if let Some(links) = &self.links {
            let links = links.links(&submission.id, &event.event_type);
            let links_json = serde_json::to_string(&links)
                .map_err(|e| DomainError::Validation(format!("リンクを JSON に変換できません: {e}")))?;
            parameters.insert(Param::Links, links_json);
        }

        Ok(Notification::new(NewNotification {
            notification_type,
            recipients,
            sender,
            cc: cc.into_iter().collect(),
            parameters,
            event_ref: Some(event.id.clone()),
            resource_ref: Some(submission.id.clone()),
        }))
    }
}
