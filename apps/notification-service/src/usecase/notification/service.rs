//! # 通知サービス
//!
//! 投稿イベント ID を受け取り、取得 → 自己投稿の判定 → 合成 → ディスパッチを行う。
//!
//! ## 設計方針
//!
//! - **失敗は呼び出し側へ返す**: キューリスナーが確認応答かデッドレターかを判断する
//! - **依存性注入**: リソースストアは trait で抽象化し、合成・ディスパッチはコンストラクタで受け取る

use std::sync::Arc;

use async_trait::async_trait;
use passnotify_domain::{notification::MessageId, submission::SubmissionEventId};
use passnotify_infra::resource::ResourceStore;
use passnotify_shared::{event_log::event, log_business_event};

use super::{Composer, DispatchService};
use crate::error::NotifyError;

/// 通知処理の結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// 送信した
    Sent(MessageId),
    /// 自己投稿のため送信しなかった
    SkippedSelfSubmission,
}

/// 通知トレイト
///
/// キューリスナーはこのトレイトにのみ依存する。
#[async_trait]
pub trait Notifier: Send + Sync {
    /// 投稿イベントの通知を処理する
    async fn notify(&self, event_id: &SubmissionEventId) -> Result<NotifyOutcome, NotifyError>;
}

/// 通知サービス
pub struct NotificationService {
    resources: Arc<dyn ResourceStore>,
    composer:  Composer,
    dispatch:  DispatchService,
}

impl NotificationService {
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        composer: Composer,
        dispatch: DispatchService,
    ) -> Self {
        Self {
            resources,
            composer,
            dispatch,
        }
    }
}

#[async_trait]
impl Notifier for NotificationService {
    /// 投稿イベントの通知を処理する
    ///
    /// 準備者がいない、または投稿者のみが準備者の投稿（自己投稿）では、
    /// 投稿者自身が操作しているため通知を合成・送信せず
    /// [`NotifyOutcome::SkippedSelfSubmission`] を返す。
    /// この判定は合成処理ではなく、ここで行う。
    async fn notify(&self, event_id: &SubmissionEventId) -> Result<NotifyOutcome, NotifyError> {
        let event = self.resources.read_submission_event(event_id).await?;
        let submission = self.resources.read_submission(&event.submission).await?;

        if submission.is_self_prepared() {
            log_business_event!(
                event.category = event::category::NOTIFICATION,
                event.action = event::action::NOTIFICATION_SKIPPED,
                event.entity_type = event::entity_type::SUBMISSION_EVENT,
                event.entity_id = %event.id,
                event.result = event::result::SKIPPED,
                submission.id = %submission.id,
                "自己投稿のため通知をスキップ"
            );
            return Ok(NotifyOutcome::SkippedSelfSubmission);
        }

        let notification = self.composer.compose(&submission, &event)?;
        let notification_name: &'static str = notification.notification_type().into();
        log_business_event!(
            event.category = event::category::NOTIFICATION,
            event.action = event::action::NOTIFICATION_COMPOSED,
            event.entity_type = event::entity_type::SUBMISSION_EVENT,
            event.entity_id = %event.id,
            event.result = event::result::SUCCESS,
            notification.notification_type = notification_name,
            notification.recipient_count = notification.recipients().len(),
            "通知を合成"
        );

        let message_id = self.dispatch.dispatch(&notification).await?;
        Ok(NotifyOutcome::Sent(message_id))
    }
}
