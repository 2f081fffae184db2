//! # キューリスナー
//!
//! イベントキューからリソース変更メッセージを取り出し、通知サービスに振り分ける。
//!
//! ## メッセージの扱い
//!
//! | 状況 | 処理 | キュー |
//! |-----|------|-------|
//! | 動作モードが `disabled` | 処理しない | 確認応答 |
//! | ペイロードが JSON として不正 | 処理しない | デッドレター |
//! | 投稿イベントの作成以外 | 処理しない | 確認応答 |
//! | 通知の送信・自己投稿によるスキップ | 通知サービスで処理 | 確認応答 |
//! | 通知処理の失敗 | 通知サービスで処理 | デッドレター |
//!
//! デッドレターに移したメッセージは再試行しない。調査・手動での再投入用に残す。
//!
//! ## 並行処理
//!
//! 同時に処理するメッセージ数をセマフォで制限する。
//! 停止シグナルを受け取ると取り出しをやめ、全許可を取得して処理中のメッセージの完了を待つ。

use std::{future::Future, sync::Arc, time::Duration};

use passnotify_domain::{recipient::Mode, submission::SubmissionEventId};
use passnotify_infra::{
    InfraError,
    queue::{EventQueue, QueueDelivery},
};
use passnotify_shared::{
    event_log::{error, event},
    log_business_event,
};
use tokio::sync::Semaphore;

use crate::usecase::notification::{Notifier, NotifyOutcome};

/// リスナーの設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenerSettings {
    /// 動作モード
    pub mode:          Mode,
    /// 同時に処理するメッセージ数
    pub concurrency:   usize,
    /// キューが空のときの待機時間
    pub poll_interval: Duration,
}

/// メッセージ 1 件の処理結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// 通知を処理して確認応答した
    Processed,
    /// 処理対象外として確認応答した
    Skipped,
    /// デッドレターへ移動した
    DeadLettered,
}

/// キューリスナー
pub struct QueueListener {
    queue:    Arc<dyn EventQueue>,
    notifier: Arc<dyn Notifier>,
    settings: ListenerSettings,
}

impl QueueListener {
    pub fn new(
        queue: Arc<dyn EventQueue>,
        notifier: Arc<dyn Notifier>,
        settings: ListenerSettings,
    ) -> Self {
        Self {
            queue,
            notifier,
            settings,
        }
    }

    /// 前回プロセスで処理中のまま残ったメッセージをキューに戻す
    pub async fn recover(&self) -> Result<usize, InfraError> {
        let count = self.queue.requeue_in_flight().await?;
        if count > 0 {
            tracing::warn!(count, "処理中のまま残っていたメッセージをキューに戻しました");
        }
        Ok(count)
    }

    /// 停止シグナルを受け取るまでメッセージを処理する
    pub async fn run(&self, shutdown: impl Future<Output = ()>) -> Result<(), InfraError> {
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency));
        tokio::pin!(shutdown);

        tracing::info!(
            mode = %self.settings.mode,
            concurrency = self.settings.concurrency,
            "キューリスナーを開始します"
        );

        loop {
            let permit = tokio::select! {
                () = &mut shutdown => break,
                permit = semaphore.clone().acquire_owned() => permit
                    .map_err(|e| InfraError::unexpected(format!("セマフォが閉じられました: {e}")))?,
            };

            let delivery = match self.queue.receive().await {
                Ok(Some(delivery)) => delivery,
                Ok(None) => {
                    drop(permit);
                    tokio::select! {
                        () = &mut shutdown => break,
                        () = tokio::time::sleep(self.settings.poll_interval) => continue,
                    }
                }
                Err(e) => {
                    drop(permit);
                    tracing::error!(
                        error.category = error::category::INFRASTRUCTURE,
                        error.kind = error::kind::QUEUE,
                        error = %e,
                        "キューからの取り出しに失敗"
                    );
                    tokio::select! {
                        () = &mut shutdown => break,
                        () = tokio::time::sleep(self.settings.poll_interval) => continue,
                    }
                }
            };

            let queue = self.queue.clone();
            let notifier = self.notifier.clone();
            let mode = self.settings.mode;
            tokio::spawn(async move {
                let _permit = permit;
                handle_delivery(queue.as_ref(), notifier.as_ref(), mode, &delivery).await;
            });
        }

        tracing::info!("停止シグナルを受信、処理中のメッセージの完了を待ちます");
        let permits = u32::try_from(self.settings.concurrency).unwrap_or(u32::MAX);
        let _all = semaphore
            .acquire_many(permits)
            .await
            .map_err(|e| InfraError::unexpected(format!("セマフォが閉じられました: {e}")))?;
        tracing::info!("キューリスナーを停止しました");
        Ok(())
    }
}

/// メッセージ 1 件を処理し、確認応答またはデッドレターへの移動を行う
pub async fn handle_delivery(
    queue: &dyn EventQueue,
    notifier: &dyn Notifier,
    mode: Mode,
    delivery: &QueueDelivery,
) -> DeliveryOutcome {
    if mode == Mode::Disabled {
        tracing::debug!("動作モードが disabled のため通知をスキップ");
        acknowledge(queue, delivery).await;
        return DeliveryOutcome::Skipped;
    }

    let message = match delivery.decode() {
        Ok(message) => message,
        Err(e) => {
            tracing::error!(
                error.category = error::category::VALIDATION,
                error.kind = error::kind::MALFORMED_MESSAGE,
                error = %e,
                payload = delivery.payload(),
                "キューメッセージをデコードできません"
            );
            dead_letter(queue, delivery).await;
            return DeliveryOutcome::DeadLettered;
        }
    };

    if !message.is_submission_event_creation() {
        tracing::debug!(
            resource.id = %message.id,
            resource.type_name = %message.resource_type,
            resource.event_type = %message.event_type,
            "投稿イベントの作成ではないためスキップ"
        );
        acknowledge(queue, delivery).await;
        return DeliveryOutcome::Skipped;
    }

    let event_id = SubmissionEventId::new(message.id);
    match notifier.notify(&event_id).await {
        Ok(NotifyOutcome::Sent(_)) => {
            acknowledge(queue, delivery).await;
            DeliveryOutcome::Processed
        }
        Ok(NotifyOutcome::SkippedSelfSubmission) => {
            acknowledge(queue, delivery).await;
            DeliveryOutcome::Skipped
        }
        Err(e) => {
            tracing::error!(
                error.category = e.log_category(),
                error.kind = e.log_kind(),
                event.id = %event_id,
                error = %e,
                "通知処理に失敗"
            );
            dead_letter(queue, delivery).await;
            DeliveryOutcome::DeadLettered
        }
    }
}

/// 確認応答する。失敗した場合は処理中リストに残り、次回起動時にキューへ戻る
async fn acknowledge(queue: &dyn EventQueue, delivery: &QueueDelivery) {
    match queue.acknowledge(delivery).await {
        Ok(()) => log_business_event!(
            event.category = event::category::QUEUE,
            event.action = event::action::MESSAGE_ACKNOWLEDGED,
            event.entity_type = event::entity_type::QUEUE_MESSAGE,
            event.result = event::result::SUCCESS,
            "キューメッセージを確認応答"
        ),
        Err(e) => tracing::error!(
            error.category = error::category::INFRASTRUCTURE,
            error.kind = error::kind::QUEUE,
            error = %e,
            "キューメッセージの確認応答に失敗"
        ),
    }
}

/// デッドレターへ移動する
async fn dead_letter(queue: &dyn EventQueue, delivery: &QueueDelivery) {
    match queue.dead_letter(delivery).await {
        Ok(()) => log_business_event!(
            event.category = event::category::QUEUE,
            event.action = event::action::MESSAGE_DEAD_LETTERED,
            event.entity_type = event::entity_type::QUEUE_MESSAGE,
            event.result = event::result::FAILURE,
            payload = delivery.payload(),
            "キューメッセージをデッドレターへ移動"
        ),
        Err(e) => tracing::error!(
            error.category = error::category::INFRASTRUCTURE,
            error.kind = error::kind::QUEUE,
            error = %e,
            "キューメッセージのデッドレターへの移動に失敗"
        ),
    }
}
