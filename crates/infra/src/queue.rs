//! # 通知イベントキュー
//!
//! リソースの変更イベントを受け取る Redis リストベースの信頼性キュー。
//!
//! ## Redis キー設計
//!
//! | キー | 内容 |
//! |-----|-----|
//! | `{queue}` | 未処理メッセージ（生産者が `LPUSH`） |
//! | `{queue}:processing` | 処理中メッセージ |
//! | `{queue}:dead` | 処理に失敗したメッセージ |
//!
//! ## 処理の流れ
//!
//! 1. `LMOVE {queue} {queue}:processing RIGHT LEFT` で取り出す（FIFO）
//! 2. 成功・意図的なスキップ後に `LREM {queue}:processing` で確認応答
//! 3. 失敗時は `LREM` と `LPUSH {queue}:dead` をトランザクションで実行
//!
//! 起動時に `{queue}:processing` に残ったメッセージ（前回プロセスの処理途中）を
//! `{queue}` に戻す。

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};

use crate::error::InfraError;

/// 通知対象のリソース種別
pub const SUBMISSION_EVENT_RESOURCE_TYPE: &str = "SubmissionEvent";
/// 通知対象のイベント種別（リソース作成）
pub const CREATION_EVENT_TYPE: &str = "Creation";

/// リソース変更イベントメッセージ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEventMessage {
    /// 変更されたリソースの ID
    pub id:            String,
    /// リソース種別（例: `SubmissionEvent`）
    pub resource_type: String,
    /// 変更種別（例: `Creation`）
    pub event_type:    String,
}

impl ResourceEventMessage {
    /// 投稿イベントの作成を表すかどうか
    ///
    /// 通知サービスが処理するのはこのメッセージのみ。
    pub fn is_submission_event_creation(&self) -> bool {
        self.resource_type == SUBMISSION_EVENT_RESOURCE_TYPE
            && self.event_type == CREATION_EVENT_TYPE
    }
}

/// キューから取り出したメッセージ
///
/// 確認応答のため、受信した生のペイロードをそのまま保持する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueDelivery {
    payload: String,
}

impl QueueDelivery {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// ペイロードを [`ResourceEventMessage`] としてデコードする
    pub fn decode(&self) -> Result<ResourceEventMessage, InfraError> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}

/// イベントキュートレイト
#[async_trait]
pub trait EventQueue: Send + Sync {
    /// メッセージを 1 件取り出す
    ///
    /// キューが空の場合は `None` を返す（ブロックしない）。
    async fn receive(&self) -> Result<Option<QueueDelivery>, InfraError>;

    /// 処理済みとして確認応答する
    async fn acknowledge(&self, delivery: &QueueDelivery) -> Result<(), InfraError>;

    /// 処理失敗としてデッドレターリストへ移動する
    async fn dead_letter(&self, delivery: &QueueDelivery) -> Result<(), InfraError>;

    /// 処理中のまま残ったメッセージをキューに戻す
    ///
    /// 戻した件数を返す。起動時に一度だけ呼び出す。
    async fn requeue_in_flight(&self) -> Result<usize, InfraError>;
}

/// Redis リストを使用したイベントキュー
#[derive(Clone)]
pub struct RedisEventQueue {
    conn:       ConnectionManager,
    queue:      String,
    processing: String,
    dead:       String,
}

impl RedisEventQueue {
    pub fn new(conn: ConnectionManager, queue_name: &str) -> Self {
        Self {
            conn,
            queue: queue_name.to_string(),
            processing: processing_key(queue_name),
            dead: dead_letter_key(queue_name),
        }
    }
}

/// 処理中リストのキー
pub fn processing_key(queue_name: &str) -> String {
    format!("{queue_name}:processing")
}

/// デッドレターリストのキー
pub fn dead_letter_key(queue_name: &str) -> String {
    format!("{queue_name}:dead")
}

#[async_trait]
impl EventQueue for RedisEventQueue {
    async fn receive(&self) -> Result<Option<QueueDelivery>, InfraError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = redis::cmd("LMOVE")
            .arg(&self.queue)
            .arg(&self.processing)
            .arg("RIGHT")
            .arg("LEFT")
            .query_async(&mut conn)
            .await?;
        Ok(payload.map(QueueDelivery::new))
    }

    async fn acknowledge(&self, delivery: &QueueDelivery) -> Result<(), InfraError> {
        let mut conn = self.conn.clone();
        let _: i64 = redis::cmd("LREM")
            .arg(&self.processing)
            .arg(1)
            .arg(delivery.payload())
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn dead_letter(&self, delivery: &QueueDelivery) -> Result<(), InfraError> {
        let mut conn = self.conn.clone();
        let _: () = redis::pipe()
            .atomic()
            .cmd("LREM")
            .arg(&self.processing)
            .arg(1)
            .arg(delivery.payload())
            .ignore()
            .cmd("LPUSH")
            .arg(&self.dead)
            .arg(delivery.payload())
            .ignore()
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn requeue_in_flight(&self) -> Result<usize, InfraError> {
        let mut conn = self.conn.clone();
        let mut count = 0;
        loop {
            let moved: Option<String> = redis::cmd("LMOVE")
                .arg(&self.processing)
                .arg(&self.queue)
                .arg("LEFT")
                .arg("RIGHT")
                .query_async(&mut conn)
                .await?;
            if moved.is_none() {
                break;
            }
            count += 1;
        }
        Ok(count)
    }
}
