//! # テスト用モック
//!
//! ユースケーステストで使用するインメモリのメール送信・リソースストア・イベントキュー。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! passnotify-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use passnotify_domain::{
    notification::{EmailMessage, MessageId, TransportError},
    submission::{Submission, SubmissionEvent, SubmissionEventId, SubmissionId, User, UserId},
};

use crate::{
    error::InfraError,
    mail::MailTransport,
    queue::{EventQueue, QueueDelivery},
    resource::ResourceStore,
};

// ===== MockMailTransport =====

/// 送信したメールを記録するメール送信モック
#[derive(Clone, Default)]
pub struct MockMailTransport {
    sent:    Arc<Mutex<Vec<EmailMessage>>>,
    failure: Arc<Mutex<Option<fn(&EmailMessage) -> TransportError>>>,
}

impl MockMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以降の送信をすべて失敗させる
    pub fn fail_with(&self, failure: fn(&EmailMessage) -> TransportError) {
        *self.failure.lock().unwrap() = Some(failure);
    }

    /// 送信済みメールを返す
    pub fn sent_emails(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for MockMailTransport {
    async fn send(&self, message: &EmailMessage) -> Result<MessageId, TransportError> {
        if let Some(failure) = *self.failure.lock().unwrap() {
            return Err(failure(message));
        }

        let mut sent = self.sent.lock().unwrap();
        sent.push(message.clone());
        Ok(MessageId::new(format!("<mock-{}@localhost>", sent.len())))
    }
}

// ===== MockResourceStore =====

/// インメモリのリソースストアモック
#[derive(Clone, Default)]
pub struct MockResourceStore {
    submissions: Arc<Mutex<HashMap<SubmissionId, Submission>>>,
    events:      Arc<Mutex<HashMap<SubmissionEventId, SubmissionEvent>>>,
    users:       Arc<Mutex<HashMap<UserId, User>>>,
}

impl MockResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_submission(&self, submission: Submission) {
        self.submissions
            .lock()
            .unwrap()
            .insert(submission.id.clone(), submission);
    }

    pub fn add_event(&self, event: SubmissionEvent) {
        self.events.lock().unwrap().insert(event.id.clone(), event);
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }
}

#[async_trait]
impl ResourceStore for MockResourceStore {
    async fn read_submission(&self, id: &SubmissionId) -> Result<Submission, InfraError> {
        self.submissions
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| InfraError::not_found("Submission", id.as_str()))
    }

    async fn read_submission_event(
        &self,
        id: &SubmissionEventId,
    ) -> Result<SubmissionEvent, InfraError> {
        self.events
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| InfraError::not_found("SubmissionEvent", id.as_str()))
    }

    async fn read_user(&self, id: &UserId) -> Result<User, InfraError> {
        self.users
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| InfraError::not_found("User", id.as_str()))
    }
}

// ===== MockEventQueue =====

/// インメモリのイベントキューモック
#[derive(Clone, Default)]
pub struct MockEventQueue {
    pending:      Arc<Mutex<VecDeque<String>>>,
    processing:   Arc<Mutex<Vec<String>>>,
    acknowledged: Arc<Mutex<Vec<String>>>,
    dead:         Arc<Mutex<Vec<String>>>,
}

impl MockEventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// メッセージを投入する
    pub fn push(&self, payload: impl Into<String>) {
        self.pending.lock().unwrap().push_back(payload.into());
    }

    /// 処理中のメッセージを投入する（前回プロセスの取り残しを再現）
    pub fn push_in_flight(&self, payload: impl Into<String>) {
        self.processing.lock().unwrap().push(payload.into());
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn in_flight(&self) -> Vec<String> {
        self.processing.lock().unwrap().clone()
    }

    pub fn acknowledged(&self) -> Vec<String> {
        self.acknowledged.lock().unwrap().clone()
    }

    pub fn dead_lettered(&self) -> Vec<String> {
        self.dead.lock().unwrap().clone()
    }

    fn take_processing(&self, payload: &str) {
        let mut processing = self.processing.lock().unwrap();
        if let Some(index) = processing.iter().position(|p| p == payload) {
            processing.remove(index);
        }
    }
}

#[async_trait]
impl EventQueue for MockEventQueue {
    async fn receive(&self) -> Result<Option<QueueDelivery>, InfraError> {
        let payload = self.pending.lock().unwrap().pop_front();
        if let Some(payload) = &payload {
            self.processing.lock().unwrap().push(payload.clone());
        }
        Ok(payload.map(QueueDelivery::new))
    }

    async fn acknowledge(&self, delivery: &QueueDelivery) -> Result<(), InfraError> {
        self.take_processing(delivery.payload());
        self.acknowledged
            .lock()
            .unwrap()
            .push(delivery.payload().to_string());
        Ok(())
    }

    async fn dead_letter(&self, delivery: &QueueDelivery) -> Result<(), InfraError> {
        self.take_processing(delivery.payload());
        self.dead.lock().unwrap().push(delivery.payload().to_string());
        Ok(())
    }

    async fn requeue_in_flight(&self) -> Result<usize, InfraError> {
        let in_flight: Vec<String> = self.processing.lock().unwrap().drain(..).collect();
        let count = in_flight.len();
        self.pending.lock().unwrap().extend(in_flight);
        Ok(count)
    }
}
