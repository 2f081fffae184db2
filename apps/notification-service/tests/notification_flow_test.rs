//! 通知フロー統合テスト
//!
//! キューメッセージの受信から、リソース取得・合成・テンプレート解決・レンダリング・送信、
//! 確認応答またはデッドレターへの移動までを、モックのキュー・リソースストア・
//! 送信トランスポートと同梱テンプレートで通しで検証する。
//!
//! 実行方法:
//! ```bash
//! cargo test -p passnotify-notification-service --test notification_flow_test
//! ```

use std::{sync::Arc, time::Duration};

use passnotify_domain::{
    notification::{NotificationType, TransportError},
    recipient::{Mode, RecipientConfig},
    submission::SubmissionEventType,
};
use passnotify_infra::{
    mock::MockEventQueue,
    queue::{CREATION_EVENT_TYPE, ResourceEventMessage, SUBMISSION_EVENT_RESOURCE_TYPE},
};
use passnotify_notification_service::{
    listener::{ListenerSettings, QueueListener},
    test_utils::{
        NotificationTestBuilder,
        NotificationTestSetup,
        notification_test_builder::{
            APP_BASE_URL,
            FROM_ADDRESS,
            PREPARER,
            PREPARER_EMAIL,
            SUBMISSION_ID,
            SUBMITTER,
        },
    },
};
use pretty_assertions::assert_eq;

const SUBMITTER_EMAIL: &str = "submitter@pass.example.org";

fn creation_message(event_id: &str) -> String {
    serde_json::to_string(&ResourceEventMessage {
        id:            event_id.to_string(),
        resource_type: SUBMISSION_EVENT_RESOURCE_TYPE.to_string(),
        event_type:    CREATION_EVENT_TYPE.to_string(),
    })
    .unwrap()
}

/// キューが空になるまでリスナーを動かし、処理中のメッセージの完了を待つ
async fn drain(setup: &NotificationTestSetup, queue: &MockEventQueue, mode: Mode) {
    let listener = QueueListener::new(
        Arc::new(queue.clone()),
        setup.sut.clone(),
        ListenerSettings {
            mode,
            concurrency: 2,
            poll_interval: Duration::from_millis(10),
        },
    );

    let drained = {
        let queue = queue.clone();
        async move {
            while queue.pending_count() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }
    };
    listener.run(drained).await.unwrap();
}

#[tokio::test]
async fn 承認依頼を投稿者にメールで送信する() {
    let builder = NotificationTestBuilder::new();
    let setup = builder.build();
    let event = builder.seed_event(
        &setup.resources,
        "1",
        SubmissionEventType::ApprovalRequested,
        PREPARER,
    );
    let queue = MockEventQueue::new();
    queue.push(creation_message(event.id.as_str()));

    drain(&setup, &queue, Mode::Production).await;

    let sent = setup.transport.sent_emails();
    assert_eq!(sent.len(), 1);
    let email = &sent[0];
    assert_eq!(email.from, FROM_ADDRESS);
    assert_eq!(email.to, vec![SUBMITTER_EMAIL.to_string()]);
    assert!(email.cc.is_empty());
    assert_eq!(email.subject, "[PASS] 投稿の承認依頼: Article title");
    assert!(email.text_body.starts_with(&format!("{SUBMITTER_EMAIL} 様")));
    assert!(email.text_body.contains("Please take a look"));
    assert!(email.text_body.contains(&format!(
        "{APP_BASE_URL}/submissions/{}",
        urlencoding::encode(SUBMISSION_ID)
    )));
    assert!(email.text_body.contains("PASS 通知サービスから自動送信"));
    assert_eq!(email.resource_ref.as_deref(), Some(SUBMISSION_ID));
    assert_eq!(
        email.notification_type,
        Some(NotificationType::SubmissionApprovalRequested)
    );

    assert_eq!(queue.acknowledged().len(), 1);
    assert!(queue.dead_lettered().is_empty());
    assert!(queue.in_flight().is_empty());
}

#[tokio::test]
async fn 修正依頼は準備者のユーザーリソースからアドレスを解決する() {
    let builder = NotificationTestBuilder::new();
    let setup = builder.build();
    let event = builder.seed_event(
        &setup.resources,
        "2",
        SubmissionEventType::ChangesRequested,
        SUBMITTER,
    );
    let queue = MockEventQueue::new();
    queue.push(creation_message(event.id.as_str()));

    drain(&setup, &queue, Mode::Production).await;

    let sent = setup.transport.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec![PREPARER_EMAIL.to_string()]);
    assert_eq!(sent[0].subject, "[PASS] 投稿の修正依頼: Article title");
    assert_eq!(queue.acknowledged().len(), 1);
}

#[tokio::test]
async fn global_ccを常にccに含める() {
    let builder = NotificationTestBuilder::new().with_recipient_config(RecipientConfig {
        mode:         Mode::Production,
        global_cc:    vec!["audit@pass.example.org".to_string(), " ".to_string()],
        whitelist:    None,
        from_address: FROM_ADDRESS.to_string(),
    });
    let setup = builder.build();
    let event = builder.seed_event(
        &setup.resources,
        "3",
        SubmissionEventType::Submitted,
        SUBMITTER,
    );
    let queue = MockEventQueue::new();
    queue.push(creation_message(event.id.as_str()));

    drain(&setup, &queue, Mode::Production).await;

    let sent = setup.transport.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].cc, vec!["audit@pass.example.org".to_string()]);
}

#[tokio::test]
async fn 許可リストに含まれない受信者には送信せずデッドレターへ移動する() {
    let builder = NotificationTestBuilder::new().with_recipient_config(RecipientConfig {
        mode:         Mode::Demo,
        global_cc:    vec![],
        whitelist:    Some(vec!["mailto:someone-else@pass.example.org".to_string()]),
        from_address: FROM_ADDRESS.to_string(),
    });
    let setup = builder.build();
    let event = builder.seed_event(
        &setup.resources,
        "4",
        SubmissionEventType::ApprovalRequested,
        PREPARER,
    );
    let queue = MockEventQueue::new();
    queue.push(creation_message(event.id.as_str()));

    drain(&setup, &queue, Mode::Demo).await;

    assert!(setup.transport.sent_emails().is_empty());
    assert_eq!(queue.dead_lettered().len(), 1);
}

#[tokio::test]
async fn 許可リストは大文字小文字を区別せずに照合する() {
    let builder = NotificationTestBuilder::new().with_recipient_config(RecipientConfig {
        mode:         Mode::Demo,
        global_cc:    vec![],
        whitelist:    Some(vec!["MAILTO:Submitter@PASS.example.org".to_string()]),
        from_address: FROM_ADDRESS.to_string(),
    });
    let setup = builder.build();
    let event = builder.seed_event(
        &setup.resources,
        "5",
        SubmissionEventType::ApprovalRequestedNewuser,
        PREPARER,
    );
    let queue = MockEventQueue::new();
    queue.push(creation_message(event.id.as_str()));

    drain(&setup, &queue, Mode::Demo).await;

    let sent = setup.transport.sent_emails();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec![SUBMITTER_EMAIL.to_string()]);
    assert_eq!(
        sent[0].notification_type,
        Some(NotificationType::SubmissionApprovalInvite)
    );
}

#[tokio::test]
async fn 自己投稿は送信せずに確認応答する() {
    let builder = NotificationTestBuilder::new();
    let setup = builder.build();
    setup.resources.add_submission(builder.submission(&[SUBMITTER]));
    let event = builder.seed_event(
        &setup.resources,
        "6",
        SubmissionEventType::Submitted,
        SUBMITTER,
    );
    let queue = MockEventQueue::new();
    queue.push(creation_message(event.id.as_str()));

    drain(&setup, &queue, Mode::Production).await;

    assert!(setup.transport.sent_emails().is_empty());
    assert_eq!(queue.acknowledged().len(), 1);
    assert!(queue.dead_lettered().is_empty());
}

#[tokio::test]
async fn 未知のイベント種別はデッドレターへ移動する() {
    let builder = NotificationTestBuilder::new();
    let setup = builder.build();
    let event = builder.seed_event(
        &setup.resources,
        "7",
        SubmissionEventType::from("withdrawn".to_string()),
        PREPARER,
    );
    let queue = MockEventQueue::new();
    queue.push(creation_message(event.id.as_str()));

    drain(&setup, &queue, Mode::Production).await;

    assert!(setup.transport.sent_emails().is_empty());
    assert_eq!(queue.dead_lettered().len(), 1);
}

#[tokio::test]
async fn 送信失敗はデッドレターへ移動する() {
    let builder = NotificationTestBuilder::new();
    let setup = builder.build();
    setup
        .transport
        .fail_with(|_| TransportError::SendFailed("relay unavailable".to_string()));
    let event = builder.seed_event(
        &setup.resources,
        "8",
        SubmissionEventType::ApprovalRequested,
        PREPARER,
    );
    let queue = MockEventQueue::new();
    let payload = creation_message(event.id.as_str());
    queue.push(payload.clone());

    drain(&setup, &queue, Mode::Production).await;

    assert_eq!(queue.dead_lettered(), vec![payload]);
    assert!(queue.acknowledged().is_empty());
}

#[tokio::test]
async fn disabledモードではメッセージを処理せずに確認応答する() {
    let builder = NotificationTestBuilder::new();
    let setup = builder.build();
    let event = builder.seed_event(
        &setup.resources,
        "9",
        SubmissionEventType::ApprovalRequested,
        PREPARER,
    );
    let queue = MockEventQueue::new();
    queue.push(creation_message(event.id.as_str()));
    queue.push(r#"{"id":"x","resourceType":"Grant","eventType":"Modification"}"#);

    drain(&setup, &queue, Mode::Disabled).await;

    assert!(setup.transport.sent_emails().is_empty());
    assert_eq!(queue.acknowledged().len(), 2);
}

#[tokio::test]
async fn 複数のメッセージを並行して処理する() {
    let builder = NotificationTestBuilder::new().without_links();
    let setup = builder.build();
    let queue = MockEventQueue::new();
    for i in 0..5 {
        let event = builder.seed_event(
            &setup.resources,
            &format!("batch-{i}"),
            SubmissionEventType::ApprovalRequested,
            PREPARER,
        );
        queue.push(creation_message(event.id.as_str()));
    }

    drain(&setup, &queue, Mode::Production).await;

    let sent = setup.transport.sent_emails();
    assert_eq!(sent.len(), 5);
    assert!(sent.iter().all(|e| !e.text_body.contains(APP_BASE_URL)));
    assert_eq!(queue.acknowledged().len(), 5);
    assert!(queue.in_flight().is_empty());
}
