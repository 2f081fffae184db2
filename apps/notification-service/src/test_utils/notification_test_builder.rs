//! 通知テストビルダー
//!
//! モックのリソースストア・送信トランスポートと同梱テンプレートで
//! [`NotificationService`] を組み立てる。標準的な投稿・イベント・ユーザーも生成する。

use std::sync::Arc;

use passnotify_domain::{
    notification::NotificationType,
    recipient::{Mode, RecipientConfig},
    submission::{
        Submission,
        SubmissionEvent,
        SubmissionEventId,
        SubmissionEventType,
        SubmissionId,
        User,
        UserId,
    },
    template::{TemplateSection, TemplateSet},
};
use passnotify_infra::{
    mock::{MockMailTransport, MockResourceStore},
    resource::ResourceStore,
    template::{CompositeTemplateResolver, InlineTemplateResolver, TemplateResolver},
};
use strum::IntoEnumIterator;

use crate::usecase::notification::{
    Composer,
    DispatchService,
    LinkBuilder,
    NotificationService,
    Parameterizer,
    bundled_templates::bundled_resolver,
};

/// テストで使う投稿 ID
pub const SUBMISSION_ID: &str = "https://pass.example.org/data/submissions/1";
/// テストで使う投稿者（`mailto:` ID）
pub const SUBMITTER: &str = "mailto:submitter@pass.example.org";
/// テストで使う準備者（リソース URI、メールアドレスはユーザーリソースで解決）
pub const PREPARER: &str = "https://pass.example.org/data/users/preparer";
/// 準備者のメールアドレス
pub const PREPARER_EMAIL: &str = "preparer@pass.example.org";
/// 送信元アドレス
pub const FROM_ADDRESS: &str = "noreply@pass.example.org";
/// リンクのベース URL
pub const APP_BASE_URL: &str = "https://pass.example.org/app";

/// 通知テストのセットアップデータ
pub struct NotificationTestSetup {
    pub sut:       Arc<NotificationService>,
    pub resources: MockResourceStore,
    pub transport: MockMailTransport,
}

/// 通知テストビルダー
///
/// # 使用例
///
/// ```ignore
/// use passnotify_notification_service::test_utils::NotificationTestBuilder;
///
/// #[tokio::test]
/// async fn test_example() {
///     let builder = NotificationTestBuilder::new();
///     let setup = builder.build();
///     let event = builder.seed_event(&setup.resources, "1", SubmissionEventType::ApprovalRequested, PREPARER);
///
///     let outcome = setup.sut.notify(&event.id).await.unwrap();
/// }
/// ```
pub struct NotificationTestBuilder {
    recipient_config: RecipientConfig,
    templates:        Vec<TemplateSet>,
    links:            bool,
}

impl Default for NotificationTestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationTestBuilder {
    /// production モード・同梱テンプレート・リンクありの構成で初期化する
    pub fn new() -> Self {
        Self {
            recipient_config: RecipientConfig {
                mode:         Mode::Production,
                global_cc:    vec![],
                whitelist:    None,
                from_address: FROM_ADDRESS.to_string(),
            },
            templates:        bundled_template_sets(),
            links:            true,
        }
    }

    pub fn with_recipient_config(mut self, recipient_config: RecipientConfig) -> Self {
        self.recipient_config = recipient_config;
        self
    }

    pub fn with_templates(mut self, templates: Vec<TemplateSet>) -> Self {
        self.templates = templates;
        self
    }

    pub fn without_links(mut self) -> Self {
        self.links = false;
        self
    }

    /// SUT とモックを組み立てる
    ///
    /// 投稿・投稿者・準備者のユーザーはあらかじめ登録しておく。
    pub fn build(&self) -> NotificationTestSetup {
        let resources = MockResourceStore::new();
        let transport = MockMailTransport::new();
        resources.add_submission(self.submission(&[PREPARER]));
        resources.add_user(User {
            id:    UserId::new(PREPARER),
            email: Some(PREPARER_EMAIL.to_string()),
        });

        let store: Arc<dyn ResourceStore> = Arc::new(resources.clone());
        let resolvers: Vec<Arc<dyn TemplateResolver>> =
            vec![Arc::new(bundled_resolver()), Arc::new(InlineTemplateResolver)];
        let dispatch = DispatchService::new(
            self.templates.clone(),
            CompositeTemplateResolver::new(resolvers),
            Parameterizer::new().expect("プレースホルダの正規表現が不正です"),
            store.clone(),
            Arc::new(transport.clone()),
        );
        let composer = Composer::new(
            self.recipient_config.clone(),
            self.links.then(|| LinkBuilder::new(APP_BASE_URL)),
        );

        NotificationTestSetup {
            sut: Arc::new(NotificationService::new(store, composer, dispatch)),
            resources,
            transport,
        }
    }

    /// 標準の投稿を生成する
    pub fn submission(&self, preparers: &[&str]) -> Submission {
        Submission {
            id:        SubmissionId::new(SUBMISSION_ID),
            submitter: UserId::new(SUBMITTER),
            preparers: preparers.iter().map(|p| UserId::new(*p)).collect(),
            metadata:  r#"{"title":"Article title","journal-title":"Journal of Tests"}"#
                .to_string(),
        }
    }

    /// 投稿イベントを生成してリソースストアに登録する
    pub fn seed_event(
        &self,
        resources: &MockResourceStore,
        suffix: &str,
        event_type: SubmissionEventType,
        performed_by: &str,
    ) -> SubmissionEvent {
        let event = SubmissionEvent {
            id: SubmissionEventId::new(format!("https://pass.example.org/data/events/{suffix}")),
            submission: SubmissionId::new(SUBMISSION_ID),
            event_type,
            performed_by: UserId::new(performed_by),
            performer_role: None,
            comment: Some("Please take a look".to_string()),
            performed_date: None,
        };
        resources.add_event(event.clone());
        event
    }
}

/// 全通知種別について同梱テンプレートを参照するテンプレートセットを返す
pub fn bundled_template_sets() -> Vec<TemplateSet> {
    NotificationType::iter()
        .map(|notification| TemplateSet {
            notification,
            templates: TemplateSection::iter()
                .map(|section| {
                    (
                        section,
                        format!(
                            "bundled:notifications/{notification}/{}.txt",
                            section.file_stem()
                        ),
                    )
                })
                .collect(),
        })
        .collect()
}
