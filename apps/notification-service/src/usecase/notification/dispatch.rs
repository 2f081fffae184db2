//! # ディスパッチ
//!
//! 合成済みの [`Notification`] をメールとして送信する。
//!
//! ## 処理の流れ
//!
//! ```text
//! CREATED ─▶ TEMPLATES_RESOLVED ─▶ RENDERED ─▶ RECIPIENTS_RESOLVED ─▶ SENT
//!    │               │                │                │
//!    └───────────────┴────────────────┴────────────────┴──▶ FAILED
//! ```
//!
//! 1. 通知種別のテンプレートセットを引く（なければ失敗）
//! 2. 件名・本文・フッターを取得してパラメータを埋め込む（未設定の区分は空文字）
//! 3. 送信元が空でないことを検証する
//! 4. 受信者をメールアドレスに解決する（`mailto:` はアドレス部分、それ以外はユーザーのメール）
//! 5. 宛先が空でないことを検証する
//! 6. メールを組み立てて送信し、メッセージ ID を返す
//!
//! いずれの段階の失敗も [`DispatchError`] として返す。再試行はしない。

use std::{collections::HashMap, fmt, sync::Arc};

use itertools::Itertools;
use passnotify_domain::{
    notification::{EmailMessage, MessageId, Notification, NotificationType, TransportError},
    submission::UserId,
    template::{TemplateResolutionError, TemplateSection, TemplateSet},
};
use passnotify_infra::{
    InfraError,
    mail::MailTransport,
    resource::ResourceStore,
    template::CompositeTemplateResolver,
};
use passnotify_shared::{
    event_log::{error, event},
    log_business_event,
};
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing_error::SpanTrace;

use super::{Parameterizer, RenderError};

/// ディスパッチの段階
///
/// [`DispatchError`] では、失敗した時点で到達していた段階を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DispatchStage {
    Created,
    TemplatesResolved,
    Rendered,
    RecipientsResolved,
    Sent,
}

/// ディスパッチ失敗の原因
#[derive(Debug, Error)]
pub enum DispatchErrorKind {
    /// 通知種別のテンプレートセットがない（設定不備）
    #[error("通知種別 '{0}' のテンプレートセットがありません")]
    MissingTemplate(NotificationType),

    /// テンプレートの取得に失敗
    #[error("{section} テンプレートの取得に失敗")]
    TemplateResolution {
        section: TemplateSection,
        #[source]
        source:  TemplateResolutionError,
    },

    /// パラメータの埋め込みに失敗
    #[error("{section} テンプレートのレンダリングに失敗")]
    Render {
        section: TemplateSection,
        #[source]
        source:  RenderError,
    },

    /// 通知の内容が不正（送信元・宛先の欠落）
    #[error("通知が不正です: {0}")]
    InvalidNotification(&'static str),

    /// 受信者のメールアドレス解決に失敗
    #[error("受信者 '{recipient}' の解決に失敗")]
    RecipientResolution {
        recipient: String,
        #[source]
        source:    InfraError,
    },

    /// メール送信に失敗
    #[error("メール送信に失敗")]
    Transport(#[source] TransportError),
}

/// ディスパッチエラー
///
/// 失敗の原因（[`DispatchErrorKind`]）、失敗時点の段階、対象の通知、
/// 生成時の [`SpanTrace`] を保持する。
///
/// `source()` を辿ると原因のエラー（[`TransportError`] など）に到達する。
pub struct DispatchError {
    inner: Box<Inner>,
}

struct Inner {
    kind:         DispatchErrorKind,
    stage:        DispatchStage,
    notification: Notification,
    span_trace:   SpanTrace,
}

impl DispatchError {
    fn new(kind: DispatchErrorKind, stage: DispatchStage, notification: &Notification) -> Self {
        Self {
            inner: Box::new(Inner {
                kind,
                stage,
                notification: notification.clone(),
                span_trace: SpanTrace::capture(),
            }),
        }
    }

    pub fn kind(&self) -> &DispatchErrorKind {
        &self.inner.kind
    }

    /// 失敗時点で到達していた段階
    pub fn stage(&self) -> DispatchStage {
        self.inner.stage
    }

    /// 送信しようとした通知
    pub fn notification(&self) -> &Notification {
        &self.inner.notification
    }

    pub fn span_trace(&self) -> &SpanTrace {
        &self.inner.span_trace
    }

    /// ログ出力用のエラー種別
    pub fn log_kind(&self) -> &'static str {
        match self.kind() {
            DispatchErrorKind::MissingTemplate(_) => error::kind::MISSING_TEMPLATE,
            DispatchErrorKind::TemplateResolution { .. } => error::kind::TEMPLATE_RESOLUTION,
            DispatchErrorKind::Render { .. } => error::kind::TEMPLATE_RENDER,
            DispatchErrorKind::InvalidNotification(_) => error::kind::INVALID_NOTIFICATION,
            DispatchErrorKind::RecipientResolution { .. } => error::kind::RECIPIENT_RESOLUTION,
            DispatchErrorKind::Transport(_) => error::kind::TRANSPORT,
        }
    }

    /// ログ出力用のエラーカテゴリ
    pub fn log_category(&self) -> &'static str {
        match self.kind() {
            DispatchErrorKind::MissingTemplate(_) => error::category::CONFIGURATION,
            DispatchErrorKind::TemplateResolution { .. } | DispatchErrorKind::Render { .. } => {
                error::category::INFRASTRUCTURE
            }
            DispatchErrorKind::InvalidNotification(_) => error::category::VALIDATION,
            DispatchErrorKind::RecipientResolution { .. } | DispatchErrorKind::Transport(_) => {
                error::category::EXTERNAL_SERVICE
            }
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "通知 {} のディスパッチに失敗（{}）: {}",
            self.notification().notification_type(),
            self.stage(),
            self.kind()
        )
    }
}

impl fmt::Debug for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DispatchError")
            .field("kind", &self.inner.kind)
            .field("stage", &self.inner.stage)
            .field("notification", &self.inner.notification)
            .field("span_trace", &self.inner.span_trace)
            .finish()
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.kind.source()
    }
}

/// ディスパッチサービス
pub struct DispatchService {
    templates:     HashMap<NotificationType, TemplateSet>,
    resolver:      CompositeTemplateResolver,
    parameterizer: Parameterizer,
    resources:     Arc<dyn ResourceStore>,
    transport:     Arc<dyn MailTransport>,
}

impl DispatchService {
    pub fn new(
        templates: impl IntoIterator<Item = TemplateSet>,
        resolver: CompositeTemplateResolver,
        parameterizer: Parameterizer,
        resources: Arc<dyn ResourceStore>,
        transport: Arc<dyn MailTransport>,
    ) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|set| (set.notification, set))
                .collect(),
            resolver,
            parameterizer,
            resources,
            transport,
        }
    }

    /// 通知を送信する
    ///
    /// 成功した場合はトランスポートが採番したメッセージ ID を返す。
    pub async fn dispatch(&self, notification: &Notification) -> Result<MessageId, DispatchError> {
        let notification_type = notification.notification_type();
        let fail = |kind, stage| DispatchError::new(kind, stage, notification);

        // テンプレート取得
        let template_set = self.templates.get(&notification_type).ok_or_else(|| {
            fail(
                DispatchErrorKind::MissingTemplate(notification_type),
                DispatchStage::Created,
            )
        })?;

        let mut sources = HashMap::new();
        for section in TemplateSection::iter() {
            if let Some(reference) = template_set.reference(section) {
                let content = self.resolver.resolve(reference).await.map_err(|source| {
                    fail(
                        DispatchErrorKind::TemplateResolution { section, source },
                        DispatchStage::Created,
                    )
                })?;
                sources.insert(section, content);
            }
        }

        // パラメータ埋め込み（未設定の区分は空文字）
        let mut rendered = HashMap::new();
        for section in TemplateSection::iter() {
            let text = match sources.get(&section) {
                Some(content) => self
                    .parameterizer
                    .render(content, notification.parameters())
                    .map_err(|source| {
                        fail(
                            DispatchErrorKind::Render { section, source },
                            DispatchStage::TemplatesResolved,
                        )
                    })?,
                None => String::new(),
            };
            rendered.insert(section, text);
        }
        let mut take = |section: TemplateSection| rendered.remove(&section).unwrap_or_default();
        let subject = take(TemplateSection::Subject);
        let body = take(TemplateSection::Body);
        let footer = take(TemplateSection::Footer);

        if notification.sender().trim().is_empty() {
            return Err(fail(
                DispatchErrorKind::InvalidNotification("missing sender"),
                DispatchStage::Rendered,
            ));
        }

        // 受信者解決
        let mut to = Vec::with_capacity(notification.recipients().len());
        for recipient in notification.recipients() {
            let address = self.resolve_recipient(recipient).await.map_err(|source| {
                fail(
                    DispatchErrorKind::RecipientResolution {
                        recipient: recipient.to_string(),
                        source,
                    },
                    DispatchStage::Rendered,
                )
            })?;
            to.extend(address);
        }
        let to: Vec<String> = to.into_iter().unique().collect();

        if to.is_empty() {
            return Err(fail(
                DispatchErrorKind::InvalidNotification("missing recipient"),
                DispatchStage::RecipientsResolved,
            ));
        }

        // 送信
        let email = EmailMessage {
            from: notification.sender().to_string(),
            to,
            cc: notification.cc().iter().cloned().collect(),
            subject,
            text_body: format!("{body}\n\n{footer}"),
            resource_ref: notification.resource_ref().map(|id| id.to_string()),
            notification_type: Some(notification_type),
        };

        let notification_name: &'static str = notification_type.into();
        match self.transport.send(&email).await {
            Ok(message_id) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_SENT,
                    event.entity_type = event::entity_type::SUBMISSION,
                    event.entity_id = email.resource_ref.as_deref().unwrap_or_default(),
                    event.result = event::result::SUCCESS,
                    notification.notification_type = notification_name,
                    notification.recipients = %email.to.join(","),
                    notification.message_id = %message_id,
                    "通知メール送信成功"
                );
                Ok(message_id)
            }
            Err(e) => {
                log_business_event!(
                    event.category = event::category::NOTIFICATION,
                    event.action = event::action::NOTIFICATION_FAILED,
                    event.entity_type = event::entity_type::SUBMISSION,
                    event.entity_id = email.resource_ref.as_deref().unwrap_or_default(),
                    event.result = event::result::FAILURE,
                    notification.notification_type = notification_name,
                    notification.recipients = %email.to.join(","),
                    error = %e,
                    "通知メール送信失敗"
                );
                Err(fail(
                    DispatchErrorKind::Transport(e),
                    DispatchStage::RecipientsResolved,
                ))
            }
        }
    }

    /// 受信者 ID をメールアドレスに解決する
    ///
    /// メールアドレスを持たないユーザーは警告して `None` を返す。
    async fn resolve_recipient(&self, recipient: &UserId) -> Result<Option<String>, InfraError> {
        if let Some(address) = recipient.mailto_address() {
            return Ok((!address.is_empty()).then(|| address.to_string()));
        }

        if !recipient.as_str().contains("://") && recipient.as_str().contains('@') {
            return Ok(Some(recipient.as_str().trim().to_string()));
        }

        let user = self.resources.read_user(recipient).await?;
        match user.email.filter(|email| !email.trim().is_empty()) {
            Some(email) => Ok(Some(email.trim().to_string())),
            None => {
                tracing::warn!(
                    recipient = %recipient,
                    "受信者にメールアドレスが設定されていないため除外します"
                );
                Ok(None)
            }
        }
    }
}
