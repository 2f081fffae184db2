//! # PASS 通知サービス
//!
//! 投稿イベントの作成をキューで受け取り、関係者へメール通知を送る常駐プロセス。
//!
//! ## 処理の流れ
//!
//! ```text
//! ┌──────────────┐  LMOVE   ┌──────────────┐  GET   ┌──────────────┐
//! │ Redis キュー  │────────→│  リスナー     │──────→│リソースストア │
//! └──────────────┘          └──────────────┘        └──────────────┘
//!                                  │
//!                        合成 → テンプレート解決 → レンダリング
//!                                  ↓
//!                           ┌──────────────┐
//!                           │ SMTP / SES   │
//!                           └──────────────┘
//! ```
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `NOTIFICATION_CONFIG_PATH` | No | 通知設定ファイル（デフォルト: `config/notification.json`） |
//! | `REDIS_URL` | No | Redis 接続 URL（デフォルト: `redis://127.0.0.1:6379`） |
//! | `NOTIFICATION_QUEUE_NAME` | No | キュー名（デフォルト: `pass:notification:events`） |
//! | `LISTENER_CONCURRENCY` | No | 同時処理数（デフォルト: `4`） |
//! | `LISTENER_POLL_SECONDS` | No | キューが空のときの待機秒数（デフォルト: `5`） |
//! | `NOTIFICATION_BACKEND` | No | `smtp` / `ses` / `noop`（デフォルト: `smtp`） |
//! | `PASS_RESOURCE_BASE_URL` | No | 相対リソース ID の解決に使うベース URL |
//! | `PASS_USER` / `PASS_PASSWORD` | No | リソースストアの Basic 認証 |
//! | `LOG_FORMAT` | No | `json` / `pretty`（デフォルト: `pretty`） |
//!
//! 通知設定ファイルの値は `PASS_NOTIFICATION__<キー>` で上書きできる（例: `PASS_NOTIFICATION__MODE=demo`）。
//!
//! ## 起動方法
//!
//! ```bash
//! # 開発環境（送信しない）
//! NOTIFICATION_BACKEND=noop cargo run -p passnotify-notification-service
//!
//! # 本番環境
//! NOTIFICATION_CONFIG_PATH=/etc/pass/notification.json cargo run -p passnotify-notification-service --release
//! ```

use std::sync::Arc;

use anyhow::Context as _;
use passnotify_infra::{
    mail::{MailBackend, MailTransport, NoopMailTransport, SesMailTransport, SmtpMailTransport},
    queue::RedisEventQueue,
    redis::create_connection_manager,
    resource::{HttpResourceStore, ResourceStore},
    template::{
        CompositeTemplateResolver,
        FileTemplateResolver,
        HttpTemplateResolver,
        InlineTemplateResolver,
        TemplateResolver,
    },
};
use passnotify_notification_service::{
    config::{NotificationConfig, ServiceConfig},
    error::ConfigError,
    listener::{ListenerSettings, QueueListener},
    usecase::notification::{
        Composer,
        DispatchService,
        NotificationService,
        Parameterizer,
        bundled_templates::bundled_resolver,
    },
};
use passnotify_shared::observability::{TracingConfig, init_tracing};

/// 通知サービスのエントリーポイント
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    // トレーシング初期化
    let tracing_config = TracingConfig::from_env("notification-service");
    init_tracing(&tracing_config);
    let _app_span = tracing::info_span!("app", service = %tracing_config.service_name).entered();

    // 設定読み込み
    let service_config = ServiceConfig::from_env()?;
    let notification_config = NotificationConfig::load(&service_config.notification_config_path)
        .with_context(|| {
            format!(
                "通知設定ファイル {} を読み込めません",
                service_config.notification_config_path.display()
            )
        })?;

    tracing::info!(
        mode = %notification_config.mode,
        backend = %service_config.backend,
        queue = %service_config.queue_name,
        "通知サービスを起動します"
    );

    // 送信バックエンド
    let transport: Arc<dyn MailTransport> = match service_config.backend {
        MailBackend::Smtp => {
            let smtp = notification_config
                .smtp
                .as_ref()
                .ok_or(ConfigError::MissingSmtpSettings)?;
            Arc::new(SmtpMailTransport::new(smtp)?)
        }
        MailBackend::Ses => Arc::new(SesMailTransport::from_env().await),
        MailBackend::Noop => Arc::new(NoopMailTransport),
    };

    // リソースストアとテンプレートリゾルバ
    let http_client = reqwest::Client::new();
    let resources: Arc<dyn ResourceStore> = Arc::new(HttpResourceStore::new(
        http_client.clone(),
        service_config.resource_store.clone(),
    ));
    let resolvers: Vec<Arc<dyn TemplateResolver>> = vec![
        Arc::new(bundled_resolver()),
        Arc::new(FileTemplateResolver),
        Arc::new(HttpTemplateResolver::new(http_client)),
        Arc::new(InlineTemplateResolver),
    ];

    // ユースケース
    let dispatch = DispatchService::new(
        notification_config.templates.clone(),
        CompositeTemplateResolver::new(resolvers),
        Parameterizer::new()?,
        resources.clone(),
        transport,
    );
    let composer = Composer::from_config(&notification_config)?;
    let notifier = Arc::new(NotificationService::new(resources, composer, dispatch));

    // イベントキュー
    let conn = create_connection_manager(&service_config.redis_url).await?;
    tracing::info!("Redis に接続しました");
    let queue = Arc::new(RedisEventQueue::new(conn, &service_config.queue_name));

    let listener = QueueListener::new(
        queue,
        notifier,
        ListenerSettings {
            mode:          notification_config.mode,
            concurrency:   service_config.listener_concurrency,
            poll_interval: service_config.poll_interval,
        },
    );
    listener.recover().await?;
    listener.run(shutdown_signal()).await?;

    Ok(())
}

/// Ctrl+C で完了するフューチャ
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "停止シグナルの待受に失敗");
    }
}
